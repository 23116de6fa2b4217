//! Total orders over shards, used by upper layers to merge per-shard streams.

use super::ShardDescriptor;

/// `(start_time, id ascending)`.
pub fn sort_shards_by_time_ascending(shards: &mut [ShardDescriptor]) {
    shards.sort_by(|a, b| {
        a.start_time()
            .cmp(&b.start_time())
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Reverses the primary key (`start_time`) but keeps `id` ascending as the
/// tie-break.
pub fn sort_shards_by_time_descending(shards: &mut [ShardDescriptor]) {
    shards.sort_by(|a, b| {
        b.start_time()
            .cmp(&a.start_time())
            .then_with(|| a.id.cmp(&b.id))
    });
}
