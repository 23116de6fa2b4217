//! Contract for a parsed query, supplied by a parser that lives outside this
//! crate. The coordinator only ever inspects a query through this trait; it
//! never parses query text itself.

use std::time::Duration;

use crate::user::User;

/// Broad shape of what a query does, enough for the coordinator to pick a
/// query-processing strategy without understanding query syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuerySpecKind {
    ListSeries,
    DeleteFromSeries,
    DropSeries,
    SinglePoint,
    Other,
}

pub trait QuerySpec: Send + Sync {
    fn kind(&self) -> QuerySpecKind;

    /// True for queries (deletes, drops) that must be applied identically on
    /// every replica in the shard rather than answered by one.
    fn run_against_all_servers_in_shard(&self) -> bool;

    fn reads_from_multiple_series(&self) -> bool;

    /// Absent means no grouping; aggregates without a group-by need a global
    /// combine step above the shard.
    fn group_by_interval(&self) -> Option<Duration>;

    fn has_aggregates(&self) -> bool;

    /// Opaque identifier a local query-engine processor binds its execution
    /// plan to; the engine that interprets it is out of scope here.
    fn select_query(&self) -> String;

    fn query_string(&self) -> String;

    /// Same as `query_string` but with an explicit time-range predicate, used
    /// when replaying a destructive delete so the filter is replay-safe.
    fn query_string_with_time_condition(&self) -> String;

    fn user(&self) -> &User;

    fn database(&self) -> &str;
}
