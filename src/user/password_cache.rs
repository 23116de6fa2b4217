//! Process-wide, injectable password-verification cache.
//!
//! A concurrent-safe mapping rather than a process global, so tests can hand
//! the coordinator a fresh cache instead of fighting shared process state.

use dashmap::DashMap;

#[derive(Debug, Default)]
pub struct PasswordCache {
    verified: DashMap<String, String>,
}

impl PasswordCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last plaintext password that successfully verified against this
    /// cache key's hash, if any.
    pub fn get(&self, cache_key: &str) -> Option<String> {
        self.verified.get(cache_key).map(|v| v.clone())
    }

    pub fn put(&self, cache_key: &str, plaintext: String) {
        self.verified.insert(cache_key.to_owned(), plaintext);
    }

    /// Invalidate on password change.
    pub fn invalidate(&self, cache_key: &str) {
        self.verified.remove(cache_key);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_put_get_invalidate() {
        let cache = PasswordCache::new();
        assert_eq!(cache.get("k1"), None);

        cache.put("k1", "hunter2".into());
        assert_eq!(cache.get("k1").as_deref(), Some("hunter2"));

        cache.invalidate("k1");
        assert_eq!(cache.get("k1"), None);
    }
}
