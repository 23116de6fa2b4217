//! Identity and per-database read/write permission evaluation.

pub mod error;
pub mod matcher;
pub mod password_cache;

pub use error::Error;
pub use matcher::Matcher;
pub use password_cache::PasswordCache;

const BCRYPT_COST: u32 = 10;

/// What kind of account this is: a cluster admin (implicit read/write on
/// everything) or a database-scoped user governed by matchers.
#[derive(Debug, Clone)]
pub enum UserKind {
    ClusterAdmin,
    DbUser {
        db: String,
        write_matchers: Vec<Matcher>,
        read_matchers: Vec<Matcher>,
        is_admin: bool,
    },
}

#[derive(Debug, Clone)]
pub struct User {
    pub name: String,
    password_hash: String,
    pub deleted: bool,
    /// Key into the process-wide [`PasswordCache`].
    pub cache_key: String,
    pub kind: UserKind,
}

impl User {
    pub fn cluster_admin(name: impl Into<String>, password_hash: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            cache_key: name.clone(),
            name,
            password_hash: password_hash.into(),
            deleted: false,
            kind: UserKind::ClusterAdmin,
        }
    }

    pub fn db_user(
        name: impl Into<String>,
        password_hash: impl Into<String>,
        db: impl Into<String>,
        write_matchers: Vec<Matcher>,
        read_matchers: Vec<Matcher>,
        is_admin: bool,
    ) -> Self {
        let name = name.into();
        Self {
            cache_key: name.clone(),
            name,
            password_hash: password_hash.into(),
            deleted: false,
            kind: UserKind::DbUser {
                db: db.into(),
                write_matchers,
                read_matchers,
                is_admin,
            },
        }
    }

    pub fn is_cluster_admin(&self) -> bool {
        matches!(self.kind, UserKind::ClusterAdmin)
    }

    /// True if any write matcher for this user's database matches `name`.
    /// Always true for a cluster admin.
    pub fn has_write_access(&self, name: &str) -> bool {
        match &self.kind {
            UserKind::ClusterAdmin => true,
            UserKind::DbUser { write_matchers, .. } => {
                write_matchers.iter().any(|m| m.matches(name))
            }
        }
    }

    /// True if any read matcher for this user's database matches `name`.
    /// Always true for a cluster admin.
    pub fn has_read_access(&self, name: &str) -> bool {
        match &self.kind {
            UserKind::ClusterAdmin => true,
            UserKind::DbUser { read_matchers, .. } => read_matchers.iter().any(|m| m.matches(name)),
        }
    }

    /// Consult the cache first; on miss, fall back to a real bcrypt compare
    /// and populate the cache on success. A cache hit always does a plain
    /// equality check against the last-verified plaintext, never a bcrypt
    /// compare — that's the entire point of the cache.
    pub fn is_valid_password(&self, password: &str, cache: &PasswordCache) -> bool {
        if let Some(cached) = cache.get(&self.cache_key) {
            return cached == password;
        }

        match bcrypt::verify(password, &self.password_hash) {
            Ok(true) => {
                cache.put(&self.cache_key, password.to_owned());
                true
            }
            _ => false,
        }
    }

    /// Invalidates the cache entry so the next `is_valid_password` call is
    /// forced through a real bcrypt comparison instead of a stale cache hit.
    pub fn change_password(&mut self, new_hash: impl Into<String>, cache: &PasswordCache) {
        self.password_hash = new_hash.into();
        cache.invalidate(&self.cache_key);
    }

    pub fn hash_password(password: &str) -> Result<String, Error> {
        Ok(bcrypt::hash(password, BCRYPT_COST)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cluster_admin_has_implicit_access() {
        let admin = User::cluster_admin("root", "hash");
        assert!(admin.is_cluster_admin());
        assert!(admin.has_read_access("anything"));
        assert!(admin.has_write_access("anything"));
    }

    #[test]
    fn test_db_user_matcher_evaluation() {
        let user = User::db_user(
            "alice",
            "hash",
            "metrics",
            vec![Matcher::literal("writable")],
            vec![Matcher::regex("readable_.*")],
            false,
        );

        assert!(!user.is_cluster_admin());
        assert!(user.has_write_access("writable"));
        assert!(!user.has_write_access("other"));
        assert!(user.has_read_access("readable_series"));
        assert!(!user.has_read_access("writable"));
    }

    #[test]
    fn test_password_cache_hit_skips_bcrypt() {
        let cache = PasswordCache::new();
        let hash = User::hash_password("correct horse").unwrap();
        let user = User::cluster_admin("root", hash);

        assert!(user.is_valid_password("correct horse", &cache));
        // Now cached; a wrong password that happens to equal the cached
        // plaintext would pass, proving the hit path never calls bcrypt.
        assert!(cache.get(&user.cache_key).is_some());
        assert!(user.is_valid_password("correct horse", &cache));
        assert!(!user.is_valid_password("wrong", &cache));
    }

    #[test]
    fn test_change_password_forces_bcrypt_recheck() {
        let cache = PasswordCache::new();
        let hash = User::hash_password("old-pass").unwrap();
        let mut user = User::cluster_admin("root", hash);

        assert!(user.is_valid_password("old-pass", &cache));
        assert!(cache.get(&user.cache_key).is_some());

        let new_hash = User::hash_password("new-pass").unwrap();
        user.change_password(new_hash, &cache);
        assert_eq!(cache.get(&user.cache_key), None);

        // Stale plaintext must not validate post-rotation, proving the
        // cache was actually bypassed rather than silently reused.
        assert!(!user.is_valid_password("old-pass", &cache));
        assert!(user.is_valid_password("new-pass", &cache));
    }
}
