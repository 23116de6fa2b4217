//! `users.toml`: account definitions, kept in a file separate from general
//! settings so credentials can carry tighter file permissions.

use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use super::Error;
use crate::user::{Matcher, User};

#[derive(Debug, Clone, Deserialize)]
pub struct MatcherConfig {
    pub pattern: String,
    #[serde(default)]
    pub regex: bool,
}

impl From<&MatcherConfig> for Matcher {
    fn from(m: &MatcherConfig) -> Self {
        if m.regex {
            Matcher::regex(m.pattern.clone())
        } else {
            Matcher::literal(m.pattern.clone())
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserConfig {
    pub name: String,
    pub password_hash: String,
    #[serde(default)]
    pub cluster_admin: bool,
    #[serde(default)]
    pub db: String,
    #[serde(default)]
    pub write_matchers: Vec<MatcherConfig>,
    #[serde(default)]
    pub read_matchers: Vec<MatcherConfig>,
    #[serde(default)]
    pub is_admin: bool,
}

impl From<&UserConfig> for User {
    fn from(u: &UserConfig) -> Self {
        if u.cluster_admin {
            User::cluster_admin(u.name.clone(), u.password_hash.clone())
        } else {
            User::db_user(
                u.name.clone(),
                u.password_hash.clone(),
                u.db.clone(),
                u.write_matchers.iter().map(Matcher::from).collect(),
                u.read_matchers.iter().map(Matcher::from).collect(),
                u.is_admin,
            )
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsersConfig {
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

impl UsersConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let config: UsersConfig = toml::from_str(&contents).map_err(|source| Error::Parse {
                    path: path.display().to_string(),
                    source,
                })?;
                info!(path = %path.display(), count = config.users.len(), "loaded users");
                Ok(config)
            }
            Err(_) => {
                warn!(path = %path.display(), "\"{}\" doesn't exist, loading no users", path.display());
                Ok(UsersConfig::default())
            }
        }
    }

    pub fn to_users(&self) -> Vec<User> {
        self.users.iter().map(User::from).collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_missing_file_loads_empty() {
        let config = UsersConfig::load("/nonexistent/users.toml").unwrap();
        assert!(config.users.is_empty());
    }

    #[test]
    fn test_parse_cluster_admin_and_db_user() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.toml");
        std::fs::write(
            &path,
            r#"
            [[users]]
            name = "root"
            password_hash = "hash"
            cluster_admin = true

            [[users]]
            name = "alice"
            password_hash = "hash2"
            db = "metrics"
            is_admin = false

            [[users.write_matchers]]
            pattern = "writable"
            "#,
        )
        .unwrap();

        let config = UsersConfig::load(&path).unwrap();
        assert_eq!(config.users.len(), 2);
        let users = config.to_users();
        assert!(users[0].is_cluster_admin());
        assert!(!users[1].is_cluster_admin());
        assert!(users[1].has_write_access("writable"));
    }

    #[test]
    fn test_malformed_toml_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.toml");
        std::fs::write(&path, "not valid toml [[[").unwrap();
        assert!(UsersConfig::load(&path).is_err());
    }
}
