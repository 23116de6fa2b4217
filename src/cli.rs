//! Command-line surface. Thin by design: subcommands either validate
//! configuration or delegate into library code they don't implement
//! end-to-end (`run` wires up a coordinator against collaborators supplied
//! by whatever storage/transport layer embeds this crate).

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::config::{Config, UsersConfig};

#[derive(Parser, Debug)]
#[command(name = "fluxshard", version)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "fluxshard.toml")]
    pub config: PathBuf,

    /// Path to the users.toml file.
    #[arg(short, long, default_value = "users.toml")]
    pub users: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the coordinator process.
    Run,

    /// Check that the configuration and users files parse.
    Configcheck,

    /// Print a shard descriptor's derived fields for operator debugging.
    ShardInfo {
        #[arg(long)]
        id: u32,
        /// Shard start, Unix seconds.
        #[arg(long)]
        start: i64,
        /// Shard end, Unix seconds.
        #[arg(long)]
        end: i64,
        /// Emit a JSON object instead of plain lines.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Error)]
pub enum ConfigCheckError {
    #[error("config error in \"{path}\": {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: crate::config::Error,
    },

    #[error("users error in \"{path}\": {source}")]
    Users {
        path: PathBuf,
        #[source]
        source: crate::config::Error,
    },
}

/// Confirms both files parse. A missing file is not an error here either —
/// `Config::load`/`UsersConfig::load` already treat that as "use defaults" —
/// only a malformed file that exists fails this check.
pub fn config_check(config_path: &PathBuf, users_path: &PathBuf) -> Result<(), ConfigCheckError> {
    Config::load(config_path).map_err(|source| ConfigCheckError::Config {
        path: config_path.clone(),
        source,
    })?;
    UsersConfig::load(users_path).map_err(|source| ConfigCheckError::Users {
        path: users_path.clone(),
        source,
    })?;
    Ok(())
}

/// Prints the derived fields an operator would otherwise have to compute by
/// hand from a shard's raw start/end timestamps.
pub fn shard_info(id: u32, start: i64, end: i64, json: bool) -> Result<(), crate::shard::Error> {
    use chrono::{TimeZone, Utc};

    let descriptor = crate::shard::ShardDescriptor::new(
        id,
        Utc.timestamp_opt(start, 0).single().unwrap_or_else(Utc::now),
        Utc.timestamp_opt(end, 0).single().unwrap_or_else(Utc::now),
        crate::shard::ShardType::LongTerm,
        vec![],
        false,
    )?;

    if json {
        let value = serde_json::json!({
            "id": descriptor.id,
            "start_micro": descriptor.start_micro(),
            "end_micro": descriptor.end_micro(),
            "duration_seconds": descriptor.shard_duration().num_seconds(),
        });
        println!("{value}");
    } else {
        println!("shard {}", descriptor.id);
        println!("  start_micro: {}", descriptor.start_micro());
        println!("  end_micro:   {}", descriptor.end_micro());
        println!("  duration:    {}", descriptor.shard_duration());
    }
    Ok(())
}
