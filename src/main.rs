//! Binary entry point. Parses the CLI, initializes logging, and for `run`
//! wires a [`ShardCoordinator`] against demonstration collaborators so the
//! binary does something observable without a real storage/transport layer
//! plugged in — those are supplied by whatever embeds this crate.

use std::sync::Arc;

use async_trait::async_trait;
use clap::Parser;

use fluxshard::cli::{config_check, shard_info, Cli, Commands};
use fluxshard::config::Config;
use fluxshard::coordinator::{
    Error as CoordinatorError, LocalShardDb, LocalShardStore, QueryProcessor, QuerySpec, ShardCoordinator, Wal,
};
use fluxshard::shard::{ShardDescriptor, ShardType};
use fluxshard::wire::{Request, Series};
use fluxshard::{logging, Error};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init();

    let result = match cli.command.clone().unwrap_or(Commands::Run) {
        Commands::Run => run(&cli).await,
        Commands::Configcheck => config_check(&cli.config, &cli.users).map_err(Into::into),
        Commands::ShardInfo { id, start, end, json } => shard_info(id, start, end, json).map_err(Into::into),
    };

    if let Err(err) = result {
        tracing::error!(%err, "fluxshard exiting");
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<(), Error> {
    let config = Config::load(&cli.config)?;
    tracing::info!(node_id = config.node.id, listen_addr = %config.node.listen_addr, "fluxshard starting");

    let descriptor = ShardDescriptor::new(
        1,
        chrono::Utc::now() - chrono::Duration::hours(1),
        chrono::Utc::now() + chrono::Duration::hours(1),
        ShardType::ShortTerm,
        vec![config.node.id],
        false,
    )?;

    let coordinator = ShardCoordinator::from_config(descriptor, Arc::new(NoopWal), &config.general);
    coordinator.set_local_store(Arc::new(InMemoryStore::default()), config.node.id);

    let mut write = Request::new(fluxshard::wire::RequestKind::Write);
    write.database = Some("demo".to_owned());
    coordinator.write(&mut write).await?;

    tracing::info!("fluxshard demo coordinator accepted one write; no transport layer is attached, exiting");
    Ok(())
}

struct NoopWal;

#[async_trait]
impl Wal for NoopWal {
    async fn assign_sequence_numbers_and_log(
        &self,
        _req: &Request,
        _shard: &ShardDescriptor,
    ) -> Result<u64, CoordinatorError> {
        Ok(0)
    }

    async fn commit(&self, _request_number: u64, _server_id: u32) -> Result<(), CoordinatorError> {
        Ok(())
    }
}

#[derive(Default)]
struct InMemoryStore;

#[async_trait]
impl LocalShardStore for InMemoryStore {
    async fn write(&self, _req: &Request) -> Result<(), CoordinatorError> {
        Ok(())
    }

    async fn buffer_write(&self, _req: &Request) -> Result<(), CoordinatorError> {
        Ok(())
    }

    async fn get_or_create_shard(&self, _id: u32) -> Result<Arc<dyn LocalShardDb>, CoordinatorError> {
        Ok(Arc::new(InMemoryShardDb))
    }

    async fn return_shard(&self, _id: u32) {}

    async fn delete_shard(&self, _id: u32) -> Result<(), CoordinatorError> {
        Ok(())
    }
}

struct InMemoryShardDb;

#[async_trait]
impl LocalShardDb for InMemoryShardDb {
    async fn write(&self, _database: &str, _series: &Series) -> Result<(), CoordinatorError> {
        Ok(())
    }

    async fn query(
        &self,
        _spec: &dyn QuerySpec,
        _processor: &mut dyn QueryProcessor,
    ) -> Result<(), CoordinatorError> {
        Ok(())
    }

    async fn drop_database(&self, _database: &str) -> Result<(), CoordinatorError> {
        Ok(())
    }
}
