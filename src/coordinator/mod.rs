//! Per-shard orchestrator: fans writes out to the local store and replicas,
//! decides where queries run, and drives the destructive-query commit
//! protocol. Contains no mutable state worth locking once `set_servers` /
//! `set_local_store` setup has run.

pub mod collaborators;
pub mod error;
pub mod query_processor;
pub mod query_spec;

pub use collaborators::{ClusterServer, LocalShardDb, LocalShardStore, Wal};
pub use error::Error;
pub use query_processor::QueryProcessor;
pub use query_spec::{QuerySpec, QuerySpecKind};

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::config::GeneralConfig;
use crate::shard::ShardDescriptor;
use crate::wire::{Request, RequestKind, Response};

use query_processor::{
    ListSeriesProcessor, PassthroughProcessor, QueryEngineProcessor, DESTRUCTIVE_PASSTHROUGH_CAP,
    PLAIN_PASSTHROUGH_CAP,
};

#[derive(Clone)]
struct LocalAttachment {
    store: Arc<dyn LocalShardStore>,
    server_id: u32,
}

/// Coordinates one shard's writes, queries and destructive operations across
/// its replica set. Starts `Empty`, becomes `Replicated` after `set_servers`,
/// and `Replicated+Local` after `set_local_store` succeeds. There is no
/// terminal state; shards are dropped by whatever owns the coordinator.
pub struct ShardCoordinator {
    descriptor: ShardDescriptor,
    wal: Arc<dyn Wal>,
    remote_servers: RwLock<Vec<Arc<dyn ClusterServer>>>,
    local: RwLock<Option<LocalAttachment>>,
    /// Channel capacity for non-aggregating passthrough/query-engine queries.
    passthrough_cap: usize,
    /// Channel capacity for DELETE_FROM_SERIES / DROP_SERIES / single-point
    /// passthrough queries.
    destructive_cap: usize,
}

impl ShardCoordinator {
    /// Uses the hardcoded default buffer caps. Prefer [`Self::from_config`]
    /// when a `GeneralConfig` is available so operators can tune them.
    pub fn new(descriptor: ShardDescriptor, wal: Arc<dyn Wal>) -> Self {
        Self::with_buffer_caps(descriptor, wal, PLAIN_PASSTHROUGH_CAP, DESTRUCTIVE_PASSTHROUGH_CAP)
    }

    /// Sources the two buffer caps named in spec.md §4.3 from `general`
    /// instead of the hardcoded defaults, making them operator-tunable.
    pub fn from_config(descriptor: ShardDescriptor, wal: Arc<dyn Wal>, general: &GeneralConfig) -> Self {
        Self::with_buffer_caps(
            descriptor,
            wal,
            general.query_processor_buffer_small,
            general.query_processor_buffer_large,
        )
    }

    fn with_buffer_caps(
        descriptor: ShardDescriptor,
        wal: Arc<dyn Wal>,
        passthrough_cap: usize,
        destructive_cap: usize,
    ) -> Self {
        Self {
            descriptor,
            wal,
            remote_servers: RwLock::new(Vec::new()),
            local: RwLock::new(None),
            passthrough_cap,
            destructive_cap,
        }
    }

    pub fn descriptor(&self) -> &ShardDescriptor {
        &self.descriptor
    }

    /// `(passthrough_cap, destructive_cap)`, for asserting that buffer caps
    /// were actually sourced from a `GeneralConfig` rather than defaulted.
    #[cfg(test)]
    fn buffer_caps(&self) -> (usize, usize) {
        (self.passthrough_cap, self.destructive_cap)
    }

    pub fn set_servers(&self, servers: Vec<Arc<dyn ClusterServer>>) {
        *self.remote_servers.write() = servers;
    }

    pub fn set_local_store(&self, store: Arc<dyn LocalShardStore>, server_id: u32) {
        *self.local.write() = Some(LocalAttachment { store, server_id });
    }

    pub fn is_local(&self) -> bool {
        self.local.read().is_some()
    }

    /// Sorted, deduplicated union of remote replica ids and the local server
    /// id, if attached.
    pub fn server_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.remote_servers.read().iter().map(|s| s.id()).collect();
        if let Some(local) = self.local_attachment() {
            ids.push(local.server_id);
        }
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    fn local_attachment(&self) -> Option<LocalAttachment> {
        self.local.read().clone()
    }

    /// Logs to the WAL, then fans the request out to the local store (if
    /// attached) and every remote replica. Only a WAL failure fails the
    /// call; buffer-write failures on individual collaborators are logged
    /// and tolerated, since the WAL remains the source of truth for
    /// re-delivery by a higher layer.
    pub async fn write(&self, req: &mut Request) -> Result<(), Error> {
        req.shard_id = Some(self.descriptor.id);
        let request_number = self
            .wal
            .assign_sequence_numbers_and_log(req, &self.descriptor)
            .await?;
        req.request_number = Some(request_number);

        if let Some(local) = self.local_attachment() {
            if let Err(err) = local.store.buffer_write(req).await {
                tracing::warn!(shard_id = self.descriptor.id, %err, "local buffer_write failed");
            }
        }

        for server in self.remote_servers.read().clone() {
            let server_id = server.id();
            if let Err(err) = server.buffer_write(req).await {
                tracing::warn!(shard_id = self.descriptor.id, server_id, %err, "remote buffer_write failed");
            }
        }

        Ok(())
    }

    /// Same as [`Self::write`] but never notifies remote replicas. Used
    /// during WAL replay, where the replicas already have their own copy of
    /// the log to replay from.
    pub async fn write_local_only(&self, req: &mut Request) -> Result<(), Error> {
        req.shard_id = Some(self.descriptor.id);
        let request_number = self
            .wal
            .assign_sequence_numbers_and_log(req, &self.descriptor)
            .await?;
        req.request_number = Some(request_number);

        if let Some(local) = self.local_attachment() {
            if let Err(err) = local.store.buffer_write(req).await {
                tracing::warn!(shard_id = self.descriptor.id, %err, "local buffer_write failed");
            }
        }

        Ok(())
    }

    /// A shard can answer aggregates on its own data only when no bucket can
    /// straddle a shard boundary and, if the shard's duration is split
    /// across siblings, the query doesn't span multiple series.
    pub fn should_aggregate_locally(&self, spec: &dyn QuerySpec) -> bool {
        if self.descriptor.duration_is_split && spec.reads_from_multiple_series() {
            return false;
        }

        match spec.group_by_interval() {
            None => !spec.has_aggregates(),
            Some(g) => {
                let shard_nanos = self.descriptor.shard_duration().num_nanoseconds().unwrap_or(0);
                let g_nanos = g.as_nanos() as i64;
                g_nanos != 0 && shard_nanos % g_nanos == 0
            }
        }
    }

    fn create_request(&self, spec: &dyn QuerySpec) -> Request {
        Request {
            kind: Some(RequestKind::Query),
            shard_id: Some(self.descriptor.id),
            query: Some(spec.query_string()),
            user_name: Some(spec.user().name.clone()),
            database: Some(spec.database().to_owned()),
            is_db_user: Some(!spec.user().is_cluster_admin()),
            ..Default::default()
        }
    }

    /// Decides where a query runs and drives it to completion, delivering
    /// zero or more `Query` responses followed by exactly one `EndStream` on
    /// `response_tx`.
    pub async fn query(
        &self,
        spec: Arc<dyn QuerySpec>,
        response_tx: mpsc::Sender<Response>,
    ) -> Result<(), Error> {
        if spec.run_against_all_servers_in_shard()
            && matches!(spec.kind(), QuerySpecKind::DeleteFromSeries | QuerySpecKind::DropSeries)
        {
            return self.log_and_handle_destructive_query(spec, response_tx, false).await;
        }

        if self.is_local() {
            self.run_local_query(spec, response_tx).await
        } else {
            self.run_remote_query(spec.as_ref(), response_tx).await
        }
    }

    async fn run_local_query(
        &self,
        spec: Arc<dyn QuerySpec>,
        response_tx: mpsc::Sender<Response>,
    ) -> Result<(), Error> {
        let local = self
            .local_attachment()
            .expect("run_local_query is only called once is_local() is true");
        let shard_id = self.descriptor.id;

        let cap = match spec.kind() {
            QuerySpecKind::DeleteFromSeries | QuerySpecKind::DropSeries | QuerySpecKind::SinglePoint => {
                self.destructive_cap
            }
            _ => self.passthrough_cap,
        };

        let (inner_tx, mut inner_rx) = mpsc::channel(cap);
        let mut processor: Box<dyn QueryProcessor> = match spec.kind() {
            QuerySpecKind::ListSeries => Box::new(ListSeriesProcessor::new(inner_tx)),
            QuerySpecKind::DeleteFromSeries | QuerySpecKind::DropSeries | QuerySpecKind::SinglePoint => {
                Box::new(PassthroughProcessor::new(inner_tx))
            }
            _ if self.should_aggregate_locally(spec.as_ref()) => {
                Box::new(QueryEngineProcessor::new(inner_tx, spec.select_query()))
            }
            _ => Box::new(PassthroughProcessor::new(inner_tx)),
        };

        let forward = tokio::spawn(async move {
            while let Some(resp) = inner_rx.recv().await {
                if response_tx.send(resp).await.is_err() {
                    break;
                }
            }
        });

        let query_result = match local.store.get_or_create_shard(shard_id).await {
            Ok(shard_db) => {
                let result = shard_db.query(spec.as_ref(), processor.as_mut()).await;
                local.store.return_shard(shard_id).await;
                result
            }
            Err(err) => Err(err),
        };

        processor.close().await;
        drop(processor);
        let _ = forward.await;

        query_result
    }

    async fn run_remote_query(
        &self,
        spec: &dyn QuerySpec,
        response_tx: mpsc::Sender<Response>,
    ) -> Result<(), Error> {
        let up: Vec<Arc<dyn ClusterServer>> = self
            .remote_servers
            .read()
            .iter()
            .filter(|s| s.is_up())
            .cloned()
            .collect();

        if up.is_empty() {
            let message = format!("No servers up to query shard {}", self.descriptor.id);
            let _ = response_tx.send(Response::end_stream_with_error(message)).await;
            return Err(Error::NoServersUp {
                shard_id: self.descriptor.id,
            });
        }

        // Unspecified-but-bounded-spread selection among healthy replicas;
        // not a real load-balancing policy.
        let chosen = &up[rand::random_range(0..up.len())];

        let req = self.create_request(spec);
        chosen.make_request(req, response_tx).await
    }

    /// Best-effort local drop, optionally followed by fanning the drop out
    /// to every remote replica and waiting for one acknowledgement from
    /// each. Local acquisition failure is swallowed; when acquisition
    /// succeeds, `return_shard` always runs even if the drop itself fails,
    /// so a failing drop can never leak the shard's ref count.
    pub async fn drop_database(&self, database: &str, send_to_servers: bool) {
        if let Some(local) = self.local_attachment() {
            let shard_id = self.descriptor.id;
            if let Ok(shard_db) = local.store.get_or_create_shard(shard_id).await {
                if let Err(err) = shard_db.drop_database(database).await {
                    tracing::warn!(shard_id, %err, "local drop_database failed");
                }
                local.store.return_shard(shard_id).await;
            }
        }

        if send_to_servers {
            let servers = self.remote_servers.read().clone();
            let mut handles = Vec::with_capacity(servers.len());

            for server in servers {
                let mut req = Request::new(RequestKind::DropDatabase);
                req.shard_id = Some(self.descriptor.id);
                req.database = Some(database.to_owned());

                let (tx, mut rx) = mpsc::channel(1);
                let handle = tokio::spawn(async move {
                    let _ = server.make_request(req, tx).await;
                    rx.recv().await
                });
                handles.push(handle);
            }

            for handle in handles {
                let _ = handle.await;
            }
        }
    }

    /// Assigns a WAL request number, runs the delete/drop locally and on
    /// every remote replica, and acknowledges each replica's durability via
    /// `WAL.commit` as its stream ends. Remote replicas are drained in the
    /// fixed order they were registered; the local stream is drained last.
    /// `run_local_only` skips the remote fan-out (WAL replay).
    async fn log_and_handle_destructive_query(
        &self,
        spec: Arc<dyn QuerySpec>,
        response_tx: mpsc::Sender<Response>,
        run_local_only: bool,
    ) -> Result<(), Error> {
        let mut req = self.create_request(spec.as_ref());
        req.kind = Some(match spec.kind() {
            QuerySpecKind::DropSeries => RequestKind::DropSeries,
            _ => RequestKind::DeleteFromSeries,
        });
        req.query = Some(spec.query_string_with_time_condition());

        let request_number = self
            .wal
            .assign_sequence_numbers_and_log(&req, &self.descriptor)
            .await?;
        req.request_number = Some(request_number);

        let local_task = self.local_attachment().map(|local| {
            let shard_id = self.descriptor.id;
            let spec = spec.clone();
            let (tx, rx) = mpsc::channel(self.destructive_cap);
            let handle = tokio::spawn(async move {
                match local.store.get_or_create_shard(shard_id).await {
                    Ok(shard_db) => {
                        let mut processor = PassthroughProcessor::new(tx);
                        let result = shard_db.query(spec.as_ref(), &mut processor).await;
                        local.store.return_shard(shard_id).await;
                        processor.close().await;
                        result
                    }
                    Err(err) => {
                        PassthroughProcessor::new(tx).close().await;
                        Err(err)
                    }
                }
            });
            (handle, rx)
        });

        // Accumulate the first failure instead of returning immediately, so
        // every branch below still gets a chance to drain its channel and
        // release ref-counted resources; the caller always sees exactly one
        // final EndStream regardless of how this turned out.
        let mut outcome: Result<(), Error> = Ok(());

        if !run_local_only {
            'servers: for server in self.remote_servers.read().clone() {
                let mut per_server_req = req.clone();
                per_server_req.id = None;

                let (tx, mut rx) = mpsc::channel(128);
                let server_for_call = server.clone();
                let call = tokio::spawn(async move { server_for_call.make_request(per_server_req, tx).await });

                while let Some(resp) = rx.recv().await {
                    if resp.is_end_stream() {
                        if let Err(err) = self.wal.commit(request_number, server.id()).await {
                            outcome = Err(err);
                        }
                        break;
                    }
                    if response_tx.send(resp).await.is_err() {
                        outcome = Err(Error::ChannelClosed);
                        break;
                    }
                }

                match call.await {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => outcome = Err(err),
                    Err(_) => {
                        outcome = Err(Error::Server("remote destructive-query task panicked".into()))
                    }
                }

                if outcome.is_err() {
                    break 'servers;
                }
            }
        }

        match local_task {
            Some((handle, mut rx)) if outcome.is_ok() => {
                while let Some(resp) = rx.recv().await {
                    if resp.is_end_stream() {
                        if let Some(local) = self.local_attachment() {
                            if let Err(err) = self.wal.commit(request_number, local.server_id).await {
                                outcome = Err(err);
                            }
                        }
                        break;
                    }
                    if response_tx.send(resp).await.is_err() {
                        outcome = Err(Error::ChannelClosed);
                        break;
                    }
                }

                match handle.await {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => outcome = Err(err),
                    Err(_) => {
                        outcome = Err(Error::Server("local destructive-query task panicked".into()))
                    }
                }
            }
            Some((_handle, _rx)) => {
                // Remote fan-out already failed; the local task still
                // releases its shard ref-count on its own.
            }
            None => {}
        }

        let _ = response_tx.send(Response::end_stream()).await;
        outcome
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::user::User;
    use crate::wire::Series;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct StubWal {
        next: AtomicU64,
        assigned: Mutex<Vec<Request>>,
        committed: Mutex<Vec<(u64, u32)>>,
    }

    impl StubWal {
        fn new(first: u64) -> Self {
            Self {
                next: AtomicU64::new(first),
                assigned: Mutex::new(Vec::new()),
                committed: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Wal for StubWal {
        async fn assign_sequence_numbers_and_log(
            &self,
            req: &Request,
            _shard: &ShardDescriptor,
        ) -> Result<u64, Error> {
            self.assigned.lock().unwrap().push(req.clone());
            Ok(self.next.fetch_add(1, AtomicOrdering::SeqCst))
        }

        async fn commit(&self, request_number: u64, server_id: u32) -> Result<(), Error> {
            self.committed.lock().unwrap().push((request_number, server_id));
            Ok(())
        }
    }

    struct StubLocalStore {
        writes: Mutex<Vec<Request>>,
    }

    impl StubLocalStore {
        fn new() -> Self {
            Self { writes: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl LocalShardStore for StubLocalStore {
        async fn write(&self, _req: &Request) -> Result<(), Error> {
            Ok(())
        }

        async fn buffer_write(&self, req: &Request) -> Result<(), Error> {
            self.writes.lock().unwrap().push(req.clone());
            Ok(())
        }

        async fn get_or_create_shard(&self, _id: u32) -> Result<Arc<dyn LocalShardDb>, Error> {
            Ok(Arc::new(StubLocalShardDb))
        }

        async fn return_shard(&self, _id: u32) {}

        async fn delete_shard(&self, _id: u32) -> Result<(), Error> {
            Ok(())
        }
    }

    struct StubLocalShardDb;

    #[async_trait]
    impl LocalShardDb for StubLocalShardDb {
        async fn write(&self, _database: &str, _series: &Series) -> Result<(), Error> {
            Ok(())
        }

        async fn query(
            &self,
            _spec: &dyn QuerySpec,
            processor: &mut dyn QueryProcessor,
        ) -> Result<(), Error> {
            processor.yield_point("cpu", &["v".into()], crate::wire::Point::new(Some(1), vec![])).await;
            Ok(())
        }

        async fn drop_database(&self, _database: &str) -> Result<(), Error> {
            Ok(())
        }
    }

    struct StubServer {
        id: u32,
        up: bool,
        buffered: Mutex<Vec<Request>>,
        made_requests: Mutex<Vec<Request>>,
    }

    impl StubServer {
        fn new(id: u32, up: bool) -> Self {
            Self {
                id,
                up,
                buffered: Mutex::new(Vec::new()),
                made_requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ClusterServer for StubServer {
        fn id(&self) -> u32 {
            self.id
        }

        fn is_up(&self) -> bool {
            self.up
        }

        async fn buffer_write(&self, req: &Request) -> Result<(), Error> {
            self.buffered.lock().unwrap().push(req.clone());
            Ok(())
        }

        async fn make_request(&self, req: Request, tx: mpsc::Sender<Response>) -> Result<(), Error> {
            self.made_requests.lock().unwrap().push(req);
            let _ = tx.send(Response::end_stream()).await;
            Ok(())
        }
    }

    struct StubQuerySpec {
        kind: QuerySpecKind,
        run_all: bool,
        multi_series: bool,
        group_by: Option<Duration>,
        has_aggregates: bool,
        user: User,
    }

    impl StubQuerySpec {
        fn simple() -> Self {
            Self {
                kind: QuerySpecKind::Other,
                run_all: false,
                multi_series: false,
                group_by: None,
                has_aggregates: false,
                user: User::cluster_admin("root", "hash"),
            }
        }
    }

    impl QuerySpec for StubQuerySpec {
        fn kind(&self) -> QuerySpecKind {
            self.kind
        }

        fn run_against_all_servers_in_shard(&self) -> bool {
            self.run_all
        }

        fn reads_from_multiple_series(&self) -> bool {
            self.multi_series
        }

        fn group_by_interval(&self) -> Option<Duration> {
            self.group_by
        }

        fn has_aggregates(&self) -> bool {
            self.has_aggregates
        }

        fn select_query(&self) -> String {
            "select".into()
        }

        fn query_string(&self) -> String {
            "select * from cpu".into()
        }

        fn query_string_with_time_condition(&self) -> String {
            "select * from cpu where time > 0".into()
        }

        fn user(&self) -> &User {
            &self.user
        }

        fn database(&self) -> &str {
            "metrics"
        }
    }

    fn descriptor(id: u32, hours: i64) -> ShardDescriptor {
        use chrono::{TimeZone, Utc};
        ShardDescriptor::new(
            id,
            Utc.timestamp_opt(0, 0).unwrap(),
            Utc.timestamp_opt(hours * 3600, 0).unwrap(),
            crate::shard::ShardType::LongTerm,
            vec![],
            false,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn s1_local_write_fan_out() {
        let wal = Arc::new(StubWal::new(42));
        let coordinator = ShardCoordinator::new(descriptor(7, 1), wal.clone());

        let local_store = Arc::new(StubLocalStore::new());
        coordinator.set_local_store(local_store.clone(), 99);

        let server_a = Arc::new(StubServer::new(1, true));
        let server_b = Arc::new(StubServer::new(2, true));
        coordinator.set_servers(vec![server_a.clone(), server_b.clone()]);

        let mut req = Request::new(RequestKind::Write);
        coordinator.write(&mut req).await.unwrap();

        assert_eq!(req.shard_id, Some(7));
        assert_eq!(req.request_number, Some(42));
        assert_eq!(local_store.writes.lock().unwrap().len(), 1);
        assert_eq!(server_a.buffered.lock().unwrap().len(), 1);
        assert_eq!(server_b.buffered.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn s2_remote_query_single_healthy_replica() {
        let wal = Arc::new(StubWal::new(1));
        let coordinator = ShardCoordinator::new(descriptor(3, 1), wal);

        let down = Arc::new(StubServer::new(1, false));
        let up = Arc::new(StubServer::new(2, true));
        coordinator.set_servers(vec![down.clone(), up.clone()]);

        let spec: Arc<dyn QuerySpec> = Arc::new(StubQuerySpec::simple());
        let (tx, mut rx) = mpsc::channel(8);
        coordinator.query(spec, tx).await.unwrap();

        assert_eq!(down.made_requests.lock().unwrap().len(), 0);
        let made = up.made_requests.lock().unwrap();
        assert_eq!(made.len(), 1);
        assert_eq!(made[0].kind, Some(RequestKind::Query));
        assert_eq!(made[0].shard_id, Some(3));
        assert_eq!(made[0].query.as_deref(), Some("select * from cpu"));
        assert_eq!(made[0].is_db_user, Some(false));
        drop(made);

        let resp = rx.recv().await.unwrap();
        assert!(resp.is_end_stream());
    }

    #[tokio::test]
    async fn s3_remote_query_no_replicas_up() {
        let wal = Arc::new(StubWal::new(1));
        let coordinator = ShardCoordinator::new(descriptor(3, 1), wal);

        coordinator.set_servers(vec![
            Arc::new(StubServer::new(1, false)),
            Arc::new(StubServer::new(2, false)),
        ]);

        let spec: Arc<dyn QuerySpec> = Arc::new(StubQuerySpec::simple());
        let (tx, mut rx) = mpsc::channel(8);
        let result = coordinator.query(spec, tx).await;

        assert!(result.is_err());
        let resp = rx.recv().await.unwrap();
        assert!(resp.is_end_stream());
        assert_eq!(resp.error_message.as_deref(), Some("No servers up to query shard 3"));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn s4_destructive_query_commits_each_replica_then_local() {
        let wal = Arc::new(StubWal::new(10));
        let coordinator = ShardCoordinator::new(descriptor(5, 1), wal.clone());
        coordinator.set_local_store(Arc::new(StubLocalStore::new()), 77);

        let server_a = Arc::new(StubServer::new(1, true));
        let server_b = Arc::new(StubServer::new(2, true));
        coordinator.set_servers(vec![server_a.clone(), server_b.clone()]);

        let spec = Arc::new(StubQuerySpec {
            kind: QuerySpecKind::DeleteFromSeries,
            run_all: true,
            ..StubQuerySpec::simple()
        });

        let (tx, mut rx) = mpsc::channel(32);
        coordinator.query(spec, tx).await.unwrap();

        for server in [&server_a, &server_b] {
            let made = server.made_requests.lock().unwrap();
            assert_eq!(made.len(), 1);
            assert_eq!(made[0].id, None);
            assert_eq!(made[0].kind, Some(RequestKind::DeleteFromSeries));
        }

        let committed = wal.committed.lock().unwrap();
        assert!(committed.contains(&(10, 1)));
        assert!(committed.contains(&(10, 2)));
        assert!(committed.contains(&(10, 77)));
        drop(committed);

        let mut saw_end_stream = false;
        while let Some(resp) = rx.recv().await {
            if resp.is_end_stream() {
                saw_end_stream = true;
            }
        }
        assert!(saw_end_stream);
    }

    #[tokio::test]
    async fn s5_local_aggregation_decision() {
        let coordinator = ShardCoordinator::new(descriptor(1, 1), Arc::new(StubWal::new(1)));

        let mut spec = StubQuerySpec::simple();
        spec.group_by = Some(Duration::from_secs(10 * 60));
        assert!(coordinator.should_aggregate_locally(&spec));

        spec.group_by = Some(Duration::from_secs(25 * 60));
        assert!(!coordinator.should_aggregate_locally(&spec));

        let mut split_coordinator_spec = StubQuerySpec::simple();
        split_coordinator_spec.multi_series = true;
        split_coordinator_spec.group_by = Some(Duration::from_secs(10 * 60));

        let split_descriptor = {
            use chrono::{TimeZone, Utc};
            ShardDescriptor::new(
                1,
                Utc.timestamp_opt(0, 0).unwrap(),
                Utc.timestamp_opt(3600, 0).unwrap(),
                crate::shard::ShardType::LongTerm,
                vec![],
                true,
            )
            .unwrap()
        };
        let split = ShardCoordinator::new(split_descriptor, Arc::new(StubWal::new(1)));
        assert!(!split.should_aggregate_locally(&split_coordinator_spec));
    }

    #[tokio::test]
    async fn local_query_forwards_points_then_end_stream() {
        let coordinator = ShardCoordinator::new(descriptor(1, 1), Arc::new(StubWal::new(1)));
        coordinator.set_local_store(Arc::new(StubLocalStore::new()), 1);

        let spec: Arc<dyn QuerySpec> = Arc::new(StubQuerySpec::simple());
        let (tx, mut rx) = mpsc::channel(8);
        coordinator.query(spec, tx).await.unwrap();

        let first = rx.recv().await.unwrap();
        assert!(!first.is_end_stream());
        let second = rx.recv().await.unwrap();
        assert!(second.is_end_stream());
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn local_query_aggregates_locally_when_eligible() {
        // shard_duration = 1h, group_by = 10m divides it evenly, no
        // multi-series split: should_aggregate_locally is true, so the
        // coordinator must bind a query-engine processor to select_query()
        // rather than falling back to a plain passthrough.
        let coordinator = ShardCoordinator::new(descriptor(1, 1), Arc::new(StubWal::new(1)));
        coordinator.set_local_store(Arc::new(StubLocalStore::new()), 1);

        let spec = Arc::new(StubQuerySpec {
            has_aggregates: true,
            group_by: Some(Duration::from_secs(10 * 60)),
            ..StubQuerySpec::simple()
        });
        assert!(coordinator.should_aggregate_locally(spec.as_ref()));

        let (tx, mut rx) = mpsc::channel(8);
        coordinator.query(spec, tx).await.unwrap();

        let first = rx.recv().await.unwrap();
        assert!(!first.is_end_stream());
        let second = rx.recv().await.unwrap();
        assert!(second.is_end_stream());
    }

    #[tokio::test]
    async fn buffer_caps_are_sourced_from_general_config() {
        let general = GeneralConfig {
            query_processor_buffer_small: 7,
            query_processor_buffer_large: 70,
            ..GeneralConfig::default()
        };
        let coordinator = ShardCoordinator::from_config(descriptor(1, 1), Arc::new(StubWal::new(1)), &general);
        assert_eq!(coordinator.buffer_caps(), (7, 70));

        let default_coordinator = ShardCoordinator::new(descriptor(1, 1), Arc::new(StubWal::new(1)));
        assert_eq!(
            default_coordinator.buffer_caps(),
            (PLAIN_PASSTHROUGH_CAP, DESTRUCTIVE_PASSTHROUGH_CAP)
        );
    }

    #[tokio::test]
    async fn drop_database_fans_out_to_local_and_every_remote_server() {
        let coordinator = ShardCoordinator::new(descriptor(1, 1), Arc::new(StubWal::new(1)));
        coordinator.set_local_store(Arc::new(StubLocalStore::new()), 1);

        let server_a = Arc::new(StubServer::new(1, true));
        let server_b = Arc::new(StubServer::new(2, true));
        coordinator.set_servers(vec![server_a.clone(), server_b.clone()]);

        coordinator.drop_database("metrics", true).await;

        for server in [&server_a, &server_b] {
            let made = server.made_requests.lock().unwrap();
            assert_eq!(made.len(), 1);
            assert_eq!(made[0].kind, Some(RequestKind::DropDatabase));
            assert_eq!(made[0].database.as_deref(), Some("metrics"));
        }
    }

    #[tokio::test]
    async fn drop_database_without_send_to_servers_only_touches_local() {
        let coordinator = ShardCoordinator::new(descriptor(1, 1), Arc::new(StubWal::new(1)));
        coordinator.set_local_store(Arc::new(StubLocalStore::new()), 1);

        let server = Arc::new(StubServer::new(1, true));
        coordinator.set_servers(vec![server.clone()]);

        coordinator.drop_database("metrics", false).await;

        assert_eq!(server.made_requests.lock().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn server_ids_is_sorted_union_of_remote_and_local() {
        let coordinator = ShardCoordinator::new(descriptor(1, 1), Arc::new(StubWal::new(1)));
        coordinator.set_servers(vec![
            Arc::new(StubServer::new(9, true)),
            Arc::new(StubServer::new(3, true)),
        ]);
        coordinator.set_local_store(Arc::new(StubLocalStore::new()), 5);

        assert_eq!(coordinator.server_ids(), vec![3, 5, 9]);
    }
}
