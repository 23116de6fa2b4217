//! Processors that turn points yielded by a local shard database into wire
//! [`Response`]s on a caller-facing channel.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::wire::{FieldValue, Point, Response, Series};

/// Sink for points produced by a local query execution. `close` emits the
/// terminal `EndStream` response exactly once, regardless of how many times
/// `yield_point` was called.
#[async_trait]
pub trait QueryProcessor: Send {
    /// Returns `false` to signal the source should stop producing (limit
    /// reached, or the downstream consumer is gone).
    async fn yield_point(&mut self, series_name: &str, column_names: &[String], point: Point) -> bool;

    async fn close(&mut self);
}

/// Channel capacity for DELETE_FROM_SERIES / DROP_SERIES / single-point
/// passthrough queries.
pub const DESTRUCTIVE_PASSTHROUGH_CAP: usize = 10_000;

/// Channel capacity for non-aggregating passthrough queries that aren't on
/// the destructive path.
pub const PLAIN_PASSTHROUGH_CAP: usize = 1_000;

/// Emits one series-name-only row per point yielded, for `SHOW SERIES`-style
/// queries. Column values beyond the series name are discarded.
pub struct ListSeriesProcessor {
    tx: mpsc::Sender<Response>,
    closed: bool,
}

impl ListSeriesProcessor {
    pub fn new(tx: mpsc::Sender<Response>) -> Self {
        Self { tx, closed: false }
    }
}

#[async_trait]
impl QueryProcessor for ListSeriesProcessor {
    async fn yield_point(&mut self, series_name: &str, _column_names: &[String], _point: Point) -> bool {
        let series = Series {
            name: series_name.to_owned(),
            fields: vec!["name".to_owned()],
            points: vec![Point::new(None, vec![FieldValue::String(series_name.to_owned())])],
        };
        self.tx.send(Response::query(series)).await.is_ok()
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            let _ = self.tx.send(Response::end_stream()).await;
        }
    }
}

/// Forwards each yielded point to the caller's channel unchanged, wrapped in
/// its own single-point series. Used for destructive/single-point queries
/// and for plain point queries that don't qualify for local aggregation.
pub struct PassthroughProcessor {
    tx: mpsc::Sender<Response>,
    closed: bool,
}

impl PassthroughProcessor {
    pub fn new(tx: mpsc::Sender<Response>) -> Self {
        Self { tx, closed: false }
    }
}

#[async_trait]
impl QueryProcessor for PassthroughProcessor {
    async fn yield_point(&mut self, series_name: &str, column_names: &[String], point: Point) -> bool {
        let series = Series {
            name: series_name.to_owned(),
            fields: column_names.to_vec(),
            points: vec![point],
        };
        self.tx.send(Response::query(series)).await.is_ok()
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            let _ = self.tx.send(Response::end_stream()).await;
        }
    }
}

/// Bound to a parsed query's select/aggregation plan (`spec.select_query()`)
/// when `should_aggregate_locally` determined the shard can answer the
/// aggregate on its own data. The engine that actually interprets the plan
/// and computes the aggregate buckets is the local storage engine, out of
/// scope for this crate (spec.md §1); this processor only turns whatever
/// points that engine yields into wire `Response`s, identically to
/// `PassthroughProcessor`, but is kept as its own type so the dispatch in
/// `ShardCoordinator::run_local_query` picks between the two processor kinds
/// the spec names rather than collapsing them into one.
pub struct QueryEngineProcessor {
    tx: mpsc::Sender<Response>,
    select_query: String,
    closed: bool,
}

impl QueryEngineProcessor {
    pub fn new(tx: mpsc::Sender<Response>, select_query: String) -> Self {
        Self {
            tx,
            select_query,
            closed: false,
        }
    }

    /// The execution plan this processor is bound to.
    pub fn select_query(&self) -> &str {
        &self.select_query
    }
}

#[async_trait]
impl QueryProcessor for QueryEngineProcessor {
    async fn yield_point(&mut self, series_name: &str, column_names: &[String], point: Point) -> bool {
        let series = Series {
            name: series_name.to_owned(),
            fields: column_names.to_vec(),
            points: vec![point],
        };
        self.tx.send(Response::query(series)).await.is_ok()
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            let _ = self.tx.send(Response::end_stream()).await;
        }
    }
}
