// MetricsSource: the opaque provider of one Snapshot per call

use futures_util::future::BoxFuture;

use crate::models::Snapshot;

/// A failed sample. The coordinator treats every variant as "no data this cycle".
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("metrics source unavailable: {0}")]
    Unavailable(String),
    #[error("sampling task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub trait MetricsSource: Send + Sync + 'static {
    /// Collects one snapshot. May take longer than the tick interval; the coordinator
    /// never issues a second call while one is pending.
    fn sample(&self) -> BoxFuture<'_, Result<Snapshot, SourceError>>;
}
