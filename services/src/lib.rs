pub mod error;
pub mod ingestion;
pub mod metric_store;
pub mod metrics_source;
pub mod normalizer;
pub mod scheduler;
pub mod summary;

#[cfg(test)]
mod test_support;

pub use error::{FetchError, IngestError, NormalizationError};
pub use ingestion::{FETCH_SYSTEM_METRICS, SystemMetricsJob};
pub use scheduler::{JobStats, ScheduledJob, Scheduler, TickOutcome};
