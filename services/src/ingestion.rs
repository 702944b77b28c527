//! The fetch → normalize → persist cycle run by the scheduler.

use std::time::Duration;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use tracing::{error, info, info_span, Instrument};
use util::config;

use crate::error::{FetchError, IngestError};
use crate::metric_store::MetricStore;
use crate::metrics_source::MetricsSourceClient;
use crate::normalizer::MetricsNormalizer;
use crate::scheduler::ScheduledJob;

/// Registration id of the periodic ingestion job.
pub const FETCH_SYSTEM_METRICS: &str = "fetch_system_metrics";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub hostname: String,
    pub host_id: i64,
    pub metric_id: i64,
}

pub struct SystemMetricsJob {
    source: MetricsSourceClient,
    normalizer: MetricsNormalizer,
    store: MetricStore,
}

impl SystemMetricsJob {
    pub fn new(source: MetricsSourceClient, normalizer: MetricsNormalizer, store: MetricStore) -> Self {
        Self {
            source,
            normalizer,
            store,
        }
    }

    /// Builds the job from the global configuration.
    pub fn from_config(db: DatabaseConnection) -> Result<Self, FetchError> {
        let source = MetricsSourceClient::new(
            config::metrics_api_url(),
            Duration::from_secs(config::metrics_fetch_timeout_secs()),
        )?;

        Ok(Self::new(
            source,
            MetricsNormalizer::new(config::time_zone()),
            MetricStore::new(db),
        ))
    }

    /// One full cycle. Nothing is written unless every stage succeeds.
    pub async fn ingest(&self) -> Result<IngestReport, IngestError> {
        let raw = self.source.fetch().await?;
        let sample = self.normalizer.normalize(&raw)?;

        let (host, metric) =
            self.store
                .record(&sample)
                .await
                .map_err(|source| IngestError::Persistence {
                    hostname: sample.host.hostname.clone(),
                    source,
                })?;

        Ok(IngestReport {
            hostname: host.hostname,
            host_id: host.id,
            metric_id: metric.id,
        })
    }
}

#[async_trait]
impl ScheduledJob for SystemMetricsJob {
    fn id(&self) -> &str {
        FETCH_SYSTEM_METRICS
    }

    async fn run(&self) -> bool {
        let span = info_span!("ingest", job_id = FETCH_SYSTEM_METRICS, url = %self.source.url());

        async {
            match self.ingest().await {
                Ok(report) => {
                    info!(
                        hostname = %report.hostname,
                        host_id = report.host_id,
                        metric_id = report.metric_id,
                        "Successfully saved metrics for {}",
                        report.hostname
                    );
                    true
                }
                Err(e) => {
                    error!(
                        stage = e.stage(),
                        hostname = e.hostname().unwrap_or_default(),
                        error = %e,
                        "ingestion failed"
                    );
                    false
                }
            }
        }
        .instrument(span)
        .await
    }
}
