use db::PersistenceError;
use db::models::{host, system_metric};
use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};
use tracing::{debug, warn};

use crate::normalizer::NormalizedSample;

/// Writes a host upsert and its sample as one unit of work.
#[derive(Clone, Debug)]
pub struct MetricStore {
    db: DatabaseConnection,
}

impl MetricStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Either both rows land or neither does. The transaction is always
    /// finished (committed or rolled back) before this returns.
    pub async fn record(
        &self,
        sample: &NormalizedSample,
    ) -> Result<(host::Model, system_metric::Model), PersistenceError> {
        let txn = self.db.begin().await.map_err(PersistenceError::begin)?;

        match Self::write(&txn, sample).await {
            Ok(rows) => {
                txn.commit().await.map_err(PersistenceError::commit)?;
                debug!(hostname = %sample.host.hostname, "sample committed");
                Ok(rows)
            }
            Err(e) => {
                if let Err(rollback) = txn.rollback().await {
                    warn!(
                        hostname = %sample.host.hostname,
                        error = %rollback,
                        "rollback failed"
                    );
                }
                Err(e.into())
            }
        }
    }

    async fn write(
        txn: &DatabaseTransaction,
        sample: &NormalizedSample,
    ) -> Result<(host::Model, system_metric::Model), DbErr> {
        let host = host::Model::upsert(
            txn,
            &sample.host.hostname,
            &sample.host.ip_address,
            &sample.host.os_info,
            sample.host.cpu_cores,
        )
        .await?;

        let metric = system_metric::Model::append(txn, host.id, &sample.metric).await?;
        Ok((host, metric))
    }
}
