use sea_orm::DbErr;

/// Failure to durably record a sample.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error("transaction {action} failed: {source}")]
    Transaction {
        action: &'static str,
        #[source]
        source: DbErr,
    },
}

impl PersistenceError {
    pub fn begin(source: DbErr) -> Self {
        PersistenceError::Transaction {
            action: "begin",
            source,
        }
    }

    pub fn commit(source: DbErr) -> Self {
        PersistenceError::Transaction {
            action: "commit",
            source,
        }
    }
}
