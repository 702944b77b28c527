use chrono::{DateTime, Utc};
use migration::Migrator;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use crate::models::system_metric::NewSystemMetric;

pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory db");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Sample with fixed byte counts and the given percentages.
pub fn sample(
    timestamp: DateTime<Utc>,
    cpu_usage: f64,
    memory_percent: f64,
    disk_percent: f64,
) -> NewSystemMetric {
    NewSystemMetric {
        timestamp,
        cpu_usage,
        memory_total: 8_589_934_592,
        memory_used: (8_589_934_592_f64 * memory_percent / 100.0) as i64,
        memory_percent,
        disk_total: 107_374_182_400,
        disk_used: (107_374_182_400_f64 * disk_percent / 100.0) as i64,
        disk_percent,
    }
}
