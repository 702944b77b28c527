use colored::*;
use futures::FutureExt;
use migration::Migrator;
use sea_orm::DatabaseConnection;
use sea_orm_migration::prelude::*;
use std::io::{self, Write};
use std::time::Instant;

const STATUS_COLUMN: usize = 72;

async fn connect(url: &str) -> Result<DatabaseConnection, DbErr> {
    sea_orm::Database::connect(url).await
}

/// Applies pending migrations one at a time so each gets its own status line.
/// Stops at the first failure; a panicking migration is reported as a failure.
pub async fn run_pending_migrations(url: &str) -> Result<(), DbErr> {
    let db = connect(url).await?;
    let pending = Migrator::get_pending_migrations(&db).await?;

    if pending.is_empty() {
        println!("{}", "Schema is up to date".dimmed());
        return Ok(());
    }

    println!("Applying {} migration(s) to {}", pending.len(), url.bold());
    for migration in pending {
        let label = format!("  {}", migration.name());
        let dots = ".".repeat(STATUS_COLUMN.saturating_sub(label.len()));
        print!("{label}{dots} ");
        io::stdout().flush().ok();

        let start = Instant::now();
        let outcome = std::panic::AssertUnwindSafe(Migrator::up(&db, Some(1)))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                Err(DbErr::Migration(format!(
                    "{} panicked",
                    migration.name()
                )))
            });

        match outcome {
            Ok(()) => println!("{} {}", "ok".green(), format!("({:.2?})", start.elapsed()).dimmed()),
            Err(err) => {
                println!("{}", "failed".red());
                return Err(err);
            }
        }
    }

    Ok(())
}

pub async fn print_status(url: &str) -> Result<(), DbErr> {
    let db = connect(url).await?;

    for migration in Migrator::get_migration_with_status(&db).await? {
        let status = format!("{:?}", migration.status());
        let status = if status == "Applied" {
            status.green()
        } else {
            status.yellow()
        };
        println!("{:<60} {}", migration.name(), status);
    }

    Ok(())
}
