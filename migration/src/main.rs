use std::{fs, io, path::Path};

use colored::*;
use util::config;

mod runner;

#[tokio::main]
async fn main() {
    let db_path = config::database_path();
    let url = if is_dsn(&db_path) {
        db_path.clone()
    } else {
        format!("sqlite://{db_path}?mode=rwc")
    };

    let command = std::env::args().nth(1);
    let result = match command.as_deref() {
        Some("clean") => remove_db_file(&db_path).map_err(|e| e.to_string()),
        Some("fresh") => match remove_db_file(&db_path).and_then(|_| create_db_dir(&db_path)) {
            Ok(()) => runner::run_pending_migrations(&url)
                .await
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        },
        Some("status") => runner::print_status(&url).await.map_err(|e| e.to_string()),
        Some(other) if other != "up" => Err(format!(
            "unknown command `{other}` (expected up, fresh, clean or status)"
        )),
        _ => match create_db_dir(&db_path) {
            Ok(()) => runner::run_pending_migrations(&url)
                .await
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        },
    };

    if let Err(e) = result {
        eprintln!("{} {e}", "error:".red().bold());
        std::process::exit(1);
    }
}

fn is_dsn(path: &str) -> bool {
    path.starts_with("sqlite:") || path.starts_with("postgres://") || path.starts_with("mysql://")
}

fn remove_db_file(path: &str) -> io::Result<()> {
    if is_dsn(path) {
        println!("Refusing to delete a DSN target: {path}");
        return Ok(());
    }
    let db_path = Path::new(path);
    if db_path.exists() {
        fs::remove_file(db_path)?;
        println!("Deleted {}", db_path.display());
    } else {
        println!("Nothing to delete at {}", db_path.display());
    }
    Ok(())
}

fn create_db_dir(path: &str) -> io::Result<()> {
    if is_dsn(path) {
        return Ok(());
    }
    match Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
