//! Application state container shared across Axum route handlers and services.
//!
//! It holds the database connection and the HTTP client used to reach the
//! metrics agent, and is passed into route handlers via Axum's `State<T>` extractor.

use std::time::Duration;

use sea_orm::DatabaseConnection;

/// Central application state shared across the server.
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    http: reqwest::Client,
}

impl AppState {
    /// Creates a new `AppState` with the given database connection.
    ///
    /// The embedded HTTP client is bounded by `fetch_timeout`.
    pub fn new(db: DatabaseConnection, fetch_timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .unwrap_or_default();
        Self { db, http }
    }

    /// Returns a shared reference to the internal `DatabaseConnection`.
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Returns the shared HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }
}

impl AppState {
    /// Returns a cloned copy of the database connection.
    ///
    /// Useful for spawned tasks that require ownership.
    pub fn db_clone(&self) -> DatabaseConnection {
        self.db.clone()
    }
}
