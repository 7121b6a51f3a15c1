//! Application state shared by route builders and the readiness check.

use sea_orm::DatabaseConnection;

/// Shared application state.
///
/// Cloning is cheap: the connection is a pool handle.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    /// PostgreSQL pool; `None` when running on the in-memory store
    pub db: Option<DatabaseConnection>,
}
