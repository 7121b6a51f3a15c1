use sea_orm::DatabaseConnection;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::common::DatabaseError;

/// Ping the pool; used by the readiness endpoint.
pub async fn check_health(db: &DatabaseConnection) -> Result<(), DatabaseError> {
    debug!("Running PostgreSQL health check");

    db.ping().await.map_err(|e| {
        DatabaseError::HealthCheckFailed(format!("PostgreSQL health check failed: {}", e))
    })?;

    debug!("PostgreSQL health check passed");
    Ok(())
}

/// Outcome of a timed health check
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub healthy: bool,
    pub latency: Duration,
    pub error: Option<String>,
}

/// Ping the pool and report latency instead of failing.
pub async fn check_health_detailed(db: &DatabaseConnection) -> HealthStatus {
    let started = Instant::now();
    let result = check_health(db).await;

    HealthStatus {
        healthy: result.is_ok(),
        latency: started.elapsed(),
        error: result.err().map(|e| e.to_string()),
    }
}
