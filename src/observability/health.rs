//! Health Checks
//!
//! Server health status and diagnostics.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;

/// Health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Individual health check result
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub duration_ms: u64,
}

/// System health summary
#[derive(Debug, Clone, Serialize)]
pub struct SystemHealth {
    pub status: HealthStatus,
    pub uptime_secs: u64,
    pub version: String,
    pub checks: Vec<CheckResult>,
}

/// Health check function type
pub type CheckFn = Box<dyn Fn() -> (HealthStatus, Option<String>) + Send + Sync>;

/// Health check manager
pub struct HealthCheck {
    checks: HashMap<String, CheckFn>,
    start_time: Instant,
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthCheck {
    pub fn new() -> Self {
        Self {
            checks: HashMap::new(),
            start_time: Instant::now(),
        }
    }

    /// Register a health check
    pub fn register<F>(&mut self, name: &str, check: F)
    where
        F: Fn() -> (HealthStatus, Option<String>) + Send + Sync + 'static,
    {
        self.checks.insert(name.to_string(), Box::new(check));
    }

    /// Run all health checks
    pub fn check(&self) -> SystemHealth {
        let mut results = Vec::new();
        let mut overall = HealthStatus::Healthy;

        for (name, check_fn) in &self.checks {
            let start = Instant::now();
            let (status, message) = check_fn();
            let duration = start.elapsed();

            match status {
                HealthStatus::Unhealthy => overall = HealthStatus::Unhealthy,
                HealthStatus::Degraded if overall == HealthStatus::Healthy => {
                    overall = HealthStatus::Degraded;
                }
                _ => {}
            }

            results.push(CheckResult {
                name: name.clone(),
                status,
                message,
                duration_ms: duration.as_millis() as u64,
            });
        }

        SystemHealth {
            status: overall,
            uptime_secs: self.start_time.elapsed().as_secs(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            checks: results,
        }
    }

    /// Simple liveness check
    pub fn liveness(&self) -> bool {
        true // If we can execute this, we're alive
    }

    /// Get uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}
