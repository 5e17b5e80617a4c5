use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::scoring::MAX_SCORE;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub scores: ScoreMaintenanceConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let recompute_workers = env::var("APP_RECOMPUTE_WORKERS")
            .ok()
            .map(|raw| parse_workers(&raw))
            .transpose()?
            .unwrap_or(ScoreMaintenanceConfig::DEFAULT_WORKERS);

        let watchlist_threshold = env::var("APP_WATCHLIST_THRESHOLD")
            .ok()
            .map(|raw| parse_threshold(&raw))
            .transpose()?
            .unwrap_or(ScoreMaintenanceConfig::DEFAULT_WATCHLIST_THRESHOLD);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            scores: ScoreMaintenanceConfig {
                recompute_workers,
                watchlist_threshold,
            },
        })
    }
}

fn parse_workers(raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(workers) if workers > 0 => Ok(workers),
        _ => Err(ConfigError::InvalidWorkers {
            value: raw.to_string(),
        }),
    }
}

fn parse_threshold(raw: &str) -> Result<f64, ConfigError> {
    match raw.trim().parse::<f64>() {
        Ok(threshold) if (0.0..=MAX_SCORE).contains(&threshold) => Ok(threshold),
        _ => Err(ConfigError::InvalidThreshold {
            value: raw.to_string(),
        }),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Knobs for score recomputation and the watchlist projection.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMaintenanceConfig {
    pub recompute_workers: usize,
    pub watchlist_threshold: f64,
}

impl ScoreMaintenanceConfig {
    pub const DEFAULT_WORKERS: usize = 4;
    pub const DEFAULT_WATCHLIST_THRESHOLD: f64 = 7.0;
}

impl Default for ScoreMaintenanceConfig {
    fn default() -> Self {
        Self {
            recompute_workers: Self::DEFAULT_WORKERS,
            watchlist_threshold: Self::DEFAULT_WATCHLIST_THRESHOLD,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidWorkers { value: String },
    InvalidThreshold { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must be an IP address or 'localhost'")
            }
            ConfigError::InvalidWorkers { value } => write!(
                f,
                "APP_RECOMPUTE_WORKERS must be a positive integer (got '{}')",
                value
            ),
            ConfigError::InvalidThreshold { value } => write!(
                f,
                "APP_WATCHLIST_THRESHOLD must be a number between 0 and 10 (got '{}')",
                value
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidWorkers { .. }
            | ConfigError::InvalidThreshold { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("APP_RECOMPUTE_WORKERS");
        env::remove_var("APP_WATCHLIST_THRESHOLD");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.scores, ScoreMaintenanceConfig::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn reads_score_maintenance_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "prod");
        env::set_var("APP_RECOMPUTE_WORKERS", "8");
        env::set_var("APP_WATCHLIST_THRESHOLD", "6.5");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.environment, AppEnvironment::Production);
        assert_eq!(config.scores.recompute_workers, 8);
        assert_eq!(config.scores.watchlist_threshold, 6.5);
        reset_env();
    }

    #[test]
    fn rejects_zero_workers() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_RECOMPUTE_WORKERS", "0");
        let err = AppConfig::load().expect_err("zero workers rejected");
        assert!(matches!(err, ConfigError::InvalidWorkers { .. }));
        reset_env();
    }

    #[test]
    fn rejects_threshold_outside_score_range() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_WATCHLIST_THRESHOLD", "12");
        let err = AppConfig::load().expect_err("threshold rejected");
        assert!(err.to_string().contains("APP_WATCHLIST_THRESHOLD"));
        reset_env();
    }
}
