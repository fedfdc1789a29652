use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::workflows::contract::ClassifierConfig;

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
    pub analysis: AnalysisConfig,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            analysis: AnalysisConfig::from_env()?,
        })
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

/// Knobs for the contract analysis pipeline that are allowed to vary per deployment.
///
/// Scoring thresholds are not configurable; see
/// [`ScoringConfig::canonical`](crate::workflows::contract::ScoringConfig::canonical).
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub benchmark_csv: Option<PathBuf>,
    pub sentiment_threshold: f32,
    pub max_risk_flags: usize,
}

impl AnalysisConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = ClassifierConfig::default();

        let benchmark_csv = env::var("LEASE_BENCHMARK_CSV")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let sentiment_threshold = match env::var("LEASE_SENTIMENT_THRESHOLD") {
            Ok(raw) => raw
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|value| *value > 0.0 && *value <= 1.0)
                .ok_or(ConfigError::InvalidSentimentThreshold(raw))?,
            Err(_) => defaults.sentiment_threshold,
        };

        let max_risk_flags = match env::var("LEASE_MAX_RISK_FLAGS") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|value| *value > 0)
                .ok_or(ConfigError::InvalidRiskFlagCap(raw))?,
            Err(_) => defaults.max_flags,
        };

        Ok(Self {
            benchmark_csv,
            sentiment_threshold,
            max_risk_flags,
        })
    }

    pub fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig {
            sentiment_threshold: self.sentiment_threshold,
            max_flags: self.max_risk_flags,
            ..ClassifierConfig::default()
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let defaults = ClassifierConfig::default();
        Self {
            benchmark_csv: None,
            sentiment_threshold: defaults.sentiment_threshold,
            max_risk_flags: defaults.max_flags,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidSentimentThreshold(String),
    InvalidRiskFlagCap(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidSentimentThreshold(raw) => write!(
                f,
                "LEASE_SENTIMENT_THRESHOLD must be a number in (0, 1], got '{raw}'"
            ),
            ConfigError::InvalidRiskFlagCap(raw) => write!(
                f,
                "LEASE_MAX_RISK_FLAGS must be a positive integer, got '{raw}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidSentimentThreshold(_)
            | ConfigError::InvalidRiskFlagCap(_) => None,
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
        env::remove_var("LEASE_BENCHMARK_CSV");
        env::remove_var("LEASE_SENTIMENT_THRESHOLD");
        env::remove_var("LEASE_MAX_RISK_FLAGS");
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
        assert_eq!(config.analysis, AnalysisConfig::default());
        assert_eq!(config.analysis.max_risk_flags, 5);
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
    fn rejects_out_of_range_sentiment_threshold() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("LEASE_SENTIMENT_THRESHOLD", "1.5");
        let error = AppConfig::load().expect_err("threshold rejected");
        assert!(matches!(error, ConfigError::InvalidSentimentThreshold(ref raw) if raw == "1.5"));
        reset_env();
    }

    #[test]
    fn analysis_overrides_flow_into_classifier_config() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("LEASE_SENTIMENT_THRESHOLD", "0.65");
        env::set_var("LEASE_MAX_RISK_FLAGS", "3");
        env::set_var("LEASE_BENCHMARK_CSV", "data/benchmark.csv");
        let config = AppConfig::load().expect("config loads");
        let classifier = config.analysis.classifier_config();
        assert_eq!(classifier.max_flags, 3);
        assert!((classifier.sentiment_threshold - 0.65).abs() < f32::EPSILON);
        assert_eq!(
            config.analysis.benchmark_csv,
            Some(PathBuf::from("data/benchmark.csv"))
        );
        reset_env();
    }

    #[test]
    fn rejects_zero_risk_flag_cap() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("LEASE_MAX_RISK_FLAGS", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidRiskFlagCap(_))
        ));
        reset_env();
    }
}
