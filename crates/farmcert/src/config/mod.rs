use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::certificate::CertificatePolicy;
use crate::workflows::inspection::EvaluationConfig;

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
    pub evaluation: EvaluationConfig,
    pub certificate: CertificatePolicy,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(&var_or("APP_ENV", "development"));
        let server = ServerConfig {
            host: var_or("APP_HOST", "127.0.0.1"),
            port: var_or("APP_PORT", "3000")
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort)?,
        };
        let telemetry = TelemetryConfig {
            log_level: var_or("APP_LOG_LEVEL", "info"),
        };

        let secondary_pass_threshold = parse_u8(
            "APP_SECONDARY_PASS_THRESHOLD",
            |value| value <= 100,
            |value| ConfigError::InvalidPassThreshold { value },
        )?
        .unwrap_or(EvaluationConfig::default().secondary_pass_threshold);

        let validity_years = parse_u8(
            "APP_CERTIFICATE_VALIDITY_YEARS",
            |value| value > 0,
            |value| ConfigError::InvalidValidityYears { value },
        )?
        .unwrap_or(CertificatePolicy::default().validity_years);

        Ok(Self {
            environment,
            server,
            telemetry,
            evaluation: EvaluationConfig {
                secondary_pass_threshold,
            },
            certificate: CertificatePolicy { validity_years },
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// `Ok(None)` when the variable is unset; an error when it is set but out of range.
fn parse_u8(
    name: &str,
    accept: impl Fn(u8) -> bool,
    invalid: impl Fn(String) -> ConfigError,
) -> Result<Option<u8>, ConfigError> {
    let Ok(raw) = env::var(name) else {
        return Ok(None);
    };
    match raw.trim().parse::<u8>() {
        Ok(value) if accept(value) => Ok(Some(value)),
        _ => Err(invalid(raw)),
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

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidPassThreshold { value: String },
    InvalidValidityYears { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidPassThreshold { value } => write!(
                f,
                "APP_SECONDARY_PASS_THRESHOLD must be a percentage between 0 and 100 (found '{value}')"
            ),
            ConfigError::InvalidValidityYears { value } => write!(
                f,
                "APP_CERTIFICATE_VALIDITY_YEARS must be a positive number of years (found '{value}')"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidPassThreshold { .. }
            | ConfigError::InvalidValidityYears { .. } => None,
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
        env::remove_var("APP_SECONDARY_PASS_THRESHOLD");
        env::remove_var("APP_CERTIFICATE_VALIDITY_YEARS");
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
        assert_eq!(config.evaluation.secondary_pass_threshold, 60);
        assert_eq!(config.certificate.validity_years, 3);
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
    fn rejects_threshold_above_one_hundred() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_SECONDARY_PASS_THRESHOLD", "120");
        match AppConfig::load() {
            Err(ConfigError::InvalidPassThreshold { value }) => assert_eq!(value, "120"),
            other => panic!("expected invalid threshold, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn reads_threshold_and_validity_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_SECONDARY_PASS_THRESHOLD", "75");
        env::set_var("APP_CERTIFICATE_VALIDITY_YEARS", "2");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.evaluation.secondary_pass_threshold, 75);
        assert_eq!(config.certificate.validity_years, 2);
        reset_env();
    }

    #[test]
    fn rejects_zero_or_non_numeric_validity() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        for raw in ["0", "three"] {
            reset_env();
            env::set_var("APP_CERTIFICATE_VALIDITY_YEARS", raw);
            match AppConfig::load() {
                Err(ConfigError::InvalidValidityYears { value }) => assert_eq!(value, raw),
                other => panic!("expected invalid validity for {raw}, got {other:?}"),
            }
        }
        reset_env();
    }
}
