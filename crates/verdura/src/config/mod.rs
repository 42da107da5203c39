use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

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

/// Which rating-provider environment the engine talks to. Sandbox carrier
/// identifiers are not interchangeable with production ones, so carrier
/// resolution differs between the two modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingMode {
    Production,
    Sandbox,
}

impl RatingMode {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "sandbox" | "test" => Self::Sandbox,
            _ => Self::Production,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            RatingMode::Production => "production",
            RatingMode::Sandbox => "sandbox",
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub rating: RatingConfig,
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

        let rating = RatingConfig::from_env()?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            rating,
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Outbound rating-provider settings resolved from the environment.
#[derive(Debug, Clone)]
pub struct RatingConfig {
    pub enabled: bool,
    pub mode: RatingMode,
    pub api_key: Option<String>,
    pub sandbox_api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl RatingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let enabled = env::var("SHIPPING_RATING_ENABLED")
            .map(|value| !matches!(value.trim().to_ascii_lowercase().as_str(), "0" | "false" | "off"))
            .unwrap_or(true);

        let mode = RatingMode::from_str(
            &env::var("SHIPPING_RATING_MODE").unwrap_or_else(|_| "production".to_string()),
        );

        let api_key = env::var("SHIPENGINE_API_KEY").ok().filter(|key| !key.trim().is_empty());
        let sandbox_api_key = env::var("SHIPENGINE_SANDBOX_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        let base_url = env::var("SHIPENGINE_BASE_URL")
            .unwrap_or_else(|_| "https://api.shipengine.com".to_string());

        let timeout_secs = env::var("SHIPPING_RATING_TIMEOUT_SECS")
            .unwrap_or_else(|_| "20".to_string())
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidTimeout)?;

        Ok(Self {
            enabled,
            mode,
            api_key,
            sandbox_api_key,
            base_url,
            timeout_secs,
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidTimeout,
    InvalidHost { source: std::net::AddrParseError },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidTimeout => {
                write!(f, "SHIPPING_RATING_TIMEOUT_SECS must be a whole number of seconds")
            }
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidTimeout => None,
            ConfigError::InvalidHost { source } => Some(source),
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
        env::remove_var("SHIPPING_RATING_ENABLED");
        env::remove_var("SHIPPING_RATING_MODE");
        env::remove_var("SHIPENGINE_API_KEY");
        env::remove_var("SHIPENGINE_SANDBOX_API_KEY");
        env::remove_var("SHIPENGINE_BASE_URL");
        env::remove_var("SHIPPING_RATING_TIMEOUT_SECS");
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
        assert!(config.rating.enabled);
        assert_eq!(config.rating.mode, RatingMode::Production);
        assert_eq!(config.rating.base_url, "https://api.shipengine.com");
        assert_eq!(config.rating.timeout_secs, 20);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn sandbox_mode_and_disable_flag_are_parsed() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SHIPPING_RATING_MODE", "sandbox");
        env::set_var("SHIPPING_RATING_ENABLED", "false");
        env::set_var("SHIPENGINE_SANDBOX_API_KEY", "se-test-123");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.rating.mode, RatingMode::Sandbox);
        assert!(!config.rating.enabled);
        assert_eq!(config.rating.sandbox_api_key.as_deref(), Some("se-test-123"));
    }
}
