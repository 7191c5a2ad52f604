use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_REGISTRATION_ENDPOINT: &str = "http://127.0.0.1:8080/api/registration-requests";
const DEFAULT_MAX_SESSIONS: usize = 10_000;
const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;

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

/// Top-level configuration for the registration service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub registration: RegistrationConfig,
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

        let submission_endpoint = env::var("APP_REGISTRATION_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_REGISTRATION_ENDPOINT.to_string());
        if !(submission_endpoint.starts_with("http://")
            || submission_endpoint.starts_with("https://"))
        {
            return Err(ConfigError::InvalidEndpoint(submission_endpoint));
        }

        let max_sessions = parse_or("APP_MAX_SESSIONS", DEFAULT_MAX_SESSIONS)?;
        if max_sessions == 0 {
            return Err(ConfigError::InvalidNumber {
                key: "APP_MAX_SESSIONS",
            });
        }
        let idle_secs = parse_or("APP_SESSION_IDLE_SECS", DEFAULT_SESSION_IDLE_SECS)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment == AppEnvironment::Development,
                include_targets: environment != AppEnvironment::Production,
            },
            registration: RegistrationConfig {
                submission_endpoint,
                options_path: optional_path("APP_OPTIONS_PATH"),
                directory_path: optional_path("APP_DIRECTORY_PATH"),
                max_sessions,
                session_idle_timeout: Duration::from_secs(idle_secs),
            },
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        _ => Ok(default),
    }
}

fn optional_path(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
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
    pub ansi: bool,
    pub include_targets: bool,
}

/// Where registrations are sent and where option data comes from.
#[derive(Debug, Clone)]
pub struct RegistrationConfig {
    pub submission_endpoint: String,
    /// JSON option catalog; the bundled catalog is used when unset.
    pub options_path: Option<PathBuf>,
    /// JSON tracks/branches directory; the bundled directory is used when unset.
    pub directory_path: Option<PathBuf>,
    /// Upper bound on live registration sessions.
    pub max_sessions: usize,
    /// Sessions untouched for this long are dropped.
    pub session_idle_timeout: Duration,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidEndpoint(String),
    InvalidNumber { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidEndpoint(value) => write!(
                f,
                "APP_REGISTRATION_ENDPOINT must be an http(s) URL, got '{}'",
                value
            ),
            ConfigError::InvalidNumber { key } => {
                write!(f, "{} must be a positive whole number", key)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort
            | ConfigError::InvalidEndpoint(_)
            | ConfigError::InvalidNumber { .. } => None,
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
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_REGISTRATION_ENDPOINT",
            "APP_OPTIONS_PATH",
            "APP_DIRECTORY_PATH",
            "APP_MAX_SESSIONS",
            "APP_SESSION_IDLE_SECS",
        ] {
            env::remove_var(key);
        }
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
        assert_eq!(
            config.registration.submission_endpoint,
            DEFAULT_REGISTRATION_ENDPOINT
        );
        assert!(config.registration.options_path.is_none());
        assert_eq!(config.registration.max_sessions, DEFAULT_MAX_SESSIONS);
        assert_eq!(
            config.registration.session_idle_timeout,
            Duration::from_secs(DEFAULT_SESSION_IDLE_SECS)
        );
    }

    #[test]
    fn session_limits_come_from_env() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_MAX_SESSIONS", "250");
        env::set_var("APP_SESSION_IDLE_SECS", "90");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.registration.max_sessions, 250);
        assert_eq!(
            config.registration.session_idle_timeout,
            Duration::from_secs(90)
        );

        env::set_var("APP_MAX_SESSIONS", "0");
        let err = AppConfig::load().expect_err("zero sessions rejected");
        assert!(matches!(
            err,
            ConfigError::InvalidNumber {
                key: "APP_MAX_SESSIONS"
            }
        ));
        reset_env();
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
    fn rejects_non_http_endpoint() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_REGISTRATION_ENDPOINT", "ftp://registrations");
        let err = AppConfig::load().expect_err("endpoint rejected");
        assert!(matches!(err, ConfigError::InvalidEndpoint(_)));
        reset_env();
    }

    #[test]
    fn production_disables_ansi_and_targets() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "prod");
        env::set_var("APP_OPTIONS_PATH", "/etc/iti/options.json");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.environment, AppEnvironment::Production);
        assert!(!config.telemetry.ansi);
        assert!(!config.telemetry.include_targets);
        assert_eq!(
            config.registration.options_path,
            Some(PathBuf::from("/etc/iti/options.json"))
        );
        reset_env();
    }
}
