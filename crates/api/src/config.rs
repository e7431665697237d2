use serde::Deserialize;
use std::net::{AddrParseError, SocketAddr};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    /// Admin session lifetime and login lockout
    #[serde(default)]
    pub session: SessionConfig,
    /// Admin session cookie attributes
    #[serde(default)]
    pub cookie: CookieConfig,
    /// First-admin bootstrap
    #[serde(default)]
    pub admin: AdminBootstrapConfig,
    /// Static marketing site serving
    #[serde(default)]
    pub frontend: FrontendConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl From<&DatabaseConfig> for persistence::db::DatabaseConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            connect_timeout_secs: config.connect_timeout_secs,
            idle_timeout_secs: config.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Per-client limit on the public POST endpoints. 0 disables limiting.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,

    /// Only enable behind TLS termination.
    #[serde(default)]
    pub hsts_enabled: bool,

    #[serde(default = "default_hsts_max_age")]
    pub hsts_max_age_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Lifetime of an admin session row (default: 86400 = 24 hours)
    #[serde(default = "default_session_ttl")]
    pub ttl_secs: i64,

    /// Failed password attempts before the account is locked. 0 disables the lockout.
    #[serde(default = "default_max_failed_login_attempts")]
    pub max_failed_login_attempts: i32,

    /// How often expired sessions are purged
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_minutes: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_session_ttl(),
            max_failed_login_attempts: default_max_failed_login_attempts(),
            cleanup_interval_minutes: default_cleanup_interval(),
        }
    }
}

impl SessionConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.ttl_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CookieConfig {
    #[serde(default = "default_cookie_name")]
    pub name: String,

    /// Browser-side lifetime (default: 2592000 = 30 days). The server-side
    /// session may expire earlier; the session check then clears the cookie.
    #[serde(default = "default_cookie_max_age")]
    pub max_age_secs: i64,

    #[serde(default)]
    pub secure: bool,

    /// Strict, Lax or None
    #[serde(default = "default_same_site")]
    pub same_site: String,

    #[serde(default)]
    pub domain: String,

    #[serde(default = "default_cookie_path")]
    pub path: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: default_cookie_name(),
            max_age_secs: default_cookie_max_age(),
            secure: false,
            same_site: default_same_site(),
            domain: String::new(),
            path: default_cookie_path(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminBootstrapConfig {
    #[serde(default)]
    pub bootstrap_email: String,

    #[serde(default)]
    pub bootstrap_password: String,

    #[serde(default)]
    pub bootstrap_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FrontendConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Directory holding the static export of the marketing site
    #[serde(default = "default_frontend_dir")]
    pub base_dir: String,

    #[serde(default = "default_immutable_cache_max_age")]
    pub immutable_cache_max_age: u64,

    #[serde(default = "default_mutable_cache_max_age")]
    pub mutable_cache_max_age: u64,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_dir: default_frontend_dir(),
            immutable_cache_max_age: default_immutable_cache_max_age(),
            mutable_cache_max_age: default_mutable_cache_max_age(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_body_size() -> usize {
    65_536
}
fn default_max_connections() -> u32 {
    10
}
fn default_min_connections() -> u32 {
    2
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_rate_limit() -> u32 {
    20
}
fn default_hsts_max_age() -> u64 {
    31_536_000
}
fn default_session_ttl() -> i64 {
    86_400
}
fn default_max_failed_login_attempts() -> i32 {
    5
}
fn default_cleanup_interval() -> u64 {
    60
}
fn default_cookie_name() -> String {
    "admin_session".to_string()
}
fn default_cookie_max_age() -> i64 {
    2_592_000
}
fn default_same_site() -> String {
    "Lax".to_string()
}
fn default_cookie_path() -> String {
    "/".to_string()
}
fn default_frontend_dir() -> String {
    "./frontend/out".to_string()
}
fn default_immutable_cache_max_age() -> u64 {
    31_536_000
}
fn default_mutable_cache_max_age() -> u64 {
    60
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with SUBTRACK__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("SUBTRACK")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("security.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// Builds entirely from embedded defaults so tests never touch the filesystem.
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30
            max_body_size = 65536

            [database]
            url = ""
            max_connections = 10
            min_connections = 2
            connect_timeout_secs = 10
            idle_timeout_secs = 600

            [logging]
            level = "info"
            format = "json"

            [security]
            cors_origins = []
            rate_limit_per_minute = 20
            hsts_enabled = false

            [session]
            ttl_secs = 86400
            max_failed_login_attempts = 5
            cleanup_interval_minutes = 60

            [cookie]
            name = "admin_session"
            max_age_secs = 2592000
            secure = false
            same_site = "Lax"
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        // Validation is left to the caller so tests can inspect partial configs
        builder.build()?.try_deserialize()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "SUBTRACK__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.session.ttl_secs <= 0 {
            return Err(ConfigValidationError::InvalidValue(
                "session.ttl_secs must be positive".to_string(),
            ));
        }

        if self.session.cleanup_interval_minutes == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "session.cleanup_interval_minutes must be positive".to_string(),
            ));
        }

        match self.cookie.same_site.to_ascii_lowercase().as_str() {
            "strict" | "lax" => {}
            "none" if self.cookie.secure => {}
            "none" => {
                return Err(ConfigValidationError::InvalidValue(
                    "cookie.same_site = None requires cookie.secure = true".to_string(),
                ))
            }
            other => {
                return Err(ConfigValidationError::InvalidValue(format!(
                    "cookie.same_site must be Strict, Lax or None, got '{}'",
                    other
                )))
            }
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}
