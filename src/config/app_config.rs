use std::net::{AddrParseError, IpAddr, SocketAddr};

use serde::Deserialize;

/// Longest accepted token lifetime (ten years)
const MAX_JWT_EXPIRATION_HOURS: u64 = 24 * 365 * 10;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub storage: StorageSettings,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Storage backend settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// `memory`, `postgres` or `postgres-mapped`
    pub backend: String,
    /// Falls back to the `DATABASE_URL` environment variable
    pub database_url: Option<String>,
    pub max_connections: u32,
    /// Seed two demo customers into the in-memory backend
    pub seed_demo_data: bool,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Falls back to the `JWT_SECRET` environment variable, then a random secret
    pub jwt_secret: Option<String>,
    pub jwt_issuer: String,
    pub jwt_expiration_hours: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            database_url: None,
            max_connections: 10,
            seed_demo_data: false,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            jwt_issuer: "customer-directory".to_string(),
            jwt_expiration_hours: 24 * 15,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[hidden]"))
            .field("jwt_issuer", &self.jwt_issuer)
            .field("jwt_expiration_hours", &self.jwt_expiration_hours)
            .finish()
    }
}

impl StorageSettings {
    /// Configured database URL, else `DATABASE_URL`
    pub fn resolve_database_url(&self) -> Option<String> {
        self.database_url
            .clone()
            .filter(|url| !url.is_empty())
            .or_else(|| std::env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()))
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: Self = config.try_deserialize()?;
        app_config.validate()?;

        Ok(app_config)
    }

    /// Reject values that deserialize but cannot be used
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        let hours = self.auth.jwt_expiration_hours;

        if hours == 0 || hours > MAX_JWT_EXPIRATION_HOURS {
            return Err(config::ConfigError::Message(format!(
                "auth.jwt_expiration_hours must be between 1 and {}, got {}",
                MAX_JWT_EXPIRATION_HOURS, hours
            )));
        }

        Ok(())
    }

    /// Socket address the server binds to; the host must be an IP literal
    pub fn bind_address(&self) -> Result<SocketAddr, AddrParseError> {
        let host: IpAddr = self.server.host.parse()?;
        Ok(SocketAddr::from((host, self.server.port)))
    }
}
