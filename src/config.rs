use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::HeaderValue;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub cors_allowed_origin: HeaderValue,
    /// `None` when `DATABASE_URL` is unset; the HTTP service runs without storage.
    pub database: Option<DatabaseConfig>,
    pub environment: Environment,
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub auth_token: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Local,
    Production,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: DEFAULT_PORT,
            cors_allowed_origin: HeaderValue::from_static(DEFAULT_CORS_ORIGIN),
            database: None,
            environment: Environment::Local,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match var("PORT") {
            Some(port) => port
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            None => DEFAULT_PORT,
        };

        let origin = var("CORS_ALLOWED_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string());
        let cors_allowed_origin = HeaderValue::from_str(origin.trim())
            .context("CORS_ALLOWED_ORIGIN must be a valid header value")?;

        let database = DatabaseConfig::from_vars(&var)?;

        let environment = match var("ENV").unwrap_or_else(|| "local".to_string()).as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Local,
        };

        let config = Config {
            port,
            cors_allowed_origin,
            database,
            environment,
        };
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("PORT must be greater than 0");
        }

        let origin = self
            .cors_allowed_origin
            .to_str()
            .context("CORS_ALLOWED_ORIGIN must be ASCII")?;
        if !origin.starts_with("http://") && !origin.starts_with("https://") {
            anyhow::bail!("CORS_ALLOWED_ORIGIN must start with 'http://' or 'https://'");
        }

        if let Some(ref database) = self.database {
            database.validate()?;
        }

        Ok(())
    }
}

impl DatabaseConfig {
    /// Returns `None` when no `DATABASE_URL` is configured.
    fn from_vars<F>(var: &F) -> Result<Option<Self>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(url) = var("DATABASE_URL").filter(|u| !u.trim().is_empty()) else {
            return Ok(None);
        };

        let auth_token = var("DATABASE_AUTH_TOKEN").filter(|t| !t.trim().is_empty());

        let max_connections = var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u32>()
            .context("DATABASE_MAX_CONNECTIONS must be a valid number")?;

        let connection_timeout_secs = var("DATABASE_CONNECTION_TIMEOUT")
            .unwrap_or_else(|| "30".to_string())
            .parse::<u64>()
            .context("DATABASE_CONNECTION_TIMEOUT must be a valid number of seconds")?;

        Ok(Some(DatabaseConfig {
            url: url.trim().to_string(),
            auth_token,
            max_connections,
            connection_timeout: Duration::from_secs(connection_timeout_secs),
        }))
    }

    pub fn validate(&self) -> Result<()> {
        if !self.url.starts_with("postgresql://") && !self.url.starts_with("postgres://") {
            anyhow::bail!("DATABASE_URL must start with 'postgresql://' or 'postgres://'");
        }

        self.to_pg_config()?;

        if self.max_connections == 0 {
            anyhow::bail!("Max connections must be greater than 0");
        }

        if self.connection_timeout.as_secs() == 0 {
            anyhow::bail!("Connection timeout must be greater than 0");
        }

        Ok(())
    }

    /// Parses the URL into a driver config.
    /// The auth token, when present, replaces whatever password the URL carries.
    pub fn to_pg_config(&self) -> Result<tokio_postgres::Config> {
        let mut pg_config = tokio_postgres::Config::from_str(&self.url)
            .context("DATABASE_URL is not a valid PostgreSQL connection string")?;

        if let Some(ref token) = self.auth_token {
            pg_config.password(token.as_str());
        }
        pg_config.connect_timeout(self.connection_timeout);

        Ok(pg_config)
    }

    /// Host list for logging, without credentials.
    pub fn display_hosts(&self) -> String {
        match self.to_pg_config() {
            Ok(cfg) => cfg
                .get_hosts()
                .iter()
                .map(|host| match host {
                    tokio_postgres::config::Host::Tcp(name) => name.clone(),
                    #[cfg(unix)]
                    tokio_postgres::config::Host::Unix(path) => path.display().to_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
            Err(_) => "<invalid>".to_string(),
        }
    }
}

// Hand-written so credentials never reach the logs.
impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("hosts", &self.display_hosts())
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("max_connections", &self.max_connections)
            .field("connection_timeout", &self.connection_timeout)
            .finish()
    }
}
