// Server configuration loaded from environment variables.
// Decision: DATABASE_URL wins; otherwise it is composed from DATABASE_* parts
// Decision: Defaults target a local Postgres on the default port for development

use std::time::Duration;

use sqlx::postgres::PgConnectOptions;

/// Database connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Full connection URL, when given explicitly
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    /// Connect options for the pool. Parts are set individually, so
    /// credentials need no URL escaping.
    pub fn connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        match &self.url {
            Some(url) => url.parse(),
            None => Ok(PgConnectOptions::new()
                .host(&self.host)
                .port(self.port)
                .username(&self.user)
                .password(&self.password)
                .database(&self.name)),
        }
    }
}

/// Top-level server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// Upper bound on the time spent handling one request
    pub request_timeout: Duration,
    /// Origins allowed by CORS. Empty means same-origin only.
    pub cors_origins: Vec<String>,
    pub database: DatabaseConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |key: &str, default: &str| {
            lookup(key)
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let seconds = |key: &str, default: u64| {
            lookup(key)
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or_else(|| Duration::from_secs(default))
        };

        let database = DatabaseConfig {
            url: lookup("DATABASE_URL").filter(|s| !s.is_empty()),
            host: string("DATABASE_HOST", "localhost"),
            port: lookup("DATABASE_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            user: string("DATABASE_USER", "postgres"),
            password: string("DATABASE_PASSWORD", "postgres"),
            name: string("DATABASE_NAME", "postgres"),
            max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(10),
            acquire_timeout: seconds("DATABASE_ACQUIRE_TIMEOUT_SECS", 5),
        };

        // Example: CORS_ALLOWED_ORIGINS="https://app.example.com,https://admin.example.com"
        let cors_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            port: lookup("PORT").and_then(|s| s.parse().ok()).unwrap_or(3000),
            request_timeout: seconds("REQUEST_TIMEOUT_SECS", 3),
            cors_origins,
            database,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}
