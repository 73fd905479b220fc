use std::{fmt, str::FromStr};

use serde::Deserialize;

/// Deployment environment. Controls cookie security and error detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            "test" => Ok(Environment::Test),
            other => anyhow::bail!("unknown APP_ENV: {}", other),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    /// Postgres connection string. `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = std::env::var("APP_PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid APP_PORT: {}", e))?;
        let environment = match std::env::var("APP_ENV") {
            Ok(v) => v.parse()?,
            Err(_) => Environment::Development,
        };
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "userauth".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "userauth-users".into()),
            ttl_days: parse_ttl_days(std::env::var("JWT_TTL_DAYS").ok())?,
        };
        Ok(Self {
            host,
            port,
            environment,
            database_url,
            jwt,
        })
    }

    /// Cookies carry the `Secure` flag everywhere except local development.
    pub fn secure_cookies(&self) -> bool {
        self.environment != Environment::Development
    }
}

pub const DEFAULT_TTL_DAYS: i64 = 30;
pub const MAX_TTL_DAYS: i64 = 365;

/// Session lifetime in days. Unset means the default; anything outside
/// `1..=MAX_TTL_DAYS` is a startup error.
fn parse_ttl_days(raw: Option<String>) -> anyhow::Result<i64> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_TTL_DAYS);
    };
    let days: i64 = raw
        .trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid JWT_TTL_DAYS: {}", e))?;
    if !(1..=MAX_TTL_DAYS).contains(&days) {
        anyhow::bail!("JWT_TTL_DAYS must be between 1 and {}, got {}", MAX_TTL_DAYS, days);
    }
    Ok(days)
}
