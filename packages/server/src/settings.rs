use std::collections::HashMap;
use std::env;
use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::time::Duration;

use api::auth::{parse_lifetime, HashConfig, TokenConfig, TokenConfigError};
use api::rate_limit::RateLimitConfig;
use api::routes::DEFAULT_BODY_LIMIT;
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

impl Server {
    pub fn addr(&self) -> Result<SocketAddr, AddrParseError> {
        let ip: IpAddr = self.host.trim().parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Deserialize)]
pub struct Database {
    /// Unset or empty selects the in-memory store.
    #[serde(default)]
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Database {
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct Auth {
    pub jwt_secret: String,
    pub jwt_expires_in: String,
    pub hash_memory_kib: u32,
    pub hash_iterations: u32,
    pub hash_parallelism: u32,
}

impl Auth {
    pub fn token_config(&self) -> Result<TokenConfig, TokenConfigError> {
        let lifetime = parse_lifetime(&self.jwt_expires_in)?;
        Ok(TokenConfig::new(self.jwt_secret.clone()).with_lifetime(lifetime))
    }

    pub fn hash_config(&self) -> HashConfig {
        HashConfig {
            memory_kib: self.hash_memory_kib,
            iterations: self.hash_iterations,
            parallelism: self.hash_parallelism,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Uploads {
    pub dir: String,
    pub max_bytes: usize,
}

#[derive(Debug, Deserialize)]
pub struct RateLimit {
    pub window_secs: u64,
    pub max_requests: u32,
}

impl RateLimit {
    pub fn config(&self) -> RateLimitConfig {
        RateLimitConfig {
            window: Duration::from_secs(self.window_secs),
            max_requests: self.max_requests,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub database: Database,
    pub auth: Auth,
    pub uploads: Uploads,
    pub rate_limit: RateLimit,
}

impl Settings {
    /// Defaults, then `config.toml`, then `MEDVAULT__SECTION__KEY` variables,
    /// then the bare `JWT_SECRET`, `JWT_EXPIRES_IN`, `DATABASE_URL`, `HOST` and `PORT`.
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_vars(None)
    }

    fn from_vars(vars: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        let lookup = |key: &str| match &vars {
            Some(vars) => vars.get(key).cloned(),
            None => env::var(key).ok(),
        };
        let hash = HashConfig::default();
        let rate_limit = RateLimitConfig::default();

        let config = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("database.max_connections", 5)?
            .set_default("auth.jwt_secret", "")?
            .set_default("auth.jwt_expires_in", "1d")?
            .set_default("auth.hash_memory_kib", i64::from(hash.memory_kib))?
            .set_default("auth.hash_iterations", i64::from(hash.iterations))?
            .set_default("auth.hash_parallelism", i64::from(hash.parallelism))?
            .set_default("uploads.dir", "uploads")?
            .set_default("uploads.max_bytes", DEFAULT_BODY_LIMIT as i64)?
            .set_default("rate_limit.window_secs", rate_limit.window.as_secs() as i64)?
            .set_default("rate_limit.max_requests", i64::from(rate_limit.max_requests))?
            .add_source(
                File::with_name("config.toml")
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix("MEDVAULT")
                    .separator("__")
                    .try_parsing(true)
                    .source(vars.clone()),
            )
            .set_override_option("auth.jwt_secret", lookup("JWT_SECRET"))?
            .set_override_option("auth.jwt_expires_in", lookup("JWT_EXPIRES_IN"))?
            .set_override_option("database.url", lookup("DATABASE_URL"))?
            .set_override_option("server.host", lookup("HOST"))?
            .set_override_option("server.port", lookup("PORT"))?
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_vars(vars(&[])).unwrap();
        assert_eq!(settings.server.port, 5000);
        assert_eq!(settings.server.addr().unwrap().port(), 5000);
        assert!(settings.database.url().is_none());
        assert_eq!(settings.auth.jwt_secret, "");
        assert_eq!(settings.auth.jwt_expires_in, "1d");
        assert_eq!(settings.auth.hash_config(), HashConfig::default());
        assert_eq!(settings.uploads.max_bytes, DEFAULT_BODY_LIMIT);
        assert_eq!(settings.rate_limit.config(), RateLimitConfig::default());
    }

    #[test]
    fn test_prefixed_environment() {
        let settings = Settings::from_vars(vars(&[
            ("MEDVAULT__SERVER__PORT", "8080"),
            ("MEDVAULT__RATE_LIMIT__MAX_REQUESTS", "7"),
            ("MEDVAULT__UPLOADS__DIR", "/tmp/photos"),
        ]))
        .unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.rate_limit.max_requests, 7);
        assert_eq!(settings.uploads.dir, "/tmp/photos");
    }

    #[test]
    fn test_bare_variables_win() {
        let settings = Settings::from_vars(vars(&[
            ("MEDVAULT__AUTH__JWT_SECRET", "from-prefixed"),
            ("JWT_SECRET", "from-bare"),
            ("JWT_EXPIRES_IN", "2h"),
            ("DATABASE_URL", "postgres://localhost/medvault"),
            ("PORT", "9000"),
        ]))
        .unwrap();
        assert_eq!(settings.auth.jwt_secret, "from-bare");
        assert_eq!(settings.server.port, 9000);
        assert_eq!(
            settings.database.url(),
            Some("postgres://localhost/medvault")
        );
        let tokens = settings.auth.token_config().unwrap();
        assert_eq!(tokens.lifetime, Duration::from_secs(2 * 60 * 60));
    }

    #[test]
    fn test_ipv6_host() {
        let settings = Settings::from_vars(vars(&[("HOST", "::1"), ("PORT", "8081")])).unwrap();
        let addr = settings.server.addr().unwrap();
        assert!(addr.is_ipv6());
        assert_eq!(addr.to_string(), "[::1]:8081");

        let settings = Settings::from_vars(vars(&[("HOST", "localhost")])).unwrap();
        assert!(settings.server.addr().is_err());
    }

    #[test]
    fn test_blank_database_url_means_memory() {
        let settings = Settings::from_vars(vars(&[("DATABASE_URL", "  ")])).unwrap();
        assert!(settings.database.url().is_none());
    }

    #[test]
    fn test_bad_lifetime() {
        let settings = Settings::from_vars(vars(&[("JWT_EXPIRES_IN", "soon")])).unwrap();
        assert!(matches!(
            settings.auth.token_config(),
            Err(TokenConfigError::InvalidLifetime(..))
        ));
    }
}
