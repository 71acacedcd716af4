use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://campus_admin.db";
pub const DEFAULT_LOGIN_DELAY_MS: u64 = 1000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    Firestore,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StoreBackend::Sqlite),
            "firestore" => Ok(StoreBackend::Firestore),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub store_backend: StoreBackend,
    pub database_url: String,
    pub login_delay: Duration,
}

impl AppConfig {
    /// Reads the process environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        fn parse<T: FromStr>(name: &'static str, raw: String) -> Result<T, ConfigError> {
            raw.trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { name, value: raw.clone() })
        }

        let bind_addr = parse("BIND_ADDR", get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()))?;
        let store_backend = parse("STORE_BACKEND", get("STORE_BACKEND").unwrap_or_else(|| "sqlite".to_string()))?;
        let database_url = get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let login_delay_ms: u64 = match get("LOGIN_DELAY_MS") {
            Some(raw) => parse("LOGIN_DELAY_MS", raw)?,
            None => DEFAULT_LOGIN_DELAY_MS,
        };

        Ok(Self {
            bind_addr,
            store_backend,
            database_url,
            login_delay: Duration::from_millis(login_delay_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.store_backend, StoreBackend::Sqlite);
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.login_delay, Duration::from_secs(1));
    }

    #[test]
    fn values_are_read_and_validated() {
        let config = load(&[("STORE_BACKEND", "Memory"), ("LOGIN_DELAY_MS", "0")]).unwrap();
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert!(config.login_delay.is_zero());

        let err = load(&[("STORE_BACKEND", "postgres")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: "STORE_BACKEND",
                value: "postgres".to_string()
            }
        );
        assert!(load(&[("LOGIN_DELAY_MS", "soon")]).is_err());
    }
}
