use std::net::SocketAddr;

use anyhow::{bail, Context, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub addr: SocketAddr,
    pub storage: StorageKind,
}

impl AppConfig {
    /// Read settings from the environment (after `.env` has been loaded).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://tasks.db".to_string());
        let addr = lookup("TASKBOARD_ADDR")
            .unwrap_or_else(|| "127.0.0.1:3000".to_string())
            .parse()
            .context("invalid TASKBOARD_ADDR")?;
        let storage = match lookup("TASKBOARD_STORAGE").as_deref().map(str::to_lowercase).as_deref() {
            None | Some("sqlite") => StorageKind::Sqlite,
            Some("memory") => StorageKind::Memory,
            Some(other) => bail!("invalid TASKBOARD_STORAGE: {other}"),
        };
        Ok(Self { database_url, addr, storage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.database_url, "sqlite://tasks.db");
        assert_eq!(config.addr.port(), 3000);
        assert_eq!(config.storage, StorageKind::Sqlite);
    }

    #[test]
    fn overrides_and_invalid_values() {
        let config = AppConfig::from_lookup(lookup(&[("TASKBOARD_STORAGE", "Memory"), ("TASKBOARD_ADDR", "0.0.0.0:8080")])).unwrap();
        assert_eq!(config.storage, StorageKind::Memory);
        assert_eq!(config.addr.port(), 8080);

        assert!(AppConfig::from_lookup(lookup(&[("TASKBOARD_STORAGE", "redis")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("TASKBOARD_ADDR", "nowhere")])).is_err());
    }
}
