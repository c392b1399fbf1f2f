use std::env;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use tracing::info;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

// --- TOML file config ---

/// Optional TOML configuration. Every value can be overridden by env vars.
/// Secrets (the database URL) only come from the environment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// `memory` or `postgres`.
    pub backend: Option<String>,
    pub max_connections: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// `text` or `json`.
    pub format: Option<String>,
}

/// Load and parse a TOML config file.
pub fn load_config(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: FileConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(config)
}

// --- Resolved config ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Postgres {
        database_url: String,
        max_connections: u32,
    },
}

impl StoreBackend {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Postgres { .. } => "postgres",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Application configuration: TOML file values overridden by env vars.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub store: StoreBackend,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from an optional TOML file, then apply env overrides.
    /// A `.env` file in the working directory is loaded first if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();
        let file = match path {
            Some(path) => load_config(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(file, |key| env::var(key).ok())
    }

    /// Merge file values with variables from `lookup`. Variables win.
    pub fn resolve(file: FileConfig, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = lookup("EVENTLY_HOST")
            .or(file.server.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup("EVENTLY_PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("EVENTLY_PORT must be a port number, got {raw:?}"))?,
            None => file.server.port.unwrap_or(DEFAULT_PORT),
        };

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw.parse().with_context(|| {
                format!("DATABASE_MAX_CONNECTIONS must be a number, got {raw:?}")
            })?,
            None => file.store.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS),
        };

        let database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());
        let backend = lookup("EVENTLY_STORE").or(file.store.backend);
        let store = match (backend.as_deref(), database_url) {
            (Some("memory"), _) => StoreBackend::Memory,
            (Some("postgres") | None, Some(database_url)) => StoreBackend::Postgres {
                database_url,
                max_connections,
            },
            (Some("postgres"), None) => {
                bail!("DATABASE_URL environment variable is required for the postgres store")
            }
            (None, None) => StoreBackend::Memory,
            (Some(other), _) => {
                return Err(anyhow!(
                    "unknown store backend {other:?} (expected \"memory\" or \"postgres\")"
                ))
            }
        };

        let log_format = match lookup("LOG_FORMAT").or(file.logging.format).as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => bail!("unknown log format {other:?} (expected \"text\" or \"json\")"),
        };

        Ok(Self {
            host,
            port,
            store,
            log_format,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Log the resolved settings. The database URL is never logged.
    pub fn log_summary(&self) {
        match &self.store {
            StoreBackend::Memory => info!(
                host = %self.host,
                port = self.port,
                store = self.store.name(),
                "Configuration loaded"
            ),
            StoreBackend::Postgres {
                max_connections, ..
            } => info!(
                host = %self.host,
                port = self.port,
                store = self.store.name(),
                max_connections,
                "Configuration loaded"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_memory_store() {
        let config = Config::resolve(FileConfig::default(), vars(&[])).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn database_url_selects_postgres() {
        let config = Config::resolve(
            FileConfig::default(),
            vars(&[("DATABASE_URL", "postgres://localhost/events")]),
        )
        .unwrap();
        assert_eq!(
            config.store,
            StoreBackend::Postgres {
                database_url: "postgres://localhost/events".into(),
                max_connections: 10,
            }
        );
    }

    #[test]
    fn explicit_memory_ignores_database_url() {
        let config = Config::resolve(
            FileConfig::default(),
            vars(&[
                ("DATABASE_URL", "postgres://localhost/events"),
                ("EVENTLY_STORE", "memory"),
            ]),
        )
        .unwrap();
        assert_eq!(config.store, StoreBackend::Memory);
    }

    #[test]
    fn postgres_without_url_is_an_error() {
        let err = Config::resolve(FileConfig::default(), vars(&[("EVENTLY_STORE", "postgres")]))
            .unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn unknown_backend_is_an_error() {
        let err = Config::resolve(FileConfig::default(), vars(&[("EVENTLY_STORE", "dynamo")]))
            .unwrap_err();
        assert!(err.to_string().contains("dynamo"));
    }

    #[test]
    fn bad_port_is_an_error() {
        let err = Config::resolve(FileConfig::default(), vars(&[("EVENTLY_PORT", "http")]))
            .unwrap_err();
        assert!(err.to_string().contains("EVENTLY_PORT"));
    }

    #[test]
    fn env_overrides_file() {
        let file: FileConfig = toml::from_str(
            r#"
            [server]
            host = "127.0.0.1"
            port = 8080

            [logging]
            format = "json"
            "#,
        )
        .unwrap();
        let config = Config::resolve(file, vars(&[("EVENTLY_PORT", "9090")])).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9090);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.addr(), "127.0.0.1:9090");
    }

    #[test]
    fn file_max_connections_applies_to_postgres() {
        let file: FileConfig = toml::from_str(
            r#"
            [store]
            backend = "postgres"
            max_connections = 4
            "#,
        )
        .unwrap();
        let config =
            Config::resolve(file, vars(&[("DATABASE_URL", "postgres://db/events")])).unwrap();
        assert_eq!(
            config.store,
            StoreBackend::Postgres {
                database_url: "postgres://db/events".into(),
                max_connections: 4,
            }
        );
    }

    #[test]
    fn load_config_rejects_unknown_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nhostname = \"x\"").unwrap();
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn load_config_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 4000").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.server.port, Some(4000));
        assert!(config.store.backend.is_none());
    }
}
