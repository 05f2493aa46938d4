//! Layered configuration: built-in defaults < `swapi-sync.toml` < `SWAPI_*` env < CLI flags.

use crate::client::HttpConfig;
use crate::pipeline::{FailurePolicy, SyncPlan};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_DATABASE: &str = "swapi.db";
pub const DEFAULT_BASE_URL: &str = "https://swapi.dev/api/";
pub const DEFAULT_FIRST_ID: u32 = 1;
pub const DEFAULT_LAST_ID: u32 = 83;
pub const DEFAULT_CHUNK_SIZE: usize = 10;
pub const DEFAULT_MAX_CONNECTIONS: usize = 100;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_ACCEPT_INVALID_CERTS: bool = true;

/// One configuration layer. Unset fields fall through to the layer below.
///
/// Storage is a local SQLite file, so `database` (`SWAPI_DATABASE`) is the
/// whole connection: a file path standing in for the user, password, host,
/// port and database name a networked server would need.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SwapiConfig {
    pub database: Option<String>,
    pub base_url: Option<String>,
    pub first_id: Option<u32>,
    pub last_id: Option<u32>,
    pub chunk_size: Option<usize>,
    pub max_connections: Option<usize>,
    pub request_timeout_secs: Option<u64>,
    pub accept_invalid_certs: Option<bool>,
    pub failure_policy: Option<FailurePolicy>,
}

impl SwapiConfig {
    /// Every field set to its built-in default.
    pub fn defaults() -> Self {
        Self {
            database: Some(DEFAULT_DATABASE.to_string()),
            base_url: Some(DEFAULT_BASE_URL.to_string()),
            first_id: Some(DEFAULT_FIRST_ID),
            last_id: Some(DEFAULT_LAST_ID),
            chunk_size: Some(DEFAULT_CHUNK_SIZE),
            max_connections: Some(DEFAULT_MAX_CONNECTIONS),
            request_timeout_secs: Some(DEFAULT_REQUEST_TIMEOUT_SECS),
            accept_invalid_certs: Some(DEFAULT_ACCEPT_INVALID_CERTS),
            failure_policy: Some(FailurePolicy::default()),
        }
    }

    /// Read the `SWAPI_*` variables from the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a layer from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            database: lookup("SWAPI_DATABASE"),
            base_url: lookup("SWAPI_BASE_URL"),
            first_id: parse_var(&lookup, "SWAPI_FIRST_ID")?,
            last_id: parse_var(&lookup, "SWAPI_LAST_ID")?,
            chunk_size: parse_var(&lookup, "SWAPI_CHUNK_SIZE")?,
            max_connections: parse_var(&lookup, "SWAPI_MAX_CONNECTIONS")?,
            request_timeout_secs: parse_var(&lookup, "SWAPI_REQUEST_TIMEOUT_SECS")?,
            accept_invalid_certs: lookup("SWAPI_ACCEPT_INVALID_CERTS")
                .map(|v| parse_bool("SWAPI_ACCEPT_INVALID_CERTS", &v))
                .transpose()?,
            failure_policy: parse_var(&lookup, "SWAPI_FAILURE_POLICY")?,
        })
    }

    /// Overlay `other` on top of `self`; fields set in `other` win.
    pub fn merge(self, other: SwapiConfig) -> Self {
        Self {
            database: other.database.or(self.database),
            base_url: other.base_url.or(self.base_url),
            first_id: other.first_id.or(self.first_id),
            last_id: other.last_id.or(self.last_id),
            chunk_size: other.chunk_size.or(self.chunk_size),
            max_connections: other.max_connections.or(self.max_connections),
            request_timeout_secs: other.request_timeout_secs.or(self.request_timeout_secs),
            accept_invalid_certs: other.accept_invalid_certs.or(self.accept_invalid_certs),
            failure_policy: other.failure_policy.or(self.failure_policy),
        }
    }

    /// Fill gaps with defaults and validate.
    pub fn resolve(self) -> anyhow::Result<Settings> {
        let config = Self::defaults().merge(self);

        let plan = SyncPlan::new(
            config.first_id.unwrap_or(DEFAULT_FIRST_ID),
            config.last_id.unwrap_or(DEFAULT_LAST_ID),
            config.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
        )?;

        let max_connections = config.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS);
        if max_connections == 0 {
            anyhow::bail!("max_connections must be at least 1");
        }

        let mut base_url = config.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        let timeout = config.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        let http = HttpConfig::default()
            .with_max_connections(max_connections)
            .with_request_timeout(Duration::from_secs(timeout))
            .with_accept_invalid_certs(
                config.accept_invalid_certs.unwrap_or(DEFAULT_ACCEPT_INVALID_CERTS),
            );

        let database = config.database.unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        Ok(Settings {
            database: PathBuf::from(database),
            base_url,
            plan,
            http,
            failure_policy: config.failure_policy.unwrap_or_default(),
        })
    }
}

/// Fully resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database: PathBuf,
    pub base_url: String,
    pub plan: SyncPlan,
    pub http: HttpConfig,
    pub failure_policy: FailurePolicy,
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| anyhow::anyhow!("invalid {}={:?}: {}", key, raw, e))
        })
        .transpose()
}

fn parse_bool(key: &str, raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("invalid {}={:?}: expected true or false", key, raw),
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("swapi-sync.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<SwapiConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: SwapiConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &SwapiConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = SwapiConfig::default().resolve().unwrap();
        assert_eq!(settings.database, PathBuf::from("swapi.db"));
        assert_eq!(settings.base_url, "https://swapi.dev/api/");
        assert_eq!(settings.plan, SyncPlan::new(1, 83, 10).unwrap());
        assert_eq!(settings.http.max_connections, 100);
        assert!(settings.http.accept_invalid_certs);
        assert_eq!(settings.failure_policy, FailurePolicy::FailFast);
    }

    #[test]
    fn test_env_layer() {
        let layer = SwapiConfig::from_lookup(env(&[
            ("SWAPI_DATABASE", "/tmp/people.db"),
            ("SWAPI_CHUNK_SIZE", "5"),
            ("SWAPI_LAST_ID", "20"),
            ("SWAPI_ACCEPT_INVALID_CERTS", "false"),
            ("SWAPI_FAILURE_POLICY", "skip-entity"),
        ]))
        .unwrap();
        let settings = layer.resolve().unwrap();

        assert_eq!(settings.database, PathBuf::from("/tmp/people.db"));
        assert_eq!(settings.plan, SyncPlan::new(1, 20, 5).unwrap());
        assert!(!settings.http.accept_invalid_certs);
        assert_eq!(settings.failure_policy, FailurePolicy::SkipEntity);
    }

    #[test]
    fn test_invalid_env_value() {
        assert!(SwapiConfig::from_lookup(env(&[("SWAPI_CHUNK_SIZE", "ten")])).is_err());
        assert!(SwapiConfig::from_lookup(env(&[("SWAPI_ACCEPT_INVALID_CERTS", "maybe")])).is_err());
    }

    #[test]
    fn test_later_layers_win() {
        let file = SwapiConfig {
            chunk_size: Some(20),
            base_url: Some("http://localhost:8000/api".to_string()),
            ..Default::default()
        };
        let cli = SwapiConfig {
            chunk_size: Some(3),
            ..Default::default()
        };

        let settings = file.merge(cli).resolve().unwrap();
        assert_eq!(settings.plan.chunk_size, 3);
        assert_eq!(settings.base_url, "http://localhost:8000/api/");
    }

    #[test]
    fn test_validation() {
        let zero_chunk = SwapiConfig {
            chunk_size: Some(0),
            ..Default::default()
        };
        assert!(zero_chunk.resolve().is_err());

        let backwards = SwapiConfig {
            first_id: Some(10),
            last_id: Some(2),
            ..Default::default()
        };
        assert!(backwards.resolve().is_err());

        let no_connections = SwapiConfig {
            max_connections: Some(0),
            ..Default::default()
        };
        assert!(no_connections.resolve().is_err());
    }

    #[test]
    fn test_config_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("swapi-sync.toml");

        assert!(load_config(Some(&path)).unwrap().is_none());

        write_config(&path, &SwapiConfig::defaults(), false).unwrap();
        assert!(write_config(&path, &SwapiConfig::defaults(), false).is_err());
        write_config(&path, &SwapiConfig::defaults(), true).unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded, SwapiConfig::defaults());
    }
}
