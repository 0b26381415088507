//! Configuration for the cloudsync binary
//!
//! Two layers:
//! - [`AppConfig`]: runtime settings from the environment (`CLOUDSYNC_*`)
//! - [`FetchConfig`]: the YAML file naming accounts, regions and resources

use cloudsync_engine::provider::http::DEFAULT_PROVIDER_TIMEOUT_SECS;
use cloudsync_engine::{HttpProviderConfig, PartitionKey, PartitionScope, DEFAULT_MAX_CHUNK_SIZE};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{CliError, Result};

// ============================================================================
// Configuration Constants
// ============================================================================

/// Default fetch configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.yml";

/// Default number of resource syncs in flight at once.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Default provider gateway endpoint for local development.
pub const DEFAULT_PROVIDER_ENDPOINT: &str = "http://localhost:4566/list";

/// Runtime settings
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub config_path: PathBuf,
    /// Maximum root records per write chunk
    pub max_chunk_size: usize,
    pub max_concurrency: usize,
    pub provider_endpoint: String,
    pub provider_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            provider_endpoint: DEFAULT_PROVIDER_ENDPOINT.to_string(),
            provider_timeout_secs: DEFAULT_PROVIDER_TIMEOUT_SECS,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| CliError::config(format!("{key} has an invalid value '{raw}'"))),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    /// Load settings from the environment
    ///
    /// Environment variables:
    /// - `CLOUDSYNC_CONFIG`: path to the fetch configuration
    /// - `CLOUDSYNC_MAX_CHUNK_SIZE`, `CLOUDSYNC_MAX_CONCURRENCY`
    /// - `CLOUDSYNC_PROVIDER_ENDPOINT`, `CLOUDSYNC_PROVIDER_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            config_path: std::env::var("CLOUDSYNC_CONFIG")
                .map(PathBuf::from)
                .unwrap_or(defaults.config_path),
            max_chunk_size: env_or("CLOUDSYNC_MAX_CHUNK_SIZE", defaults.max_chunk_size)?,
            max_concurrency: env_or("CLOUDSYNC_MAX_CONCURRENCY", defaults.max_concurrency)?,
            provider_endpoint: std::env::var("CLOUDSYNC_PROVIDER_ENDPOINT")
                .unwrap_or(defaults.provider_endpoint),
            provider_timeout_secs: env_or(
                "CLOUDSYNC_PROVIDER_TIMEOUT_SECS",
                defaults.provider_timeout_secs,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_size == 0 {
            return Err(CliError::config("CLOUDSYNC_MAX_CHUNK_SIZE must be at least 1"));
        }
        if self.max_concurrency == 0 {
            return Err(CliError::config("CLOUDSYNC_MAX_CONCURRENCY must be at least 1"));
        }
        if !self.provider_endpoint.starts_with("http://")
            && !self.provider_endpoint.starts_with("https://")
        {
            return Err(CliError::config(format!(
                "CLOUDSYNC_PROVIDER_ENDPOINT must be an http(s) URL, got '{}'",
                self.provider_endpoint
            )));
        }
        if self.provider_timeout_secs == 0 {
            return Err(CliError::config("CLOUDSYNC_PROVIDER_TIMEOUT_SECS must be at least 1"));
        }
        Ok(())
    }

    pub fn provider_config(&self) -> HttpProviderConfig {
        HttpProviderConfig {
            endpoint: self.provider_endpoint.clone(),
            timeout_secs: self.provider_timeout_secs,
        }
    }
}

// ============================================================================
// Fetch configuration (YAML)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountConfig {
    pub id: String,
    pub regions: Vec<String>,
}

/// One resource to fetch
///
/// `config` is handed to the engine untouched; the resource decodes it into
/// its typed request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceConfig {
    pub name: String,
    #[serde(default)]
    pub config: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetchConfig {
    pub accounts: Vec<AccountConfig>,
    #[serde(default)]
    pub resources: Vec<ResourceConfig>,
}

impl FetchConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CliError::ConfigNotFound(path.display().to_string())
            } else {
                CliError::Io(e)
            }
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.accounts.is_empty() {
            return Err(CliError::config("at least one account is required"));
        }

        let mut account_ids = HashSet::new();
        for account in &self.accounts {
            if account.id.trim().is_empty() {
                return Err(CliError::config("account id must not be empty"));
            }
            if !account_ids.insert(account.id.as_str()) {
                return Err(CliError::config(format!("account '{}' is listed twice", account.id)));
            }
            if account.regions.is_empty() {
                return Err(CliError::config(format!(
                    "account '{}' has no regions",
                    account.id
                )));
            }
            if account.regions.iter().any(|r| r.trim().is_empty()) {
                return Err(CliError::config(format!(
                    "account '{}' has an empty region",
                    account.id
                )));
            }
            let mut regions = HashSet::new();
            if let Some(region) = account.regions.iter().find(|r| !regions.insert(r.as_str())) {
                return Err(CliError::config(format!(
                    "account '{}' lists region '{}' twice",
                    account.id, region
                )));
            }
        }

        let mut names = HashSet::new();
        for resource in &self.resources {
            if !names.insert(resource.name.as_str()) {
                return Err(CliError::config(format!(
                    "resource '{}' is listed twice",
                    resource.name
                )));
            }
        }

        Ok(())
    }

    /// Partitions a resource of `scope` is synced for
    ///
    /// Regional resources run for every (account, region). Global resources
    /// run once per account, through the account's first region.
    pub fn partitions(&self, scope: PartitionScope) -> Vec<PartitionKey> {
        match scope {
            PartitionScope::Regional => self
                .accounts
                .iter()
                .flat_map(|a| a.regions.iter().map(|r| PartitionKey::new(&a.id, r)))
                .collect(),
            PartitionScope::Global => self
                .accounts
                .iter()
                .filter_map(|a| a.regions.first().map(|r| PartitionKey::new(&a.id, r)))
                .collect(),
        }
    }
}
