//! Cache and publisher configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use dropweb_common::{Account, Error, Result};
use dropweb_storage::DEFAULT_TIMEOUT;

/// How the cache decides whether a stored page is still current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeMode {
    /// Send a metadata-only request and compare validators.
    #[default]
    Head,
    /// Skip the probe and fetch in full on every lookup.
    ///
    /// For remote sources that do not support metadata-only requests.
    AlwaysFetch,
}

/// Runtime settings of a `RevalidatingCache`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Bound on each probe and each full fetch.
    pub timeout: Duration,
    /// Revalidation strategy.
    pub probe: ProbeMode,
}

impl CacheConfig {
    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the revalidation strategy.
    pub fn with_probe(mut self, probe: ProbeMode) -> Self {
        self.probe = probe;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            probe: ProbeMode::Head,
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

/// On-disk publisher configuration.
///
/// Holds the account list (which must contain exactly one account when
/// pages are served) and cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Configured accounts.
    #[serde(default)]
    pub accounts: Vec<Account>,
    /// Directory for cached page records.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    /// Bound on each remote request, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Revalidation strategy.
    #[serde(default)]
    pub probe: ProbeMode,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            accounts: Vec::new(),
            cache_dir: None,
            timeout_secs: default_timeout_secs(),
            probe: ProbeMode::default(),
        }
    }
}

impl PublisherConfig {
    /// Default configuration file location.
    ///
    /// # Errors
    /// - Returns error if the platform has no configuration directory
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("dropweb").join("config.json"))
            .ok_or_else(|| Error::Configuration("No configuration directory".to_string()))
    }

    /// Load configuration from `path`.
    ///
    /// A missing file yields the default configuration.
    ///
    /// # Errors
    /// - I/O errors other than a missing file
    /// - Malformed JSON
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(json) => Self::from_json(&json),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Save configuration to `path`, creating parent directories.
    ///
    /// The file holds the decryption password, so on Unix it is readable
    /// by the owner only.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, self.to_json()?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
        }

        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Replace all accounts with `account`.
    pub fn set_account(&mut self, account: Account) {
        self.accounts = vec![account];
    }

    /// Cache settings derived from this configuration.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::default()
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_probe(self.probe)
    }

    /// Directory for cached page records, falling back to the platform cache dir.
    ///
    /// # Errors
    /// - Returns error if no directory is configured and the platform has none
    pub fn resolved_cache_dir(&self) -> Result<PathBuf> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::cache_dir()
                .map(|dir| dir.join("dropweb").join("pages"))
                .ok_or_else(|| Error::Configuration("No cache directory".to_string())),
        }
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize from JSON.
    ///
    /// # Errors
    /// - `Error::Serialization` for malformed JSON
    /// - `Error::Configuration` if an account's URL template has no placeholder
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))?;
        for account in &config.accounts {
            account.validate()?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dropweb_common::Password;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = PublisherConfig::from_json("{}").unwrap();
        assert!(config.accounts.is_empty());
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.probe, ProbeMode::Head);
        assert_eq!(config.cache_config(), CacheConfig::default());
    }

    #[test]
    fn test_parse() {
        let json = r#"{
            "accounts": [{"url_template": "http://store/%s.txt", "password": "hunter2"}],
            "cache_dir": "/tmp/pages",
            "timeout_secs": 3,
            "probe": "always_fetch"
        }"#;
        let config = PublisherConfig::from_json(json).unwrap();

        assert_eq!(config.accounts.len(), 1);
        assert_eq!(config.accounts[0].password.as_bytes(), b"hunter2");
        assert_eq!(config.resolved_cache_dir().unwrap(), PathBuf::from("/tmp/pages"));

        let cache = config.cache_config();
        assert_eq!(cache.timeout, Duration::from_secs(3));
        assert_eq!(cache.probe, ProbeMode::AlwaysFetch);
    }

    #[test]
    fn test_missing_file_is_default() {
        let temp = TempDir::new().unwrap();
        let config = PublisherConfig::load(&temp.path().join("none.json")).unwrap();
        assert_eq!(config, PublisherConfig::default());
    }

    #[test]
    fn test_save_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.json");

        let mut config = PublisherConfig::default();
        config.set_account(Account::new("http://store/%s.txt", Password::new("pw")).unwrap());
        config.save(&path).unwrap();

        let loaded = PublisherConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_set_account_replaces() {
        let mut config = PublisherConfig::default();
        config.set_account(Account::new("http://a/%s", Password::new("1")).unwrap());
        config.set_account(Account::new("http://b/%s", Password::new("2")).unwrap());

        assert_eq!(config.accounts.len(), 1);
        assert_eq!(config.accounts[0].url_template, "http://b/%s");
    }

    #[test]
    fn test_template_without_placeholder_is_rejected() {
        let json = r#"{"accounts": [{"url_template": "http://store/diary.txt", "password": "pw"}]}"#;
        assert!(matches!(
            PublisherConfig::from_json(json),
            Err(Error::Configuration(_))
        ));

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(&path, json).unwrap();
        assert!(matches!(
            PublisherConfig::load(&path),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            PublisherConfig::from_json("{"),
            Err(Error::Serialization(_))
        ));
    }
}
