use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub system_config: SystemConfig,
    #[serde(default)]
    pub translation_config: TranslationConfig,
    #[serde(default)]
    pub history_config: HistoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    File,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_storage_backend")]
    pub storage_backend: StorageBackend,
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    12393
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_endpoint() -> String {
    "https://translation.googleapis.com/language/translate/v2".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_storage_backend() -> StorageBackend {
    StorageBackend::File
}

fn default_storage_key() -> String {
    "translations".to_string()
}

fn default_max_entries() -> usize {
    10
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: default_data_dir(),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            storage_backend: default_storage_backend(),
            storage_key: default_storage_key(),
            max_entries: default_max_entries(),
        }
    }
}

impl SystemConfig {
    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }
}

impl Config {
    /// Load configuration from a JSON or YAML file, chosen by extension
    pub fn load(path: &str) -> Result<Self> {
        let content = read_config_text(path)?;

        let path_lower = path.to_lowercase();
        let config: Config = if path_lower.ends_with(".jsonld") || path_lower.ends_with(".json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid JSON configuration: {}", path))?
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Invalid YAML configuration: {}", path))?
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.history_config.max_entries == 0 {
            anyhow::bail!("history_config.max_entries must be at least 1");
        }
        if self.history_config.storage_key.trim().is_empty() {
            anyhow::bail!("history_config.storage_key cannot be empty");
        }
        if self.translation_config.timeout_secs == 0 {
            anyhow::bail!("translation_config.timeout_secs must be at least 1");
        }
        let api_key = &self.translation_config.api_key;
        if api_key.is_empty() || api_key.starts_with("${") {
            tracing::warn!("No translation API key configured; requests will be rejected by the provider");
        }
        Ok(())
    }
}

/// Read a configuration file, tolerating a UTF-8 BOM, and substitute `${VAR}`
/// with the environment. Unset variables are left verbatim.
pub fn read_config_text(config_path: &str) -> Result<String> {
    if !Path::new(config_path).exists() {
        anyhow::bail!("Configuration file not found: {}", config_path);
    }

    let bytes = fs::read(config_path)?;
    let (content, _, had_errors) = encoding_rs::UTF_8.decode(&bytes);
    if had_errors {
        tracing::warn!("Configuration file {} is not valid UTF-8; replaced invalid bytes", config_path);
    }

    substitute_env_vars(&content)
}

fn substitute_env_vars(content: &str) -> Result<String> {
    let pattern = Regex::new(r"\$\{(\w+)\}")?;
    let replaced = pattern.replace_all(content, |caps: &regex::Captures| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    });
    Ok(replaced.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.history_config.max_entries, 10);
        assert_eq!(config.history_config.storage_key, "translations");
        assert_eq!(config.history_config.storage_backend, StorageBackend::File);
        assert_eq!(
            config.translation_config.endpoint,
            "https://translation.googleapis.com/language/translate/v2"
        );
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("TRANSLATOR_TEST_API_KEY", "secret-key");
        let text = substitute_env_vars("api_key: ${TRANSLATOR_TEST_API_KEY}\nother: ${TRANSLATOR_TEST_UNSET_VAR}").unwrap();
        assert_eq!(text, "api_key: secret-key\nother: ${TRANSLATOR_TEST_UNSET_VAR}");
    }

    #[test]
    fn test_load_yaml_with_partial_sections() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "system_config:\n  port: 8080\nhistory_config:\n  max_entries: 5").unwrap();

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.system_config.port, 8080);
        assert_eq!(config.system_config.host, "localhost");
        assert_eq!(config.history_config.max_entries, 5);
        assert_eq!(config.translation_config.timeout_secs, 15);
    }

    #[test]
    fn test_load_json_with_bom() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(&[0xEF, 0xBB, 0xBF]).unwrap();
        file.write_all(br#"{"history_config": {"storage_backend": "memory"}}"#).unwrap();

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.history_config.storage_backend, StorageBackend::Memory);
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "history_config:\n  max_entries: 0").unwrap();
        assert!(Config::load(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(Config::load("definitely/not/here.yaml").is_err());
    }
}
