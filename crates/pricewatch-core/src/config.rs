use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

/// Object storage connection. When `endpoint_url` is set the S3 backend is
/// used; otherwise artifacts live on the local filesystem under `local_root`.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_local_root")]
    pub local_root: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_listing_url")]
    pub url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub recipient: String,
}

fn default_bucket() -> String {
    "pricewatch".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_local_root() -> String {
    "./data".to_string()
}

fn default_listing_url() -> String {
    "https://www.thegioididong.com/dtdd".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            secret: String::new(),
            endpoint_url: None,
            bucket: default_bucket(),
            region: default_region(),
            local_root: default_local_root(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_listing_url(),
            user_agent: default_user_agent(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(Environment::with_prefix("PRICEWATCH").separator("__"))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_config_file() {
        let config = AppConfig::default();
        assert_eq!(config.storage.bucket, "pricewatch");
        assert_eq!(config.storage.region, "us-east-1");
        assert!(config.storage.endpoint_url.is_none());
        assert_eq!(config.source.timeout_seconds, 30);
        assert!(config.notify.webhook_url.is_none());
    }
}
