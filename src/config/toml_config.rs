use crate::config::{
    validate_config, DEFAULT_API_ENDPOINT, DEFAULT_BACKOFF_FACTOR, DEFAULT_CACHE_DIR,
    DEFAULT_CACHE_TTL_SECS, DEFAULT_OUTPUT_PATH, DEFAULT_RETRY_ATTEMPTS, DEFAULT_TIMEOUT_SECS,
};
use crate::core::ConfigProvider;
use crate::domain::model::OutputEncoding;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// File-based settings. Every key is optional:
///
/// ```toml
/// [source]
/// endpoint = "https://jsonplaceholder.typicode.com/users/"
/// timeout_seconds = 10
/// retry_attempts = 5
/// backoff_factor = 0.5
///
/// [cache]
/// directory = ".cache"
/// ttl_seconds = 3600
///
/// [load]
/// output_path = "users.csv"
/// encoding = "utf8"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub source: SourceConfig,
    pub cache: CacheConfig,
    pub load: LoadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub endpoint: String,
    pub timeout_seconds: u64,
    pub retry_attempts: u32,
    pub backoff_factor: f64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_API_ENDPOINT.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub directory: String,
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: DEFAULT_CACHE_DIR.to_string(),
            ttl_seconds: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub output_path: String,
    pub encoding: OutputEncoding,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            encoding: OutputEncoding::default(),
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }
}

impl ConfigProvider for TomlConfig {
    fn api_endpoint(&self) -> &str {
        &self.source.endpoint
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn cache_dir(&self) -> &str {
        &self.cache.directory
    }

    fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_seconds)
    }

    fn retry_attempts(&self) -> u32 {
        self.source.retry_attempts
    }

    fn backoff_factor(&self) -> f64 {
        self.source.backoff_factor
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.source.timeout_seconds)
    }

    fn encoding(&self) -> OutputEncoding {
        self.load.encoding
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_config(self)
    }
}
