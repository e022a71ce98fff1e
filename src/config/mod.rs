pub mod toml_config;

use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_path, validate_positive_number, validate_range, validate_url};

pub const DEFAULT_API_ENDPOINT: &str = "https://jsonplaceholder.typicode.com/users/";
pub const DEFAULT_OUTPUT_PATH: &str = "users.csv";
pub const DEFAULT_CACHE_DIR: &str = ".cache";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 5;
pub const DEFAULT_BACKOFF_FACTOR: f64 = 0.5;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Checks shared by every configuration source.
pub fn validate_config<C: ConfigProvider + ?Sized>(config: &C) -> Result<()> {
    validate_url("api_endpoint", config.api_endpoint())?;
    validate_path("output_path", config.output_path())?;
    validate_path("cache_dir", config.cache_dir())?;
    validate_range("retry_attempts", config.retry_attempts(), 1, 10)?;
    validate_range("backoff_factor", config.backoff_factor(), 0.0, 60.0)?;
    validate_positive_number("timeout_secs", config.request_timeout().as_secs(), 1)?;

    tracing::debug!("✅ Configuration validation passed");
    Ok(())
}

#[cfg(feature = "cli")]
mod cli {
    use super::*;
    use crate::domain::model::OutputEncoding;
    use crate::utils::validation::Validate;
    use clap::Parser;
    use std::time::Duration;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "user-csv-etl")]
    #[command(about = "Fetch users from a JSON API, flatten them, and save them as CSV")]
    pub struct CliConfig {
        #[arg(long, default_value = DEFAULT_API_ENDPOINT)]
        pub api_endpoint: String,

        #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
        pub output_path: String,

        #[arg(long, default_value = DEFAULT_CACHE_DIR)]
        pub cache_dir: String,

        #[arg(long, default_value_t = DEFAULT_CACHE_TTL_SECS)]
        pub cache_ttl_secs: u64,

        #[arg(long, default_value_t = DEFAULT_RETRY_ATTEMPTS)]
        pub retry_attempts: u32,

        #[arg(long, default_value_t = DEFAULT_BACKOFF_FACTOR)]
        pub backoff_factor: f64,

        #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
        pub timeout_secs: u64,

        #[arg(long, value_enum, default_value_t = OutputEncoding::Utf8)]
        pub encoding: OutputEncoding,

        #[arg(long, help = "Read settings from a TOML file instead of flags")]
        pub config: Option<String>,

        #[arg(long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Emit logs as JSON lines")]
        pub log_json: bool,
    }

    impl Default for CliConfig {
        fn default() -> Self {
            Self::parse_from(["user-csv-etl"])
        }
    }

    impl ConfigProvider for CliConfig {
        fn api_endpoint(&self) -> &str {
            &self.api_endpoint
        }

        fn output_path(&self) -> &str {
            &self.output_path
        }

        fn cache_dir(&self) -> &str {
            &self.cache_dir
        }

        fn cache_ttl(&self) -> Duration {
            Duration::from_secs(self.cache_ttl_secs)
        }

        fn retry_attempts(&self) -> u32 {
            self.retry_attempts
        }

        fn backoff_factor(&self) -> f64 {
            self.backoff_factor
        }

        fn request_timeout(&self) -> Duration {
            Duration::from_secs(self.timeout_secs)
        }

        fn encoding(&self) -> OutputEncoding {
            self.encoding
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validate_config(self)
        }
    }

}

#[cfg(feature = "cli")]
pub use cli::CliConfig;
