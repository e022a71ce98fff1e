pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::toml_config::TomlConfig;

pub use adapters::{http::ReqwestTransport, storage::LocalStorage};
pub use core::{
    etl::{EtlEngine, RunOutcome},
    pipeline::UserPipeline,
};
pub use domain::model::{OutputEncoding, Record};
pub use domain::ports::{ConfigProvider, Pipeline, Storage, Transport};
pub use utils::error::{EtlError, Result};
