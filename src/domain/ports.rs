use crate::domain::model::{HttpResponse, OutputEncoding, Record, TransformResult};
use crate::utils::error::{FetchError, Result};
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    /// Create or overwrite `path`. Parent directories are not created.
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Location `path` resolves to, for reporting.
    fn describe(&self, path: &str) -> String;
}

pub trait ConfigProvider: Send + Sync {
    fn api_endpoint(&self) -> &str;
    fn output_path(&self) -> &str;
    fn cache_dir(&self) -> &str;
    fn cache_ttl(&self) -> Duration;
    fn retry_attempts(&self) -> u32;
    fn backoff_factor(&self) -> f64;
    fn request_timeout(&self) -> Duration;
    fn encoding(&self) -> OutputEncoding;
}

/// A single HTTP GET. Non-2xx statuses are returned, not raised.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, timeout: Duration)
        -> std::result::Result<HttpResponse, FetchError>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<Record>>;
    async fn transform(&self, data: Vec<Record>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
