use crate::core::fetcher::Fetcher;
use crate::core::normalizer::{normalize_records, parse_payload};
use crate::core::writer::{preview, CsvWriter};
use crate::core::{ConfigProvider, Pipeline, Record, Storage, TransformResult, Transport};
use crate::utils::error::Result;

pub struct UserPipeline<S: Storage, T: Transport, C: ConfigProvider> {
    storage: S,
    config: C,
    fetcher: Fetcher<T>,
}

impl<S: Storage, T: Transport, C: ConfigProvider> UserPipeline<S, T, C> {
    pub fn new(storage: S, transport: T, config: C) -> Self {
        let fetcher = Fetcher::from_config(transport, &config);
        Self {
            storage,
            config,
            fetcher,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, T: Transport, C: ConfigProvider> Pipeline for UserPipeline<S, T, C> {
    async fn extract(&self) -> Result<Vec<Record>> {
        tracing::info!("🚀 Fetching users from: {}", self.config.api_endpoint());

        let body = self.fetcher.fetch(self.config.api_endpoint()).await?;
        let records = parse_payload(&body)?;

        tracing::info!("📊 Extracted {} records", records.len());
        Ok(records)
    }

    async fn transform(&self, data: Vec<Record>) -> Result<TransformResult> {
        tracing::info!("🔧 Normalizing {} records", data.len());

        let result = normalize_records(data);

        tracing::info!(
            failures = result.failures.len(),
            phone_fallbacks = result.phone_fallbacks.len(),
            "✅ Normalized {} records",
            result.processed_records.len()
        );
        Ok(result)
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let records = &result.processed_records;
        preview(records);

        let path = self.config.output_path();
        let encoding = CsvWriter::new(&self.storage, path)
            .write(records, self.config.encoding())
            .await?;

        let location = self.storage.describe(path);
        tracing::info!("💾 Wrote {} rows ({}) to {}", records.len(), encoding, location);
        Ok(location)
    }
}
