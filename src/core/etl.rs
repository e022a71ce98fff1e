use crate::core::Pipeline;
use crate::utils::error::EtlError;

/// How a run ended. Every stage failure is folded into one of these.
#[derive(Debug)]
pub enum RunOutcome {
    Written {
        path: String,
        rows: usize,
        record_failures: usize,
    },
    /// Nothing to write: the fetch failed, the body was not usable, or the list was empty.
    NoData,
    WriteFailed(EtlError),
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

fn report(stage: &str, error: &EtlError) {
    tracing::error!("❌ {} failed: {}", stage, error);
    tracing::error!("💡 {}", error.recovery_suggestion());
    eprintln!("❌ {}", error.user_friendly_message());
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> RunOutcome {
        tracing::info!("Starting ETL process...");

        // Extract
        let raw_data = match self.pipeline.extract().await {
            Ok(records) => records,
            Err(e) => {
                report("Extract", &e);
                Vec::new()
            }
        };

        // Transform
        let transformed = match self.pipeline.transform(raw_data).await {
            Ok(result) => result,
            Err(e) => {
                report("Transform", &e);
                return RunOutcome::NoData;
            }
        };

        if transformed.processed_records.is_empty() {
            tracing::info!("No data found to write to CSV.");
            println!("No data found to write to CSV.");
            return RunOutcome::NoData;
        }

        // Load
        let rows = transformed.processed_records.len();
        let record_failures = transformed.failures.len();
        match self.pipeline.load(transformed).await {
            Ok(path) => {
                println!("CSV file created successfully.");
                RunOutcome::Written {
                    path,
                    rows,
                    record_failures,
                }
            }
            Err(e) => {
                report("Load", &e);
                RunOutcome::WriteFailed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Record, TransformResult};
    use crate::domain::model::{FailureReason, RecordFailure};
    use crate::utils::error::{FetchError, Result, WriteError};
    use std::sync::atomic::{AtomicBool, Ordering};

    struct StubPipeline {
        extracted: fn() -> Result<Vec<Record>>,
        load_fails: bool,
        loaded: AtomicBool,
    }

    impl StubPipeline {
        fn new(extracted: fn() -> Result<Vec<Record>>, load_fails: bool) -> Self {
            Self {
                extracted,
                load_fails,
                loaded: AtomicBool::new(false),
            }
        }
    }

    #[async_trait::async_trait]
    impl Pipeline for StubPipeline {
        async fn extract(&self) -> Result<Vec<Record>> {
            (self.extracted)()
        }

        async fn transform(&self, data: Vec<Record>) -> Result<TransformResult> {
            let failures = data
                .iter()
                .filter(|r| !r.data.contains_key("company"))
                .map(|r| RecordFailure {
                    record_id: r.id_label(),
                    reason: FailureReason::MissingField("company".to_string()),
                })
                .collect();
            Ok(TransformResult {
                processed_records: data,
                failures,
                phone_fallbacks: Vec::new(),
            })
        }

        async fn load(&self, _result: TransformResult) -> Result<String> {
            self.loaded.store(true, Ordering::SeqCst);
            if self.load_fails {
                Err(WriteError::PermissionDenied {
                    path: "users.csv".into(),
                }
                .into())
            } else {
                Ok("users.csv".to_string())
            }
        }
    }

    fn two_users() -> Result<Vec<Record>> {
        Ok(serde_json::from_str(r#"[{"id":1,"company":"A"},{"id":2}]"#)?)
    }

    #[tokio::test]
    async fn test_run_writes_and_counts_failures() {
        let engine = EtlEngine::new(StubPipeline::new(two_users, false));

        match engine.run().await {
            RunOutcome::Written {
                path,
                rows,
                record_failures,
            } => {
                assert_eq!(path, "users.csv");
                assert_eq!(rows, 2);
                assert_eq!(record_failures, 1);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_failure_takes_no_data_path() {
        let pipeline = StubPipeline::new(
            || Err(FetchError::Connection("refused".into()).into()),
            false,
        );
        let engine = EtlEngine::new(pipeline);

        assert!(matches!(engine.run().await, RunOutcome::NoData));
        assert!(!engine.pipeline.loaded.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_empty_list_skips_load() {
        let engine = EtlEngine::new(StubPipeline::new(|| Ok(Vec::new()), false));

        assert!(matches!(engine.run().await, RunOutcome::NoData));
        assert!(!engine.pipeline.loaded.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_write_failure_is_reported_not_raised() {
        let engine = EtlEngine::new(StubPipeline::new(two_users, true));

        assert!(matches!(
            engine.run().await,
            RunOutcome::WriteFailed(EtlError::WriteError(WriteError::PermissionDenied { .. }))
        ));
    }
}
