use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One user as received from the API, mutated in place by the normalizer.
/// Key order is the order the API sent them in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: Map<String, Value>,
}

impl Record {
    pub fn new(data: Map<String, Value>) -> Self {
        Self { data }
    }

    /// The `id` as text for diagnostics, `"unknown"` when the record has none.
    pub fn id_label(&self) -> String {
        match self.data.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "unknown".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// A required key is absent.
    MissingField(String),
    /// The key exists but does not hold an object.
    InvalidField(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    pub record_id: String,
    pub reason: FailureReason,
}

impl fmt::Display for RecordFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            FailureReason::MissingField(key) => {
                write!(f, "Key '{}' not found for user {}.", key, self.record_id)
            }
            FailureReason::InvalidField(key) => {
                write!(f, "Key '{}' is not an object for user {}.", key, self.record_id)
            }
        }
    }
}

/// Result of normalizing a single record. A failed record carries whatever
/// was transformed before the failing step.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Normalized { record: Record, phone_fallback: bool },
    Failed { record: Record, failure: RecordFailure },
}

impl RecordOutcome {
    pub fn record(&self) -> &Record {
        match self {
            RecordOutcome::Normalized { record, .. } | RecordOutcome::Failed { record, .. } => {
                record
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransformResult {
    /// Every input record, in input order, including partially transformed ones.
    pub processed_records: Vec<Record>,
    pub failures: Vec<RecordFailure>,
    /// Ids of records whose phone was replaced with the sentinel.
    pub phone_fallbacks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum OutputEncoding {
    #[default]
    Utf8,
    /// UTF-8 with a leading byte order mark.
    Utf8Sig,
    Ascii,
}

impl fmt::Display for OutputEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputEncoding::Utf8 => "utf-8",
            OutputEncoding::Utf8Sig => "utf-8-sig",
            OutputEncoding::Ascii => "ascii",
        };
        f.write_str(name)
    }
}
