//! Flattening of nested user fields.
//!
//! Steps per record, in order: `address`, `phone`, `company`. A missing
//! `address` or `company` (or a missing `phone` key) stops the record where it
//! is. An unparsable phone only swaps in [`PHONE_SENTINEL`].

use crate::domain::model::{FailureReason, Record, RecordFailure, RecordOutcome, TransformResult};
use crate::utils::error::{EtlError, Result};
use phonenumber::country;
use phonenumber::Mode;
use serde_json::Value;

pub const PHONE_SENTINEL: &str = "Unknown";
pub const DEFAULT_REGION: country::Id = country::Id::US;

const ADDRESS_PARTS: [&str; 4] = ["street", "suite", "city", "zipcode"];

/// Decode a response body into records. Anything but an array of objects is rejected.
pub fn parse_payload(body: &str) -> Result<Vec<Record>> {
    let value: Value = serde_json::from_str(body).map_err(|e| EtlError::FormatError {
        message: format!("invalid JSON: {}", e),
    })?;

    let Value::Array(items) = value else {
        return Err(EtlError::FormatError {
            message: "expected a JSON array of user records".to_string(),
        });
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(map) => Ok(Record::new(map)),
            other => Err(EtlError::FormatError {
                message: format!("element {} is not an object: {}", index, other),
            }),
        })
        .collect()
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `"{street}, {suite}, {city}, {zipcode}"` from an address object.
pub fn flatten_address(address: &Value) -> std::result::Result<String, FailureReason> {
    let Value::Object(parts) = address else {
        return Err(FailureReason::InvalidField("address".to_string()));
    };

    let mut flat = Vec::with_capacity(ADDRESS_PARTS.len());
    for key in ADDRESS_PARTS {
        let part = parts
            .get(key)
            .ok_or_else(|| FailureReason::MissingField(key.to_string()))?;
        flat.push(text(part));
    }
    Ok(flat.join(", "))
}

/// International format of `raw`, e.g. `+1 770-736-8031`.
pub fn format_phone(raw: &str, region: country::Id) -> Option<String> {
    phonenumber::parse(Some(region), raw)
        .ok()
        .map(|number| number.format().mode(Mode::International).to_string())
}

fn company_name(company: &Value) -> std::result::Result<Value, FailureReason> {
    let Value::Object(fields) = company else {
        return Err(FailureReason::InvalidField("company".to_string()));
    };
    fields
        .get("name")
        .cloned()
        .ok_or_else(|| FailureReason::MissingField("name".to_string()))
}

fn required<'a>(record: &'a Record, key: &str) -> std::result::Result<&'a Value, FailureReason> {
    record
        .data
        .get(key)
        .ok_or_else(|| FailureReason::MissingField(key.to_string()))
}

/// Apply the three field steps to `record`, returning `Ok(phone_fallback)`
/// or the reason the record stopped.
fn apply_steps(record: &mut Record) -> std::result::Result<bool, FailureReason> {
    let address = flatten_address(required(record, "address")?)?;
    record.data.insert("address".to_string(), Value::String(address));

    let phone = match required(record, "phone")? {
        Value::String(raw) => format_phone(raw, DEFAULT_REGION),
        _ => None,
    };
    let phone_fallback = phone.is_none();
    if phone_fallback {
        tracing::warn!("Invalid phone number format for user {}.", record.id_label());
    }
    record.data.insert(
        "phone".to_string(),
        Value::String(phone.unwrap_or_else(|| PHONE_SENTINEL.to_string())),
    );

    let company = company_name(required(record, "company")?)?;
    record.data.insert("company".to_string(), company);

    Ok(phone_fallback)
}

pub fn normalize_record(mut record: Record) -> RecordOutcome {
    match apply_steps(&mut record) {
        Ok(phone_fallback) => RecordOutcome::Normalized {
            record,
            phone_fallback,
        },
        Err(reason) => {
            let failure = RecordFailure {
                record_id: record.id_label(),
                reason,
            };
            tracing::warn!("{}", failure);
            RecordOutcome::Failed { record, failure }
        }
    }
}

pub fn normalize_records(records: Vec<Record>) -> TransformResult {
    let mut result = TransformResult {
        processed_records: Vec::with_capacity(records.len()),
        ..Default::default()
    };

    for record in records {
        match normalize_record(record) {
            RecordOutcome::Normalized {
                record,
                phone_fallback,
            } => {
                if phone_fallback {
                    result.phone_fallbacks.push(record.id_label());
                }
                result.processed_records.push(record);
            }
            RecordOutcome::Failed { record, failure } => {
                result.failures.push(failure);
                result.processed_records.push(record);
            }
        }
    }

    result
}
