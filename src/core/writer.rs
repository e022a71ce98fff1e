use crate::domain::model::{OutputEncoding, Record};
use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result, WriteError};
use serde_json::Value;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
pub const PREVIEW_ROWS: usize = 5;

/// Column names: every key of every record, in first-seen order.
pub fn collect_headers(records: &[Record]) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    for record in records {
        for key in record.data.keys() {
            if !headers.iter().any(|h| h == key) {
                headers.push(key.clone());
            }
        }
    }
    headers
}

pub fn cell_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn rows<'a>(
    records: &'a [Record],
    headers: &'a [String],
) -> impl Iterator<Item = Vec<String>> + 'a {
    records.iter().map(move |record| {
        headers
            .iter()
            .map(|h| cell_value(record.data.get(h)))
            .collect()
    })
}

fn check_encoding(field: &str, encoding: OutputEncoding) -> Result<()> {
    if encoding == OutputEncoding::Ascii && !field.is_ascii() {
        return Err(WriteError::Encoding {
            value: field.to_string(),
            encoding: encoding.to_string(),
        }
        .into());
    }
    Ok(())
}

/// Serialize `records` to comma-separated bytes: header row, one row per record.
pub fn to_csv_bytes(records: &[Record], encoding: OutputEncoding) -> Result<Vec<u8>> {
    let headers = collect_headers(records);

    let mut buffer = Vec::new();
    if encoding == OutputEncoding::Utf8Sig {
        buffer.extend_from_slice(UTF8_BOM);
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(buffer);

    for header in &headers {
        check_encoding(header, encoding)?;
    }
    writer.write_record(&headers)?;

    for row in rows(records, &headers) {
        for field in &row {
            check_encoding(field, encoding)?;
        }
        writer.write_record(&row)?;
    }

    writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))
}

/// Log the first few rows, like a dataframe head.
pub fn preview(records: &[Record]) {
    let headers = collect_headers(records);
    tracing::info!("{}", headers.join(" | "));
    for row in rows(records, &headers).take(PREVIEW_ROWS) {
        tracing::info!("{}", row.join(" | "));
    }
    if records.len() > PREVIEW_ROWS {
        tracing::info!("... {} more row(s)", records.len() - PREVIEW_ROWS);
    }
}

pub struct CsvWriter<'a, S: Storage> {
    storage: &'a S,
    path: &'a str,
}

impl<'a, S: Storage> CsvWriter<'a, S> {
    pub fn new(storage: &'a S, path: &'a str) -> Self {
        Self { storage, path }
    }

    /// Write `records`, retrying once with a BOM-prefixed UTF-8 file when
    /// `encoding` cannot hold a value. Returns the encoding actually used.
    pub async fn write(
        &self,
        records: &[Record],
        encoding: OutputEncoding,
    ) -> Result<OutputEncoding> {
        match self.write_as(records, encoding).await {
            Err(EtlError::WriteError(WriteError::Encoding { value, .. }))
                if encoding != OutputEncoding::Utf8Sig =>
            {
                tracing::warn!(
                    value = %value,
                    "Encoding error. Save with utf-8 or utf-8-sig encoding. Falling back to {}",
                    OutputEncoding::Utf8Sig
                );
                self.write_as(records, OutputEncoding::Utf8Sig).await?;
                Ok(OutputEncoding::Utf8Sig)
            }
            other => other.map(|_| encoding),
        }
    }

    async fn write_as(&self, records: &[Record], encoding: OutputEncoding) -> Result<()> {
        let bytes = to_csv_bytes(records, encoding)?;
        tracing::debug!(
            "Writing {} bytes as {} to {}",
            bytes.len(),
            encoding,
            self.storage.describe(self.path)
        );
        self.storage.write_file(self.path, &bytes).await
    }
}
