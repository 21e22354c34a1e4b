use crate::{
    config::ReaderConfig,
    errors::{RecordError, RecordResult},
    record::AstRecord,
    traits::RecordSource,
};
use log::{debug, trace};
use serde_json::Value;
use std::fs;
use std::path::Path;

const RECORD_TYPE_KEY: &str = "recordType";
const KNOWN_RECORD_TYPES: [&str; 2] = ["apexClass", "scriptComponent"];

/// Reads records serialized as JSON objects tagged with `recordType`.
#[derive(Debug, Clone, Default)]
pub struct JsonRecordReader {
    config: ReaderConfig,
}

impl JsonRecordReader {
    /// Create a reader with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a reader with custom configuration
    pub fn with_config(config: ReaderConfig) -> Self {
        Self { config }
    }

    /// Reader configuration
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Decode a record from JSON text; `path` is only used in errors.
    pub fn parse_str(&self, text: &str, path: &Path) -> RecordResult<AstRecord> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| RecordError::Json(path.to_path_buf(), e))?;

        let record_type = match &value {
            Value::Object(map) => map.get(RECORD_TYPE_KEY).and_then(Value::as_str),
            _ => {
                return Err(RecordError::Malformed(
                    path.to_path_buf(),
                    "top-level value is not an object".to_string(),
                ))
            }
        };
        match record_type {
            None => {
                return Err(RecordError::Malformed(
                    path.to_path_buf(),
                    format!("missing '{RECORD_TYPE_KEY}'"),
                ))
            }
            Some(kind) if !KNOWN_RECORD_TYPES.contains(&kind) => {
                debug!("Unsupported record type '{kind}' in {path:?}");
                return Err(RecordError::Unsupported(path.to_path_buf()));
            }
            Some(_) => {}
        }

        let record: AstRecord =
            serde_json::from_value(value).map_err(|e| RecordError::Json(path.to_path_buf(), e))?;
        record
            .validate()
            .map_err(|message| RecordError::Malformed(path.to_path_buf(), message))?;

        trace!("Read {} record '{}' from {path:?}", record.record_type(), record.name());
        Ok(record)
    }
}

impl RecordSource for JsonRecordReader {
    fn name(&self) -> &str {
        "json"
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .is_some_and(|ext| self.config.extensions.iter().any(|e| *e == ext))
    }

    fn read_record(&self, path: &Path) -> RecordResult<AstRecord> {
        if !self.accepts(path) {
            return Err(RecordError::Unsupported(path.to_path_buf()));
        }

        let metadata = fs::metadata(path).map_err(|e| RecordError::Io(path.to_path_buf(), e))?;
        if metadata.len() > self.config.max_file_size {
            return Err(RecordError::Malformed(
                path.to_path_buf(),
                format!(
                    "file is {} bytes, larger than the {} byte limit",
                    metadata.len(),
                    self.config.max_file_size
                ),
            ));
        }

        let text = fs::read_to_string(path).map_err(|e| RecordError::Io(path.to_path_buf(), e))?;
        self.parse_str(&text, path)
    }
}
