//! JSON persistence for finished documents

use crate::output::document::Document;
use crate::output::traits::{DocumentSink, OutputResult};
use serde_json::Value;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes documents to a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
    source_key: Option<String>,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>, source_key: Option<String>) -> Self {
        Self {
            path: path.into(),
            source_key,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentSink for JsonFileSink {
    fn persist(&self, document: &Document) -> OutputResult<()> {
        write_document(document, &self.path, self.source_key.as_deref())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Converts a document into the value that gets written
///
/// With a `source_key` the document is nested one level down, so several
/// sources collected in the same run can share one file layout.
pub fn document_value(document: &Document, source_key: Option<&str>) -> OutputResult<Value> {
    let value = serde_json::to_value(document)?;

    Ok(match source_key {
        Some(key) => {
            let mut root = serde_json::Map::new();
            root.insert(key.to_string(), value);
            Value::Object(root)
        }
        None => value,
    })
}

/// Writes a document as pretty-printed JSON
///
/// Parent directories are created as needed. Non-ASCII text is written as-is.
///
/// # Arguments
///
/// * `document` - The finished document
/// * `output_path` - Destination file
/// * `source_key` - Optional top-level key to nest the document under
pub fn write_document(
    document: &Document,
    output_path: &Path,
    source_key: Option<&str>,
) -> OutputResult<()> {
    let value = document_value(document, source_key)?;
    let json = serde_json::to_string_pretty(&value)?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(output_path)?;
    file.write_all(json.as_bytes())?;
    file.write_all(b"\n")?;

    tracing::info!("Document saved to {}", output_path.display());
    Ok(())
}
