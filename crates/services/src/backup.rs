//! Progress export and import documents.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use course_core::model::ProgressMap;

use crate::error::BackupError;

const LOCAL_PROGRESS_KEY: &str = "local_progress";
const SERVER_PROGRESS_KEY: &str = "progress";

/// Server export blob with the local progress map added under `local_progress`.
///
/// # Errors
///
/// Returns `BackupError::Malformed` if the document cannot be serialized.
pub fn export_document(server: Value, local: &ProgressMap) -> Result<String, BackupError> {
    let mut document = match server {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert(SERVER_PROGRESS_KEY.to_string(), other);
            map
        }
    };
    let local = serde_json::to_value(local).map_err(|err| BackupError::Malformed(err.to_string()))?;
    document.insert(LOCAL_PROGRESS_KEY.to_string(), local);
    serde_json::to_string_pretty(&Value::Object(document))
        .map_err(|err| BackupError::Malformed(err.to_string()))
}

#[must_use]
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("course-progress-{}.json", now.format("%Y-%m-%d"))
}

/// What an import document asks for.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportPlan {
    /// Records to merge into the local map.
    pub local_progress: Option<ProgressMap>,
    /// The whole document, when it carries server progress to post back.
    pub server_blob: Option<Value>,
}

/// # Errors
///
/// Returns `BackupError::Malformed` unless `text` is a JSON object.
pub fn parse_import(text: &str) -> Result<ImportPlan, BackupError> {
    let value: Value =
        serde_json::from_str(text).map_err(|err| BackupError::Malformed(err.to_string()))?;
    let Value::Object(map) = &value else {
        return Err(BackupError::Malformed("expected a JSON object".into()));
    };
    let local_progress = map
        .get(LOCAL_PROGRESS_KEY)
        .cloned()
        .map(ProgressMap::from_json_lenient);
    let server_blob = map.contains_key(SERVER_PROGRESS_KEY).then_some(value.clone());
    Ok(ImportPlan {
        local_progress,
        server_blob,
    })
}
