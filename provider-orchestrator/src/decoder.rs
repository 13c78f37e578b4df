//! Adaptive response decoding
//!
//! Backend versions disagree on how sub-objects are serialized. The same
//! field may arrive as a bare identifier (`"F1"`) or as an object
//! (`{"id": "F1", "name": "Invoice.pdf"}`). Each reference type therefore
//! deserializes through an untagged representation that tries the string
//! shape first and falls back to the object shape, never the reverse.
//!
//! | Type              | Bare string `s`                  | Object keys                               |
//! |-------------------|----------------------------------|-------------------------------------------|
//! | `FileReference`   | `id = name = s`                  | `id`, `name` (both required)              |
//! | `FolderReference` | `id = name = s`                  | `id`, `name` (optional), `null` = unknown |
//! | `MoveOutcome`     | `status = s`                     | `file_id`, `moved_to_folder_id`, `status` |
//!
//! [`decode_orchestration_result`] applies these per field. Only a missing
//! or malformed `original_file` fails the whole response; a malformed
//! optional field is logged and dropped.

use crate::error::{OrchestrationError, Result};
use crate::types::{FileReference, FolderReference, MoveOutcome, OrchestrationResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FileReferenceRepr {
    Identifier(String),
    Object { id: String, name: String },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FolderReferenceRepr {
    Identifier(String),
    Object {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },
    Unknown,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MoveOutcomeRepr {
    Status(String),
    Object {
        #[serde(default)]
        file_id: Option<String>,
        #[serde(default)]
        moved_to_folder_id: Option<String>,
        #[serde(default)]
        status: Option<String>,
    },
}

impl<'de> Deserialize<'de> for FileReference {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match FileReferenceRepr::deserialize(deserializer)? {
            FileReferenceRepr::Identifier(identifier) => FileReference::from_identifier(identifier),
            FileReferenceRepr::Object { id, name } => FileReference { id, name },
        })
    }
}

impl<'de> Deserialize<'de> for FolderReference {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match FolderReferenceRepr::deserialize(deserializer)? {
            FolderReferenceRepr::Identifier(identifier) => {
                FolderReference::from_identifier(identifier)
            }
            FolderReferenceRepr::Object { id, name } => FolderReference { id, name },
            FolderReferenceRepr::Unknown => FolderReference::default(),
        })
    }
}

impl<'de> Deserialize<'de> for MoveOutcome {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match MoveOutcomeRepr::deserialize(deserializer)? {
            MoveOutcomeRepr::Status(status) => MoveOutcome::from_status(status),
            MoveOutcomeRepr::Object {
                file_id,
                moved_to_folder_id,
                status,
            } => MoveOutcome {
                file_id,
                moved_to_folder_id,
                status,
            },
        })
    }
}

/// Decode a 2xx `/process-file` body.
///
/// # Errors
///
/// `OrchestrationError::Decode` when the body is empty, is not a JSON object,
/// or lacks a usable `original_file`.
pub fn decode_orchestration_result(body: &[u8]) -> Result<OrchestrationResult> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(OrchestrationError::Decode("response body is empty".to_string()));
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| OrchestrationError::Decode(format!("response is not valid JSON: {}", e)))?;

    let mut fields = match value {
        Value::Object(fields) => fields,
        other => {
            return Err(OrchestrationError::Decode(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            )))
        }
    };

    let original_file = match fields.remove("original_file") {
        None | Some(Value::Null) => {
            return Err(OrchestrationError::Decode(
                "missing required field 'original_file'".to_string(),
            ))
        }
        Some(value) => serde_json::from_value::<FileReference>(value).map_err(|e| {
            OrchestrationError::Decode(format!("invalid 'original_file': {}", e))
        })?,
    };

    let result = OrchestrationResult {
        original_file,
        renamed_file: optional_field(&mut fields, "renamed_file"),
        target_folder: optional_field(&mut fields, "target_folder").unwrap_or_default(),
        move_outcome: optional_field(&mut fields, "final_path_suggestion"),
        status_updates: status_updates(fields.remove("status_updates")),
        error_message: optional_field(&mut fields, "error_message"),
    };

    if !fields.is_empty() {
        debug!(
            fields = ?fields.keys().collect::<Vec<_>>(),
            "Ignoring unknown response fields"
        );
    }

    Ok(result)
}

fn optional_field<T: DeserializeOwned>(fields: &mut Map<String, Value>, key: &str) -> Option<T> {
    match fields.remove(key) {
        None | Some(Value::Null) => None,
        Some(value) => match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(field = key, error = %e, "Dropping malformed optional field");
                None
            }
        },
    }
}

fn status_updates(value: Option<Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(update) => Some(update),
                other => {
                    warn!(kind = json_kind(&other), "Skipping non-string status update");
                    None
                }
            })
            .collect(),
        Some(other) => {
            warn!(kind = json_kind(&other), "status_updates is not a list");
            Vec::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_reference_from_string() {
        let file: FileReference = serde_json::from_str(r#""abc""#).unwrap();
        assert_eq!(file, FileReference::new("abc", "abc"));
    }

    #[test]
    fn test_file_reference_from_object() {
        let file: FileReference = serde_json::from_str(r#"{"id":"1","name":"doc.pdf"}"#).unwrap();
        assert_eq!(file, FileReference::new("1", "doc.pdf"));
    }

    #[test]
    fn test_file_reference_requires_id_and_name() {
        assert!(serde_json::from_str::<FileReference>(r#"{"id":"1"}"#).is_err());
        assert!(serde_json::from_str::<FileReference>("42").is_err());
    }

    #[test]
    fn test_folder_reference_shapes() {
        let folder: FolderReference = serde_json::from_str("null").unwrap();
        assert!(folder.is_unknown());

        let folder: FolderReference = serde_json::from_str(r#"{"name":"Invoices"}"#).unwrap();
        assert_eq!(folder.id, None);
        assert_eq!(folder.name.as_deref(), Some("Invoices"));

        let folder: FolderReference = serde_json::from_str(r#""fld-9""#).unwrap();
        assert_eq!(folder, FolderReference::from_identifier("fld-9"));

        let folder: FolderReference = serde_json::from_str("{}").unwrap();
        assert!(folder.is_unknown());
    }

    #[test]
    fn test_move_outcome_shapes() {
        let outcome: MoveOutcome = serde_json::from_str(r#""moved""#).unwrap();
        assert_eq!(outcome, MoveOutcome::from_status("moved"));

        let outcome: MoveOutcome = serde_json::from_str(
            r#"{"file_id":"F1","moved_to_folder_id":"D7","status":"success"}"#,
        )
        .unwrap();
        assert_eq!(outcome.file_id.as_deref(), Some("F1"));
        assert_eq!(outcome.moved_to_folder_id.as_deref(), Some("D7"));
        assert_eq!(outcome.status.as_deref(), Some("success"));
    }

    #[test]
    fn test_structured_response() {
        let body = br#"{
            "original_file": {"id": "F1", "name": "scan.pdf"},
            "renamed_file": {"id": "F1", "name": "2024-03 Invoice.pdf"},
            "target_folder": {"id": "D7", "name": "Invoices"},
            "final_path_suggestion": {"file_id": "F1", "moved_to_folder_id": "D7", "status": "success"},
            "status_updates": ["read", "renamed", "moved"],
            "error_message": null
        }"#;

        let result = decode_orchestration_result(body).unwrap();

        assert_eq!(result.original_file, FileReference::new("F1", "scan.pdf"));
        assert_eq!(
            result.renamed_file,
            Some(FileReference::new("F1", "2024-03 Invoice.pdf"))
        );
        assert_eq!(result.target_folder.name.as_deref(), Some("Invoices"));
        assert_eq!(
            result.move_outcome.unwrap().moved_to_folder_id.as_deref(),
            Some("D7")
        );
        assert_eq!(result.status_updates, vec!["read", "renamed", "moved"]);
        assert_eq!(result.error_message, None);
    }

    #[test]
    fn test_minimal_response() {
        let result = decode_orchestration_result(br#"{"original_file":"F1"}"#).unwrap();

        assert_eq!(result.original_file, FileReference::from_identifier("F1"));
        assert_eq!(result.renamed_file, None);
        assert!(result.target_folder.is_unknown());
        assert_eq!(result.move_outcome, None);
        assert!(result.status_updates.is_empty());
        assert_eq!(result.soft_error(), None);
    }

    #[test]
    fn test_soft_error_is_kept() {
        let result = decode_orchestration_result(
            br#"{"original_file":"F1","status_updates":["read"],"error_message":"disk full"}"#,
        )
        .unwrap();

        assert_eq!(result.error_message.as_deref(), Some("disk full"));
        assert_eq!(result.soft_error(), Some("disk full"));
    }

    #[test]
    fn test_malformed_optional_fields_are_dropped() {
        let body = br#"{
            "original_file": "F1",
            "renamed_file": {"id": "F1"},
            "target_folder": 17,
            "final_path_suggestion": 5,
            "status_updates": ["read", 3, "moved"],
            "error_message": false
        }"#;

        let result = decode_orchestration_result(body).unwrap();

        assert_eq!(result.renamed_file, None);
        assert!(result.target_folder.is_unknown());
        assert_eq!(result.move_outcome, None);
        assert_eq!(result.status_updates, vec!["read", "moved"]);
        assert_eq!(result.error_message, None);
    }

    #[test]
    fn test_decode_failures() {
        let bodies: [&[u8]; 5] = [b"", b"  \n", b"not json", b"[]", br#"{"status_updates":[]}"#];
        for body in bodies {
            let err = decode_orchestration_result(body).unwrap_err();
            assert!(matches!(err, OrchestrationError::Decode(_)), "{:?}", err);
        }

        let err = decode_orchestration_result(br#"{"original_file":{"name":"x"}}"#).unwrap_err();
        assert!(err.to_string().contains("original_file"));
    }
}
