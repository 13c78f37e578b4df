//! Orchestration request and result types
//!
//! Canonical shapes the client hands to callers. Wire tolerance (string or
//! object) lives in [`crate::decoder`]; these types only ever serialize as
//! objects.

use serde::{Deserialize, Serialize};

/// Body of `POST /process-file`.
///
/// `file_name` carries an opaque file identifier. The key name is kept for
/// compatibility with the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessFileRequest {
    pub file_name: String,
    pub task_prompt: String,
}

impl ProcessFileRequest {
    pub fn new(file_id: impl Into<String>, instruction: impl Into<String>) -> Self {
        Self {
            file_name: file_id.into(),
            task_prompt: instruction.into(),
        }
    }
}

/// An original or renamed file. Both fields are always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReference {
    pub id: String,
    pub name: String,
}

impl FileReference {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// A bare identifier doubles as the display name.
    pub fn from_identifier(identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        Self {
            name: identifier.clone(),
            id: identifier,
        }
    }
}

/// Destination folder. Either field may be unknown, e.g. when no folder was
/// created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FolderReference {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl FolderReference {
    pub fn from_identifier(identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        Self {
            id: Some(identifier.clone()),
            name: Some(identifier),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.id.is_none() && self.name.is_none()
    }
}

/// Result of the move step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MoveOutcome {
    pub file_id: Option<String>,
    pub moved_to_folder_id: Option<String>,
    pub status: Option<String>,
}

impl MoveOutcome {
    pub fn from_status(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            ..Default::default()
        }
    }
}

/// Decoded `/process-file` response. Built once per call and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrchestrationResult {
    pub original_file: FileReference,
    pub renamed_file: Option<FileReference>,
    /// `null` or absent on the wire decodes to an unknown folder.
    pub target_folder: FolderReference,
    pub move_outcome: Option<MoveOutcome>,
    /// Progress log in emission order.
    pub status_updates: Vec<String>,
    pub error_message: Option<String>,
}

impl OrchestrationResult {
    /// Backend-reported failure carried by an otherwise successful response.
    ///
    /// An empty `error_message` is not a failure.
    pub fn soft_error(&self) -> Option<&str> {
        self.error_message
            .as_deref()
            .filter(|message| !message.trim().is_empty())
    }

    pub fn has_soft_error(&self) -> bool {
        self.soft_error().is_some()
    }
}

/// Greeting returned by `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceMessage {
    pub message: String,
}
