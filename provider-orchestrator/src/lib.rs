//! # Orchestration Provider
//!
//! Client for the file-processing orchestration backend.
//!
//! ## Overview
//!
//! This module provides:
//! - `POST /process-file` submission with outcome classification
//! - Tolerant decoding of responses whose sub-objects may arrive as bare
//!   strings or as structured objects, depending on the backend version
//! - The `GET /` greeting used as a connectivity check
//!
//! Requests are single-attempt. Nothing here retries.

pub mod client;
pub mod decoder;
pub mod error;
pub mod types;

pub use client::{OrchestrationClient, PROCESS_FILE_PATH};
pub use decoder::decode_orchestration_result;
pub use error::{OrchestrationError, Result, ServerError, AUTHENTICATION_EXPIRED_MESSAGE};
pub use types::{
    FileReference, FolderReference, MoveOutcome, OrchestrationResult, ProcessFileRequest,
    ServiceMessage,
};
