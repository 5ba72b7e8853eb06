//! Kernel wire-protocol message types.
//!
//! Collaborators that frame execution as discrete messages rather than
//! direct calls (a websocket gateway, a message bus) speak these shapes.
//! Every message carries a request or session identifier and a typed
//! content payload.

use crate::kernel::KernelState;
use cellrun_common::{ExecutionResult, ExecutionStatus, Language};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kinds of messages exchanged with a kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    ExecuteRequest,
    ExecuteResponse,
    StreamOutput,
    Error,
    Status,
    Interrupt,
    Restart,
}

/// Which stream a [`StreamOutput`] chunk belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamName {
    Stdout,
    Stderr,
}

/// Request to execute one cell of code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteRequest {
    #[serde(rename = "type")]
    pub msg_type: MessageType,
    pub request_id: String,
    pub session_id: String,
    pub language: Language,
    pub code: String,
    /// Wall-clock budget in seconds.
    #[serde(default)]
    pub timeout: Option<u64>,
}

impl ExecuteRequest {
    /// Build a request with a fresh request id.
    pub fn new(session_id: impl Into<String>, language: Language, code: impl Into<String>) -> Self {
        Self {
            msg_type: MessageType::ExecuteRequest,
            request_id: Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            language,
            code: code.into(),
            timeout: None,
        }
    }
}

/// Reply to an [`ExecuteRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteResponse {
    #[serde(rename = "type")]
    pub msg_type: MessageType,
    pub request_id: String,
    pub execution_count: u32,
    pub status: ExecutionStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ExecuteResponse {
    /// Build the reply for a finished execution.
    pub fn from_result(request_id: impl Into<String>, result: &ExecutionResult) -> Self {
        Self {
            msg_type: MessageType::ExecuteResponse,
            request_id: request_id.into(),
            execution_count: result.execution_count,
            status: result.status,
            stdout: result.stdout.clone(),
            stderr: result.stderr.clone(),
        }
    }
}

/// Incremental output emitted while a cell runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamOutput {
    #[serde(rename = "type")]
    pub msg_type: MessageType,
    pub request_id: String,
    pub stream: StreamName,
    pub text: String,
}

impl StreamOutput {
    pub fn new(request_id: impl Into<String>, stream: StreamName, text: impl Into<String>) -> Self {
        Self {
            msg_type: MessageType::StreamOutput,
            request_id: request_id.into(),
            stream,
            text: text.into(),
        }
    }
}

/// Failure notification for a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: MessageType,
    pub request_id: String,
    pub error: String,
}

impl ErrorMessage {
    pub fn new(request_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            msg_type: MessageType::Error,
            request_id: request_id.into(),
            error: error.into(),
        }
    }
}

/// Kernel lifecycle announcement for a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusMessage {
    #[serde(rename = "type")]
    pub msg_type: MessageType,
    pub session_id: String,
    pub state: KernelState,
}

impl StatusMessage {
    pub fn new(session_id: impl Into<String>, state: KernelState) -> Self {
        Self {
            msg_type: MessageType::Status,
            session_id: session_id.into(),
            state,
        }
    }
}

/// Request to interrupt the in-flight execution of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterruptRequest {
    #[serde(rename = "type")]
    pub msg_type: MessageType,
    pub session_id: String,
}

impl InterruptRequest {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            msg_type: MessageType::Interrupt,
            session_id: session_id.into(),
        }
    }
}

/// Request to restart a session's kernel, dropping interpreter state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestartRequest {
    #[serde(rename = "type")]
    pub msg_type: MessageType,
    pub session_id: String,
}

impl RestartRequest {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            msg_type: MessageType::Restart,
            session_id: session_id.into(),
        }
    }
}
