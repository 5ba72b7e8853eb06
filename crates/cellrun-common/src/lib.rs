//! # cellrun-common
//!
//! Shared domain types for the cellrun execution core: the request/response
//! contract spoken by the HTTP collaborator and the configuration surface
//! consumed by the kernel, session, and executor crates.

mod config;
mod types;

pub use config::EngineConfig;
pub use types::{
    ExecutionRequest, ExecutionResult, ExecutionStatus, Language, LimitOverrides,
    UnknownLanguage, TIMEOUT_MESSAGE,
};
