//! # cellrun-session
//!
//! The session layer of the cellrun execution core: a [`Session`] owns one
//! kernel, sequences cell executions against it, and bounds each execution
//! through the timeout supervisor. Timeouts trigger first-class cancellation
//! of the interpreter (interrupt, bounded grace, forced replacement) rather
//! than abandoning work in the background.

mod error;
mod session;
mod supervisor;

pub use error::{Result, SessionError};
pub use session::Session;
pub use supervisor::{run_with_timeout, ExecutionTimeout};
