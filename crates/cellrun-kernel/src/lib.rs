//! # cellrun-kernel
//!
//! The kernel layer of the cellrun execution core: an object-safe contract
//! over a running interpreter process, a concrete prompt-framed REPL driver,
//! the kernel wire-protocol message types, and a registry that maps language
//! identifiers to kernel factories.
//!
//! A kernel owns exactly one interpreter subprocess and moves through
//! `NotStarted → Running → (Interrupting) → Running | Terminated`. Kernels
//! carry no internal timeout; bounding an execution is the session layer's
//! job.

mod error;
mod kernel;
pub mod protocol;
mod registry;
mod repl;

pub use error::{KernelError, Result};
pub use kernel::{Kernel, KernelState, RawOutcome};
pub use registry::{KernelFactory, KernelRegistry};
pub use repl::{ReplKernel, ReplSpec};
