//! Backend module - subprocess boundary to the compositor tooling
//!
//! Provides:
//! - The `OutputBackend` trait for enumerating and applying output state
//! - The wlr-randr implementation of that trait
//! - The grim screenshot tool for canvas previews

mod screenshot;
mod wlr_randr;

pub use screenshot::Screenshooter;
pub use wlr_randr::WlrRandrBackend;

use async_trait::async_trait;
use thiserror::Error;

use crate::monitor::{InvalidTransform, Monitor};

/// Errors at the subprocess boundary.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("required tool not found in PATH: {0}")]
    ToolUnavailable(String),

    #[error("{tool} exited with {status}")]
    CommandFailed {
        tool: String,
        status: std::process::ExitStatus,
    },

    #[error("{tool} did not finish within {timeout_ms} ms")]
    Timeout { tool: String, timeout_ms: u64 },

    #[error("malformed output listing: {0}")]
    MalformedListing(String),

    #[error("failed to parse output listing: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    InvalidTransform(#[from] InvalidTransform),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Boundary to the external display-configuration command.
///
/// Enumeration failure leaves zero monitors, never a default set; apply
/// failure is surfaced to the caller and never retried.
#[async_trait]
pub trait OutputBackend: Send + Sync {
    /// Current set of outputs known to the compositor.
    async fn enumerate(&self) -> BackendResult<Vec<Monitor>>;

    /// Push the given monitor state to the compositor, one invocation per
    /// monitor, in list order.
    async fn apply(&self, monitors: &[Monitor]) -> BackendResult<()>;
}
