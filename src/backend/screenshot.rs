//! Screenshot capture for canvas previews
//!
//! Grabs one frame per output with grim. Previews are cosmetic: a missing
//! tool degrades to tiles without content, it never fails an edit.

use std::time::Duration;

use tempfile::TempPath;
use tokio::process::Command;

use super::{BackendError, BackendResult};
use crate::monitor::Monitor;

/// Captures per-output frames into temporary PNG files.
pub struct Screenshooter {
    program: String,
    timeout: Duration,
}

impl Screenshooter {
    /// Default name of the screenshot executable.
    pub const PROGRAM: &'static str = "grim";

    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Whether the capture tool can be spawned at all.
    pub async fn available(&self) -> bool {
        match Command::new(&self.program).arg("-h").output().await {
            Ok(_) => true,
            Err(e) => e.kind() != std::io::ErrorKind::NotFound,
        }
    }

    /// Capture the given output's real-pixel region into a temporary file.
    /// The file is deleted when the returned path is dropped.
    pub async fn capture(&self, monitor: &Monitor) -> BackendResult<TempPath> {
        let file = tempfile::Builder::new()
            .prefix("waylayout-")
            .suffix(".png")
            .tempfile()?;
        let path = file.into_temp_path();

        let position = monitor.position();
        let geometry = format!(
            "{},{} {}x{}",
            position.x,
            position.y,
            monitor.width(),
            monitor.height()
        );

        tracing::debug!("capturing {} ({})", monitor.name, geometry);
        let result = tokio::time::timeout(
            self.timeout,
            Command::new(&self.program)
                .arg("-o")
                .arg(&monitor.name)
                .arg("-g")
                .arg(&geometry)
                .arg(path.as_os_str())
                .output(),
        )
        .await
        .map_err(|_| BackendError::Timeout {
            tool: self.program.clone(),
            timeout_ms: self.timeout.as_millis() as u64,
        })?;

        let output = result.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BackendError::ToolUnavailable(self.program.clone()),
            _ => BackendError::Io(e),
        })?;

        if !output.status.success() {
            return Err(BackendError::CommandFailed {
                tool: self.program.clone(),
                status: output.status,
            });
        }
        Ok(path)
    }
}
