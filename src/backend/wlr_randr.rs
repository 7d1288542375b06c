//! wlr-randr backend
//!
//! Enumerates outputs as JSON over `wlr-randr --json` and applies a layout
//! with one `wlr-randr` invocation per output. Both calls are one-shot and
//! synchronous from the controller's point of view; the only hardening on
//! top of the original tool contract is a timeout.

use std::process::Output;
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;

use super::{BackendError, BackendResult, OutputBackend};
use crate::monitor::{Mode, Monitor, Position, Transform};

/// One output object as printed by `wlr-randr --json`. Missing required
/// fields fail the whole enumeration here, before any `Monitor` exists.
#[derive(Debug, Deserialize)]
struct RawOutput {
    name: String,
    make: String,
    model: Option<String>,
    serial: Option<String>,
    enabled: bool,
    scale: f64,
    position: RawPosition,
    transform: String,
    #[serde(default)]
    modes: Vec<RawMode>,
}

#[derive(Debug, Deserialize)]
struct RawPosition {
    x: i32,
    y: i32,
}

#[derive(Debug, Deserialize)]
struct RawMode {
    width: i32,
    height: i32,
    refresh: i32,
    preferred: bool,
    current: bool,
}

impl RawOutput {
    fn into_monitor(self) -> BackendResult<Monitor> {
        let transform: Transform = self.transform.parse()?;
        if self.modes.is_empty() {
            return Err(BackendError::MalformedListing(format!(
                "output {} lists no modes",
                self.name
            )));
        }
        let modes = self
            .modes
            .into_iter()
            .map(|m| Mode::new(m.width, m.height, m.refresh, m.preferred, m.current))
            .collect();
        Ok(Monitor::new(
            self.name,
            self.make,
            self.model,
            self.serial,
            self.enabled,
            self.scale,
            Position::new(self.position.x, self.position.y),
            transform,
            modes,
        ))
    }
}

/// Parse a full `wlr-randr --json` listing. Any malformed entry fails the
/// entire enumeration; there is no partial monitor list.
fn parse_listing(json: &str) -> BackendResult<Vec<Monitor>> {
    let raw: Vec<RawOutput> = serde_json::from_str(json)?;
    raw.into_iter().map(RawOutput::into_monitor).collect()
}

/// Arguments of the apply invocation for one monitor.
fn apply_args(monitor: &Monitor) -> Vec<String> {
    let mode = monitor.active_mode();
    let position = monitor.position();
    let mut args = vec!["--output".to_string(), monitor.name.clone()];
    args.push(if monitor.enabled() { "--on" } else { "--off" }.to_string());
    args.push("--mode".to_string());
    args.push(format!("{}x{}@{}", mode.width, mode.height, mode.refresh));
    if mode.preferred {
        args.push("--preferred".to_string());
    }
    args.push("--pos".to_string());
    args.push(format!("{},{}", position.x, position.y));
    args.push("--transform".to_string());
    args.push(monitor.transform().label().to_string());
    args.push("--scale".to_string());
    args.push(monitor.scale().to_string());
    args
}

/// The wlr-randr subprocess backend.
pub struct WlrRandrBackend {
    program: String,
    timeout: Duration,
}

impl WlrRandrBackend {
    /// Default name of the randr executable.
    pub const PROGRAM: &'static str = "wlr-randr";

    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    async fn run(&self, args: &[String]) -> BackendResult<Output> {
        tracing::debug!("running {} {}", self.program, args.join(" "));
        let result = tokio::time::timeout(
            self.timeout,
            Command::new(&self.program).args(args).output(),
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
        Ok(output)
    }
}

#[async_trait::async_trait]
impl OutputBackend for WlrRandrBackend {
    async fn enumerate(&self) -> BackendResult<Vec<Monitor>> {
        let output = self.run(&["--json".to_string()]).await?;
        let listing = String::from_utf8_lossy(&output.stdout);
        let monitors = parse_listing(&listing)?;
        tracing::info!("enumerated {} outputs", monitors.len());
        Ok(monitors)
    }

    async fn apply(&self, monitors: &[Monitor]) -> BackendResult<()> {
        for monitor in monitors {
            self.run(&apply_args(monitor)).await?;
            tracing::info!("applied configuration for {}", monitor.name);
        }
        Ok(())
    }
}
