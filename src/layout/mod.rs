//! Layout module
//!
//! Handles:
//! - Real pixel / canvas unit conversion
//! - Snap-to-neighbor alignment of dragged outputs
//! - The layout controller owning the session's monitor list

pub mod scaling;
pub mod snap;

mod controller;

pub use controller::{LayoutController, LayoutError, LayoutEvent, LayoutResult, MonitorUpdate};
pub use snap::{CanvasRect, SnapEngine, SNAP_DISTANCE};
