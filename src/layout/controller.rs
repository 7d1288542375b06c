//! Layout controller
//!
//! Owns the canonical monitor list for the session and is the only
//! mutation path into it. Every edit returns the geometry the presentation
//! layer needs to repaint and is also published on the controller's event
//! channel, so views re-read instead of caching derived state.

use thiserror::Error;
use tokio::sync::mpsc;

use crate::backend::{BackendResult, OutputBackend};
use crate::layout::scaling;
use crate::layout::snap::{CanvasRect, SnapEngine};
use crate::monitor::{rotation_delta, Mode, Monitor, Position, Transform};

/// Layout operation errors. All of these are contract violations by the
/// caller, not recoverable conditions.
#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("no monitor named {0}")]
    UnknownMonitor(String),

    #[error("monitor {monitor} does not offer mode {mode}")]
    UnknownMode { monitor: String, mode: String },

    #[error("scale must be positive, got {0}")]
    InvalidScale(f64),

    #[error("a drag of {0} is already in progress")]
    AlreadyDragging(String),

    #[error("no drag in progress")]
    NotDragging,
}

pub type LayoutResult<T> = Result<T, LayoutError>;

/// What the presentation layer needs to repaint one monitor tile.
#[derive(Debug, Clone)]
pub struct MonitorUpdate {
    pub name: String,
    /// New canvas-space footprint
    pub canvas_rect: CanvasRect,
    /// Incremental rotation in degrees to apply to cached preview content
    pub rotation_delta: i32,
    /// Whether cached preview content needs a horizontal flip
    pub mirror_toggled: bool,
}

/// Events published on the controller channel.
#[derive(Debug, Clone)]
pub enum LayoutEvent {
    /// A monitor changed; views should re-read it
    MonitorChanged(MonitorUpdate),
    /// The current layout was handed to the apply backend
    ConfigurationSaved { outputs: usize },
}

/// State of the canvas drag gesture. Scoped to the gesture: `begin_drag`
/// enters `Dragging`, `end_drag` returns to `Idle`.
#[derive(Debug, Clone)]
enum DragState {
    Idle,
    Dragging {
        name: String,
        /// Canvas offset of the grab point from the rect's top-left corner
        grab_offset: (i32, i32),
    },
}

/// Owns the monitor list and routes all edits.
pub struct LayoutController {
    monitors: Vec<Monitor>,
    snap: SnapEngine,
    drag: DragState,
    event_tx: mpsc::UnboundedSender<LayoutEvent>,
    event_rx: Option<mpsc::UnboundedReceiver<LayoutEvent>>,
}

impl LayoutController {
    /// Create a controller over a freshly enumerated monitor list.
    pub fn new(monitors: Vec<Monitor>, snap: SnapEngine) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            monitors,
            snap,
            drag: DragState::Idle,
            event_tx,
            event_rx: Some(event_rx),
        }
    }

    /// Take the event receiver (can only be called once)
    pub fn take_event_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<LayoutEvent>> {
        self.event_rx.take()
    }

    pub fn monitors(&self) -> &[Monitor] {
        &self.monitors
    }

    pub fn monitor(&self, name: &str) -> LayoutResult<&Monitor> {
        self.monitors
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| LayoutError::UnknownMonitor(name.to_string()))
    }

    fn monitor_mut(&mut self, name: &str) -> LayoutResult<&mut Monitor> {
        self.monitors
            .iter_mut()
            .find(|m| m.name == name)
            .ok_or_else(|| LayoutError::UnknownMonitor(name.to_string()))
    }

    fn publish(&self, update: MonitorUpdate) -> MonitorUpdate {
        // Nobody listening is fine; the update is also the return value.
        let _ = self.event_tx.send(LayoutEvent::MonitorChanged(update.clone()));
        update
    }

    fn update_for(monitor: &Monitor, rotation_delta: i32, mirror_toggled: bool) -> MonitorUpdate {
        MonitorUpdate {
            name: monitor.name.clone(),
            canvas_rect: monitor.canvas_rect(),
            rotation_delta,
            mirror_toggled,
        }
    }

    /// Switch the active mode. The mode must be one the monitor lists.
    pub fn set_resolution(&mut self, name: &str, mode: &Mode) -> LayoutResult<MonitorUpdate> {
        let monitor = self.monitor_mut(name)?;
        if !monitor.has_mode(mode) {
            return Err(LayoutError::UnknownMode {
                monitor: name.to_string(),
                mode: mode.to_string(),
            });
        }
        monitor.set_active_mode(mode);
        tracing::debug!("{}: mode set to {}", name, mode);
        let update = Self::update_for(monitor, 0, false);
        Ok(self.publish(update))
    }

    pub fn set_scale(&mut self, name: &str, scale: f64) -> LayoutResult<MonitorUpdate> {
        if scale <= 0.0 {
            return Err(LayoutError::InvalidScale(scale));
        }
        let monitor = self.monitor_mut(name)?;
        monitor.set_scale(scale);
        tracing::debug!("{}: scale set to {}", name, scale);
        let update = Self::update_for(monitor, 0, false);
        Ok(self.publish(update))
    }

    /// Place the monitor at a real-pixel position.
    pub fn set_position(&mut self, name: &str, x: i32, y: i32) -> LayoutResult<MonitorUpdate> {
        let monitor = self.monitor_mut(name)?;
        monitor.set_position(Position::new(x, y));
        tracing::debug!("{}: moved to {},{}", name, x, y);
        let update = Self::update_for(monitor, 0, false);
        Ok(self.publish(update))
    }

    /// Change the transform. The update carries the incremental rotation
    /// between the previous and new state so cached preview content can be
    /// rotated in place rather than recomputed.
    pub fn set_transform(&mut self, name: &str, transform: Transform) -> LayoutResult<MonitorUpdate> {
        let monitor = self.monitor_mut(name)?;
        let prev = monitor.transform();
        if prev == transform {
            let update = Self::update_for(monitor, 0, false);
            return Ok(self.publish(update));
        }
        monitor.set_transform(transform);
        tracing::debug!("{}: transform {} -> {}", name, prev, transform);
        let update = Self::update_for(
            monitor,
            rotation_delta(prev, transform),
            prev.is_mirrored() != transform.is_mirrored(),
        );
        Ok(self.publish(update))
    }

    /// Toggle the mirror state. Mirroring never produces a rotation delta;
    /// the preview only needs a horizontal flip.
    pub fn toggle_mirror(&mut self, name: &str) -> LayoutResult<MonitorUpdate> {
        let monitor = self.monitor_mut(name)?;
        let transform = monitor.toggle_mirror();
        tracing::debug!("{}: mirror toggled, now {}", name, transform);
        let update = Self::update_for(monitor, 0, true);
        Ok(self.publish(update))
    }

    pub fn toggle_enabled(&mut self, name: &str) -> LayoutResult<MonitorUpdate> {
        let monitor = self.monitor_mut(name)?;
        let enabled = monitor.toggle_enabled();
        tracing::debug!("{}: {}", name, if enabled { "enabled" } else { "disabled" });
        let update = Self::update_for(monitor, 0, false);
        Ok(self.publish(update))
    }

    /// Start a drag gesture on a monitor tile. `pointer` is the canvas
    /// position of the grab.
    pub fn begin_drag(&mut self, name: &str, pointer: (i32, i32)) -> LayoutResult<()> {
        if let DragState::Dragging { name, .. } = &self.drag {
            return Err(LayoutError::AlreadyDragging(name.clone()));
        }
        let rect = self.monitor(name)?.canvas_rect();
        self.drag = DragState::Dragging {
            name: name.to_string(),
            grab_offset: (pointer.0 - rect.x, pointer.1 - rect.y),
        };
        Ok(())
    }

    /// Move the dragged tile under the pointer, snapping against every
    /// other monitor's canvas rect. The snapped position is written back
    /// to the monitor in real pixels.
    pub fn drag_to(&mut self, pointer: (i32, i32)) -> LayoutResult<MonitorUpdate> {
        let DragState::Dragging { name, grab_offset } = &self.drag else {
            return Err(LayoutError::NotDragging);
        };
        let name = name.clone();
        let grab_offset = *grab_offset;

        let current = self.monitor(&name)?.canvas_rect();
        let candidate = CanvasRect::new(
            pointer.0 - grab_offset.0,
            pointer.1 - grab_offset.1,
            current.width,
            current.height,
        );
        let neighbors: Vec<CanvasRect> = self
            .monitors
            .iter()
            .filter(|m| m.name != name)
            .map(|m| m.canvas_rect())
            .collect();
        let snapped = self.snap.snap(candidate, &neighbors);

        let x = scaling::to_real(snapped.x, 1.0) as i32;
        let y = scaling::to_real(snapped.y, 1.0) as i32;
        self.set_position(&name, x, y)
    }

    /// Finish the drag gesture, reporting the final geometry.
    pub fn end_drag(&mut self) -> LayoutResult<MonitorUpdate> {
        let DragState::Dragging { name, .. } = &self.drag else {
            return Err(LayoutError::NotDragging);
        };
        let name = name.clone();
        self.drag = DragState::Idle;
        let monitor = self.monitor(&name)?;
        Ok(Self::update_for(monitor, 0, false))
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    /// Hand the full monitor list to the apply backend, in list order.
    /// Failures are surfaced, never retried.
    pub async fn save(&self, backend: &dyn OutputBackend) -> BackendResult<()> {
        backend.apply(&self.monitors).await?;
        let _ = self.event_tx.send(LayoutEvent::ConfigurationSaved {
            outputs: self.monitors.len(),
        });
        tracing::info!("configuration applied to {} outputs", self.monitors.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::layout::scaling::GRID_SCALE;

    fn mode(width: i32, height: i32, refresh: i32, current: bool) -> Mode {
        Mode::new(width, height, refresh, false, current)
    }

    fn monitor(name: &str, x: i32, y: i32) -> Monitor {
        Monitor::new(
            name.to_string(),
            "Acme".to_string(),
            Some("Panel".to_string()),
            Some("0001".to_string()),
            true,
            1.0,
            Position::new(x, y),
            Transform::Normal,
            vec![mode(1000, 1000, 60, true), mode(500, 500, 60, false)],
        )
    }

    fn controller() -> LayoutController {
        LayoutController::new(
            vec![monitor("DP-1", 0, 0), monitor("DP-2", 1000, 0)],
            SnapEngine::new(5),
        )
    }

    #[test]
    fn test_unknown_monitor_is_an_error() {
        let mut ctl = controller();
        assert!(matches!(
            ctl.set_scale("HDMI-9", 2.0),
            Err(LayoutError::UnknownMonitor(_))
        ));
    }

    #[test]
    fn test_set_resolution_rejects_unlisted_mode() {
        let mut ctl = controller();
        let err = ctl
            .set_resolution("DP-1", &mode(640, 480, 60, false))
            .unwrap_err();
        assert!(matches!(err, LayoutError::UnknownMode { .. }));
    }

    #[test]
    fn test_set_resolution_updates_canvas_size() {
        let mut ctl = controller();
        let update = ctl.set_resolution("DP-1", &mode(500, 500, 60, false)).unwrap();
        assert_eq!(update.canvas_rect.width, 500 / GRID_SCALE);
        assert_eq!(update.rotation_delta, 0);
        assert_eq!(ctl.monitor("DP-1").unwrap().width(), 500);
    }

    #[test]
    fn test_set_scale_rejects_non_positive() {
        let mut ctl = controller();
        assert!(matches!(
            ctl.set_scale("DP-1", 0.0),
            Err(LayoutError::InvalidScale(_))
        ));
        let update = ctl.set_scale("DP-1", 2.0).unwrap();
        assert_eq!(update.canvas_rect.width, 1000 / GRID_SCALE * 2);
    }

    #[test]
    fn test_set_transform_reports_incremental_rotation() {
        let mut ctl = controller();
        let update = ctl.set_transform("DP-1", Transform::Rotate90).unwrap();
        assert_eq!(update.rotation_delta, 90);
        // 90 degrees swaps the canvas footprint.
        assert_eq!(update.canvas_rect.width, 1000 / GRID_SCALE);

        // Deltas compose: mirrored rotations count backwards.
        let update = ctl.set_transform("DP-1", Transform::Flipped90).unwrap();
        assert_eq!(update.rotation_delta, -180);
        assert!(update.mirror_toggled);
    }

    #[test]
    fn test_set_transform_same_state_is_quiet() {
        let mut ctl = controller();
        let update = ctl.set_transform("DP-1", Transform::Normal).unwrap();
        assert_eq!(update.rotation_delta, 0);
        assert!(!update.mirror_toggled);
    }

    #[test]
    fn test_toggle_mirror_flips_without_rotation() {
        let mut ctl = controller();
        ctl.set_transform("DP-1", Transform::Rotate90).unwrap();
        let update = ctl.toggle_mirror("DP-1").unwrap();
        assert_eq!(update.rotation_delta, 0);
        assert!(update.mirror_toggled);
        assert_eq!(ctl.monitor("DP-1").unwrap().transform(), Transform::Flipped90);
    }

    #[test]
    fn test_events_mirror_return_values() {
        let mut ctl = controller();
        let mut rx = ctl.take_event_receiver().unwrap();
        let update = ctl.set_position("DP-2", 1200, 40).unwrap();
        match rx.try_recv().unwrap() {
            LayoutEvent::MonitorChanged(event) => {
                assert_eq!(event.name, update.name);
                assert_eq!(event.canvas_rect, update.canvas_rect);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_drag_snaps_against_neighbor() {
        let mut ctl = controller();
        // Grab DP-2's tile at its corner and drop it 3 canvas units short
        // of DP-1's right edge; snapping closes the gap.
        ctl.begin_drag("DP-2", (100, 0)).unwrap();
        let update = ctl.drag_to((103, 20)).unwrap();
        assert_eq!(update.canvas_rect.position(), (100, 20));
        let position = ctl.monitor("DP-2").unwrap().position();
        assert_eq!((position.x, position.y), (1000, 200));
        let end = ctl.end_drag().unwrap();
        assert_eq!(end.canvas_rect.position(), (100, 20));
        assert!(!ctl.is_dragging());
    }

    #[test]
    fn test_drag_state_machine_preconditions() {
        let mut ctl = controller();
        assert!(matches!(ctl.drag_to((0, 0)), Err(LayoutError::NotDragging)));
        assert!(matches!(ctl.end_drag(), Err(LayoutError::NotDragging)));
        ctl.begin_drag("DP-1", (0, 0)).unwrap();
        assert!(matches!(
            ctl.begin_drag("DP-2", (0, 0)),
            Err(LayoutError::AlreadyDragging(_))
        ));
    }

    /// Records the order monitors are handed to apply.
    struct RecordingBackend {
        applied: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl OutputBackend for RecordingBackend {
        async fn enumerate(&self) -> BackendResult<Vec<Monitor>> {
            Ok(Vec::new())
        }

        async fn apply(&self, monitors: &[Monitor]) -> BackendResult<()> {
            let mut applied = self.applied.lock().unwrap();
            applied.extend(monitors.iter().map(|m| m.name.clone()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_save_hands_monitors_over_in_list_order() {
        let mut ctl = controller();
        let mut rx = ctl.take_event_receiver().unwrap();
        let backend = RecordingBackend {
            applied: Mutex::new(Vec::new()),
        };
        ctl.save(&backend).await.unwrap();
        assert_eq!(*backend.applied.lock().unwrap(), vec!["DP-1", "DP-2"]);
        assert!(matches!(
            rx.try_recv().unwrap(),
            LayoutEvent::ConfigurationSaved { outputs: 2 }
        ));
    }
}
