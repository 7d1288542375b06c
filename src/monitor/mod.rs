//! Monitor module
//!
//! Holds:
//! - The `Monitor` aggregate and its mutation surface
//! - Mode and position value types
//! - The transform algebra

mod mode;
mod transform;

pub use mode::{Mode, Position};
pub use transform::{rotation_delta, InvalidTransform, Transform, ALL_TRANSFORMS};

use serde::Serialize;

use crate::layout::snap::CanvasRect;

/// One display output known to the compositor.
///
/// The identity fields are fixed for the life of a session; everything else
/// mutates through the setters below so derived state (active mode, canvas
/// geometry) stays consistent.
#[derive(Debug, Clone, Serialize)]
pub struct Monitor {
    /// Stable identity key, unique across the session
    pub name: String,
    pub make: String,
    pub model: Option<String>,
    pub serial: Option<String>,
    enabled: bool,
    scale: f64,
    position: Position,
    transform: Transform,
    modes: Vec<Mode>,
}

impl Monitor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        make: String,
        model: Option<String>,
        serial: Option<String>,
        enabled: bool,
        scale: f64,
        position: Position,
        transform: Transform,
        modes: Vec<Mode>,
    ) -> Self {
        debug_assert!(!modes.is_empty(), "a monitor always lists at least one mode");
        Self {
            name,
            make,
            model,
            serial,
            enabled,
            scale,
            position,
            transform,
            modes,
        }
    }

    /// Formatted make/model/serial, with "Unknown" for absent fields.
    pub fn description(&self) -> String {
        format!(
            "{} {} {}",
            self.make,
            self.model.as_deref().unwrap_or("Unknown"),
            self.serial.as_deref().unwrap_or("Unknown"),
        )
    }

    /// The mode marked current, or the first listed mode if none is.
    pub fn active_mode(&self) -> &Mode {
        self.modes
            .iter()
            .find(|m| m.current)
            .unwrap_or(&self.modes[0])
    }

    pub fn modes(&self) -> &[Mode] {
        &self.modes
    }

    pub fn has_mode(&self, mode: &Mode) -> bool {
        self.modes.contains(mode)
    }

    /// Make `mode` the active one.
    ///
    /// A mode equal to the current active mode is a no-op, as is a mode the
    /// monitor does not list. Otherwise exactly one `current` flag goes off
    /// and exactly one goes on. Returns whether anything changed.
    pub fn set_active_mode(&mut self, mode: &Mode) -> bool {
        if self.active_mode() == mode {
            return false;
        }
        let Some(next) = self.modes.iter().position(|m| m == mode) else {
            return false;
        };
        if let Some(prev) = self.modes.iter().position(|m| m.current) {
            self.modes[prev].current = false;
        }
        self.modes[next].current = true;
        true
    }

    pub fn width(&self) -> i32 {
        self.active_mode().width
    }

    pub fn height(&self) -> i32 {
        self.active_mode().height
    }

    pub fn refresh(&self) -> i32 {
        self.active_mode().refresh
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Flip the enabled state, returning the new value.
    pub fn toggle_enabled(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.enabled
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f64) {
        debug_assert!(scale > 0.0);
        self.scale = scale;
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    /// Toggle the mirror state, returning the new transform.
    pub fn toggle_mirror(&mut self) -> Transform {
        self.transform = self.transform.toggle_mirror();
        self.transform
    }

    /// Canvas footprint in canvas units: the output scale applies to the
    /// size only, and a 90/270 rotation swaps width and height.
    pub fn canvas_rect(&self) -> CanvasRect {
        let (x, y) = self.position.canvas_position();
        let (mut width, mut height) = self.active_mode().canvas_resolution(self.scale);
        if self.transform.is_rotated() {
            std::mem::swap(&mut width, &mut height);
        }
        CanvasRect::new(x, y, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_monitor(modes: Vec<Mode>) -> Monitor {
        Monitor::new(
            "DP-1".to_string(),
            "Dell Inc.".to_string(),
            Some("U2720Q".to_string()),
            None,
            true,
            1.0,
            Position::new(0, 0),
            Transform::Normal,
            modes,
        )
    }

    fn two_modes() -> Vec<Mode> {
        vec![
            Mode::new(3840, 2160, 60, true, true),
            Mode::new(1920, 1080, 60, false, false),
        ]
    }

    #[test]
    fn test_description_substitutes_unknown() {
        let monitor = make_monitor(two_modes());
        assert_eq!(monitor.description(), "Dell Inc. U2720Q Unknown");
    }

    #[test]
    fn test_active_mode_falls_back_to_first() {
        let monitor = make_monitor(vec![
            Mode::new(1920, 1080, 60, false, false),
            Mode::new(1280, 720, 60, false, false),
        ]);
        assert_eq!(monitor.active_mode().width, 1920);
    }

    #[test]
    fn test_set_active_mode_equal_is_noop() {
        let mut monitor = make_monitor(two_modes());
        // Equality ignores the flags, so this describes the active mode.
        let same = Mode::new(3840, 2160, 60, false, false);
        assert!(!monitor.set_active_mode(&same));
        assert!(monitor.modes()[0].current);
        assert!(!monitor.modes()[1].current);
    }

    #[test]
    fn test_set_active_mode_flips_exactly_one_flag_each_way() {
        let mut monitor = make_monitor(two_modes());
        let next = Mode::new(1920, 1080, 60, false, false);
        assert!(monitor.set_active_mode(&next));
        let current: Vec<bool> = monitor.modes().iter().map(|m| m.current).collect();
        assert_eq!(current, vec![false, true]);
        assert_eq!(monitor.width(), 1920);
    }

    #[test]
    fn test_set_active_mode_unlisted_is_noop() {
        let mut monitor = make_monitor(two_modes());
        let unlisted = Mode::new(640, 480, 60, false, false);
        assert!(!monitor.set_active_mode(&unlisted));
        assert!(monitor.modes()[0].current);
    }

    #[test]
    fn test_canvas_rect_swaps_axes_when_rotated() {
        let mut monitor = make_monitor(two_modes());
        let flat = monitor.canvas_rect();
        monitor.set_transform(Transform::Rotate90);
        let rotated = monitor.canvas_rect();
        assert_eq!((rotated.width, rotated.height), (flat.height, flat.width));
    }

    #[test]
    fn test_canvas_rect_scales_size_not_position() {
        let mut monitor = make_monitor(two_modes());
        monitor.set_position(Position::new(3840, 0));
        let unscaled = monitor.canvas_rect();
        monitor.set_scale(2.0);
        let scaled = monitor.canvas_rect();
        assert_eq!((scaled.x, scaled.y), (unscaled.x, unscaled.y));
        assert_eq!(scaled.width, unscaled.width * 2);
    }
}
