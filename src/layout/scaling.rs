//! Real pixel / canvas unit conversion
//!
//! The editing canvas is a scaled-down view of the real pixel space. All
//! rectangle comparisons (snapping in particular) happen in canvas units;
//! real units exist only at the compositor boundary.

/// Ratio between real display pixels and canvas pixels. Large enough that
/// a multi-4K layout fits in a window.
pub const GRID_SCALE: i32 = 10;

/// Convert a real pixel value to canvas units.
///
/// Truncating on purpose: a round-trip through `to_canvas` and `to_real`
/// is lossy below `GRID_SCALE` resolution.
pub fn to_canvas(value: i32, scale: f64) -> i32 {
    (value.div_euclid(GRID_SCALE) as f64 * scale) as i32
}

/// Convert a canvas value back to real pixels.
pub fn to_real(value: i32, scale: f64) -> f64 {
    value as f64 * GRID_SCALE as f64 / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_canvas_truncates() {
        // Values within one grid cell collapse to the same canvas pixel.
        assert_eq!(to_canvas(1999, 1.0), to_canvas(1990, 1.0));
        assert_ne!(to_canvas(1999, 1.0), to_canvas(2000, 1.0));
    }

    #[test]
    fn test_to_canvas_floors_negative_values() {
        assert_eq!(to_canvas(-1, 1.0), -1);
        assert_eq!(to_canvas(-GRID_SCALE, 1.0), -1);
        assert_eq!(to_canvas(-GRID_SCALE - 1, 1.0), -2);
    }

    #[test]
    fn test_round_trip_is_lossy_not_identity() {
        let real = GRID_SCALE * 3 + GRID_SCALE / 2;
        let back = to_real(to_canvas(real, 1.0), 1.0) as i32;
        assert_eq!(back, GRID_SCALE * 3);
        assert_ne!(back, real);
    }

    #[test]
    fn test_scale_applies_to_canvas_size() {
        assert_eq!(to_canvas(1920, 2.0), to_canvas(1920, 1.0) * 2);
        assert_eq!(to_real(192, 2.0), 960.0);
    }
}
