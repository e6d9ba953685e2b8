// Path: crates/marionette-types/src/app/geometry.rs

use serde::{Deserialize, Serialize};

/// Maximum allowed drift, in pixels, between a physical dimension and
/// `logical * scale_factor`.
pub const GEOMETRY_TOLERANCE_PX: f64 = 1.0;

/// A width/height pair in pixels or points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    /// Horizontal extent.
    pub width: u32,
    /// Vertical extent.
    pub height: u32,
}

impl Size {
    /// Creates a new size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Snapshot of a display's geometry, captured fresh with every screenshot.
///
/// Logical * scale_factor = physical (within rounding). The value is immutable:
/// a new screenshot produces a new geometry rather than updating the old one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenGeometry {
    /// Actual pixel size of the display / capture buffer.
    pub physical_size: Size,
    /// OS-reported size in points, before the scale factor.
    pub logical_size: Size,
    /// Device pixels per logical point.
    pub scale_factor: f64,
    /// Identifier of the display the frame came from.
    pub display_id: String,
}

fn sanitize_scale(scale_factor: f64) -> f64 {
    if scale_factor.is_finite() && scale_factor > 0.0 {
        scale_factor
    } else {
        1.0
    }
}

impl ScreenGeometry {
    /// Builds a geometry from a physical size, deriving the logical size.
    pub fn from_physical(physical: Size, scale_factor: f64, display_id: impl Into<String>) -> Self {
        let scale = sanitize_scale(scale_factor);
        let logical = Size::new(
            (physical.width as f64 / scale).round() as u32,
            (physical.height as f64 / scale).round() as u32,
        );
        Self {
            physical_size: physical,
            logical_size: logical,
            scale_factor: scale,
            display_id: display_id.into(),
        }
    }

    /// Builds a geometry from a logical size, deriving the physical size.
    pub fn from_logical(logical: Size, scale_factor: f64, display_id: impl Into<String>) -> Self {
        let scale = sanitize_scale(scale_factor);
        let physical = Size::new(
            (logical.width as f64 * scale).round() as u32,
            (logical.height as f64 * scale).round() as u32,
        );
        Self {
            physical_size: physical,
            logical_size: logical,
            scale_factor: scale,
            display_id: display_id.into(),
        }
    }

    /// A remote screen where points and pixels coincide.
    pub fn unscaled(size: Size, display_id: impl Into<String>) -> Self {
        Self {
            physical_size: size,
            logical_size: size,
            scale_factor: 1.0,
            display_id: display_id.into(),
        }
    }

    /// Checks `|physical - logical * scale| <= 1px` on both axes.
    pub fn is_consistent(&self) -> bool {
        let dx = self.physical_size.width as f64 - self.logical_size.width as f64 * self.scale_factor;
        let dy =
            self.physical_size.height as f64 - self.logical_size.height as f64 * self.scale_factor;
        dx.abs() <= GEOMETRY_TOLERANCE_PX && dy.abs() <= GEOMETRY_TOLERANCE_PX
    }

    /// The execution context derived from this geometry.
    pub fn context(&self) -> ExecuteContext {
        ExecuteContext {
            screen_width: self.physical_size.width,
            screen_height: self.physical_size.height,
            scale_factor: self.scale_factor,
        }
    }
}

/// A point in backend-native physical pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AbsolutePoint {
    /// Horizontal pixel offset from the left edge.
    pub x: i32,
    /// Vertical pixel offset from the top edge.
    pub y: i32,
}

impl AbsolutePoint {
    /// Creates a new point.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Per-call screen information handed to `Operator::execute`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExecuteContext {
    /// Physical width of the screen the action targets.
    pub screen_width: u32,
    /// Physical height of the screen the action targets.
    pub screen_height: u32,
    /// Scale factor of that screen.
    pub scale_factor: f64,
}

impl ExecuteContext {
    /// Creates a new context.
    pub fn new(screen_width: u32, screen_height: u32, scale_factor: f64) -> Self {
        Self {
            screen_width,
            screen_height,
            scale_factor: sanitize_scale(scale_factor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn retina_display_round_trips() {
        let g = ScreenGeometry::from_logical(Size::new(1440, 900), 2.0, "1");
        assert_eq!(g.physical_size, Size::new(2880, 1800));
        assert!(g.is_consistent());
        assert_eq!(g.context().screen_width, 2880);
    }

    #[test]
    fn invalid_scale_falls_back_to_one() {
        let g = ScreenGeometry::from_physical(Size::new(1920, 1080), 0.0, "0");
        assert_eq!(g.scale_factor, 1.0);
        assert_eq!(g.logical_size, g.physical_size);
        assert_eq!(ExecuteContext::new(10, 10, f64::NAN).scale_factor, 1.0);
    }

    proptest! {
        #[test]
        fn physical_matches_logical_times_scale(
            w in 1u32..8000,
            h in 1u32..8000,
            scale in prop::sample::select(vec![1.0f64, 1.25, 1.5, 1.75, 2.0]),
        ) {
            let from_phys = ScreenGeometry::from_physical(Size::new(w, h), scale, "p");
            prop_assert!(from_phys.is_consistent());
            let from_log = ScreenGeometry::from_logical(Size::new(w, h), scale, "l");
            prop_assert!(from_log.is_consistent());
        }
    }
}
