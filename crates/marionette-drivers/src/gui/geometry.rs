// Path: crates/marionette-drivers/src/gui/geometry.rs

//! Coordinate mapping between the model's normalized box space and a
//! backend's absolute pixel space.
//!
//! Everything here is pure: identical inputs always produce identical output,
//! which the record/replay layer upstream depends on.

use marionette_types::app::AbsolutePoint;

/// A box string decoded into normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormalizedBox {
    /// `[x, y]`
    Point { x: f64, y: f64 },
    /// `[x1, y1, x2, y2]`
    Rect { x1: f64, y1: f64, x2: f64, y2: f64 },
}

impl NormalizedBox {
    /// Decodes `"[x1,y1,x2,y2]"` or `"[x,y]"`. Round brackets are accepted too.
    /// Returns `None` for empty, non-numeric, or wrongly sized input.
    pub fn parse(box_str: &str) -> Option<Self> {
        let inner = box_str
            .trim()
            .trim_start_matches(['[', '('])
            .trim_end_matches([']', ')'])
            .trim();
        if inner.is_empty() {
            return None;
        }

        let mut values = Vec::with_capacity(4);
        for part in inner.split(',') {
            let v: f64 = part.trim().parse().ok()?;
            if !v.is_finite() {
                return None;
            }
            values.push(v);
        }

        match values.as_slice() {
            [x, y] => Some(Self::Point { x: *x, y: *y }),
            [x1, y1, x2, y2] => Some(Self::Rect {
                x1: *x1,
                y1: *y1,
                x2: *x2,
                y2: *y2,
            }),
            _ => None,
        }
    }

    /// The normalized centre of the box (the point itself for `Point`).
    pub fn center(&self) -> (f64, f64) {
        match *self {
            Self::Point { x, y } => (x, y),
            Self::Rect { x1, y1, x2, y2 } => ((x1 + x2) / 2.0, (y1 + y2) / 2.0),
        }
    }
}

/// Resolves a box string into an absolute pixel point on a
/// `screen_width x screen_height` screen.
///
/// `None` means "no coordinate for this action": callers skip or log, they
/// never treat it as an error.
pub fn resolve_point(
    box_str: Option<&str>,
    screen_width: u32,
    screen_height: u32,
) -> Option<AbsolutePoint> {
    let parsed = NormalizedBox::parse(box_str?)?;
    let (cx, cy) = parsed.center();
    Some(AbsolutePoint::new(
        (cx * screen_width as f64).round() as i32,
        (cy * screen_height as f64).round() as i32,
    ))
}

/// Converts a physical pixel point into logical points for input APIs that
/// address the screen in points.
pub fn physical_to_logical(point: AbsolutePoint, scale_factor: f64) -> AbsolutePoint {
    let scale = if scale_factor.is_finite() && scale_factor > 0.0 {
        scale_factor
    } else {
        1.0
    };
    AbsolutePoint::new(
        (point.x as f64 / scale).round() as i32,
        (point.y as f64 / scale).round() as i32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rectangle_resolves_to_centroid() {
        let p = resolve_point(Some("[0.1,0.2,0.3,0.4]"), 1000, 800).unwrap();
        assert_eq!(p, AbsolutePoint::new(200, 240));
    }

    #[test]
    fn bare_point_is_scaled() {
        let p = resolve_point(Some("(0.5, 0.25)"), 1920, 1080).unwrap();
        assert_eq!(p, AbsolutePoint::new(960, 270));
    }

    #[test]
    fn empty_or_absent_box_is_none() {
        assert_eq!(resolve_point(Some(""), 1000, 800), None);
        assert_eq!(resolve_point(Some("[]"), 1000, 800), None);
        assert_eq!(resolve_point(None, 1000, 800), None);
    }

    #[test]
    fn malformed_box_is_none() {
        assert_eq!(resolve_point(Some("[0.1,0.2,0.3]"), 1000, 800), None);
        assert_eq!(resolve_point(Some("[a,b]"), 1000, 800), None);
        assert_eq!(resolve_point(Some("[NaN,0.1]"), 1000, 800), None);
    }

    #[test]
    fn logical_conversion_divides_by_scale() {
        let p = physical_to_logical(AbsolutePoint::new(2880, 1800), 2.0);
        assert_eq!(p, AbsolutePoint::new(1440, 900));
        let p = physical_to_logical(AbsolutePoint::new(100, 100), 0.0);
        assert_eq!(p, AbsolutePoint::new(100, 100));
    }

    proptest! {
        #[test]
        fn centroid_formula_holds(
            x1 in 0.0f64..1.0, y1 in 0.0f64..1.0,
            x2 in 0.0f64..1.0, y2 in 0.0f64..1.0,
            w in 1u32..7680, h in 1u32..4320,
        ) {
            let s = format!("[{x1},{y1},{x2},{y2}]");
            let expected = AbsolutePoint::new(
                ((x1 + x2) / 2.0 * w as f64).round() as i32,
                ((y1 + y2) / 2.0 * h as f64).round() as i32,
            );
            let first = resolve_point(Some(&s), w, h);
            prop_assert_eq!(first, Some(expected));
            prop_assert_eq!(resolve_point(Some(&s), w, h), first);
        }
    }
}
