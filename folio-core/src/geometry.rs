//! Pure transform math for drag, resize, and rotate gestures.
//!
//! Every function here is stateless: it takes the geometry captured when a
//! gesture started plus the pointer movement since then, and returns the new
//! geometry. Nothing is accumulated between pointer events, so rounding error
//! cannot build up over a long gesture.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Smallest width or height any resize may produce, in pixels.
pub const MIN_SIZE: f64 = 20.0;

/// Distance from the top edge of an object to its rotate handle.
pub const ROTATE_HANDLE_OFFSET: f64 = 32.0;

/// Pointer distance within which a handle counts as hit.
pub const HANDLE_HIT_RADIUS: f64 = 8.0;

/// Offset added to the pointer angle so the rotate handle, which sits above
/// the object, reads as 0 degrees at rest.
const ROTATE_HANDLE_REST_ANGLE: f64 = 90.0;

/// Axis-aligned box of an object before rotation is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Left edge (page-local pixels).
    pub x: f64,
    /// Top edge (page-local pixels).
    pub y: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Bounds {
    /// Create a new box.
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Centre of the box; rotation pivots around this point.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Width divided by height, falling back to 1.0 for degenerate boxes.
    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        let ratio = self.width / self.height;
        if ratio.is_finite() && ratio > 0.0 {
            ratio
        } else {
            1.0
        }
    }

    /// Check whether a point lies inside the box after rotating it by
    /// `rotation` degrees about its centre.
    #[must_use]
    pub fn contains_rotated(&self, point: Point, rotation: f64) -> bool {
        let local = rotate_point(point, self.center(), -rotation);
        local.x >= self.x
            && local.x <= self.x + self.width
            && local.y >= self.y
            && local.y <= self.y + self.height
    }
}

/// One of the eight resize handles around a selected object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handle {
    /// Top-left corner.
    Nw,
    /// Top-right corner.
    Ne,
    /// Bottom-left corner.
    Sw,
    /// Bottom-right corner.
    Se,
    /// Top edge midpoint.
    N,
    /// Bottom edge midpoint.
    S,
    /// Right edge midpoint.
    E,
    /// Left edge midpoint.
    W,
}

impl Handle {
    /// All resize handles, corners first.
    pub const ALL: [Handle; 8] = [
        Handle::Nw,
        Handle::Ne,
        Handle::Sw,
        Handle::Se,
        Handle::N,
        Handle::S,
        Handle::E,
        Handle::W,
    ];

    /// Corner handles keep the aspect ratio; edge handles stretch one axis.
    #[must_use]
    pub fn is_corner(self) -> bool {
        matches!(self, Handle::Nw | Handle::Ne | Handle::Sw | Handle::Se)
    }

    /// Position of the handle for a box rotated by `rotation` degrees.
    #[must_use]
    pub fn position(self, bounds: &Bounds, rotation: f64) -> Point {
        let (fx, fy) = match self {
            Handle::Nw => (0.0, 0.0),
            Handle::Ne => (1.0, 0.0),
            Handle::Sw => (0.0, 1.0),
            Handle::Se => (1.0, 1.0),
            Handle::N => (0.5, 0.0),
            Handle::S => (0.5, 1.0),
            Handle::E => (1.0, 0.5),
            Handle::W => (0.0, 0.5),
        };
        let unrotated = Point::new(
            bounds.x + bounds.width * fx,
            bounds.y + bounds.height * fy,
        );
        rotate_point(unrotated, bounds.center(), rotation)
    }
}

/// Position of the rotate handle for a box rotated by `rotation` degrees.
#[must_use]
pub fn rotate_handle_position(bounds: &Bounds, rotation: f64) -> Point {
    let unrotated = Point::new(
        bounds.x + bounds.width / 2.0,
        bounds.y - ROTATE_HANDLE_OFFSET,
    );
    rotate_point(unrotated, bounds.center(), rotation)
}

/// Rotate `point` about `center` by `degrees` (clockwise in screen space).
#[must_use]
pub fn rotate_point(point: Point, center: Point, degrees: f64) -> Point {
    if degrees == 0.0 {
        return point;
    }
    let (sin, cos) = degrees.to_radians().sin_cos();
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    Point::new(
        center.x + dx * cos - dy * sin,
        center.y + dx * sin + dy * cos,
    )
}

/// Move a box by the pointer delta. No snapping and no page clamping.
#[must_use]
pub fn translate(start: Bounds, delta: Vec2) -> Bounds {
    Bounds {
        x: start.x + delta.x,
        y: start.y + delta.y,
        ..start
    }
}

/// Resize a box by dragging `handle` by `delta`.
///
/// `aspect_ratio` is the width/height ratio captured at pointer-down; corner
/// handles hold it fixed for the whole gesture. The result is never smaller
/// than [`MIN_SIZE`] on either axis, and the corner or edge opposite the
/// handle stays where it was.
#[must_use]
pub fn resize(start: Bounds, handle: Handle, delta: Vec2, aspect_ratio: f64) -> Bounds {
    if handle.is_corner() {
        resize_corner(start, handle, delta, aspect_ratio)
    } else {
        resize_edge(start, handle, delta)
    }
}

fn resize_corner(start: Bounds, handle: Handle, delta: Vec2, aspect_ratio: f64) -> Bounds {
    let aspect = if aspect_ratio.is_finite() && aspect_ratio > 0.0 {
        aspect_ratio
    } else {
        start.aspect_ratio()
    };

    // The larger axis movement drives the resize; its sign depends on which
    // way the dragged corner grows the box.
    let magnitude = delta.x.abs().max(delta.y.abs());
    let grows = match handle {
        Handle::Nw => !(delta.x > 0.0 || delta.y > 0.0),
        Handle::Ne => delta.x > 0.0 || delta.y < 0.0,
        Handle::Sw => !(delta.x > 0.0 || delta.y < 0.0),
        _ => delta.x > 0.0 || delta.y > 0.0,
    };
    let signed = if grows { magnitude } else { -magnitude };

    // Height is derived from width, so the width floor must also keep the
    // height at or above the minimum.
    let min_width = MIN_SIZE.max(MIN_SIZE * aspect);
    let width = (start.width + signed).max(min_width);
    let height = width / aspect;

    let grown_w = width - start.width;
    let grown_h = height - start.height;
    let (x, y) = match handle {
        Handle::Nw => (start.x - grown_w, start.y - grown_h),
        Handle::Ne => (start.x, start.y - grown_h),
        Handle::Sw => (start.x - grown_w, start.y),
        _ => (start.x, start.y),
    };

    Bounds {
        x,
        y,
        width,
        height,
    }
}

fn resize_edge(start: Bounds, handle: Handle, delta: Vec2) -> Bounds {
    match handle {
        Handle::N => {
            let height = (start.height - delta.y).max(MIN_SIZE);
            Bounds {
                y: start.y + start.height - height,
                height,
                ..start
            }
        }
        Handle::S => Bounds {
            height: (start.height + delta.y).max(MIN_SIZE),
            ..start
        },
        Handle::E => Bounds {
            width: (start.width + delta.x).max(MIN_SIZE),
            ..start
        },
        Handle::W => {
            let width = (start.width - delta.x).max(MIN_SIZE);
            Bounds {
                x: start.x + start.width - width,
                width,
                ..start
            }
        }
        // Corners are routed to resize_corner.
        _ => start,
    }
}

/// Rotation in degrees that points the rotate handle at `pointer`.
///
/// The result is not snapped or normalized.
#[must_use]
pub fn rotation_for_pointer(center: Point, pointer: Point) -> f64 {
    let angle = (pointer.y - center.y).atan2(pointer.x - center.x);
    angle.to_degrees() + ROTATE_HANDLE_REST_ANGLE
}

/// Normalize an angle into `[0, 360)` for display.
#[must_use]
pub fn normalize_degrees(degrees: f64) -> f64 {
    let normalized = degrees.rem_euclid(360.0);
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}
