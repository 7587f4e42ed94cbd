//! Orthogonal offsets and cubic Bézier evaluation.

use crate::{Point, point};

/// A point standing off the end point `p2` of the line `p1 -> p2` at `distance`.
///
/// The direction is `(dy, dx) / |p1 - p2|` with `dx = p1.x - p2.x` and `dy = p1.y - p2.y`.
/// The rotation is fixed (not negated); decorators alternate the sign of `distance` to wiggle to
/// either side. A zero-length line yields `p2`.
pub fn orthogonal_offset(p1: Point, p2: Point, distance: f64) -> Point {
    let dx = p1.x - p2.x;
    let dy = p1.y - p2.y;
    let len = dx.hypot(dy);
    if len == 0.0 {
        return p2;
    }
    let f = distance / len;
    point(p2.x + dy * f, p2.y + dx * f)
}

/// Cubic Bézier curve from `from` to `to` with two control points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicCurve {
    pub from: Point,
    pub ctrl1: Point,
    pub ctrl2: Point,
    pub to: Point,
}

impl CubicCurve {
    pub fn new(from: Point, ctrl1: Point, ctrl2: Point, to: Point) -> Self {
        Self {
            from,
            ctrl1,
            ctrl2,
            to,
        }
    }
}

impl From<kurbo::CubicBez> for CubicCurve {
    fn from(c: kurbo::CubicBez) -> Self {
        Self::new(
            crate::from_kurbo(c.p0),
            crate::from_kurbo(c.p1),
            crate::from_kurbo(c.p2),
            crate::from_kurbo(c.p3),
        )
    }
}

/// Point on `curve` at parameter `t` in `[0, 1]` (Bernstein form).
pub fn point_on_cubic_bezier(curve: &CubicCurve, t: f64) -> Point {
    let n = 1.0 - t;
    let nnn = n * n * n;
    let tnn3 = 3.0 * t * n * n;
    let ttn3 = 3.0 * t * t * n;
    let ttt = t * t * t;
    point(
        nnn * curve.from.x + tnn3 * curve.ctrl1.x + ttn3 * curve.ctrl2.x + ttt * curve.to.x,
        nnn * curve.from.y + tnn3 * curve.ctrl1.y + ttn3 * curve.ctrl2.y + ttt * curve.to.y,
    )
}
