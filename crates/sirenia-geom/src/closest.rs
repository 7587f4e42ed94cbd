//! Closest-point queries against segments, polylines and shape outlines.
//!
//! All variants project onto a segment `a..b` with the scalar parameter
//! `t = dot(p - a, b - a) / |b - a|²`, clamped to `[0, 1]`. A degenerate segment (`a == b`)
//! yields `a`.

use crate::{IntPoint, Point, from_kurbo, point};
use kurbo::PathEl;

/// Closest point to `p` on the segment `a..b`.
pub fn closest_point_on_segment(p: Point, a: Point, b: Point) -> Point {
    let cx = b.x - a.x;
    let cy = b.y - a.y;
    let len_sq = cx * cx + cy * cy;
    if len_sq == 0.0 {
        return a;
    }
    let t = ((p.x - a.x) * cx + (p.y - a.y) * cy) / len_sq;
    if t <= 0.0 {
        a
    } else if t >= 1.0 {
        b
    } else {
        point(a.x + t * cx, a.y + t * cy)
    }
}

/// Integer variant of [`closest_point_on_segment`].
///
/// The parameter is computed in floating point with the same clamping; the projected point is
/// rounded half-up to the integer grid.
pub fn closest_point_on_segment_i32(p: IntPoint, a: IntPoint, b: IntPoint) -> IntPoint {
    let cx = i64::from(b.x) - i64::from(a.x);
    let cy = i64::from(b.y) - i64::from(a.y);
    let len_sq = cx * cx + cy * cy;
    if len_sq == 0 {
        return a;
    }
    let dot = (i64::from(p.x) - i64::from(a.x)) * cx + (i64::from(p.y) - i64::from(a.y)) * cy;
    let t = dot as f64 / len_sq as f64;
    if t <= 0.0 {
        a
    } else if t >= 1.0 {
        b
    } else {
        let x = (0.5 + f64::from(a.x) + t * cx as f64).floor() as i32;
        let y = (0.5 + f64::from(a.y) + t * cy as f64).floor() as i32;
        euclid::point2(x, y)
    }
}

fn distance_sq(a: Point, b: Point) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

fn distance_sq_i32(a: IntPoint, b: IntPoint) -> i64 {
    let dx = i64::from(a.x) - i64::from(b.x);
    let dy = i64::from(a.y) - i64::from(b.y);
    dx * dx + dy * dy
}

/// Closest point to `p` on the polyline through `points`.
///
/// A single point is returned as-is; an empty slice has no answer.
pub fn closest_point_on_path(p: Point, points: &[Point]) -> Option<Point> {
    let (&first, _) = points.split_first()?;
    let mut best = first;
    let mut best_d = distance_sq(p, best);
    for w in points.windows(2) {
        let candidate = closest_point_on_segment(p, w[0], w[1]);
        let d = distance_sq(p, candidate);
        if d < best_d {
            best_d = d;
            best = candidate;
        }
    }
    Some(best)
}

/// Integer variant of [`closest_point_on_path`].
pub fn closest_point_on_path_i32(p: IntPoint, points: &[IntPoint]) -> Option<IntPoint> {
    let (&first, _) = points.split_first()?;
    let mut best = first;
    let mut best_d = distance_sq_i32(p, best);
    for w in points.windows(2) {
        let candidate = closest_point_on_segment_i32(p, w[0], w[1]);
        let d = distance_sq_i32(p, candidate);
        if d < best_d {
            best_d = d;
            best = candidate;
        }
    }
    Some(best)
}

/// Closest point to `p` on the outline of `shape`.
///
/// The outline is flattened into line segments with the given `flatness` tolerance; closing
/// segments of closed subpaths are included. A shape without segments returns `p` unchanged.
pub fn closest_point_on_shape(p: Point, shape: &impl kurbo::Shape, flatness: f64) -> Point {
    let mut best = p;
    let mut best_d = f64::MAX;
    let mut start = p;
    let mut last = p;

    let consider = |a: Point, b: Point, best: &mut Point, best_d: &mut f64| {
        let candidate = closest_point_on_segment(p, a, b);
        let d = distance_sq(p, candidate);
        if d < *best_d {
            *best_d = d;
            *best = candidate;
        }
    };

    kurbo::flatten(shape.path_elements(flatness), flatness, |el| match el {
        PathEl::MoveTo(pt) => {
            start = from_kurbo(pt);
            last = start;
        }
        PathEl::LineTo(pt) => {
            let next = from_kurbo(pt);
            consider(last, next, &mut best, &mut best_d);
            last = next;
        }
        PathEl::ClosePath => {
            consider(last, start, &mut best, &mut best_d);
            last = start;
        }
        // `flatten` only emits move/line/close elements.
        PathEl::QuadTo(..) | PathEl::CurveTo(..) => {}
    });

    best
}
