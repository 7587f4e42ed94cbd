//! Convex hull by Andrew's monotone chain (the Graham/Andrew variant).
//!
//! Points are sorted by x, then y. The lower chain is built left-to-right and the upper chain
//! right-to-left, popping while the last three points do not make a strict left turn
//! (`cross <= 0`), so collinear runs collapse to their extreme points. The last point of each chain
//! duplicates the first point of the other and is dropped.

use euclid::Point2D;
use std::cmp::Ordering;

/// Coordinate types the hull can be computed for.
pub trait HullCoord: Copy + PartialOrd {
    /// `true` if `o -> a -> b` is not a strict left turn.
    fn non_left_turn<U>(o: Point2D<Self, U>, a: Point2D<Self, U>, b: Point2D<Self, U>) -> bool;
}

impl HullCoord for i32 {
    fn non_left_turn<U>(o: Point2D<i32, U>, a: Point2D<i32, U>, b: Point2D<i32, U>) -> bool {
        let cross = (i128::from(a.x) - i128::from(o.x)) * (i128::from(b.y) - i128::from(o.y))
            - (i128::from(a.y) - i128::from(o.y)) * (i128::from(b.x) - i128::from(o.x));
        cross <= 0
    }
}

impl HullCoord for f32 {
    fn non_left_turn<U>(o: Point2D<f32, U>, a: Point2D<f32, U>, b: Point2D<f32, U>) -> bool {
        let cross = (f64::from(a.x) - f64::from(o.x)) * (f64::from(b.y) - f64::from(o.y))
            - (f64::from(a.y) - f64::from(o.y)) * (f64::from(b.x) - f64::from(o.x));
        cross <= 0.0
    }
}

impl HullCoord for f64 {
    fn non_left_turn<U>(o: Point2D<f64, U>, a: Point2D<f64, U>, b: Point2D<f64, U>) -> bool {
        let cross = (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x);
        cross <= 0.0
    }
}

fn by_x_then_y<T: PartialOrd, U>(p: &Point2D<T, U>, q: &Point2D<T, U>) -> Ordering {
    p.x.partial_cmp(&q.x)
        .unwrap_or(Ordering::Equal)
        .then_with(|| p.y.partial_cmp(&q.y).unwrap_or(Ordering::Equal))
}

/// Convex hull of `points`.
///
/// Zero or one input point is returned unchanged.
pub fn convex_hull<T: HullCoord, U>(points: &[Point2D<T, U>]) -> Vec<Point2D<T, U>> {
    if points.len() <= 1 {
        return points.to_vec();
    }

    let mut sorted = points.to_vec();
    sorted.sort_by(by_x_then_y);

    let mut hull: Vec<Point2D<T, U>> = Vec::with_capacity(2 * sorted.len());

    // lower hull
    for &p in &sorted {
        while hull.len() >= 2 && T::non_left_turn(hull[hull.len() - 2], hull[hull.len() - 1], p) {
            hull.pop();
        }
        hull.push(p);
    }

    // upper hull
    let lower_len = hull.len() + 1;
    for &p in sorted.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && T::non_left_turn(hull[hull.len() - 2], hull[hull.len() - 1], p)
        {
            hull.pop();
        }
        hull.push(p);
    }

    if hull.len() > 1 {
        hull.pop();
    }
    hull
}
