//! Orientation of point triples.
//!
//! The three predicates share one comparison, `(b.y - a.y)(r.x - a.x)` against
//! `(b.x - a.x)(r.y - a.y)`. The clockwise/counter-clockwise naming follows that sign convention,
//! which in y-down screen space does not match the mathematical one; callers should rely on the
//! convention rather than the names.

use euclid::Point2D;
use std::ops::{Mul, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Clockwise,
    CounterClockwise,
    Collinear,
}

/// Coordinate types orientation can be computed for.
///
/// The cross-product terms are evaluated in [`Self::Wide`] so that integer coordinates spanning the
/// full `i32` range cannot overflow.
pub trait OrientationCoord: Copy {
    type Wide: Copy + PartialOrd + Sub<Output = Self::Wide> + Mul<Output = Self::Wide>;

    fn widen(self) -> Self::Wide;
}

impl OrientationCoord for i32 {
    type Wide = i128;

    fn widen(self) -> i128 {
        i128::from(self)
    }
}

impl OrientationCoord for f32 {
    type Wide = f64;

    fn widen(self) -> f64 {
        f64::from(self)
    }
}

impl OrientationCoord for f64 {
    type Wide = f64;

    fn widen(self) -> f64 {
        self
    }
}

fn sides<T: OrientationCoord, U>(
    a: Point2D<T, U>,
    b: Point2D<T, U>,
    r: Point2D<T, U>,
) -> (T::Wide, T::Wide) {
    let (ax, ay) = (a.x.widen(), a.y.widen());
    let (bx, by) = (b.x.widen(), b.y.widen());
    let (rx, ry) = (r.x.widen(), r.y.widen());
    ((by - ay) * (rx - ax), (bx - ax) * (ry - ay))
}

impl Orientation {
    pub fn of<T: OrientationCoord, U>(
        a: Point2D<T, U>,
        b: Point2D<T, U>,
        r: Point2D<T, U>,
    ) -> Self {
        let (lhs, rhs) = sides(a, b, r);
        if lhs > rhs {
            Orientation::Clockwise
        } else if lhs < rhs {
            Orientation::CounterClockwise
        } else {
            Orientation::Collinear
        }
    }
}

/// Shorthand for [`Orientation::of`].
pub fn orientation<T: OrientationCoord, U>(
    a: Point2D<T, U>,
    b: Point2D<T, U>,
    r: Point2D<T, U>,
) -> Orientation {
    Orientation::of(a, b, r)
}

pub fn is_ccw<T: OrientationCoord, U>(
    a: Point2D<T, U>,
    b: Point2D<T, U>,
    r: Point2D<T, U>,
) -> bool {
    let (lhs, rhs) = sides(a, b, r);
    lhs < rhs
}

pub fn is_cw<T: OrientationCoord, U>(a: Point2D<T, U>, b: Point2D<T, U>, r: Point2D<T, U>) -> bool {
    let (lhs, rhs) = sides(a, b, r);
    lhs > rhs
}

pub fn is_collinear<T: OrientationCoord, U>(
    a: Point2D<T, U>,
    b: Point2D<T, U>,
    r: Point2D<T, U>,
) -> bool {
    let (lhs, rhs) = sides(a, b, r);
    lhs == rhs
}
