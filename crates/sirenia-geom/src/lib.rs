#![forbid(unsafe_code)]

//! Geometry primitives used by the sirenia layout engine.
//!
//! Points and rectangles are `euclid` types in an unknown unit. Arbitrary outlines (decorator
//! paths, edge curves) are `kurbo` shapes; [`to_kurbo`] and [`from_kurbo`] convert between the two.

pub mod closest;
pub mod curve;
pub mod hull;
pub mod orientation;

pub use closest::{
    closest_point_on_path, closest_point_on_path_i32, closest_point_on_segment,
    closest_point_on_segment_i32, closest_point_on_shape,
};
pub use curve::{CubicCurve, orthogonal_offset, point_on_cubic_bezier};
pub use hull::{HullCoord, convex_hull};
pub use orientation::{Orientation, OrientationCoord, is_ccw, is_collinear, is_cw, orientation};

pub type Unit = euclid::UnknownUnit;

pub type Point = euclid::Point2D<f64, Unit>;
pub type IntPoint = euclid::Point2D<i32, Unit>;
pub type Vector = euclid::Vector2D<f64, Unit>;
pub type Size = euclid::Size2D<f64, Unit>;
pub type Rect = euclid::Rect<f64, Unit>;
pub type IntRect = euclid::Rect<i32, Unit>;

pub fn point(x: f64, y: f64) -> Point {
    euclid::point2(x, y)
}

pub fn int_point(x: i32, y: i32) -> IntPoint {
    euclid::point2(x, y)
}

pub fn vector(x: f64, y: f64) -> Vector {
    euclid::vec2(x, y)
}

pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Rect {
    euclid::rect(x, y, width, height)
}

/// Returns `r` moved by `(dx, dy)`.
pub fn translate(r: &Rect, dx: f64, dy: f64) -> Rect {
    r.translate(vector(dx, dy))
}

/// Plain bounding union of two rectangles.
///
/// Unlike `euclid::Rect::union`, zero-sized rectangles still contribute their origin.
pub fn union(a: &Rect, b: &Rect) -> Rect {
    let min_x = a.min_x().min(b.min_x());
    let min_y = a.min_y().min(b.min_y());
    let max_x = a.max_x().max(b.max_x());
    let max_y = a.max_y().max(b.max_y());
    rect(min_x, min_y, max_x - min_x, max_y - min_y)
}

/// `true` for a missing rectangle or one without a positive area.
pub fn is_empty(r: Option<&Rect>) -> bool {
    match r {
        None => true,
        Some(r) => !(r.size.width > 0.0 && r.size.height > 0.0),
    }
}

/// Integer rectangle by truncating casts.
pub fn to_int_rect(r: &Rect) -> IntRect {
    euclid::rect(
        r.origin.x as i32,
        r.origin.y as i32,
        r.size.width as i32,
        r.size.height as i32,
    )
}

/// The four inclusive integer corners of `r` in clockwise screen order, starting top-left.
pub fn corner_points(r: &Rect) -> [IntPoint; 4] {
    let x0 = r.origin.x as i32;
    let y0 = r.origin.y as i32;
    let x1 = (r.origin.x + r.size.width - 1.0) as i32;
    let y1 = (r.origin.y + r.size.height - 1.0) as i32;
    [
        int_point(x0, y0),
        int_point(x1, y0),
        int_point(x1, y1),
        int_point(x0, y1),
    ]
}

pub fn to_kurbo(p: Point) -> kurbo::Point {
    kurbo::Point::new(p.x, p.y)
}

pub fn from_kurbo(p: kurbo::Point) -> Point {
    point(p.x, p.y)
}

pub fn rect_to_kurbo(r: &Rect) -> kurbo::Rect {
    kurbo::Rect::new(r.min_x(), r.min_y(), r.max_x(), r.max_y())
}

pub fn rect_from_kurbo(r: kurbo::Rect) -> Rect {
    rect(r.x0, r.y0, r.width(), r.height())
}
