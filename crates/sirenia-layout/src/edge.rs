//! Edge curves between connector points.

use crate::geometry::TreeGeometry;
use kurbo::{BezPath, PathEl};
use serde::{Deserialize, Serialize};
use sirenia_geom::{CubicCurve, Point, from_kurbo, point, to_kurbo};
use sirenia_graph::{EdgeId, Graph};

/// Distance between the sample points of a snaked curve.
const SNAKE_STEP: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeMode {
    Straight,
    /// Two quadratic halves leaving and entering horizontally.
    #[default]
    Bezier,
    /// One quadratic curve bending towards the target's height.
    BezierToTarget,
    /// One quadratic curve bending towards the source's height.
    BezierToSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EdgeStyle {
    pub mode: EdgeMode,
    /// Amplitude of the sideways wiggle relative to the edge length; `0` disables it.
    pub snake_factor: f64,
    /// Tolerance used when flattening curves.
    pub flatness: f64,
}

impl Default for EdgeStyle {
    fn default() -> Self {
        Self {
            mode: EdgeMode::default(),
            snake_factor: 0.0,
            flatness: 0.1,
        }
    }
}

impl EdgeStyle {
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Curve of `edge` from the source's connector towards the target to the target's connector
/// towards the source. `None` if an endpoint or a box is missing.
pub fn edge_curve(
    geo: &mut TreeGeometry,
    graph: &Graph,
    edge: EdgeId,
    style: &EdgeStyle,
) -> Option<BezPath> {
    let e = graph.edge(edge)?;
    let (source, target) = (e.source()?, e.target()?);
    let start = geo.connector_point(source, target)?;
    let end = geo.connector_point(target, source)?;
    Some(curve_between(start, end, style))
}

/// `true` if `p` lies within `tolerance` of the curve of `edge`.
pub fn edge_hit(
    geo: &mut TreeGeometry,
    graph: &Graph,
    edge: EdgeId,
    style: &EdgeStyle,
    p: Point,
    tolerance: f64,
) -> bool {
    let Some(curve) = edge_curve(geo, graph, edge, style) else {
        return false;
    };
    let closest = sirenia_geom::closest_point_on_shape(p, &curve, style.flatness);
    closest.distance_to(p) <= tolerance
}

pub fn curve_between(start: Point, end: Point, style: &EdgeStyle) -> BezPath {
    let a = to_kurbo(start);
    let b = to_kurbo(end);
    let mut path = BezPath::new();
    path.move_to(a);
    match style.mode {
        EdgeMode::Straight => path.line_to(b),
        EdgeMode::Bezier => {
            let mid = a.midpoint(b);
            path.quad_to(kurbo::Point::new((a.x + mid.x) / 2.0, a.y), mid);
            path.quad_to(kurbo::Point::new((mid.x + b.x) / 2.0, b.y), b);
        }
        EdgeMode::BezierToTarget => path.quad_to(kurbo::Point::new((a.x + b.x) / 2.0, b.y), b),
        EdgeMode::BezierToSource => path.quad_to(kurbo::Point::new((a.x + b.x) / 2.0, a.y), b),
    }

    if style.snake_factor > 0.0 {
        snake(&path, start.distance_to(end), style)
    } else {
        path
    }
}

/// One full wave over the unit interval: up over the first half, down over the second.
fn snake_segments() -> [CubicCurve; 2] {
    [
        CubicCurve::new(
            point(0.0, 0.0),
            point(0.0, 0.3),
            point(0.5, 0.3),
            point(0.5, 0.0),
        ),
        CubicCurve::new(
            point(0.5, 0.0),
            point(0.5, -0.3),
            point(1.0, -0.3),
            point(1.0, 0.0),
        ),
    ]
}

/// Height of the wave scaled to `length` at distance `x`, `None` past either end.
fn snake_offset(x: f64, length: f64) -> Option<f64> {
    if length <= 0.0 || !(0.0..=length).contains(&x) {
        return None;
    }
    let u = x / length;
    let [first, second] = snake_segments();
    let curve = if u <= 0.5 { first } else { second };

    // x grows monotonically along both segments
    let (mut lo, mut hi) = (0.0, 1.0);
    for _ in 0..40 {
        let mid = (lo + hi) / 2.0;
        if sirenia_geom::point_on_cubic_bezier(&curve, mid).x < u {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Some(sirenia_geom::point_on_cubic_bezier(&curve, (lo + hi) / 2.0).y * length)
}

/// Resamples the flattened `path` every [`SNAKE_STEP`] and pushes each sample sideways by the
/// wave height at the distance travelled.
fn snake(path: &BezPath, length: f64, style: &EdgeStyle) -> BezPath {
    let mut out = BezPath::new();
    let mut current = kurbo::Point::ZERO;
    let mut start = kurbo::Point::ZERO;
    let mut travelled = 0.0;

    kurbo::flatten(path.iter(), style.flatness, |el| match el {
        PathEl::MoveTo(p) => {
            current = p;
            start = p;
            out.move_to(p);
        }
        PathEl::LineTo(p) => {
            let segment = current.distance(p);
            let mut along = 0.0;
            while along < segment {
                along = (along + SNAKE_STEP).min(segment);
                let sample = current.lerp(p, along / segment);
                let placed = match snake_offset(travelled + along, length) {
                    Some(height) => sirenia_geom::orthogonal_offset(
                        from_kurbo(current),
                        from_kurbo(sample),
                        height * style.snake_factor,
                    ),
                    None => from_kurbo(sample),
                };
                out.line_to(to_kurbo(placed));
            }
            current = p;
            travelled += segment;
        }
        PathEl::ClosePath => {
            out.close_path();
            current = start;
        }
        PathEl::QuadTo(..) | PathEl::CurveTo(..) => {}
    });
    out
}
