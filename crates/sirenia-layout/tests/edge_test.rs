use kurbo::PathEl;
use sirenia_geom::{point, rect};
use sirenia_graph::{EdgeId, Graph};
use sirenia_layout::{EdgeMode, EdgeStyle, TreeGeometry, curve_between, edge_curve, edge_hit};

fn straight() -> EdgeStyle {
    EdgeStyle {
        mode: EdgeMode::Straight,
        ..EdgeStyle::default()
    }
}

/// Parent (0,0,100,20) and child (150,y,50,20) joined by one edge.
fn pair(child_y: f64) -> (Graph, TreeGeometry, EdgeId) {
    let mut g = Graph::default();
    let p = g.add_node();
    let c = g.add_node();
    let e = g.add_edge(p, c).unwrap();
    let mut geo = TreeGeometry::default();
    geo.set_bounds(&g, p, rect(0.0, 0.0, 100.0, 20.0)).unwrap();
    geo.set_bounds(&g, c, rect(150.0, child_y, 50.0, 20.0)).unwrap();
    (g, geo, e)
}

#[test]
fn edge_curve_straight_joins_facing_connectors() {
    let (g, mut geo, e) = pair(0.0);
    let path = edge_curve(&mut geo, &g, e, &straight()).unwrap();
    assert_eq!(
        path.elements(),
        &[
            PathEl::MoveTo((100.0, 10.0).into()),
            PathEl::LineTo((150.0, 10.0).into()),
        ]
    );
}

#[test]
fn edge_curve_bezier_ends_on_the_target_connector() {
    let (g, mut geo, e) = pair(40.0);
    let path = edge_curve(&mut geo, &g, e, &EdgeStyle::default()).unwrap();
    let els = path.elements();
    assert_eq!(els.len(), 3);
    assert_eq!(els[0], PathEl::MoveTo((100.0, 10.0).into()));
    match els[2] {
        PathEl::QuadTo(_, end) => assert_eq!(end, (150.0, 50.0).into()),
        other => panic!("expected a quadratic segment, got {other:?}"),
    }
}

#[test]
fn edge_curve_is_none_without_boxes() {
    let mut g = Graph::default();
    let p = g.add_node();
    let c = g.add_node();
    let e = g.add_edge(p, c).unwrap();
    let mut geo = TreeGeometry::default();
    geo.set_bounds(&g, p, rect(0.0, 0.0, 10.0, 10.0)).unwrap();

    assert!(edge_curve(&mut geo, &g, e, &EdgeStyle::default()).is_none());
    assert!(!edge_hit(&mut geo, &g, e, &EdgeStyle::default(), point(5.0, 5.0), 100.0));
}

#[test]
fn edge_hit_uses_tolerance() {
    let (g, mut geo, e) = pair(0.0);
    let style = straight();
    assert!(edge_hit(&mut geo, &g, e, &style, point(125.0, 12.0), 3.0));
    assert!(!edge_hit(&mut geo, &g, e, &style, point(125.0, 30.0), 3.0));
}

#[test]
fn edge_curve_between_snake_wiggles_sideways() {
    let style = EdgeStyle {
        mode: EdgeMode::Straight,
        snake_factor: 0.5,
        ..EdgeStyle::default()
    };
    let path = curve_between(point(0.0, 10.0), point(50.0, 10.0), &style);
    let els = path.elements();

    assert_eq!(els[0], PathEl::MoveTo((0.0, 10.0).into()));
    let deviation = els
        .iter()
        .filter_map(|el| match el {
            PathEl::LineTo(p) => Some((p.y - 10.0).abs()),
            _ => None,
        })
        .fold(0.0, f64::max);
    assert!(deviation > 1.0);
    assert!(els.len() > 2);
}

#[test]
fn edge_style_from_json_str_fills_defaults() {
    let style = EdgeStyle::from_json_str(r#"{"mode":"bezierToTarget"}"#).unwrap();
    assert_eq!(style.mode, EdgeMode::BezierToTarget);
    assert_eq!(style.snake_factor, 0.0);
    assert_eq!(style.flatness, 0.1);
}
