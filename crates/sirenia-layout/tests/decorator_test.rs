use sirenia_geom::{Rect, rect};
use sirenia_graph::{Graph, NodeId};
use sirenia_layout::{
    CloudDecorator, Decoration, Decorators, MarginDecorator, NodeDecorator, TreeGeometry,
};
use std::rc::Rc;

fn single_box(r: Rect) -> (Graph, TreeGeometry, NodeId) {
    let mut g = Graph::default();
    let n = g.add_node();
    g.set_root(Some(n));
    let mut geo = TreeGeometry::default();
    geo.set_bounds(&g, n, r).unwrap();
    (g, geo, n)
}

/// A 100x100 root with one 50x50 child to its right.
fn parent_and_child() -> (Graph, TreeGeometry, NodeId, NodeId) {
    let mut g = Graph::default();
    let r = g.add_node();
    let c = g.add_node();
    g.add_edge(r, c).unwrap();
    g.set_root(Some(r));
    let mut geo = TreeGeometry::default();
    geo.set_bounds(&g, r, rect(0.0, 0.0, 100.0, 100.0)).unwrap();
    geo.set_bounds(&g, c, rect(150.0, 0.0, 50.0, 50.0)).unwrap();
    (g, geo, r, c)
}

fn assert_near(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "{actual} is not within {tolerance} of {expected}"
    );
}

#[test]
fn decorator_margin_grows_box_by_half_distance() {
    let (_, geo, n) = single_box(rect(10.0, 10.0, 20.0, 20.0));
    let margin = MarginDecorator::new(4.0);
    assert_eq!(margin.bounds(&geo, n), Some(rect(8.0, 8.0, 24.0, 24.0)));
}

#[test]
fn decorator_visual_bounds_unions_all_decorations() {
    let (g, mut geo, n) = single_box(rect(10.0, 10.0, 20.0, 20.0));
    let mut decorators = Decorators::new();
    assert_eq!(decorators.visual_bounds(&geo, n), Some(rect(10.0, 10.0, 20.0, 20.0)));

    let thin: Rc<dyn NodeDecorator> = Rc::new(MarginDecorator::new(2.0));
    let wide: Rc<dyn NodeDecorator> = Rc::new(MarginDecorator::new(10.0));
    decorators.add(&mut geo, &g, n, thin.clone()).unwrap();
    decorators.add(&mut geo, &g, n, wide.clone()).unwrap();

    assert_eq!(decorators.decoration(n).map(Decoration::len), Some(2));
    assert_eq!(decorators.visual_bounds(&geo, n), Some(rect(5.0, 5.0, 30.0, 30.0)));

    assert!(decorators.remove(&mut geo, &g, n, &wide));
    assert!(matches!(decorators.decoration(n), Some(Decoration::Single(_))));
    assert_eq!(decorators.visual_bounds(&geo, n), Some(rect(9.0, 9.0, 22.0, 22.0)));

    assert!(decorators.remove(&mut geo, &g, n, &thin));
    assert!(decorators.decoration(n).is_none());
    assert!(!decorators.remove(&mut geo, &g, n, &thin));
}

#[test]
fn decorator_decoration_with_same_decorator_keeps_one() {
    let margin: Rc<dyn NodeDecorator> = Rc::new(MarginDecorator::new(2.0));
    let other: Rc<dyn NodeDecorator> = Rc::new(MarginDecorator::new(2.0));

    let d = Decoration::None.with(margin.clone()).with(margin.clone());
    assert!(matches!(d, Decoration::Single(_)));

    let d = d.with(other.clone());
    assert_eq!(d.len(), 2);
    let d = d.without(&margin).without(&other);
    assert!(d.is_none());
    assert!(d.is_empty());
}

#[test]
fn decorator_cloud_surrounds_the_subtree() {
    let (g, mut geo, r, c) = parent_and_child();
    let cloud = CloudDecorator::new();
    let d: Rc<dyn NodeDecorator> = cloud.clone();
    let mut decorators = Decorators::new();
    decorators.add(&mut geo, &g, r, d).unwrap();

    assert!(cloud.is_decorating(r));
    assert!(cloud.path(r).is_some());
    assert_eq!(geo.dependent_count(r), 1);
    assert_eq!(geo.dependent_count(c), 1);

    let tolerance = CloudDecorator::DEFAULT_POINT_DISTANCE;
    let b = cloud.bounds(&geo, r).unwrap();
    assert_near(b.min_x(), 0.0, tolerance);
    assert_near(b.min_y(), 0.0, tolerance);
    assert_near(b.max_x(), 199.0, tolerance);
    assert_near(b.max_y(), 99.0, tolerance);

    let visual = decorators.visual_bounds(&geo, r).unwrap();
    assert!(visual.contains_rect(&rect(0.0, 0.0, 100.0, 100.0)));
}

#[test]
fn decorator_cloud_follows_a_moved_child() {
    let (g, mut geo, r, c) = parent_and_child();
    let cloud = CloudDecorator::new();
    cloud.install(&mut geo, &g, r).unwrap();
    let before = cloud.bounds(&geo, r).unwrap();

    geo.move_tree(&g, c, 100.0, 0.0).unwrap();
    let after = cloud.bounds(&geo, r).unwrap();
    assert!(after.max_x() > before.max_x() + 50.0);
    assert_near(after.min_x(), 0.0, CloudDecorator::DEFAULT_POINT_DISTANCE);
}

#[test]
fn decorator_cloud_hidden_node_has_no_path() {
    let (g, mut geo, r, _) = parent_and_child();
    let cloud = CloudDecorator::new();
    cloud.install(&mut geo, &g, r).unwrap();

    geo.set_visibility(&g, r, false).unwrap();
    assert!(cloud.path(r).is_none());

    geo.set_visibility(&g, r, true).unwrap();
    assert!(cloud.path(r).is_some());
}

#[test]
fn decorator_cloud_uninstall_unregisters() {
    let (g, mut geo, r, c) = parent_and_child();
    let cloud = CloudDecorator::with_point_distance(20.0);
    cloud.install(&mut geo, &g, r).unwrap();
    cloud.uninstall(&mut geo, &g, r);

    assert!(!cloud.is_decorating(r));
    assert!(cloud.path(r).is_none());
    assert_eq!(geo.dependent_count(r), 0);
    assert_eq!(geo.dependent_count(c), 0);
}
