use sirenia_geom::{point, rect};
use sirenia_graph::{EdgeId, ElementId, Graph, NodeId};
use sirenia_layout::expand::{is_expanded, set_expanded, toggle_at, update_visibility};
use sirenia_layout::{GeometryListener, Layout, Result, TreeGeometry, TreeLayout};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
struct Recorder {
    calls: RefCell<Vec<Vec<ElementId>>>,
}

impl GeometryListener for Recorder {
    fn geometry_updated(
        &self,
        _: &mut TreeGeometry,
        _: &Graph,
        changed: &[ElementId],
    ) -> Result<()> {
        self.calls.borrow_mut().push(changed.to_vec());
        Ok(())
    }
}

struct Tree {
    graph: Graph,
    geo: TreeGeometry,
    root: NodeId,
    child: NodeId,
    grandchild: NodeId,
    root_child: EdgeId,
    child_grandchild: EdgeId,
}

/// root -> child -> grandchild, all boxes set, nothing expanded yet.
fn tree() -> Tree {
    let mut graph = Graph::default();
    let root = graph.add_node();
    let child = graph.add_node();
    let grandchild = graph.add_node();
    let root_child = graph.add_edge(root, child).unwrap();
    let child_grandchild = graph.add_edge(child, grandchild).unwrap();
    graph.set_root(Some(root));

    let mut geo = TreeGeometry::default();
    geo.set_bounds(&graph, root, rect(0.0, 0.0, 100.0, 20.0)).unwrap();
    geo.set_bounds(&graph, child, rect(0.0, 0.0, 60.0, 20.0)).unwrap();
    geo.set_bounds(&graph, grandchild, rect(0.0, 0.0, 40.0, 20.0)).unwrap();
    Tree {
        graph,
        geo,
        root,
        child,
        grandchild,
        root_child,
        child_grandchild,
    }
}

#[test]
fn expand_set_expanded_lays_out_children() {
    let mut t = tree();
    let layout = TreeLayout::default();

    assert!(!is_expanded(&t.geo, &t.graph, t.root_child));
    assert!(set_expanded(&mut t.geo, &t.graph, &layout, t.root_child, true).unwrap());
    assert!(is_expanded(&t.geo, &t.graph, t.root_child));
    assert!(t.geo.is_visible(t.child));
    assert_eq!(t.geo.bounds(t.child), Some(rect(110.0, 0.0, 60.0, 20.0)));

    let c = t.geo.visual_state(t.root).unwrap().connectors[&t.child];
    assert_eq!((c.x_offset, c.y_offset), (100.0, 10.0));
}

#[test]
fn expand_set_expanded_twice_changes_nothing() {
    let mut t = tree();
    let layout = TreeLayout::default();
    let rec = Rc::new(Recorder::default());
    let l: Rc<dyn GeometryListener> = rec.clone();
    t.geo.add_dependency(&l, [t.child]);

    assert!(set_expanded(&mut t.geo, &t.graph, &layout, t.root_child, true).unwrap());
    let after_first = rec.calls.borrow().len();
    assert_eq!(after_first, 1);

    assert!(!set_expanded(&mut t.geo, &t.graph, &layout, t.root_child, true).unwrap());
    assert_eq!(rec.calls.borrow().len(), after_first);
}

#[test]
fn expand_collapse_hides_all_descendants() {
    let mut t = tree();
    let layout = TreeLayout::default();
    set_expanded(&mut t.geo, &t.graph, &layout, t.root_child, true).unwrap();
    set_expanded(&mut t.geo, &t.graph, &layout, t.child_grandchild, true).unwrap();
    assert!(t.geo.is_visible(t.grandchild));
    assert_eq!(t.geo.bounds(t.grandchild), Some(rect(180.0, 0.0, 40.0, 20.0)));

    assert!(set_expanded(&mut t.geo, &t.graph, &layout, t.root_child, false).unwrap());
    assert!(!t.geo.is_visible(t.child));
    assert!(!t.geo.is_visible(t.grandchild));
    assert!(t.geo.is_visible(t.root));
    assert!(!is_expanded(&t.geo, &t.graph, t.child_grandchild));
}

#[test]
fn expand_update_visibility_follows_incoming_edges() {
    let mut t = tree();
    let layout = TreeLayout::default();

    update_visibility(&mut t.geo, &t.graph, t.root).unwrap();
    update_visibility(&mut t.geo, &t.graph, t.child).unwrap();
    assert!(t.geo.is_visible(t.root));
    assert!(!t.geo.is_visible(t.child));

    set_expanded(&mut t.geo, &t.graph, &layout, t.root_child, true).unwrap();
    update_visibility(&mut t.geo, &t.graph, t.child).unwrap();
    assert!(t.geo.is_visible(t.child));
}

#[test]
fn expand_toggle_at_switches_stacked_connectors_together() {
    let mut graph = Graph::default();
    let root = graph.add_node();
    let a = graph.add_node();
    let b = graph.add_node();
    let ra = graph.add_edge(root, a).unwrap();
    let rb = graph.add_edge(root, b).unwrap();
    graph.set_root(Some(root));

    let mut geo = TreeGeometry::default();
    geo.set_bounds(&graph, root, rect(0.0, 0.0, 100.0, 20.0)).unwrap();
    geo.set_bounds(&graph, a, rect(0.0, 0.0, 50.0, 20.0)).unwrap();
    geo.set_bounds(&graph, b, rect(0.0, 0.0, 50.0, 20.0)).unwrap();
    let layout = TreeLayout::default();
    layout.place_children(&mut geo, &graph, root).unwrap();

    let hit = toggle_at(&mut geo, &graph, &layout, root, point(101.0, 11.0), 5.0).unwrap();
    assert_eq!(hit, Some(a));
    assert!(is_expanded(&geo, &graph, ra));
    assert!(is_expanded(&geo, &graph, rb));

    toggle_at(&mut geo, &graph, &layout, root, point(99.0, 9.0), 5.0).unwrap();
    assert!(!is_expanded(&geo, &graph, ra));
    assert!(!is_expanded(&geo, &graph, rb));
    assert!(!geo.is_visible(a));
    assert!(!geo.is_visible(b));
}

#[test]
fn expand_toggle_at_misses_far_from_connectors() {
    let mut t = tree();
    let layout = TreeLayout::default();
    layout.place_children(&mut t.geo, &t.graph, t.root).unwrap();

    let hit = toggle_at(&mut t.geo, &t.graph, &layout, t.root, point(50.0, 10.0), 5.0).unwrap();
    assert_eq!(hit, None);
    assert!(!is_expanded(&t.geo, &t.graph, t.root_child));
    assert_eq!(
        toggle_at(&mut t.geo, &t.graph, &layout, t.child, point(0.0, 0.0), 5.0).unwrap(),
        None
    );
}
