//! Node decorations: extra outlines drawn around a node or its whole subtree.
//!
//! Decorators only compute geometry. A [`Decorators`] table holds the [`Decoration`] of every
//! decorated node and reports the visual bounds of a node including its decorations.

use crate::error::Result;
use crate::geometry::{GeometryListener, TreeGeometry};
use indexmap::{IndexMap, IndexSet};
use kurbo::{BezPath, Shape};
use rustc_hash::FxBuildHasher;
use sirenia_geom::{IntPoint, Rect};
use sirenia_graph::{ElementId, Graph, NodeId};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type HashSet<T> = hashbrown::HashSet<T, FxBuildHasher>;

pub trait NodeDecorator {
    /// Starts decorating `node`.
    fn install(&self, geo: &mut TreeGeometry, graph: &Graph, node: NodeId) -> Result<()>;
    fn uninstall(&self, geo: &mut TreeGeometry, graph: &Graph, node: NodeId);
    /// Area covered by the decoration of `node`, if any.
    fn bounds(&self, geo: &TreeGeometry, node: NodeId) -> Option<Rect>;
}

fn decorator_key(d: &Rc<dyn NodeDecorator>) -> usize {
    Rc::as_ptr(d).cast::<()>() as usize
}

/// The decorators attached to one node.
#[derive(Clone, Default)]
pub enum Decoration {
    #[default]
    None,
    Single(Rc<dyn NodeDecorator>),
    Composite(Vec<Rc<dyn NodeDecorator>>),
}

impl fmt::Debug for Decoration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decoration::None => f.write_str("None"),
            Decoration::Single(_) => f.write_str("Single"),
            Decoration::Composite(v) => write!(f, "Composite({})", v.len()),
        }
    }
}

impl Decoration {
    pub fn is_none(&self) -> bool {
        matches!(self, Decoration::None)
    }

    pub fn decorators(&self) -> &[Rc<dyn NodeDecorator>] {
        match self {
            Decoration::None => &[],
            Decoration::Single(d) => std::slice::from_ref(d),
            Decoration::Composite(v) => v,
        }
    }

    pub fn len(&self) -> usize {
        self.decorators().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Adds `decorator`, moving it to the end if already present.
    pub fn with(self, decorator: Rc<dyn NodeDecorator>) -> Self {
        let key = decorator_key(&decorator);
        let mut list: Vec<Rc<dyn NodeDecorator>> = self
            .decorators()
            .iter()
            .filter(|d| decorator_key(d) != key)
            .cloned()
            .collect();
        list.push(decorator);
        Self::from_list(list)
    }

    pub fn without(self, decorator: &Rc<dyn NodeDecorator>) -> Self {
        let key = decorator_key(decorator);
        let list: Vec<Rc<dyn NodeDecorator>> = self
            .decorators()
            .iter()
            .filter(|d| decorator_key(d) != key)
            .cloned()
            .collect();
        Self::from_list(list)
    }

    fn from_list(mut list: Vec<Rc<dyn NodeDecorator>>) -> Self {
        match list.len() {
            0 => Decoration::None,
            1 => match list.pop() {
                Some(d) => Decoration::Single(d),
                None => Decoration::None,
            },
            _ => Decoration::Composite(list),
        }
    }

    /// Union of the bounds of all decorators.
    pub fn bounds(&self, geo: &TreeGeometry, node: NodeId) -> Option<Rect> {
        self.decorators()
            .iter()
            .filter_map(|d| d.bounds(geo, node))
            .reduce(|a, b| sirenia_geom::union(&a, &b))
    }
}

/// Decorations per node.
#[derive(Debug, Default)]
pub struct Decorators {
    by_node: IndexMap<NodeId, Decoration, FxBuildHasher>,
}

impl Decorators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        geo: &mut TreeGeometry,
        graph: &Graph,
        node: NodeId,
        decorator: Rc<dyn NodeDecorator>,
    ) -> Result<()> {
        let current = self.by_node.shift_remove(&node).unwrap_or_default();
        self.by_node.insert(node, current.with(decorator.clone()));
        decorator.install(geo, graph, node)
    }

    /// Returns `false` if `node` had no decoration.
    pub fn remove(
        &mut self,
        geo: &mut TreeGeometry,
        graph: &Graph,
        node: NodeId,
        decorator: &Rc<dyn NodeDecorator>,
    ) -> bool {
        let Some(current) = self.by_node.shift_remove(&node) else {
            return false;
        };
        let rest = current.without(decorator);
        if !rest.is_none() {
            self.by_node.insert(node, rest);
        }
        decorator.uninstall(geo, graph, node);
        true
    }

    pub fn decoration(&self, node: NodeId) -> Option<&Decoration> {
        self.by_node.get(&node)
    }

    /// The node box grown to include its decorations. `None` while the node has no box.
    pub fn visual_bounds(&self, geo: &TreeGeometry, node: NodeId) -> Option<Rect> {
        let b = geo.bounds(node)?;
        if sirenia_geom::is_empty(Some(&b)) {
            return Some(b);
        }
        match self.by_node.get(&node).and_then(|d| d.bounds(geo, node)) {
            Some(extra) => Some(sirenia_geom::union(&b, &extra)),
            None => Some(b),
        }
    }
}

/// A frame `distance` wide centred on the node's box outline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarginDecorator {
    pub distance: f64,
}

impl MarginDecorator {
    pub fn new(distance: f64) -> Self {
        Self { distance }
    }
}

impl NodeDecorator for MarginDecorator {
    fn install(&self, _geo: &mut TreeGeometry, _graph: &Graph, _node: NodeId) -> Result<()> {
        Ok(())
    }

    fn uninstall(&self, _geo: &mut TreeGeometry, _graph: &Graph, _node: NodeId) {}

    fn bounds(&self, geo: &TreeGeometry, node: NodeId) -> Option<Rect> {
        let b = geo.bounds(node)?;
        let half = self.distance / 2.0;
        Some(sirenia_geom::rect(
            b.min_x() - half,
            b.min_y() - half,
            b.width() + self.distance,
            b.height() + self.distance,
        ))
    }
}

#[derive(Debug, Clone, Default)]
struct Cloud {
    path: BezPath,
    visible: bool,
}

/// Wavy outline around the convex hull of a node's visible subtree.
///
/// The decorator listens to every node of the subtree present at install time and rebuilds the
/// outline whenever one of them moves, resizes or changes visibility.
pub struct CloudDecorator {
    this: Weak<CloudDecorator>,
    point_distance: f64,
    clouds: RefCell<IndexMap<NodeId, Cloud, FxBuildHasher>>,
}

impl fmt::Debug for CloudDecorator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudDecorator")
            .field("point_distance", &self.point_distance)
            .field("clouds", &self.clouds.borrow().len())
            .finish()
    }
}

impl CloudDecorator {
    pub const DEFAULT_POINT_DISTANCE: f64 = 50.0;

    pub fn new() -> Rc<Self> {
        Self::with_point_distance(Self::DEFAULT_POINT_DISTANCE)
    }

    /// `point_distance` is the length of one bump of the outline.
    pub fn with_point_distance(point_distance: f64) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            point_distance,
            clouds: RefCell::default(),
        })
    }

    fn as_listener(&self) -> Option<Rc<dyn GeometryListener>> {
        let this: Rc<dyn GeometryListener> = self.this.upgrade()?;
        Some(this)
    }

    /// Current outline of `node`, `None` if not decorated or hidden.
    pub fn path(&self, node: NodeId) -> Option<BezPath> {
        self.clouds
            .borrow()
            .get(&node)
            .filter(|c| c.visible && !c.path.elements().is_empty())
            .map(|c| c.path.clone())
    }

    pub fn is_decorating(&self, node: NodeId) -> bool {
        self.clouds.borrow().contains_key(&node)
    }

    /// Decorated nodes among `node` and its ancestors.
    fn collect_decorated(
        &self,
        graph: &Graph,
        node: NodeId,
        out: &mut IndexSet<NodeId, FxBuildHasher>,
        visited: &mut HashSet<NodeId>,
    ) {
        if !visited.insert(node) {
            return;
        }
        if self.clouds.borrow().contains_key(&node) {
            out.insert(node);
        }
        for p in graph.parents(node) {
            self.collect_decorated(graph, p, out, visited);
        }
    }
}

impl NodeDecorator for CloudDecorator {
    fn install(&self, geo: &mut TreeGeometry, graph: &Graph, node: NodeId) -> Result<()> {
        let Some(listener) = self.as_listener() else {
            return Ok(());
        };
        geo.add_dependency(&listener, graph.tree_nodes(node));
        self.clouds.borrow_mut().insert(
            node,
            Cloud {
                path: BezPath::new(),
                visible: geo.is_visible(node),
            },
        );
        self.geometry_updated(geo, graph, &[node.element()])
    }

    fn uninstall(&self, geo: &mut TreeGeometry, graph: &Graph, node: NodeId) {
        self.clouds.borrow_mut().shift_remove(&node);
        if let Some(listener) = self.as_listener() {
            geo.remove_dependency(&listener, graph.tree_nodes(node));
        }
    }

    fn bounds(&self, _geo: &TreeGeometry, node: NodeId) -> Option<Rect> {
        let clouds = self.clouds.borrow();
        let cloud = clouds.get(&node)?;
        if cloud.path.elements().is_empty() {
            return None;
        }
        Some(sirenia_geom::rect_from_kurbo(cloud.path.bounding_box()))
    }
}

impl GeometryListener for CloudDecorator {
    fn geometry_updated(
        &self,
        geo: &mut TreeGeometry,
        graph: &Graph,
        changed: &[ElementId],
    ) -> Result<()> {
        let mut decorated: IndexSet<NodeId, FxBuildHasher> = IndexSet::default();
        let mut visited: HashSet<NodeId> = HashSet::default();
        for id in changed {
            if let Some(n) = graph.node_id(*id) {
                self.collect_decorated(graph, n, &mut decorated, &mut visited);
            }
        }

        for node in decorated {
            if geo.is_visible(node) {
                let hull = sirenia_geom::convex_hull(&geo.tree_points(graph, node));
                if hull.len() > 1 {
                    let path = cloud_path(&hull, self.point_distance);
                    let mut clouds = self.clouds.borrow_mut();
                    let cloud = clouds.entry(node).or_default();
                    cloud.path = path;
                    cloud.visible = true;
                }
            } else if let Some(cloud) = self.clouds.borrow_mut().get_mut(&node) {
                cloud.visible = false;
            }
        }
        Ok(())
    }
}

/// Closed outline of quadratic bumps around the hull polygon `hull`.
///
/// Hull corners are pushed outwards by a tenth of `point_distance` depending on the direction of
/// their neighbours, and long sides are split into bumps of about `point_distance`.
pub fn cloud_path(hull: &[IntPoint], point_distance: f64) -> BezPath {
    let mut path = BezPath::new();
    let n = hull.len();
    if n < 2 {
        return path;
    }
    let offset = point_distance * 0.1;
    let at = |i: usize| (f64::from(hull[i].x), f64::from(hull[i].y));

    let mut next = at(0);
    let mut last = at(n - 1);
    let (mut x0, mut y0) = (last.0 - offset, last.1 + offset);
    let (mut x2, mut y2) = (x0, y0);
    path.move_to((x0, y0));

    for i in 0..n {
        let (mut x1, mut y1) = next;
        if i < n - 1 {
            let current = next;
            next = at(i + 1);
            let dxx = next.0 - last.0;
            let dyy = next.1 - last.1;
            last = current;
            if dxx > 0.0 {
                y1 -= offset;
            } else if dxx < 0.0 {
                y1 += offset;
            }
            if dyy < 0.0 {
                x1 -= offset;
            } else if dyy > 0.0 {
                x1 += offset;
            }
        } else {
            x1 -= offset;
            y1 += offset;
        }

        let dx = x1 - x0;
        let dy = y1 - y0;
        let length = dx.abs() + dy.abs();
        if length > point_distance {
            let steps = (length / point_distance) as usize;
            let xf = point_distance * (dx / length);
            let yf = point_distance * (dy / length);
            for j in 0..steps {
                let (x3, y3) = if (j + 2) as f64 * point_distance < length {
                    (x0 + (j + 1) as f64 * xf, y0 + (j + 1) as f64 * yf)
                } else {
                    (x1, y1)
                };
                add_bump(&mut path, (x2, y2), (x3, y3), point_distance);
                (x2, y2) = (x3, y3);
            }
        } else {
            add_bump(&mut path, (x2, y2), (x1, y1), point_distance);
            (x2, y2) = (x1, y1);
        }
        (x0, y0) = (x1, y1);
    }
    path
}

fn add_bump(path: &mut BezPath, from: (f64, f64), to: (f64, f64), point_distance: f64) {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    let length = dx.abs() + dy.abs();
    if length > 1.0 {
        path.quad_to(
            (
                from.0 + 0.5 * dx + point_distance * (dy / length),
                from.1 + 0.5 * dy - point_distance * (dx / length),
            ),
            to,
        );
    }
}
