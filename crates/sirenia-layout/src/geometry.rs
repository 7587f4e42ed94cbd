//! Reactive geometry store for tree diagrams.
//!
//! [`TreeGeometry`] keeps a [`VisualState`] per element and notifies [`GeometryListener`]s that
//! registered interest in an element whenever its box or visibility changes. Outside a batch the
//! listeners run immediately. Between [`TreeGeometry::begin_update`] and the outermost
//! [`TreeGeometry::end_update`] changes are collected per listener and delivered once at the end,
//! each element listed once. Listeners may change geometry again while being notified; the flush
//! repeats until nothing is pending, for at most [`MAX_CONVERGENCE_ITERATIONS`] rounds.

use crate::error::{Error, Result};
use crate::options::{
    GeometryOptions, LimitPolicy, MAX_COLLISION_ATTEMPTS, MAX_CONVERGENCE_ITERATIONS,
};
use crate::state::{Connector, Movable, VisualState};
use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxBuildHasher;
use sirenia_geom::{IntPoint, Point, Rect};
use sirenia_graph::{ElementId, Graph, NodeId};
use std::fmt;
use std::rc::Rc;

type HashMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;
type HashSet<T> = hashbrown::HashSet<T, FxBuildHasher>;

pub trait GeometryListener {
    /// Called with the elements whose geometry changed. Errors abort the running batch.
    fn geometry_updated(
        &self,
        geo: &mut TreeGeometry,
        graph: &Graph,
        changed: &[ElementId],
    ) -> Result<()>;
}

/// Listeners are identified by their allocation, not by value.
type ListenerKey = usize;

fn listener_key(listener: &Rc<dyn GeometryListener>) -> ListenerKey {
    Rc::as_ptr(listener).cast::<()>() as usize
}

#[derive(Clone)]
struct Registration {
    key: ListenerKey,
    listener: Rc<dyn GeometryListener>,
}

struct Pending {
    listener: Rc<dyn GeometryListener>,
    changed: IndexSet<ElementId, FxBuildHasher>,
}

pub struct TreeGeometry {
    options: GeometryOptions,
    states: HashMap<ElementId, VisualState>,
    dependencies: HashMap<ElementId, Vec<Registration>>,
    pending: IndexMap<ListenerKey, Pending, FxBuildHasher>,
    depth: usize,
}

impl Default for TreeGeometry {
    fn default() -> Self {
        Self::new(GeometryOptions::default())
    }
}

impl fmt::Debug for TreeGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeGeometry")
            .field("options", &self.options)
            .field("states", &self.states.len())
            .field("dependencies", &self.dependencies.len())
            .field("pending", &self.pending.len())
            .field("depth", &self.depth)
            .finish()
    }
}

impl TreeGeometry {
    pub fn new(options: GeometryOptions) -> Self {
        Self {
            options,
            states: HashMap::default(),
            dependencies: HashMap::default(),
            pending: IndexMap::default(),
            depth: 0,
        }
    }

    pub fn options(&self) -> GeometryOptions {
        self.options
    }

    pub fn set_options(&mut self, options: GeometryOptions) {
        self.options = options;
    }

    pub fn visual_state(&self, id: impl Into<ElementId>) -> Option<&VisualState> {
        self.states.get(&id.into())
    }

    /// The state of `id`, created visible and without a box on first access.
    pub fn visual_state_mut(&mut self, id: impl Into<ElementId>) -> &mut VisualState {
        self.states.entry(id.into()).or_default()
    }

    pub fn bounds(&self, node: NodeId) -> Option<Rect> {
        self.states
            .get(&node.element())
            .and_then(|s| s.bounding_box)
    }

    pub fn set_bounds(&mut self, graph: &Graph, node: NodeId, bounds: Rect) -> Result<()> {
        self.visual_state_mut(node).bounding_box = Some(bounds);
        self.notify_dependencies(graph, node)
    }

    /// Where the edge from `n1` towards `n2` attaches to `n1`.
    ///
    /// The connector is created on first use: on the right edge midpoint of `n1` if `n2` lies to
    /// the right, else on the left edge midpoint. `None` while either box is unset.
    pub fn connector_point(&mut self, n1: NodeId, n2: NodeId) -> Option<Point> {
        let b1 = self.bounds(n1)?;
        let b2 = self.bounds(n2)?;
        let connector = *self
            .visual_state_mut(n1)
            .connectors
            .entry(n2)
            .or_insert_with(|| Connector {
                parent: n1,
                x_offset: if b1.min_x() < b2.min_x() {
                    b1.width()
                } else {
                    0.0
                },
                y_offset: b1.height() / 2.0,
                expanded: false,
            });
        Some(sirenia_geom::point(
            b1.min_x() + connector.x_offset,
            b1.min_y() + connector.y_offset,
        ))
    }

    /// Moves `node` and its tree descendants by `(dx, dy)` in one batch.
    ///
    /// Only `node` itself avoids collisions: its new box is nudged out of other visible nodes
    /// for up to [`MAX_COLLISION_ATTEMPTS`] tries. Descendants move by the plain delta.
    pub fn move_tree(&mut self, graph: &Graph, node: NodeId, dx: f64, dy: f64) -> Result<()> {
        self.batch(graph, |geo| geo.move_subtree(graph, node, dx, dy))
    }

    fn move_subtree(&mut self, graph: &Graph, node: NodeId, dx: f64, dy: f64) -> Result<()> {
        if let Some(original) = self.bounds(node) {
            let proposed = sirenia_geom::translate(&original, dx, dy);
            let placed = self.avoid_collisions(graph, node, &original, proposed)?;
            self.set_bounds(graph, node, placed)?;
        }
        for d in graph.tree_descendants(node) {
            if let Some(b) = self.bounds(d) {
                self.set_bounds(graph, d, sirenia_geom::translate(&b, dx, dy))?;
            }
        }
        Ok(())
    }

    fn avoid_collisions(
        &self,
        graph: &Graph,
        node: NodeId,
        original: &Rect,
        mut proposed: Rect,
    ) -> Result<Rect> {
        let mut attempts = 0;
        while let Some(hit) = self.intersecting_node(graph, &proposed, Some(node)) {
            if attempts == MAX_COLLISION_ATTEMPTS {
                match self.options.collision {
                    LimitPolicy::Ignore => {}
                    LimitPolicy::Warn => {
                        tracing::warn!(%node, %hit, attempts, "moved node still overlaps")
                    }
                    LimitPolicy::Fail => {
                        return Err(Error::CollisionUnresolved { node, attempts });
                    }
                }
                break;
            }
            attempts += 1;
            if let Some(obstacle) = self.bounds(hit) {
                nudge(original, &mut proposed, &obstacle);
            }
        }
        Ok(proposed)
    }

    /// Moves a node by `(dx, dy)`, or places a connector at the absolute offset `(dx, dy)`.
    pub fn move_element(
        &mut self,
        graph: &Graph,
        element: impl Into<Movable>,
        dx: f64,
        dy: f64,
    ) -> Result<()> {
        let element = element.into();
        self.batch(graph, |geo| match element {
            Movable::Node(node) => match geo.bounds(node) {
                Some(b) => geo.set_bounds(graph, node, sirenia_geom::translate(&b, dx, dy)),
                None => Ok(()),
            },
            Movable::Connector { parent, target } => {
                let c = geo.visual_state_mut(parent).connector(parent, target);
                c.x_offset = dx;
                c.y_offset = dy;
                // Connector offsets live in the parent's state; re-apply its box to notify.
                match geo.bounds(parent) {
                    Some(b) => geo.set_bounds(graph, parent, b),
                    None => geo.notify_dependencies(graph, parent),
                }
            }
        })
    }

    /// Elements without state are visible.
    pub fn is_visible(&self, id: impl Into<ElementId>) -> bool {
        self.states.get(&id.into()).is_none_or(|s| s.visible)
    }

    /// Notifies dependents only if the visibility actually changes.
    pub fn set_visibility(
        &mut self,
        graph: &Graph,
        id: impl Into<ElementId>,
        visible: bool,
    ) -> Result<()> {
        let id = id.into();
        let state = self.visual_state_mut(id);
        if state.visible == visible {
            return Ok(());
        }
        state.visible = visible;
        self.notify_dependencies(graph, id)
    }

    /// Box corners of `node` and its visible tree descendants. A hidden node hides its subtree.
    pub fn tree_points(&self, graph: &Graph, node: NodeId) -> Vec<IntPoint> {
        let mut points = Vec::with_capacity(16);
        let mut visited = HashSet::default();
        self.add_tree_points(graph, node, &mut points, &mut visited);
        points
    }

    /// Like [`tree_points`](Self::tree_points) without the corners of `node` itself.
    pub fn tree_descendant_points(&self, graph: &Graph, node: NodeId) -> Vec<IntPoint> {
        let mut points = Vec::with_capacity(16);
        let mut visited = HashSet::default();
        visited.insert(node);
        for c in graph.children(node) {
            self.add_tree_points(graph, c, &mut points, &mut visited);
        }
        points
    }

    fn add_tree_points(
        &self,
        graph: &Graph,
        node: NodeId,
        points: &mut Vec<IntPoint>,
        visited: &mut HashSet<NodeId>,
    ) {
        if !visited.insert(node) || !self.is_visible(node) {
            return;
        }
        if let Some(b) = self.bounds(node) {
            points.extend(sirenia_geom::corner_points(&b));
        }
        for c in graph.children(node) {
            self.add_tree_points(graph, c, points, visited);
        }
    }

    /// Union of the box of `root` and the boxes of its visible tree descendants.
    pub fn graph_bounds(&self, graph: &Graph, root: NodeId) -> Option<Rect> {
        let mut bounds = self.bounds(root)?;
        for d in graph.tree_descendants(root) {
            if !self.is_visible(d) {
                continue;
            }
            if let Some(b) = self.bounds(d) {
                bounds = sirenia_geom::union(&bounds, &b);
            }
        }
        Some(bounds)
    }

    /// First visible node (pre-order from the graph root) whose box overlaps `rect`.
    ///
    /// The subtree of `exclude` is skipped. Touching edges do not count as overlap.
    pub fn intersecting_node(
        &self,
        graph: &Graph,
        rect: &Rect,
        exclude: Option<NodeId>,
    ) -> Option<NodeId> {
        let root = graph.root()?;
        if !self.is_visible(root) {
            return None;
        }
        let mut visited: HashSet<NodeId> = HashSet::default();
        let mut stack = vec![root];
        while let Some(n) = stack.pop() {
            if Some(n) == exclude || !visited.insert(n) {
                continue;
            }
            if self.bounds(n).is_some_and(|b| b.intersects(rect)) {
                return Some(n);
            }
            let children: Vec<NodeId> = graph
                .children(n)
                .filter(|c| self.is_visible(*c))
                .collect();
            stack.extend(children.into_iter().rev());
        }
        None
    }

    /// Drops the state and the listener registrations of `id`.
    pub fn remove(&mut self, id: impl Into<ElementId>) {
        let id = id.into();
        self.states.remove(&id);
        self.dependencies.remove(&id);
    }

    /// Drops all visual states. Listener registrations are kept.
    pub fn clear(&mut self) {
        self.states.clear();
    }

    /// Registers `listener` for changes of `elements`. Registering twice has no extra effect.
    pub fn add_dependency<I, E>(&mut self, listener: &Rc<dyn GeometryListener>, elements: I)
    where
        I: IntoIterator<Item = E>,
        E: Into<ElementId>,
    {
        let key = listener_key(listener);
        for e in elements {
            let list = self.dependencies.entry(e.into()).or_default();
            list.retain(|r| r.key != key);
            list.push(Registration {
                key,
                listener: listener.clone(),
            });
        }
    }

    pub fn remove_dependency<I, E>(&mut self, listener: &Rc<dyn GeometryListener>, elements: I)
    where
        I: IntoIterator<Item = E>,
        E: Into<ElementId>,
    {
        let key = listener_key(listener);
        for e in elements {
            let e = e.into();
            if let Some(list) = self.dependencies.get_mut(&e) {
                list.retain(|r| r.key != key);
                if list.is_empty() {
                    self.dependencies.remove(&e);
                }
            }
        }
    }

    /// Number of listeners registered for `id`.
    pub fn dependent_count(&self, id: impl Into<ElementId>) -> usize {
        self.dependencies.get(&id.into()).map_or(0, Vec::len)
    }

    /// Tells the listeners of `id` that its geometry changed, now or at the end of the batch.
    pub fn notify_dependencies(&mut self, graph: &Graph, id: impl Into<ElementId>) -> Result<()> {
        let id = id.into();
        let Some(list) = self.dependencies.get(&id) else {
            return Ok(());
        };

        if self.depth > 0 {
            for r in list {
                self.pending
                    .entry(r.key)
                    .or_insert_with(|| Pending {
                        listener: r.listener.clone(),
                        changed: IndexSet::default(),
                    })
                    .changed
                    .insert(id);
            }
            return Ok(());
        }

        let listeners: Vec<Rc<dyn GeometryListener>> =
            list.iter().map(|r| r.listener.clone()).collect();
        for l in listeners {
            l.geometry_updated(self, graph, &[id])?;
        }
        Ok(())
    }

    pub fn begin_update(&mut self) {
        self.depth += 1;
    }

    /// Closes a batch. Closing the outermost batch delivers the collected notifications.
    ///
    /// The batch stays open while listeners run, so changes they make are collected for the next
    /// round instead of firing re-entrantly.
    pub fn end_update(&mut self, graph: &Graph) -> Result<()> {
        match self.depth {
            0 => {
                tracing::debug!("end_update without begin_update");
                Ok(())
            }
            1 => {
                let flushed = self.flush(graph);
                self.depth = 0;
                flushed
            }
            _ => {
                self.depth -= 1;
                Ok(())
            }
        }
    }

    /// Runs `f` inside a batch. The batch is closed even if `f` fails; the first error wins.
    pub fn batch<T>(
        &mut self,
        graph: &Graph,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.begin_update();
        let result = f(self);
        let flushed = self.end_update(graph);
        let value = result?;
        flushed?;
        Ok(value)
    }

    /// Nesting depth of open batches.
    pub fn update_depth(&self) -> usize {
        self.depth
    }

    fn flush(&mut self, graph: &Graph) -> Result<()> {
        let mut iterations = 0;
        while !self.pending.is_empty() {
            if iterations == MAX_CONVERGENCE_ITERATIONS {
                let pending = self.pending.len();
                self.pending.clear();
                return match self.options.convergence {
                    LimitPolicy::Ignore => Ok(()),
                    LimitPolicy::Warn => {
                        tracing::warn!(
                            iterations,
                            pending,
                            "geometry updates did not settle; pending notifications dropped"
                        );
                        Ok(())
                    }
                    LimitPolicy::Fail => Err(Error::ConvergenceExceeded {
                        iterations,
                        pending,
                    }),
                };
            }
            iterations += 1;

            let round = std::mem::take(&mut self.pending);
            for (_, p) in round {
                let changed: Vec<ElementId> = p.changed.into_iter().collect();
                if let Err(e) = p.listener.geometry_updated(self, graph, &changed) {
                    self.pending.clear();
                    return Err(e);
                }
            }
            tracing::trace!(iterations, "geometry batch flushed");
        }
        Ok(())
    }
}

/// Slides `proposed` out of `obstacle` along each axis on which `original` was clear of it.
fn nudge(original: &Rect, proposed: &mut Rect, obstacle: &Rect) {
    if original.min_x() >= obstacle.max_x() && proposed.min_x() < obstacle.max_x() {
        proposed.origin.x = obstacle.max_x();
    } else if original.max_x() <= obstacle.min_x() && proposed.max_x() > obstacle.min_x() {
        proposed.origin.x = obstacle.min_x() - original.width();
    }

    if original.min_y() >= obstacle.max_y() && proposed.min_y() < obstacle.max_y() {
        proposed.origin.y = obstacle.max_y();
    } else if original.max_y() <= obstacle.min_y() && proposed.max_y() > obstacle.min_y() {
        proposed.origin.y = obstacle.min_y() - original.height();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sirenia_geom::rect;

    #[test]
    fn nudge_stops_at_the_obstacle_edge() {
        let obstacle = rect(100.0, 0.0, 50.0, 20.0);

        // coming from the left
        let original = rect(0.0, 0.0, 40.0, 20.0);
        let mut proposed = rect(80.0, 0.0, 40.0, 20.0);
        nudge(&original, &mut proposed, &obstacle);
        assert_eq!(proposed, rect(60.0, 0.0, 40.0, 20.0));

        // coming from the right
        let original = rect(200.0, 0.0, 40.0, 20.0);
        let mut proposed = rect(140.0, 0.0, 40.0, 20.0);
        nudge(&original, &mut proposed, &obstacle);
        assert_eq!(proposed, rect(150.0, 0.0, 40.0, 20.0));
    }

    #[test]
    fn nudge_leaves_axes_without_prior_separation() {
        let obstacle = rect(0.0, 0.0, 50.0, 50.0);
        let original = rect(10.0, 60.0, 20.0, 20.0);
        let mut proposed = rect(12.0, 40.0, 20.0, 20.0);
        nudge(&original, &mut proposed, &obstacle);
        assert_eq!(proposed, rect(12.0, 50.0, 20.0, 20.0));
    }
}
