use crate::boundable::Boundable;
use crate::node::BvNode;
use crate::tree::BvTree;
use crate::volume::BoundingVolume;
use glam::DVec3;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Result of a nearest-element search.
#[derive(Debug)]
pub struct Nearest<'a, B> {
    /// The closest element.
    pub element: &'a B,
    /// The leaf holding `element`.
    pub leaf: &'a BvNode<B>,
    /// Nearest point on `element`.
    pub point: DVec3,
    pub distance: f64,
}

impl<B> Clone for Nearest<'_, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B> Copy for Nearest<'_, B> {}

struct SearchItem {
    bound: f64,
    node: usize,
}

impl PartialEq for SearchItem {
    fn eq(&self, other: &Self) -> bool {
        self.bound == other.bound
    }
}

impl Eq for SearchItem {}

impl PartialOrd for SearchItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        // Reverse ordering for Min-Heap behavior
        other.bound.partial_cmp(&self.bound)
    }
}

impl Ord for SearchItem {
    fn cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other).unwrap_or(Ordering::Equal)
    }
}

impl<B: Boundable> BvTree<B> {
    /// The element closest to `point`.
    ///
    /// Returns `None` only for an empty tree.
    pub fn nearest_boundable(&self, point: DVec3) -> Option<Nearest<'_, B>> {
        self.branch_and_bound(|v| v.distance_to_point(point).0, |e| e.distance_to_point(point))
    }

    /// The first element hit when travelling from `point` along `dir`.
    ///
    /// Elements that cannot be reached this way report an infinite distance
    /// and are never returned, so the result is `None` when nothing is hit.
    pub fn nearest_boundable_along(&self, point: DVec3, dir: DVec3) -> Option<Nearest<'_, B>> {
        self.branch_and_bound(
            |v| v.distance_to_point_along(point, dir).0,
            |e| e.distance_to_point_along(point, dir),
        )
    }

    /// Best-first search over nodes keyed by a lower bound on the distance
    /// to anything inside them. Stops once the closest pending bound is
    /// farther than the best element found.
    fn branch_and_bound<F, G>(&self, node_bound: F, element_distance: G) -> Option<Nearest<'_, B>>
    where
        F: Fn(&BoundingVolume) -> f64,
        G: Fn(&B) -> (f64, DVec3),
    {
        if self.is_empty() {
            return None;
        }
        let nodes = self.nodes();
        let mut queue = BinaryHeap::new();
        queue.push(SearchItem {
            bound: node_bound(&nodes[0].volume),
            node: 0,
        });

        let mut best: Option<Nearest<'_, B>> = None;

        while let Some(item) = queue.pop() {
            if !item.bound.is_finite() || best.is_some_and(|b| item.bound > b.distance) {
                break;
            }
            let node = &nodes[item.node];
            if node.is_leaf() {
                for element in &node.elements {
                    let (distance, point) = element_distance(element);
                    if distance.is_finite() && best.map_or(true, |b| distance < b.distance) {
                        best = Some(Nearest {
                            element,
                            leaf: node,
                            point,
                            distance,
                        });
                    }
                }
            } else {
                for &child in &node.children {
                    let bound = node_bound(&nodes[child].volume);
                    if bound.is_finite() && best.map_or(true, |b| bound <= b.distance) {
                        queue.push(SearchItem { bound, node: child });
                    }
                }
            }
        }
        best
    }
}
