//! Top-down intersection queries.
//!
//! Every query walks the tree from the root, drops a subtree as soon as its
//! volume fails the predicate and reports the leaves that pass. Only node
//! volumes are tested; checking the elements of a reported leaf is up to the
//! caller.

use crate::geometry::Plane;
use crate::node::BvNode;
use crate::tree::BvTree;
use crate::volume::BoundingVolume;
use glam::DVec3;

impl<B> BvTree<B> {
    fn leaves_where<F>(&self, passes: F) -> Vec<&BvNode<B>>
    where
        F: Fn(&BoundingVolume) -> bool,
    {
        let mut found = Vec::new();
        if self.is_empty() {
            return found;
        }
        let nodes = self.nodes();
        let mut stack = vec![0usize];
        while let Some(i) = stack.pop() {
            let node = &nodes[i];
            if !passes(&node.volume) {
                continue;
            }
            if node.is_leaf() {
                found.push(node);
            } else {
                stack.extend(node.children.iter().rev());
            }
        }
        found
    }

    /// Leaves whose volume contains `p`.
    pub fn intersect_point(&self, p: DVec3) -> Vec<&BvNode<B>> {
        self.leaves_where(|v| v.intersects_point(p))
    }

    /// Leaves whose volume overlaps the sphere of radius `r` around `c`.
    pub fn intersect_sphere(&self, c: DVec3, r: f64) -> Vec<&BvNode<B>> {
        self.leaves_where(|v| v.intersects_sphere(c, r))
    }

    /// Leaves whose volume meets the infinite line through `p` along `v`.
    pub fn intersect_line(&self, p: DVec3, v: DVec3) -> Vec<&BvNode<B>> {
        self.leaves_where(|bv| bv.intersects_line(p, v))
    }

    /// Leaves whose volume meets the half-line from `p` along `v`.
    pub fn intersect_ray(&self, p: DVec3, v: DVec3) -> Vec<&BvNode<B>> {
        self.leaves_where(|bv| bv.intersects_ray(p, v))
    }

    /// Leaves whose volume touches `plane`.
    pub fn intersect_plane(&self, plane: &Plane) -> Vec<&BvNode<B>> {
        self.leaves_where(|v| v.intersects_plane(plane))
    }

    pub fn intersect_volume(&self, volume: &BoundingVolume) -> Vec<&BvNode<B>> {
        self.leaves_where(|v| v.intersects(volume))
    }

    /// Pairs of overlapping leaves, one from each tree, as `(mine, theirs)`.
    pub fn intersect_tree<'a, 'b, B2>(&'a self, other: &'b BvTree<B2>) -> Vec<(&'a BvNode<B>, &'b BvNode<B2>)> {
        let mut pairs = Vec::new();
        if self.is_empty() || other.is_empty() {
            return pairs;
        }
        let (mine, theirs) = (self.nodes(), other.nodes());
        let mut stack = vec![(0usize, 0usize)];
        while let Some((i, j)) = stack.pop() {
            let (a, b) = (&mine[i], &theirs[j]);
            if !a.volume.intersects(&b.volume) {
                continue;
            }
            match (a.is_leaf(), b.is_leaf()) {
                (true, true) => pairs.push((a, b)),
                (false, true) => stack.extend(a.children.iter().rev().map(|&c| (c, j))),
                (true, false) => stack.extend(b.children.iter().rev().map(|&c| (i, c))),
                (false, false) => {
                    if descend_first(a, b) {
                        stack.extend(a.children.iter().rev().map(|&c| (c, j)));
                    } else {
                        stack.extend(b.children.iter().rev().map(|&c| (i, c)));
                    }
                }
            }
        }
        pairs
    }
}

/// Whether `a` is the larger side of a pair of internal nodes.
fn descend_first<B, B2>(a: &BvNode<B>, b: &BvNode<B2>) -> bool {
    match a.num_children().cmp(&b.num_children()) {
        std::cmp::Ordering::Equal => a.bounding_sphere().effective_radius() >= b.bounding_sphere().effective_radius(),
        order => order.is_gt(),
    }
}
