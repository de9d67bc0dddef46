//! Bottom-up refit of node volumes after elements moved.
//!
//! Topology is never touched. Children always sit at larger arena indices
//! than their parent, so walking the arena backwards visits every child
//! before its parent. [`BvTree::update_bounds_up`] is the incremental form:
//! it only grows the volumes above one element.

use crate::boundable::Boundable;
use crate::error::{BvError, Result};
use crate::node::BvNode;
use crate::tree::BvTree;
use crate::volume::BoundingVolume;
use rayon::prelude::*;

fn child_volumes<B>(nodes: &[BvNode<B>], node: &BvNode<B>) -> Vec<BoundingVolume> {
    node.children.iter().map(|&c| nodes[c].volume).collect()
}

impl<B: Boundable> BvTree<B> {
    /// Recomputes every volume from the current element geometry.
    pub fn update(&mut self) {
        let nodes = self.nodes_mut();
        for i in (0..nodes.len()).rev() {
            if nodes[i].is_leaf() {
                let node = &mut nodes[i];
                node.volume.bound(&node.elements);
            } else {
                let volumes = child_volumes(&nodes[..], &nodes[i]);
                nodes[i].volume.bound(&volumes);
            }
        }
        log::debug!("refitted {} nodes", nodes.len());
    }

    /// Grows the volumes of one leaf and its ancestors so that they enclose
    /// element `element` of leaf `leaf` again, typically after it moved.
    ///
    /// The walk stops at the first ancestor that already enclosed its child.
    /// Volumes never shrink here; use [`update`](Self::update) for a tight
    /// refit. Returns `true` if the leaf volume had to grow.
    pub fn update_bounds_up(&mut self, leaf: usize, element: usize) -> Result<bool> {
        let mut child = self.leaf(leaf)?.index();
        let nodes = self.nodes_mut();

        let node = &mut nodes[child];
        let len = node.elements.len();
        let grew = match node.elements.get(element) {
            Some(e) => e.update_bv(&mut node.volume),
            None => return Err(BvError::ElementOutOfRange { index: element, len }),
        };
        if !grew {
            return Ok(false);
        }

        let mut levels = 0;
        while let Some(parent) = nodes[child].parent {
            let volume = nodes[child].volume;
            if !volume.update_bv(&mut nodes[parent].volume) {
                break;
            }
            child = parent;
            levels += 1;
        }
        log::trace!("grew leaf {} and {} ancestors", leaf, levels);
        Ok(true)
    }
}

impl<B: Boundable + Send + Sync> BvTree<B> {
    /// Same result as [`update`](Self::update), on the global rayon pool.
    ///
    /// Leaves are refitted together, then internal nodes one depth level at
    /// a time, deepest level first.
    pub fn parallel_update(&mut self) {
        let leaves_idx = self.leaves_offset();
        let nodes = self.nodes_mut();

        nodes[leaves_idx..]
            .par_iter_mut()
            .for_each(|node| node.volume.bound(&node.elements));

        let levels = internal_levels(&nodes[..leaves_idx]);
        for level in levels.iter().rev() {
            let snapshot: &[BvNode<B>] = &nodes[..];
            let refitted: Vec<(usize, BoundingVolume)> = level
                .par_iter()
                .map(|&i| {
                    let mut volume = snapshot[i].volume;
                    volume.bound(&child_volumes(snapshot, &snapshot[i]));
                    (i, volume)
                })
                .collect();
            for (i, volume) in refitted {
                nodes[i].volume = volume;
            }
        }
        log::debug!("refitted {} nodes in parallel", nodes.len());
    }
}

/// Internal node indices grouped by depth, root level first.
fn internal_levels<B>(internal: &[BvNode<B>]) -> Vec<Vec<usize>> {
    let mut depth = vec![0usize; internal.len()];
    let mut levels: Vec<Vec<usize>> = Vec::new();
    for (i, node) in internal.iter().enumerate() {
        let d = node.parent.map_or(0, |p| depth[p] + 1);
        depth[i] = d;
        if levels.len() <= d {
            levels.resize_with(d + 1, Vec::new);
        }
        levels[d].push(i);
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundable::BoundablePointSet;
    use crate::config::VolumeKind;
    use glam::DVec3;

    fn grid(n: usize) -> Vec<BoundablePointSet> {
        (0..n * n)
            .map(|i| BoundablePointSet::new(i, vec![DVec3::new((i % n) as f64, (i / n) as f64, 0.0)]))
            .collect()
    }

    #[test]
    fn test_levels_follow_parent_links() {
        let tree = BvTree::with_elements(VolumeKind::Aabb, grid(4), 0.0).unwrap();
        let levels = internal_levels(&tree.nodes()[..tree.leaves_offset()]);
        assert_eq!(levels[0], vec![0]);
        for (d, level) in levels.iter().enumerate() {
            for &i in level {
                assert_eq!(tree.depth(i).unwrap(), d);
            }
        }
        assert_eq!(levels.iter().map(Vec::len).sum::<usize>(), tree.leaves_offset());
    }

    #[test]
    fn test_update_is_idempotent_without_motion() {
        for kind in VolumeKind::ALL {
            let mut tree = BvTree::with_elements(kind, grid(5), 0.1).unwrap();
            let before: Vec<BoundingVolume> = tree.nodes().iter().map(|n| *n.volume()).collect();
            tree.update();
            let after: Vec<BoundingVolume> = tree.nodes().iter().map(|n| *n.volume()).collect();
            assert_eq!(before, after, "{kind}");
        }
    }

    #[test]
    fn test_update_bounds_up_grows_only_the_ancestor_chain() {
        for kind in VolumeKind::ALL {
            let mut tree = BvTree::with_elements(kind, grid(6), 0.0).unwrap();
            let before: Vec<BoundingVolume> = tree.nodes().iter().map(|n| *n.volume()).collect();

            let leaf = 11;
            let moved = DVec3::new(9.0, 2.0, 3.0);
            tree.elements_mut(leaf).unwrap()[0].points_mut()[0] = moved;
            assert!(tree.update_bounds_up(leaf, 0).unwrap(), "{kind}");

            let mut chain = Vec::new();
            let mut node = Some(tree.leaves_offset() + leaf);
            while let Some(i) = node {
                chain.push(i);
                node = tree.nodes()[i].parent();
            }
            for (i, node) in tree.nodes().iter().enumerate() {
                if chain.contains(&i) {
                    assert!(node.volume().intersects_point(moved), "{kind}: node {i} misses the moved point");
                } else {
                    assert_eq!(node.volume(), &before[i], "{kind}: node {i} is off the chain");
                }
            }
            assert!(!tree.update_bounds_up(leaf, 0).unwrap(), "{kind}: second call grew again");
        }
    }

    #[test]
    fn test_update_bounds_up_rejects_bad_indices() {
        let mut tree = BvTree::with_elements(VolumeKind::Aabb, grid(3), 0.0).unwrap();
        assert!(matches!(tree.update_bounds_up(9, 0), Err(BvError::LeafOutOfRange { index: 9, len: 9 })));
        assert_eq!(
            tree.update_bounds_up(0, 1),
            Err(BvError::ElementOutOfRange { index: 1, len: 1 })
        );
        assert_eq!(tree.update_bounds_up(0, 0), Ok(false));
    }

    #[test]
    fn test_parallel_update_matches_sequential() {
        let mut a = BvTree::with_elements(VolumeKind::Obb, grid(6), 0.05).unwrap();
        let mut b = a.clone();
        for leaf in [0, 7, 20] {
            for e in a.elements_mut(leaf).unwrap() {
                e.points_mut()[0] += DVec3::new(0.3, -0.2, 1.0);
            }
            for e in b.elements_mut(leaf).unwrap() {
                e.points_mut()[0] += DVec3::new(0.3, -0.2, 1.0);
            }
        }
        a.update();
        b.parallel_update();
        for (x, y) in a.nodes().iter().zip(b.nodes()) {
            assert_eq!(x.volume(), y.volume(), "node {}", x.index());
        }
    }
}
