#![allow(dead_code)]

use bvtree::{Boundable, BoundablePointSet, BoundingVolume, BvTree};
use glam::DVec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub fn random_sets(n: usize, seed: u64) -> Vec<BoundablePointSet> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let c = DVec3::new(rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0));
            let pts = (0..rng.gen_range(1..5))
                .map(|_| c + DVec3::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
                .collect();
            BoundablePointSet::new(i, pts)
        })
        .collect()
}

/// Checks arena layout, parent links, containment of every point by every
/// node on its path to the root, and containment of each node's inflated
/// region by its parent.
pub fn assert_tree_invariants(tree: &BvTree<BoundablePointSet>) {
    let nodes = tree.nodes();
    let offset = tree.leaves_offset();
    assert_eq!(nodes.len(), tree.num_nodes());
    assert_eq!(offset + tree.num_leaves(), tree.num_nodes(), "leaves must be the trailing range");
    assert!(tree.root().is_root());

    for (i, node) in nodes.iter().enumerate() {
        assert_eq!(node.index(), i);
        assert_eq!(node.is_leaf(), i >= offset, "node {} is on the wrong side of the leaf offset", i);
        if node.is_leaf() {
            assert!(node.num_elements() >= 1 || tree.is_empty());
        } else {
            assert!(node.num_children() >= 2, "internal node {} has {} children", i, node.num_children());
            assert!(node.elements().is_empty());
        }
        for &c in node.children() {
            assert!(c > i, "child {} does not follow parent {}", c, i);
            assert_eq!(nodes[c].parent(), Some(i));
        }
        if i > 0 {
            assert!(node.parent().is_some(), "node {} is detached", i);
        }
    }

    for leaf in tree.leaves() {
        for set in leaf.elements() {
            for &p in set.points() {
                let mut node = Some(leaf);
                while let Some(n) = node {
                    assert!(
                        n.volume().intersects_point(p),
                        "point {:?} of set {} escapes node {} by {:e}",
                        p,
                        set.index(),
                        n.index(),
                        n.volume().distance_to_point(p).0
                    );
                    node = n.parent().map(|p| &nodes[p]);
                }
            }
        }
    }

    for node in nodes.iter().skip(1) {
        let parent = &nodes[node.parent().unwrap()];
        for p in region_samples(node.volume()) {
            assert!(
                parent.volume().intersects_point(p),
                "{:?} of node {} escapes parent {} by {:e}",
                p,
                node.index(),
                parent.index(),
                parent.volume().distance_to_point(p).0
            );
        }
    }
}

/// Extreme points of the margin-inflated region of `volume`: the corners of
/// a box, or the centre and six axis extremes of a sphere.
pub fn region_samples(volume: &BoundingVolume) -> Vec<DVec3> {
    match volume {
        BoundingVolume::Sphere(s) => {
            let (c, r) = (s.center(), s.effective_radius());
            [DVec3::X, DVec3::Y, DVec3::Z]
                .into_iter()
                .flat_map(|axis| [c + axis * r, c - axis * r])
                .chain([c])
                .collect()
        }
        BoundingVolume::Aabb(b) => (0..8).map(|i| b.effective_corner(i)).collect(),
        BoundingVolume::Obb(b) => (0..8).map(|i| b.effective_corner(i)).collect(),
    }
}

/// Sorted indices of every indexed set.
pub fn covered_indices(tree: &BvTree<BoundablePointSet>) -> Vec<usize> {
    let mut indices: Vec<usize> = tree
        .leaves()
        .iter()
        .flat_map(|l| l.elements().iter().map(|e| e.index()))
        .collect();
    indices.sort_unstable();
    indices
}

/// A solid ball, used to exercise the directional queries.
#[derive(Clone, Debug)]
pub struct Ball {
    pub center: DVec3,
    pub radius: f64,
}

impl Ball {
    pub fn new(center: DVec3, radius: f64) -> Self {
        Self { center, radius }
    }
}

impl Boundable for Ball {
    fn centroid(&self) -> DVec3 {
        self.center
    }

    fn distance_to_point(&self, point: DVec3) -> (f64, DVec3) {
        let d = point - self.center;
        let len = d.length();
        if len <= self.radius {
            (0.0, point)
        } else {
            (len - self.radius, self.center + d * (self.radius / len))
        }
    }

    fn distance_to_point_along(&self, point: DVec3, dir: DVec3) -> (f64, DVec3) {
        let u = dir.normalize();
        let oc = point - self.center;
        let b = oc.dot(u);
        let disc = b * b - (oc.length_squared() - self.radius * self.radius);
        if disc < 0.0 {
            return (f64::INFINITY, point);
        }
        let t = -b - disc.sqrt();
        if t < 0.0 {
            return (f64::INFINITY, point);
        }
        (t, point + u * t)
    }

    fn update_bv(&self, bv: &mut bvtree::BoundingVolume) -> bool {
        bv.update_sphere(self.center, self.radius)
    }
}
