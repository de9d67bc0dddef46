mod common;

use bvtree::{BoundablePointSet, BvError, BvTree, VolumeKind};
use common::{assert_tree_invariants, covered_indices, random_sets};
use glam::DVec3;

#[test]
fn test_build_invariants_for_every_kind() {
    let sets = random_sets(500, 11);
    for kind in VolumeKind::ALL {
        for margin in [0.0, 0.5] {
            let tree = BvTree::with_elements(kind, sets.clone(), margin).unwrap();
            assert_tree_invariants(&tree);
            assert_eq!(tree.num_leaves(), 500, "{} should end with one set per leaf", kind);
            assert_eq!(tree.num_nodes(), 999);
            assert_eq!(covered_indices(&tree), (0..500).collect::<Vec<_>>());
            assert!(tree.nodes().iter().all(|n| n.margin() == margin));
            assert_eq!(tree.kind(), kind);
        }
    }
}

#[test]
fn test_leaf_lookup_is_contiguous() {
    let tree = BvTree::with_elements(VolumeKind::Aabb, random_sets(64, 2), 0.0).unwrap();
    for i in 0..tree.num_leaves() {
        let leaf = tree.leaf(i).unwrap();
        assert_eq!(leaf.index(), tree.leaves_offset() + i);
        assert!(leaf.is_leaf());
        assert_eq!(tree.node(leaf.index()).unwrap().index(), leaf.index());
    }
    assert!(matches!(tree.leaf(64), Err(BvError::LeafOutOfRange { .. })));
    assert!(matches!(tree.node(tree.num_nodes()), Err(BvError::NodeOutOfRange { .. })));
}

#[test]
fn test_empty_and_single_element() {
    let mut tree: BvTree<BoundablePointSet> = BvTree::new(VolumeKind::Obb, 0.0).unwrap();
    tree.build(Vec::new(), 0.0).unwrap();
    assert!(tree.is_empty());
    assert_eq!(tree.num_nodes(), 1);
    assert_eq!(tree.num_leaves(), 1);
    assert_tree_invariants(&tree);

    tree.build(vec![BoundablePointSet::new(0, vec![DVec3::new(1.0, 2.0, 3.0)])], 0.1).unwrap();
    assert!(!tree.is_empty());
    assert_eq!(tree.num_nodes(), 1);
    assert!(tree.root().is_leaf());
    assert_eq!(tree.root().num_elements(), 1);
    assert!((tree.radius() - 0.0).abs() < 1e-12);
}

#[test]
fn test_coincident_centroids_stay_in_one_leaf() {
    let mut sets: Vec<_> = (0..4).map(|i| BoundablePointSet::new(i, vec![DVec3::splat(5.0)])).collect();
    sets.push(BoundablePointSet::new(4, vec![DVec3::splat(-5.0)]));
    for kind in VolumeKind::ALL {
        let tree = BvTree::with_elements(kind, sets.clone(), 0.0).unwrap();
        assert_tree_invariants(&tree);
        assert_eq!(tree.num_leaves(), 2, "{}", kind);
        let mut sizes: Vec<usize> = tree.leaves().iter().map(|l| l.num_elements()).collect();
        sizes.sort();
        assert_eq!(sizes, vec![1, 4]);
    }
}

#[test]
fn test_failed_build_keeps_previous_tree() {
    let mut tree = BvTree::with_elements(VolumeKind::Sphere, random_sets(10, 5), 0.0).unwrap();
    let before = tree.num_nodes();
    let err = tree.build(random_sets(20, 6), -1.0).unwrap_err();
    assert_eq!(err, BvError::InvalidMargin(-1.0));
    assert_eq!(tree.num_nodes(), before);
    assert_eq!(covered_indices(&tree), (0..10).collect::<Vec<_>>());
}

#[test]
fn test_rebuild_replaces_contents() {
    let mut tree = BvTree::with_elements(VolumeKind::Aabb, random_sets(30, 8), 0.0).unwrap();
    tree.build(random_sets(7, 9), 0.2).unwrap();
    assert_eq!(tree.num_leaves(), 7);
    assert_eq!(tree.margin(), 0.2);
    assert_tree_invariants(&tree);
}

#[test]
fn test_radius_encloses_everything() {
    let sets = random_sets(100, 3);
    for kind in VolumeKind::ALL {
        let tree = BvTree::with_elements(kind, sets.clone(), 0.0).unwrap();
        let sphere = tree.root().bounding_sphere();
        assert_eq!(sphere.radius(), tree.radius());
        for set in &sets {
            for &p in set.points() {
                assert!(sphere.center().distance(p) <= tree.radius() + 1e-9, "{}", kind);
            }
        }
    }
}
