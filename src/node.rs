use crate::volume::{BoundingSphere, BoundingVolume};

/// A node of a [`BvTree`](crate::BvTree).
///
/// Nodes live in a single arena owned by the tree; children and parent are
/// arena indices. Leaves hold elements, internal nodes hold children.
#[derive(Clone, Debug)]
pub struct BvNode<B> {
    pub(crate) index: usize,
    pub(crate) parent: Option<usize>,
    pub(crate) volume: BoundingVolume,
    pub(crate) elements: Vec<B>,
    pub(crate) children: Vec<usize>,
}

impl<B> BvNode<B> {
    /// Position of this node in the tree's node arena.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Arena index of the parent, `None` for the root.
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn volume(&self) -> &BoundingVolume {
        &self.volume
    }

    pub fn bounding_sphere(&self) -> BoundingSphere {
        self.volume.bounding_sphere()
    }

    pub fn margin(&self) -> f64 {
        self.volume.margin()
    }

    pub fn elements(&self) -> &[B] {
        &self.elements
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    /// Arena indices of the children.
    pub fn children(&self) -> &[usize] {
        &self.children
    }

    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
