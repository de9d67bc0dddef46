use crate::build::Flattened;
use crate::config::VolumeKind;
use crate::error::{check_margin, BvError, Result};
use crate::node::BvNode;
use crate::volume::BoundingVolume;

/// A bounding-volume hierarchy over elements of type `B`.
///
/// All nodes live in one arena. The root is at index 0, internal nodes come
/// first and leaves occupy the trailing range
/// `[leaves_offset(), leaves_offset() + num_leaves())`.
///
/// A fresh tree holds a single empty leaf. Use [`build`](Self::build) or
/// [`parallel_build`](Self::parallel_build) to index elements, then
/// [`update`](Self::update) after moving them.
#[derive(Clone, Debug)]
pub struct BvTree<B> {
    kind: VolumeKind,
    margin: f64,
    nodes: Vec<BvNode<B>>,
    leaves_idx: usize,
    num_leaves: usize,
}

impl<B> BvTree<B> {
    /// Creates an empty tree whose nodes will use volumes of `kind`.
    pub fn new(kind: VolumeKind, margin: f64) -> Result<Self> {
        let margin = check_margin(margin)?;
        Ok(Self {
            kind,
            margin,
            nodes: vec![empty_root(kind, margin)],
            leaves_idx: 0,
            num_leaves: 1,
        })
    }

    pub(crate) fn install(&mut self, flattened: Flattened<B>, margin: f64) {
        let Flattened {
            nodes,
            leaves_idx,
            num_leaves,
        } = flattened;
        self.margin = margin;
        if nodes.is_empty() {
            self.nodes = vec![empty_root(self.kind, margin)];
            self.leaves_idx = 0;
            self.num_leaves = 1;
        } else {
            self.nodes = nodes;
            self.leaves_idx = leaves_idx;
            self.num_leaves = num_leaves;
        }
    }

    pub fn kind(&self) -> VolumeKind {
        self.kind
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// Changes the margin of every node. Volumes are not refitted, so an
    /// [`update`](Self::update) is needed before parents enclose the wider
    /// child regions again.
    pub fn set_margin(&mut self, margin: f64) -> Result<()> {
        let margin = check_margin(margin)?;
        self.margin = margin;
        for node in &mut self.nodes {
            node.volume.set_margin(margin);
        }
        Ok(())
    }

    pub fn root(&self) -> &BvNode<B> {
        &self.nodes[0]
    }

    /// Radius of the sphere enclosing the root volume.
    pub fn radius(&self) -> f64 {
        self.root().bounding_sphere().radius()
    }

    /// `true` when no element is indexed.
    pub fn is_empty(&self) -> bool {
        let root = self.root();
        root.is_leaf() && root.elements.is_empty()
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_leaves(&self) -> usize {
        self.num_leaves
    }

    /// Arena index of the first leaf.
    pub fn leaves_offset(&self) -> usize {
        self.leaves_idx
    }

    pub fn nodes(&self) -> &[BvNode<B>] {
        &self.nodes
    }

    /// All leaves in index order.
    pub fn leaves(&self) -> &[BvNode<B>] {
        &self.nodes[self.leaves_idx..self.leaves_idx + self.num_leaves]
    }

    pub fn node(&self, index: usize) -> Result<&BvNode<B>> {
        self.nodes.get(index).ok_or(BvError::NodeOutOfRange {
            index,
            len: self.nodes.len(),
        })
    }

    /// The `index`-th leaf, counted from [`leaves_offset`](Self::leaves_offset).
    pub fn leaf(&self, index: usize) -> Result<&BvNode<B>> {
        self.leaves().get(index).ok_or(BvError::LeafOutOfRange {
            index,
            len: self.num_leaves,
        })
    }

    /// Mutable access to the elements of one leaf, to move them before an
    /// [`update`](Self::update).
    pub fn elements_mut(&mut self, leaf: usize) -> Result<&mut [B]> {
        if leaf >= self.num_leaves {
            return Err(BvError::LeafOutOfRange {
                index: leaf,
                len: self.num_leaves,
            });
        }
        Ok(&mut self.nodes[self.leaves_idx + leaf].elements)
    }

    /// Number of edges from `index` up to the root.
    pub fn depth(&self, index: usize) -> Result<usize> {
        let mut node = self.node(index)?;
        let mut depth = 0;
        while let Some(parent) = node.parent {
            node = &self.nodes[parent];
            depth += 1;
        }
        Ok(depth)
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut Vec<BvNode<B>> {
        &mut self.nodes
    }
}

impl<B: crate::Boundable> BvTree<B> {
    /// Creates a tree and builds it from `elements` in one go.
    pub fn with_elements(kind: VolumeKind, elements: Vec<B>, margin: f64) -> Result<Self> {
        let mut tree = Self::new(kind, margin)?;
        tree.build(elements, margin)?;
        Ok(tree)
    }
}

fn empty_root<B>(kind: VolumeKind, margin: f64) -> BvNode<B> {
    BvNode {
        index: 0,
        parent: None,
        volume: BoundingVolume::empty(kind, margin),
        elements: Vec::new(),
        children: Vec::new(),
    }
}
