//! Tree construction.
//!
//! Construction works on [`Branch`], an owned build-time subtree, so that
//! workers can take exclusive ownership of the part they split. The finished
//! subtree is then flattened into the node arena of [`BvTree`].

use crate::boundable::Boundable;
use crate::config::{ParallelConfig, VolumeKind};
use crate::error::{check_margin, Result};
use crate::node::BvNode;
use crate::tree::BvTree;
use crate::volume::BoundingVolume;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Index counters shared by every task of one build.
///
/// Internal nodes and leaves are numbered separately; leaf `j` ends up at
/// arena position `internal_count() + j`, keeping leaves contiguous.
#[derive(Debug, Default)]
pub(crate) struct IndexCounters {
    nodes: AtomicUsize,
    leaves: AtomicUsize,
}

impl IndexCounters {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn next_node(&self) -> usize {
        self.nodes.fetch_add(1, Ordering::Relaxed)
    }

    fn next_leaf(&self) -> usize {
        self.leaves.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn internal_count(&self) -> usize {
        self.nodes.load(Ordering::Acquire)
    }

    pub(crate) fn leaf_count(&self) -> usize {
        self.leaves.load(Ordering::Acquire)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Slot {
    Unassigned,
    Internal(usize),
    Leaf(usize),
}

/// A build-time node that owns its children directly.
#[derive(Debug)]
pub(crate) struct Branch<B> {
    pub(crate) volume: BoundingVolume,
    pub(crate) elements: Vec<B>,
    pub(crate) children: Vec<Branch<B>>,
    pub(crate) slot: Slot,
}

impl<B: Boundable> Branch<B> {
    pub(crate) fn new(elements: Vec<B>, kind: VolumeKind, margin: f64) -> Self {
        Self {
            volume: BoundingVolume::empty(kind, margin),
            elements,
            children: Vec::new(),
            slot: Slot::Unassigned,
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Splits this node's elements one level down.
    ///
    /// On success the node becomes internal with two children that inherit
    /// its kind and margin. Returns `false` and leaves the node untouched for
    /// one element or fewer, or when the elements cannot be separated.
    pub(crate) fn grow(&mut self) -> bool {
        if self.elements.len() <= 1 {
            return false;
        }
        self.volume.bound(&self.elements);
        let elements = std::mem::take(&mut self.elements);
        match self.volume.split(elements) {
            Ok((left, right)) => {
                self.children = vec![self.spawn_child(left), self.spawn_child(right)];
                true
            }
            Err(elements) => {
                log::trace!("keeping {} coincident elements in one leaf", elements.len());
                self.elements = elements;
                false
            }
        }
    }

    fn spawn_child(&self, elements: Vec<B>) -> Branch<B> {
        Branch::new(elements, self.volume.kind(), self.volume.margin())
    }

    /// Applies [`grow`](Self::grow) depth-first until no node can split further.
    pub(crate) fn grow_recursively(&mut self) -> bool {
        let mut grew = self.grow();
        for child in &mut self.children {
            grew |= child.grow_recursively();
        }
        grew
    }

    /// Recomputes every volume in the subtree, children before parents.
    pub(crate) fn update_bounds(&mut self) {
        for child in &mut self.children {
            child.update_bounds();
        }
        self.bound_self();
    }

    /// Refits this node's volume from its elements or its children's volumes.
    fn bound_self(&mut self) {
        if self.is_leaf() {
            self.volume.bound(&self.elements);
        } else {
            let volumes: Vec<BoundingVolume> = self.children.iter().map(|c| c.volume).collect();
            self.volume.bound(&volumes);
        }
    }

    /// Numbers the subtree depth-first, parents before children.
    pub(crate) fn assign_indices(&mut self, counters: &IndexCounters) {
        self.slot = if self.is_leaf() {
            Slot::Leaf(counters.next_leaf())
        } else {
            Slot::Internal(counters.next_node())
        };
        for child in &mut self.children {
            child.assign_indices(counters);
        }
    }
}

/// Grows, numbers and bounds a subtree, splitting work across the current
/// rayon pool. Subtrees smaller than `min_parallel` are built inline.
pub(crate) fn build_parallel<B>(mut branch: Branch<B>, counters: &IndexCounters, min_parallel: usize) -> Branch<B>
where
    B: Boundable + Send,
{
    if branch.elements.len() < min_parallel {
        branch.grow_recursively();
        branch.assign_indices(counters);
        branch.update_bounds();
        return branch;
    }

    // The split is the serial, data-dependent step; the index is reserved
    // as soon as its outcome is known.
    if !branch.grow() {
        branch.slot = Slot::Leaf(counters.next_leaf());
        branch.bound_self();
        return branch;
    }
    branch.slot = Slot::Internal(counters.next_node());

    let children = std::mem::take(&mut branch.children);
    branch.children = match <[Branch<B>; 2]>::try_from(children) {
        Ok([left, right]) => {
            let (left, right) = rayon::join(
                || build_parallel(left, counters, min_parallel),
                || build_parallel(right, counters, min_parallel),
            );
            vec![left, right]
        }
        Err(children) => children
            .into_par_iter()
            .map(|child| build_parallel(child, counters, min_parallel))
            .collect(),
    };
    branch.bound_self();
    branch
}

/// Arena produced from a numbered subtree.
#[derive(Debug)]
pub(crate) struct Flattened<B> {
    pub(crate) nodes: Vec<BvNode<B>>,
    pub(crate) leaves_idx: usize,
    pub(crate) num_leaves: usize,
}

pub(crate) fn flatten<B>(root: Branch<B>, counters: &IndexCounters) -> Flattened<B> {
    let leaves_idx = counters.internal_count();
    let num_leaves = counters.leaf_count();
    let total = leaves_idx + num_leaves;

    let mut slots: Vec<Option<BvNode<B>>> = std::iter::repeat_with(|| None).take(total).collect();
    place(root, None, leaves_idx, &mut slots);

    let nodes: Vec<BvNode<B>> = slots.into_iter().flatten().collect();
    debug_assert_eq!(nodes.len(), total, "every reserved index must be filled");
    Flattened {
        nodes,
        leaves_idx,
        num_leaves,
    }
}

fn place<B>(branch: Branch<B>, parent: Option<usize>, leaves_idx: usize, slots: &mut [Option<BvNode<B>>]) -> usize {
    let index = match branch.slot {
        Slot::Internal(i) => i,
        Slot::Leaf(j) => leaves_idx + j,
        Slot::Unassigned => unreachable!("branch flattened before it was numbered"),
    };
    let children = branch
        .children
        .into_iter()
        .map(|child| place(child, Some(index), leaves_idx, slots))
        .collect();
    slots[index] = Some(BvNode {
        index,
        parent,
        volume: branch.volume,
        elements: branch.elements,
        children,
    });
    index
}

/// Runs `f` on a dedicated pool of `max_threads` workers, or on the global
/// rayon pool when `max_threads` is zero.
pub(crate) fn run_in_pool<R, F>(max_threads: usize, f: F) -> Result<R>
where
    R: Send,
    F: FnOnce() -> R + Send,
{
    if max_threads == 0 {
        return Ok(f());
    }
    let pool = rayon::ThreadPoolBuilder::new().num_threads(max_threads).build()?;
    Ok(pool.install(f))
}

impl<B: Boundable> BvTree<B> {
    /// Rebuilds the tree from `elements`, discarding the previous structure.
    ///
    /// The root holds every element and is split recursively along the
    /// widest axis of its volume. On error the tree is left unchanged.
    pub fn build(&mut self, elements: Vec<B>, margin: f64) -> Result<()> {
        let margin = check_margin(margin)?;
        let count = elements.len();

        let mut root = Branch::new(elements, self.kind(), margin);
        root.grow_recursively();
        root.update_bounds();
        let counters = IndexCounters::new();
        root.assign_indices(&counters);

        self.install(flatten(root, &counters), margin);
        log::debug!(
            "built {} tree: {} elements, {} nodes, {} leaves",
            self.kind(),
            count,
            self.num_nodes(),
            self.num_leaves()
        );
        Ok(())
    }
}

impl<B: Boundable + Send> BvTree<B> {
    /// Same result as [`build`](Self::build), with subtrees built concurrently.
    ///
    /// `max_threads == 0` uses the global rayon pool. Blocks until every
    /// spawned task has finished.
    pub fn parallel_build(&mut self, elements: Vec<B>, margin: f64, max_threads: usize) -> Result<()> {
        self.parallel_build_with(elements, margin, &ParallelConfig::new(max_threads))
    }

    pub fn parallel_build_with(&mut self, elements: Vec<B>, margin: f64, config: &ParallelConfig) -> Result<()> {
        let margin = check_margin(margin)?;
        let count = elements.len();
        let min_parallel = config.min_parallel_elements.max(2);

        let root = Branch::new(elements, self.kind(), margin);
        let counters = IndexCounters::new();
        let root = run_in_pool(config.max_threads, || build_parallel(root, &counters, min_parallel))?;

        self.install(flatten(root, &counters), margin);
        log::debug!(
            "built {} tree in parallel: {} elements, {} nodes, {} leaves",
            self.kind(),
            count,
            self.num_nodes(),
            self.num_leaves()
        );
        Ok(())
    }
}
