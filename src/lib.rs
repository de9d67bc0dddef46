//! # bvtree
//!
//! `bvtree` is a Rust library for bounding-volume hierarchies over arbitrary geometric
//! objects, designed to be used in Rust as well as compiled to WebAssembly (WASM). It
//! accelerates proximity and intersection queries in simulation and collision-detection
//! workloads.
//!
//! ## Features
//!
//! - **Three volume kinds**: spheres, axis-aligned boxes and oriented boxes, mixed freely in queries.
//! - **Parallel build**: subtrees are built on a `rayon` pool with atomic index counters.
//! - **Queries**: point, sphere, line, ray, plane, arbitrary volume and tree-vs-tree overlap.
//! - **Nearest search**: branch-and-bound nearest element, optionally along a direction.
//! - **Refit**: recompute volumes after elements move, sequentially or in parallel, or grow
//!   only the volumes above one moved element.
//! - **WASM-first**: a `PointTree` wrapper built with `wasm-bindgen`.
//!
//! ## Example
//!
//! ```
//! use bvtree::{BoundablePointSet, BvTree, VolumeKind};
//! use glam::DVec3;
//!
//! let sets: Vec<_> = (0..100)
//!     .map(|i| BoundablePointSet::new(i, vec![DVec3::new(i as f64, 0.0, 0.0)]))
//!     .collect();
//! let tree = BvTree::with_elements(VolumeKind::Aabb, sets, 0.01).unwrap();
//!
//! let hits = tree.intersect_point(DVec3::new(42.0, 0.0, 0.0));
//! assert_eq!(hits.len(), 1);
//!
//! let nearest = tree.nearest_boundable(DVec3::new(10.2, 3.0, 0.0)).unwrap();
//! assert_eq!(nearest.element.index(), 10);
//! ```
//!
//! ## Main Interface
//!
//! The primary entry point is the [`BvTree`] struct, which owns the nodes and exposes
//! build, query and refit. Elements implement [`Boundable`].

mod boundable;
mod build;
mod config;
mod error;
mod geometry;
mod nearest;
mod node;
mod query;
mod refit;
mod tree;
pub mod volume;
pub mod wasm;

pub use boundable::{shared_point, Boundable, BoundablePointSet, SharedPoint, SharedPointSet};
pub use config::{ParallelConfig, VolumeKind};
pub use error::{BvError, Result};
pub use geometry::Plane;
pub use nearest::Nearest;
pub use node::BvNode;
pub use tree::BvTree;
pub use volume::{Aabb, BoundingSphere, BoundingVolume, Obb};
