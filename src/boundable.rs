//! The capability every element stored in a [`BvTree`](crate::BvTree) must provide,
//! and two point-set adapters implementing it.

use crate::geometry::outer;
use crate::volume::BoundingVolume;
use glam::{DMat3, DVec3};
use std::sync::{Arc, PoisonError, RwLock};

/// Something that can be enclosed by a bounding volume.
///
/// Only the centroid and the two distance queries are needed for queries; the
/// build additionally asks each element to grow a volume around itself.
pub trait Boundable {
    /// Representative point used for splitting.
    fn centroid(&self) -> DVec3;

    /// Distance from `point` to this element, and the nearest point on it.
    fn distance_to_point(&self, point: DVec3) -> (f64, DVec3);

    /// Distance travelled from `point` along `dir` until the element is hit.
    ///
    /// Returns `f64::INFINITY` when the direction constraint cannot be
    /// satisfied, which is the default.
    fn distance_to_point_along(&self, point: DVec3, _dir: DVec3) -> (f64, DVec3) {
        (f64::INFINITY, point)
    }

    /// Grows `bv` until it encloses this element. Returns `true` if `bv` changed.
    fn update_bv(&self, bv: &mut BoundingVolume) -> bool;

    /// Adds this element's scatter about `center` to `cov` and returns the
    /// number of samples it contributed. Used to orient oriented boxes.
    fn accumulate_covariance(&self, center: DVec3, cov: &mut DMat3) -> usize {
        let d = self.centroid() - center;
        *cov += outer(d, d);
        1
    }
}

impl<T: Boundable + ?Sized> Boundable for &T {
    fn centroid(&self) -> DVec3 {
        (**self).centroid()
    }

    fn distance_to_point(&self, point: DVec3) -> (f64, DVec3) {
        (**self).distance_to_point(point)
    }

    fn distance_to_point_along(&self, point: DVec3, dir: DVec3) -> (f64, DVec3) {
        (**self).distance_to_point_along(point, dir)
    }

    fn update_bv(&self, bv: &mut BoundingVolume) -> bool {
        (**self).update_bv(bv)
    }

    fn accumulate_covariance(&self, center: DVec3, cov: &mut DMat3) -> usize {
        (**self).accumulate_covariance(center, cov)
    }
}

impl<T: Boundable + ?Sized> Boundable for Arc<T> {
    fn centroid(&self) -> DVec3 {
        (**self).centroid()
    }

    fn distance_to_point(&self, point: DVec3) -> (f64, DVec3) {
        (**self).distance_to_point(point)
    }

    fn distance_to_point_along(&self, point: DVec3, dir: DVec3) -> (f64, DVec3) {
        (**self).distance_to_point_along(point, dir)
    }

    fn update_bv(&self, bv: &mut BoundingVolume) -> bool {
        (**self).update_bv(bv)
    }

    fn accumulate_covariance(&self, center: DVec3, cov: &mut DMat3) -> usize {
        (**self).accumulate_covariance(center, cov)
    }
}

impl<T: Boundable + ?Sized> Boundable for Box<T> {
    fn centroid(&self) -> DVec3 {
        (**self).centroid()
    }

    fn distance_to_point(&self, point: DVec3) -> (f64, DVec3) {
        (**self).distance_to_point(point)
    }

    fn distance_to_point_along(&self, point: DVec3, dir: DVec3) -> (f64, DVec3) {
        (**self).distance_to_point_along(point, dir)
    }

    fn update_bv(&self, bv: &mut BoundingVolume) -> bool {
        (**self).update_bv(bv)
    }

    fn accumulate_covariance(&self, center: DVec3, cov: &mut DMat3) -> usize {
        (**self).accumulate_covariance(center, cov)
    }
}

/// A set of points owned by value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoundablePointSet {
    index: usize,
    points: Vec<DVec3>,
}

impl BoundablePointSet {
    pub fn new(index: usize, points: Vec<DVec3>) -> Self {
        Self { index, points }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub fn points(&self) -> &[DVec3] {
        &self.points
    }

    /// Mutable access for moving points in place. Call
    /// [`BvTree::update`](crate::BvTree::update) afterwards.
    pub fn points_mut(&mut self) -> &mut [DVec3] {
        &mut self.points
    }

    pub fn set_points(&mut self, points: Vec<DVec3>) {
        self.points = points;
    }

    pub fn add_point(&mut self, point: DVec3) {
        self.points.push(point);
    }
}

impl Boundable for BoundablePointSet {
    fn centroid(&self) -> DVec3 {
        centroid_of(self.points.iter().copied())
    }

    fn distance_to_point(&self, point: DVec3) -> (f64, DVec3) {
        nearest_of(self.points.iter().copied(), point)
    }

    fn update_bv(&self, bv: &mut BoundingVolume) -> bool {
        self.points.iter().fold(false, |changed, &p| bv.update_point(p) | changed)
    }

    fn accumulate_covariance(&self, center: DVec3, cov: &mut DMat3) -> usize {
        for &p in &self.points {
            let d = p - center;
            *cov += outer(d, d);
        }
        self.points.len()
    }
}

/// A point that may be referenced by several [`SharedPointSet`]s and moved
/// from outside the tree.
pub type SharedPoint = Arc<RwLock<DVec3>>;

/// Creates a new [`SharedPoint`].
pub fn shared_point(p: DVec3) -> SharedPoint {
    Arc::new(RwLock::new(p))
}

/// A set of points referenced through shared handles, so that the same point
/// can belong to several sets and be moved without touching the tree.
#[derive(Clone, Debug, Default)]
pub struct SharedPointSet {
    index: usize,
    points: Vec<SharedPoint>,
}

impl SharedPointSet {
    pub fn new(index: usize, points: Vec<SharedPoint>) -> Self {
        Self { index, points }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub fn points(&self) -> &[SharedPoint] {
        &self.points
    }

    pub fn set_points(&mut self, points: Vec<SharedPoint>) {
        self.points = points;
    }

    pub fn add_point(&mut self, point: SharedPoint) {
        self.points.push(point);
    }

    fn positions(&self) -> impl Iterator<Item = DVec3> + '_ {
        // A writer that panicked cannot leave a DVec3 half-written.
        self.points
            .iter()
            .map(|p| *p.read().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Boundable for SharedPointSet {
    fn centroid(&self) -> DVec3 {
        centroid_of(self.positions())
    }

    fn distance_to_point(&self, point: DVec3) -> (f64, DVec3) {
        nearest_of(self.positions(), point)
    }

    fn update_bv(&self, bv: &mut BoundingVolume) -> bool {
        self.positions().fold(false, |changed, p| bv.update_point(p) | changed)
    }

    fn accumulate_covariance(&self, center: DVec3, cov: &mut DMat3) -> usize {
        let mut n = 0;
        for p in self.positions() {
            let d = p - center;
            *cov += outer(d, d);
            n += 1;
        }
        n
    }
}

fn centroid_of(points: impl Iterator<Item = DVec3>) -> DVec3 {
    let (sum, n) = points.fold((DVec3::ZERO, 0usize), |(s, n), p| (s + p, n + 1));
    if n == 0 { DVec3::ZERO } else { sum / n as f64 }
}

fn nearest_of(points: impl Iterator<Item = DVec3>, query: DVec3) -> (f64, DVec3) {
    let mut best = (f64::INFINITY, query);
    for p in points {
        let d2 = p.distance_squared(query);
        if d2 < best.0 {
            best = (d2, p);
        }
    }
    (best.0.sqrt(), best.1)
}
