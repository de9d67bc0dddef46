//! Bounding volumes: spheres, axis-aligned boxes and oriented boxes.
//!
//! [`BoundingVolume`] is a closed sum over the three variants. Cross-variant
//! predicates are resolved with an exhaustive match; pairings that are not
//! written explicitly are forwarded to the other volume with the arguments
//! swapped.

mod aabb;
mod boxes;
mod obb;
mod sphere;

pub use aabb::Aabb;
pub use obb::Obb;
pub use sphere::BoundingSphere;

use crate::boundable::Boundable;
use crate::config::VolumeKind;
use crate::geometry::{axes_by_extent, principal_axes, Plane};
use boxes::BoxFrame;
use glam::{DMat3, DVec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoundingVolume {
    Sphere(BoundingSphere),
    Aabb(Aabb),
    Obb(Obb),
}

impl From<BoundingSphere> for BoundingVolume {
    fn from(s: BoundingSphere) -> Self {
        BoundingVolume::Sphere(s)
    }
}

impl From<Aabb> for BoundingVolume {
    fn from(b: Aabb) -> Self {
        BoundingVolume::Aabb(b)
    }
}

impl From<Obb> for BoundingVolume {
    fn from(b: Obb) -> Self {
        BoundingVolume::Obb(b)
    }
}

impl BoundingVolume {
    /// A zero-size volume of the given kind at the origin.
    pub fn empty(kind: VolumeKind, margin: f64) -> Self {
        match kind {
            VolumeKind::Sphere => BoundingSphere::raw(DVec3::ZERO, 0.0, margin).into(),
            VolumeKind::Aabb => Aabb::raw(DVec3::ZERO, DVec3::ZERO, margin).into(),
            VolumeKind::Obb => Obb::raw(DVec3::ZERO, DMat3::IDENTITY, DVec3::ZERO, margin).into(),
        }
    }

    pub fn kind(&self) -> VolumeKind {
        match self {
            BoundingVolume::Sphere(_) => VolumeKind::Sphere,
            BoundingVolume::Aabb(_) => VolumeKind::Aabb,
            BoundingVolume::Obb(_) => VolumeKind::Obb,
        }
    }

    pub fn center(&self) -> DVec3 {
        match self {
            BoundingVolume::Sphere(s) => s.center(),
            BoundingVolume::Aabb(b) => b.center(),
            BoundingVolume::Obb(b) => b.center(),
        }
    }

    pub fn margin(&self) -> f64 {
        match self {
            BoundingVolume::Sphere(s) => s.margin(),
            BoundingVolume::Aabb(b) => b.margin(),
            BoundingVolume::Obb(b) => b.margin(),
        }
    }

    pub(crate) fn set_margin(&mut self, margin: f64) {
        match self {
            BoundingVolume::Sphere(s) => s.set_margin(margin),
            BoundingVolume::Aabb(b) => b.set_margin(margin),
            BoundingVolume::Obb(b) => b.set_margin(margin),
        }
    }

    pub fn intersects_point(&self, p: DVec3) -> bool {
        match self {
            BoundingVolume::Sphere(s) => s.intersects_point(p),
            BoundingVolume::Aabb(b) => b.intersects_point(p),
            BoundingVolume::Obb(b) => b.intersects_point(p),
        }
    }

    pub fn intersects_sphere(&self, c: DVec3, r: f64) -> bool {
        match self {
            BoundingVolume::Sphere(s) => s.intersects_sphere(c, r),
            BoundingVolume::Aabb(b) => b.intersects_sphere(c, r),
            BoundingVolume::Obb(b) => b.intersects_sphere(c, r),
        }
    }

    /// Infinite line through `p` with direction `v`.
    pub fn intersects_line(&self, p: DVec3, v: DVec3) -> bool {
        match self {
            BoundingVolume::Sphere(s) => s.intersects_line(p, v),
            BoundingVolume::Aabb(b) => b.intersects_line(p, v),
            BoundingVolume::Obb(b) => b.intersects_line(p, v),
        }
    }

    /// Half-line starting at `p` with direction `v`.
    pub fn intersects_ray(&self, p: DVec3, v: DVec3) -> bool {
        match self {
            BoundingVolume::Sphere(s) => s.intersects_ray(p, v),
            BoundingVolume::Aabb(b) => b.intersects_ray(p, v),
            BoundingVolume::Obb(b) => b.intersects_ray(p, v),
        }
    }

    pub fn intersects_plane(&self, plane: &Plane) -> bool {
        match self {
            BoundingVolume::Sphere(s) => s.intersects_plane(plane),
            BoundingVolume::Aabb(b) => b.intersects_plane(plane),
            BoundingVolume::Obb(b) => b.intersects_plane(plane),
        }
    }

    /// Overlap test between two volumes of any kind, margins included.
    pub fn intersects(&self, other: &BoundingVolume) -> bool {
        match (self, other) {
            (_, BoundingVolume::Sphere(s)) => self.intersects_sphere(s.center(), s.effective_radius()),
            (BoundingVolume::Sphere(_), _) => other.intersects(self),
            (BoundingVolume::Aabb(a), BoundingVolume::Aabb(b)) => a.intersects_aabb(b),
            (BoundingVolume::Obb(a), BoundingVolume::Aabb(b)) => a.intersects_aabb(b),
            (BoundingVolume::Obb(a), BoundingVolume::Obb(b)) => a.intersects_obb(b),
            (BoundingVolume::Aabb(_), BoundingVolume::Obb(_)) => other.intersects(self),
        }
    }

    /// Lower bound on the distance from `p` to anything inside the volume,
    /// with the nearest point of the (margin-inflated) volume.
    pub fn distance_to_point(&self, p: DVec3) -> (f64, DVec3) {
        match self {
            BoundingVolume::Sphere(s) => s.distance_to_point(p),
            BoundingVolume::Aabb(b) => b.distance_to_point(p),
            BoundingVolume::Obb(b) => b.distance_to_point(p),
        }
    }

    /// Distance from `p` along `dir` to the volume, infinite on a miss.
    pub fn distance_to_point_along(&self, p: DVec3, dir: DVec3) -> (f64, DVec3) {
        match self {
            BoundingVolume::Sphere(s) => s.distance_to_point_along(p, dir),
            BoundingVolume::Aabb(b) => b.distance_to_point_along(p, dir),
            BoundingVolume::Obb(b) => b.distance_to_point_along(p, dir),
        }
    }

    /// Sphere enclosing the tight volume. Its inflated radius also encloses
    /// the inflated volume.
    pub fn bounding_sphere(&self) -> BoundingSphere {
        match self {
            BoundingVolume::Sphere(s) => *s,
            BoundingVolume::Aabb(b) => b.bounding_sphere(),
            BoundingVolume::Obb(b) => b.bounding_sphere(),
        }
    }

    /// Grows the volume to include `p`. Returns `true` if it changed.
    pub fn update_point(&mut self, p: DVec3) -> bool {
        match self {
            BoundingVolume::Sphere(s) => s.update_point(p),
            BoundingVolume::Aabb(b) => b.update_point(p),
            BoundingVolume::Obb(b) => b.update_point(p),
        }
    }

    /// Grows the volume to include the sphere `(c, r)`. Returns `true` if it changed.
    pub fn update_sphere(&mut self, c: DVec3, r: f64) -> bool {
        match self {
            BoundingVolume::Sphere(s) => s.update_sphere(c, r),
            BoundingVolume::Aabb(b) => b.update_sphere(c, r),
            BoundingVolume::Obb(b) => b.update_sphere(c, r),
        }
    }

    /// Refits the volume tightly around `elems`, keeping kind and margin.
    ///
    /// The centre starts at the mean element centroid. Oriented boxes align
    /// with the principal axes of the element covariance. Every element then
    /// grows the volume around itself.
    pub fn bound<B: Boundable>(&mut self, elems: &[B]) {
        let margin = self.margin();
        let center = if elems.is_empty() {
            DVec3::ZERO
        } else {
            elems.iter().map(Boundable::centroid).sum::<DVec3>() / elems.len() as f64
        };

        *self = match self.kind() {
            VolumeKind::Sphere => BoundingSphere::raw(center, 0.0, margin).into(),
            VolumeKind::Aabb => Aabb::raw(center, DVec3::ZERO, margin).into(),
            VolumeKind::Obb => {
                let mut cov = DMat3::ZERO;
                let n = elems
                    .iter()
                    .map(|e| e.accumulate_covariance(center, &mut cov))
                    .sum::<usize>();
                let rotation = if n > 1 {
                    principal_axes(&(cov * (1.0 / n as f64)))
                } else {
                    DMat3::IDENTITY
                };
                Obb::raw(center, rotation, DVec3::ZERO, margin).into()
            }
        };

        for e in elems {
            e.update_bv(self);
        }
    }

    /// Candidate split directions, widest extent first.
    fn split_axes(&self, centroids: &[DVec3]) -> [DVec3; 3] {
        let unit = [DVec3::X, DVec3::Y, DVec3::Z];
        match self {
            BoundingVolume::Sphere(_) => {
                let (lo, hi) = centroids.iter().fold(
                    (DVec3::splat(f64::INFINITY), DVec3::splat(f64::NEG_INFINITY)),
                    |(lo, hi), &c| (lo.min(c), hi.max(c)),
                );
                axes_by_extent(hi - lo).map(|i| unit[i])
            }
            BoundingVolume::Aabb(b) => axes_by_extent(b.half_widths()).map(|i| unit[i]),
            BoundingVolume::Obb(b) => {
                let r = b.rotation();
                axes_by_extent(b.half_widths()).map(|i| r.col(i))
            }
        }
    }

    /// Partitions `elems` into two non-empty groups along the widest axis.
    ///
    /// Elements whose centroid projects below the volume centre go left.
    /// When that leaves one side empty, the elements are sorted along the
    /// axis and cut in half instead. If every axis sees all centroids at the
    /// same coordinate the split fails and the elements are handed back.
    pub fn split<B: Boundable>(&self, elems: Vec<B>) -> Result<(Vec<B>, Vec<B>), Vec<B>> {
        if elems.len() < 2 {
            return Err(elems);
        }
        let center = self.center();
        let centroids: Vec<DVec3> = elems.iter().map(Boundable::centroid).collect();

        for axis in self.split_axes(&centroids) {
            let proj: Vec<f64> = centroids.iter().map(|&c| (c - center).dot(axis)).collect();
            let (lo, hi) = proj
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &p| (lo.min(p), hi.max(p)));
            if !(hi > lo) {
                continue;
            }

            let n_left = proj.iter().filter(|&&p| p < 0.0).count();
            if n_left == 0 || n_left == elems.len() {
                let mut keyed: Vec<(f64, B)> = proj.into_iter().zip(elems).collect();
                keyed.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
                let right = keyed.split_off(keyed.len() / 2);
                return Ok((
                    keyed.into_iter().map(|(_, e)| e).collect(),
                    right.into_iter().map(|(_, e)| e).collect(),
                ));
            }

            let mut left = Vec::with_capacity(n_left);
            let mut right = Vec::with_capacity(elems.len() - n_left);
            for (e, p) in elems.into_iter().zip(proj) {
                if p < 0.0 {
                    left.push(e);
                } else {
                    right.push(e);
                }
            }
            return Ok((left, right));
        }

        Err(elems)
    }
}

/// A child volume seen as an element of its parent: the parent must enclose
/// the child's margin-inflated region.
impl Boundable for BoundingVolume {
    fn centroid(&self) -> DVec3 {
        self.center()
    }

    fn distance_to_point(&self, point: DVec3) -> (f64, DVec3) {
        BoundingVolume::distance_to_point(self, point)
    }

    fn distance_to_point_along(&self, point: DVec3, dir: DVec3) -> (f64, DVec3) {
        BoundingVolume::distance_to_point_along(self, point, dir)
    }

    fn update_bv(&self, bv: &mut BoundingVolume) -> bool {
        match self {
            BoundingVolume::Sphere(s) => bv.update_sphere(s.center(), s.effective_radius()),
            BoundingVolume::Aabb(b) => grow_by_corners(bv, b.effective_corners()),
            BoundingVolume::Obb(b) => grow_by_corners(bv, b.effective_corners()),
        }
    }

    fn accumulate_covariance(&self, center: DVec3, cov: &mut DMat3) -> usize {
        let corners = match self {
            BoundingVolume::Sphere(s) => {
                let d = s.center() - center;
                *cov += crate::geometry::outer(d, d);
                return 1;
            }
            BoundingVolume::Aabb(b) => b.effective_corners(),
            BoundingVolume::Obb(b) => b.effective_corners(),
        };
        for c in corners {
            let d = c - center;
            *cov += crate::geometry::outer(d, d);
        }
        corners.len()
    }
}

fn grow_by_corners(bv: &mut BoundingVolume, corners: [DVec3; 8]) -> bool {
    corners.into_iter().fold(false, |changed, c| bv.update_point(c) | changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundable::BoundablePointSet;

    fn point(x: f64, y: f64, z: f64) -> BoundablePointSet {
        BoundablePointSet::new(0, vec![DVec3::new(x, y, z)])
    }

    #[test]
    fn test_cross_kind_intersection_is_symmetric() {
        let vols: Vec<BoundingVolume> = vec![
            BoundingSphere::new(DVec3::ZERO, 1.0, 0.0).unwrap().into(),
            Aabb::new(DVec3::new(1.5, 0.0, 0.0), DVec3::splat(0.6), 0.0).unwrap().into(),
            Obb::new(
                DVec3::new(0.0, 2.2, 0.0),
                DMat3::from_rotation_z(0.7),
                DVec3::new(1.0, 0.5, 0.5),
                0.0,
            )
            .unwrap()
            .into(),
            Aabb::new(DVec3::splat(10.0), DVec3::ONE, 0.0).unwrap().into(),
        ];
        for a in &vols {
            for b in &vols {
                assert_eq!(a.intersects(b), b.intersects(a), "{:?} vs {:?}", a.kind(), b.kind());
            }
            assert!(a.intersects(a));
        }
        assert!(vols[0].intersects(&vols[1]));
        assert!(!vols[0].intersects(&vols[3]));
    }

    #[test]
    fn test_bound_encloses_elements() {
        let elems = vec![point(0.0, 0.0, 0.0), point(4.0, 1.0, 0.0), point(-2.0, 3.0, 5.0), point(1.0, -1.0, 2.0)];
        for kind in VolumeKind::ALL {
            let mut bv = BoundingVolume::empty(kind, 0.0);
            bv.bound(&elems);
            for e in &elems {
                assert!(bv.distance_to_point(e.points()[0]).0 < 1e-9, "{kind}");
            }
        }
    }

    #[test]
    fn test_obb_bound_follows_principal_axis() {
        let d = DVec3::new(1.0, 1.0, 0.0).normalize();
        let elems: Vec<_> = (0..10).map(|i| point(d.x * i as f64, d.y * i as f64, 0.0)).collect();
        let mut bv = BoundingVolume::empty(VolumeKind::Obb, 0.0);
        bv.bound(&elems);
        let BoundingVolume::Obb(b) = bv else { panic!("expected an obb") };
        // A line of points yields a box that is long along the line and flat across it.
        assert!((b.half_widths().x - 4.5).abs() < 1e-6);
        assert!(b.half_widths().y < 1e-6);
        assert!(b.rotation().col(0).dot(d).abs() > 1.0 - 1e-9);
    }

    #[test]
    fn test_split_longest_axis() {
        let elems = vec![point(0.0, 0.0, 0.0), point(10.0, 0.5, 0.0), point(1.0, 1.0, 0.0), point(9.0, 0.0, 0.0)];
        let mut bv = BoundingVolume::empty(VolumeKind::Aabb, 0.0);
        bv.bound(&elems);
        let (left, right) = bv.split(elems).ok().unwrap();
        assert_eq!(left.len(), 2);
        assert_eq!(right.len(), 2);
        assert!(left.iter().all(|e| e.centroid().x < 5.0));
        assert!(right.iter().all(|e| e.centroid().x > 5.0));
    }

    #[test]
    fn test_split_skewed_falls_back_to_halves() {
        // Every element is weighted towards a shared far point, so all centroids
        // sit above the box centre.
        let far = DVec3::new(50.0, 0.0, 0.0);
        let elems: Vec<_> = (0..5)
            .map(|i| BoundablePointSet::new(i, vec![DVec3::new(2.0 + i as f64 * 0.1, 0.0, 0.0), far, far]))
            .collect();
        let mut bv = BoundingVolume::empty(VolumeKind::Aabb, 0.0);
        bv.bound(&elems);
        assert!(elems.iter().all(|e| e.centroid().x > bv.center().x));
        let (left, right) = bv.split(elems).ok().unwrap();
        assert_eq!(left.len(), 2);
        assert_eq!(right.len(), 3);
        assert!(left.iter().all(|e| e.index() < 2));
    }

    #[test]
    fn test_split_coincident_centroids_fails() {
        let elems: Vec<_> = (0..4).map(|_| point(1.0, 2.0, 3.0)).collect();
        for kind in VolumeKind::ALL {
            let mut bv = BoundingVolume::empty(kind, 0.0);
            bv.bound(&elems);
            let back = bv.split(elems.clone()).err().unwrap();
            assert_eq!(back.len(), 4);
        }
        let bv = BoundingVolume::empty(VolumeKind::Aabb, 0.0);
        assert_eq!(bv.split(vec![point(0.0, 0.0, 0.0)]).err().map(|v| v.len()), Some(1));
    }

    #[test]
    fn test_volume_as_element_encloses_margin() {
        let child: BoundingVolume = Obb::new(DVec3::ZERO, DMat3::from_rotation_x(0.5), DVec3::ONE, 0.1)
            .unwrap()
            .into();
        let mut parent = BoundingVolume::empty(VolumeKind::Aabb, 0.1);
        parent.bound(&[child]);
        if let BoundingVolume::Obb(b) = child {
            for c in b.effective_corners() {
                assert!(parent.intersects_point(c));
            }
        }
    }
}
