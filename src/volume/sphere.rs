use crate::error::{check_margin, BvError, Result};
use crate::geometry::{check_point, growth_slack, Plane};
use glam::DVec3;

/// A bounding sphere.
///
/// The margin inflates the radius for every containment and intersection
/// test, but [`radius`](Self::radius) always reports the tight value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingSphere {
    center: DVec3,
    radius: f64,
    margin: f64,
}

impl BoundingSphere {
    pub fn new(center: DVec3, radius: f64, margin: f64) -> Result<Self> {
        check_point(center, "sphere center")?;
        if !radius.is_finite() {
            return Err(BvError::NonFinite("sphere radius"));
        }
        if radius < 0.0 {
            return Err(BvError::NegativeRadius(radius));
        }
        Ok(Self::raw(center, radius, check_margin(margin)?))
    }

    pub(crate) fn raw(center: DVec3, radius: f64, margin: f64) -> Self {
        Self { center, radius, margin }
    }

    pub fn center(&self) -> DVec3 {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    pub(crate) fn set_margin(&mut self, margin: f64) {
        self.margin = margin;
    }

    /// Radius including the margin.
    pub fn effective_radius(&self) -> f64 {
        self.radius + self.margin
    }

    pub fn intersects_point(&self, p: DVec3) -> bool {
        let er = self.effective_radius();
        self.center.distance_squared(p) <= er * er
    }

    pub fn intersects_sphere(&self, c: DVec3, r: f64) -> bool {
        let reach = self.effective_radius() + r;
        self.center.distance_squared(c) <= reach * reach
    }

    /// Infinite line through `p` with direction `v`.
    pub fn intersects_line(&self, p: DVec3, v: DVec3) -> bool {
        let vv = v.length_squared();
        if vv == 0.0 {
            return self.intersects_point(p);
        }
        let w = self.center - p;
        let perp = w - v * (w.dot(v) / vv);
        perp.length_squared() <= self.effective_radius().powi(2)
    }

    /// Half-line starting at `p` with direction `v`.
    pub fn intersects_ray(&self, p: DVec3, v: DVec3) -> bool {
        let vv = v.length_squared();
        if vv == 0.0 {
            return self.intersects_point(p);
        }
        let t = ((self.center - p).dot(v) / vv).max(0.0);
        let closest = p + v * t;
        self.center.distance_squared(closest) <= self.effective_radius().powi(2)
    }

    pub fn intersects_plane(&self, plane: &Plane) -> bool {
        plane.signed_distance(self.center).abs() <= self.effective_radius()
    }

    /// Distance from `p` to the sphere surface (zero inside) and the nearest point.
    pub fn distance_to_point(&self, p: DVec3) -> (f64, DVec3) {
        let er = self.effective_radius();
        let d = self.center.distance(p);
        if d <= er {
            return (0.0, p);
        }
        let nearest = self.center + (p - self.center) * (er / d);
        (d - er, nearest)
    }

    /// Distance travelled from `p` along `dir` until the sphere is hit.
    ///
    /// Infinite if the ray misses.
    pub fn distance_to_point_along(&self, p: DVec3, dir: DVec3) -> (f64, DVec3) {
        if self.intersects_point(p) {
            return (0.0, p);
        }
        let Some(u) = dir.try_normalize() else {
            return (f64::INFINITY, p);
        };
        let er = self.effective_radius();
        let oc = p - self.center;
        let b = oc.dot(u);
        let disc = b * b - (oc.length_squared() - er * er);
        if disc < 0.0 {
            return (f64::INFINITY, p);
        }
        let t = -b - disc.sqrt();
        if t < 0.0 {
            return (f64::INFINITY, p);
        }
        (t, p + u * t)
    }

    /// Grows the sphere just enough to include `p`. Returns `true` if it changed.
    pub fn update_point(&mut self, p: DVec3) -> bool {
        if self.center.distance_squared(p) <= self.radius * self.radius {
            return false;
        }
        let d = self.center.distance(p);
        let r = 0.5 * (self.radius + d);
        self.center += (p - self.center) * ((r - self.radius) / d);
        self.radius = r + 2.0 * growth_slack(self.center, r);
        true
    }

    /// Grows the sphere to include the sphere `(c, r)`. Returns `true` if it changed.
    pub fn update_sphere(&mut self, c: DVec3, r: f64) -> bool {
        let d = self.center.distance(c);
        if d + r + growth_slack(self.center, self.radius) <= self.radius {
            return false;
        }
        if d + self.radius <= r {
            self.center = c;
            self.radius = r + 2.0 * growth_slack(c, r);
            return true;
        }
        let grown = (0.5 * (self.radius + d + r)).max(self.radius);
        if d > 0.0 {
            self.center += (c - self.center) * ((grown - self.radius) / d);
        }
        self.radius = grown + 2.0 * growth_slack(self.center, grown);
        true
    }
}
