use crate::geometry::{growth_slack, Plane};
use crate::volume::sphere::BoundingSphere;
use glam::{DMat3, DVec3};

/// Added to the absolute rotation terms in the separating axis test so that
/// nearly parallel edge pairs do not produce a zero-length cross axis.
pub(crate) const SAT_EPSILON: f64 = 1e-6;

/// Directions with smaller components are treated as parallel to a slab.
const PARALLEL_EPSILON: f64 = 1e-12;

/// Shared behavior of the two box variants, expressed in the box frame.
///
/// Implementors only describe their frame; every predicate is written once
/// against local coordinates.
pub(crate) trait BoxFrame {
    fn center(&self) -> DVec3;
    fn half_widths(&self) -> DVec3;
    fn margin(&self) -> f64;
    fn rotation(&self) -> DMat3;
    fn set_extent(&mut self, center: DVec3, half_widths: DVec3);

    fn to_local(&self, v: DVec3) -> DVec3 {
        self.rotation().transpose() * v
    }

    fn to_world(&self, v: DVec3) -> DVec3 {
        self.rotation() * v
    }

    fn effective_half_widths(&self) -> DVec3 {
        self.half_widths() + DVec3::splat(self.margin())
    }

    /// Corner `idx` (0..8) of the box scaled by `half_widths`.
    fn corner_with(&self, idx: usize, half_widths: DVec3) -> DVec3 {
        let sign = DVec3::new(
            if idx & 1 == 0 { -1.0 } else { 1.0 },
            if idx & 2 == 0 { -1.0 } else { 1.0 },
            if idx & 4 == 0 { -1.0 } else { 1.0 },
        );
        self.center() + self.to_world(sign * half_widths)
    }

    fn effective_corners(&self) -> [DVec3; 8] {
        let hw = self.effective_half_widths();
        std::array::from_fn(|i| self.corner_with(i, hw))
    }

    fn intersects_point(&self, p: DVec3) -> bool {
        let l = self.to_local(p - self.center()).abs();
        let hw = self.effective_half_widths();
        l.x <= hw.x && l.y <= hw.y && l.z <= hw.z
    }

    fn intersects_sphere(&self, c: DVec3, r: f64) -> bool {
        let l = self.to_local(c - self.center());
        let hw = self.effective_half_widths();
        let q = l.clamp(-hw, hw);
        l.distance_squared(q) <= r * r
    }

    fn intersects_line(&self, p: DVec3, v: DVec3) -> bool {
        self.clip_line(p, v, f64::NEG_INFINITY).is_some()
    }

    fn intersects_ray(&self, p: DVec3, v: DVec3) -> bool {
        self.clip_line(p, v, 0.0).is_some()
    }

    /// Slab test of `p + t v` for `t >= t_min`. Returns the entry parameter.
    fn clip_line(&self, p: DVec3, v: DVec3, t_min: f64) -> Option<f64> {
        let lp = self.to_local(p - self.center());
        let lv = self.to_local(v);
        let hw = self.effective_half_widths();

        let mut t0 = t_min;
        let mut t1 = f64::INFINITY;
        for i in 0..3 {
            if lv[i].abs() < PARALLEL_EPSILON {
                if lp[i].abs() > hw[i] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / lv[i];
            let mut ta = (-hw[i] - lp[i]) * inv;
            let mut tb = (hw[i] - lp[i]) * inv;
            if ta > tb {
                std::mem::swap(&mut ta, &mut tb);
            }
            t0 = t0.max(ta);
            t1 = t1.min(tb);
            if t0 > t1 {
                return None;
            }
        }
        Some(t0)
    }

    fn intersects_plane(&self, plane: &Plane) -> bool {
        let n = self.to_local(plane.normal).abs();
        let reach = n.dot(self.effective_half_widths());
        plane.signed_distance(self.center()).abs() <= reach
    }

    fn distance_to_point(&self, p: DVec3) -> (f64, DVec3) {
        let l = self.to_local(p - self.center());
        let hw = self.effective_half_widths();
        let q = l.clamp(-hw, hw);
        (l.distance(q), self.center() + self.to_world(q))
    }

    fn distance_to_point_along(&self, p: DVec3, dir: DVec3) -> (f64, DVec3) {
        if self.intersects_point(p) {
            return (0.0, p);
        }
        let Some(u) = dir.try_normalize() else {
            return (f64::INFINITY, p);
        };
        match self.clip_line(p, u, 0.0) {
            Some(t) => (t, p + u * t),
            None => (f64::INFINITY, p),
        }
    }

    /// Sphere through the tight corners. Its margin is scaled by `sqrt(3)` so
    /// the inflated sphere reaches the inflated corners.
    fn bounding_sphere(&self) -> BoundingSphere {
        let margin = self.margin() * 3f64.sqrt();
        BoundingSphere::raw(self.center(), self.half_widths().length(), margin)
    }

    fn update_point(&mut self, p: DVec3) -> bool {
        let l = self.to_local(p - self.center());
        let hw = self.half_widths();
        if l.abs().cmple(hw).all() {
            return false;
        }
        self.grow_local(l.min(-hw), l.max(hw));
        true
    }

    fn update_sphere(&mut self, c: DVec3, r: f64) -> bool {
        let l = self.to_local(c - self.center());
        let hw = self.half_widths();
        let slack = growth_slack(self.center(), hw.max_element());
        if (l.abs() + DVec3::splat(r + slack)).cmple(hw).all() {
            return false;
        }
        self.grow_local((l - DVec3::splat(r)).min(-hw), (l + DVec3::splat(r)).max(hw));
        true
    }

    /// Resets the extent to the local-frame interval `[lo, hi]`, rounded outward.
    fn grow_local(&mut self, lo: DVec3, hi: DVec3) {
        let center = self.center() + self.to_world((lo + hi) * 0.5);
        let half_widths = (hi - lo) * 0.5;
        let slack = growth_slack(center, half_widths.max_element());
        self.set_extent(center, half_widths + DVec3::splat(2.0 * slack));
    }
}

/// Separating axis test between two oriented boxes given by centre, axes
/// (rotation columns) and half-widths. Margins must already be folded into
/// the half-widths.
pub(crate) fn boxes_intersect(
    ca: DVec3,
    ra: &DMat3,
    ha: DVec3,
    cb: DVec3,
    rb: &DMat3,
    hb: DVec3,
) -> bool {
    // r[i][j] = a_i . b_j, expressed in A's frame.
    let mut r = [[0.0f64; 3]; 3];
    let mut abs_r = [[0.0f64; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            r[i][j] = ra.col(i).dot(rb.col(j));
            abs_r[i][j] = r[i][j].abs() + SAT_EPSILON;
        }
    }
    let d = cb - ca;
    let t = [d.dot(ra.col(0)), d.dot(ra.col(1)), d.dot(ra.col(2))];

    // A's face normals.
    for i in 0..3 {
        let rb_ext = hb[0] * abs_r[i][0] + hb[1] * abs_r[i][1] + hb[2] * abs_r[i][2];
        if t[i].abs() > ha[i] + rb_ext {
            return false;
        }
    }

    // B's face normals.
    for j in 0..3 {
        let ra_ext = ha[0] * abs_r[0][j] + ha[1] * abs_r[1][j] + ha[2] * abs_r[2][j];
        let tj = t[0] * r[0][j] + t[1] * r[1][j] + t[2] * r[2][j];
        if tj.abs() > ra_ext + hb[j] {
            return false;
        }
    }

    // Edge cross products a_i x b_j.
    for i in 0..3 {
        let (i1, i2) = ((i + 1) % 3, (i + 2) % 3);
        for j in 0..3 {
            let (j1, j2) = ((j + 1) % 3, (j + 2) % 3);
            let ra_ext = ha[i1] * abs_r[i2][j] + ha[i2] * abs_r[i1][j];
            let rb_ext = hb[j1] * abs_r[i][j2] + hb[j2] * abs_r[i][j1];
            let tv = t[i2] * r[i1][j] - t[i1] * r[i2][j];
            if tv.abs() > ra_ext + rb_ext {
                return false;
            }
        }
    }

    true
}
