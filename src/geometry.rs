//! Small geometric primitives shared by the bounding volumes.

use crate::error::{BvError, Result};
use glam::{DMat3, DVec3};

/// An oriented plane `{ x : normal . x = offset }` with a unit normal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub normal: DVec3,
    pub offset: f64,
}

impl Plane {
    /// Plane through `point` with the given normal. The normal is normalized.
    pub fn new(normal: DVec3, point: DVec3) -> Result<Self> {
        let normal = normalize(normal, "plane normal")?;
        Ok(Self {
            normal,
            offset: normal.dot(point),
        })
    }

    /// Plane from a normal and signed offset from the origin.
    pub fn from_normal_offset(normal: DVec3, offset: f64) -> Result<Self> {
        let len = normal.length();
        let unit = normalize(normal, "plane normal")?;
        if !offset.is_finite() {
            return Err(BvError::NonFinite("plane offset"));
        }
        Ok(Self {
            normal: unit,
            offset: offset / len,
        })
    }

    /// Signed distance, positive on the side the normal points to.
    pub fn signed_distance(&self, p: DVec3) -> f64 {
        self.normal.dot(p) - self.offset
    }
}

fn normalize(v: DVec3, what: &'static str) -> Result<DVec3> {
    if !v.is_finite() {
        return Err(BvError::NonFinite(what));
    }
    v.try_normalize().ok_or(BvError::NonFinite(what))
}

pub(crate) fn check_point(p: DVec3, what: &'static str) -> Result<DVec3> {
    if p.is_finite() { Ok(p) } else { Err(BvError::NonFinite(what)) }
}

/// Axes ordered by decreasing component value.
pub(crate) fn axes_by_extent(v: DVec3) -> [usize; 3] {
    let mut axes = [0, 1, 2];
    axes.sort_by(|&a, &b| v[b].partial_cmp(&v[a]).unwrap_or(std::cmp::Ordering::Equal));
    axes
}

/// Outer product `a b^T`.
pub(crate) fn outer(a: DVec3, b: DVec3) -> DMat3 {
    DMat3::from_cols(a * b.x, a * b.y, a * b.z)
}

/// Eigenvectors of a symmetric 3x3 matrix, as the columns of a rotation
/// matrix ordered by decreasing eigenvalue.
///
/// Uses cyclic Jacobi sweeps. The result is always a proper rotation
/// (determinant +1), falling back to the identity for degenerate input.
pub(crate) fn principal_axes(cov: &DMat3) -> DMat3 {
    let mut a = cov.to_cols_array_2d();
    let mut v = DMat3::IDENTITY.to_cols_array_2d();

    // Column-major storage: a[col][row]. The matrix is symmetric so the
    // distinction only matters for `v`.
    for _sweep in 0..32 {
        let off = a[1][0] * a[1][0] + a[2][0] * a[2][0] + a[2][1] * a[2][1];
        if off < 1e-30 {
            break;
        }
        for (p, q) in [(0usize, 1usize), (0, 2), (1, 2)] {
            let apq = a[q][p];
            if apq.abs() < 1e-300 {
                continue;
            }
            let theta = (a[q][q] - a[p][p]) / (2.0 * apq);
            let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
            let c = 1.0 / (t * t + 1.0).sqrt();
            let s = t * c;

            for k in 0..3 {
                let akp = a[p][k];
                let akq = a[q][k];
                a[p][k] = c * akp - s * akq;
                a[q][k] = s * akp + c * akq;
            }
            for k in 0..3 {
                let apk = a[k][p];
                let aqk = a[k][q];
                a[k][p] = c * apk - s * aqk;
                a[k][q] = s * apk + c * aqk;
            }
            for k in 0..3 {
                let vkp = v[p][k];
                let vkq = v[q][k];
                v[p][k] = c * vkp - s * vkq;
                v[q][k] = s * vkp + c * vkq;
            }
        }
    }

    let eig = [a[0][0], a[1][1], a[2][2]];
    let mut order = [0usize, 1, 2];
    order.sort_by(|&i, &j| eig[j].partial_cmp(&eig[i]).unwrap_or(std::cmp::Ordering::Equal));

    let x = DVec3::from_array(v[order[0]]);
    let y = DVec3::from_array(v[order[1]]);
    let (Some(x), Some(y)) = (x.try_normalize(), y.try_normalize()) else {
        return DMat3::IDENTITY;
    };
    // Re-orthogonalize and force a right-handed frame.
    let y = (y - x * x.dot(y)).try_normalize();
    match y {
        Some(y) if x.is_finite() => DMat3::from_cols(x, y, x.cross(y)),
        _ => DMat3::IDENTITY,
    }
}

/// Relative rounding allowance for a volume grown around `center`.
const GROWTH_ULPS: f64 = 64.0 * f64::EPSILON;

/// Absolute slack covering the rounding of a volume recomputed around
/// `center` with extent `extent`. Grown volumes add twice this amount so that
/// everything they were grown around passes the containment tests.
pub(crate) fn growth_slack(center: DVec3, extent: f64) -> f64 {
    GROWTH_ULPS * (center.abs().max_element() + extent) + f64::MIN_POSITIVE
}

/// Largest deviation of `r^T r` from the identity.
pub(crate) fn orthonormal_deviation(r: &DMat3) -> f64 {
    let d = r.transpose() * *r - DMat3::IDENTITY;
    d.to_cols_array().iter().fold(0.0f64, |m, v| m.max(v.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_signed_distance() {
        let plane = Plane::new(DVec3::new(0.0, 0.0, 2.0), DVec3::new(0.0, 0.0, 1.0)).unwrap();
        assert!((plane.signed_distance(DVec3::new(5.0, 5.0, 3.0)) - 2.0).abs() < 1e-12);
        assert!((plane.signed_distance(DVec3::ZERO) + 1.0).abs() < 1e-12);

        let plane = Plane::from_normal_offset(DVec3::new(0.0, 2.0, 0.0), 4.0).unwrap();
        assert!((plane.offset - 2.0).abs() < 1e-12);
        assert!(Plane::new(DVec3::ZERO, DVec3::ZERO).is_err());
    }

    #[test]
    fn test_principal_axes_diagonal() {
        let cov = DMat3::from_diagonal(DVec3::new(1.0, 9.0, 4.0));
        let r = principal_axes(&cov);
        assert!(orthonormal_deviation(&r) < 1e-9);
        assert!(r.col(0).y.abs() > 1.0 - 1e-9, "largest axis should be y");
        assert!(r.col(1).z.abs() > 1.0 - 1e-9, "second axis should be z");
        assert!((r.determinant() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_principal_axes_rotated() {
        // Points spread along the (1, 1, 0) diagonal.
        let d = DVec3::new(1.0, 1.0, 0.0).normalize();
        let cov = outer(d, d) * 10.0 + DMat3::from_diagonal(DVec3::splat(0.1));
        let r = principal_axes(&cov);
        assert!(r.col(0).dot(d).abs() > 1.0 - 1e-6);
        assert!(orthonormal_deviation(&r) < 1e-9);
    }

    #[test]
    fn test_principal_axes_degenerate() {
        let r = principal_axes(&DMat3::ZERO);
        assert!(orthonormal_deviation(&r) < 1e-12);
    }

    #[test]
    fn test_growth_slack_scales_with_position() {
        let near = growth_slack(DVec3::ZERO, 1.0);
        let far = growth_slack(DVec3::new(0.0, -1e6, 0.0), 1.0);
        assert!(near > 0.0 && near < 1e-13);
        assert!(far > 1e4 * near);
        assert!(growth_slack(DVec3::ZERO, 0.0) > 0.0);
    }

    #[test]
    fn test_axes_by_extent() {
        assert_eq!(axes_by_extent(DVec3::new(1.0, 3.0, 2.0)), [1, 2, 0]);
    }
}
