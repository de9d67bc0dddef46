use crate::error::{check_margin, BvError, Result};
use crate::geometry::{check_point, orthonormal_deviation};
use crate::volume::aabb::{check_half_widths, Aabb};
use crate::volume::boxes::{boxes_intersect, BoxFrame};
use glam::{DMat3, DQuat, DVec3};

const ORTHONORMAL_TOLERANCE: f64 = 1e-6;

/// An oriented bounding box.
///
/// The columns of `rotation` are the box axes in world coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Obb {
    center: DVec3,
    rotation: DMat3,
    half_widths: DVec3,
    margin: f64,
}

impl Obb {
    pub fn new(center: DVec3, rotation: DMat3, half_widths: DVec3, margin: f64) -> Result<Self> {
        check_point(center, "box center")?;
        check_half_widths(half_widths)?;
        let deviation = orthonormal_deviation(&rotation);
        if !(deviation <= ORTHONORMAL_TOLERANCE) {
            return Err(BvError::DegenerateRotation { deviation });
        }
        Ok(Self::raw(center, rotation, half_widths, check_margin(margin)?))
    }

    pub fn from_quat(center: DVec3, rotation: DQuat, half_widths: DVec3, margin: f64) -> Result<Self> {
        Self::new(center, DMat3::from_quat(rotation.normalize()), half_widths, margin)
    }

    pub(crate) fn raw(center: DVec3, rotation: DMat3, half_widths: DVec3, margin: f64) -> Self {
        Self {
            center,
            rotation,
            half_widths,
            margin,
        }
    }

    pub fn center(&self) -> DVec3 {
        self.center
    }

    pub fn rotation(&self) -> DMat3 {
        self.rotation
    }

    pub fn half_widths(&self) -> DVec3 {
        self.half_widths
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    pub(crate) fn set_margin(&mut self, margin: f64) {
        self.margin = margin;
    }

    pub fn corner(&self, idx: usize) -> DVec3 {
        self.corner_with(idx & 7, self.half_widths)
    }

    pub fn effective_corner(&self, idx: usize) -> DVec3 {
        self.corner_with(idx & 7, self.effective_half_widths())
    }

    pub fn intersects_obb(&self, other: &Obb) -> bool {
        boxes_intersect(
            self.center,
            &self.rotation,
            self.effective_half_widths(),
            other.center,
            &other.rotation,
            other.effective_half_widths(),
        )
    }

    pub fn intersects_aabb(&self, other: &Aabb) -> bool {
        boxes_intersect(
            self.center,
            &self.rotation,
            self.effective_half_widths(),
            other.center(),
            &DMat3::IDENTITY,
            other.effective_half_widths(),
        )
    }
}

impl From<Aabb> for Obb {
    fn from(b: Aabb) -> Self {
        Obb::raw(b.center(), DMat3::IDENTITY, b.half_widths(), b.margin())
    }
}

impl BoxFrame for Obb {
    fn center(&self) -> DVec3 {
        self.center
    }

    fn half_widths(&self) -> DVec3 {
        self.half_widths
    }

    fn margin(&self) -> f64 {
        self.margin
    }

    fn rotation(&self) -> DMat3 {
        self.rotation
    }

    fn set_extent(&mut self, center: DVec3, half_widths: DVec3) {
        self.center = center;
        self.half_widths = half_widths;
    }
}
