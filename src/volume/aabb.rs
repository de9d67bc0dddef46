use crate::error::{check_margin, BvError, Result};
use crate::geometry::check_point;
use crate::volume::boxes::BoxFrame;
use glam::{DMat3, DVec3};

/// An axis-aligned bounding box stored as centre and half-widths.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    center: DVec3,
    half_widths: DVec3,
    margin: f64,
}

impl Aabb {
    pub fn new(center: DVec3, half_widths: DVec3, margin: f64) -> Result<Self> {
        check_point(center, "box center")?;
        check_half_widths(half_widths)?;
        Ok(Self::raw(center, half_widths, check_margin(margin)?))
    }

    /// Box spanning `[min, max]`. The corners may be given in any order.
    pub fn from_corners(a: DVec3, b: DVec3, margin: f64) -> Result<Self> {
        let (min, max) = (a.min(b), a.max(b));
        Self::new((min + max) * 0.5, (max - min) * 0.5, margin)
    }

    pub(crate) fn raw(center: DVec3, half_widths: DVec3, margin: f64) -> Self {
        Self {
            center,
            half_widths,
            margin,
        }
    }

    pub fn center(&self) -> DVec3 {
        self.center
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

    pub fn min(&self) -> DVec3 {
        self.center - self.half_widths
    }

    pub fn max(&self) -> DVec3 {
        self.center + self.half_widths
    }

    /// Corner `idx`, bit 0 selects +x, bit 1 +y, bit 2 +z.
    pub fn corner(&self, idx: usize) -> DVec3 {
        self.corner_with(idx & 7, self.half_widths)
    }

    /// Corner `idx` of the margin-inflated box.
    pub fn effective_corner(&self, idx: usize) -> DVec3 {
        self.corner_with(idx & 7, self.effective_half_widths())
    }

    /// Axis-aligned overlap including both margins.
    pub fn intersects_aabb(&self, other: &Aabb) -> bool {
        let d = (self.center - other.center).abs();
        let reach = self.effective_half_widths() + other.effective_half_widths();
        d.cmple(reach).all()
    }
}

impl BoxFrame for Aabb {
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
        DMat3::IDENTITY
    }

    fn set_extent(&mut self, center: DVec3, half_widths: DVec3) {
        self.center = center;
        self.half_widths = half_widths;
    }

    fn to_local(&self, v: DVec3) -> DVec3 {
        v
    }

    fn to_world(&self, v: DVec3) -> DVec3 {
        v
    }
}

pub(crate) fn check_half_widths(hw: DVec3) -> Result<DVec3> {
    if !hw.is_finite() {
        return Err(BvError::NonFinite("box half-widths"));
    }
    for axis in 0..3 {
        if hw[axis] < 0.0 {
            return Err(BvError::NegativeHalfWidth {
                axis,
                value: hw[axis],
            });
        }
    }
    Ok(hw)
}
