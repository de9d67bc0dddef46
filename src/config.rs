use crate::error::BvError;
use std::fmt;
use std::str::FromStr;

/// Which bounding volume variant the nodes of a tree use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum VolumeKind {
    /// Bounding spheres. Cheapest to test, loosest fit.
    Sphere,
    /// Axis-aligned boxes.
    #[default]
    Aabb,
    /// Oriented boxes fitted along the principal axes of their contents.
    Obb,
}

impl VolumeKind {
    /// All variants, in declaration order.
    pub const ALL: [VolumeKind; 3] = [VolumeKind::Sphere, VolumeKind::Aabb, VolumeKind::Obb];

    pub fn name(&self) -> &'static str {
        match self {
            VolumeKind::Sphere => "sphere",
            VolumeKind::Aabb => "aabb",
            VolumeKind::Obb => "obb",
        }
    }
}

impl fmt::Display for VolumeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VolumeKind {
    type Err = BvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sphere" => Ok(VolumeKind::Sphere),
            "aabb" => Ok(VolumeKind::Aabb),
            "obb" => Ok(VolumeKind::Obb),
            _ => Err(BvError::UnknownVolumeKind(s.to_string())),
        }
    }
}

/// Tuning knobs for [`BvTree::parallel_build_with`](crate::BvTree::parallel_build_with).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParallelConfig {
    /// Number of worker threads. `0` runs on the global rayon pool.
    pub max_threads: usize,
    /// Subtrees holding fewer elements than this are built inline on the
    /// current worker instead of being offered to the pool.
    pub min_parallel_elements: usize,
}

impl ParallelConfig {
    pub fn new(max_threads: usize) -> Self {
        Self {
            max_threads,
            ..Self::default()
        }
    }

    pub fn with_min_parallel_elements(mut self, min_parallel_elements: usize) -> Self {
        self.min_parallel_elements = min_parallel_elements.max(2);
        self
    }
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            max_threads: 0,
            min_parallel_elements: 512,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_kind_parse() {
        assert_eq!("sphere".parse::<VolumeKind>(), Ok(VolumeKind::Sphere));
        assert_eq!(" AABB ".parse::<VolumeKind>(), Ok(VolumeKind::Aabb));
        assert_eq!("Obb".parse::<VolumeKind>(), Ok(VolumeKind::Obb));
        assert!(matches!("cone".parse::<VolumeKind>(), Err(BvError::UnknownVolumeKind(_))));
        for kind in VolumeKind::ALL {
            assert_eq!(kind.to_string().parse::<VolumeKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_parallel_config() {
        let cfg = ParallelConfig::new(4).with_min_parallel_elements(0);
        assert_eq!(cfg.max_threads, 4);
        assert_eq!(cfg.min_parallel_elements, 2);
        assert_eq!(ParallelConfig::default().max_threads, 0);
    }
}
