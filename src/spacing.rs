use glam::Vec3;
use ordered_float::OrderedFloat;

/// Minimum distance between placed brush instances
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spacing {
    pub density: f32,
}

impl Spacing {
    pub fn new(density: f32) -> Self {
        Self { density }
    }

    /// Index and distance of the placed position closest to `candidate`
    pub fn nearest(
        &self,
        candidate: Vec3,
        placed: impl IntoIterator<Item = Vec3>,
    ) -> Option<(usize, f32)> {
        placed
            .into_iter()
            .map(|p| candidate.distance(p))
            .enumerate()
            .min_by_key(|v| OrderedFloat(v.1))
    }

    /// Returns false if any placed position is strictly closer than the density
    pub fn allows(&self, candidate: Vec3, placed: impl IntoIterator<Item = Vec3>) -> bool {
        placed
            .into_iter()
            .all(|p| candidate.distance(p) >= self.density)
    }
}
