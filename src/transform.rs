use glam::{Affine3A, Mat3A, Quat, Vec3, Vec3A};

use crate::{
    error::{Error, Result},
    util::TRANSFORM_TOLERANCE,
};

/// Mutually inverse local to world and world to local maps of a placed object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshTransform {
    local_to_world: Affine3A,
    world_to_local: Affine3A,
}

impl MeshTransform {
    pub fn identity() -> Self {
        Self {
            local_to_world: Affine3A::IDENTITY,
            world_to_local: Affine3A::IDENTITY,
        }
    }

    /// Derives the inverse of `local_to_world`.
    ///
    /// Any invertible map is accepted, however small its scale.
    pub fn new(local_to_world: Affine3A) -> Result<Self> {
        let det = local_to_world.matrix3.determinant();
        if !local_to_world.is_finite() || !det.is_normal() {
            return Err(Error::DegenerateTransform);
        }

        let world_to_local = local_to_world.inverse();
        if !world_to_local.is_finite() {
            return Err(Error::DegenerateTransform);
        }

        Ok(Self {
            local_to_world,
            world_to_local,
        })
    }

    /// Uses an externally supplied pair, which must compose to identity
    pub fn from_pair(local_to_world: Affine3A, world_to_local: Affine3A) -> Result<Self> {
        let this = Self {
            local_to_world,
            world_to_local,
        };

        if !this.is_inverse_pair() {
            return Err(Error::DegenerateTransform);
        }

        Ok(this)
    }

    /// Unrotated placement, the way brush instances are spawned
    pub fn from_position_scale(position: Vec3, scale: Vec3) -> Result<Self> {
        Self::new(Affine3A::from_scale_rotation_translation(
            scale,
            Quat::IDENTITY,
            position,
        ))
    }

    pub fn is_inverse_pair(&self) -> bool {
        self.local_to_world.is_finite()
            && self.world_to_local.is_finite()
            && is_identity(
                self.local_to_world * self.world_to_local,
                self.local_to_world.translation,
            )
            && is_identity(
                self.world_to_local * self.local_to_world,
                self.world_to_local.translation,
            )
    }

    pub fn local_to_world(&self) -> Affine3A {
        self.local_to_world
    }

    pub fn world_to_local(&self) -> Affine3A {
        self.world_to_local
    }

    pub fn to_world(&self, point: Vec3) -> Vec3 {
        self.local_to_world.transform_point3(point)
    }

    pub fn to_local(&self, point: Vec3) -> Vec3 {
        self.world_to_local.transform_point3(point)
    }
}

impl Default for MeshTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Translation error grows with the magnitude of the translation being undone
fn is_identity(composed: Affine3A, translation: Vec3A) -> bool {
    let tolerance = TRANSFORM_TOLERANCE * (1.0 + translation.abs().max_element());

    composed
        .matrix3
        .abs_diff_eq(Mat3A::IDENTITY, TRANSFORM_TOLERANCE)
        && composed.translation.abs_diff_eq(Vec3A::ZERO, tolerance)
}
