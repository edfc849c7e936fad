//! Ray casting capability consumed by the ground conformer.
//!
//! Hosts plug their physics scene in through [`RayCast`]. [`PlaneGround`] and
//! [`ColliderSet`] are self contained implementations for tools and tests.
use glam::{Affine3A, Vec3};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use slab::Slab;

use crate::{mesh::Face, mesh::Mesh, plane::Plane};

/// Bit set of physics layers used to filter ray casts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const ALL: Self = Self(u32::MAX);
    pub const NONE: Self = Self(0);

    /// Mask containing only the layer with the given index
    pub const fn layer(index: u32) -> Self {
        assert!(index < 32);
        Self(1 << index)
    }

    pub fn contains(&self, index: u32) -> bool {
        index < 32 && self.0 & (1 << index) != 0
    }

    pub fn intersects(&self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub max_distance: f32,
}

impl Ray {
    /// Creates an unbounded ray. `direction` is normalized.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
            max_distance: f32::INFINITY,
        }
    }

    pub fn with_max_distance(mut self, max_distance: f32) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    pub distance: f32,
    pub normal: Vec3,
}

/// Cast a ray into a scene and return the first surface hit
pub trait RayCast {
    fn cast(&self, ray: &Ray, layers: LayerMask) -> Option<RayHit>;
}

impl<F> RayCast for F
where
    F: Fn(&Ray, LayerMask) -> Option<RayHit>,
{
    fn cast(&self, ray: &Ray, layers: LayerMask) -> Option<RayHit> {
        (self)(ray, layers)
    }
}

/// An infinite ground plane on a set of layers
#[derive(Debug, Clone, Copy)]
pub struct PlaneGround {
    plane: Plane,
    layers: LayerMask,
}

impl PlaneGround {
    pub fn new(plane: Plane, layers: LayerMask) -> Self {
        Self { plane, layers }
    }

    /// Horizontal plane at `height` with the given up axis
    pub fn flat(up: Vec3, height: f32) -> Self {
        Self::new(Plane::from_point_normal(up * height, up), LayerMask::ALL)
    }

    pub fn plane(&self) -> Plane {
        self.plane
    }
}

impl RayCast for PlaneGround {
    fn cast(&self, ray: &Ray, layers: LayerMask) -> Option<RayHit> {
        if !self.layers.intersects(layers) {
            return None;
        }

        let t = self.plane.intersect_ray(ray.origin, ray.direction)?;
        if t > ray.max_distance {
            return None;
        }

        let normal = if self.plane.normal.dot(ray.direction) > 0.0 {
            -self.plane.normal
        } else {
            self.plane.normal
        };

        Some(RayHit {
            point: ray.at(t),
            distance: t,
            normal,
        })
    }
}

/// World space triangle soup on a set of layers
#[derive(Debug, Clone)]
pub struct Collider {
    faces: Vec<Face>,
    layers: LayerMask,
}

impl Collider {
    pub fn new(faces: Vec<Face>, layers: LayerMask) -> Self {
        Self { faces, layers }
    }

    pub fn from_mesh(mesh: &Mesh, transform: Affine3A, layers: LayerMask) -> Self {
        Self::new(mesh.transformed_triangles(transform), layers)
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn layers(&self) -> LayerMask {
        self.layers
    }

    fn intersect(&self, ray: &Ray) -> Option<RayHit> {
        self.faces
            .iter()
            .filter_map(|face| {
                let t = intersect_triangle(ray.origin, ray.direction, face)?;
                (t <= ray.max_distance).then_some((t, face))
            })
            .min_by_key(|(t, _)| OrderedFloat(*t))
            .map(|(t, face)| {
                let mut normal = face.normal();
                if normal.dot(ray.direction) > 0.0 {
                    normal = -normal;
                }

                RayHit {
                    point: ray.at(t),
                    distance: t,
                    normal,
                }
            })
    }
}

/// Collection of static colliders addressable by a stable id
#[derive(Debug, Clone, Default)]
pub struct ColliderSet {
    colliders: Slab<Collider>,
}

impl ColliderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, collider: Collider) -> usize {
        self.colliders.insert(collider)
    }

    pub fn remove(&mut self, id: usize) -> Option<Collider> {
        self.colliders.try_remove(id)
    }

    pub fn get(&self, id: usize) -> Option<&Collider> {
        self.colliders.get(id)
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }
}

impl RayCast for ColliderSet {
    fn cast(&self, ray: &Ray, layers: LayerMask) -> Option<RayHit> {
        self.colliders
            .iter()
            .filter(|(_, v)| v.layers.intersects(layers))
            .filter_map(|(_, v)| v.intersect(ray))
            .min_by_key(|v| OrderedFloat(v.distance))
    }
}

/// Möller–Trumbore intersection, returns the ray parameter
fn intersect_triangle(origin: Vec3, direction: Vec3, face: &Face) -> Option<f32> {
    const EPSILON: f32 = 1e-8;

    let edge1 = face.p2 - face.p1;
    let edge2 = face.p3 - face.p1;

    let h = direction.cross(edge2);
    let a = edge1.dot(h);

    if a.abs() < EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = origin - face.p1;
    let u = f * s.dot(h);

    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * direction.dot(q);

    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);
    (t >= 0.0).then_some(t)
}
