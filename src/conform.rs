use glam::Vec3;
use itertools::Itertools;

use crate::{
    mesh::Mesh,
    raycast::{LayerMask, Ray, RayCast},
    transform::MeshTransform,
};

#[derive(Debug, Clone, Copy)]
pub struct ConformSettings {
    /// World direction considered up. Rays are cast along the negation.
    pub up: Vec3,
    /// Height above each vertex the downward ray starts from
    pub cast_start_height: f32,
    /// Distance along `up` the conformed vertex is lifted off the ground
    pub offset: f32,
    pub layers: LayerMask,
}

impl ConformSettings {
    pub fn new() -> Self {
        Self {
            up: Vec3::Y,
            cast_start_height: 100.0,
            offset: 0.2,
            layers: LayerMask::ALL,
        }
    }

    pub fn with_up(mut self, up: Vec3) -> Self {
        self.up = up;
        self
    }

    pub fn with_offset(mut self, offset: f32) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_cast_start_height(mut self, cast_start_height: f32) -> Self {
        self.cast_start_height = cast_start_height;
        self
    }

    pub fn with_layers(mut self, layers: LayerMask) -> Self {
        self.layers = layers;
        self
    }
}

impl Default for ConformSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// Projects mesh vertices onto the ground along a fixed up axis.
///
/// Each vertex is handled independently: it is moved to world space, a ray is
/// cast straight down from above it, and the hit point (or the vertex itself
/// when nothing is hit) is lifted by the offset and moved back to local space.
#[derive(Debug, Clone, Copy)]
pub struct GroundConformer {
    settings: ConformSettings,
}

impl GroundConformer {
    pub fn new(mut settings: ConformSettings) -> Self {
        settings.up = settings.up.normalize();
        assert!(settings.up.is_finite(), "up axis must be non zero");
        assert!(
            settings.cast_start_height > 0.0,
            "cast start height must be positive"
        );

        Self { settings }
    }

    pub fn settings(&self) -> &ConformSettings {
        &self.settings
    }

    /// Returns the ground point directly below `world_pos`, if any
    pub fn cast_down<C>(&self, caster: &C, world_pos: Vec3) -> Option<Vec3>
    where
        C: RayCast + ?Sized,
    {
        let up = self.settings.up;
        let ray = Ray::new(world_pos + up * self.settings.cast_start_height, -up);

        caster.cast(&ray, self.settings.layers).map(|v| v.point)
    }

    pub fn conform_point<C>(&self, local: Vec3, transform: &MeshTransform, caster: &C) -> Vec3
    where
        C: RayCast + ?Sized,
    {
        let world_pos = transform.to_world(local);
        let ground = self.cast_down(caster, world_pos).unwrap_or(world_pos);

        transform.to_local(ground + self.settings.up * self.settings.offset)
    }

    pub fn conform_vertices<C>(
        &self,
        vertices: &[Vec3],
        transform: &MeshTransform,
        caster: &C,
    ) -> Vec<Vec3>
    where
        C: RayCast + ?Sized,
    {
        debug_assert!(transform.is_inverse_pair());

        vertices
            .iter()
            .map(|&v| self.conform_point(v, transform, caster))
            .collect_vec()
    }

    /// Returns a deformed copy of `mesh` with the same topology
    pub fn conform<C>(&self, mesh: &Mesh, transform: &MeshTransform, caster: &C) -> Mesh
    where
        C: RayCast + ?Sized,
    {
        let positions = self.conform_vertices(mesh.positions(), transform, caster);

        tracing::debug!(
            vertices = positions.len(),
            offset = self.settings.offset,
            "conformed mesh to ground"
        );

        mesh.with_positions(positions)
    }
}

impl Default for GroundConformer {
    fn default() -> Self {
        Self::new(ConformSettings::default())
    }
}

#[cfg(test)]
mod test {
    use std::cell::Cell;

    use glam::{vec3, Affine3A, Quat, Vec3};

    use super::{ConformSettings, GroundConformer};
    use crate::{
        mesh::Mesh,
        raycast::{LayerMask, PlaneGround, Ray, RayHit},
        transform::MeshTransform,
    };

    fn miss(_: &Ray, _: LayerMask) -> Option<RayHit> {
        None
    }

    fn hit_at(point: Vec3) -> impl Fn(&Ray, LayerMask) -> Option<RayHit> {
        move |ray: &Ray, _: LayerMask| {
            Some(RayHit {
                point,
                distance: ray.origin.distance(point),
                normal: Vec3::Y,
            })
        }
    }

    /// Ground height varies with x and z so each vertex gets a distinct hit
    fn slope(ray: &Ray, _: LayerMask) -> Option<RayHit> {
        let height = 0.5 * ray.origin.x - 0.25 * ray.origin.z + 2.0;
        let point = ray.origin.with_y(height);
        Some(RayHit {
            point,
            distance: ray.origin.y - height,
            normal: Vec3::Y,
        })
    }

    fn placed() -> MeshTransform {
        MeshTransform::new(Affine3A::from_scale_rotation_translation(
            vec3(2.0, 1.5, 2.0),
            Quat::from_rotation_y(0.7),
            vec3(10.0, 3.0, -4.0),
        ))
        .unwrap()
    }

    #[test]
    fn two_vertices_on_flat_ground() {
        let conformer = GroundConformer::new(ConformSettings::new().with_offset(0.2));
        let vertices = [vec3(0.0, 0.0, 0.0), vec3(1.0, 0.0, 0.0)];

        let ground = |ray: &Ray, _: LayerMask| {
            Some(RayHit {
                point: ray.origin.with_y(5.0),
                distance: ray.origin.y - 5.0,
                normal: Vec3::Y,
            })
        };

        let res = conformer.conform_vertices(&vertices, &MeshTransform::identity(), &ground);

        assert_eq!(res.len(), 2);
        assert!(res[0].abs_diff_eq(vec3(0.0, 5.2, 0.0), 1e-5), "{res:?}");
        assert!(res[1].abs_diff_eq(vec3(1.0, 5.2, 0.0), 1e-5), "{res:?}");
    }

    #[test]
    fn shape_preserved() {
        let conformer = GroundConformer::default();
        let mesh = Mesh::grid(8);

        let res = conformer.conform(&mesh, &placed(), &slope);

        assert_eq!(res.vertex_count(), mesh.vertex_count());
        assert_eq!(res.indices(), mesh.indices());
    }

    #[test]
    fn miss_keeps_position() {
        let conformer = GroundConformer::new(ConformSettings::new().with_offset(0.0));
        let mesh = Mesh::cube();
        let transform = placed();

        let res = conformer.conform(&mesh, &transform, &miss);

        for (a, b) in res.positions().iter().zip(mesh.positions()) {
            assert!(a.abs_diff_eq(*b, 1e-4), "{a} != {b}");
        }
    }

    #[test]
    fn miss_still_applies_offset() {
        let conformer = GroundConformer::new(ConformSettings::new().with_offset(0.5));
        let vertices = [vec3(1.0, 2.0, 3.0)];

        let res = conformer.conform_vertices(&vertices, &MeshTransform::identity(), &miss);
        assert!(res[0].abs_diff_eq(vec3(1.0, 2.5, 3.0), 1e-6));
    }

    #[test]
    fn constant_hit_collapses_to_point() {
        let h = vec3(3.0, -1.0, 7.0);
        let conformer = GroundConformer::new(ConformSettings::new().with_offset(0.75));
        let transform = placed();
        let mesh = Mesh::grid(3);

        let res = conformer.conform(&mesh, &transform, &hit_at(h));

        for &p in res.positions() {
            let world = transform.to_world(p);
            assert!(world.abs_diff_eq(h + Vec3::Y * 0.75, 1e-4), "{world}");
        }
    }

    #[test]
    fn deterministic() {
        let conformer = GroundConformer::default();
        let mesh = Mesh::grid(6);
        let transform = placed();

        let a = conformer.conform(&mesh, &transform, &slope);
        let b = conformer.conform(&mesh, &transform, &slope);

        assert_eq!(a, b);
    }

    #[test]
    fn processing_order_independent() {
        let conformer = GroundConformer::default();
        let mesh = Mesh::grid(5);
        let transform = placed();

        let forward = conformer.conform(&mesh, &transform, &slope);

        let mut reversed = vec![Vec3::ZERO; mesh.vertex_count()];
        for (i, &v) in mesh.positions().iter().enumerate().rev() {
            reversed[i] = conformer.conform_point(v, &transform, &slope);
        }

        assert_eq!(forward.positions(), &reversed[..]);
    }

    #[test]
    fn input_not_mutated() {
        let conformer = GroundConformer::default();
        let mesh = Mesh::grid(2);
        let copy = mesh.clone();

        let _ = conformer.conform(&mesh, &placed(), &slope);
        assert_eq!(mesh, copy);
    }

    #[test]
    fn casts_from_above_along_up_axis() {
        let up = vec3(0.0, 0.0, 1.0);
        let conformer = GroundConformer::new(
            ConformSettings::new()
                .with_up(up * 3.0)
                .with_cast_start_height(50.0)
                .with_offset(1.0)
                .with_layers(LayerMask::layer(6)),
        );

        let seen = Cell::new(None);
        let ground = PlaneGround::flat(up, -2.0);
        let caster = |ray: &Ray, layers: LayerMask| {
            seen.set(Some((*ray, layers)));
            crate::raycast::RayCast::cast(&ground, ray, layers)
        };

        let res = conformer.conform_vertices(
            &[vec3(1.0, 1.0, 4.0)],
            &MeshTransform::identity(),
            &caster,
        );

        let (ray, layers) = seen.get().unwrap();
        assert!(ray.origin.abs_diff_eq(vec3(1.0, 1.0, 54.0), 1e-5));
        assert!(ray.direction.abs_diff_eq(-up, 1e-6));
        assert_eq!(ray.max_distance, f32::INFINITY);
        assert_eq!(layers, LayerMask::layer(6));

        assert!(res[0].abs_diff_eq(vec3(1.0, 1.0, -1.0), 1e-4), "{res:?}");
    }

    #[test]
    fn conforms_to_sloped_plane() {
        let conformer = GroundConformer::new(ConformSettings::new().with_offset(0.0));
        let transform = placed();
        let res = conformer.conform(&Mesh::grid(4), &transform, &slope);

        for &p in res.positions() {
            let world = transform.to_world(p);
            let expected = 0.5 * world.x - 0.25 * world.z + 2.0;
            assert!((world.y - expected).abs() < 1e-3, "{world}");
        }
    }
}
