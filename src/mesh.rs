use glam::{Affine3A, Vec3};
use itertools::Itertools;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    pub(crate) p1: Vec3,
    pub(crate) p2: Vec3,
    pub(crate) p3: Vec3,
}

impl Face {
    pub fn new(p1: Vec3, p2: Vec3, p3: Vec3) -> Self {
        assert!(p1.is_finite());
        assert!(p2.is_finite());
        assert!(p3.is_finite());
        Self { p1, p2, p3 }
    }

    pub fn normal(&self) -> Vec3 {
        (self.p1 - self.p3).cross(self.p2 - self.p3).normalize()
    }

    pub fn points(&self) -> [Vec3; 3] {
        [self.p1, self.p2, self.p3]
    }

    pub fn map(&self, mut f: impl FnMut(Vec3) -> Vec3) -> Self {
        Self::new(f(self.p1), f(self.p2), f(self.p3))
    }
}

/// Indexed triangle mesh with positions in local space.
///
/// The index buffer is the topology and is never touched by ground
/// conformance, only `positions` are replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    positions: Vec<Vec3>,
    indices: Vec<u32>,
}

impl Mesh {
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        assert_eq!(indices.len() % 3, 0, "indices must form a triangle list");
        assert!(
            indices.iter().all(|&i| (i as usize) < positions.len()),
            "index out of bounds"
        );

        Self { positions, indices }
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Returns a copy of this mesh sharing the topology but with new positions
    pub fn with_positions(&self, positions: Vec<Vec3>) -> Self {
        assert_eq!(
            positions.len(),
            self.positions.len(),
            "vertex count must be preserved"
        );

        Self {
            positions,
            indices: self.indices.clone(),
        }
    }

    pub fn triangles(&self) -> impl Iterator<Item = Face> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            Face::new(
                self.positions[tri[0] as usize],
                self.positions[tri[1] as usize],
                self.positions[tri[2] as usize],
            )
        })
    }

    /// Triangles transformed into the space given by `transform`
    pub fn transformed_triangles(&self, transform: Affine3A) -> Vec<Face> {
        self.triangles()
            .map(|face| face.map(|p| transform.transform_point3(p)))
            .collect_vec()
    }

    pub fn plane() -> Self {
        Self::grid(1)
    }

    /// A flat square in the xz plane spanning -1..1 with `subdivisions` quads per side.
    ///
    /// This is the shape of the stock weight brush, dense enough to follow the
    /// terrain once conformed.
    pub fn grid(subdivisions: u32) -> Self {
        assert!(subdivisions > 0);

        let n = subdivisions + 1;
        let step = 2.0 / subdivisions as f32;

        let positions = (0..n)
            .cartesian_product(0..n)
            .map(|(z, x)| Vec3::new(-1.0 + x as f32 * step, 0.0, -1.0 + z as f32 * step))
            .collect_vec();

        let mut indices = Vec::with_capacity((subdivisions * subdivisions * 6) as usize);
        for z in 0..subdivisions {
            for x in 0..subdivisions {
                let p1 = z * n + x;
                let p2 = p1 + 1;
                let p3 = p1 + n;
                let p4 = p3 + 1;

                // ccw when seen from above
                indices.extend_from_slice(&[p1, p3, p2, p2, p3, p4]);
            }
        }

        Self::new(positions, indices)
    }

    pub fn cube() -> Self {
        let positions = vec![
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(-1.0, 1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(1.0, 1.0, -1.0),
        ];

        #[rustfmt::skip]
        let indices = vec![
            2, 1, 0, 0, 3, 2,
            4, 5, 6, 6, 7, 4,
            5, 4, 0, 0, 1, 5,
            6, 5, 1, 1, 2, 6,
            7, 6, 2, 2, 3, 7,
            4, 7, 3, 3, 0, 4,
        ];

        Self::new(positions, indices)
    }
}
