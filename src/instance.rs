use std::{collections::BTreeMap, fmt};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{
    conform::GroundConformer,
    error::{Error, Result},
    mesh::Mesh,
    nav::{NavFlags, NavSource},
    persist::WeightRecord,
    raycast::{Collider, LayerMask, RayCast},
    transform::MeshTransform,
};

/// Reference to a brush template, such as a prefab path
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BrushRef(String);

impl BrushRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BrushRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Template object copies are made from
#[derive(Debug, Clone)]
pub struct BrushTemplate {
    pub id: BrushRef,
    pub mesh: Option<Mesh>,
    /// Scale of the template itself, multiplied by the session brush scale
    pub scale: Vec3,
}

impl BrushTemplate {
    pub fn new(id: BrushRef, mesh: Mesh) -> Self {
        Self {
            id,
            mesh: Some(mesh),
            scale: Vec3::ONE,
        }
    }

    /// A template without any mesh source
    pub fn empty(id: BrushRef) -> Self {
        Self {
            id,
            mesh: None,
            scale: Vec3::ONE,
        }
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct BrushLibrary {
    templates: BTreeMap<BrushRef, BrushTemplate>,
}

impl BrushLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, template: BrushTemplate) -> Option<BrushTemplate> {
        self.templates.insert(template.id.clone(), template)
    }

    pub fn with(mut self, template: BrushTemplate) -> Self {
        self.insert(template);
        self
    }

    pub fn get(&self, id: &BrushRef) -> Result<&BrushTemplate> {
        self.templates
            .get(id)
            .ok_or_else(|| Error::UnknownBrush(id.clone()))
    }

    pub fn contains(&self, id: &BrushRef) -> bool {
        self.templates.contains_key(id)
    }
}

/// A placed copy of a brush template, conformed to the ground
#[derive(Debug, Clone)]
pub struct BrushInstance {
    brush: BrushRef,
    position: Vec3,
    scale: Vec3,
    mesh: Mesh,
    collider: Collider,
    nav: NavFlags,
}

impl BrushInstance {
    /// Instantiates `template` at `position` and conforms its mesh to the ground
    pub fn attach<C>(
        template: &BrushTemplate,
        position: Vec3,
        scale: Vec3,
        conformer: &GroundConformer,
        caster: &C,
    ) -> Result<Self>
    where
        C: RayCast + ?Sized,
    {
        let source = template.mesh.as_ref().ok_or_else(|| Error::MissingMeshSource {
            brush: template.id.clone(),
        })?;

        let transform = MeshTransform::from_position_scale(position, scale)?;
        let mesh = conformer.conform(source, &transform, caster);

        // Collision proxy is rebuilt right away from the committed mesh
        let collider = Collider::from_mesh(&mesh, transform.local_to_world(), LayerMask::ALL);

        Ok(Self {
            brush: template.id.clone(),
            position,
            scale,
            mesh,
            collider,
            nav: NavFlags::default(),
        })
    }

    pub fn brush(&self) -> &BrushRef {
        &self.brush
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Conformed mesh in the instance's local space
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// World space collision proxy of the conformed mesh
    pub fn collider(&self) -> &Collider {
        &self.collider
    }

    pub fn transform(&self) -> Result<MeshTransform> {
        MeshTransform::from_position_scale(self.position, self.scale)
    }

    pub fn nav(&self) -> NavFlags {
        self.nav
    }

    pub fn nav_mut(&mut self) -> &mut NavFlags {
        &mut self.nav
    }

    pub fn nav_source(&self) -> NavSource<'_> {
        NavSource {
            faces: self.collider.faces(),
            area: self.nav.area,
        }
    }

    pub fn to_record(&self) -> WeightRecord {
        WeightRecord {
            brush: self.brush.clone(),
            position: self.position,
            local_scale: self.scale,
        }
    }
}
