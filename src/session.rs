//! Interactive placement session: paint brush instances onto the ground, persist
//! them next to the scene, and hand them to the navmesh baker.
use std::{collections::BTreeSet, path::PathBuf};

use glam::Vec3;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use slab::Slab;

use crate::{
    conform::{ConformSettings, GroundConformer},
    error::{Error, Result},
    instance::{BrushInstance, BrushLibrary, BrushRef},
    nav::{NavArea, NavmeshBaker},
    persist::{asset_path, WeightAssets},
    raycast::{LayerMask, Ray, RayCast},
    spacing::Spacing,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushSettings {
    pub enabled: bool,
    pub brush_scale: f32,
    pub density: f32,
    pub y_bias: f32,
    pub area: NavArea,
    pub layers: LayerMask,
    pub cast_start_height: f32,
}

impl BrushSettings {
    pub const BRUSH_SCALE_RANGE: (f32, f32) = (0.0, 10.0);
    pub const DENSITY_RANGE: (f32, f32) = (0.0, 100.0);
    pub const Y_BIAS_RANGE: (f32, f32) = (0.0, 10.0);
    /// Ground casts must start above the sampled vertex
    pub const MIN_CAST_START_HEIGHT: f32 = 0.01;

    pub fn new() -> Self {
        Self {
            enabled: true,
            brush_scale: 1.0,
            density: 1.0,
            y_bias: 0.2,
            area: NavArea::USER,
            layers: LayerMask::ALL,
            cast_start_height: 100.0,
        }
    }

    /// Restricts the tunables to the ranges exposed in the editor
    pub fn clamped(mut self) -> Self {
        let clamp = |v: f32, (min, max): (f32, f32)| v.clamp(min, max);
        self.brush_scale = clamp(self.brush_scale, Self::BRUSH_SCALE_RANGE);
        self.density = clamp(self.density, Self::DENSITY_RANGE);
        self.y_bias = clamp(self.y_bias, Self::Y_BIAS_RANGE);
        // `max` also maps NaN to the minimum
        self.cast_start_height = self.cast_start_height.max(Self::MIN_CAST_START_HEIGHT);
        self
    }

    pub fn conform_settings(&self) -> ConformSettings {
        ConformSettings::new()
            .with_offset(self.y_bias)
            .with_layers(self.layers)
            .with_cast_start_height(self.cast_start_height)
    }
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Drag,
    Up,
    Move,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub alt: bool,
    pub shift: bool,
    pub control: bool,
}

impl Modifiers {
    pub fn any(&self) -> bool {
        self.alt || self.shift || self.control
    }
}

/// Pointer input from the scene viewport
#[derive(Debug, Clone, Copy)]
pub struct PointerEvent {
    /// World space ray under the cursor
    pub ray: Ray,
    pub kind: PointerKind,
    pub button: PointerButton,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    fn paints(&self) -> bool {
        matches!(self.kind, PointerKind::Down | PointerKind::Drag)
            && self.button == PointerButton::Left
            && !self.modifiers.any()
    }
}

/// Stable handle to a placed instance.
///
/// Slots are reused after deletion, the generation tells a stale handle apart
/// from the instance now occupying its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId {
    key: usize,
    generation: u64,
}

#[derive(Debug)]
struct Slot {
    generation: u64,
    instance: BrushInstance,
}

#[derive(Debug, Default)]
pub struct BrushSession {
    settings: BrushSettings,
    brush: Option<BrushRef>,
    library: BrushLibrary,
    instances: Slab<Slot>,
    /// Instance keys in placement order
    order: Vec<usize>,
    next_generation: u64,
    scene_path: Option<PathBuf>,
}

impl BrushSession {
    pub fn new(settings: BrushSettings, library: BrushLibrary) -> Self {
        Self {
            settings: settings.clamped(),
            brush: None,
            library,
            instances: Slab::new(),
            order: Vec::new(),
            next_generation: 0,
            scene_path: None,
        }
    }

    pub fn with_brush(mut self, brush: BrushRef) -> Self {
        self.brush = Some(brush);
        self
    }

    pub fn with_scene_path(mut self, scene_path: impl Into<PathBuf>) -> Self {
        self.scene_path = Some(scene_path.into());
        self
    }

    pub fn settings(&self) -> &BrushSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: BrushSettings) {
        self.settings = settings.clamped();
    }

    pub fn brush(&self) -> Option<&BrushRef> {
        self.brush.as_ref()
    }

    pub fn set_brush(&mut self, brush: Option<BrushRef>) {
        self.brush = brush;
    }

    pub fn library(&self) -> &BrushLibrary {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut BrushLibrary {
        &mut self.library
    }

    pub fn set_scene_path(&mut self, scene_path: Option<PathBuf>) {
        self.scene_path = scene_path;
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: InstanceId) -> Option<&BrushInstance> {
        self.instances
            .get(id.key)
            .filter(|slot| slot.generation == id.generation)
            .map(|slot| &slot.instance)
    }

    /// Instances in placement order
    pub fn instances(&self) -> impl Iterator<Item = (InstanceId, &BrushInstance)> {
        self.order.iter().map(|&key| {
            let slot = &self.instances[key];
            let id = InstanceId {
                key,
                generation: slot.generation,
            };

            (id, &slot.instance)
        })
    }

    fn conformer(&self) -> GroundConformer {
        GroundConformer::new(self.settings.conform_settings())
    }

    fn spacing(&self) -> Spacing {
        Spacing::new(self.settings.density)
    }

    fn insert(&mut self, instance: BrushInstance) -> InstanceId {
        let generation = self.next_generation;
        self.next_generation += 1;

        let key = self.instances.insert(Slot {
            generation,
            instance,
        });
        self.order.push(key);

        InstanceId { key, generation }
    }

    /// Paints at the pointer when the left button is pressed or dragged.
    ///
    /// Returns the placed instance, if any.
    pub fn handle_pointer<C>(
        &mut self,
        event: &PointerEvent,
        caster: &C,
    ) -> Result<Option<InstanceId>>
    where
        C: RayCast + ?Sized,
    {
        if !self.settings.enabled || self.brush.is_none() || !event.paints() {
            return Ok(None);
        }

        let Some(hit) = caster.cast(&event.ray, self.settings.layers) else {
            return Ok(None);
        };

        self.place(hit.point, caster)
    }

    /// Places the current brush at `point` unless it is too close to an existing instance
    pub fn place<C>(&mut self, point: Vec3, caster: &C) -> Result<Option<InstanceId>>
    where
        C: RayCast + ?Sized,
    {
        let Some(brush) = &self.brush else {
            return Ok(None);
        };

        if !self
            .spacing()
            .allows(point, self.instances().map(|(_, v)| v.position()))
        {
            tracing::trace!(?point, "placement rejected by spacing");
            return Ok(None);
        }

        let template = self.library.get(brush)?;
        let scale = template.scale * self.settings.brush_scale;
        let instance = BrushInstance::attach(template, point, scale, &self.conformer(), caster)?;

        let id = self.insert(instance);
        tracing::debug!(?id, ?point, "placed brush instance");

        Ok(Some(id))
    }

    /// Recreates the instances saved for the current scene
    pub fn load<C>(&mut self, caster: &C) -> Result<usize>
    where
        C: RayCast + ?Sized,
    {
        if !self.is_empty() {
            tracing::warn!("delete all objects before loading");
            return Err(Error::InstancesExist(self.len()));
        }

        let path = self.asset_path()?;
        let assets = WeightAssets::load(&path)?;

        let conformer = self.conformer();
        let instances = assets
            .records
            .iter()
            .map(|record| {
                let template = self.library.get(&record.brush)?;
                BrushInstance::attach(
                    template,
                    record.position,
                    record.local_scale,
                    &conformer,
                    caster,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        let count = instances.len();
        for instance in instances {
            self.insert(instance);
        }

        tracing::info!(count, path = %path.display(), "loaded weight data");
        Ok(count)
    }

    /// Saves all instances for the current scene. Does nothing if there are none.
    pub fn save(&self) -> Result<bool> {
        if self.is_empty() {
            return Ok(false);
        }

        let path = self.asset_path()?;
        let records = self.instances().map(|(_, v)| v.to_record()).collect_vec();
        WeightAssets::new(records).save(&path)?;

        Ok(true)
    }

    /// Marks all instances as static navigation geometry and rebuilds the navmesh
    pub fn bake(&mut self, baker: &mut dyn NavmeshBaker) -> Result<bool> {
        if self.is_empty() {
            return Ok(false);
        }

        let area = self.settings.area;
        for (_, slot) in &mut self.instances {
            slot.instance.nav_mut().mark_static(area);
        }

        let sources = self.instances().map(|(_, v)| v.nav_source()).collect_vec();

        baker.clear();
        baker.build(&sources)?;

        tracing::info!(sources = sources.len(), area = area.0, "baked navmesh");
        Ok(true)
    }

    /// Removes the given instances, returning how many were removed.
    ///
    /// Handles to instances that were already deleted are ignored.
    pub fn delete_selected(&mut self, selection: &[InstanceId]) -> usize {
        let selection: BTreeSet<_> = selection.iter().copied().collect();

        let before = self.order.len();
        let instances = &mut self.instances;
        self.order.retain(|&key| {
            let id = InstanceId {
                key,
                generation: instances[key].generation,
            };

            if selection.contains(&id) {
                instances.remove(key);
                false
            } else {
                true
            }
        });

        before - self.order.len()
    }

    /// Removes the most recently placed instance
    pub fn delete_previous(&mut self) -> Option<BrushInstance> {
        let key = self.order.pop()?;
        Some(self.instances.remove(key).instance)
    }

    pub fn delete_all(&mut self) {
        self.order.clear();
        self.instances.clear();
    }

    /// Tears the session down, discarding all unsaved instances
    pub fn close(&mut self) {
        self.settings.enabled = false;
        self.delete_all();
    }

    fn asset_path(&self) -> Result<PathBuf> {
        self.scene_path
            .as_deref()
            .and_then(asset_path)
            .ok_or_else(|| {
                tracing::warn!("scene is not saved");
                Error::SceneNotSaved
            })
    }
}
