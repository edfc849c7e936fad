use serde::{Deserialize, Serialize};

use crate::{error::Result, mesh::Face};

/// Navigation area index, used by the host to weight path costs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NavArea(pub u8);

impl NavArea {
    /// First user defined area, the default weight brush area
    pub const USER: Self = Self(3);
}

impl Default for NavArea {
    fn default() -> Self {
        Self::USER
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavFlags {
    pub navigation_static: bool,
    pub area: NavArea,
}

impl NavFlags {
    pub fn mark_static(&mut self, area: NavArea) {
        self.navigation_static = true;
        self.area = area;
    }
}

/// World space geometry contributed to a navmesh bake
#[derive(Debug, Clone, Copy)]
pub struct NavSource<'a> {
    pub faces: &'a [Face],
    pub area: NavArea,
}

/// Host navigation subsystem
pub trait NavmeshBaker {
    /// Discard all previously baked navmeshes
    fn clear(&mut self);

    /// Rebuild the navmesh from the static sources
    fn build(&mut self, sources: &[NavSource<'_>]) -> Result<()>;
}
