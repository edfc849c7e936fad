pub mod conform;
pub mod error;
pub mod instance;
pub mod mesh;
pub mod nav;
pub mod persist;
pub mod plane;
pub mod raycast;
pub mod session;
pub mod spacing;
pub mod transform;
mod util;

pub use conform::{ConformSettings, GroundConformer};
pub use error::{Error, Result};
pub use mesh::Mesh;
pub use raycast::{LayerMask, Ray, RayCast, RayHit};
pub use session::{BrushSession, BrushSettings};
pub use transform::MeshTransform;
