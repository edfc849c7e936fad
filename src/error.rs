use std::path::PathBuf;

use crate::instance::BrushRef;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("brush {brush} does not contain a mesh")]
    MissingMeshSource { brush: BrushRef },
    #[error("local to world transform is not invertible")]
    DegenerateTransform,
    #[error("unknown brush {0}")]
    UnknownBrush(BrushRef),
    #[error("scene is not saved, save the scene before saving weight data")]
    SceneNotSaved,
    #[error("no weight data found at {}", .0.display())]
    NoDataFound(PathBuf),
    #[error("{0} brush instances exist, delete all instances before loading")]
    InstancesExist(usize),
    #[error("io error at {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to (de)serialize weight data")]
    Serialize(#[from] serde_json::Error),
    #[error("navmesh bake failed: {0}")]
    Bake(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
