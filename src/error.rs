//! Errors raised while synthesizing phantoms and configuring acquisitions

use std::path::PathBuf;

/// Opaque failure reported by an external projector/reconstructor.
pub type EngineError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid volume shape {0:?}: every dimension must be positive")]
    InvalidShape([usize; 3]),

    #[error("empty sampling range for {what}: {detail}")]
    DegenerateRange { what: &'static str, detail: String },

    #[error("could not parse `{input}` as {expected}")]
    Parse { expected: &'static str, input: String },

    #[error("invalid projection angle range: {0}")]
    InvalidAngleRange(String),

    #[error("unsupported noise model `{0}`; no noise was added")]
    UnsupportedNoiseModel(String),

    #[error("no noise level given: pass one explicitly or add a [noise] section to the config")]
    MissingNoiseLevel,

    #[error("noise level must be finite and non-negative, got {0}")]
    InvalidNoiseLevel(f32),

    #[error("acquisition geometry does not match data: {0}")]
    GeometryMismatch(String),

    #[error("rasterizer failed: {0}")]
    Rasterizer(String),

    #[error("external projection engine failed")]
    ExternalEngine(#[source] EngineError),

    #[error("I/O error on {path:?}")]
    Io { path: PathBuf, #[source] source: std::io::Error },

    #[error("could not write array to {path:?}")]
    NpyWrite { path: PathBuf, #[source] source: ndarray_npy::WriteNpyError },

    #[error("could not read array from {path:?}")]
    NpyRead { path: PathBuf, #[source] source: ndarray_npy::ReadNpyError },

    #[error("could not write archive {path:?}")]
    Npz { path: PathBuf, #[source] source: ndarray_npy::WriteNpzError },

    #[error("could not write image {path:?}")]
    Image { path: PathBuf, #[source] source: image::ImageError },

    #[error("could not parse config file {path:?}")]
    Config { path: PathBuf, #[source] source: toml::de::Error },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn degenerate(what: &'static str, detail: impl Into<String>) -> Self {
        Self::DegenerateRange { what, detail: detail.into() }
    }

    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
