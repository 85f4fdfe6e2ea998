//! Synthetic CT phantoms for sparse-view reconstruction experiments.
//!
//! Volumes are built by stacking randomly drawn ellipsoids, points, line
//! segments and concentric shells; cone-beam acquisition geometries are
//! derived from their shapes, and simulated sinograms can be perturbed with
//! Gaussian noise.

mod types;
pub use types::*;

pub mod error;
pub use error::{Error, Result, EngineError};

pub mod raster;
pub mod primitive;
pub mod compositor;
pub mod dataset;
pub mod acquisition;
pub mod noise;
pub mod projector;
pub mod io;
pub mod config;
pub mod logging;
pub mod utils;

pub use geometry::{Ellipsoid, Angles};
