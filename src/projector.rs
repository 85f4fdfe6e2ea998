//! Interface to an external cone-beam projection / reconstruction engine,
//! and the glue that turns a phantom into a (noisy) sinogram.

use ndarray::ArrayView3;
use rand::Rng;

use crate::{
    Error, Result,
    acquisition::{projector_layout, AcquisitionConfig, AcquisitionGeometry},
    error::EngineError,
    noise::NoiseConfig,
    types::{Sinogram, Volume},
};

/// Abstract interface for forward and backward projection engines.
///
/// Volumes are exchanged in projector layout `(slices, rows, cols)`;
/// sinograms as `(angles, rows, cols)`.
pub trait Projector {
    fn forward_project(&self, volume: ArrayView3<f32>, geometry: &AcquisitionGeometry) -> std::result::Result<Sinogram, EngineError>;

    fn reconstruct(
        &self,
        sinogram: ArrayView3<f32>,
        geometry: &AcquisitionGeometry,
        algorithm: &str,
        iterations: usize,
    ) -> std::result::Result<Volume, EngineError>;
}

/// A forward projection together with the geometry used to make it
#[derive(Clone, Debug)]
pub struct Simulation {
    pub geometry: AcquisitionGeometry,
    pub clean: Sinogram,
    /// `None` when no noise was requested
    pub noisy: Option<Sinogram>,
}

impl Simulation {
    /// The noisy sinogram if there is one, otherwise the clean one
    pub fn measured(&self) -> &Sinogram { self.noisy.as_ref().unwrap_or(&self.clean) }
}

/// Project an `(H, W, D)` phantom and optionally corrupt the result with noise.
pub fn simulate<P, R>(
    projector: &P,
    phantom: &Volume,
    acquisition: &AcquisitionConfig,
    noise: Option<&NoiseConfig>,
    rng: &mut R,
) -> Result<Simulation>
where
    P: Projector + ?Sized,
    R: Rng + ?Sized,
{
    let volume = projector_layout(phantom.view());
    let (d, h, w) = volume.dim();
    let geometry = AcquisitionGeometry::for_volume([d, h, w], acquisition)?;
    let clean = projector.forward_project(volume.view(), &geometry).map_err(Error::ExternalEngine)?;
    if clean.shape() != geometry.sinogram_shape() {
        return Err(Error::GeometryMismatch(format!(
            "projector returned sinogram of shape {:?}, geometry implies {:?}",
            clean.shape(), geometry.sinogram_shape()
        )))
    }
    let noisy = noise.map(|n| n.apply(&clean, rng)).transpose()?;
    Ok(Simulation { geometry, clean, noisy })
}

/// Reconstruct a volume from a previously generated sinogram, taking the
/// detector size from the sinogram itself.
pub fn reconstruct<P: Projector + ?Sized>(
    projector: &P,
    sinogram: &Sinogram,
    acquisition: &AcquisitionConfig,
    algorithm: &str,
    iterations: usize,
) -> Result<Volume> {
    let (a, r, c) = sinogram.dim();
    let geometry = AcquisitionGeometry::for_sinogram([a, r, c], acquisition)?;
    projector.reconstruct(sinogram.view(), &geometry, algorithm, iterations).map_err(Error::ExternalEngine)
}
