//! Measurement noise for simulated sinograms

use std::str::FromStr;

use ndarray::Array3;
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::{Normal, StandardNormal};
use serde::Deserialize;

use crate::{Error, Result, types::Sinogram};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoiseModel {
    /// White Gaussian noise rescaled so that its Frobenius norm is `sigma`
    /// times the Frobenius norm of the sinogram. `sigma` is a relative noise
    /// level.
    Gaussian,
    /// White Gaussian noise with standard deviation `sigma` in every element.
    /// `sigma` is in the units of the sinogram.
    GaussianPerVoxel,
}

impl FromStr for NoiseModel {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Gaussian"         => Ok(Self::Gaussian),
            "GaussianPerVoxel" => Ok(Self::GaussianPerVoxel),
            other              => Err(Error::UnsupportedNoiseModel(other.to_string())),
        }
    }
}

impl std::fmt::Display for NoiseModel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(match self {
            Self::Gaussian         => "Gaussian",
            Self::GaussianPerVoxel => "GaussianPerVoxel",
        })
    }
}

/// Noise to be applied to simulated sinograms
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoiseConfig {
    pub sigma: f32,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_model() -> String { NoiseModel::Gaussian.to_string() }

impl NoiseConfig {

    /// Combine explicit settings with those from a config file, explicit ones
    /// winning. Without a noise level from either source there is no noise
    /// request at all, which is an error rather than a silent `sigma = 0`.
    pub fn resolve(file: Option<NoiseConfig>, sigma: Option<f32>, model: Option<String>) -> Result<Self> {
        let sigma = sigma
            .or(file.as_ref().map(|f| f.sigma))
            .ok_or(Error::MissingNoiseLevel)?;
        let model = model
            .or(file.map(|f| f.model))
            .unwrap_or_else(default_model);
        Ok(Self { sigma, model })
    }

    pub fn apply<R: Rng + ?Sized>(&self, sinogram: &Sinogram, rng: &mut R) -> Result<Sinogram> {
        inject_noise(sinogram, self.sigma, &self.model, rng)
    }
}

/// Return a noisy copy of `sinogram`, using the model called `model`.
///
/// `sinogram` itself is never modified: on error, including an unknown model
/// name, the caller still holds the clean data.
pub fn inject_noise<R: Rng + ?Sized>(sinogram: &Sinogram, sigma: f32, model: &str, rng: &mut R) -> Result<Sinogram> {
    let model: NoiseModel = model.parse()?;
    add_noise(sinogram, sigma, model, rng)
}

pub fn add_noise<R: Rng + ?Sized>(sinogram: &Sinogram, sigma: f32, model: NoiseModel, rng: &mut R) -> Result<Sinogram> {
    if !sigma.is_finite() || sigma < 0.0 { return Err(Error::InvalidNoiseLevel(sigma)) }
    if sigma == 0.0 { return Ok(sinogram.clone()) }
    let eta = match model {
        NoiseModel::Gaussian => {
            let mut eta: Array3<f32> = Array3::random_using(sinogram.raw_dim(), StandardNormal, rng);
            let eta_norm = frobenius(&eta);
            if eta_norm == 0.0 { return Ok(sinogram.clone()) }
            let scale = sigma as f64 * frobenius(sinogram) / eta_norm;
            eta.mapv_inplace(|e| (e as f64 * scale) as f32);
            eta
        }
        NoiseModel::GaussianPerVoxel => {
            let normal = Normal::new(0.0, sigma).map_err(|_| Error::InvalidNoiseLevel(sigma))?;
            Array3::random_using(sinogram.raw_dim(), normal, rng)
        }
    };
    tracing::debug!(%model, sigma, "added noise");
    Ok(sinogram + &eta)
}

/// Square root of the sum of squares of all elements
pub fn frobenius(a: &Array3<f32>) -> f64 {
    a.iter().map(|&x| (x as f64).powi(2)).sum::<f64>().sqrt()
}

#[cfg(test)]
mod test_noise {
    use super::*;
    use float_eq::assert_float_eq;
    use rand::SeedableRng;
    use rand_isaac::Isaac64Rng;
    use rstest::rstest;

    fn sinogram() -> Sinogram {
        Array3::from_shape_fn([11, 20, 30], |(a, r, c)| 1.0 + (a + 2 * r + 3 * c) as f32 / 10.0)
    }

    #[test]
    fn resolve_needs_a_noise_level() {
        assert!(matches!(NoiseConfig::resolve(None, None, None), Err(Error::MissingNoiseLevel)));
        assert!(matches!(NoiseConfig::resolve(None, None, Some("GaussianPerVoxel".into())), Err(Error::MissingNoiseLevel)));
    }

    #[test]
    fn resolve_prefers_explicit_settings() {
        let file = || Some(NoiseConfig { sigma: 0.1, model: "GaussianPerVoxel".into() });
        let explicit = NoiseConfig::resolve(None, Some(0.2), None).unwrap();
        assert_eq!(explicit, NoiseConfig { sigma: 0.2, model: "Gaussian".into() });
        assert_eq!(NoiseConfig::resolve(file(), None, None).unwrap(), file().unwrap());
        assert_eq!(NoiseConfig::resolve(file(), Some(0.3), Some("Gaussian".into())).unwrap(),
                   NoiseConfig { sigma: 0.3, model: "Gaussian".into() });
    }

    #[rstest(model, case("Gaussian"), case("GaussianPerVoxel"))]
    fn zero_sigma_is_identity(model: &str) {
        let s = sinogram();
        let mut rng = Isaac64Rng::seed_from_u64(1);
        assert_eq!(inject_noise(&s, 0.0, model, &mut rng).unwrap(), s);
    }

    #[test]
    fn relative_gaussian_noise_has_requested_energy() {
        let s = sinogram();
        let mut rng = Isaac64Rng::seed_from_u64(2);
        let noisy = inject_noise(&s, 0.05, "Gaussian", &mut rng).unwrap();
        let eta = &noisy - &s;
        assert_float_eq!(frobenius(&eta) / frobenius(&s), 0.05, rmax <= 1e-4);
    }

    #[test]
    fn per_voxel_noise_has_requested_standard_deviation() {
        let s = sinogram();
        let mut rng = Isaac64Rng::seed_from_u64(3);
        let noisy = inject_noise(&s, 0.5, "GaussianPerVoxel", &mut rng).unwrap();
        let eta = &noisy - &s;
        let n = eta.len() as f64;
        let mean = eta.iter().map(|&e| e as f64).sum::<f64>() / n;
        let std = (eta.iter().map(|&e| (e as f64 - mean).powi(2)).sum::<f64>() / n).sqrt();
        assert_float_eq!(mean, 0.0, abs <= 0.03);
        assert_float_eq!(std,  0.5, rmax <= 0.03);
    }

    #[test]
    fn the_two_models_differ() {
        let s = sinogram();
        let a = inject_noise(&s, 0.1, "Gaussian",         &mut Isaac64Rng::seed_from_u64(4)).unwrap();
        let b = inject_noise(&s, 0.1, "GaussianPerVoxel", &mut Isaac64Rng::seed_from_u64(4)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn unsupported_model_leaves_data_alone() {
        let s = sinogram();
        let before = s.clone();
        let mut rng = Isaac64Rng::seed_from_u64(5);
        let result = inject_noise(&s, 0.1, "Poisson", &mut rng);
        assert!(matches!(result, Err(Error::UnsupportedNoiseModel(ref name)) if name == "Poisson"));
        assert_eq!(s, before);
    }

    #[rstest(sigma, case(-0.1), case(f32::NAN), case(f32::INFINITY))]
    fn invalid_sigma(sigma: f32) {
        let mut rng = Isaac64Rng::seed_from_u64(6);
        let result = inject_noise(&sinogram(), sigma, "Gaussian", &mut rng);
        assert!(matches!(result, Err(Error::InvalidNoiseLevel(_))));
    }

    #[test]
    fn zero_sinogram_stays_zero_under_relative_noise() {
        let s = Sinogram::zeros([3, 4, 5]);
        let mut rng = Isaac64Rng::seed_from_u64(7);
        assert_eq!(inject_noise(&s, 0.3, "Gaussian", &mut rng).unwrap(), s);
    }

    #[test]
    fn model_names_round_trip() {
        for model in [NoiseModel::Gaussian, NoiseModel::GaussianPerVoxel] {
            assert_eq!(model.to_string().parse::<NoiseModel>().unwrap(), model);
        }
    }

    #[test]
    fn config_default_model() {
        let config: NoiseConfig = toml::from_str("sigma = 0.01").unwrap();
        assert_eq!(config.model, "Gaussian");
    }
}
