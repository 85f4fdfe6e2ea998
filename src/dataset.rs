//! Generate many independent phantoms and stack them into one array

use ndarray::{Array4, Axis};
use rand::{Rng, SeedableRng};
use rand_isaac::Isaac64Rng;
use rayon::prelude::*;
use serde::Deserialize;

use crate::{
    Error, Result,
    compositor::{generate_sample, SampleParams},
    raster::Rasterizer,
    types::{Dataset, Volume},
};

/// What to do when one sample cannot be generated
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop and report the first failure
    #[default]
    Abort,
    /// Leave the sample out, log it and record it in the report
    SkipAndLog,
}

/// Outcome of a dataset generation run
#[derive(Debug, Default)]
pub struct DatasetReport {
    pub requested: usize,
    /// Indices of the samples which made it into the dataset
    pub generated: Vec<usize>,
    /// Indices of skipped samples, with the reason
    pub skipped: Vec<(usize, Error)>,
}

impl DatasetReport {
    pub fn n_skipped(&self) -> usize { self.skipped.len() }
}

#[derive(Debug)]
pub struct GeneratedDataset {
    /// Shape `(N, H, W, D)` where `N` excludes skipped samples
    pub volumes: Dataset,
    pub report: DatasetReport,
}

/// Produces datasets of phantoms sharing the same `SampleParams`.
pub struct Generator<'a, Z: Rasterizer + ?Sized> {
    params: &'a SampleParams,
    rasterizer: &'a Z,
    policy: FailurePolicy,
    normalize: bool,
}

impl<'a, Z: Rasterizer + ?Sized> Generator<'a, Z> {

    pub fn new(params: &'a SampleParams, rasterizer: &'a Z) -> Self {
        Self { params, rasterizer, policy: FailurePolicy::default(), normalize: false }
    }

    pub fn policy(self, policy: FailurePolicy) -> Self { Self { policy, ..self } }

    /// Scale each volume so that its maximum becomes 1
    pub fn normalize(self, normalize: bool) -> Self { Self { normalize, ..self } }

    fn one<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Volume> {
        let mut volume = generate_sample(self.params, rng, self.rasterizer)?.volume;
        if self.normalize { normalize_to_max(&mut volume) }
        Ok(volume)
    }

    /// Generate `n` samples one after another, all drawing from `rng`.
    ///
    /// `progress` is called with the index of each sample once it is done.
    pub fn generate<R: Rng + ?Sized>(&self, n: usize, rng: &mut R, mut progress: impl FnMut(usize)) -> Result<GeneratedDataset> {
        self.params.validate()?;
        let mut results = Vec::with_capacity(n);
        for i in 0..n {
            let result = self.one(rng);
            let failed = result.is_err();
            results.push((i, result));
            progress(i);
            if failed && self.policy == FailurePolicy::Abort { break }
        }
        self.assemble(n, results)
    }

    /// Generate `n` samples on the rayon thread pool.
    ///
    /// Sample `i` uses its own generator seeded from `seed` and `i`, so the
    /// result depends only on `seed`, not on the number of threads.
    pub fn generate_par(&self, n: usize, seed: u64, progress: impl Fn(usize) + Sync) -> Result<GeneratedDataset>
    where
        Z: Sync,
    {
        self.params.validate()?;
        let results = (0..n)
            .into_par_iter()
            .map(|i| {
                let mut rng = sample_rng(seed, i);
                let result = self.one(&mut rng);
                progress(i);
                (i, result)
            })
            .collect();
        self.assemble(n, results)
    }

    fn assemble(&self, requested: usize, results: Vec<(usize, Result<Volume>)>) -> Result<GeneratedDataset> {
        let mut report = DatasetReport { requested, ..Default::default() };
        let mut volumes = Vec::with_capacity(results.len());
        for (i, result) in results {
            match result {
                Ok(volume) => {
                    report.generated.push(i);
                    volumes.push(volume);
                }
                Err(e) => match self.policy {
                    FailurePolicy::Abort => return Err(e),
                    FailurePolicy::SkipAndLog => {
                        tracing::warn!(sample = i, error = %e, "skipping sample");
                        report.skipped.push((i, e));
                    }
                }
            }
        }
        tracing::info!(generated = report.generated.len(), skipped = report.n_skipped(), "dataset complete");
        Ok(GeneratedDataset { volumes: stack(self.params.shape, &volumes), report })
    }
}

/// Independent generator for sample `index` of a dataset seeded with `seed`
pub fn sample_rng(seed: u64, index: usize) -> Isaac64Rng {
    let mut seeder = Isaac64Rng::seed_from_u64(seed);
    let mut key = seeder.gen::<u64>() ^ (index as u64);
    // One round of splitmix64 to spread nearby indices apart
    key = key.wrapping_add(0x9E37_79B9_7F4A_7C15);
    key = (key ^ (key >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    key = (key ^ (key >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    Isaac64Rng::seed_from_u64(key ^ (key >> 31))
}

pub fn normalize_to_max(volume: &mut Volume) {
    let max = volume.fold(0.0_f32, |m, &v| m.max(v));
    if max > 0.0 { volume.mapv_inplace(|v| v / max) }
}

fn stack([h, w, d]: [usize; 3], volumes: &[Volume]) -> Dataset {
    let mut data = Array4::zeros([volumes.len(), h, w, d]);
    for (mut slot, volume) in data.axis_iter_mut(Axis(0)).zip(volumes) {
        slot.assign(volume);
    }
    data
}
