//! Configuration file for dataset generation

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::{
    Error, Result,
    acquisition::AcquisitionConfig,
    compositor::SampleParams,
    dataset::FailurePolicy,
    io::ExportConfig,
    noise::NoiseConfig,
};

#[derive(Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {

    /// Seed for the random number generator. If absent, seeded from entropy
    #[serde(default)]
    pub seed: Option<u64>,

    /// Number of phantoms to generate
    #[serde(default = "default_samples")]
    pub samples: usize,

    /// Rescale each phantom so that its maximum is 1
    #[serde(default)]
    pub normalize: bool,

    #[serde(default)]
    pub policy: FailurePolicy,

    #[serde(default)]
    pub phantom: SampleParams,

    #[serde(default)]
    pub acquisition: AcquisitionConfig,

    /// Noise added to simulated sinograms. Absent means no noise
    pub noise: Option<NoiseConfig>,

    #[serde(default)]
    pub export: ExportConfig,
}

fn default_samples() -> usize { 30 }

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: None,
            samples: default_samples(),
            normalize: false,
            policy: FailurePolicy::default(),
            phantom: SampleParams::default(),
            acquisition: AcquisitionConfig::default(),
            noise: None,
            export: ExportConfig::default(),
        }
    }
}

pub fn read_config_file(path: &Path) -> Result<Config> {
    let config: String = fs::read_to_string(path).map_err(Error::io(path))?;
    parse_config(&config).map_err(|source| Error::Config { path: path.into(), source })
}

pub fn parse_config(text: &str) -> std::result::Result<Config, toml::de::Error> {
    toml::from_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        compositor::{Count, PrimitiveCounts},
        io::{ExportFormat, SliceMode},
        primitive::LineRotation,
    };
    use pretty_assertions::assert_eq;

    // ----- Test an example on-disk config file -----------------------------------------
    #[test]
    fn test_config_file() {
        let config = read_config_file("phantoms-config.toml".as_ref()).unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.samples, 30);
        assert!(!config.normalize);
        assert_eq!(config.policy, FailurePolicy::Abort);

        let phantom = &config.phantom;
        assert_eq!(phantom.shape,        [512, 512, 32]);
        assert_eq!(phantom.center_range, [ 30,  30,  5]);
        assert_eq!(phantom.axes_range,   [ 50,  20, 10]);
        assert_eq!(phantom.counts.ellipsoids, Count::Jittered { base: 15, extra: 5 });
        assert_eq!(phantom.counts.lines,      Count::Jittered { base:  5, extra: 5 });
        assert_eq!(phantom.counts.concentric, None);

        assert_eq!(config.acquisition.n_angles, 101);
        assert_eq!(config.acquisition.source_origin_distance, 7000.0);

        let noise = config.noise.unwrap();
        assert_eq!(noise.sigma, 0.01);
        assert_eq!(noise.model, "Gaussian");

        assert_eq!(config.export.format, ExportFormat::Npy);
        assert_eq!(config.export.name, "ellipsoid_dataset");
    }

    // ----- Some helpers to make the tests more concise ---------------------------------
    fn parse(input: &str) -> Config {
        parse_config(input).unwrap()
    }

    // ----- Test deserializing of individual aspects of the Config type ----------------
    #[test]
    fn empty_config_gives_defaults() {
        let config = parse("");
        assert_eq!(config, Config::default());
        assert_eq!(config.samples, 30);
        assert_eq!(config.seed, None);
        assert_eq!(config.noise, None);
        assert_eq!(config.phantom, SampleParams::default());
        assert_eq!(config.acquisition, AcquisitionConfig::default());
        assert_eq!(config.export, ExportConfig::default());
    }

    #[test]
    fn fixed_and_jittered_counts() {
        let config = parse(r#"
            [phantom.counts]
            ellipsoids = 3
            points     = 2
            lines      = { base = 1, extra = 4 }
            concentric = 1
        "#);
        assert_eq!(config.phantom.counts, PrimitiveCounts {
            ellipsoids: Count::Fixed(3),
            points:     Count::Fixed(2),
            lines:      Count::Jittered { base: 1, extra: 4 },
            concentric: Some(1),
        });
    }

    #[test]
    fn phantom_geometry() {
        let config = parse(r#"
            [phantom]
            shape         = [64, 64, 16]
            center_range  = [10, 10, 2]
            point_radius  = [2, 4]
            line_rotation = "all-axes"
        "#);
        assert_eq!(config.phantom.shape, [64, 64, 16]);
        assert_eq!(config.phantom.center_range, [10, 10, 2]);
        assert_eq!(config.phantom.point_radius, (2, 4));
        assert_eq!(config.phantom.line_rotation, LineRotation::AllAxes);
        assert_eq!(config.phantom.length_range, 80);
    }

    #[test]
    fn acquisition_and_export() {
        let config = parse(r#"
            policy = "skip-and-log"
            [acquisition]
            start_angle = 0
            end_angle   = 180
            n_angles    = 181
            [export]
            format = "tiff"
            mode   = "parallel"
            dir    = "out"
        "#);
        assert_eq!(config.policy, FailurePolicy::SkipAndLog);
        assert_eq!(config.acquisition.n_angles, 181);
        assert_eq!(config.acquisition.end_angle, 180.0);
        assert_eq!(config.export.format, ExportFormat::Tiff);
        assert_eq!(config.export.mode, SliceMode::Parallel);
        assert_eq!(config.export.dir, std::path::PathBuf::from("out"));
    }

    // ----- Make sure that unknown fields are not accepted -----------------------------
    #[test]
    fn config_reject_unknown_field() {
        assert!(parse_config("unknown_field = 666").is_err());
        assert!(parse_config("[phantom]\nwobble = 1").is_err());
    }

    #[test]
    fn missing_file() {
        assert!(matches!(read_config_file("no/such/file.toml".as_ref()), Err(Error::Io { .. })));
    }
}
