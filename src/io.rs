//! Writing datasets to disk, reading sinograms back

pub mod raw;
pub mod npy;
pub mod tiff;

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result, types::Dataset};

/// Which two axes of a volume become the rows and columns of each exported
/// image, the remaining axis indexing the images.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SliceMode {
    /// Images `H x W`, one per depth index
    #[default]
    Xy,
    /// Images `W x D`, one per row
    Yt,
    /// Images `H x D`, one per column
    Xt,
    /// All three of the above
    Parallel,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Single `.npz` archive
    Npz,
    /// Single `.npy` array
    #[default]
    Npy,
    /// Little-endian `f32` stream, no header
    Raw,
    /// One directory of 16-bit TIFF slices per sample
    Tiff,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    #[serde(default = "default_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub format: ExportFormat,
    /// Slice orientation, only used by `tiff`
    #[serde(default)]
    pub mode: SliceMode,
}

fn default_dir () -> PathBuf { PathBuf::from(".") }
fn default_name() -> String  { "ellipsoid_dataset".into() }

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            name: default_name(),
            format: ExportFormat::default(),
            mode: SliceMode::default(),
        }
    }
}

/// Write `data` as described by `config`, returning the paths created.
pub fn export(data: &Dataset, config: &ExportConfig) -> Result<Vec<PathBuf>> {
    let ExportConfig { dir, name, format, mode } = config;
    std::fs::create_dir_all(dir).map_err(Error::io(dir))?;
    let base = dir.join(name);
    let written = match format {
        ExportFormat::Npz => {
            let path = base.with_extension("npz");
            npy::write_npz(data, &path)?;
            vec![path]
        }
        ExportFormat::Npy => {
            let path = base.with_extension("npy");
            npy::write_npy(data, &path)?;
            vec![path]
        }
        ExportFormat::Raw => {
            let path = base.with_extension("raw");
            raw::write(data.iter().copied(), &path).map_err(Error::io(&path))?;
            vec![path]
        }
        ExportFormat::Tiff => tiff::write_slices(data, dir, name, *mode)?,
    };
    tracing::info!(files = written.len(), dir = %dir.display(), "exported dataset");
    Ok(written)
}

/// Read a sinogram stored as a 3-dimensional `f32` `.npy` array
pub fn read_sinogram(path: &Path) -> Result<crate::types::Sinogram> {
    npy::read_npy(path)
}
