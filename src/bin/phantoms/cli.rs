/// Command line interface for `phantoms` executable
#[derive(clap::Parser, Debug, Clone)]
#[clap(
    name = "phantoms",
    about = "Synthetic CT phantoms for sparse-view reconstruction",
    version,
)]
pub (super) struct Cli {
    /// TOML file with settings. Command line options override its values
    #[clap(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// More diagnostic output (-v, -vv, -vvv). RUST_LOG takes precedence
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub (super) enum Command {

    /// Generate a dataset of random phantoms and export it
    Generate(Generate),

    /// Describe the acquisition geometry for a volume or sinogram
    Geometry(Geometry),

    /// Add noise to a sinogram stored in a `.npy` file
    Noise(Noise),
}

#[derive(clap::Args, Debug, Clone)]
pub (super) struct Generate {
    /// Number of phantoms
    #[clap(short = 'n', long)]
    pub samples: Option<usize>,

    /// Seed for reproducible datasets. Drawn from entropy if absent
    #[clap(short, long)]
    pub seed: Option<u64>,

    /// Volume shape `H,W,D` in voxels
    #[clap(long, value_parser = parse_triplet::<usize>)]
    pub shape: Option<[usize; 3]>,

    /// Exact numbers of ellipsoids, points, lines and concentric shells: `e,p,l,c`
    #[clap(long, value_parser = parse_counts)]
    pub counts: Option<[usize; 4]>,

    /// Rescale each phantom so that its maximum is 1
    #[clap(long)]
    pub normalize: bool,

    /// What to do when a phantom cannot be rasterized
    #[clap(long, value_enum)]
    pub policy: Option<FailurePolicy>,

    /// Output directory
    #[clap(short, long)]
    pub out: Option<PathBuf>,

    /// Base name of the output file(s)
    #[clap(long)]
    pub name: Option<String>,

    #[clap(short, long, value_enum)]
    pub format: Option<ExportFormat>,

    /// Slice orientation for TIFF export
    #[clap(short, long, value_enum)]
    pub mode: Option<SliceMode>,

    /// Maximum number of rayon threads
    #[clap(short = 'j', long, default_value = "4")]
    pub threads: usize,
}

#[derive(clap::Args, Debug, Clone)]
#[clap(group(clap::ArgGroup::new("source").required(true).args(["shape", "sinogram"])))]
pub (super) struct Geometry {
    /// Volume shape `H,W,D` in voxels
    #[clap(long, value_parser = parse_triplet::<usize>)]
    pub shape: Option<[usize; 3]>,

    /// Existing sinogram whose detector size should be used
    #[clap(long)]
    pub sinogram: Option<PathBuf>,

    /// First projection angle in degrees
    #[clap(long, allow_hyphen_values = true)]
    pub start: Option<f32>,

    /// Last projection angle in degrees
    #[clap(long, allow_hyphen_values = true)]
    pub end: Option<f32>,

    /// Number of projections
    #[clap(long)]
    pub n_angles: Option<usize>,

    /// Also print every projection angle
    #[clap(long)]
    pub list_angles: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub (super) struct Noise {
    /// Sinogram to corrupt
    pub input: PathBuf,

    /// Where to write the noisy sinogram
    #[clap(short, long)]
    pub out: PathBuf,

    /// Noise level. Required unless the config file has a `[noise]` section
    #[clap(long)]
    pub sigma: Option<f32>,

    /// Noise model: `Gaussian` or `GaussianPerVoxel`
    #[clap(long)]
    pub model: Option<String>,

    #[clap(short, long)]
    pub seed: Option<u64>,
}

fn parse_counts(s: &str) -> Result<[usize; 4], String> {
    let counts = s.split(',')
        .map(|n| n.trim().parse::<usize>().map_err(|e| format!("`{n}`: {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    counts.try_into().map_err(|v: Vec<_>| format!("expected 4 counts, got {}", v.len()))
}

// ----- Imports -----------------------------------------------------------------------------------------
use std::path::PathBuf;
use sparsect::{
    dataset::FailurePolicy,
    io::{ExportFormat, SliceMode},
    utils::parse_triplet,
};
