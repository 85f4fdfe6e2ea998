mod cli;
mod progress;

fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();
    logging::init(args.verbose);

    let config = match &args.config {
        Some(path) => read_config_file(path)?,
        None       => Config::default(),
    };

    match args.command {
        Command::Generate(g) => generate(config, g),
        Command::Geometry(g) => geometry(config, g),
        Command::Noise   (n) => noise   (config, n),
    }
}

fn generate(mut config: Config, args: cli::Generate) -> Result<(), Box<dyn Error>> {
    let cli::Generate { samples, seed, shape, counts, normalize, policy, out, name, format, mode, threads } = args;
    // --- Command line overrides config file ------------------------------------
    if let Some(n)      = samples { config.samples            = n; }
    if let Some(shape)  = shape   { config.phantom.shape      = shape; }
    if let Some(policy) = policy  { config.policy             = policy; }
    if let Some(dir)    = out     { config.export.dir         = dir; }
    if let Some(name)   = name    { config.export.name        = name; }
    if let Some(format) = format  { config.export.format      = format; }
    if let Some(mode)   = mode    { config.export.mode        = mode; }
    if let Some([e, p, l, c]) = counts { config.phantom.counts = PrimitiveCounts::fixed(e, p, l, c); }
    config.normalize |= normalize;

    let seed = seed.or(config.seed).unwrap_or_else(|| {
        let seed: u64 = Isaac64Rng::from_entropy().gen();
        tracing::warn!(seed, "no seed given, drawn from entropy");
        seed
    });
    println!("Seed: {seed}");

    // Check the geometry before spending time on the phantoms
    let [h, w, d] = config.phantom.shape;
    let geometry = AcquisitionGeometry::for_volume([d, h, w], &config.acquisition)?;
    println!("Acquisition: {geometry}");

    // Set the maximum number of threads used by rayon for parallel iteration
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build_global() {
        Err(e) => println!("{}", e),
        Ok(_)  => println!("Using up to {} threads.", threads),
    }

    let rasterizer = VoxelRasterizer;
    let generator = Generator::new(&config.phantom, &rasterizer)
        .policy(config.policy)
        .normalize(config.normalize);

    let progress = Progress::new(config.samples);
    let GeneratedDataset { volumes, report } = generator.generate_par(config.samples, seed, progress.sample_done())?;
    progress.final_report(&report);

    let mut timer = Timer::new();
    timer.start("exporting");
    let written = export(&volumes, &config.export)?;
    timer.done();
    for path in written.iter().take(3) {
        println!("Wrote {}", path.display());
    }
    if written.len() > 3 {
        println!("... and {} more", group_digits(written.len() - 3));
    }
    Ok(())
}

fn geometry(mut config: Config, args: cli::Geometry) -> Result<(), Box<dyn Error>> {
    let cli::Geometry { shape, sinogram, start, end, n_angles, list_angles } = args;
    let acq = &mut config.acquisition;
    if let Some(start) = start    { acq.start_angle = start; }
    if let Some(end)   = end      { acq.end_angle   = end; }
    if let Some(n)     = n_angles { acq.n_angles    = n; }

    let geometry = match (shape, sinogram) {
        (Some([h, w, d]), _) => AcquisitionGeometry::for_volume([d, h, w], acq)?,
        (None, Some(path)) => {
            let (a, r, c) = read_sinogram(&path)?.dim();
            AcquisitionGeometry::for_sinogram([a, r, c], acq)?
        }
        (None, None) => unreachable!("clap requires one of --shape or --sinogram"),
    };
    println!("{geometry}");
    println!("sinogram shape: {:?}", geometry.sinogram_shape());
    if list_angles {
        for (i, a) in geometry.angles().iter().enumerate() {
            println!("{i:4} {:9.4}° {a:9.6} rad", a.to_degrees());
        }
    }
    Ok(())
}

fn noise(config: Config, args: cli::Noise) -> Result<(), Box<dyn Error>> {
    let cli::Noise { input, out, sigma, model, seed } = args;
    let noise = NoiseConfig::resolve(config.noise, sigma, model)?;

    let sinogram = read_sinogram(&input)?;
    let mut rng = match seed.or(config.seed) {
        Some(seed) => Isaac64Rng::seed_from_u64(seed),
        None       => Isaac64Rng::from_entropy(),
    };
    let noisy = noise.apply(&sinogram, &mut rng)?;
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)?;
    }
    write_npy(&noisy, &out)?;
    println!("Added {} noise (sigma = {}) to {} -> {}", noise.model, noise.sigma, input.display(), out.display());
    Ok(())
}

// ----- Imports -----------------------------------------------------------------------------------------
use std::error::Error;
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_isaac::Isaac64Rng;
use sparsect::{
    acquisition::AcquisitionGeometry,
    compositor::PrimitiveCounts,
    config::{read_config_file, Config},
    dataset::{GeneratedDataset, Generator},
    io::{export, npy::write_npy, read_sinogram},
    logging,
    noise::NoiseConfig,
    raster::VoxelRasterizer,
    utils::{group_digits, timing::Progress as Timer},
};
use cli::{Cli, Command};
use progress::Progress;
