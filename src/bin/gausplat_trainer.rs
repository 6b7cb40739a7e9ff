use anyhow::Context as _;
use burn::config::Config as _;
use clap::{Parser, Subcommand, ValueEnum};
use gausplat_trainer::{
    backend::{Autodiff, AutodiffBackend, NdArray, Wgpu},
    dataset::{Dataset, DatasetDownloader, DownloadOutcome},
    error::Error,
    export::{save_png, FRAME_DELAY_DEFAULT},
    render::{gaussian_3d::Gaussian3dRasterizer, view::View},
    scene::gaussian_3d::{Gaussian3dSceneConfig, Gaussian3dTrainable},
    target,
    train::Gaussian3dTrainerConfig,
};
use std::{f64::consts::FRAC_PI_2, path::PathBuf};
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "gausplat-trainer", version)]
#[command(about = "Fit 3D Gaussians to an image, or download the datasets")]
struct Cli {
    /// Log at the debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fit a scene to a target image from a fixed view.
    Fit(FitArgs),
    /// Download a dataset archive and extract it.
    Download(DownloadArgs),
}

#[derive(Parser, Debug)]
struct FitArgs {
    /// Height of the synthetic target.
    #[arg(long, default_value_t = 256)]
    height: u32,

    /// Width of the synthetic target.
    #[arg(long, default_value_t = 256)]
    width: u32,

    /// Number of Gaussians.
    #[arg(long, default_value_t = 2000)]
    points: usize,

    /// Number of iterations. [default: 1000]
    #[arg(long)]
    iterations: Option<usize>,

    /// Learning rate. [default: 0.01]
    #[arg(long)]
    learning_rate: Option<f64>,

    /// Record a frame every N iterations. [default: 5]
    #[arg(long)]
    frame_stride: Option<usize>,

    /// Do not record the training frames.
    #[arg(long)]
    no_frames: bool,

    /// Directory of the rendered outputs.
    #[arg(short, long, default_value = "renders")]
    output: PathBuf,

    /// Seed of the scene initialization.
    #[arg(long)]
    seed: Option<u64>,

    /// Image to fit instead of the synthetic quadrants.
    #[arg(long)]
    target: Option<PathBuf>,

    /// Trainer configuration in JSON. The other flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Trainable properties, e.g., `colors,opacities`. [default: colors]
    #[arg(long)]
    train: Option<String>,

    /// Tensor backend.
    #[arg(long, value_enum, default_value_t = BackendChoice::Ndarray)]
    backend: BackendChoice,
}

#[derive(Parser, Debug)]
struct DownloadArgs {
    /// Dataset to download.
    #[arg(long, default_value_t = Dataset::Mipnerf360)]
    dataset: Dataset,

    /// Directory to save the dataset. [default: ./data]
    #[arg(long)]
    save_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendChoice {
    Ndarray,
    Wgpu,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        })
        .init();

    match cli.command {
        Command::Fit(args) => match args.backend {
            BackendChoice::Ndarray => {
                fit::<Autodiff<NdArray>>(&args, &Default::default())
            },
            BackendChoice::Wgpu => {
                fit::<Autodiff<Wgpu>>(&args, &Default::default())
            },
        },
        Command::Download(args) => download(&args),
    }
}

fn fit<AB: AutodiffBackend>(
    args: &FitArgs,
    device: &AB::Device,
) -> anyhow::Result<()> {
    let target = match &args.target {
        Some(path) => target::load::<AB>(path, device)
            .with_context(|| format!("loading the target at {path:?}"))?,
        None => target::quadrants::<AB>(
            args.height as usize,
            args.width as usize,
            device,
        ),
    };
    let [image_size_y, image_size_x, _] = target.dims();
    let view = View::looking_at_origin(
        image_size_x as u32,
        image_size_y as u32,
        FRAC_PI_2,
        8.0,
    );

    let mut scene_config =
        Gaussian3dSceneConfig::new().with_point_count(args.points);
    scene_config.seed = args.seed;
    let scene = scene_config.init::<AB>(device)?;

    let trainer_config = trainer_config(args)?;

    log::info!(target: "gausplat::trainer", "fit > {trainer_config}");

    let output = trainer_config
        .init(Gaussian3dRasterizer::default())?
        .train(scene, &view, &target)?;

    if let Some(loss) = output.losses.last() {
        log::info!(target: "gausplat::trainer", "fit > loss ({loss})");
    }
    if let Some(frames) = &output.frames {
        let path = args.output.join("training.gif");
        match frames.save_gif(path, FRAME_DELAY_DEFAULT) {
            Err(Error::EmptyFrames) => {
                log::warn!(target: "gausplat::trainer", "fit > no frames");
            },
            result => result?,
        }
    }
    if let Some(image) = &output.colors_rgb_2d {
        save_png(image, args.output.join("final.png"))?;
    }

    Ok(())
}

/// Loading the JSON config if given, then applying the explicit flags.
fn trainer_config(
    args: &FitArgs
) -> anyhow::Result<Gaussian3dTrainerConfig> {
    let mut config = match &args.config {
        Some(path) => Gaussian3dTrainerConfig::load(path)
            .with_context(|| format!("loading the config at {path:?}"))?,
        None => Gaussian3dTrainerConfig::new(),
    };
    if let Some(iterations) = args.iterations {
        config.iterations = iterations;
    }
    if let Some(learning_rate) = args.learning_rate {
        config.learning_rate = learning_rate;
    }
    if let Some(frame_stride) = args.frame_stride {
        config.frame_stride = frame_stride;
    }
    if args.no_frames {
        config.is_recording_frames = false;
    }
    if let Some(names) = &args.train {
        config.trainable = Gaussian3dTrainable::parse(names)?;
    }

    Ok(config)
}

fn download(args: &DownloadArgs) -> anyhow::Result<()> {
    let mut downloader = DatasetDownloader::new()?;
    if let Some(save_dir) = &args.save_dir {
        downloader.save_dir = save_dir.to_owned();
    }

    match downloader.download(args.dataset)? {
        DownloadOutcome::Extracted { directory } => {
            log::info!(
                target: "gausplat::trainer",
                "download > extracted > {directory:?}",
            );
        },
        DownloadOutcome::Skipped { directory } => {
            log::warn!(
                target: "gausplat::trainer",
                "download > not extracted > {directory:?}",
            );
        },
        DownloadOutcome::Aborted { url } => {
            log::warn!(
                target: "gausplat::trainer",
                "download > aborted > {url}",
            );
        },
    }

    Ok(())
}
