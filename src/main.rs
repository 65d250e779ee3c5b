use clap::Parser;
use tracing::{ error, info };
use tracing_subscriber::EnvFilter;

use std::error::Error;
use std::path::{ Path, PathBuf };
use std::process;

use plate_finder::{ batch, FinderConfig, PlateFinder };


/// Finds the license plate in each image and writes one output image per
/// plate operation.
#[derive(Parser)]
#[command(name = "plate-finder", version)]
struct Cli {
    /// Image files or directories of images
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Where the results go
    #[arg(short, long, default_value = "test_output")]
    output_dir: PathBuf,

    /// TOML file overriding the detector parameters
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also write the intermediate edge detection images, one sub directory
    /// per input
    #[arg(long)]
    debug_dir: Option<PathBuf>,

    /// Show every highlighted result in a window
    #[cfg(feature = "display-window")]
    #[arg(long)]
    show: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => FinderConfig::from_file(path)?,
        None => FinderConfig::default(),
    };
    let finder = PlateFinder::new(config)?;
    let inputs = batch::collect_inputs(&cli.inputs)?;

    let mut failed = 0;
    for input in &inputs {
        match run_one(&finder, &cli, input) {
            Ok(()) => {}
            Err(e) => {
                error!(file = %input.display(), "failed: {}", e);
                failed += 1;
            }
        }
    }
    info!(total = inputs.len(), failed, "done");
    if failed > 0 {
        process::exit(1);
    }
    Ok(())
}

fn run_one(finder: &PlateFinder, cli: &Cli, input: &Path) -> Result<(), Box<dyn Error>> {
    let img = image::open(input)?;
    let paths = batch::process_image(finder, &img, input, &cli.output_dir)?;
    info!(file = %input.display(), highlighted = %paths.highlighted.display(), "processed");

    if let Some(debug_dir) = &cli.debug_dir {
        let stem = input.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        finder.dump_stages(&img, debug_dir.join(stem))?;
    }

    #[cfg(feature = "display-window")]
    if cli.show {
        let highlighted = image::open(&paths.highlighted)?;
        plate_finder::utils::display_image(&highlighted, &format!("{}", input.display()));
    }
    Ok(())
}
