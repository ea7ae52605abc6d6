use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::LevelFilter;

use apriltag_core::GrayImageView;
use apriltag_detect::{Detector, DetectorConfig};
use apriltag_families::builtins::{builtin_family, builtin_names};
use apriltag_print::{render_tag, write_png};

#[derive(Parser)]
#[command(name = "apriltag", version, about = "AprilTag detection and generation utilities")]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Detect tags in an image file and print them
    Detect {
        /// Input image (PNG, JPEG, ...)
        image: PathBuf,
        /// Tag family to decode against
        #[arg(long, default_value = "tag36h11")]
        family: String,
        /// Maximum number of corrected payload bits
        #[arg(long, default_value_t = 2)]
        max_hamming: u8,
        /// Print detections as JSON
        #[arg(long)]
        json: bool,
    },
    /// Render one tag to a PNG file
    Generate {
        /// Tag family
        #[arg(long, default_value = "tag36h11")]
        family: String,
        /// Tag id within the family
        #[arg(long)]
        id: u32,
        /// Pixels per tag module
        #[arg(long, default_value_t = 16)]
        px_per_module: usize,
        /// Quiet-zone width in modules
        #[arg(long, default_value_t = 1)]
        margin: usize,
        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("unknown tag family `{name}` (expected one of: {known})")]
    UnknownFamily { name: String, known: String },
    #[error("failed to read {path}: {source}")]
    ImageRead {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error(transparent)]
    Detect(#[from] apriltag_detect::DetectError),
    #[error(transparent)]
    Render(#[from] apriltag_print::RenderError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let _ = apriltag_core::init_with_level(level);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Detect {
            image,
            family,
            max_hamming,
            json,
        } => cmd_detect(&image, &family, max_hamming, json),
        Command::Generate {
            family,
            id,
            px_per_module,
            margin,
            output,
        } => cmd_generate(&family, id, px_per_module, margin, &output),
    }
}

fn resolve_family(name: &str) -> Result<apriltag_families::TagFamily, CliError> {
    builtin_family(name).ok_or_else(|| CliError::UnknownFamily {
        name: name.to_owned(),
        known: builtin_names().join(", "),
    })
}

fn cmd_detect(path: &PathBuf, family: &str, max_hamming: u8, json: bool) -> Result<(), CliError> {
    let family = resolve_family(family)?;

    let gray = image::ImageReader::open(path)
        .map_err(|e| CliError::ImageRead {
            path: path.clone(),
            source: e.into(),
        })?
        .decode()
        .map_err(|e| CliError::ImageRead {
            path: path.clone(),
            source: e,
        })?
        .to_luma8();

    let view = GrayImageView {
        width: gray.width() as usize,
        height: gray.height() as usize,
        data: gray.as_raw(),
    };

    let mut config = DetectorConfig::new(family);
    config.max_hamming = max_hamming;
    let detector = Detector::new(config);
    let detections = detector.detect(&view)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&detections)?);
        return Ok(());
    }

    if detections.is_empty() {
        println!("no tags found");
        return Ok(());
    }
    for d in &detections {
        println!(
            "id {:4}  hamming {}  score {:.3}  center ({:7.2}, {:7.2})",
            d.id, d.hamming, d.score, d.center.x, d.center.y
        );
    }
    Ok(())
}

fn cmd_generate(
    family: &str,
    id: u32,
    px_per_module: usize,
    margin: usize,
    output: &PathBuf,
) -> Result<(), CliError> {
    let family = resolve_family(family)?;
    let img = render_tag(family, id, px_per_module, margin)?;
    write_png(&img, output)?;
    println!(
        "wrote {} ({}x{}, {} id {})",
        output.display(),
        img.width,
        img.height,
        family.name,
        id
    );
    Ok(())
}
