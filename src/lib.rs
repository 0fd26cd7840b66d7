//! retinakit: data plumbing for RetinaNet-style detectors.
//!
//! The crate covers everything around a single-stage detector except the
//! network itself: reading COCO splits into training-ready arrays,
//! preprocessing and augmenting images together with their boxes, the focal
//! and smooth-L1 losses, and converting RarePlanes XML labels to CSV.
//!
//! # Modules
//!
//! - [`ir`]: annotation types, ids and the label table
//! - [`generator`]: indexed dataset access ([`generator::Generator`])
//! - [`preprocess`]: normalization, resizing and joint image/box augmentation
//! - [`loss`]: focal and smooth-L1 losses
//! - [`convert`]: RarePlanes XML → CSV conversion
//! - [`inspect`]: split summaries
//! - [`error`]: the crate error type

pub mod convert;
pub mod error;
pub mod generator;
pub mod inspect;
pub mod ir;
pub mod loss;
pub mod preprocess;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use error::RetinaError;

use generator::{CocoGenerator, CocoGeneratorOptions};
use preprocess::{compute_resize_scale, scaled_dimensions, ResizeConfig};

/// The retinakit CLI application.
#[derive(Parser)]
#[command(name = "retinakit")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Convert RarePlanes XML labels into per-split CSV files.
    Convert(ConvertArgs),
    /// Summarize a COCO split.
    Inspect(InspectArgs),
    /// Show the resize scale and output size for an image.
    Resize(ResizeArgs),
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// Dataset root holding one directory per split.
    root: PathBuf,

    /// Split to convert; repeat for several (default: train, val, test).
    #[arg(long = "split")]
    splits: Vec<String>,
}

#[derive(clap::Args)]
struct InspectArgs {
    /// COCO dataset directory (with annotations/ and images/).
    data_dir: PathBuf,

    /// Split name, e.g. 'train2017'.
    #[arg(long)]
    split: String,

    /// Keep images that have no usable annotation.
    #[arg(long)]
    keep_empty: bool,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

#[derive(clap::Args)]
struct ResizeArgs {
    /// Image file to measure.
    image: PathBuf,

    #[arg(long, default_value_t = ResizeConfig::default().min_side)]
    min_side: u32,

    #[arg(long, default_value_t = ResizeConfig::default().max_side)]
    max_side: u32,
}

/// Run the retinakit CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), RetinaError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Convert(args)) => run_convert(args),
        Some(Commands::Inspect(args)) => run_inspect(args),
        Some(Commands::Resize(args)) => run_resize(args),
        None => {
            println!("retinakit {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Data plumbing for RetinaNet-style detectors.");
            println!();
            println!("Run 'retinakit --help' for usage information.");
            Ok(())
        }
    }
}

fn run_convert(args: ConvertArgs) -> Result<(), RetinaError> {
    let reports = if args.splits.is_empty() {
        convert::convert_dataset(&args.root, &convert::DEFAULT_SPLITS)?
    } else {
        convert::convert_dataset(&args.root, &args.splits)?
    };

    for report in &reports {
        println!("{report}");
    }
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<(), RetinaError> {
    if !matches!(args.output.as_str(), "text" | "json") {
        return Err(RetinaError::UnsupportedFormat(format!(
            "'{}' (supported: text, json)",
            args.output
        )));
    }

    let opts = CocoGeneratorOptions {
        filter_empty_images: !args.keep_empty,
    };
    let generator = CocoGenerator::new(&args.data_dir, &args.split, &opts)?;
    let report = inspect::inspect_split(&generator, &inspect::InspectOptions::default());

    if args.output == "json" {
        let json = serde_json::to_string_pretty(&report).map_err(RetinaError::ReportSerialize)?;
        println!("{json}");
    } else {
        print!("{report}");
    }
    Ok(())
}

fn run_resize(args: ResizeArgs) -> Result<(), RetinaError> {
    // Only the header is read; the pixels are not decoded.
    let (width, height) =
        image::image_dimensions(&args.image).map_err(|source| RetinaError::ImageDecode {
            path: args.image.clone(),
            source,
        })?;

    let scale = compute_resize_scale(height, width, args.min_side, args.max_side)?;
    let (out_width, out_height) = scaled_dimensions(width, height, scale);

    println!("input:  {width}x{height}");
    println!("scale:  {scale:.6}");
    println!("output: {out_width}x{out_height}");
    Ok(())
}
