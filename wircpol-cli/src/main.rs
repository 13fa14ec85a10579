use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use wircpol_masks::image::io::save_mask_png;
use wircpol_masks::templates::load_plane;
use wircpol_masks::{
    diagonal_mask, LocateConfig, Location, ObscurationLevel, PipelineConfig, ReductionContext,
    RegionMask, TraceFit,
};

const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "WIRC+Pol mask and template tool (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the static mask library and write every mask as PNG.
    Masks {
        /// Output directory.
        #[arg(short, long, value_name = "DIR")]
        out_dir: PathBuf,
    },
    /// Write an anti-diagonal trace mask as PNG.
    Diagonal {
        #[arg(long)]
        size: usize,
        #[arg(long)]
        width: usize,
        #[arg(short, long, value_name = "FILE")]
        out: PathBuf,
    },
    /// Write a fit-driven trace mask as PNG.
    Fit {
        /// JSON file holding `{"rows": [...], "angle_deg": ...}`.
        #[arg(long, value_name = "FILE")]
        fit: PathBuf,
        /// Band half-width in pixels before tilt correction.
        #[arg(long)]
        width: f64,
        #[arg(short, long, value_name = "FILE")]
        out: PathBuf,
    },
    /// Locate sources off the spider cross in a full-field float64 `.npy` frame.
    Locate {
        #[arg(long, value_name = "FILE")]
        frame: PathBuf,
        #[arg(long, default_value_t = 1)]
        topk: usize,
        #[arg(long, default_value_t = 8)]
        nms_radius: usize,
        #[arg(long)]
        min_score: Option<f64>,
        /// Use the row-parallel scan when built with `rayon`.
        #[arg(long)]
        parallel: bool,
        /// Write JSON here instead of stdout.
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Serialize)]
struct LocationRecord {
    x: f64,
    y: f64,
    score: f64,
}

impl From<Location> for LocationRecord {
    fn from(value: Location) -> Self {
        Self {
            x: value.x,
            y: value.y,
            score: value.score,
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    best: Option<LocationRecord>,
    sources: Vec<LocationRecord>,
}

#[derive(Debug, Serialize)]
struct MaskSummary {
    name: String,
    width: usize,
    height: usize,
    transmissive: usize,
}

fn write_mask(mask: &RegionMask, path: &Path) -> Result<MaskSummary, Box<dyn std::error::Error>> {
    save_mask_png(mask, path)?;
    let (width, height) = mask.shape();
    Ok(MaskSummary {
        name: path.display().to_string(),
        width,
        height,
        transmissive: mask.count(),
    })
}

fn level_name(level: ObscurationLevel) -> &'static str {
    match level {
        ObscurationLevel::Low => "low",
        ObscurationLevel::Medium => "medium",
        ObscurationLevel::High => "high",
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("wircpol_masks=info".parse()?),
            )
            .with_target(false)
            .init();
    }

    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }
    let Some(command) = cli.command else {
        return Err("no command given; see --help".into());
    };

    match command {
        Command::Diagonal { size, width, out } => {
            let summary = write_mask(&diagonal_mask(size, width)?, &out)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Fit { fit, width, out } => {
            let fit: TraceFit = serde_json::from_str(&fs::read_to_string(&fit)?)?;
            let summary = write_mask(&fit.mask(width)?, &out)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Masks { out_dir } => {
            let config = PipelineConfig::from_path(&cli.config)?;
            let ctx = ReductionContext::initialize(&config)?;
            fs::create_dir_all(&out_dir)?;

            let masks = ctx.masks();
            let mut summaries = vec![
                write_mask(masks.square(), &out_dir.join("square.png"))?,
                write_mask(masks.square_with_slit(), &out_dir.join("square_slit.png"))?,
                write_mask(masks.cross_refined(), &out_dir.join("cross_refined.png"))?,
            ];
            for level in ObscurationLevel::ALL {
                let path = out_dir.join(format!("cross_{}.png", level_name(level)));
                summaries.push(write_mask(masks.cross(level), &path)?);
            }
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
        Command::Locate {
            frame,
            topk,
            nms_radius,
            min_score,
            parallel,
            output,
        } => {
            if topk == 0 {
                return Err("topk must be at least 1".into());
            }
            let config = PipelineConfig::from_path(&cli.config)?;
            let ctx = ReductionContext::initialize(&config)?;
            let frame = load_plane(&frame)?;
            let defaults = LocateConfig::default();
            let found = ctx.locate_sources(
                frame.view(),
                LocateConfig {
                    topk,
                    nms_radius,
                    min_score: min_score.unwrap_or(defaults.min_score),
                    parallel,
                    ..defaults
                },
            )?;

            let best = found.first().copied().map(LocationRecord::from);
            let sources = found.into_iter().map(LocationRecord::from).collect();
            let json = serde_json::to_string_pretty(&Output { best, sources })?;
            match output {
                Some(path) => fs::write(path, json)?,
                None => println!("{json}"),
            }
        }
    }

    Ok(())
}
