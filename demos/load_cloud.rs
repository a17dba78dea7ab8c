//! Load a point file and print a summary of the resulting cloud
//!
//! ```text
//! load-cloud scan.xyz --shift auto -v
//! load-cloud scan.pcd --shift -450000,-5400000,0
//! ```

use anyhow::{bail, Context};
use clap::{ArgAction, Parser};
use pointstage_core::{Drawable, EntityGroup, Vector3d};
use pointstage_io::{FilterRegistry, LoadParameters, LogProgress, ShiftMode};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;
use tracing::info;

/// Global shift choice from the command line
#[derive(Debug, Clone, PartialEq)]
struct ShiftArg(ShiftMode);

impl FromStr for ShiftArg {
    type Err = anyhow::Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mode = match text {
            "auto" => ShiftMode::Auto,
            "never" => ShiftMode::Never,
            _ => {
                let parts = text
                    .split(',')
                    .map(|p| p.trim().parse::<f64>())
                    .collect::<Result<Vec<_>, _>>()
                    .with_context(|| format!("invalid shift '{text}'"))?;
                if parts.len() != 3 {
                    bail!("shift must be 'auto', 'never' or 'X,Y,Z', got '{text}'");
                }
                ShiftMode::Manual(Vector3d::new(parts[0], parts[1], parts[2]))
            }
        };
        Ok(Self(mode))
    }
}

/// Load a point file through the stage filter
#[derive(Debug, Parser)]
#[command(name = "load-cloud", version)]
struct Cli {
    /// File to load (xyz, txt, csv, asc, pts, pcd)
    path: PathBuf,

    /// Global shift: auto, never or X,Y,Z
    #[arg(long, default_value = "auto", allow_hyphen_values = true)]
    shift: ShiftArg,

    /// Points per chunk when streaming
    #[arg(long, default_value_t = 1000)]
    capacity: usize,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let params = LoadParameters::default()
        .with_shift_mode(cli.shift.0)
        .with_stream_capacity(cli.capacity);
    let registry = FilterRegistry::with_default_filters();
    let mut group = EntityGroup::new();
    let mut progress = LogProgress::default();

    let start = Instant::now();
    registry
        .load(&cli.path, &mut group, &params, &mut progress)
        .with_context(|| format!("failed to load {}", cli.path.display()))?;
    info!("Loaded in {:.2?}", start.elapsed());

    for cloud in group.children() {
        let (min, max) = cloud.bounding_box();
        let shift = cloud.global_shift();
        println!("Cloud: {}", cloud.name());
        println!("  Points: {}", cloud.len());
        println!("  Global shift: ({:.2}, {:.2}, {:.2})", shift.x, shift.y, shift.z);
        println!(
            "  Bounds: ({:.3}, {:.3}, {:.3}) - ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
        println!("  Colors: {}", if cloud.has_colors() { "yes" } else { "no" });
        for field in cloud.scalar_fields() {
            println!("  {}: [{}, {}]", field.name(), field.min(), field.max());
        }
    }

    Ok(())
}
