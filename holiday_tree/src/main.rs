//! holiday_tree: interactive entry point.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use holiday_field::ColorTheme;
use holiday_tree::app::run;
use holiday_tree::config::{AppConfig, Overrides};

#[derive(Parser, Debug)]
#[command(name = "holiday_tree", version, about = "Gesture-controlled particle holiday tree")]
struct Cli {
    /// TOML configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Photo to show; repeat for more (replaces the config file's list)
    #[arg(long = "photo", value_name = "PATH")]
    photos: Vec<String>,

    /// Start with gesture control off
    #[arg(long)]
    no_gesture: bool,

    /// Number of tree leaves
    #[arg(long)]
    leaves: Option<usize>,

    /// Colour theme: pink, gold, blue or purple
    #[arg(long)]
    theme: Option<ColorTheme>,

    /// Lighter particle field for slow machines
    #[arg(long)]
    quick: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            photos:     self.photos.clone(),
            no_gesture: self.no_gesture,
            leaves:     self.leaves,
            theme:      self.theme,
            quick:      self.quick,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "holiday_tree=info,holiday_field=info".into()),
        )
        .init();

    info!("holiday_tree v{} starting", env!("CARGO_PKG_VERSION"));
    #[cfg(feature = "leap")]
    info!("input: LeapMotion hardware");
    #[cfg(not(feature = "leap"))]
    info!("input: keyboard/mouse simulation (build with --features leap for hardware)");

    let mut cfg = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    cfg.apply(&cli.overrides());
    info!(
        theme = cfg.theme.name(),
        gesture = cfg.gesture,
        photos = cfg.photos.len(),
        "configuration ready"
    );

    run(cfg).context("viewer stopped with an error")
}
