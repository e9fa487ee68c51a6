use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use backdrop::{BackdropConfig, SnapshotPlan, Vec2, WindowMetrics};

/// Logical width the native window opens at.
const WINDOW_WIDTH: f32 = 1280.0;

#[derive(Parser)]
#[command(name = "backdrop", version, about = "Pointer-reactive animated backgrounds")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    Grid,
    Homepage,
    Constellation,
}

#[derive(clap::Args)]
struct ConfigArgs {
    /// Built-in configuration to start from.
    #[arg(long, value_enum, default_value = "homepage")]
    preset: Preset,
    /// JSON configuration file; overrides the preset.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Calmer motion, fewer particles.
    #[arg(long)]
    reduced_motion: bool,
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a window and animate.
    Run {
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Render a frame headlessly to a PNG.
    Snapshot {
        #[command(flatten)]
        config: ConfigArgs,
        #[arg(long, default_value_t = 1280.0)]
        width: f32,
        #[arg(long, default_value_t = 720.0)]
        height: f32,
        #[arg(long, default_value_t = 1.0)]
        pixel_ratio: f32,
        #[arg(long, default_value_t = 120)]
        frames: u32,
        /// Pointer position as `x,y` in CSS pixels.
        #[arg(long, value_parser = parse_point)]
        pointer: Option<Vec2>,
        #[arg(long, short, default_value = "backdrop.png")]
        output: PathBuf,
    },
    /// Print the resolved configuration as JSON.
    Config {
        #[command(flatten)]
        config: ConfigArgs,
        #[arg(long, default_value_t = WINDOW_WIDTH)]
        width: f32,
    },
}

fn parse_point(s: &str) -> Result<Vec2, String> {
    let (x, y) = s.split_once(',').ok_or_else(|| format!("expected x,y, got {s:?}"))?;
    let x: f32 = x.trim().parse().map_err(|e| format!("bad x: {e}"))?;
    let y: f32 = y.trim().parse().map_err(|e| format!("bad y: {e}"))?;
    Ok(Vec2::new(x, y))
}

impl ConfigArgs {
    fn resolve(&self, viewport_width: f32) -> Result<BackdropConfig> {
        let base = match &self.config {
            Some(path) => BackdropConfig::load(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?,
            None => match self.preset {
                Preset::Grid => BackdropConfig::mesh_grid(),
                Preset::Homepage => BackdropConfig::homepage_mesh(),
                Preset::Constellation => BackdropConfig::constellation(),
            },
        };
        let mut config = base.adapted(viewport_width, self.reduced_motion);
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("backdrop=info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => {
            let config = config.resolve(WINDOW_WIDTH)?;
            backdrop::run(config).context("window host failed")?;
        }
        Commands::Snapshot {
            config,
            width,
            height,
            pixel_ratio,
            frames,
            pointer,
            output,
        } => {
            let config = config.resolve(width)?;
            let plan = SnapshotPlan {
                frames,
                pointer,
                output,
                ..SnapshotPlan::default()
            };
            let report = backdrop::render_snapshot(config, WindowMetrics::new(width, height, pixel_ratio), &plan)
                .context("snapshot failed")?;
            println!(
                "wrote {} ({}x{}, {} entities, {} frames)",
                report.output.display(),
                report.width,
                report.height,
                report.entities,
                report.frames_rendered
            );
        }
        Commands::Config { config, width } => {
            let config = config.resolve(width)?;
            println!("{}", config.to_json_pretty()?);
        }
    }

    Ok(())
}
