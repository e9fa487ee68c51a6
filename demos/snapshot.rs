//! # Snapshot
//!
//! Renders both scenes headlessly with the pointer resting off-center and
//! writes them next to the working directory.
//!
//! Run with: `cargo run --example snapshot`

use backdrop::prelude::*;
use backdrop::SnapshotPlan;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("backdrop=info").init();

    let metrics = WindowMetrics::new(1280.0, 720.0, 2.0);
    let scenes = [
        ("mesh_grid.png", BackdropConfig::homepage_mesh()),
        ("constellation.png", BackdropConfig::constellation()),
    ];

    for (file, config) in scenes {
        let plan = SnapshotPlan {
            frames: 90,
            pointer: Some(Vec2::new(820.0, 300.0)),
            output: file.into(),
            ..SnapshotPlan::default()
        };
        let config = BackdropConfig { seed: Some(2024), ..config };
        let report = backdrop::render_snapshot(config, metrics, &plan)?;
        println!("{} -> {}x{}, {} entities", file, report.width, report.height, report.entities);
    }

    Ok(())
}
