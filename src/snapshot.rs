//! Headless rendering to PNG.
//!
//! Runs the engine against the software rasterizer with a manual frame driver,
//! so a configuration can be previewed or regression-checked without a window
//! or a GPU.

use std::path::PathBuf;

use glam::Vec2;

use crate::config::BackdropConfig;
use crate::engine::{Backdrop, MountOutcome};
use crate::error::SnapshotError;
use crate::input::HostEvent;
use crate::render::PixelCanvas;
use crate::scheduler::ManualDriver;
use crate::viewport::WindowMetrics;

/// What to simulate before capturing.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotPlan {
    /// Frames to step before capturing.
    pub frames: u32,
    /// Simulated time between frames.
    pub frame_ms: f64,
    /// Where the pointer rests during the run, in CSS pixels.
    pub pointer: Option<Vec2>,
    pub output: PathBuf,
}

impl Default for SnapshotPlan {
    fn default() -> Self {
        Self {
            frames: 60,
            frame_ms: 1000.0 / 60.0,
            pointer: None,
            output: PathBuf::from("backdrop.png"),
        }
    }
}

/// Summary of a finished snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotReport {
    pub frames_rendered: u32,
    pub entities: usize,
    pub width: u32,
    pub height: u32,
    pub output: PathBuf,
}

/// Simulate `plan.frames` frames of `config` and write the last one to
/// `plan.output`, flattened over the configured background.
pub fn render_snapshot(
    config: BackdropConfig,
    metrics: WindowMetrics,
    plan: &SnapshotPlan,
) -> Result<SnapshotReport, SnapshotError> {
    let (engine, frames_rendered) = render_frames(config, metrics, plan)?;
    let background = engine.config().background;
    let entities = engine.store().len();

    let Some(canvas) = engine.canvas() else {
        return Err(SnapshotError::Disabled { width: metrics.width });
    };
    canvas.save_png(&plan.output, Some(background))?;
    let (width, height) = canvas.image().dimensions();

    tracing::info!(
        path = %plan.output.display(),
        width,
        height,
        frames = frames_rendered,
        "snapshot written"
    );

    Ok(SnapshotReport {
        frames_rendered,
        entities,
        width,
        height,
        output: plan.output.clone(),
    })
}

/// Run the engine headless and hand it back with its canvas still attached.
pub fn render_frames(
    config: BackdropConfig,
    metrics: WindowMetrics,
    plan: &SnapshotPlan,
) -> Result<(Backdrop<PixelCanvas, ManualDriver>, u32), SnapshotError> {
    let mut engine = Backdrop::new(config, ManualDriver::new())?;
    let canvas = PixelCanvas::new(1, 1);
    match engine.mount(Some(canvas), metrics) {
        MountOutcome::Running => {}
        MountOutcome::Disabled | MountOutcome::Unsupported => {
            return Err(SnapshotError::Disabled { width: metrics.width });
        }
    }

    if let Some(position) = plan.pointer {
        engine.handle_event(HostEvent::PointerMove { position });
    }

    let mut now = 0.0;
    let mut rendered = 0;
    // One extra frame: the first only establishes the clock reference.
    for _ in 0..=plan.frames {
        let Some(token) = engine.driver_mut().take_pending() else {
            break;
        };
        engine.frame(token, now);
        now += plan.frame_ms;
        rendered += 1;
    }

    Ok((engine, rendered))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolutionConfig;

    fn small_metrics() -> WindowMetrics {
        WindowMetrics::new(160.0, 120.0, 1.0)
    }

    fn small_config() -> BackdropConfig {
        BackdropConfig {
            seed: Some(7),
            resolution: ResolutionConfig {
                disable_below: 100.0,
                ..ResolutionConfig::default()
            },
            ..BackdropConfig::mesh_grid()
        }
    }

    #[test]
    fn test_render_frames_steps_plan() {
        let plan = SnapshotPlan {
            frames: 5,
            pointer: Some(Vec2::new(80.0, 60.0)),
            ..SnapshotPlan::default()
        };
        let (engine, rendered) = render_frames(small_config(), small_metrics(), &plan).unwrap();
        assert_eq!(rendered, 6);
        assert_eq!(engine.canvas().unwrap().image().dimensions(), (160, 120));
        assert!(engine.pointer().active);
    }

    #[test]
    fn test_disabled_viewport_is_an_error() {
        let plan = SnapshotPlan::default();
        let err = render_frames(BackdropConfig::mesh_grid(), WindowMetrics::new(300.0, 600.0, 1.0), &plan)
            .err()
            .unwrap();
        assert!(matches!(err, SnapshotError::Disabled { width } if width == 300.0));
    }

    #[test]
    fn test_snapshot_writes_png() {
        let output = std::env::temp_dir().join(format!("backdrop-snapshot-{}.png", std::process::id()));
        let plan = SnapshotPlan {
            frames: 2,
            output: output.clone(),
            ..SnapshotPlan::default()
        };
        let report = render_snapshot(small_config(), small_metrics(), &plan).unwrap();
        assert_eq!((report.width, report.height), (160, 120));
        let written = image::open(&output).unwrap();
        assert_eq!(written.width(), 160);
        let _ = std::fs::remove_file(output);
    }
}
