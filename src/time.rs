//! Frame timing.
//!
//! The clock is driven by host timestamps (milliseconds, as a frame callback
//! receives them) rather than reading a system clock, so headless runs and
//! tests step it deterministically.
//!
//! # Example
//!
//! ```ignore
//! use backdrop::time::FrameClock;
//!
//! let mut clock = FrameClock::new(16.67, 40.0);
//!
//! // In the frame callback:
//! let step = clock.tick(now_ms);
//! physics::step_grid(points, pointer, &grid, step.dt_scale);
//! ```

use crate::config::TimingConfig;

/// Timing for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStep {
    /// Clamped time since the previous frame, in milliseconds.
    pub delta_ms: f32,
    /// `delta_ms` expressed in reference frames.
    pub dt_scale: f32,
}

/// Tracks frame deltas, simulated time and FPS.
#[derive(Debug, Clone)]
pub struct FrameClock {
    /// Reference frame duration velocities are expressed against.
    frame_target_ms: f32,
    /// Longest delta a single frame may report.
    max_delta_ms: f32,
    /// Timestamp of the previous tick or skip.
    last_ms: Option<f64>,
    /// Simulated time: the sum of clamped deltas.
    elapsed_ms: f64,
    /// Delta reported by the latest tick.
    delta_ms: f32,
    /// Frames ticked since creation.
    frame_count: u64,
    /// Calculated FPS (updated periodically).
    fps: f32,
    /// Frame count at last FPS update.
    fps_frame_count: u64,
    /// Timestamp of last FPS calculation.
    fps_update_ms: Option<f64>,
    /// How often to update the FPS calculation.
    fps_update_interval_ms: f64,
}

impl FrameClock {
    pub fn new(frame_target_ms: f32, max_delta_ms: f32) -> Self {
        Self {
            frame_target_ms: frame_target_ms.max(f32::EPSILON),
            max_delta_ms: max_delta_ms.max(0.0),
            last_ms: None,
            elapsed_ms: 0.0,
            delta_ms: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_ms: None,
            fps_update_interval_ms: 500.0,
        }
    }

    pub fn from_config(timing: &TimingConfig) -> Self {
        Self::new(timing.frame_target_ms, timing.max_delta_ms)
    }

    /// Advance to `now_ms`. Call once per rendered frame.
    ///
    /// The first tick reports a zero delta. Deltas are clamped to
    /// `[0, max_delta_ms]`, so a long stall or a clock going backwards never
    /// produces a huge or negative step.
    pub fn tick(&mut self, now_ms: f64) -> FrameStep {
        let raw = match self.last_ms {
            Some(last) => (now_ms - last) as f32,
            None => 0.0,
        };
        let delta = if raw.is_finite() {
            raw.clamp(0.0, self.max_delta_ms)
        } else {
            0.0
        };
        self.last_ms = Some(now_ms);
        self.delta_ms = delta;
        self.elapsed_ms += delta as f64;
        self.frame_count += 1;

        // Update FPS periodically
        match self.fps_update_ms {
            None => {
                self.fps_update_ms = Some(now_ms);
                self.fps_frame_count = self.frame_count;
            }
            Some(since) if now_ms - since >= self.fps_update_interval_ms => {
                let frames = self.frame_count - self.fps_frame_count;
                self.fps = (frames as f64 / ((now_ms - since) / 1000.0)) as f32;
                self.fps_frame_count = self.frame_count;
                self.fps_update_ms = Some(now_ms);
            }
            Some(_) => {}
        }

        FrameStep {
            delta_ms: delta,
            dt_scale: delta / self.frame_target_ms,
        }
    }

    /// Move the reference point without simulating.
    ///
    /// Called for frames that do no work while paused, so the first frame after
    /// resuming measures its delta from the skip rather than from before the
    /// pause.
    pub fn skip(&mut self, now_ms: f64) {
        self.last_ms = Some(now_ms);
        self.delta_ms = 0.0;
        self.fps_update_ms = None;
    }

    /// Forget the previous timestamp; the next tick reports a zero delta.
    pub fn reset_reference(&mut self) {
        self.last_ms = None;
        self.fps_update_ms = None;
    }

    /// Simulated time in milliseconds.
    #[inline]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    #[inline]
    pub fn delta_ms(&self) -> f32 {
        self.delta_ms
    }

    /// Total frames ticked.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn frame_target_ms(&self) -> f32 {
        self.frame_target_ms
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::from_config(&TimingConfig::default())
    }
}
