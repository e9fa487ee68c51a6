//! Engine configuration.
//!
//! Every tuning constant of the effect lives here rather than in the physics or
//! render code, so the several tuned variants of the background are just different
//! configurations of one engine.
//!
//! # Usage
//!
//! ```ignore
//! let config = BackdropConfig::homepage_mesh();
//! let config = BackdropConfig::load("backdrop.json")?;
//! let config = BackdropConfig::constellation().adapted(window_width, reduced_motion);
//! ```
//!
//! Configuration files are JSON. Colors are CSS strings, missing fields take the
//! defaults below:
//!
//! ```json
//! {
//!   "scene": { "mode": "grid", "spacing": 84, "density": 0.72, "damping": 0.88 },
//!   "resolution": { "disable_below": 420 }
//! }
//! ```

use std::ops::Range;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::error::ConfigError;

/// Width below which the compact presets kick in.
pub const COMPACT_WIDTH: f32 = 900.0;

/// Mesh grid tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Base distance between lattice points in CSS pixels.
    pub spacing: f32,
    /// Multiplier on `spacing`.
    pub density: f32,
    /// Lower bound for the effective spacing.
    pub min_spacing: f32,
    /// Upper bound on lattice points; spacing grows to respect it.
    pub max_points: usize,
    pub line_color: Rgba,
    pub hover_line_color: Rgba,
    pub point_color: Rgba,
    pub point_size: f32,
    /// Pointer pull strength.
    pub warp: f32,
    /// Gain applied on top of `warp`.
    pub warp_gain: f32,
    /// Fraction of the remaining distance the pointer catches up per frame.
    pub pointer_smoothing: f32,
    /// Spring constant pulling points back to their rest position.
    pub spring: f32,
    /// Per-step velocity multiplier, strictly below 1.
    pub damping: f32,
    /// Pointer distance at which the pull vanishes.
    pub influence_radius: f32,
    /// Pointer distance at which edge glow vanishes.
    pub glow_radius: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            spacing: 100.0,
            density: 0.8,
            min_spacing: 40.0,
            max_points: 1500,
            line_color: Rgba::from_rgb8(255, 255, 255, 0.04),
            hover_line_color: Rgba::from_rgb8(168, 85, 247, 0.35),
            point_color: Rgba::from_rgb8(168, 85, 247, 0.95),
            point_size: 1.8,
            warp: 0.15,
            warp_gain: 6.0,
            pointer_smoothing: 0.18,
            spring: 0.1,
            damping: 0.84,
            influence_radius: 120.0,
            glow_radius: 220.0,
        }
    }
}

impl GridConfig {
    /// Spacing actually used for tiling, before the point cap is applied.
    pub fn effective_spacing(&self) -> f32 {
        (self.spacing * self.density).max(self.min_spacing)
    }
}

/// Free-particle constellation tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstellationConfig {
    /// Target particle density; the count scales with viewport area.
    pub particles_per_megapixel: f32,
    pub min_count: usize,
    pub max_count: usize,
    /// Total width of the random spread applied to the count.
    pub count_jitter: usize,
    /// Initial speed range in CSS pixels per reference frame.
    pub speed: Range<f32>,
    pub size: Range<f32>,
    pub alpha: Range<f32>,
    pub damping: f32,
    pub repel_radius: f32,
    pub repel_strength: f32,
    /// Distance outside the viewport at which particles wrap.
    pub wrap_margin: f32,
    pub link_distance: f32,
    /// Link alpha at zero distance.
    pub link_alpha: f32,
    pub link_width: f32,
    /// Recompute links every N frames, reusing the previous set in between.
    pub link_every: u32,
    pub link_color: Rgba,
    pub particle_color: Rgba,
    /// Glow falloff radius as a multiple of particle size.
    pub glow_scale: f32,
    pub burst_radius: f32,
    pub burst_strength: f32,
    pub pointer_smoothing: f32,
}

impl Default for ConstellationConfig {
    fn default() -> Self {
        Self {
            particles_per_megapixel: 58.0,
            min_count: 30,
            max_count: 160,
            count_jitter: 8,
            speed: 0.1..0.7,
            size: 1.0..3.2,
            alpha: 0.65..1.0,
            damping: 0.985,
            repel_radius: 120.0,
            repel_strength: 0.108,
            wrap_margin: 20.0,
            link_distance: 140.0,
            link_alpha: 0.14,
            link_width: 0.6,
            link_every: 1,
            link_color: Rgba::from_rgb8(115, 99, 255, 1.0),
            particle_color: Rgba::from_rgb8(150, 130, 255, 1.0),
            glow_scale: 6.0,
            burst_radius: 160.0,
            burst_strength: 0.9,
            pointer_smoothing: 1.0,
        }
    }
}

/// Layered sine waves drawn beneath the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    pub layers: u32,
    pub base_amplitude: f32,
    pub speed: f32,
    /// Samples per wave polyline.
    pub samples: u32,
    pub color: Rgba,
    /// Alpha of the additive tint laid over the whole canvas.
    pub tint_alpha: f32,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            layers: 4,
            base_amplitude: 12.0,
            speed: 0.6,
            samples: 160,
            color: Rgba::from_rgb8(120, 90, 255, 1.0),
            tint_alpha: 0.035,
        }
    }
}

/// Backing-store resolution policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    pub max_device_pixel_ratio: f32,
    /// Fraction of the device resolution to render at, scaled up for display.
    pub render_scale: f32,
    /// Smallest CSS size either dimension is clamped to.
    pub min_css_size: f32,
    /// Viewports narrower than this never start the effect.
    pub disable_below: f32,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            max_device_pixel_ratio: 2.0,
            render_scale: 1.0,
            min_css_size: 1.0,
            disable_below: 480.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Reference frame duration velocities are expressed against.
    pub frame_target_ms: f32,
    /// Upper bound on a single step's delta.
    pub max_delta_ms: f32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            frame_target_ms: 16.67,
            max_delta_ms: 40.0,
        }
    }
}

/// Which entity model the engine simulates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Scene {
    Grid(GridConfig),
    Constellation(ConstellationConfig),
}

impl Default for Scene {
    fn default() -> Self {
        Scene::Grid(GridConfig::default())
    }
}

impl Scene {
    pub fn pointer_smoothing(&self) -> f32 {
        match self {
            Scene::Grid(grid) => grid.pointer_smoothing,
            Scene::Constellation(cfg) => cfg.pointer_smoothing,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackdropConfig {
    pub scene: Scene,
    pub resolution: ResolutionConfig,
    pub timing: TimingConfig,
    /// Optional wave layer drawn before the scene.
    pub waves: Option<WaveConfig>,
    /// Clear color for hosts that own a whole window.
    #[serde(default = "default_background")]
    pub background: Rgba,
    /// Seed for particle placement. `None` seeds from entropy.
    pub seed: Option<u64>,
}

fn default_background() -> Rgba {
    Rgba::from_rgb8(8, 6, 20, 1.0)
}

impl Default for BackdropConfig {
    fn default() -> Self {
        Self {
            scene: Scene::default(),
            resolution: ResolutionConfig::default(),
            timing: TimingConfig::default(),
            waves: None,
            background: default_background(),
            seed: None,
        }
    }
}

impl BackdropConfig {
    // =========================================================================
    // PRESETS
    // =========================================================================

    /// The stock mesh grid.
    pub fn mesh_grid() -> Self {
        Self::default()
    }

    /// Mesh grid as tuned for the landing page hero.
    pub fn homepage_mesh() -> Self {
        let grid = GridConfig {
            spacing: 84.0,
            density: 0.72,
            line_color: Rgba::from_rgb8(255, 255, 255, 0.02),
            point_size: 1.6,
            warp: 0.14,
            pointer_smoothing: 0.16,
            spring: 0.08,
            damping: 0.88,
            max_points: 1200,
            ..GridConfig::default()
        };
        Self {
            scene: Scene::Grid(grid),
            resolution: ResolutionConfig {
                disable_below: 420.0,
                ..ResolutionConfig::default()
            },
            ..Self::default()
        }
    }

    /// Drifting constellation over layered waves.
    pub fn constellation() -> Self {
        Self {
            scene: Scene::Constellation(ConstellationConfig::default()),
            resolution: ResolutionConfig {
                min_css_size: 300.0,
                disable_below: 0.0,
                ..ResolutionConfig::default()
            },
            waves: Some(WaveConfig::default()),
            ..Self::default()
        }
    }

    /// Adjust for small screens and for users who asked for reduced motion.
    pub fn adapted(mut self, viewport_width: f32, reduced_motion: bool) -> Self {
        let compact = viewport_width < COMPACT_WIDTH;

        if let Scene::Constellation(cfg) = &mut self.scene {
            if compact {
                cfg.link_distance = 90.0;
                cfg.max_count = cfg.max_count.min(60);
            }
            if reduced_motion {
                cfg.max_count = cfg.max_count.min(30);
                cfg.min_count = cfg.min_count.min(cfg.max_count);
                cfg.speed = 0.1..0.3;
            }
        }

        if let Some(waves) = &mut self.waves {
            if compact {
                waves.base_amplitude = 6.0;
            }
            if reduced_motion {
                waves.layers = 2;
                waves.speed = 0.25 * 0.3;
            }
        }

        self
    }

    // =========================================================================
    // LOADING
    // =========================================================================

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that would make the simulation unstable or the tiling degenerate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.scene {
            Scene::Grid(grid) => {
                positive("scene.spacing", grid.spacing)?;
                positive("scene.density", grid.density)?;
                positive("scene.min_spacing", grid.min_spacing)?;
                positive("scene.influence_radius", grid.influence_radius)?;
                positive("scene.glow_radius", grid.glow_radius)?;
                unit_open("scene.damping", grid.damping)?;
                unit_open("scene.spring", grid.spring)?;
                smoothing("scene.pointer_smoothing", grid.pointer_smoothing)?;
                if grid.max_points < 4 {
                    return Err(ConfigError::invalid("scene.max_points", "must be at least 4"));
                }
            }
            Scene::Constellation(cfg) => {
                unit_open("scene.damping", cfg.damping)?;
                positive("scene.repel_radius", cfg.repel_radius)?;
                positive("scene.link_distance", cfg.link_distance)?;
                positive("scene.burst_radius", cfg.burst_radius)?;
                smoothing("scene.pointer_smoothing", cfg.pointer_smoothing)?;
                range("scene.speed", &cfg.speed)?;
                range("scene.size", &cfg.size)?;
                range("scene.alpha", &cfg.alpha)?;
                if cfg.wrap_margin < 0.0 {
                    return Err(ConfigError::invalid("scene.wrap_margin", "must not be negative"));
                }
                if cfg.link_every == 0 {
                    return Err(ConfigError::invalid("scene.link_every", "must be at least 1"));
                }
                if cfg.min_count > cfg.max_count {
                    return Err(ConfigError::invalid(
                        "scene.min_count",
                        format!("{} exceeds max_count {}", cfg.min_count, cfg.max_count),
                    ));
                }
            }
        }

        positive("resolution.max_device_pixel_ratio", self.resolution.max_device_pixel_ratio)?;
        if !(self.resolution.render_scale > 0.0 && self.resolution.render_scale <= 1.0) {
            return Err(ConfigError::invalid("resolution.render_scale", "must be in (0, 1]"));
        }
        positive("timing.frame_target_ms", self.timing.frame_target_ms)?;
        positive("timing.max_delta_ms", self.timing.max_delta_ms)?;

        if let Some(waves) = &self.waves {
            if waves.samples < 2 {
                return Err(ConfigError::invalid("waves.samples", "must be at least 2"));
            }
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("expected a positive number, got {value}")))
    }
}

fn unit_open(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be strictly between 0 and 1, got {value}")))
    }
}

fn smoothing(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be in (0, 1], got {value}")))
    }
}

fn range(field: &'static str, value: &Range<f32>) -> Result<(), ConfigError> {
    if value.start.is_finite() && value.end.is_finite() && value.start < value.end {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("empty range {value:?}")))
    }
}
