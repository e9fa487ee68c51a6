//! # backdrop
//!
//! Pointer-reactive animated backgrounds: a warping mesh grid or a drifting
//! particle constellation, optionally over layered sine waves.
//!
//! The engine is host-agnostic. It simulates in CSS pixels, draws through the
//! [`Canvas2d`] trait and asks for frames through [`FrameDriver`], so the same
//! state machine runs in a winit window, in a headless snapshot or in tests.
//!
//! ## Quick Start
//!
//! ```ignore
//! use backdrop::prelude::*;
//!
//! fn main() -> Result<(), backdrop::HostError> {
//!     backdrop::run(BackdropConfig::homepage_mesh())
//! }
//! ```
//!
//! ## Driving the engine yourself
//!
//! ```ignore
//! use backdrop::prelude::*;
//!
//! let mut engine = Backdrop::new(BackdropConfig::constellation(), ManualDriver::new())?;
//! engine.mount(Some(DrawList::new()), WindowMetrics::new(1280.0, 720.0, 2.0));
//! engine.handle_event(HostEvent::PointerMove { position: Vec2::new(640.0, 360.0) });
//!
//! let mut now = 0.0;
//! while let Some(token) = engine.driver_mut().take_pending() {
//!     engine.frame(token, now);
//!     now += 16.0;
//! #   if now > 1000.0 { break; }
//! }
//! ```
//!
//! ## Scenes
//!
//! | Scene | Entities | Pointer | Press |
//! |-------|----------|---------|-------|
//! | Mesh grid | lattice points joined right, down and diagonally | pulls nearby points, edges glow | nothing |
//! | Constellation | free particles linked by distance | repels | bursts particles outward |
//!
//! Both pause while the page is hidden, the canvas is scrolled out of view or
//! the viewport is narrower than the configured threshold, and resume without
//! replaying the time spent paused.
//!
//! ## Page decorations
//!
//! [`tiles::HoverField`] lifts and brightens tiles near the pointer;
//! [`timeline::TimelineSync`] slides a marker along a scrolling timeline.
//! Both are independent of the engine and work on anything implementing
//! their small measurement traits.

pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod gpu;
pub mod input;
pub mod lifecycle;
pub mod physics;
pub mod pointer;
pub mod render;
pub mod scheduler;
pub mod snapshot;
pub mod spatial;
pub mod store;
pub mod tiles;
pub mod time;
pub mod timeline;
pub mod viewport;
pub mod waves;
mod window;

pub use color::Rgba;
pub use config::{
    BackdropConfig, ConstellationConfig, GridConfig, ResolutionConfig, Scene, TimingConfig, WaveConfig,
};
pub use engine::{Backdrop, FrameOutcome, MountOutcome};
pub use error::{ColorError, ConfigError, GpuError, HostError, SnapshotError};
pub use glam::{UVec2, Vec2};
pub use input::HostEvent;
pub use render::{BlendMode, Canvas2d, DrawList, PixelCanvas, Segment};
pub use scheduler::{FrameDriver, FrameToken, ManualDriver};
pub use snapshot::{render_snapshot, SnapshotPlan, SnapshotReport};
pub use viewport::{Viewport, WindowMetrics};
pub use window::{run, RedrawDriver};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use backdrop::prelude::*;
/// ```
///
/// This imports:
/// - [`Backdrop`] - the engine
/// - [`BackdropConfig`] and its scene configs
/// - [`HostEvent`] and [`WindowMetrics`] - what hosts feed in
/// - [`Canvas2d`], [`DrawList`], [`PixelCanvas`] - render targets
/// - [`FrameDriver`], [`ManualDriver`] - frame scheduling
/// - [`Vec2`] - glam vector type
pub mod prelude {
    pub use crate::color::Rgba;
    pub use crate::config::{BackdropConfig, ConstellationConfig, GridConfig, Scene, WaveConfig};
    pub use crate::engine::{Backdrop, FrameOutcome, MountOutcome};
    pub use crate::input::HostEvent;
    pub use crate::render::{BlendMode, Canvas2d, DrawList, PixelCanvas};
    pub use crate::scheduler::{FrameDriver, FrameToken, ManualDriver};
    pub use crate::tiles::{HoverField, StyleTarget};
    pub use crate::timeline::TimelineSync;
    pub use crate::viewport::{Rect, WindowMetrics};
    pub use glam::Vec2;
}
