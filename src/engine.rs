//! The background engine.
//!
//! [`Backdrop`] owns every piece of state for one canvas: the store, the
//! pointer, the renderer, the scheduler and the canvas itself. Hosts feed it
//! [`HostEvent`]s and deliver frame callbacks; everything else happens inside.
//!
//! # Frame sequence
//!
//! 1. The host delivers the token the scheduler asked for.
//! 2. Stale tokens (from before an unmount) are dropped untouched.
//! 3. While paused the frame only moves the clock's reference point.
//! 4. Otherwise: tick the clock, smooth the pointer, run physics, draw,
//!    request the next frame. Physics always runs before rendering.
//!
//! # Example
//!
//! ```ignore
//! let mut engine = Backdrop::new(BackdropConfig::homepage_mesh(), ManualDriver::new())?;
//! engine.mount(Some(DrawList::new()), WindowMetrics::new(1280.0, 720.0, 2.0));
//! while let Some(token) = engine.driver_mut().take_pending() {
//!     engine.frame(token, now_ms());
//! }
//! ```

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::config::{BackdropConfig, Scene};
use crate::error::ConfigError;
use crate::input::HostEvent;
use crate::lifecycle::VisibilityGate;
use crate::physics;
use crate::pointer::{PointerState, PointerTracker};
use crate::render::{Canvas2d, Renderer};
use crate::scheduler::{FrameDecision, FrameDriver, FrameToken, Scheduler, SchedulerState};
use crate::store::EntityStore;
use crate::time::FrameClock;
use crate::viewport::{effect_enabled, Viewport, WindowMetrics};
use crate::waves::WaveField;

/// Result of [`Backdrop::mount`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountOutcome {
    /// Animating.
    Running,
    /// No drawing context was available; the engine stays inert.
    Unsupported,
    /// The viewport is below the disable threshold; nothing was scheduled.
    Disabled,
}

/// Result of [`Backdrop::frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Physics stepped and the frame was drawn.
    Rendered,
    /// The engine is paused; nothing changed.
    Paused,
    /// The token belongs to a retired or never-started schedule.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Fresh,
    Mounted,
    /// Mounted without effect (unsupported or disabled). Ignores everything.
    Inert,
    Unmounted,
}

/// One animated background bound to one canvas.
pub struct Backdrop<C: Canvas2d, D: FrameDriver> {
    config: BackdropConfig,
    phase: Phase,
    canvas: Option<C>,
    scheduler: Scheduler<D>,
    store: EntityStore,
    pointer: PointerTracker,
    renderer: Renderer,
    waves: Option<WaveField>,
    clock: FrameClock,
    gate: VisibilityGate,
    metrics: WindowMetrics,
    viewport: Viewport,
    rng: SmallRng,
}

impl<C: Canvas2d, D: FrameDriver> Backdrop<C, D> {
    /// Create an engine for `config`. Nothing happens until [`mount`](Self::mount).
    pub fn new(config: BackdropConfig, driver: D) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let metrics = WindowMetrics::new(1.0, 1.0, 1.0);
        Ok(Self {
            clock: FrameClock::from_config(&config.timing),
            viewport: Viewport::compute(metrics, &config.resolution),
            waves: config.waves.clone().map(WaveField::new),
            config,
            phase: Phase::Fresh,
            canvas: None,
            scheduler: Scheduler::new(driver),
            store: EntityStore::new(),
            pointer: PointerTracker::new(),
            renderer: Renderer::new(),
            gate: VisibilityGate::new(),
            metrics,
            rng,
        })
    }

    /// Attach to a canvas and start animating.
    ///
    /// `canvas` is `None` when the host could not obtain a drawing context; the
    /// engine then degrades silently. Mounting twice is a no-op.
    pub fn mount(&mut self, canvas: Option<C>, metrics: WindowMetrics) -> MountOutcome {
        match self.phase {
            Phase::Fresh => {}
            Phase::Mounted => return MountOutcome::Running,
            Phase::Inert | Phase::Unmounted => return MountOutcome::Unsupported,
        }

        if !effect_enabled(metrics, &self.config.resolution) {
            tracing::info!(
                width = metrics.width,
                threshold = self.config.resolution.disable_below,
                "viewport too narrow, background disabled"
            );
            self.phase = Phase::Inert;
            return MountOutcome::Disabled;
        }

        let Some(canvas) = canvas else {
            tracing::warn!("no drawing context available, background disabled");
            self.phase = Phase::Inert;
            return MountOutcome::Unsupported;
        };

        self.canvas = Some(canvas);
        self.phase = Phase::Mounted;
        self.pointer = PointerTracker::new();
        self.apply_metrics(metrics);
        self.scheduler.start();
        tracing::info!(
            width = self.viewport.width(),
            height = self.viewport.height(),
            entities = self.store.len(),
            "background mounted"
        );
        MountOutcome::Running
    }

    /// Detach for good: cancel the pending frame and release the canvas.
    ///
    /// Later events and frame callbacks are ignored.
    pub fn unmount(&mut self) {
        if self.phase == Phase::Unmounted {
            return;
        }
        self.scheduler.stop();
        self.canvas = None;
        self.pointer.leave();
        self.phase = Phase::Unmounted;
        tracing::info!("background unmounted");
    }

    /// React to one host event.
    pub fn handle_event(&mut self, event: HostEvent) {
        if self.phase != Phase::Mounted {
            tracing::trace!(?event, "ignoring event while not mounted");
            return;
        }
        match event {
            HostEvent::PointerMove { position } | HostEvent::TouchMove { position } => {
                self.pointer.move_to(position);
            }
            HostEvent::PointerDown { position } => self.pointer.press(position),
            HostEvent::PointerUp => self.pointer.release(),
            HostEvent::PointerLeave | HostEvent::TouchEnd | HostEvent::WindowBlur => self.pointer.leave(),
            HostEvent::Resize(metrics) => self.apply_metrics(metrics),
            HostEvent::VisibilityChange { hidden } => {
                if self.gate.set_page_hidden(hidden) {
                    self.apply_visibility();
                }
            }
            HostEvent::IntersectionChange { intersecting } => {
                if self.gate.set_intersecting(intersecting) {
                    self.apply_visibility();
                }
            }
            HostEvent::CanvasMoved { origin } => self.pointer.set_canvas_origin(origin),
        }
    }

    /// Size the canvas for `metrics` and rebuild the store from scratch.
    fn apply_metrics(&mut self, metrics: WindowMetrics) {
        self.metrics = metrics;
        self.viewport = Viewport::compute(metrics, &self.config.resolution);
        tracing::debug!(
            css = ?self.viewport.css_size,
            backing = ?self.viewport.backing_size,
            ratio = self.viewport.pixel_ratio,
            "viewport resized"
        );

        if let Some(canvas) = self.canvas.as_mut() {
            canvas.configure(&self.viewport);
            canvas.set_transform(self.viewport.transform_scale());
        }

        match &self.config.scene {
            Scene::Grid(grid) => self.store.rebuild_grid(self.viewport.css_size, grid),
            Scene::Constellation(cfg) => {
                self.store
                    .rebuild_constellation(self.viewport.css_size, cfg, &mut self.rng)
            }
        }
        self.renderer.invalidate();

        let undersized = !effect_enabled(metrics, &self.config.resolution);
        if self.gate.set_undersized(undersized) {
            if undersized {
                tracing::warn!(width = metrics.width, "viewport below threshold, pausing");
            }
            self.apply_visibility();
        }
    }

    fn apply_visibility(&mut self) {
        if self.gate.is_visible() {
            // The next tick measures from zero so the pause is not simulated.
            self.clock.reset_reference();
            self.scheduler.resume();
        } else {
            self.scheduler.pause();
        }
    }

    /// Handle a frame callback delivered at `now_ms`.
    pub fn frame(&mut self, token: FrameToken, now_ms: f64) -> FrameOutcome {
        match self.scheduler.begin_frame(token) {
            None => {
                tracing::debug!(generation = token.generation(), "stale frame ignored");
                FrameOutcome::Stale
            }
            Some(FrameDecision::Skip) => {
                self.clock.skip(now_ms);
                self.scheduler.end_frame();
                FrameOutcome::Paused
            }
            Some(FrameDecision::Work) => {
                self.step(now_ms);
                self.draw();
                self.scheduler.end_frame();
                FrameOutcome::Rendered
            }
        }
    }

    fn step(&mut self, now_ms: f64) {
        let step = self.clock.tick(now_ms);

        // An impulse, not time-scaled: it lands even when no time has passed.
        if let Some(center) = self.pointer.take_burst() {
            if let Scene::Constellation(cfg) = &self.config.scene {
                let pushed = physics::apply_burst(self.store.entities_mut(), center, cfg);
                tracing::trace!(pushed, "pointer burst");
            }
        }
        if step.delta_ms <= 0.0 {
            return;
        }

        self.pointer.advance(self.config.scene.pointer_smoothing(), step.dt_scale);
        let pointer = self.pointer.state();

        match &self.config.scene {
            Scene::Grid(grid) => {
                physics::step_grid(self.store.entities_mut(), pointer, grid, step.dt_scale);
            }
            Scene::Constellation(cfg) => {
                let bounds = self.store.bounds();
                physics::step_constellation(self.store.entities_mut(), pointer, cfg, bounds, step.dt_scale);
            }
        }

        if let Some(waves) = self.waves.as_mut() {
            waves.advance(step.delta_ms, pointer, self.viewport.css_size);
        }
    }

    fn draw(&mut self) {
        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        self.renderer.draw_frame(
            canvas,
            &self.store,
            self.pointer.state(),
            &self.config.scene,
            self.waves.as_ref(),
            &self.viewport,
        );
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    #[inline]
    pub fn config(&self) -> &BackdropConfig {
        &self.config
    }

    #[inline]
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    #[inline]
    pub fn pointer(&self) -> PointerState {
        self.pointer.state()
    }

    #[inline]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    #[inline]
    pub fn visibility(&self) -> &VisibilityGate {
        &self.gate
    }

    #[inline]
    pub fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    #[inline]
    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    #[inline]
    pub fn waves(&self) -> Option<&WaveField> {
        self.waves.as_ref()
    }

    #[inline]
    pub fn canvas(&self) -> Option<&C> {
        self.canvas.as_ref()
    }

    #[inline]
    pub fn canvas_mut(&mut self) -> Option<&mut C> {
        self.canvas.as_mut()
    }

    #[inline]
    pub fn driver(&self) -> &D {
        self.scheduler.driver()
    }

    #[inline]
    pub fn driver_mut(&mut self) -> &mut D {
        self.scheduler.driver_mut()
    }

    #[inline]
    pub fn is_mounted(&self) -> bool {
        self.phase == Phase::Mounted
    }
}
