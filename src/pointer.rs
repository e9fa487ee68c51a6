//! Pointer tracking in canvas-local coordinates.
//!
//! Events arrive in client (window) coordinates and are written here outside
//! the frame loop. The physics step reads the smoothed position once per frame.

use glam::Vec2;

/// Position used while no pointer is over the page. Far enough from any
/// viewport that every distance-based influence is zero.
pub const FAR_AWAY: Vec2 = Vec2::new(-9999.0, -9999.0);

/// What the physics step sees of the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerState {
    pub position: Vec2,
    pub active: bool,
}

impl PointerState {
    pub const INACTIVE: PointerState = PointerState {
        position: FAR_AWAY,
        active: false,
    };
}

impl Default for PointerState {
    fn default() -> Self {
        Self::INACTIVE
    }
}

#[derive(Debug, Clone)]
pub struct PointerTracker {
    /// Canvas top-left in client coordinates.
    canvas_origin: Vec2,
    target: Vec2,
    smoothed: Vec2,
    active: bool,
    pressed: bool,
    pending_burst: Option<Vec2>,
}

impl Default for PointerTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PointerTracker {
    pub fn new() -> Self {
        Self {
            canvas_origin: Vec2::ZERO,
            target: FAR_AWAY,
            smoothed: FAR_AWAY,
            active: false,
            pressed: false,
            pending_burst: None,
        }
    }

    /// Update where the canvas sits in client coordinates.
    pub fn set_canvas_origin(&mut self, origin: Vec2) {
        self.canvas_origin = origin;
    }

    #[inline]
    pub fn canvas_origin(&self) -> Vec2 {
        self.canvas_origin
    }

    /// Pointer or touch moved to `client`.
    ///
    /// The first move after activation jumps straight to the target instead of
    /// sweeping in from the sentinel.
    pub fn move_to(&mut self, client: Vec2) {
        self.target = client - self.canvas_origin;
        if !self.active {
            self.active = true;
            self.smoothed = self.target;
        }
    }

    /// Pointer left the page, touch ended, or the window lost focus.
    pub fn leave(&mut self) {
        self.active = false;
        self.pressed = false;
        self.target = FAR_AWAY;
        self.smoothed = FAR_AWAY;
    }

    /// Pointer pressed at `client`; queues a burst at that spot.
    pub fn press(&mut self, client: Vec2) {
        self.move_to(client);
        self.pressed = true;
        self.pending_burst = Some(self.target);
    }

    pub fn release(&mut self) {
        self.pressed = false;
    }

    #[inline]
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Take the queued burst, if any.
    pub fn take_burst(&mut self) -> Option<Vec2> {
        self.pending_burst.take()
    }

    /// Move the smoothed position toward the raw target.
    ///
    /// `smoothing` is the fraction of the remaining distance covered in one
    /// reference frame; `dt_scale` is the frame's length in reference frames.
    pub fn advance(&mut self, smoothing: f32, dt_scale: f32) {
        if !self.active {
            return;
        }
        let keep = (1.0 - smoothing.clamp(0.0, 1.0)).powf(dt_scale.max(0.0));
        self.smoothed += (self.target - self.smoothed) * (1.0 - keep);
    }

    /// Smoothed pointer, or the inactive sentinel.
    pub fn state(&self) -> PointerState {
        if self.active {
            PointerState {
                position: self.smoothed,
                active: true,
            }
        } else {
            PointerState::INACTIVE
        }
    }

    /// Latest raw position in canvas space.
    #[inline]
    pub fn target(&self) -> Vec2 {
        self.target
    }
}
