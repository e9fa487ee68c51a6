//! Host input events.
//!
//! [`HostEvent`] is everything the engine reacts to, phrased the way a page
//! receives it: pointer and touch movement in client coordinates, window
//! resizes, visibility and intersection changes. [`InputTranslator`] produces
//! them from winit window events for the native host; other hosts construct
//! them directly.
//!
//! # Usage
//!
//! ```ignore
//! let mut input = InputTranslator::new(window.scale_factor());
//! // In window_event:
//! if let Some(event) = input.translate(&event) {
//!     engine.handle_event(event);
//! }
//! ```

use glam::Vec2;
use winit::event::{ElementState, MouseButton, TouchPhase, WindowEvent};

use crate::viewport::WindowMetrics;

/// An input the engine consumes. Positions are client coordinates in CSS
/// (logical) pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
    PointerMove { position: Vec2 },
    TouchMove { position: Vec2 },
    PointerDown { position: Vec2 },
    PointerUp,
    PointerLeave,
    TouchEnd,
    /// The window lost focus.
    WindowBlur,
    Resize(WindowMetrics),
    VisibilityChange { hidden: bool },
    IntersectionChange { intersecting: bool },
    /// The canvas moved within the client area (for example after a scroll).
    CanvasMoved { origin: Vec2 },
}

/// Converts winit window events into [`HostEvent`]s.
#[derive(Debug, Clone)]
pub struct InputTranslator {
    scale_factor: f64,
    /// Last known physical window size.
    physical_size: (u32, u32),
    /// Last cursor position in logical pixels.
    cursor: Option<Vec2>,
}

impl InputTranslator {
    pub fn new(scale_factor: f64) -> Self {
        Self {
            scale_factor: sanitize_scale(scale_factor),
            physical_size: (0, 0),
            cursor: None,
        }
    }

    #[inline]
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Current window metrics in logical pixels.
    pub fn metrics(&self) -> WindowMetrics {
        let (w, h) = self.physical_size;
        WindowMetrics::new(
            (w as f64 / self.scale_factor) as f32,
            (h as f64 / self.scale_factor) as f32,
            self.scale_factor as f32,
        )
    }

    fn logical(&self, x: f64, y: f64) -> Vec2 {
        Vec2::new((x / self.scale_factor) as f32, (y / self.scale_factor) as f32)
    }

    /// Translate one winit event. Events the engine does not consume map to `None`.
    pub fn translate(&mut self, event: &WindowEvent) -> Option<HostEvent> {
        match event {
            WindowEvent::CursorMoved { position, .. } => Some(self.cursor_moved(position.x, position.y)),
            WindowEvent::CursorLeft { .. } => Some(self.cursor_left()),
            WindowEvent::MouseInput { state, button, .. } => self.mouse_input(*state, *button),
            WindowEvent::Touch(touch) => Some(self.touch(touch.phase, touch.location.x, touch.location.y)),
            WindowEvent::Focused(false) => Some(HostEvent::WindowBlur),
            WindowEvent::Resized(size) => Some(self.resized(size.width, size.height)),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => Some(self.rescaled(*scale_factor)),
            WindowEvent::Occluded(hidden) => Some(HostEvent::VisibilityChange { hidden: *hidden }),
            _ => None,
        }
    }

    pub fn cursor_moved(&mut self, x: f64, y: f64) -> HostEvent {
        let position = self.logical(x, y);
        self.cursor = Some(position);
        HostEvent::PointerMove { position }
    }

    pub fn cursor_left(&mut self) -> HostEvent {
        self.cursor = None;
        HostEvent::PointerLeave
    }

    /// Primary-button presses become pointer down/up at the last cursor position.
    pub fn mouse_input(&mut self, state: ElementState, button: MouseButton) -> Option<HostEvent> {
        if button != MouseButton::Left {
            return None;
        }
        match state {
            ElementState::Pressed => self.cursor.map(|position| HostEvent::PointerDown { position }),
            ElementState::Released => Some(HostEvent::PointerUp),
        }
    }

    pub fn touch(&mut self, phase: TouchPhase, x: f64, y: f64) -> HostEvent {
        let position = self.logical(x, y);
        match phase {
            TouchPhase::Started => {
                self.cursor = Some(position);
                HostEvent::PointerDown { position }
            }
            TouchPhase::Moved => {
                self.cursor = Some(position);
                HostEvent::TouchMove { position }
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                self.cursor = None;
                HostEvent::TouchEnd
            }
        }
    }

    pub fn resized(&mut self, width: u32, height: u32) -> HostEvent {
        self.physical_size = (width, height);
        HostEvent::Resize(self.metrics())
    }

    pub fn rescaled(&mut self, scale_factor: f64) -> HostEvent {
        self.scale_factor = sanitize_scale(scale_factor);
        HostEvent::Resize(self.metrics())
    }
}

fn sanitize_scale(scale: f64) -> f64 {
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}
