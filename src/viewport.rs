//! Viewport sizing and backing-store resolution.
//!
//! Drawing code works in CSS pixels. The backing store is sized in device pixels,
//! with the device pixel ratio capped so very dense displays do not multiply the
//! per-frame cost, and optionally scaled down further for constrained devices.

use glam::{UVec2, Vec2};

use crate::config::ResolutionConfig;

/// What the host knows about its window or page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowMetrics {
    /// Inner width in CSS (logical) pixels.
    pub width: f32,
    /// Inner height in CSS (logical) pixels.
    pub height: f32,
    pub device_pixel_ratio: f32,
}

impl WindowMetrics {
    pub fn new(width: f32, height: f32, device_pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }
}

/// Axis-aligned rectangle in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.origin + self.size * 0.5
    }

    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        point.cmpge(self.origin).all() && point.cmple(self.origin + self.size).all()
    }

    /// Component-wise interpolation of origin and size.
    pub fn lerp(&self, other: &Rect, t: f32) -> Rect {
        Rect {
            origin: self.origin.lerp(other.origin, t),
            size: self.size.lerp(other.size, t),
        }
    }
}

/// Resolved canvas dimensions for the current window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Display size in CSS pixels; every simulation coordinate lives in this space.
    pub css_size: Vec2,
    /// Effective ratio between backing pixels and CSS pixels.
    pub pixel_ratio: f32,
    /// Backing-store size in device pixels.
    pub backing_size: UVec2,
}

impl Viewport {
    /// Size the canvas for the given window.
    ///
    /// Degenerate or non-finite dimensions clamp to at least one pixel so the
    /// builders never divide by zero or tile forever.
    pub fn compute(metrics: WindowMetrics, config: &ResolutionConfig) -> Self {
        let floor = config.min_css_size.max(1.0);
        let dim = |v: f32| if v.is_finite() { v.max(floor) } else { floor };
        let css_size = Vec2::new(dim(metrics.width), dim(metrics.height));

        let device_ratio = if metrics.device_pixel_ratio.is_finite() && metrics.device_pixel_ratio > 0.0 {
            metrics.device_pixel_ratio
        } else {
            1.0
        };
        let pixel_ratio = device_ratio.min(config.max_device_pixel_ratio) * config.render_scale;

        let backing = (css_size * pixel_ratio).round().max(Vec2::ONE);
        Self {
            css_size,
            pixel_ratio,
            backing_size: UVec2::new(backing.x as u32, backing.y as u32),
        }
    }

    /// Uniform scale that maps CSS-pixel drawing onto the backing store.
    #[inline]
    pub fn transform_scale(&self) -> f32 {
        self.pixel_ratio
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.css_size.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.css_size.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.css_size * 0.5
    }
}

/// Whether the effect should run at all for this window.
pub fn effect_enabled(metrics: WindowMetrics, config: &ResolutionConfig) -> bool {
    metrics.width >= config.disable_below
}
