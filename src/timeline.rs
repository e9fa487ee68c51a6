//! Scroll-synchronized timeline marker.
//!
//! A single marker travels along the timeline axis. Between milestones it is a
//! small dot; as the milestone nearest the viewport's vertical center comes
//! into the middle of the screen the marker grows into a pill covering that
//! milestone's box, fading the pill in and the blur out.
//!
//! Layout is re-read on scroll and resize ([`TimelineSync::update_layout`]);
//! the marker eases toward its target once per frame ([`TimelineSync::step`])
//! and snaps exactly onto it once within `snap_epsilon`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::physics::proximity;
use crate::viewport::Rect;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Dot diameter in CSS pixels.
    pub dot_size: f32,
    /// Distance from the viewport center at which a milestone stops engaging the pill.
    pub engage_radius: f32,
    /// Fraction of the remaining distance covered per frame.
    pub ease: f32,
    /// Below this difference the marker snaps onto its target.
    pub snap_epsilon: f32,
    /// Blur applied to the dot, in CSS pixels.
    pub max_blur: f32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            dot_size: 20.0,
            engage_radius: 120.0,
            ease: 0.2,
            snap_epsilon: 0.5,
            max_blur: 6.0,
        }
    }
}

/// Where and how to draw the marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerState {
    pub rect: Rect,
    /// Opacity of the pill overlay; the dot shows with `1 - pill_opacity`.
    pub pill_opacity: f32,
    pub blur: f32,
}

impl MarkerState {
    fn lerp(&self, other: &MarkerState, t: f32) -> MarkerState {
        MarkerState {
            rect: self.rect.lerp(&other.rect, t),
            pill_opacity: self.pill_opacity + (other.pill_opacity - self.pill_opacity) * t,
            blur: self.blur + (other.blur - self.blur) * t,
        }
    }

    /// Largest per-component difference.
    fn max_difference(&self, other: &MarkerState) -> f32 {
        let origin = (self.rect.origin - other.rect.origin).abs().max_element();
        let size = (self.rect.size - other.rect.size).abs().max_element();
        let opacity = (self.pill_opacity - other.pill_opacity).abs();
        let blur = (self.blur - other.blur).abs();
        origin.max(size).max(opacity).max(blur)
    }
}

/// Index of the measurable milestone whose midpoint is nearest `center_y`.
pub fn active_milestone(milestones: &[Option<Rect>], center_y: f32) -> Option<usize> {
    milestones
        .iter()
        .enumerate()
        .filter_map(|(i, m)| m.map(|rect| (i, (rect.center().y - center_y).abs())))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Frames [`TimelineSync::step`] needs to settle from a difference of
/// `distance`, including the final snap.
pub fn frames_to_converge(distance: f32, ease: f32, snap_epsilon: f32) -> u32 {
    if distance < snap_epsilon {
        return 1;
    }
    let ease = ease.clamp(1e-3, 1.0);
    if ease >= 1.0 {
        return 1;
    }
    let frames = ((snap_epsilon / distance).ln() / (1.0 - ease).ln()).ceil();
    frames.max(0.0) as u32 + 1
}

#[derive(Debug, Clone)]
pub struct TimelineSync {
    config: TimelineConfig,
    current: Option<MarkerState>,
    target: Option<MarkerState>,
    active: Option<usize>,
}

impl TimelineSync {
    pub fn new(config: TimelineConfig) -> Self {
        Self {
            config,
            current: None,
            target: None,
            active: None,
        }
    }

    /// Recompute the target from fresh measurements.
    ///
    /// `milestones` are client-space boxes (`None` where layout could not be
    /// read), `axis_x` is the timeline axis and `viewport_height` the visible
    /// height. The first call places the marker directly on its target.
    pub fn update_layout(&mut self, milestones: &[Option<Rect>], axis_x: f32, viewport_height: f32) {
        let center_y = viewport_height * 0.5;
        let Some(active) = active_milestone(milestones, center_y) else {
            return;
        };
        let measured: Vec<Rect> = milestones.iter().flatten().copied().collect();
        let (Some(first), Some(last)) = (measured.first(), measured.last()) else {
            return;
        };
        let Some(pill) = milestones[active] else {
            return;
        };

        let lo = first.center().y.min(last.center().y);
        let hi = first.center().y.max(last.center().y);
        let dot_y = center_y.clamp(lo, hi);
        let size = Vec2::splat(self.config.dot_size);
        let dot = Rect {
            origin: Vec2::new(axis_x, dot_y) - size * 0.5,
            size,
        };

        let engagement = proximity((pill.center().y - center_y).abs(), self.config.engage_radius);
        let target = MarkerState {
            rect: dot.lerp(&pill, engagement),
            pill_opacity: engagement,
            blur: self.config.max_blur * (1.0 - engagement),
        };

        if self.active != Some(active) {
            tracing::trace!(active, "timeline milestone changed");
        }
        self.active = Some(active);
        self.target = Some(target);
        if self.current.is_none() {
            self.current = Some(target);
        }
    }

    /// Ease one frame toward the target. Returns the marker to draw.
    pub fn step(&mut self) -> Option<MarkerState> {
        let target = self.target?;
        let current = self.current.unwrap_or(target);
        let next = if current.max_difference(&target) < self.config.snap_epsilon {
            target
        } else {
            current.lerp(&target, self.config.ease.clamp(0.0, 1.0))
        };
        self.current = Some(next);
        Some(next)
    }

    /// Whether the marker sits exactly on its target.
    pub fn is_settled(&self) -> bool {
        matches!((self.current, self.target), (Some(c), Some(t)) if c == t)
    }

    #[inline]
    pub fn active(&self) -> Option<usize> {
        self.active
    }

    #[inline]
    pub fn marker(&self) -> Option<MarkerState> {
        self.current
    }

    #[inline]
    pub fn target(&self) -> Option<MarkerState> {
        self.target
    }
}
