//! Pointer-proximity styling for tiles laid out on top of the background.
//!
//! Each tile lifts, grows and brightens as the pointer approaches its center.
//! Tiles are reached through [`StyleTarget`], so the same field drives DOM
//! elements, widgets or test doubles without knowing which.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::physics::proximity;
use crate::pointer::PointerState;
use crate::viewport::Rect;

/// Something that can be measured and restyled.
pub trait StyleTarget {
    /// Current bounds in the pointer's coordinate space, or `None` when layout
    /// cannot be read right now.
    fn measure(&self) -> Option<Rect>;

    fn apply(&mut self, style: &TileStyle);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoverConfig {
    /// Maximum upward lift in CSS pixels.
    pub amplitude: f32,
    /// Pointer distance at which the effect vanishes.
    pub radius: f32,
    /// Extra scale at full intensity.
    pub scale_gain: f32,
    pub background: Rgba,
    pub border: Rgba,
    pub shadow: Rgba,
}

impl Default for HoverConfig {
    fn default() -> Self {
        Self {
            amplitude: 14.0,
            radius: 180.0,
            scale_gain: 0.06,
            background: Rgba::from_rgb8(255, 255, 255, 1.0),
            border: Rgba::from_rgb8(168, 85, 247, 1.0),
            shadow: Rgba::from_rgb8(0, 0, 0, 1.0),
        }
    }
}

/// Resolved style for one tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileStyle {
    /// Effect intensity in `0.0..=1.0`.
    pub intensity: f32,
    /// Upward translation in CSS pixels.
    pub lift: f32,
    pub scale: f32,
    pub background: Rgba,
    pub border: Rgba,
    pub shadow: Rgba,
}

#[derive(Debug, Clone, Default)]
pub struct HoverField {
    config: HoverConfig,
}

impl HoverField {
    pub fn new(config: HoverConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &HoverConfig {
        &self.config
    }

    /// Style for intensity `t`.
    pub fn style(&self, t: f32) -> TileStyle {
        let t = t.clamp(0.0, 1.0);
        let c = &self.config;
        TileStyle {
            intensity: t,
            lift: c.amplitude * t * t,
            scale: 1.0 + c.scale_gain * t,
            background: c.background.with_alpha(0.05 + 0.25 * t),
            border: c.border.with_alpha(0.4 + 0.6 * t),
            shadow: c.shadow.with_alpha(0.35 * t),
        }
    }

    /// Style every target for the current pointer.
    ///
    /// Targets whose measurement fails keep their previous style for this
    /// frame. Returns how many targets were restyled.
    pub fn update<T: StyleTarget>(&self, pointer: PointerState, targets: &mut [T]) -> usize {
        let mut applied = 0;
        for target in targets.iter_mut() {
            let Some(rect) = target.measure() else {
                continue;
            };
            target.apply(&self.style(self.intensity_at(rect.center(), pointer)));
            applied += 1;
        }
        applied
    }

    /// Put every target back at rest.
    pub fn reset<T: StyleTarget>(&self, targets: &mut [T]) {
        let rest = self.style(0.0);
        for target in targets.iter_mut() {
            target.apply(&rest);
        }
    }

    /// Intensity a target at `center` would get from `pointer`.
    pub fn intensity_at(&self, center: Vec2, pointer: PointerState) -> f32 {
        if pointer.active {
            proximity(center.distance(pointer.position), self.config.radius)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Tile {
        rect: Option<Rect>,
        style: Option<TileStyle>,
    }

    impl StyleTarget for Tile {
        fn measure(&self) -> Option<Rect> {
            self.rect
        }

        fn apply(&mut self, style: &TileStyle) {
            self.style = Some(*style);
        }
    }

    fn pointer_at(x: f32, y: f32) -> PointerState {
        PointerState {
            position: Vec2::new(x, y),
            active: true,
        }
    }

    #[test]
    fn test_style_curve() {
        let field = HoverField::default();
        let full = field.style(1.0);
        assert_eq!(full.lift, 14.0);
        assert!((full.scale - 1.06).abs() < 1e-6);
        assert!((full.background.a - 0.30).abs() < 1e-6);
        assert_eq!(full.border.a, 1.0);
        assert!((full.shadow.a - 0.35).abs() < 1e-6);

        let half = field.style(0.5);
        assert_eq!(half.lift, 3.5);

        let rest = field.style(0.0);
        assert_eq!(rest.lift, 0.0);
        assert_eq!(rest.scale, 1.0);
        assert_eq!(rest.shadow.a, 0.0);
    }

    #[test]
    fn test_intensity_falls_off_with_distance() {
        let field = HoverField::default();
        let center = Vec2::new(100.0, 100.0);
        assert_eq!(field.intensity_at(center, pointer_at(100.0, 100.0)), 1.0);
        assert!((field.intensity_at(center, pointer_at(190.0, 100.0)) - 0.5).abs() < 1e-6);
        assert_eq!(field.intensity_at(center, pointer_at(280.0, 100.0)), 0.0);
        assert_eq!(field.intensity_at(center, PointerState::INACTIVE), 0.0);
    }

    #[test]
    fn test_update_skips_unmeasurable() {
        let field = HoverField::default();
        let mut tiles = vec![
            Tile {
                rect: Some(Rect::new(0.0, 0.0, 100.0, 100.0)),
                ..Tile::default()
            },
            Tile::default(),
            Tile {
                rect: Some(Rect::new(1000.0, 0.0, 100.0, 100.0)),
                ..Tile::default()
            },
        ];

        let applied = field.update(pointer_at(50.0, 50.0), &mut tiles);
        assert_eq!(applied, 2);
        assert_eq!(tiles[0].style.unwrap().intensity, 1.0);
        assert!(tiles[1].style.is_none());
        assert_eq!(tiles[2].style.unwrap().intensity, 0.0);
    }

    #[test]
    fn test_inactive_pointer_and_reset() {
        let field = HoverField::default();
        let mut tiles = vec![Tile {
            rect: Some(Rect::new(0.0, 0.0, 10.0, 10.0)),
            ..Tile::default()
        }];
        field.update(pointer_at(5.0, 5.0), &mut tiles);
        assert!(tiles[0].style.unwrap().lift > 0.0);

        field.update(PointerState::INACTIVE, &mut tiles);
        assert_eq!(tiles[0].style.unwrap().lift, 0.0);

        field.update(pointer_at(5.0, 5.0), &mut tiles);
        field.reset(&mut tiles);
        assert_eq!(tiles[0].style.unwrap(), field.style(0.0));
    }
}
