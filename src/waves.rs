//! Layered sine waves drawn beneath the constellation.
//!
//! Each layer is a polyline across the full width, closed down to the bottom
//! edge and filled. Amplitude swells as the pointer approaches the center of
//! the viewport.

use glam::Vec2;

use crate::config::WaveConfig;
use crate::physics::proximity;
use crate::pointer::PointerState;

/// Phase advance per millisecond at unit speed.
const PHASE_RATE: f32 = 0.0008;

#[derive(Debug, Clone)]
pub struct WaveField {
    config: WaveConfig,
    phase: f32,
    influence: f32,
}

impl WaveField {
    pub fn new(config: WaveConfig) -> Self {
        Self {
            config,
            phase: 0.0,
            influence: 0.0,
        }
    }

    /// Advance the phase by `dt_ms` and refresh pointer influence for a
    /// viewport of `size`.
    pub fn advance(&mut self, dt_ms: f32, pointer: PointerState, size: Vec2) {
        self.phase += self.config.speed * PHASE_RATE * dt_ms;
        self.influence = if pointer.active {
            let d = pointer.position.distance(size * 0.5);
            proximity(d, size.max_element())
        } else {
            0.0
        };
    }

    #[inline]
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Pointer influence in `0.0..=1.0`.
    #[inline]
    pub fn influence(&self) -> f32 {
        self.influence
    }

    #[inline]
    pub fn config(&self) -> &WaveConfig {
        &self.config
    }

    pub fn layer_count(&self) -> u32 {
        self.config.layers
    }

    pub fn layer_amplitude(&self, layer: u32) -> f32 {
        let l = layer as f32;
        self.config.base_amplitude * (1.0 + 0.6 * l) * (0.6 + 1.6 * self.influence)
    }

    pub fn layer_alpha(&self, layer: u32) -> f32 {
        0.02 + 0.02 * layer as f32
    }

    /// Fill `out` with the top edge of `layer` for a viewport of `size`.
    pub fn sample_layer(&self, layer: u32, size: Vec2, out: &mut Vec<Vec2>) {
        out.clear();
        let l = layer as f32;
        let amp = self.layer_amplitude(layer);
        let offset = self.phase * (1.0 + 0.3 * l);
        let baseline = size.y * (0.35 + 0.04 * l);
        let wobble = 0.7 + (offset + l).sin() * 0.1;
        let samples = self.config.samples.max(1);

        out.extend((0..=samples).map(|i| {
            let fi = i as f32;
            let s = (fi * 0.02 + offset * 0.6).sin() * amp * wobble
                + (fi * 0.05 + offset * (0.9 + 0.2 * l)).sin() * amp * 0.4;
            Vec2::new(fi / samples as f32 * size.x, baseline + s)
        }));
    }
}
