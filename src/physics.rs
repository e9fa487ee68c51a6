//! Per-frame physics for both scene kinds.
//!
//! Velocities are expressed per reference frame (16.67 ms); positions integrate
//! `velocity * dt_scale` so motion speed is independent of the display's refresh
//! rate. Damping is applied once per step and is always strictly below 1, which
//! keeps every trajectory bounded.

use glam::Vec2;

use crate::config::{ConstellationConfig, GridConfig};
use crate::pointer::PointerState;
use crate::store::Entity;

/// Keeps the repel direction finite when a particle sits exactly under the pointer.
const REPEL_EPSILON: f32 = 0.01;

/// Linear falloff: 1 at the center, 0 at and beyond `radius`.
#[inline]
pub fn proximity(distance: f32, radius: f32) -> f32 {
    if radius > 0.0 && distance < radius {
        1.0 - distance / radius
    } else {
        0.0
    }
}

/// Advance the mesh: spring back to rest, get pulled toward the pointer.
pub fn step_grid(entities: &mut [Entity], pointer: PointerState, config: &GridConfig, dt_scale: f32) {
    let pull = config.warp * config.warp_gain;

    for point in entities.iter_mut() {
        point.velocity += (point.origin - point.position) * config.spring;

        if pointer.active {
            let to_pointer = pointer.position - point.position;
            let dist = to_pointer.length();
            let t = proximity(dist, config.influence_radius);
            if t > 0.0 && dist > 0.0 {
                point.velocity += to_pointer / dist * pull * t;
            }
        }

        point.velocity *= config.damping;
        point.position += point.velocity * dt_scale;
    }
}

/// Advance free particles: drift, get pushed away from the pointer, wrap.
pub fn step_constellation(
    entities: &mut [Entity],
    pointer: PointerState,
    config: &ConstellationConfig,
    bounds: Vec2,
    dt_scale: f32,
) {
    for particle in entities.iter_mut() {
        if pointer.active {
            let away = particle.position - pointer.position;
            let dist = away.length();
            let t = proximity(dist, config.repel_radius);
            if t > 0.0 {
                particle.velocity += away / (dist + REPEL_EPSILON) * config.repel_strength * t;
            }
        }

        particle.velocity *= config.damping;
        particle.position += particle.velocity * dt_scale;
        particle.position = wrap(particle.position, bounds, config.wrap_margin);
    }
}

/// Outward impulse for every particle within the burst radius of `center`.
///
/// Returns how many particles were pushed.
pub fn apply_burst(entities: &mut [Entity], center: Vec2, config: &ConstellationConfig) -> usize {
    let mut pushed = 0;
    for particle in entities.iter_mut() {
        let away = particle.position - center;
        let dist = away.length();
        let t = proximity(dist, config.burst_radius);
        if t > 0.0 && dist > 0.0 {
            particle.velocity += away / dist * config.burst_strength * t;
            pushed += 1;
        }
    }
    pushed
}

/// Toroidal wrap: leaving past one margin re-enters at the opposite one.
#[inline]
pub fn wrap(position: Vec2, bounds: Vec2, margin: f32) -> Vec2 {
    let axis = |v: f32, extent: f32| {
        if v < -margin {
            extent + margin
        } else if v > extent + margin {
            -margin
        } else {
            v
        }
    };
    Vec2::new(axis(position.x, bounds.x), axis(position.y, bounds.y))
}
