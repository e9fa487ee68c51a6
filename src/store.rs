//! Entity storage and the builders that fill it.
//!
//! The store is rebuilt from scratch on mount and on every resize. Nothing
//! survives a rebuild: grid neighbor indices are only meaningful within the
//! build that produced them, so `generation` is bumped each time.
//!
//! # Grid layout
//!
//! Points sit on a lattice with `cols = ceil(w / spacing) + 1` columns so the
//! mesh always overhangs the right and bottom edges. Each point links forward
//! to its right, lower and lower-right neighbors, which yields a triangulated
//! mesh where every edge is stored exactly once.
//!
//! # Constellation
//!
//! Particle count follows viewport area, with a little jitter, clamped to the
//! configured bounds. Placement and velocities come from the caller's RNG so
//! tests can seed it.

use std::f32::consts::TAU;
use std::ops::Range;

use glam::Vec2;
use rand::Rng;

use crate::config::{ConstellationConfig, GridConfig};

/// A single point or particle.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub position: Vec2,
    /// Rest position the grid spring pulls back to. Unused for free particles.
    pub origin: Vec2,
    pub velocity: Vec2,
    pub size: f32,
    /// Base opacity fixed at creation.
    pub alpha: f32,
    /// Forward neighbors (indices into the same store). Empty for free particles.
    pub neighbors: Vec<u32>,
}

impl Entity {
    fn at_rest(position: Vec2, size: f32) -> Self {
        Self {
            position,
            origin: position,
            velocity: Vec2::ZERO,
            size,
            alpha: 1.0,
            neighbors: Vec::new(),
        }
    }
}

/// Shape of the current build.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoreKind {
    /// Nothing built yet.
    Empty,
    Grid { cols: usize, rows: usize, spacing: f32 },
    Constellation,
}

#[derive(Debug, Clone)]
pub struct EntityStore {
    entities: Vec<Entity>,
    kind: StoreKind,
    bounds: Vec2,
    generation: u64,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            kind: StoreKind::Empty,
            bounds: Vec2::ONE,
            generation: 0,
        }
    }

    /// Replace the contents with a lattice covering `size`.
    pub fn rebuild_grid(&mut self, size: Vec2, config: &GridConfig) {
        let size = clamp_size(size);
        let (cols, rows, spacing) = grid_dimensions(size, config);

        let mut entities = Vec::with_capacity(cols * rows);
        for row in 0..rows {
            for col in 0..cols {
                let position = Vec2::new(col as f32 * spacing, row as f32 * spacing);
                let mut entity = Entity::at_rest(position, config.point_size);

                let index = |c: usize, r: usize| (r * cols + c) as u32;
                let has_right = col + 1 < cols;
                let has_down = row + 1 < rows;
                if has_right {
                    entity.neighbors.push(index(col + 1, row));
                }
                if has_down {
                    entity.neighbors.push(index(col, row + 1));
                }
                if has_right && has_down {
                    entity.neighbors.push(index(col + 1, row + 1));
                }
                entities.push(entity);
            }
        }

        self.replace(entities, StoreKind::Grid { cols, rows, spacing }, size);
        tracing::info!(cols, rows, spacing, generation = self.generation, "built mesh grid");
    }

    /// Replace the contents with freshly seeded particles.
    pub fn rebuild_constellation<R: Rng + ?Sized>(
        &mut self,
        size: Vec2,
        config: &ConstellationConfig,
        rng: &mut R,
    ) {
        let size = clamp_size(size);
        let count = particle_count(size, config, rng);

        let entities = (0..count)
            .map(|_| {
                let position = Vec2::new(rng.gen::<f32>() * size.x, rng.gen::<f32>() * size.y);
                let heading = rng.gen::<f32>() * TAU;
                let speed = sample(rng, &config.speed);
                Entity {
                    position,
                    origin: position,
                    velocity: Vec2::from_angle(heading) * speed,
                    size: sample(rng, &config.size),
                    alpha: sample(rng, &config.alpha),
                    neighbors: Vec::new(),
                }
            })
            .collect();

        self.replace(entities, StoreKind::Constellation, size);
        tracing::info!(count, generation = self.generation, "seeded constellation");
    }

    fn replace(&mut self, entities: Vec<Entity>, kind: StoreKind, bounds: Vec2) {
        self.entities = entities;
        self.kind = kind;
        self.bounds = bounds;
        self.generation += 1;
    }

    #[inline]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    #[inline]
    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    #[inline]
    pub fn kind(&self) -> StoreKind {
        self.kind
    }

    /// Size in CSS pixels the current build covers.
    #[inline]
    pub fn bounds(&self) -> Vec2 {
        self.bounds
    }

    /// Incremented by every rebuild.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Iterate every mesh edge once as `(from, to)` index pairs.
    pub fn edges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.entities
            .iter()
            .enumerate()
            .flat_map(|(i, e)| e.neighbors.iter().map(move |&n| (i as u32, n)))
    }

    pub fn edge_count(&self) -> usize {
        self.entities.iter().map(|e| e.neighbors.len()).sum()
    }
}

/// Lattice shape for a viewport: `(cols, rows, spacing)`.
///
/// Spacing starts at the configured effective spacing and grows until the
/// point count fits `max_points`.
pub fn grid_dimensions(size: Vec2, config: &GridConfig) -> (usize, usize, f32) {
    let size = clamp_size(size);
    let mut spacing = config.effective_spacing().max(1.0);
    loop {
        let cols = ((size.x / spacing).ceil() as usize).saturating_add(1);
        let rows = ((size.y / spacing).ceil() as usize).saturating_add(1);
        let points = cols.saturating_mul(rows);
        if points <= config.max_points.max(4) {
            return (cols, rows, spacing);
        }
        let grow = (points as f32 / config.max_points.max(4) as f32).sqrt();
        spacing *= grow.max(1.01);
    }
}

fn particle_count<R: Rng + ?Sized>(size: Vec2, config: &ConstellationConfig, rng: &mut R) -> usize {
    let megapixels = size.x * size.y / 1_000_000.0;
    let base = (megapixels * config.particles_per_megapixel).round() as i64;
    let jitter = if config.count_jitter > 0 {
        rng.gen_range(0..=config.count_jitter as i64) - config.count_jitter as i64 / 2
    } else {
        0
    };
    (base + jitter).clamp(config.min_count as i64, config.max_count as i64) as usize
}

fn sample<R: Rng + ?Sized>(rng: &mut R, range: &Range<f32>) -> f32 {
    if range.start < range.end {
        rng.gen_range(range.clone())
    } else {
        range.start
    }
}

fn clamp_size(size: Vec2) -> Vec2 {
    let dim = |v: f32| if v.is_finite() { v.max(1.0) } else { 1.0 };
    Vec2::new(dim(size.x), dim(size.y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_grid_dimensions_for_reference_viewport() {
        let mut store = EntityStore::new();
        store.rebuild_grid(Vec2::new(800.0, 600.0), &GridConfig::default());
        assert_eq!(
            store.kind(),
            StoreKind::Grid {
                cols: 11,
                rows: 9,
                spacing: 80.0
            }
        );
        assert_eq!(store.len(), 99);
        assert_eq!(store.entities()[12].position, Vec2::new(80.0, 80.0));
    }

    #[test]
    fn test_grid_edges_unique_and_in_bounds() {
        let mut store = EntityStore::new();
        store.rebuild_grid(Vec2::new(800.0, 600.0), &GridConfig::default());

        let mut seen = HashSet::new();
        for (a, b) in store.edges() {
            assert!((b as usize) < store.len());
            let key = (a.min(b), a.max(b));
            assert!(seen.insert(key), "duplicate edge {key:?}");
        }
        // right edges + down edges + diagonals
        let expected = 10 * 9 + 11 * 8 + 10 * 8;
        assert_eq!(store.edge_count(), expected);
        assert_eq!(seen.len(), expected);
    }

    #[test]
    fn test_corner_point_has_no_neighbors() {
        let mut store = EntityStore::new();
        store.rebuild_grid(Vec2::new(800.0, 600.0), &GridConfig::default());
        assert!(store.entities().last().unwrap().neighbors.is_empty());
        assert_eq!(store.entities()[0].neighbors, vec![1, 11, 12]);
    }

    #[test]
    fn test_max_points_grows_spacing() {
        let config = GridConfig {
            max_points: 200,
            ..GridConfig::default()
        };
        let (cols, rows, spacing) = grid_dimensions(Vec2::new(1920.0, 1080.0), &config);
        assert!(cols * rows <= 200);
        assert!(spacing > 80.0);
    }

    #[test]
    fn test_huge_viewport_stays_within_cap() {
        let config = GridConfig::default();
        for size in [Vec2::splat(1.0e12), Vec2::splat(f32::MAX)] {
            let (cols, rows, _) = grid_dimensions(size, &config);
            assert!(cols * rows <= config.max_points);
        }
    }

    #[test]
    fn test_degenerate_size_builds_single_cell() {
        let mut store = EntityStore::new();
        store.rebuild_grid(Vec2::new(0.0, -5.0), &GridConfig::default());
        assert_eq!(store.len(), 4);
        assert_eq!(store.bounds(), Vec2::ONE);
    }

    #[test]
    fn test_rebuild_bumps_generation() {
        let mut store = EntityStore::new();
        assert_eq!(store.generation(), 0);
        store.rebuild_grid(Vec2::new(400.0, 300.0), &GridConfig::default());
        store.rebuild_grid(Vec2::new(400.0, 300.0), &GridConfig::default());
        assert_eq!(store.generation(), 2);
    }

    #[test]
    fn test_constellation_count_clamped() {
        let config = ConstellationConfig::default();
        let mut rng = SmallRng::seed_from_u64(7);
        let mut store = EntityStore::new();

        store.rebuild_constellation(Vec2::new(300.0, 300.0), &config, &mut rng);
        assert_eq!(store.len(), config.min_count);

        store.rebuild_constellation(Vec2::new(8000.0, 8000.0), &config, &mut rng);
        assert_eq!(store.len(), config.max_count);
    }

    #[test]
    fn test_constellation_particles_within_ranges() {
        let config = ConstellationConfig::default();
        let mut rng = SmallRng::seed_from_u64(42);
        let mut store = EntityStore::new();
        store.rebuild_constellation(Vec2::new(1920.0, 1080.0), &config, &mut rng);

        assert_eq!(store.kind(), StoreKind::Constellation);
        for p in store.entities() {
            assert!(p.position.x >= 0.0 && p.position.x <= 1920.0);
            assert!(p.position.y >= 0.0 && p.position.y <= 1080.0);
            assert!(config.size.contains(&p.size));
            assert!(config.alpha.contains(&p.alpha));
            let speed = p.velocity.length();
            assert!(speed >= config.speed.start - 1e-4 && speed <= config.speed.end + 1e-4);
            assert!(p.neighbors.is_empty());
        }
    }

    #[test]
    fn test_same_seed_same_constellation() {
        let config = ConstellationConfig::default();
        let mut a = EntityStore::new();
        let mut b = EntityStore::new();
        a.rebuild_constellation(Vec2::new(1280.0, 720.0), &config, &mut SmallRng::seed_from_u64(3));
        b.rebuild_constellation(Vec2::new(1280.0, 720.0), &config, &mut SmallRng::seed_from_u64(3));
        assert_eq!(a.entities(), b.entities());
    }
}
