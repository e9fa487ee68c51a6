//! Drawing the scene onto a 2D canvas.
//!
//! The [`Canvas2d`] trait is the render target the engine draws through. It is
//! deliberately small: stroked line batches, filled circles, radial glows,
//! filled bands and rectangles. Backends:
//!
//! - [`DrawList`] records commands for tests and inspection.
//! - [`PixelCanvas`] rasterizes in software into an [`image::RgbaImage`].
//! - [`crate::gpu::GpuCanvas`] tessellates into triangles for the wgpu backend.
//!
//! Coordinates passed to a canvas are always CSS pixels. The canvas maps them
//! onto its backing store with the scale given to [`Canvas2d::set_transform`].

mod draw_list;
mod raster;

pub use draw_list::{DrawCommand, DrawList};
pub use raster::PixelCanvas;

use glam::Vec2;

use crate::color::Rgba;
use crate::config::{ConstellationConfig, GridConfig, Scene};
use crate::physics::proximity;
use crate::pointer::PointerState;
use crate::spatial::SpatialGrid;
use crate::store::{EntityStore, StoreKind};
use crate::viewport::Viewport;
use crate::waves::WaveField;

/// Number of distinct alpha levels glowing edges and links are batched into.
pub const ALPHA_LEVELS: usize = 16;

/// How a fill is composited onto what is already drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Standard source-over alpha blending.
    #[default]
    Normal,
    /// Additive: colors add up and overlaps brighten.
    Lighter,
}

/// A straight line between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Vec2,
    pub to: Vec2,
}

impl Segment {
    #[inline]
    pub fn new(from: Vec2, to: Vec2) -> Self {
        Self { from, to }
    }
}

/// A 2D render target.
pub trait Canvas2d {
    /// Match the backing store to a new viewport.
    fn configure(&mut self, viewport: &Viewport);

    /// Scale applied to every CSS-pixel coordinate that follows.
    fn set_transform(&mut self, scale: f32);

    /// Erase everything within `size` (CSS pixels) to transparent.
    fn clear(&mut self, size: Vec2);

    /// Stroke every segment with one color and width.
    fn stroke_lines(&mut self, segments: &[Segment], color: Rgba, width: f32);

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba);

    /// Radial gradient from `inner` at the center to `outer` at
    /// `gradient_radius`, filled only within `clip_radius`.
    fn fill_glow(&mut self, center: Vec2, clip_radius: f32, gradient_radius: f32, inner: Rgba, outer: Rgba);

    /// Fill the area under the polyline `top` down to the horizontal line
    /// `y = bottom`.
    fn fill_band(&mut self, top: &[Vec2], bottom: f32, color: Rgba);

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Rgba, blend: BlendMode);
}

impl<C: Canvas2d + ?Sized> Canvas2d for Box<C> {
    fn configure(&mut self, viewport: &Viewport) {
        (**self).configure(viewport)
    }
    fn set_transform(&mut self, scale: f32) {
        (**self).set_transform(scale)
    }
    fn clear(&mut self, size: Vec2) {
        (**self).clear(size)
    }
    fn stroke_lines(&mut self, segments: &[Segment], color: Rgba, width: f32) {
        (**self).stroke_lines(segments, color, width)
    }
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        (**self).fill_circle(center, radius, color)
    }
    fn fill_glow(&mut self, center: Vec2, clip_radius: f32, gradient_radius: f32, inner: Rgba, outer: Rgba) {
        (**self).fill_glow(center, clip_radius, gradient_radius, inner, outer)
    }
    fn fill_band(&mut self, top: &[Vec2], bottom: f32, color: Rgba) {
        (**self).fill_band(top, bottom, color)
    }
    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Rgba, blend: BlendMode) {
        (**self).fill_rect(origin, size, color, blend)
    }
}

/// Map `value` in `0.0..=1.0` to a batch index.
#[inline]
fn level(value: f32) -> usize {
    ((value.clamp(0.0, 1.0) * ALPHA_LEVELS as f32).ceil() as usize).clamp(1, ALPHA_LEVELS) - 1
}

/// Representative value for a batch index.
#[inline]
fn level_value(level: usize) -> f32 {
    (level + 1) as f32 / ALPHA_LEVELS as f32
}

/// Link pairs reused between recomputations.
#[derive(Debug, Default)]
struct LinkCache {
    pairs: Vec<(u32, u32)>,
    store_generation: u64,
    frames_since: u32,
    valid: bool,
}

/// Draws scenes; owns scratch buffers reused from frame to frame.
#[derive(Debug, Default)]
pub struct Renderer {
    base_edges: Vec<Segment>,
    glow_edges: Vec<Vec<Segment>>,
    glow: Vec<f32>,
    positions: Vec<Vec2>,
    spatial: SpatialGrid,
    links: LinkCache,
    link_batches: Vec<Vec<Segment>>,
    wave_points: Vec<Vec2>,
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            glow_edges: vec![Vec::new(); ALPHA_LEVELS],
            link_batches: vec![Vec::new(); ALPHA_LEVELS],
            ..Self::default()
        }
    }

    /// Forget cached links so the next constellation frame recomputes them.
    pub fn invalidate(&mut self) {
        self.links.valid = false;
    }

    /// Number of links drawn from the current cache.
    pub fn cached_link_count(&self) -> usize {
        self.links.pairs.len()
    }

    /// Clear the canvas and draw one complete frame: the optional wave layer
    /// first, then the scene.
    pub fn draw_frame<C: Canvas2d + ?Sized>(
        &mut self,
        canvas: &mut C,
        store: &EntityStore,
        pointer: PointerState,
        scene: &Scene,
        waves: Option<&WaveField>,
        viewport: &Viewport,
    ) {
        canvas.clear(viewport.css_size);
        if let Some(waves) = waves {
            self.draw_waves(canvas, waves, viewport.css_size);
        }
        match scene {
            Scene::Grid(config) => self.draw_grid(canvas, store, pointer, config),
            Scene::Constellation(config) => self.draw_constellation(canvas, store, config),
        }
    }

    /// Mesh edges with pointer glow, then the points on top.
    ///
    /// Every edge is stroked exactly once. Edges are batched by the glow level
    /// of their source point so a frame costs at most `ALPHA_LEVELS + 1`
    /// stroke calls.
    pub fn draw_grid<C: Canvas2d + ?Sized>(
        &mut self,
        canvas: &mut C,
        store: &EntityStore,
        pointer: PointerState,
        config: &GridConfig,
    ) {
        let entities = store.entities();
        if entities.is_empty() {
            return;
        }

        let spacing = match store.kind() {
            StoreKind::Grid { spacing, .. } => spacing,
            _ => config.effective_spacing(),
        };
        let width = (spacing / 320.0).max(0.5);

        self.glow.clear();
        self.glow.extend(entities.iter().map(|p| {
            if pointer.active {
                proximity(p.position.distance(pointer.position), config.glow_radius)
            } else {
                0.0
            }
        }));

        self.base_edges.clear();
        self.glow_edges.resize_with(ALPHA_LEVELS, Vec::new);
        for batch in &mut self.glow_edges {
            batch.clear();
        }

        for (a, b) in store.edges() {
            let Some(to) = entities.get(b as usize) else {
                continue;
            };
            let from = &entities[a as usize];
            let segment = Segment::new(from.position, to.position);
            let glow = self.glow[a as usize];
            if glow > 0.0 {
                self.glow_edges[level(glow)].push(segment);
            } else {
                self.base_edges.push(segment);
            }
        }

        if !self.base_edges.is_empty() {
            canvas.stroke_lines(&self.base_edges, config.line_color, width);
        }
        for (lvl, batch) in self.glow_edges.iter().enumerate() {
            if batch.is_empty() {
                continue;
            }
            let alpha = config.line_color.a + config.hover_line_color.a * level_value(lvl);
            canvas.stroke_lines(batch, config.hover_line_color.with_alpha(alpha), width);
        }

        for p in entities {
            canvas.fill_circle(p.position, p.size, config.point_color);
        }
    }

    /// Distance-faded links between nearby particles, then the particles as
    /// soft glows.
    pub fn draw_constellation<C: Canvas2d + ?Sized>(
        &mut self,
        canvas: &mut C,
        store: &EntityStore,
        config: &ConstellationConfig,
    ) {
        let entities = store.entities();

        self.positions.clear();
        self.positions.extend(entities.iter().map(|p| p.position));

        let stale = !self.links.valid
            || self.links.store_generation != store.generation()
            || self.links.frames_since + 1 >= config.link_every.max(1);
        if stale {
            self.recompute_links(config.link_distance);
            self.links.store_generation = store.generation();
            self.links.frames_since = 0;
            self.links.valid = true;
        } else {
            self.links.frames_since += 1;
        }

        self.link_batches.resize_with(ALPHA_LEVELS, Vec::new);
        for batch in &mut self.link_batches {
            batch.clear();
        }
        for &(a, b) in &self.links.pairs {
            let (Some(&pa), Some(&pb)) = (self.positions.get(a as usize), self.positions.get(b as usize)) else {
                continue;
            };
            let fade = proximity(pa.distance(pb), config.link_distance);
            if fade > 0.0 {
                self.link_batches[level(fade)].push(Segment::new(pa, pb));
            }
        }
        for (lvl, batch) in self.link_batches.iter().enumerate() {
            if !batch.is_empty() {
                let alpha = config.link_alpha * level_value(lvl);
                canvas.stroke_lines(batch, config.link_color.with_alpha(alpha), config.link_width);
            }
        }

        for p in entities {
            let inner = config.particle_color.with_alpha(p.alpha.min(0.9));
            canvas.fill_glow(
                p.position,
                (p.size * 1.2).max(1.2),
                (p.size * config.glow_scale).max(6.0),
                inner,
                Rgba::TRANSPARENT,
            );
        }
    }

    fn recompute_links(&mut self, link_distance: f32) {
        let pairs = &mut self.links.pairs;
        pairs.clear();
        self.spatial.rebuild(&self.positions, link_distance);
        self.spatial
            .for_each_pair_within(&self.positions, link_distance, |a, b, _| pairs.push((a, b)));
        tracing::trace!(links = pairs.len(), "recomputed constellation links");
    }

    /// Ambient glow, the wave bands, then an additive tint over everything.
    pub fn draw_waves<C: Canvas2d + ?Sized>(&mut self, canvas: &mut C, waves: &WaveField, size: Vec2) {
        let reach = size.max_element();
        canvas.fill_glow(
            Vec2::new(size.x * 0.2, size.y * 0.1),
            reach * 1.5,
            reach,
            Rgba::from_rgb8(70, 50, 120, 0.07),
            Rgba::TRANSPARENT,
        );

        let color = waves.config().color;
        for layer in 0..waves.layer_count() {
            waves.sample_layer(layer, size, &mut self.wave_points);
            canvas.fill_band(&self.wave_points, size.y, color.with_alpha(waves.layer_alpha(layer)));
        }

        let tint = waves.config().tint_alpha;
        if tint > 0.0 {
            canvas.fill_rect(Vec2::ZERO, size, color.with_alpha(tint), BlendMode::Lighter);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ResolutionConfig, WaveConfig};
    use crate::viewport::WindowMetrics;
    use glam::Vec2;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::collections::BTreeSet;

    fn viewport() -> Viewport {
        Viewport::compute(WindowMetrics::new(800.0, 600.0, 1.0), &ResolutionConfig::default())
    }

    fn grid_store(config: &GridConfig) -> EntityStore {
        let mut store = EntityStore::new();
        store.rebuild_grid(Vec2::new(800.0, 600.0), config);
        store
    }

    #[test]
    fn test_level_buckets() {
        assert_eq!(level(0.01), 0);
        assert_eq!(level(1.0), ALPHA_LEVELS - 1);
        assert_eq!(level(0.5), ALPHA_LEVELS / 2 - 1);
        assert_eq!(level_value(ALPHA_LEVELS - 1), 1.0);
    }

    #[test]
    fn test_grid_strokes_every_edge_once() {
        let config = GridConfig::default();
        let store = grid_store(&config);
        let mut canvas = DrawList::new();
        let mut renderer = Renderer::new();

        let pointer = PointerState {
            position: Vec2::new(400.0, 300.0),
            active: true,
        };
        renderer.draw_grid(&mut canvas, &store, pointer, &config);

        assert_eq!(canvas.segment_count(), store.edge_count());
        assert_eq!(canvas.circle_count(), store.len());
    }

    #[test]
    fn test_grid_without_pointer_uses_base_color() {
        let config = GridConfig::default();
        let store = grid_store(&config);
        let mut canvas = DrawList::new();
        Renderer::new().draw_grid(&mut canvas, &store, PointerState::INACTIVE, &config);

        let strokes: Vec<_> = canvas
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::StrokeLines { color, width, .. } => Some((*color, *width)),
                _ => None,
            })
            .collect();
        assert_eq!(strokes, vec![(config.line_color, 0.5)]);
    }

    #[test]
    fn test_glowing_edges_brighter_than_base() {
        let config = GridConfig::default();
        let store = grid_store(&config);
        let mut canvas = DrawList::new();
        let pointer = PointerState {
            position: Vec2::new(80.0, 80.0),
            active: true,
        };
        Renderer::new().draw_grid(&mut canvas, &store, pointer, &config);

        let max_alpha = canvas
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::StrokeLines { color, .. } => Some(color.a),
                _ => None,
            })
            .fold(0.0f32, f32::max);
        assert!((max_alpha - (config.line_color.a + config.hover_line_color.a)).abs() < 1e-5);
    }

    #[test]
    fn test_constellation_links_match_brute_force() {
        let config = ConstellationConfig::default();
        let mut store = EntityStore::new();
        store.rebuild_constellation(Vec2::new(800.0, 600.0), &config, &mut SmallRng::seed_from_u64(5));

        let mut renderer = Renderer::new();
        let mut canvas = DrawList::new();
        renderer.draw_constellation(&mut canvas, &store, &config);

        let entities = store.entities();
        let mut expected = BTreeSet::new();
        for i in 0..entities.len() {
            for j in i + 1..entities.len() {
                if entities[i].position.distance(entities[j].position) < config.link_distance {
                    expected.insert((i, j));
                }
            }
        }
        assert_eq!(renderer.cached_link_count(), expected.len());
        assert_eq!(canvas.segment_count(), expected.len());
        assert_eq!(canvas.glow_count(), entities.len());
    }

    #[test]
    fn test_link_frame_skip_reuses_pairs() {
        let config = ConstellationConfig {
            link_every: 3,
            ..ConstellationConfig::default()
        };
        let mut store = EntityStore::new();
        store.rebuild_constellation(Vec2::new(800.0, 600.0), &config, &mut SmallRng::seed_from_u64(9));

        let mut renderer = Renderer::new();
        let mut canvas = DrawList::new();
        renderer.draw_constellation(&mut canvas, &store, &config);
        let first = renderer.cached_link_count();

        // Push every particle far apart; cached pairs fade out instead of being recomputed.
        for (i, p) in store.entities_mut().iter_mut().enumerate() {
            p.position = Vec2::new(i as f32 * 500.0, 0.0);
        }
        canvas.reset();
        renderer.draw_constellation(&mut canvas, &store, &config);
        assert_eq!(renderer.cached_link_count(), first);
        assert_eq!(canvas.segment_count(), 0);

        canvas.reset();
        renderer.draw_constellation(&mut canvas, &store, &config);
        renderer.draw_constellation(&mut canvas, &store, &config);
        assert_eq!(renderer.cached_link_count(), 0);
    }

    #[test]
    fn test_frame_clears_once_then_layers_waves_under_scene() {
        let scene = Scene::Constellation(ConstellationConfig::default());
        let Scene::Constellation(config) = &scene else {
            unreachable!()
        };
        let mut store = EntityStore::new();
        store.rebuild_constellation(Vec2::new(800.0, 600.0), config, &mut SmallRng::seed_from_u64(1));
        let waves = WaveField::new(WaveConfig::default());

        let mut canvas = DrawList::new();
        Renderer::new().draw_frame(
            &mut canvas,
            &store,
            PointerState::INACTIVE,
            &scene,
            Some(&waves),
            &viewport(),
        );

        assert_eq!(canvas.clear_count(), 1);
        assert!(matches!(canvas.commands()[0], DrawCommand::Clear { .. }));
        let last_band = canvas
            .commands()
            .iter()
            .rposition(|c| matches!(c, DrawCommand::FillBand { .. }))
            .unwrap();
        let first_particle = canvas
            .commands()
            .iter()
            .position(|c| matches!(c, DrawCommand::FillGlow { clip_radius, .. } if *clip_radius < 10.0))
            .unwrap();
        assert!(last_band < first_particle);
    }

    #[test]
    fn test_waves_draw_bands_and_tint() {
        let waves = WaveField::new(WaveConfig::default());
        let mut canvas = DrawList::new();
        Renderer::new().draw_waves(&mut canvas, &waves, Vec2::new(800.0, 600.0));

        let bands = canvas
            .commands()
            .iter()
            .filter(|c| matches!(c, DrawCommand::FillBand { .. }))
            .count();
        assert_eq!(bands, 4);
        assert!(matches!(
            canvas.commands().last(),
            Some(DrawCommand::FillRect {
                blend: BlendMode::Lighter,
                ..
            })
        ));
    }
}
