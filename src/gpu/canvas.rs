//! CPU-side tessellation for the wgpu backend.
//!
//! Every primitive becomes colored triangles in CSS-pixel space. Consecutive
//! primitives with the same blend mode share a batch so a frame is usually
//! two or three draw calls.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::color::Rgba;
use crate::render::{BlendMode, Canvas2d, Segment};
use crate::viewport::Viewport;

pub const SHADER_SOURCE: &str = include_str!("canvas.wgsl");

/// Circles get four segments per device pixel of radius, within these bounds.
const MIN_ARC_SEGMENTS: usize = 10;
const MAX_ARC_SEGMENTS: usize = 64;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    #[inline]
    fn new(position: Vec2, color: Rgba) -> Self {
        Self {
            position: position.to_array(),
            color: color.to_array(),
        }
    }

    pub const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// A run of vertices drawn with one pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch {
    pub blend: BlendMode,
    pub start: u32,
    pub end: u32,
}

/// Canvas that records triangles for [`super::GpuState::present`].
#[derive(Debug, Clone)]
pub struct GpuCanvas {
    vertices: Vec<Vertex>,
    batches: Vec<Batch>,
    css_size: Vec2,
    scale: f32,
}

impl Default for GpuCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuCanvas {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            batches: Vec::new(),
            css_size: Vec2::ONE,
            scale: 1.0,
        }
    }

    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    #[inline]
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Size of the coordinate space mapped onto the surface.
    #[inline]
    pub fn css_size(&self) -> Vec2 {
        self.css_size
    }

    fn push_triangle(&mut self, blend: BlendMode, a: Vertex, b: Vertex, c: Vertex) {
        let start = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&[a, b, c]);
        let end = self.vertices.len() as u32;
        match self.batches.last_mut() {
            Some(batch) if batch.blend == blend && batch.end == start => batch.end = end,
            _ => self.batches.push(Batch { blend, start, end }),
        }
    }

    fn push_quad(&mut self, blend: BlendMode, corners: [Vec2; 4], color: Rgba) {
        let [a, b, c, d] = corners.map(|p| Vertex::new(p, color));
        self.push_triangle(blend, a, b, c);
        self.push_triangle(blend, a, c, d);
    }

    fn arc_segments(&self, radius: f32) -> usize {
        let device = (radius * self.scale).max(0.0);
        ((device * 4.0).ceil() as usize).clamp(MIN_ARC_SEGMENTS, MAX_ARC_SEGMENTS)
    }

    /// Annulus between `r0` and `r1` with colors interpolated radially.
    fn push_ring(&mut self, center: Vec2, r0: f32, r1: f32, c0: Rgba, c1: Rgba) {
        let segments = self.arc_segments(r1);
        let step = std::f32::consts::TAU / segments as f32;
        for i in 0..segments {
            let d0 = Vec2::from_angle(step * i as f32);
            let d1 = Vec2::from_angle(step * (i + 1) as f32);
            let outer0 = Vertex::new(center + d0 * r1, c1);
            let outer1 = Vertex::new(center + d1 * r1, c1);
            if r0 <= 0.0 {
                self.push_triangle(BlendMode::Normal, Vertex::new(center, c0), outer0, outer1);
            } else {
                let inner0 = Vertex::new(center + d0 * r0, c0);
                let inner1 = Vertex::new(center + d1 * r0, c0);
                self.push_triangle(BlendMode::Normal, inner0, outer0, outer1);
                self.push_triangle(BlendMode::Normal, inner0, outer1, inner1);
            }
        }
    }
}

impl Canvas2d for GpuCanvas {
    fn configure(&mut self, viewport: &Viewport) {
        self.css_size = viewport.css_size;
        self.scale = viewport.transform_scale();
        self.vertices.clear();
        self.batches.clear();
    }

    fn set_transform(&mut self, scale: f32) {
        self.scale = scale;
    }

    fn clear(&mut self, _size: Vec2) {
        self.vertices.clear();
        self.batches.clear();
    }

    fn stroke_lines(&mut self, segments: &[Segment], color: Rgba, width: f32) {
        // Lines thinner than a device pixel are widened and faded instead.
        let min_width = 1.0 / self.scale.max(1e-3);
        let (width, color) = if width < min_width {
            (min_width, color.scale_alpha(width / min_width))
        } else {
            (width, color)
        };
        let half = width * 0.5;
        for segment in segments {
            let dir = (segment.to - segment.from).normalize_or_zero();
            if dir == Vec2::ZERO {
                continue;
            }
            let normal = dir.perp() * half;
            self.push_quad(
                BlendMode::Normal,
                [
                    segment.from + normal,
                    segment.to + normal,
                    segment.to - normal,
                    segment.from - normal,
                ],
                color,
            );
        }
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        if radius <= 0.0 {
            return;
        }
        self.push_ring(center, 0.0, radius, color, color);
    }

    fn fill_glow(&mut self, center: Vec2, clip_radius: f32, gradient_radius: f32, inner: Rgba, outer: Rgba) {
        if clip_radius <= 0.0 {
            return;
        }
        let reach = gradient_radius.max(1e-3);
        let edge = clip_radius.min(reach);
        self.push_ring(center, 0.0, edge, inner, inner.lerp(outer, edge / reach));
        if clip_radius > reach {
            self.push_ring(center, reach, clip_radius, outer, outer);
        }
    }

    fn fill_band(&mut self, top: &[Vec2], bottom: f32, color: Rgba) {
        for pair in top.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if b.x <= a.x {
                continue;
            }
            self.push_quad(
                BlendMode::Normal,
                [a, b, Vec2::new(b.x, bottom), Vec2::new(a.x, bottom)],
                color,
            );
        }
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Rgba, blend: BlendMode) {
        if size.x <= 0.0 || size.y <= 0.0 {
            return;
        }
        let max = origin + size;
        self.push_quad(
            blend,
            [origin, Vec2::new(max.x, origin.y), max, Vec2::new(origin.x, max.y)],
            color,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batches_merge_until_blend_changes() {
        let mut canvas = GpuCanvas::new();
        let white = Rgba::WHITE;
        canvas.fill_rect(Vec2::ZERO, Vec2::splat(10.0), white, BlendMode::Normal);
        canvas.fill_circle(Vec2::splat(5.0), 2.0, white);
        canvas.fill_rect(Vec2::ZERO, Vec2::splat(10.0), white, BlendMode::Lighter);
        canvas.fill_rect(Vec2::ZERO, Vec2::splat(10.0), white, BlendMode::Normal);

        let blends: Vec<BlendMode> = canvas.batches().iter().map(|b| b.blend).collect();
        assert_eq!(blends, vec![BlendMode::Normal, BlendMode::Lighter, BlendMode::Normal]);
        let last = canvas.batches().last().unwrap();
        assert_eq!(last.end as usize, canvas.vertices().len());
    }

    #[test]
    fn test_clear_drops_geometry() {
        let mut canvas = GpuCanvas::new();
        canvas.stroke_lines(&[Segment::new(Vec2::ZERO, Vec2::new(10.0, 0.0))], Rgba::WHITE, 2.0);
        assert_eq!(canvas.vertices().len(), 6);
        canvas.clear(Vec2::splat(100.0));
        assert!(canvas.vertices().is_empty());
        assert!(canvas.batches().is_empty());
    }

    #[test]
    fn test_hairline_widened_and_faded() {
        let mut canvas = GpuCanvas::new();
        canvas.set_transform(1.0);
        canvas.stroke_lines(&[Segment::new(Vec2::ZERO, Vec2::new(10.0, 0.0))], Rgba::WHITE, 0.5);
        let v = canvas.vertices();
        assert_eq!(v[0].position[1] - v[5].position[1], 1.0);
        assert_eq!(v[0].color[3], 0.5);
    }

    #[test]
    fn test_degenerate_segments_skipped() {
        let mut canvas = GpuCanvas::new();
        canvas.stroke_lines(&[Segment::new(Vec2::ONE, Vec2::ONE)], Rgba::WHITE, 1.0);
        assert!(canvas.vertices().is_empty());
    }

    #[test]
    fn test_glow_rim_color_at_clip() {
        let mut canvas = GpuCanvas::new();
        let inner = Rgba::new(1.0, 1.0, 1.0, 1.0);
        let outer = Rgba::TRANSPARENT;
        canvas.fill_glow(Vec2::ZERO, 5.0, 10.0, inner, outer);
        let first = canvas.vertices()[0];
        let rim = canvas.vertices()[1];
        assert_eq!(first.color, inner.to_array());
        assert!((rim.color[3] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_configure_takes_viewport() {
        use crate::config::ResolutionConfig;
        use crate::viewport::WindowMetrics;

        let viewport = Viewport::compute(WindowMetrics::new(800.0, 600.0, 2.0), &ResolutionConfig::default());
        let mut canvas = GpuCanvas::new();
        canvas.configure(&viewport);
        assert_eq!(canvas.css_size(), Vec2::new(800.0, 600.0));
    }
}
