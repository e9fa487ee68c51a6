use std::path::Path;

use glam::Vec2;
use image::{Rgba as Pixel, RgbaImage};

use super::{BlendMode, Canvas2d, Segment};
use crate::color::Rgba;
use crate::viewport::Viewport;

/// Software rasterizer over an RGBA8 image.
///
/// Shapes are anti-aliased with a one-pixel coverage ramp. Quality is aimed at
/// previews and snapshots, not at matching a browser pixel for pixel.
#[derive(Debug, Clone)]
pub struct PixelCanvas {
    image: RgbaImage,
    scale: f32,
}

impl PixelCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width.max(1), height.max(1)),
            scale: 1.0,
        }
    }

    #[inline]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Straight-alpha color of one backing pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        (x < self.image.width() && y < self.image.height()).then(|| {
            let [r, g, b, a] = self.image.get_pixel(x, y).0;
            Rgba::from_rgb8(r, g, b, a as f32 / 255.0)
        })
    }

    /// Composite the canvas over an opaque background.
    pub fn flatten(&self, background: Rgba) -> RgbaImage {
        let mut out = self.image.clone();
        for px in out.pixels_mut() {
            let [r, g, b, a] = px.0;
            let a = a as f32 / 255.0;
            let mix = |c: u8, bg: f32| ((c as f32 / 255.0 * a + bg * (1.0 - a)) * 255.0).round() as u8;
            *px = Pixel([mix(r, background.r), mix(g, background.g), mix(b, background.b), 255]);
        }
        out
    }

    pub fn save_png(&self, path: impl AsRef<Path>, background: Option<Rgba>) -> Result<(), image::ImageError> {
        match background {
            Some(bg) => self.flatten(bg).save(path),
            None => self.image.save(path),
        }
    }

    /// Device-space bounding box clipped to the image, as inclusive pixel ranges.
    fn bounds(&self, min: Vec2, max: Vec2) -> Option<(u32, u32, u32, u32)> {
        let w = self.image.width() as f32;
        let h = self.image.height() as f32;
        let x0 = min.x.floor().max(0.0);
        let y0 = min.y.floor().max(0.0);
        let x1 = max.x.ceil().min(w - 1.0);
        let y1 = max.y.ceil().min(h - 1.0);
        (x0 <= x1 && y0 <= y1).then_some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }

    fn blend(&mut self, x: u32, y: u32, color: Rgba, coverage: f32, mode: BlendMode) {
        let sa = color.a * coverage.clamp(0.0, 1.0);
        if sa <= 0.0 {
            return;
        }
        let px = self.image.get_pixel_mut(x, y);
        let [dr, dg, db, da] = px.0.map(|c| c as f32 / 255.0);

        // Destination weight in the premultiplied sum.
        let (out_a, dst_weight) = match mode {
            BlendMode::Normal => (sa + da * (1.0 - sa), da * (1.0 - sa)),
            BlendMode::Lighter => ((sa + da).min(1.0), da),
        };
        let mix = |s: f32, d: f32| (s * sa + d * dst_weight) / out_a.max(1e-6);
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        *px = Pixel([q(mix(color.r, dr)), q(mix(color.g, dg)), q(mix(color.b, db)), q(out_a)]);
    }
}

fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

impl Canvas2d for PixelCanvas {
    fn configure(&mut self, viewport: &Viewport) {
        let size = viewport.backing_size;
        if self.image.dimensions() != (size.x, size.y) {
            self.image = RgbaImage::new(size.x.max(1), size.y.max(1));
        }
        self.scale = viewport.transform_scale();
    }

    fn set_transform(&mut self, scale: f32) {
        self.scale = scale;
    }

    fn clear(&mut self, size: Vec2) {
        let Some((x0, y0, x1, y1)) = self.bounds(Vec2::ZERO, size * self.scale) else {
            return;
        };
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.image.put_pixel(x, y, Pixel([0, 0, 0, 0]));
            }
        }
    }

    fn stroke_lines(&mut self, segments: &[Segment], color: Rgba, width: f32) {
        let device_width = width * self.scale;
        let half = device_width.max(1.0) * 0.5;
        // Hairlines are drawn one pixel wide at reduced opacity.
        let faint = device_width.min(1.0);

        for segment in segments {
            let a = segment.from * self.scale;
            let b = segment.to * self.scale;
            let Some((x0, y0, x1, y1)) = self.bounds(a.min(b) - half - 1.0, a.max(b) + half + 1.0) else {
                continue;
            };
            for y in y0..=y1 {
                for x in x0..=x1 {
                    let center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                    let coverage = (half + 0.5 - distance_to_segment(center, a, b)).clamp(0.0, 1.0);
                    if coverage > 0.0 {
                        self.blend(x, y, color, coverage * faint, BlendMode::Normal);
                    }
                }
            }
        }
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        let c = center * self.scale;
        let r = radius * self.scale;
        let Some((x0, y0, x1, y1)) = self.bounds(c - r - 1.0, c + r + 1.0) else {
            return;
        };
        for y in y0..=y1 {
            for x in x0..=x1 {
                let d = Vec2::new(x as f32 + 0.5, y as f32 + 0.5).distance(c);
                let coverage = (r + 0.5 - d).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend(x, y, color, coverage, BlendMode::Normal);
                }
            }
        }
    }

    fn fill_glow(&mut self, center: Vec2, clip_radius: f32, gradient_radius: f32, inner: Rgba, outer: Rgba) {
        let c = center * self.scale;
        let clip = clip_radius * self.scale;
        let reach = (gradient_radius * self.scale).max(1e-3);
        let Some((x0, y0, x1, y1)) = self.bounds(c - clip - 1.0, c + clip + 1.0) else {
            return;
        };
        for y in y0..=y1 {
            for x in x0..=x1 {
                let d = Vec2::new(x as f32 + 0.5, y as f32 + 0.5).distance(c);
                let coverage = (clip + 0.5 - d).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    let color = inner.lerp(outer, d / reach);
                    self.blend(x, y, color, coverage, BlendMode::Normal);
                }
            }
        }
    }

    fn fill_band(&mut self, top: &[Vec2], bottom: f32, color: Rgba) {
        let floor = bottom * self.scale;
        let height = self.image.height() as f32;
        for pair in top.windows(2) {
            let a = pair[0] * self.scale;
            let b = pair[1] * self.scale;
            if b.x <= a.x {
                continue;
            }
            let Some((x0, _, x1, _)) = self.bounds(Vec2::new(a.x, 0.0), Vec2::new(b.x - 1e-3, 0.0)) else {
                continue;
            };
            for x in x0..=x1 {
                let cx = x as f32 + 0.5;
                if cx < a.x || cx >= b.x {
                    continue;
                }
                let t = (cx - a.x) / (b.x - a.x);
                let edge = a.y + (b.y - a.y) * t;
                let start = edge.floor().max(0.0);
                let end = floor.min(height);
                let mut y = start;
                while y < end {
                    let coverage = (y + 1.0 - edge).clamp(0.0, 1.0);
                    self.blend(x, y as u32, color, coverage, BlendMode::Normal);
                    y += 1.0;
                }
            }
        }
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Rgba, blend: BlendMode) {
        let min = origin * self.scale;
        let max = (origin + size) * self.scale - 1e-3;
        let Some((x0, y0, x1, y1)) = self.bounds(min, max) else {
            return;
        };
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.blend(x, y, color, 1.0, blend);
            }
        }
    }
}
