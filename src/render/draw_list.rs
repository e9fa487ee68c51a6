use glam::Vec2;

use super::{BlendMode, Canvas2d, Segment};
use crate::color::Rgba;
use crate::viewport::Viewport;

/// One recorded canvas call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Configure { viewport: Viewport },
    SetTransform { scale: f32 },
    Clear { size: Vec2 },
    StrokeLines { segments: Vec<Segment>, color: Rgba, width: f32 },
    FillCircle { center: Vec2, radius: f32, color: Rgba },
    FillGlow { center: Vec2, clip_radius: f32, gradient_radius: f32, inner: Rgba, outer: Rgba },
    FillBand { top: Vec<Vec2>, bottom: f32, color: Rgba },
    FillRect { origin: Vec2, size: Vec2, color: Rgba, blend: BlendMode },
}

/// Canvas that records every call instead of drawing.
#[derive(Debug, Default, Clone)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Drop everything recorded so far.
    pub fn reset(&mut self) {
        self.commands.clear();
    }

    /// Total stroked segments across all batches.
    pub fn segment_count(&self) -> usize {
        self.commands
            .iter()
            .map(|c| match c {
                DrawCommand::StrokeLines { segments, .. } => segments.len(),
                _ => 0,
            })
            .sum()
    }

    pub fn circle_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::FillCircle { .. }))
            .count()
    }

    pub fn glow_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::FillGlow { .. }))
            .count()
    }

    /// Number of frames drawn, counted by clears.
    pub fn clear_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Clear { .. }))
            .count()
    }
}

impl Canvas2d for DrawList {
    fn configure(&mut self, viewport: &Viewport) {
        self.commands.push(DrawCommand::Configure { viewport: *viewport });
    }

    fn set_transform(&mut self, scale: f32) {
        self.commands.push(DrawCommand::SetTransform { scale });
    }

    fn clear(&mut self, size: Vec2) {
        self.commands.push(DrawCommand::Clear { size });
    }

    fn stroke_lines(&mut self, segments: &[Segment], color: Rgba, width: f32) {
        self.commands.push(DrawCommand::StrokeLines {
            segments: segments.to_vec(),
            color,
            width,
        });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        self.commands.push(DrawCommand::FillCircle { center, radius, color });
    }

    fn fill_glow(&mut self, center: Vec2, clip_radius: f32, gradient_radius: f32, inner: Rgba, outer: Rgba) {
        self.commands.push(DrawCommand::FillGlow {
            center,
            clip_radius,
            gradient_radius,
            inner,
            outer,
        });
    }

    fn fill_band(&mut self, top: &[Vec2], bottom: f32, color: Rgba) {
        self.commands.push(DrawCommand::FillBand {
            top: top.to_vec(),
            bottom,
            color,
        });
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Rgba, blend: BlendMode) {
        self.commands.push(DrawCommand::FillRect {
            origin,
            size,
            color,
            blend,
        });
    }
}
