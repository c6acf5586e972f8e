use crate::draw::model::{Color, DrawingState, SketchTool, StrokeStyle, HIGHLIGHT_ALPHA};
use crate::draw::overlay::{AttachOutcome, SurfaceLifecycle};
use crate::draw::raster::{
    draw_arrow, draw_brush, draw_circle_outline, draw_rect_outline, draw_segment, BlendMode,
};
use crate::draw::surface::RasterSurface;
use anyhow::Result;

// Pointer moves closer than this to the previous point are dropped to keep
// freehand paths from collecting redundant points.
const MIN_POINT_DIST_SQ: i64 = 9;

#[derive(Debug, Clone, Copy)]
struct ActiveStroke {
    tool: SketchTool,
    style: StrokeStyle,
    start: (i32, i32),
    last: (i32, i32),
}

/// The drawing engine: owns the surface lifecycle, the single drawing-state
/// instance and the live stroke. Strokes run `pointer_down -> pointer_move* ->
/// pointer_up`; shape tools preview against a pixel snapshot taken at stroke
/// start so moving the pointer never accumulates phantom shapes.
#[derive(Debug, Default)]
pub struct SketchEngine {
    state: DrawingState,
    lifecycle: SurfaceLifecycle,
    active: Option<ActiveStroke>,
    preview_data_url: Option<String>,
}

impl SketchEngine {
    pub fn state(&self) -> &DrawingState {
        &self.state
    }

    /// Tool and style changes land on the next stroke; a live stroke keeps
    /// the style it captured on pointer-down.
    pub fn set_tool(&mut self, tool: SketchTool) {
        self.state.set_tool(tool);
    }

    pub fn set_color(&mut self, color: Color) {
        self.state.set_color(color);
    }

    pub fn set_width(&mut self, width: u32) {
        self.state.set_width(width);
    }

    pub fn attach(&mut self, width: u32, height: u32) -> AttachOutcome {
        let outcome = self.lifecycle.attach(width, height);
        self.state.active = true;
        self.state.surface_attached = self.lifecycle.is_attached();
        outcome
    }

    /// Idempotent; cancels any stroke in flight before the surface goes away.
    pub fn detach(&mut self) {
        self.cancel_stroke();
        self.lifecycle.detach();
        self.state.active = false;
        self.state.surface_attached = false;
    }

    pub fn is_attached(&self) -> bool {
        self.lifecycle.is_attached()
    }

    pub fn lifecycle(&self) -> &SurfaceLifecycle {
        &self.lifecycle
    }

    pub fn lifecycle_mut(&mut self) -> &mut SurfaceLifecycle {
        &mut self.lifecycle
    }

    pub fn stroke_in_progress(&self) -> bool {
        self.active.is_some()
    }

    /// Data URL of the raster as of the last completed stroke.
    pub fn preview_data_url(&self) -> Option<&str> {
        self.preview_data_url.as_deref()
    }

    pub fn take_preview_data_url(&mut self) -> Option<String> {
        self.preview_data_url.take()
    }

    pub fn pointer_down(&mut self, x: i32, y: i32) {
        if self.active.is_some() {
            return;
        }
        let tool = self.state.tool;
        let style = effective_style(tool, self.state.stroke);
        let Some(surface) = self.accepting_surface() else {
            return;
        };

        if tool.is_shape() {
            surface.snapshot();
        } else {
            let (w, h) = surface.size();
            draw_brush((x, y), style.color, style.width, blend_for(tool), surface.pixels_mut(), w, h);
        }
        self.active = Some(ActiveStroke { tool, style, start: (x, y), last: (x, y) });
    }

    pub fn pointer_move(&mut self, x: i32, y: i32) {
        let Some(mut stroke) = self.active else {
            return;
        };
        let Some(surface) = self.lifecycle.surface_mut().map(|s| s.raster_mut()) else {
            return;
        };

        if stroke.tool.is_shape() {
            surface.restore();
            draw_shape(surface, stroke.tool, stroke.style, stroke.start, (x, y));
            stroke.last = (x, y);
        } else {
            let dx = (x - stroke.last.0) as i64;
            let dy = (y - stroke.last.1) as i64;
            if dx * dx + dy * dy < MIN_POINT_DIST_SQ {
                return;
            }
            let (w, h) = surface.size();
            draw_segment(
                stroke.last,
                (x, y),
                stroke.style.color,
                stroke.style.width,
                blend_for(stroke.tool),
                surface.pixels_mut(),
                w,
                h,
            );
            stroke.last = (x, y);
        }
        self.active = Some(stroke);
    }

    /// Finish the stroke: shape tools restore the snapshot one last time and
    /// commit the final geometry, then the raster is serialized as the live
    /// preview.
    pub fn pointer_up(&mut self, x: i32, y: i32) -> Result<Option<String>> {
        let Some(stroke) = self.active.take() else {
            return Ok(None);
        };
        let Some(surface) = self.lifecycle.surface_mut().map(|s| s.raster_mut()) else {
            return Ok(None);
        };

        if stroke.tool.is_shape() {
            surface.restore();
            draw_shape(surface, stroke.tool, stroke.style, stroke.start, (x, y));
            surface.discard_snapshot();
        } else {
            let (w, h) = surface.size();
            draw_segment(
                stroke.last,
                (x, y),
                stroke.style.color,
                stroke.style.width,
                blend_for(stroke.tool),
                surface.pixels_mut(),
                w,
                h,
            );
        }

        let data_url = surface.to_data_url()?;
        self.preview_data_url = Some(data_url.clone());
        Ok(Some(data_url))
    }

    /// Abort the stroke in flight, rolling back any shape preview ink.
    pub fn cancel_stroke(&mut self) {
        if let Some(stroke) = self.active.take() {
            if let Some(surface) = self.lifecycle.surface_mut().map(|s| s.raster_mut()) {
                if stroke.tool.is_shape() {
                    surface.restore();
                    surface.discard_snapshot();
                }
            }
        }
    }

    fn accepting_surface(&mut self) -> Option<&mut RasterSurface> {
        let surface = self.lifecycle.surface_mut()?;
        if !surface.accepts_pointer() {
            return None;
        }
        Some(surface.raster_mut())
    }
}

fn blend_for(tool: SketchTool) -> BlendMode {
    match tool {
        SketchTool::Highlight => BlendMode::Multiply,
        _ => BlendMode::Opaque,
    }
}

fn effective_style(tool: SketchTool, mut style: StrokeStyle) -> StrokeStyle {
    if tool == SketchTool::Highlight {
        style.color.a = HIGHLIGHT_ALPHA;
    }
    style
}

fn draw_shape(
    surface: &mut RasterSurface,
    tool: SketchTool,
    style: StrokeStyle,
    start: (i32, i32),
    end: (i32, i32),
) {
    let (w, h) = surface.size();
    let pixels = surface.pixels_mut();
    match tool {
        SketchTool::Circle => {
            let dx = (end.0 - start.0) as f32;
            let dy = (end.1 - start.1) as f32;
            let radius = (dx * dx + dy * dy).sqrt();
            draw_circle_outline(start, radius, style.color, style.width, BlendMode::Opaque, pixels, w, h);
        }
        SketchTool::Rectangle => {
            draw_rect_outline(start, end, style.color, style.width, BlendMode::Opaque, pixels, w, h);
        }
        SketchTool::Arrow => {
            draw_arrow(start, end, style.color, style.width, BlendMode::Opaque, pixels, w, h);
        }
        SketchTool::Pencil | SketchTool::Highlight => {}
    }
}
