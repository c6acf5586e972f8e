use crate::draw::model::{Color, SketchTool};
use crate::draw::toolbar::{
    handle_pointer, StripCommand, StripLayout, StripPointerEvent, StripPointerOutcome, StripRect,
};
use eframe::egui;

fn rect(r: StripRect) -> egui::Rect {
    egui::Rect::from_min_size(egui::pos2(r.x, r.y), egui::vec2(r.w, r.h))
}

fn color32(c: Color) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(c.r, c.g, c.b, c.a)
}

/// The drawing control strip. Layout and hit testing live in the headless
/// toolbar module; this view only paints and feeds pointer events through.
pub struct DrawStripView {
    pub origin: (f32, f32),
}

impl Default for DrawStripView {
    fn default() -> Self {
        Self { origin: (16.0, 16.0) }
    }
}

pub struct StripFrame {
    pub hovered: bool,
    pub command: Option<StripCommand>,
}

impl DrawStripView {
    pub fn ui(
        &mut self,
        ctx: &egui::Context,
        selected_tool: SketchTool,
        stroke_color: Color,
        stroke_width: u32,
        quick_colors: &[Color],
    ) -> StripFrame {
        let layout = StripLayout::at(self.origin, quick_colors);

        let (pointer, pressed) =
            ctx.input(|i| (i.pointer.latest_pos(), i.pointer.primary_pressed()));

        let hovered = pointer
            .map(|p| layout.panel.contains((p.x, p.y)))
            .unwrap_or(false);
        let command = match (pointer, pressed) {
            (Some(p), true) => match handle_pointer(&layout, StripPointerEvent::Down, (p.x, p.y)) {
                StripPointerOutcome::Consumed(command) => command,
                StripPointerOutcome::NotOverStrip => None,
            },
            _ => None,
        };

        self.paint(ctx, &layout, selected_tool, stroke_color, stroke_width);
        StripFrame { hovered, command }
    }

    fn paint(
        &self,
        ctx: &egui::Context,
        layout: &StripLayout,
        selected_tool: SketchTool,
        stroke_color: Color,
        stroke_width: u32,
    ) {
        let painter = ctx.layer_painter(egui::LayerId::new(
            egui::Order::Foreground,
            egui::Id::new("tag_overlay_draw_strip"),
        ));

        painter.rect_filled(
            rect(layout.panel),
            6.0,
            egui::Color32::from_rgba_unmultiplied(30, 34, 42, 235),
        );

        for (tool, r) in &layout.tool_rects {
            let selected = *tool == selected_tool;
            let fill = if selected {
                egui::Color32::from_rgb(0, 110, 200)
            } else {
                egui::Color32::from_rgb(55, 60, 70)
            };
            painter.rect_filled(rect(*r), 4.0, fill);
            let glyph = match tool {
                SketchTool::Pencil => "P",
                SketchTool::Highlight => "H",
                SketchTool::Circle => "○",
                SketchTool::Rectangle => "▭",
                SketchTool::Arrow => "➚",
            };
            painter.text(
                rect(*r).center(),
                egui::Align2::CENTER_CENTER,
                glyph,
                egui::FontId::proportional(14.0),
                egui::Color32::WHITE,
            );
        }

        for (color, r) in &layout.color_rects {
            painter.rect_filled(rect(*r), 3.0, color32(*color));
            if *color == stroke_color {
                painter.rect_stroke(rect(*r), 3.0, egui::Stroke::new(2.0, egui::Color32::WHITE));
            }
        }

        painter.rect_filled(rect(layout.width_down_rect), 3.0, egui::Color32::from_rgb(55, 60, 70));
        painter.text(
            rect(layout.width_down_rect).center(),
            egui::Align2::CENTER_CENTER,
            "−",
            egui::FontId::proportional(14.0),
            egui::Color32::WHITE,
        );
        painter.rect_filled(rect(layout.width_up_rect), 3.0, egui::Color32::from_rgb(55, 60, 70));
        painter.text(
            rect(layout.width_up_rect).center(),
            egui::Align2::CENTER_CENTER,
            "+",
            egui::FontId::proportional(14.0),
            egui::Color32::WHITE,
        );
        painter.text(
            rect(layout.width_up_rect).right_center() + egui::vec2(8.0, 0.0),
            egui::Align2::LEFT_CENTER,
            format!("{stroke_width}px"),
            egui::FontId::proportional(12.0),
            egui::Color32::LIGHT_GRAY,
        );

        painter.rect_filled(rect(layout.save_rect), 4.0, egui::Color32::from_rgb(0, 140, 90));
        painter.text(
            rect(layout.save_rect).center(),
            egui::Align2::CENTER_CENTER,
            "Done",
            egui::FontId::proportional(13.0),
            egui::Color32::WHITE,
        );
        painter.rect_filled(rect(layout.exit_rect), 4.0, egui::Color32::from_rgb(140, 50, 50));
        painter.text(
            rect(layout.exit_rect).center(),
            egui::Align2::CENTER_CENTER,
            "Discard",
            egui::FontId::proportional(13.0),
            egui::Color32::WHITE,
        );
    }
}
