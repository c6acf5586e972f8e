use crate::draw::model::{Color, SketchTool};

/// Commands the drawing control strip can emit. The GUI renders the strip,
/// feeds pointer events through `handle_pointer`, and applies the returned
/// command to the engine; the strip itself never touches the raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripCommand {
    SelectTool(SketchTool),
    SelectColor(Color),
    WidthDown,
    WidthUp,
    Save,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripPointerEvent {
    Down,
    Move,
    Up,
}

/// What happened to a pointer event offered to the strip. Everything over
/// the strip is consumed — consumed events must never reach the raster
/// surface underneath.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripPointerOutcome {
    NotOverStrip,
    Consumed(Option<StripCommand>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StripRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl StripRect {
    pub fn contains(self, point: (f32, f32)) -> bool {
        point.0 >= self.x
            && point.0 < self.x + self.w
            && point.1 >= self.y
            && point.1 < self.y + self.h
    }
}

#[derive(Debug, Clone)]
pub struct StripLayout {
    pub panel: StripRect,
    pub tool_rects: Vec<(SketchTool, StripRect)>,
    pub color_rects: Vec<(Color, StripRect)>,
    pub width_down_rect: StripRect,
    pub width_up_rect: StripRect,
    pub save_rect: StripRect,
    pub exit_rect: StripRect,
}

const BUTTON: f32 = 26.0;
const GAP: f32 = 4.0;
const PADDING: f32 = 8.0;

impl StripLayout {
    /// Lay the strip out at `origin` for the given quick colors. Pure
    /// arithmetic; the GUI mirrors these rectangles when painting.
    pub fn at(origin: (f32, f32), quick_colors: &[Color]) -> Self {
        let tools = SketchTool::all();
        let mut x = origin.0 + PADDING;
        let y = origin.1 + PADDING;

        let tool_rects: Vec<(SketchTool, StripRect)> = tools
            .iter()
            .map(|&tool| {
                let rect = StripRect { x, y, w: BUTTON, h: BUTTON };
                x += BUTTON + GAP;
                (tool, rect)
            })
            .collect();

        x += GAP * 2.0;
        let color_rects: Vec<(Color, StripRect)> = quick_colors
            .iter()
            .map(|&color| {
                let rect = StripRect { x, y, w: BUTTON * 0.75, h: BUTTON };
                x += BUTTON * 0.75 + GAP;
                (color, rect)
            })
            .collect();

        x += GAP * 2.0;
        let width_down_rect = StripRect { x, y, w: BUTTON * 0.75, h: BUTTON };
        x += BUTTON * 0.75 + GAP;
        let width_up_rect = StripRect { x, y, w: BUTTON * 0.75, h: BUTTON };
        x += BUTTON * 0.75 + GAP * 3.0;
        let save_rect = StripRect { x, y, w: BUTTON * 2.0, h: BUTTON };
        x += BUTTON * 2.0 + GAP;
        let exit_rect = StripRect { x, y, w: BUTTON * 2.0, h: BUTTON };
        x += BUTTON * 2.0;

        let panel = StripRect {
            x: origin.0,
            y: origin.1,
            w: x - origin.0 + PADDING,
            h: BUTTON + PADDING * 2.0,
        };

        Self {
            panel,
            tool_rects,
            color_rects,
            width_down_rect,
            width_up_rect,
            save_rect,
            exit_rect,
        }
    }

    fn hit(&self, point: (f32, f32)) -> Option<StripCommand> {
        for (tool, rect) in &self.tool_rects {
            if rect.contains(point) {
                return Some(StripCommand::SelectTool(*tool));
            }
        }
        for (color, rect) in &self.color_rects {
            if rect.contains(point) {
                return Some(StripCommand::SelectColor(*color));
            }
        }
        if self.width_down_rect.contains(point) {
            return Some(StripCommand::WidthDown);
        }
        if self.width_up_rect.contains(point) {
            return Some(StripCommand::WidthUp);
        }
        if self.save_rect.contains(point) {
            return Some(StripCommand::Save);
        }
        if self.exit_rect.contains(point) {
            return Some(StripCommand::Exit);
        }
        None
    }
}

/// Offer a pointer event to the strip. Events outside the panel are not the
/// strip's business; everything inside is consumed, and only a button press
/// produces a command.
pub fn handle_pointer(
    layout: &StripLayout,
    event: StripPointerEvent,
    point: (f32, f32),
) -> StripPointerOutcome {
    if !layout.panel.contains(point) {
        return StripPointerOutcome::NotOverStrip;
    }
    let command = match event {
        StripPointerEvent::Down => layout.hit(point),
        StripPointerEvent::Move | StripPointerEvent::Up => None,
    };
    StripPointerOutcome::Consumed(command)
}

#[cfg(test)]
mod tests {
    use super::{handle_pointer, StripCommand, StripLayout, StripPointerEvent, StripPointerOutcome};
    use crate::draw::model::{Color, SketchTool};

    fn layout() -> StripLayout {
        StripLayout::at(
            (100.0, 50.0),
            &[Color::rgba(255, 0, 0, 255), Color::rgba(0, 0, 255, 255)],
        )
    }

    fn center(rect: super::StripRect) -> (f32, f32) {
        (rect.x + rect.w / 2.0, rect.y + rect.h / 2.0)
    }

    #[test]
    fn pointer_outside_the_panel_is_not_consumed() {
        let layout = layout();
        assert_eq!(
            handle_pointer(&layout, StripPointerEvent::Down, (0.0, 0.0)),
            StripPointerOutcome::NotOverStrip
        );
    }

    #[test]
    fn every_event_over_the_panel_is_consumed() {
        let layout = layout();
        let inside = (layout.panel.x + 1.0, layout.panel.y + 1.0);
        for event in [StripPointerEvent::Down, StripPointerEvent::Move, StripPointerEvent::Up] {
            match handle_pointer(&layout, event, inside) {
                StripPointerOutcome::Consumed(_) => {}
                other => panic!("expected consumption, got {other:?}"),
            }
        }
    }

    #[test]
    fn tool_buttons_emit_select_commands_on_press_only() {
        let layout = layout();
        let (tool, rect) = layout.tool_rects[2];
        assert_eq!(tool, SketchTool::Circle);
        assert_eq!(
            handle_pointer(&layout, StripPointerEvent::Down, center(rect)),
            StripPointerOutcome::Consumed(Some(StripCommand::SelectTool(SketchTool::Circle)))
        );
        assert_eq!(
            handle_pointer(&layout, StripPointerEvent::Up, center(rect)),
            StripPointerOutcome::Consumed(None)
        );
    }

    #[test]
    fn color_width_save_and_exit_are_all_reachable() {
        let layout = layout();
        let (color, rect) = layout.color_rects[1];
        assert_eq!(
            handle_pointer(&layout, StripPointerEvent::Down, center(rect)),
            StripPointerOutcome::Consumed(Some(StripCommand::SelectColor(color)))
        );
        assert_eq!(
            handle_pointer(&layout, StripPointerEvent::Down, center(layout.width_up_rect)),
            StripPointerOutcome::Consumed(Some(StripCommand::WidthUp))
        );
        assert_eq!(
            handle_pointer(&layout, StripPointerEvent::Down, center(layout.save_rect)),
            StripPointerOutcome::Consumed(Some(StripCommand::Save))
        );
        assert_eq!(
            handle_pointer(&layout, StripPointerEvent::Down, center(layout.exit_rect)),
            StripPointerOutcome::Consumed(Some(StripCommand::Exit))
        );
    }

    #[test]
    fn layout_rectangles_do_not_overlap() {
        let layout = layout();
        let mut rects: Vec<super::StripRect> =
            layout.tool_rects.iter().map(|(_, r)| *r).collect();
        rects.extend(layout.color_rects.iter().map(|(_, r)| *r));
        rects.extend([
            layout.width_down_rect,
            layout.width_up_rect,
            layout.save_rect,
            layout.exit_rect,
        ]);
        for (i, a) in rects.iter().enumerate() {
            for b in rects.iter().skip(i + 1) {
                let overlap = a.x < b.x + b.w && b.x < a.x + a.w && a.y < b.y + b.h && b.y < a.y + a.h;
                assert!(!overlap, "{a:?} overlaps {b:?}");
            }
        }
    }
}
