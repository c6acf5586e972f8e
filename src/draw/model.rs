use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SketchTool {
    Pencil,
    Highlight,
    Circle,
    Rectangle,
    Arrow,
}

impl SketchTool {
    /// Shape tools preview via raster snapshot/restore; ink tools accumulate.
    pub fn is_shape(self) -> bool {
        matches!(self, Self::Circle | Self::Rectangle | Self::Arrow)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Pencil => "Pencil",
            Self::Highlight => "Highlight",
            Self::Circle => "Circle",
            Self::Rectangle => "Rectangle",
            Self::Arrow => "Arrow",
        }
    }

    pub fn all() -> &'static [SketchTool] {
        &[
            Self::Pencil,
            Self::Highlight,
            Self::Circle,
            Self::Rectangle,
            Self::Arrow,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_rgba_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Alpha applied to highlighter ink so overlapping strokes darken like a
/// marker instead of painting opaque.
pub const HIGHLIGHT_ALPHA: u8 = 96;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub width: u32,
    pub color: Color,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 4,
            color: Color::rgba(255, 51, 51, 255),
        }
    }
}

/// The one drawing-state instance, owned by the engine and mutated only
/// through these setters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawingState {
    pub active: bool,
    pub tool: SketchTool,
    pub stroke: StrokeStyle,
    pub surface_attached: bool,
}

impl Default for DrawingState {
    fn default() -> Self {
        Self {
            active: false,
            tool: SketchTool::Pencil,
            stroke: StrokeStyle::default(),
            surface_attached: false,
        }
    }
}

impl DrawingState {
    pub fn set_tool(&mut self, tool: SketchTool) {
        self.tool = tool;
    }

    pub fn set_color(&mut self, color: Color) {
        self.stroke.color = color;
    }

    pub fn set_width(&mut self, width: u32) {
        self.stroke.width = width.max(1);
    }
}
