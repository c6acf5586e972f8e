use crate::draw::model::Color;

/// How ink is combined with pixels already on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// Source replaces destination.
    Opaque,
    /// Marker-style accumulation: channels multiply, so overlapping strokes
    /// darken. Empty (fully transparent) destination pixels are treated as
    /// white paper so a first pass still shows the ink color.
    Multiply,
}

pub fn draw_polyline(
    points: &[(i32, i32)],
    color: Color,
    stroke_width: u32,
    blend: BlendMode,
    pixels: &mut [u8],
    width: u32,
    height: u32,
) {
    if points.is_empty() {
        return;
    }
    if points.len() == 1 {
        draw_brush(points[0], color, stroke_width, blend, pixels, width, height);
        return;
    }
    for segment in points.windows(2) {
        draw_segment(segment[0], segment[1], color, stroke_width, blend, pixels, width, height);
    }
}

/// Bresenham walk stamping a round brush at each step.
pub fn draw_segment(
    start: (i32, i32),
    end: (i32, i32),
    color: Color,
    stroke_width: u32,
    blend: BlendMode,
    pixels: &mut [u8],
    width: u32,
    height: u32,
) {
    let mut x0 = start.0;
    let mut y0 = start.1;
    let x1 = end.0;
    let y1 = end.1;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        draw_brush((x0, y0), color, stroke_width, blend, pixels, width, height);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

pub fn draw_rect_outline(
    start: (i32, i32),
    end: (i32, i32),
    color: Color,
    stroke_width: u32,
    blend: BlendMode,
    pixels: &mut [u8],
    width: u32,
    height: u32,
) {
    let (x0, x1) = if start.0 <= end.0 { (start.0, end.0) } else { (end.0, start.0) };
    let (y0, y1) = if start.1 <= end.1 { (start.1, end.1) } else { (end.1, start.1) };

    let corners = [((x0, y0), (x1, y0)), ((x1, y0), (x1, y1)), ((x1, y1), (x0, y1)), ((x0, y1), (x0, y0))];
    for (a, b) in corners {
        draw_segment(a, b, color, stroke_width, blend, pixels, width, height);
    }
}

/// Circle outline centred on `center` with the given radius, stepped densely
/// enough that adjacent stamps touch.
pub fn draw_circle_outline(
    center: (i32, i32),
    radius: f32,
    color: Color,
    stroke_width: u32,
    blend: BlendMode,
    pixels: &mut [u8],
    width: u32,
    height: u32,
) {
    let radius = radius.max(0.5);
    let circumference = std::f32::consts::TAU * radius;
    let steps = circumference.max(12.0) as usize;

    for step in 0..=steps {
        let t = (step as f32 / steps as f32) * std::f32::consts::TAU;
        let x = (center.0 as f32 + radius * t.cos()).round() as i32;
        let y = (center.1 as f32 + radius * t.sin()).round() as i32;
        draw_brush((x, y), color, stroke_width, blend, pixels, width, height);
    }
}

/// Arrow: the start->end segment plus two return segments at +-30 degrees
/// from the heading, forming an open arrowhead at the end point.
pub fn draw_arrow(
    start: (i32, i32),
    end: (i32, i32),
    color: Color,
    stroke_width: u32,
    blend: BlendMode,
    pixels: &mut [u8],
    width: u32,
    height: u32,
) {
    draw_segment(start, end, color, stroke_width, blend, pixels, width, height);

    let head_len = (stroke_width as f32 * 2.5).max(10.0);
    let heading = ((end.1 - start.1) as f32).atan2((end.0 - start.0) as f32);
    for sign in [-1.0f32, 1.0] {
        let angle = heading + sign * std::f32::consts::FRAC_PI_6;
        let tip = (
            (end.0 as f32 - head_len * angle.cos()).round() as i32,
            (end.1 as f32 - head_len * angle.sin()).round() as i32,
        );
        draw_segment(end, tip, color, stroke_width, blend, pixels, width, height);
    }
}

pub fn draw_brush(
    center: (i32, i32),
    color: Color,
    stroke_width: u32,
    blend: BlendMode,
    pixels: &mut [u8],
    width: u32,
    height: u32,
) {
    let radius = (stroke_width.saturating_sub(1) / 2) as i32;
    for y in (center.1 - radius)..=(center.1 + radius) {
        for x in (center.0 - radius)..=(center.0 + radius) {
            let dx = x - center.0;
            let dy = y - center.1;
            if dx * dx + dy * dy <= radius * radius {
                set_pixel(pixels, width, height, x, y, color, blend);
            }
        }
    }
}

fn set_pixel(
    pixels: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    color: Color,
    blend: BlendMode,
) {
    if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
        return;
    }
    let idx = ((y as u32 * width + x as u32) * 4) as usize;
    if idx + 3 >= pixels.len() {
        return;
    }

    match blend {
        BlendMode::Opaque => {
            pixels[idx] = color.r;
            pixels[idx + 1] = color.g;
            pixels[idx + 2] = color.b;
            pixels[idx + 3] = color.a;
        }
        BlendMode::Multiply => {
            let dst_a = pixels[idx + 3];
            let (dr, dg, db) = if dst_a == 0 {
                (255, 255, 255)
            } else {
                (pixels[idx], pixels[idx + 1], pixels[idx + 2])
            };
            pixels[idx] = multiply_channel(dr, color.r);
            pixels[idx + 1] = multiply_channel(dg, color.g);
            pixels[idx + 2] = multiply_channel(db, color.b);
            pixels[idx + 3] = dst_a.max(color.a);
        }
    }
}

fn multiply_channel(dst: u8, src: u8) -> u8 {
    ((dst as u16 * src as u16) / 255) as u8
}
