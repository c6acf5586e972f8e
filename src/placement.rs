/// Default popup dimensions in viewport pixels.
pub const POPUP_WIDTH: f32 = 320.0;
pub const POPUP_HEIGHT: f32 = 380.0;

/// Minimum distance kept between the popup and every viewport edge.
pub const VIEWPORT_MARGIN: f32 = 10.0;

/// Clamp raw pointer coordinates to a popup position that keeps the whole
/// popup inside the viewport. Used identically for click-based placement,
/// avatar-drop placement and manual popup dragging, so every entry path
/// produces the same on-screen bounds.
pub fn resolve(
    raw_x: f32,
    raw_y: f32,
    popup_w: f32,
    popup_h: f32,
    viewport_w: f32,
    viewport_h: f32,
) -> (f32, f32) {
    (
        clamp_axis(raw_x, popup_w, viewport_w),
        clamp_axis(raw_y, popup_h, viewport_h),
    )
}

/// `resolve` with the default popup dimensions.
pub fn resolve_default(raw_x: f32, raw_y: f32, viewport_w: f32, viewport_h: f32) -> (f32, f32) {
    resolve(raw_x, raw_y, POPUP_WIDTH, POPUP_HEIGHT, viewport_w, viewport_h)
}

// min-then-max keeps the margin edge winning when the viewport is smaller
// than the popup, instead of panicking on an inverted clamp range.
fn clamp_axis(raw: f32, popup_extent: f32, viewport_extent: f32) -> f32 {
    let hi = viewport_extent - popup_extent - VIEWPORT_MARGIN;
    raw.min(hi).max(VIEWPORT_MARGIN)
}

#[cfg(test)]
mod tests {
    use super::{resolve, resolve_default, VIEWPORT_MARGIN};

    #[test]
    fn in_bounds_coordinates_pass_through_unmodified() {
        assert_eq!(resolve_default(50.0, 50.0, 1280.0, 800.0), (50.0, 50.0));
        assert_eq!(resolve_default(400.0, 300.0, 1280.0, 800.0), (400.0, 300.0));
    }

    #[test]
    fn bottom_right_click_clamps_to_popup_fit() {
        assert_eq!(resolve_default(1270.0, 790.0, 1280.0, 800.0), (950.0, 410.0));
    }

    #[test]
    fn top_left_click_clamps_to_margin() {
        assert_eq!(resolve_default(0.0, -40.0, 1280.0, 800.0), (10.0, 10.0));
    }

    #[test]
    fn custom_popup_dimensions_shift_the_upper_bound() {
        let (x, y) = resolve(2000.0, 2000.0, 420.0, 600.0, 1280.0, 800.0);
        assert_eq!((x, y), (1280.0 - 420.0 - 10.0, 800.0 - 600.0 - 10.0));
    }

    #[test]
    fn result_is_always_within_bounds_for_arbitrary_input() {
        let viewports = [(1280.0, 800.0), (1920.0, 1080.0), (640.0, 480.0)];
        let points = [
            (-5000.0, -5000.0),
            (0.0, 0.0),
            (333.3, 777.7),
            (5000.0, 5000.0),
            (f32::MIN, f32::MAX),
        ];
        for (w, h) in viewports {
            for (px, py) in points {
                let (x, y) = resolve_default(px, py, w, h);
                assert!(x >= VIEWPORT_MARGIN && x <= w - 330.0, "x={x} out of bounds for {w}x{h}");
                assert!(y >= VIEWPORT_MARGIN && y <= h - 390.0, "y={y} out of bounds for {w}x{h}");
            }
        }
    }

    #[test]
    fn degenerate_viewport_falls_back_to_margin_instead_of_panicking() {
        let (x, y) = resolve_default(100.0, 100.0, 200.0, 150.0);
        assert_eq!((x, y), (10.0, 10.0));
    }
}
