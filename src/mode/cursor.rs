/// The pointer affordance the overlay wants the host window to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DesiredCursor {
    #[default]
    Default,
    Crosshair,
    Grabbing,
}

/// Inputs to the cursor reducer. The drawing engine, the avatar drag, the
/// popup drag and the armed tag-drop state all *request* an affordance here;
/// none of them writes the cursor directly. One fold, one writer (the GUI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorRequests {
    pub drawing_active: bool,
    pub tag_drop_armed: bool,
    pub dragging_avatar: bool,
    pub dragging_popup: bool,
}

/// Grab affordances win over the crosshair, which wins over the default.
/// Disarming tag drop while drawing stays active therefore keeps the
/// crosshair, matching the drawing cursor's precedence.
pub fn reduce(requests: CursorRequests) -> DesiredCursor {
    if requests.dragging_avatar || requests.dragging_popup {
        DesiredCursor::Grabbing
    } else if requests.drawing_active || requests.tag_drop_armed {
        DesiredCursor::Crosshair
    } else {
        DesiredCursor::Default
    }
}

#[cfg(test)]
mod tests {
    use super::{reduce, CursorRequests, DesiredCursor};

    #[test]
    fn idle_requests_default_cursor() {
        assert_eq!(reduce(CursorRequests::default()), DesiredCursor::Default);
    }

    #[test]
    fn dragging_wins_over_armed_crosshair() {
        let requests = CursorRequests {
            tag_drop_armed: true,
            dragging_avatar: true,
            ..CursorRequests::default()
        };
        assert_eq!(reduce(requests), DesiredCursor::Grabbing);
    }

    #[test]
    fn drawing_keeps_crosshair_after_disarm() {
        let requests = CursorRequests {
            drawing_active: true,
            tag_drop_armed: false,
            ..CursorRequests::default()
        };
        assert_eq!(reduce(requests), DesiredCursor::Crosshair);
    }

    #[test]
    fn popup_drag_requests_grabbing() {
        let requests = CursorRequests {
            dragging_popup: true,
            ..CursorRequests::default()
        };
        assert_eq!(reduce(requests), DesiredCursor::Grabbing);
    }
}
