use tag_overlay::avatar::AvatarDrag;
use tag_overlay::mode::{InteractionMode, ModeController};

#[test]
fn short_drag_never_opens_a_popup() {
    let mut ctl = ModeController::new(1280.0, 800.0);
    let mut drag = AvatarDrag::default();
    ctl.arm_tag_drop().expect("arm");

    drag.begin(600.0, 700.0);
    ctl.avatar_drag_started().expect("drag start");
    drag.update(605.0, 704.0);
    let outcome = drag.release(605.0, 704.0);

    let opened = ctl.avatar_drag_finished(outcome).expect("finish");
    assert_eq!(opened, None);
    assert_eq!(ctl.mode(), InteractionMode::TagDropArmed);
    assert_eq!(ctl.popup_position(), None);
}

#[test]
fn long_drag_opens_the_popup_at_the_release_point() {
    let mut ctl = ModeController::new(1280.0, 800.0);
    let mut drag = AvatarDrag::default();
    ctl.arm_tag_drop().expect("arm");

    drag.begin(600.0, 700.0);
    ctl.avatar_drag_started().expect("drag start");
    drag.update(400.0, 300.0);
    let outcome = drag.release(400.0, 300.0);

    let opened = ctl.avatar_drag_finished(outcome).expect("finish");
    assert_eq!(opened, Some((400.0, 300.0)));
    assert_eq!(ctl.mode(), InteractionMode::PopupOpen);
}

#[test]
fn drop_near_the_viewport_edge_is_clamped() {
    let mut ctl = ModeController::new(1280.0, 800.0);
    let mut drag = AvatarDrag::default();
    ctl.arm_tag_drop().expect("arm");

    drag.begin(1200.0, 760.0);
    ctl.avatar_drag_started().expect("drag start");
    let outcome = drag.release(1279.0, 799.0);

    let opened = ctl.avatar_drag_finished(outcome).expect("finish");
    assert_eq!(opened, Some((950.0, 410.0)));
}
