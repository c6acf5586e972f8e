use crate::avatar::DragOutcome;
use crate::draw::overlay::AttachOutcome;
use crate::draw::SketchEngine;
use crate::mode::cursor::{reduce, CursorRequests, DesiredCursor};
use crate::mode::exclusion::{ClickTarget, ExclusionSet};
use crate::mode::state::{can_transition, InteractionMode};
use crate::notices;
use crate::placement::{self, POPUP_HEIGHT, POPUP_WIDTH};
use anyhow::{anyhow, Result};

pub const ARMED_NOTICE: &str = "Tag drop armed: click anywhere on the page to place a tag.";
pub const DRAWING_SUSPENDS_NOTICE: &str = "Tag drop temporarily disabled while drawing.";
pub const REARMED_NOTICE: &str = "Tag drop re-armed: click anywhere to place a tag.";

/// A click on the host surface, with the target ancestry the host reports.
#[derive(Debug, Clone)]
pub struct SurfaceClick {
    pub x: f32,
    pub y: f32,
    pub target: ClickTarget,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickOutcome {
    /// The click arrived while tag drop was not live for input.
    Ignored,
    /// The click landed on an excluded surface.
    Excluded,
    PopupOpened { x: f32, y: f32 },
}

/// Single authority over the active interaction mode. Owns the drawing
/// engine's lifecycle, the popup position, and the cursor reducer inputs;
/// every mode change goes through the transition table.
#[derive(Debug)]
pub struct ModeController {
    mode: InteractionMode,
    tag_drop_suspended: bool,
    popup_suspended: Option<(f32, f32)>,
    popup_position: Option<(f32, f32)>,
    popup_size: (f32, f32),
    popup_drag_offset: (f32, f32),
    viewport: (f32, f32),
    exclusions: ExclusionSet,
    engine: SketchEngine,
}

impl ModeController {
    pub fn new(viewport_w: f32, viewport_h: f32) -> Self {
        Self {
            mode: InteractionMode::Idle,
            tag_drop_suspended: false,
            popup_suspended: None,
            popup_position: None,
            popup_size: (POPUP_WIDTH, POPUP_HEIGHT),
            popup_drag_offset: (0.0, 0.0),
            viewport: (viewport_w, viewport_h),
            exclusions: ExclusionSet::default(),
            engine: SketchEngine::default(),
        }
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = (width, height);
    }

    pub fn viewport(&self) -> (f32, f32) {
        self.viewport
    }

    /// Only valid while the popup is renderable (PopupOpen or DraggingPopup).
    pub fn popup_position(&self) -> Option<(f32, f32)> {
        self.popup_position
    }

    pub fn engine(&self) -> &SketchEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut SketchEngine {
        &mut self.engine
    }

    pub fn tag_drop_armed(&self) -> bool {
        self.mode == InteractionMode::TagDropArmed
    }

    /// Armed either live or suspended under drawing.
    pub fn tag_drop_logically_armed(&self) -> bool {
        self.tag_drop_armed() || self.tag_drop_suspended
    }

    pub fn arm_tag_drop(&mut self) -> Result<()> {
        if self.mode == InteractionMode::TagDropArmed {
            return Ok(());
        }
        self.transition(InteractionMode::TagDropArmed)?;
        notices::push_info(ARMED_NOTICE);
        Ok(())
    }

    /// Toggle tag drop off. Force-closes an open popup; the crosshair clears
    /// through the cursor reducer, which keeps it when drawing is active.
    pub fn disarm_tag_drop(&mut self) {
        self.tag_drop_suspended = false;
        match self.mode {
            InteractionMode::TagDropArmed | InteractionMode::DraggingAvatar => {
                self.mode = InteractionMode::Idle;
            }
            InteractionMode::PopupOpen | InteractionMode::DraggingPopup => {
                self.popup_position = None;
                self.mode = InteractionMode::Idle;
            }
            InteractionMode::Idle | InteractionMode::Drawing => {}
        }
    }

    /// Enter drawing, suspending (not clearing) a live tag-drop or popup
    /// state. The raster surface attaches as part of the same transition.
    pub fn enter_drawing(&mut self) -> Result<AttachOutcome> {
        if self.mode == InteractionMode::Drawing {
            return Ok(AttachOutcome::AlreadyAttached);
        }
        match self.mode {
            InteractionMode::TagDropArmed => {
                self.tag_drop_suspended = true;
                notices::push_info(DRAWING_SUSPENDS_NOTICE);
            }
            InteractionMode::PopupOpen => {
                self.popup_suspended = self.popup_position.take();
            }
            _ => {}
        }
        self.transition(InteractionMode::Drawing)?;
        let (w, h) = self.viewport;
        Ok(self.engine.attach(w.max(1.0) as u32, h.max(1.0) as u32))
    }

    /// Exit drawing. The surface detaches fully before any suspended state
    /// resumes, so a re-armed tag drop never observes a half-torn surface.
    pub fn exit_drawing(&mut self) -> Result<()> {
        if self.mode != InteractionMode::Drawing {
            self.engine.detach();
            return Ok(());
        }
        self.engine.detach();

        if let Some(position) = self.popup_suspended.take() {
            self.transition(InteractionMode::PopupOpen)?;
            self.popup_position = Some(position);
        } else if self.tag_drop_suspended {
            self.tag_drop_suspended = false;
            self.transition(InteractionMode::TagDropArmed)?;
            notices::push_info(REARMED_NOTICE);
        } else {
            self.transition(InteractionMode::Idle)?;
        }
        Ok(())
    }

    /// The one dispatcher for host-surface clicks. Only live while tag drop
    /// is armed; drawing and avatar dragging never reach placement here.
    pub fn handle_surface_click(&mut self, click: &SurfaceClick) -> ClickOutcome {
        if self.mode != InteractionMode::TagDropArmed {
            return ClickOutcome::Ignored;
        }
        if self.exclusions.matches(&click.target) {
            return ClickOutcome::Excluded;
        }
        match self.open_popup_clamped(click.x, click.y) {
            Ok((x, y)) => ClickOutcome::PopupOpened { x, y },
            Err(err) => {
                tracing::error!(?err, "surface click could not open popup");
                ClickOutcome::Ignored
            }
        }
    }

    /// Open the popup for the reply flow (no arming involved).
    pub fn open_popup_for_reply(&mut self, raw_x: f32, raw_y: f32) -> Result<(f32, f32)> {
        self.open_popup_clamped(raw_x, raw_y)
    }

    /// Close the popup and drop the armed state, mirroring the original
    /// panel's behavior of leaving tag-drop mode once a tag is placed.
    pub fn close_popup(&mut self) {
        if self.mode.popup_visible() {
            self.popup_position = None;
            self.mode = InteractionMode::Idle;
        }
        self.popup_suspended = None;
    }

    pub fn begin_popup_drag(&mut self, pointer_x: f32, pointer_y: f32) -> Result<()> {
        let Some((px, py)) = self.popup_position else {
            return Err(anyhow!("popup drag without an open popup"));
        };
        self.transition(InteractionMode::DraggingPopup)?;
        self.popup_drag_offset = (pointer_x - px, pointer_y - py);
        Ok(())
    }

    /// Continuously re-clamp while the popup is dragged by its handle.
    pub fn update_popup_drag(&mut self, pointer_x: f32, pointer_y: f32) {
        if self.mode != InteractionMode::DraggingPopup {
            return;
        }
        let (w, h) = self.viewport;
        let (pw, ph) = self.popup_size;
        self.popup_position = Some(placement::resolve(
            pointer_x - self.popup_drag_offset.0,
            pointer_y - self.popup_drag_offset.1,
            pw,
            ph,
            w,
            h,
        ));
    }

    pub fn end_popup_drag(&mut self) -> Result<()> {
        if self.mode == InteractionMode::DraggingPopup {
            self.transition(InteractionMode::PopupOpen)?;
        }
        Ok(())
    }

    pub fn avatar_drag_started(&mut self) -> Result<()> {
        self.transition(InteractionMode::DraggingAvatar)
    }

    /// Fold the avatar drag result back into the mode machine: a drop opens
    /// the popup at the clamped release point, a cancel re-arms.
    pub fn avatar_drag_finished(&mut self, outcome: DragOutcome) -> Result<Option<(f32, f32)>> {
        match outcome {
            DragOutcome::Dropped { x, y } => {
                let position = self.open_popup_clamped(x, y)?;
                Ok(Some(position))
            }
            DragOutcome::Cancelled => {
                self.transition(InteractionMode::TagDropArmed)?;
                Ok(None)
            }
        }
    }

    /// Host panel closed: never leave stale popup state across a hide/show
    /// cycle. Detaches the surface, drops the popup, clears suspensions.
    pub fn host_closed(&mut self) {
        tracing::debug!(mode = ?self.mode, "host closed, resetting interaction state");
        self.engine.detach();
        self.popup_position = None;
        self.popup_suspended = None;
        self.tag_drop_suspended = false;
        self.mode = InteractionMode::Idle;
    }

    /// The single desired cursor, folded from every affordance writer.
    pub fn cursor(&self) -> DesiredCursor {
        reduce(CursorRequests {
            drawing_active: self.mode == InteractionMode::Drawing,
            tag_drop_armed: self.mode == InteractionMode::TagDropArmed,
            dragging_avatar: self.mode == InteractionMode::DraggingAvatar,
            dragging_popup: self.mode == InteractionMode::DraggingPopup,
        })
    }

    fn open_popup_clamped(&mut self, raw_x: f32, raw_y: f32) -> Result<(f32, f32)> {
        let (w, h) = self.viewport;
        let (pw, ph) = self.popup_size;
        let position = placement::resolve(raw_x, raw_y, pw, ph, w, h);
        self.transition(InteractionMode::PopupOpen)?;
        self.popup_position = Some(position);
        Ok(position)
    }

    fn transition(&mut self, next: InteractionMode) -> Result<()> {
        if !can_transition(self.mode, next) {
            return Err(anyhow!(
                "invalid interaction mode transition: {:?} -> {:?}",
                self.mode,
                next
            ));
        }
        tracing::trace!(from = ?self.mode, to = ?next, "interaction mode transition");
        self.mode = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ClickOutcome, ModeController, SurfaceClick};
    use crate::avatar::DragOutcome;
    use crate::mode::cursor::DesiredCursor;
    use crate::mode::exclusion::{ClickTarget, SurfaceTarget};
    use crate::mode::state::InteractionMode;

    fn controller() -> ModeController {
        ModeController::new(1280.0, 800.0)
    }

    fn host_click(x: f32, y: f32) -> SurfaceClick {
        SurfaceClick { x, y, target: ClickTarget::host() }
    }

    #[test]
    fn armed_click_opens_popup_at_clamped_coordinates() {
        let mut ctl = controller();
        ctl.arm_tag_drop().expect("arm");
        assert_eq!(
            ctl.handle_surface_click(&host_click(50.0, 50.0)),
            ClickOutcome::PopupOpened { x: 50.0, y: 50.0 }
        );
        assert_eq!(ctl.mode(), InteractionMode::PopupOpen);
        assert_eq!(ctl.popup_position(), Some((50.0, 50.0)));
    }

    #[test]
    fn corner_click_is_clamped_into_the_viewport() {
        let mut ctl = controller();
        ctl.arm_tag_drop().expect("arm");
        assert_eq!(
            ctl.handle_surface_click(&host_click(1270.0, 790.0)),
            ClickOutcome::PopupOpened { x: 950.0, y: 410.0 }
        );
    }

    #[test]
    fn clicks_during_drawing_never_open_the_popup() {
        let mut ctl = controller();
        ctl.arm_tag_drop().expect("arm");
        ctl.enter_drawing().expect("enter drawing");

        assert_eq!(ctl.handle_surface_click(&host_click(50.0, 50.0)), ClickOutcome::Ignored);
        assert_eq!(ctl.popup_position(), None);
        assert_eq!(ctl.mode(), InteractionMode::Drawing);
    }

    #[test]
    fn excluded_targets_are_rejected_without_state_change() {
        let mut ctl = controller();
        ctl.arm_tag_drop().expect("arm");
        let click = SurfaceClick {
            x: 100.0,
            y: 100.0,
            target: ClickTarget::of(SurfaceTarget::PanelChrome),
        };
        assert_eq!(ctl.handle_surface_click(&click), ClickOutcome::Excluded);
        assert_eq!(ctl.mode(), InteractionMode::TagDropArmed);
    }

    #[test]
    fn drawing_suspends_armed_state_and_resumes_on_exit() {
        let mut ctl = controller();
        ctl.arm_tag_drop().expect("arm");
        ctl.enter_drawing().expect("enter drawing");
        assert!(!ctl.tag_drop_armed());
        assert!(ctl.tag_drop_logically_armed());
        assert!(ctl.engine().is_attached());

        ctl.exit_drawing().expect("exit drawing");
        assert_eq!(ctl.mode(), InteractionMode::TagDropArmed);
        assert!(!ctl.engine().is_attached(), "surface must detach before re-arm");
    }

    #[test]
    fn drawing_from_popup_restores_the_popup_afterwards() {
        let mut ctl = controller();
        ctl.arm_tag_drop().expect("arm");
        ctl.handle_surface_click(&host_click(200.0, 200.0));
        ctl.enter_drawing().expect("enter drawing");
        assert_eq!(ctl.popup_position(), None);

        ctl.exit_drawing().expect("exit drawing");
        assert_eq!(ctl.mode(), InteractionMode::PopupOpen);
        assert_eq!(ctl.popup_position(), Some((200.0, 200.0)));
    }

    #[test]
    fn disarm_force_closes_an_open_popup() {
        let mut ctl = controller();
        ctl.arm_tag_drop().expect("arm");
        ctl.handle_surface_click(&host_click(200.0, 200.0));
        ctl.disarm_tag_drop();
        assert_eq!(ctl.mode(), InteractionMode::Idle);
        assert_eq!(ctl.popup_position(), None);
    }

    #[test]
    fn avatar_drop_opens_popup_and_cancel_rearms() {
        let mut ctl = controller();
        ctl.arm_tag_drop().expect("arm");
        ctl.avatar_drag_started().expect("drag start");
        assert_eq!(ctl.mode(), InteractionMode::DraggingAvatar);

        let opened = ctl
            .avatar_drag_finished(DragOutcome::Dropped { x: 640.0, y: 400.0 })
            .expect("drop");
        assert_eq!(opened, Some((640.0, 400.0)));
        assert_eq!(ctl.mode(), InteractionMode::PopupOpen);

        let mut ctl = controller();
        ctl.arm_tag_drop().expect("arm");
        ctl.avatar_drag_started().expect("drag start");
        let opened = ctl.avatar_drag_finished(DragOutcome::Cancelled).expect("cancel");
        assert_eq!(opened, None);
        assert_eq!(ctl.mode(), InteractionMode::TagDropArmed);
    }

    #[test]
    fn popup_drag_keeps_position_clamped() {
        let mut ctl = controller();
        ctl.arm_tag_drop().expect("arm");
        ctl.handle_surface_click(&host_click(400.0, 300.0));
        ctl.begin_popup_drag(410.0, 310.0).expect("begin drag");
        assert_eq!(ctl.mode(), InteractionMode::DraggingPopup);

        ctl.update_popup_drag(5000.0, 5000.0);
        assert_eq!(ctl.popup_position(), Some((950.0, 410.0)));

        ctl.end_popup_drag().expect("end drag");
        assert_eq!(ctl.mode(), InteractionMode::PopupOpen);
    }

    #[test]
    fn host_close_resets_everything() {
        let mut ctl = controller();
        ctl.arm_tag_drop().expect("arm");
        ctl.handle_surface_click(&host_click(400.0, 300.0));
        ctl.enter_drawing().expect("enter drawing");

        ctl.host_closed();
        assert_eq!(ctl.mode(), InteractionMode::Idle);
        assert_eq!(ctl.popup_position(), None);
        assert!(!ctl.engine().is_attached());
        assert!(!ctl.tag_drop_logically_armed());
    }

    #[test]
    fn cursor_follows_the_mode() {
        let mut ctl = controller();
        assert_eq!(ctl.cursor(), DesiredCursor::Default);
        ctl.arm_tag_drop().expect("arm");
        assert_eq!(ctl.cursor(), DesiredCursor::Crosshair);
        ctl.avatar_drag_started().expect("drag");
        assert_eq!(ctl.cursor(), DesiredCursor::Grabbing);
    }

    #[test]
    fn drawing_keeps_crosshair_even_after_disarm() {
        let mut ctl = controller();
        ctl.arm_tag_drop().expect("arm");
        ctl.enter_drawing().expect("enter drawing");
        ctl.disarm_tag_drop();
        assert_eq!(ctl.cursor(), DesiredCursor::Crosshair);
    }
}
