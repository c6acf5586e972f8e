use crate::draw::surface::RasterSurface;

pub const INDICATOR_LABEL: &str = "Drawing mode active — Esc or Done to finish";

/// The attached drawing layer: the raster plus the always-on-top indicator
/// banner and the input flags the control strip toggles. Handed out by
/// `SurfaceLifecycle::attach` and passed around explicitly; nothing re-looks
/// it up by name.
#[derive(Debug)]
pub struct OverlaySurface {
    raster: RasterSurface,
    indicator_visible: bool,
    pointer_enabled: bool,
    hidden_for_strip_hover: bool,
    /// Touch input over the surface is consumed so the host page never
    /// scrolls mid-stroke.
    pub consume_touch: bool,
}

impl OverlaySurface {
    fn new(width: u32, height: u32) -> Self {
        Self {
            raster: RasterSurface::new(width, height),
            indicator_visible: true,
            pointer_enabled: true,
            hidden_for_strip_hover: false,
            consume_touch: true,
        }
    }

    pub fn raster(&self) -> &RasterSurface {
        &self.raster
    }

    pub fn raster_mut(&mut self) -> &mut RasterSurface {
        &mut self.raster
    }

    pub fn indicator_visible(&self) -> bool {
        self.indicator_visible
    }

    /// True when the surface should receive pointer input and be rendered.
    pub fn accepts_pointer(&self) -> bool {
        self.pointer_enabled && !self.hidden_for_strip_hover
    }

    pub fn visible(&self) -> bool {
        !self.hidden_for_strip_hover
    }

    /// While the pointer hovers the control strip the raster is hidden and
    /// its input disabled outright, so tool selection never leaves stray ink.
    pub fn set_strip_hover(&mut self, hovering: bool) {
        self.hidden_for_strip_hover = hovering;
        self.pointer_enabled = !hovering;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    Attached,
    AlreadyAttached,
}

/// Owns the overlay surface's presence. Attach and detach are invoked
/// exclusively by the mode controller's enter/exit drawing transitions.
#[derive(Debug, Default)]
pub struct SurfaceLifecycle {
    surface: Option<OverlaySurface>,
}

impl SurfaceLifecycle {
    pub fn attach(&mut self, width: u32, height: u32) -> AttachOutcome {
        if self.surface.is_some() {
            return AttachOutcome::AlreadyAttached;
        }
        tracing::debug!(width, height, "attaching drawing surface");
        self.surface = Some(OverlaySurface::new(width, height));
        AttachOutcome::Attached
    }

    /// Remove the surface and its indicator. Idempotent: safe to call on
    /// unmount even if drawing was never attached.
    pub fn detach(&mut self) {
        if self.surface.take().is_some() {
            tracing::debug!("detached drawing surface");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.surface.is_some()
    }

    pub fn surface(&self) -> Option<&OverlaySurface> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut OverlaySurface> {
        self.surface.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::{AttachOutcome, SurfaceLifecycle};

    #[test]
    fn attach_is_idempotent_and_detach_is_safe_unattached() {
        let mut lifecycle = SurfaceLifecycle::default();
        lifecycle.detach();
        assert!(!lifecycle.is_attached());

        assert_eq!(lifecycle.attach(64, 48), AttachOutcome::Attached);
        assert_eq!(lifecycle.attach(64, 48), AttachOutcome::AlreadyAttached);
        assert!(lifecycle.is_attached());

        lifecycle.detach();
        lifecycle.detach();
        assert!(!lifecycle.is_attached());
    }

    #[test]
    fn fresh_surface_shows_indicator_and_accepts_pointer() {
        let mut lifecycle = SurfaceLifecycle::default();
        lifecycle.attach(32, 32);
        let surface = lifecycle.surface().expect("surface present");
        assert!(surface.indicator_visible());
        assert!(surface.accepts_pointer());
        assert!(surface.consume_touch);
    }

    #[test]
    fn strip_hover_hides_surface_and_blocks_input_until_exit() {
        let mut lifecycle = SurfaceLifecycle::default();
        lifecycle.attach(32, 32);
        let surface = lifecycle.surface_mut().expect("surface present");

        surface.set_strip_hover(true);
        assert!(!surface.accepts_pointer());
        assert!(!surface.visible());

        surface.set_strip_hover(false);
        assert!(surface.accepts_pointer());
        assert!(surface.visible());
    }
}
