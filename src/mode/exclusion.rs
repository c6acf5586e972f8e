/// The overlay surfaces a click target can belong to. A click event reports
/// its full ancestor chain, leaf first, so the dispatcher can reject clicks
/// that land on overlay chrome rather than the host surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceTarget {
    /// The host page itself; the only target tag drops may land on.
    HostSurface,
    PanelChrome,
    TagPopup,
    DrawingOverlay,
    DrawingStrip,
    Marker,
    AvatarBubble,
    /// Buttons, inputs and other interactive controls on the host page.
    InteractiveControl,
}

/// A click's target ancestry, leaf first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickTarget {
    pub chain: Vec<SurfaceTarget>,
}

impl ClickTarget {
    pub fn host() -> Self {
        Self { chain: vec![SurfaceTarget::HostSurface] }
    }

    pub fn of(leaf: SurfaceTarget) -> Self {
        Self { chain: vec![leaf, SurfaceTarget::HostSurface] }
    }
}

/// Ancestor-match exclusion test for tag-drop clicks.
///
/// Best-effort by design: the test only sees the surfaces the host reports in
/// the chain, so a click inside an unregistered custom widget still places a
/// tag. Callers must not treat a pass as a guarantee of a safe target.
#[derive(Debug, Clone)]
pub struct ExclusionSet {
    excluded: Vec<SurfaceTarget>,
}

impl Default for ExclusionSet {
    fn default() -> Self {
        Self {
            excluded: vec![
                SurfaceTarget::PanelChrome,
                SurfaceTarget::TagPopup,
                SurfaceTarget::DrawingOverlay,
                SurfaceTarget::DrawingStrip,
                SurfaceTarget::Marker,
                SurfaceTarget::AvatarBubble,
                SurfaceTarget::InteractiveControl,
            ],
        }
    }
}

impl ExclusionSet {
    /// True when any ancestor of the click is an excluded surface.
    pub fn matches(&self, target: &ClickTarget) -> bool {
        target
            .chain
            .iter()
            .any(|ancestor| self.excluded.contains(ancestor))
    }
}
