/// The single exclusive interaction mode of the overlay. Exactly one variant
/// is active at a time; `ModeController` transition methods are the only
/// mutators. This replaces the independent boolean flags the panel grew out
/// of, which allowed illegal combinations such as drawing and tag-drop both
/// consuming the same click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionMode {
    Idle,
    TagDropArmed,
    PopupOpen,
    Drawing,
    DraggingAvatar,
    DraggingPopup,
}

impl InteractionMode {
    pub fn popup_visible(self) -> bool {
        matches!(self, Self::PopupOpen | Self::DraggingPopup)
    }
}

pub fn can_transition(from: InteractionMode, to: InteractionMode) -> bool {
    use InteractionMode::*;
    matches!(
        (from, to),
        (Idle, TagDropArmed)
            | (Idle, Drawing)
            // Reply flow opens the popup directly, without arming tag drop.
            | (Idle, PopupOpen)
            | (TagDropArmed, Idle)
            | (TagDropArmed, PopupOpen)
            | (TagDropArmed, Drawing)
            | (TagDropArmed, DraggingAvatar)
            | (DraggingAvatar, PopupOpen)
            | (DraggingAvatar, TagDropArmed)
            | (DraggingAvatar, Idle)
            | (PopupOpen, DraggingPopup)
            | (PopupOpen, Drawing)
            | (PopupOpen, Idle)
            | (DraggingPopup, PopupOpen)
            | (DraggingPopup, Idle)
            | (Drawing, Idle)
            | (Drawing, TagDropArmed)
            | (Drawing, PopupOpen)
    ) || from == to
}
