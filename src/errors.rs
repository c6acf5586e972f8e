use thiserror::Error;

/// Failure taxonomy for the overlay. Every fallible operation in the crate
/// resolves to one of these variants or to a handled notice; nothing is
/// allowed to propagate uncaught past a save/upload/capture boundary.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// Save blocked by missing user input. Recoverable; composer state is
    /// left untouched so the user can fix and retry.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Microphone or screen permission denied, or the device failed while a
    /// session was being opened. Aborts that capture session only.
    #[error("capture permission denied: {0}")]
    Permission(String),

    /// A single attachment failed to upload. Non-fatal to the overall save:
    /// the attachment is dropped from the persisted set.
    #[error("attachment upload failed: {0}")]
    Upload(String),

    /// The tag record could not be persisted. Aborts the whole save; composer
    /// state is preserved for retry.
    #[error("tag persistence failed: {0}")]
    Persistence(String),

    /// A drawing data URL could not be decoded. Aborts only the
    /// attach-drawing step.
    #[error("malformed drawing data: {0}")]
    MalformedData(String),
}

impl OverlayError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
