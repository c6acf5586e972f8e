pub mod backend;
pub mod session;

pub use backend::{CaptureBackend, CaptureKind, CaptureStream, ScreenFrameBackend};
pub use session::{CaptureSession, MediaBlob, SessionState, SCREEN_CAPTURE_MAX};
