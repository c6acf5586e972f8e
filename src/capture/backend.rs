use crate::errors::OverlayError;
use anyhow::Result;
use screenshots::Screen;
use std::io::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureKind {
    Audio,
    Screen,
}

impl CaptureKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Audio => "microphone",
            Self::Screen => "screen",
        }
    }
}

/// An open hardware stream. `release` must stop the underlying tracks; the
/// session guarantees it is called on every exit path.
pub trait CaptureStream: Send {
    /// Pull the next accumulated chunk, if any. Device failure is an error;
    /// the session aborts and releases on it.
    fn poll_chunk(&mut self) -> Result<Option<Vec<u8>>>;

    /// True once the user revoked sharing through the OS-level picker.
    /// Meaningful for screen capture; audio streams return false.
    fn revoked(&self) -> bool;

    fn mime(&self) -> &'static str;

    fn release(&mut self);
}

/// Platform seam for opening capture streams. The permission prompt happens
/// inside `request`; denial is a `Permission` error. Hosts inject their own
/// backend (a real recorder, or a mock in tests).
pub trait CaptureBackend {
    fn request(&mut self, kind: CaptureKind) -> Result<Box<dyn CaptureStream>, OverlayError>;
}

/// Default backend: grabs whole-screen frames via the `screenshots` crate,
/// one PNG frame per poll. No microphone support — hosts that record audio
/// inject a backend that provides it.
#[derive(Debug, Default)]
pub struct ScreenFrameBackend;

impl CaptureBackend for ScreenFrameBackend {
    fn request(&mut self, kind: CaptureKind) -> Result<Box<dyn CaptureStream>, OverlayError> {
        match kind {
            CaptureKind::Screen => {
                let screen = Screen::from_point(0, 0).map_err(|e| {
                    OverlayError::Permission(format!("screen capture unavailable: {e}"))
                })?;
                Ok(Box::new(ScreenFrameStream { screen, released: false }))
            }
            CaptureKind::Audio => Err(OverlayError::Permission(
                "no microphone backend installed".into(),
            )),
        }
    }
}

struct ScreenFrameStream {
    screen: Screen,
    released: bool,
}

impl CaptureStream for ScreenFrameStream {
    fn poll_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        if self.released {
            return Ok(None);
        }
        let frame = self.screen.capture()?;
        let mut out = Cursor::new(Vec::new());
        frame.write_to(&mut out, image::ImageFormat::Png)?;
        Ok(Some(out.into_inner()))
    }

    fn revoked(&self) -> bool {
        false
    }

    fn mime(&self) -> &'static str {
        "image/png"
    }

    fn release(&mut self) {
        self.released = true;
    }
}
