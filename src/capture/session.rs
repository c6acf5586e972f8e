use crate::capture::backend::{CaptureBackend, CaptureKind, CaptureStream};
use crate::errors::OverlayError;
use chrono::Local;
use std::time::{Duration, Instant};

/// Hard safety limit for screen capture sessions.
pub const SCREEN_CAPTURE_MAX: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Requesting,
    Recording,
}

pub fn can_transition(from: SessionState, to: SessionState) -> bool {
    matches!(
        (from, to),
        (SessionState::Idle, SessionState::Requesting)
            | (SessionState::Requesting, SessionState::Recording)
            | (SessionState::Requesting, SessionState::Idle)
            | (SessionState::Recording, SessionState::Idle)
    ) || from == to
}

/// A finished recording, wrapped as a named file ready to attach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaBlob {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// One recording session (audio or screen): `Idle -> Requesting -> Recording
/// -> Idle`. The permission prompt lives in `Requesting`; every exit path —
/// explicit stop, OS-side revocation, deadline, device error, abort —
/// releases the hardware stream before the session returns to Idle.
pub struct CaptureSession {
    kind: CaptureKind,
    state: SessionState,
    stream: Option<Box<dyn CaptureStream>>,
    chunks: Vec<Vec<u8>>,
    mime: &'static str,
    deadline: Option<Instant>,
    limit: Option<Duration>,
    hold: bool,
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("chunks", &self.chunks.len())
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl CaptureSession {
    pub fn audio() -> Self {
        Self::with_limit(CaptureKind::Audio, None)
    }

    pub fn screen() -> Self {
        Self::with_limit(CaptureKind::Screen, Some(SCREEN_CAPTURE_MAX))
    }

    pub fn with_limit(kind: CaptureKind, limit: Option<Duration>) -> Self {
        Self {
            kind,
            state: SessionState::Idle,
            stream: None,
            chunks: Vec::new(),
            mime: "application/octet-stream",
            deadline: None,
            limit,
            hold: false,
        }
    }

    pub fn kind(&self) -> CaptureKind {
        self.kind
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == SessionState::Recording
    }

    /// Open the stream through the backend's permission prompt. Denial or a
    /// device error lands back in Idle with nothing left open.
    pub fn start(
        &mut self,
        backend: &mut dyn CaptureBackend,
        now: Instant,
    ) -> Result<(), OverlayError> {
        if self.state != SessionState::Idle {
            return Ok(());
        }
        self.transition(SessionState::Requesting);
        match backend.request(self.kind) {
            Ok(stream) => {
                self.mime = stream.mime();
                self.stream = Some(stream);
                self.chunks.clear();
                self.deadline = self.limit.map(|limit| now + limit);
                self.transition(SessionState::Recording);
                tracing::debug!(kind = self.kind.label(), "capture session recording");
                Ok(())
            }
            Err(err) => {
                self.transition(SessionState::Idle);
                tracing::warn!(kind = self.kind.label(), %err, "capture request failed");
                Err(err)
            }
        }
    }

    /// Press-and-hold entry point: start recording and remember the hold so
    /// the matching release stops it.
    pub fn press(
        &mut self,
        backend: &mut dyn CaptureBackend,
        now: Instant,
    ) -> Result<(), OverlayError> {
        self.hold = true;
        self.start(backend, now).inspect_err(|_| {
            self.hold = false;
        })
    }

    /// Release of a press-and-hold (or the pointer leaving the button).
    pub fn release_hold(&mut self, now: Instant) -> Option<MediaBlob> {
        if !self.hold {
            return None;
        }
        self.hold = false;
        self.stop(now)
    }

    /// Periodic pump: accumulates chunks, honors OS-side revocation and the
    /// session deadline. A device error aborts the session (stream released,
    /// chunks discarded) and surfaces as a `Permission` failure.
    pub fn tick(&mut self, now: Instant) -> Result<Option<MediaBlob>, OverlayError> {
        if self.state != SessionState::Recording {
            return Ok(None);
        }

        if let Some(stream) = self.stream.as_mut() {
            match stream.poll_chunk() {
                Ok(Some(chunk)) => self.chunks.push(chunk),
                Ok(None) => {}
                Err(err) => {
                    self.abort();
                    return Err(OverlayError::Permission(format!(
                        "capture device failed: {err}"
                    )));
                }
            }
            if stream.revoked() {
                tracing::debug!(kind = self.kind.label(), "capture revoked by the platform");
                return Ok(self.stop(now));
            }
        }

        if self.deadline.is_some_and(|deadline| now >= deadline) {
            tracing::debug!(kind = self.kind.label(), "capture deadline reached, auto-stopping");
            return Ok(self.stop(now));
        }
        Ok(None)
    }

    /// Stop and collect the recording. The stream is always released, even
    /// when no data was captured (in which case there is no blob).
    pub fn stop(&mut self, _now: Instant) -> Option<MediaBlob> {
        if self.state != SessionState::Recording {
            self.release_stream();
            return None;
        }

        // Drain whatever the stream still holds before closing it.
        if let Some(stream) = self.stream.as_mut() {
            while let Ok(Some(chunk)) = stream.poll_chunk() {
                self.chunks.push(chunk);
            }
        }
        self.release_stream();
        self.transition(SessionState::Idle);
        self.deadline = None;
        self.hold = false;

        let chunks = std::mem::take(&mut self.chunks);
        if chunks.is_empty() {
            return None;
        }
        let bytes: Vec<u8> = chunks.concat();
        Some(MediaBlob {
            file_name: blob_file_name(self.kind, self.mime),
            mime: self.mime,
            bytes,
        })
    }

    /// Abandon the session without producing a blob. The unmount/reset path.
    pub fn abort(&mut self) {
        self.release_stream();
        self.chunks.clear();
        self.deadline = None;
        self.hold = false;
        self.state = SessionState::Idle;
    }

    fn release_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.release();
        }
    }

    fn transition(&mut self, next: SessionState) {
        debug_assert!(
            can_transition(self.state, next),
            "invalid capture transition {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
    }
}

fn blob_file_name(kind: CaptureKind, mime: &str) -> String {
    let stem = Local::now().format("%Y%m%d_%H%M%S");
    let ext = match mime {
        "audio/webm" | "video/webm" => "webm",
        "image/png" => "png",
        _ => "bin",
    };
    match kind {
        CaptureKind::Audio => format!("voice_note_{stem}.{ext}"),
        CaptureKind::Screen => format!("screen_capture_{stem}.{ext}"),
    }
}
