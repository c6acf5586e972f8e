use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tag_overlay::capture::{
    CaptureBackend, CaptureKind, CaptureSession, CaptureStream, SessionState, SCREEN_CAPTURE_MAX,
};
use tag_overlay::errors::OverlayError;

#[derive(Clone, Default)]
struct Probe {
    released: Arc<AtomicBool>,
    revoked: Arc<AtomicBool>,
}

struct FakeStream {
    chunks: VecDeque<Vec<u8>>,
    probe: Probe,
    mime: &'static str,
}

impl CaptureStream for FakeStream {
    fn poll_chunk(&mut self) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self.chunks.pop_front())
    }

    fn revoked(&self) -> bool {
        self.probe.revoked.load(Ordering::SeqCst)
    }

    fn mime(&self) -> &'static str {
        self.mime
    }

    fn release(&mut self) {
        self.probe.released.store(true, Ordering::SeqCst);
    }
}

struct FakeBackend {
    deny: bool,
    chunks: Vec<Vec<u8>>,
    mime: &'static str,
    probe: Probe,
}

impl CaptureBackend for FakeBackend {
    fn request(&mut self, kind: CaptureKind) -> Result<Box<dyn CaptureStream>, OverlayError> {
        if self.deny {
            return Err(OverlayError::Permission(format!("{} denied", kind.label())));
        }
        Ok(Box::new(FakeStream {
            chunks: self.chunks.clone().into(),
            probe: self.probe.clone(),
            mime: self.mime,
        }))
    }
}

#[test]
fn audio_and_screen_sessions_are_symmetric_and_independent() {
    let now = Instant::now();
    let probe = Probe::default();
    let mut backend =
        FakeBackend { deny: false, chunks: vec![vec![1]], mime: "audio/webm", probe: probe.clone() };

    let mut audio = CaptureSession::audio();
    let mut screen = CaptureSession::screen();
    audio.start(&mut backend, now).expect("audio start");
    assert!(audio.is_recording());
    assert_eq!(screen.state(), SessionState::Idle, "screen session unaffected");

    let blob = audio.stop(now).expect("audio blob");
    assert_eq!(blob.mime, "audio/webm");
    assert!(probe.released.load(Ordering::SeqCst));
}

#[test]
fn permission_denial_never_leaves_a_dangling_stream() {
    let mut backend = FakeBackend {
        deny: true,
        chunks: vec![],
        mime: "audio/webm",
        probe: Probe::default(),
    };
    let mut session = CaptureSession::audio();
    assert!(session.start(&mut backend, Instant::now()).is_err());
    assert_eq!(session.state(), SessionState::Idle);
    // A later tick is a no-op, not a crash on a half-open stream.
    assert!(session.tick(Instant::now()).expect("tick").is_none());
}

#[test]
fn screen_capture_enforces_the_five_minute_ceiling() {
    let probe = Probe::default();
    let mut backend = FakeBackend {
        deny: false,
        chunks: vec![vec![1], vec![2]],
        mime: "video/webm",
        probe: probe.clone(),
    };
    let start = Instant::now();
    let mut session = CaptureSession::screen();
    session.start(&mut backend, start).expect("start");

    assert!(session
        .tick(start + SCREEN_CAPTURE_MAX - Duration::from_secs(1))
        .expect("tick")
        .is_none());
    let blob = session
        .tick(start + SCREEN_CAPTURE_MAX)
        .expect("tick")
        .expect("auto-stop blob");
    assert_eq!(blob.bytes, vec![1, 2]);
    assert!(probe.released.load(Ordering::SeqCst));
}

#[test]
fn os_side_revocation_behaves_like_an_explicit_stop() {
    let probe = Probe::default();
    let mut backend = FakeBackend {
        deny: false,
        chunks: vec![vec![7, 8]],
        mime: "video/webm",
        probe: probe.clone(),
    };
    let now = Instant::now();
    let mut session = CaptureSession::screen();
    session.start(&mut backend, now).expect("start");

    probe.revoked.store(true, Ordering::SeqCst);
    let blob = session.tick(now).expect("tick").expect("blob");
    assert!(blob.file_name.starts_with("screen_capture_"));
    assert!(blob.file_name.ends_with(".webm"));
    assert_eq!(session.state(), SessionState::Idle);
    assert!(probe.released.load(Ordering::SeqCst));
}
