use std::time::{Duration, Instant};

/// How long a marker stays on screen after its tag is saved.
pub const MARKER_TTL: Duration = Duration::from_millis(3000);

/// Expiry is checked on a fixed sweep tick, not per frame.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Transient glyph shown where a tag was just placed. Purely presentational;
/// the authoritative tag record lives in the notification provider.
#[derive(Debug, Clone, PartialEq)]
pub struct TagMarker {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub placed_at: Instant,
    pub sketch_preview: Option<String>,
}

#[derive(Debug)]
pub struct MarkerStore {
    markers: Vec<TagMarker>,
    ttl: Duration,
    last_sweep: Option<Instant>,
}

impl Default for MarkerStore {
    fn default() -> Self {
        Self::with_ttl(MARKER_TTL)
    }
}

impl MarkerStore {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { markers: Vec::new(), ttl, last_sweep: None }
    }

    pub fn push(&mut self, marker: TagMarker) {
        self.markers.push(marker);
    }

    pub fn markers(&self) -> &[TagMarker] {
        &self.markers
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Periodic tick: sweeps at most once per `SWEEP_INTERVAL`. Returns the
    /// number of markers dropped.
    pub fn tick(&mut self, now: Instant) -> usize {
        if let Some(last) = self.last_sweep {
            if now.duration_since(last) < SWEEP_INTERVAL {
                return 0;
            }
        }
        self.last_sweep = Some(now);
        self.sweep(now)
    }

    /// Drop every marker older than the TTL, regardless of sweep cadence.
    pub fn sweep(&mut self, now: Instant) -> usize {
        let before = self.markers.len();
        let ttl = self.ttl;
        self.markers.retain(|marker| now.duration_since(marker.placed_at) <= ttl);
        before - self.markers.len()
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }
}
