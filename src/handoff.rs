use crate::attachment::AttachmentKind;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

/// Well-known key the tag-click handoff travels under.
pub const TAG_HANDOFF_KEY: &str = "active_tag_overlay";

/// Snapshot serialized when a tag notification is clicked outside the panel,
/// consumed once by the target page to render a one-shot overlay bubble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagHandoff {
    pub id: String,
    pub comment: String,
    pub sender_name: String,
    pub coords: Option<(f32, f32)>,
    pub media_kind: Option<AttachmentKind>,
    pub media_url: Option<String>,
}

static STORE: Lazy<Mutex<HashMap<String, String>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Publish a snapshot under `key`, replacing any unconsumed one.
pub fn publish(key: &str, handoff: &TagHandoff) {
    match serde_json::to_string(handoff) {
        Ok(json) => {
            if let Ok(mut store) = STORE.lock() {
                store.insert(key.to_string(), json);
            }
        }
        Err(err) => tracing::error!(?err, "failed to serialize tag handoff"),
    }
}

/// Read and immediately clear the snapshot: a fire-once channel, not a
/// persistent store. Malformed payloads are dropped with a log line.
pub fn take(key: &str) -> Option<TagHandoff> {
    let json = STORE.lock().ok()?.remove(key)?;
    match serde_json::from_str(&json) {
        Ok(handoff) => Some(handoff),
        Err(err) => {
            tracing::error!(?err, "discarding malformed tag handoff payload");
            None
        }
    }
}
