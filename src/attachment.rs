use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Image,
    Audio,
    Drawing,
    Video,
}

impl AttachmentKind {
    pub fn from_mime(mime: &str) -> Self {
        if mime.starts_with("audio/") {
            Self::Audio
        } else if mime.starts_with("video/") {
            Self::Video
        } else {
            Self::Image
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlobId(u64);

/// Where an attachment's preview comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewSource {
    /// Transient local blob; must be released when the attachment is removed
    /// or the composer resets.
    LocalBlob(BlobId),
    Remote(String),
    None,
}

/// An attachment the composer holds before upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAttachment {
    pub id: String,
    pub kind: AttachmentKind,
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
    pub preview: PreviewSource,
    pub remote_url: Option<String>,
    /// Stand-in for a recording still in flight; carries no payload yet.
    pub placeholder: bool,
}

/// Registry of transient local preview blobs. Handing bytes out only while
/// the blob is live makes preview leaks observable: a non-zero `live_count`
/// after a reset is a bug.
#[derive(Debug, Default)]
pub struct BlobStore {
    next_id: u64,
    blobs: std::collections::HashMap<u64, Vec<u8>>,
}

impl BlobStore {
    pub fn create(&mut self, bytes: Vec<u8>) -> BlobId {
        let id = self.next_id;
        self.next_id += 1;
        self.blobs.insert(id, bytes);
        BlobId(id)
    }

    pub fn get(&self, id: BlobId) -> Option<&[u8]> {
        self.blobs.get(&id.0).map(Vec::as_slice)
    }

    pub fn is_live(&self, id: BlobId) -> bool {
        self.blobs.contains_key(&id.0)
    }

    pub fn release(&mut self, id: BlobId) {
        self.blobs.remove(&id.0);
    }

    pub fn live_count(&self) -> usize {
        self.blobs.len()
    }

    pub fn release_all(&mut self) {
        self.blobs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{AttachmentKind, BlobStore};

    #[test]
    fn released_blobs_are_no_longer_reachable() {
        let mut store = BlobStore::default();
        let id = store.create(vec![1, 2, 3]);
        assert_eq!(store.get(id), Some(&[1u8, 2, 3][..]));
        assert_eq!(store.live_count(), 1);

        store.release(id);
        assert!(store.get(id).is_none());
        assert!(!store.is_live(id));
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn blob_ids_are_not_reused_after_release() {
        let mut store = BlobStore::default();
        let first = store.create(vec![1]);
        store.release(first);
        let second = store.create(vec![2]);
        assert_ne!(first, second);
        assert!(!store.is_live(first));
    }

    #[test]
    fn kind_is_inferred_from_mime() {
        assert_eq!(AttachmentKind::from_mime("audio/webm"), AttachmentKind::Audio);
        assert_eq!(AttachmentKind::from_mime("video/webm"), AttachmentKind::Video);
        assert_eq!(AttachmentKind::from_mime("image/png"), AttachmentKind::Image);
    }
}
