use crate::attachment::AttachmentKind;
use crate::errors::OverlayError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

/// An attachment that made it to storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAttachment {
    pub id: String,
    pub kind: AttachmentKind,
    pub url: String,
    pub file_name: String,
}

/// The record persisted through the notification provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagPayload {
    pub id: String,
    pub creator_id: String,
    pub creator_name: String,
    pub comment: String,
    pub tagged_staff_ids: Vec<String>,
    pub attachments: Vec<StoredAttachment>,
    pub coords: (f32, f32),
    pub drawing_data_url: Option<String>,
    pub conversation_id: Option<String>,
    pub reply_to_id: Option<String>,
    pub requires_approval: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedTag {
    pub id: String,
    pub drawing_data: Option<String>,
}

/// A notification as the provider reports it back to the panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub comment: String,
    pub sender_id: String,
    pub sender_name: String,
    pub coords: Option<(f32, f32)>,
    pub conversation_id: Option<String>,
    pub attachments: Vec<StoredAttachment>,
    pub read: bool,
    pub requires_approval: bool,
    pub approval_status: Option<ApprovalStatus>,
}

/// External attachment storage. Per-file failures are `Upload` errors and
/// non-fatal to a save. `Send + Sync` so uploads can fan out across scoped
/// worker threads.
pub trait AttachmentStorage: Send + Sync {
    fn upload(&self, bytes: &[u8], folder_path: &str, file_name: &str)
        -> Result<String, OverlayError>;
}

/// External tag/notification persistence.
pub trait NotificationProvider: Send + Sync {
    fn create_tag(&self, payload: &TagPayload) -> Result<CreatedTag, OverlayError>;

    fn reply_to_notification(
        &self,
        notification_id: &str,
        comment: &str,
        attachments: &[StoredAttachment],
    ) -> Result<(), OverlayError>;

    fn get_conversation_notifications(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<Notification>, OverlayError>;

    fn mark_all_as_read(&self) -> Result<(), OverlayError>;
}

/// `tag_<millis>_<suffix>` ids, matching the records the original service
/// layer produced.
pub fn new_tag_id() -> String {
    format!("tag_{}_{}", chrono::Utc::now().timestamp_millis(), id_suffix(7))
}

pub fn new_attachment_id() -> String {
    format!("file_{}_{}", chrono::Utc::now().timestamp_millis(), id_suffix(5))
}

fn id_suffix(len: usize) -> String {
    const CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// Attachment storage over plain HTTP: the body is PUT to
/// `<base>/<folder>/<file>` and that URL is the stored location.
pub struct HttpAttachmentStorage {
    base: Url,
    client: reqwest::blocking::Client,
}

impl HttpAttachmentStorage {
    pub fn new(base: Url) -> Self {
        Self { base, client: reqwest::blocking::Client::new() }
    }

    fn target(&self, folder_path: &str, file_name: &str) -> Result<Url, OverlayError> {
        let path = format!(
            "{}/{}/{}",
            self.base.path().trim_end_matches('/'),
            folder_path.trim_matches('/'),
            file_name
        );
        let mut url = self.base.clone();
        url.set_path(&path);
        Ok(url)
    }
}

impl AttachmentStorage for HttpAttachmentStorage {
    fn upload(
        &self,
        bytes: &[u8],
        folder_path: &str,
        file_name: &str,
    ) -> Result<String, OverlayError> {
        let url = self.target(folder_path, file_name)?;
        let response = self
            .client
            .put(url.clone())
            .body(bytes.to_vec())
            .send()
            .map_err(|e| OverlayError::Upload(format!("{file_name}: {e}")))?;
        if !response.status().is_success() {
            return Err(OverlayError::Upload(format!(
                "{file_name}: storage returned {}",
                response.status()
            )));
        }
        Ok(url.to_string())
    }
}

pub mod memory {
    //! In-memory collaborators, used by tests and the demo binary.

    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MemoryStorage {
        pub uploads: Mutex<Vec<(String, usize)>>,
        /// File names that fail with an `Upload` error.
        pub fail_names: Vec<String>,
    }

    impl AttachmentStorage for MemoryStorage {
        fn upload(
            &self,
            bytes: &[u8],
            folder_path: &str,
            file_name: &str,
        ) -> Result<String, OverlayError> {
            if self.fail_names.iter().any(|name| name == file_name) {
                return Err(OverlayError::Upload(format!("{file_name}: simulated failure")));
            }
            let url = format!("memory://{folder_path}/{file_name}");
            if let Ok(mut uploads) = self.uploads.lock() {
                uploads.push((url.clone(), bytes.len()));
            }
            Ok(url)
        }
    }

    #[derive(Default)]
    pub struct MemoryProvider {
        pub tags: Mutex<Vec<TagPayload>>,
        pub replies: Mutex<Vec<(String, String, Vec<StoredAttachment>)>>,
        pub notifications: Mutex<Vec<Notification>>,
        pub fail_persistence: bool,
    }

    impl NotificationProvider for MemoryProvider {
        fn create_tag(&self, payload: &TagPayload) -> Result<CreatedTag, OverlayError> {
            if self.fail_persistence {
                return Err(OverlayError::Persistence("simulated outage".into()));
            }
            if let Ok(mut tags) = self.tags.lock() {
                tags.push(payload.clone());
            }
            Ok(CreatedTag { id: payload.id.clone(), drawing_data: payload.drawing_data_url.clone() })
        }

        fn reply_to_notification(
            &self,
            notification_id: &str,
            comment: &str,
            attachments: &[StoredAttachment],
        ) -> Result<(), OverlayError> {
            if self.fail_persistence {
                return Err(OverlayError::Persistence("simulated outage".into()));
            }
            if let Ok(mut replies) = self.replies.lock() {
                replies.push((notification_id.to_string(), comment.to_string(), attachments.to_vec()));
            }
            Ok(())
        }

        fn get_conversation_notifications(
            &self,
            conversation_id: &str,
        ) -> Result<Vec<Notification>, OverlayError> {
            let notifications = self
                .notifications
                .lock()
                .map_err(|_| OverlayError::Persistence("notification store poisoned".into()))?;
            Ok(notifications
                .iter()
                .filter(|n| n.conversation_id.as_deref() == Some(conversation_id))
                .cloned()
                .collect())
        }

        fn mark_all_as_read(&self) -> Result<(), OverlayError> {
            let mut notifications = self
                .notifications
                .lock()
                .map_err(|_| OverlayError::Persistence("notification store poisoned".into()))?;
            for notification in notifications.iter_mut() {
                notification.read = true;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::{MemoryProvider, MemoryStorage};
    use super::{
        new_tag_id, AttachmentStorage, HttpAttachmentStorage, Notification, NotificationProvider,
    };
    use url::Url;

    #[test]
    fn tag_ids_carry_the_expected_shape() {
        let id = new_tag_id();
        assert!(id.starts_with("tag_"));
        let parts: Vec<&str> = id.splitn(3, '_').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 7);
    }

    #[test]
    fn http_storage_builds_nested_target_urls() {
        let storage = HttpAttachmentStorage::new(Url::parse("https://store.example/files").unwrap());
        let url = storage.target("tags/user_1/123", "note.webm").unwrap();
        assert_eq!(url.as_str(), "https://store.example/files/tags/user_1/123/note.webm");
    }

    #[test]
    fn memory_storage_records_uploads_and_fails_on_request() {
        let storage = MemoryStorage { fail_names: vec!["bad.png".into()], ..Default::default() };
        let url = storage.upload(b"abc", "tags/u/1", "ok.png").expect("upload");
        assert_eq!(url, "memory://tags/u/1/ok.png");
        assert!(storage.upload(b"abc", "tags/u/1", "bad.png").is_err());
        assert_eq!(storage.uploads.lock().unwrap().len(), 1);
    }

    #[test]
    fn memory_provider_filters_conversations_and_marks_read() {
        let provider = MemoryProvider::default();
        provider.notifications.lock().unwrap().extend([
            Notification {
                id: "1".into(),
                comment: "first".into(),
                sender_id: "s1".into(),
                sender_name: "Alice".into(),
                coords: None,
                conversation_id: Some("conv_1".into()),
                attachments: vec![],
                read: false,
                requires_approval: false,
                approval_status: None,
            },
            Notification {
                id: "2".into(),
                comment: "other".into(),
                sender_id: "s2".into(),
                sender_name: "Bob".into(),
                coords: None,
                conversation_id: Some("conv_2".into()),
                attachments: vec![],
                read: false,
                requires_approval: false,
                approval_status: None,
            },
        ]);

        let thread = provider.get_conversation_notifications("conv_1").expect("thread");
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].id, "1");

        provider.mark_all_as_read().expect("mark read");
        assert!(provider.notifications.lock().unwrap().iter().all(|n| n.read));
    }
}
