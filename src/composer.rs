use crate::attachment::{AttachmentKind, BlobStore, PendingAttachment, PreviewSource};
use crate::capture::{CaptureBackend, CaptureKind, CaptureSession, MediaBlob};
use crate::draw::decode_data_url;
use crate::errors::OverlayError;
use crate::markers::TagMarker;
use crate::notices;
use crate::providers::{
    new_attachment_id, new_tag_id, AttachmentStorage, Notification, NotificationProvider,
    StaffMember, StoredAttachment, TagPayload,
};
use std::time::Instant;

pub const MAX_COMMENT_LENGTH: usize = 500;

/// Stable ids for the single-instance attachments the composer manages.
pub const AUDIO_PLACEHOLDER_ID: &str = "recorded_audio";
pub const SCREEN_PLACEHOLDER_ID: &str = "screen_capture";
pub const DRAWING_ATTACHMENT_ID: &str = "inline_drawing_annotation";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveProgress {
    Uploading,
    /// All uploads settled — roughly the halfway checkpoint.
    AttachmentsUploaded,
    Persisting,
    Complete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    pub tag_id: String,
    pub coords: (f32, f32),
    pub sketch_preview: Option<String>,
    pub is_reply: bool,
    pub dropped_uploads: usize,
    pub generation: u64,
}

impl SaveOutcome {
    /// Marker for a fresh (non-reply) tag; replies never emit one.
    pub fn marker(&self, now: Instant) -> Option<TagMarker> {
        if self.is_reply {
            return None;
        }
        Some(TagMarker {
            id: self.tag_id.clone(),
            x: self.coords.0,
            y: self.coords.1,
            placed_at: now,
            sketch_preview: self.sketch_preview.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyContext {
    pub conversation_id: String,
    pub reply_to_id: String,
}

#[derive(Debug, Clone)]
struct UploadItem {
    id: String,
    kind: AttachmentKind,
    file_name: String,
    bytes: Vec<u8>,
    remote_url: Option<String>,
}

/// An owned, ready-to-run save. Detached from the composer so the GUI can
/// run it on a worker thread; the composer applies the result only if its
/// generation still matches (a host close in between bumps it).
#[derive(Debug, Clone)]
pub struct SaveJob {
    tag_id: String,
    folder: String,
    items: Vec<UploadItem>,
    comment: String,
    staff_ids: Vec<String>,
    coords: (f32, f32),
    drawing_data_url: Option<String>,
    reply: Option<ReplyContext>,
    requires_approval: bool,
    user: CurrentUser,
    generation: u64,
}

impl SaveJob {
    /// Upload every pending attachment in parallel, then persist the tag.
    /// Individual upload failures drop that attachment and continue; a
    /// persistence failure aborts the whole save.
    pub fn run(
        self,
        storage: &dyn AttachmentStorage,
        provider: &dyn NotificationProvider,
        progress: &mut dyn FnMut(SaveProgress),
    ) -> Result<SaveOutcome, OverlayError> {
        progress(SaveProgress::Uploading);

        let folder = self.folder.as_str();
        let mut uploaded: Vec<(usize, Result<String, OverlayError>)> = Vec::new();
        std::thread::scope(|scope| {
            let mut handles = Vec::new();
            for (index, item) in self.items.iter().enumerate() {
                if item.remote_url.is_some() {
                    continue;
                }
                handles.push(scope.spawn(move || {
                    (index, storage.upload(&item.bytes, folder, &item.file_name))
                }));
            }
            for handle in handles {
                if let Ok(result) = handle.join() {
                    uploaded.push(result);
                }
            }
        });

        let mut dropped = 0usize;
        let mut stored = Vec::new();
        for (index, item) in self.items.iter().enumerate() {
            if let Some(url) = &item.remote_url {
                stored.push(StoredAttachment {
                    id: item.id.clone(),
                    kind: item.kind,
                    url: url.clone(),
                    file_name: item.file_name.clone(),
                });
                continue;
            }
            match uploaded.iter().find(|(i, _)| *i == index).map(|(_, r)| r) {
                Some(Ok(url)) => stored.push(StoredAttachment {
                    id: item.id.clone(),
                    kind: item.kind,
                    url: url.clone(),
                    file_name: item.file_name.clone(),
                }),
                Some(Err(err)) => {
                    dropped += 1;
                    tracing::warn!(file = %item.file_name, %err, "attachment dropped from save");
                    notices::push_error(format!("Failed to upload {}.", item.file_name));
                }
                None => {
                    dropped += 1;
                    tracing::warn!(file = %item.file_name, "upload worker vanished, dropping attachment");
                }
            }
        }
        progress(SaveProgress::AttachmentsUploaded);

        let payload = TagPayload {
            id: self.tag_id.clone(),
            creator_id: self.user.id.clone(),
            creator_name: self.user.name.clone(),
            comment: self.comment.clone(),
            tagged_staff_ids: self.staff_ids.clone(),
            attachments: stored.clone(),
            coords: self.coords,
            drawing_data_url: self.drawing_data_url.clone(),
            conversation_id: self.reply.as_ref().map(|r| r.conversation_id.clone()),
            reply_to_id: self.reply.as_ref().map(|r| r.reply_to_id.clone()),
            requires_approval: self.requires_approval,
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        progress(SaveProgress::Persisting);
        let tag_id = match &self.reply {
            Some(reply) => {
                provider.reply_to_notification(&reply.reply_to_id, &payload.comment, &stored)?;
                self.tag_id.clone()
            }
            None => provider.create_tag(&payload)?.id,
        };
        progress(SaveProgress::Complete);

        Ok(SaveOutcome {
            tag_id,
            coords: self.coords,
            sketch_preview: self.drawing_data_url.clone(),
            is_reply: self.reply.is_some(),
            dropped_uploads: dropped,
            generation: self.generation,
        })
    }
}

/// The in-progress state of one tag or reply. All teardown funnels through
/// `reset`, which revokes preview blobs and releases any open capture
/// session.
pub struct Composer {
    comment: String,
    selected_staff: Vec<StaffMember>,
    attachments: Vec<PendingAttachment>,
    requires_approval: bool,
    reply: Option<ReplyContext>,
    coords: Option<(f32, f32)>,
    drawing_data_url: Option<String>,
    validation_error: Option<String>,
    blobs: BlobStore,
    audio: CaptureSession,
    screen: CaptureSession,
    generation: u64,
}

impl Default for Composer {
    fn default() -> Self {
        Self {
            comment: String::new(),
            selected_staff: Vec::new(),
            attachments: Vec::new(),
            requires_approval: false,
            reply: None,
            coords: None,
            drawing_data_url: None,
            validation_error: None,
            blobs: BlobStore::default(),
            audio: CaptureSession::audio(),
            screen: CaptureSession::screen(),
            generation: 0,
        }
    }
}

impl Composer {
    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn selected_staff(&self) -> &[StaffMember] {
        &self.selected_staff
    }

    pub fn attachments(&self) -> &[PendingAttachment] {
        &self.attachments
    }

    pub fn validation_error(&self) -> Option<&str> {
        self.validation_error.as_deref()
    }

    pub fn is_reply(&self) -> bool {
        self.reply.is_some()
    }

    pub fn reply_context(&self) -> Option<&ReplyContext> {
        self.reply.as_ref()
    }

    pub fn coords(&self) -> Option<(f32, f32)> {
        self.coords
    }

    pub fn drawing_data_url(&self) -> Option<&str> {
        self.drawing_data_url.as_deref()
    }

    pub fn requires_approval(&self) -> bool {
        self.requires_approval
    }

    pub fn set_requires_approval(&mut self, value: bool) {
        self.requires_approval = value;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub fn recording_audio(&self) -> bool {
        self.audio.is_recording()
    }

    pub fn recording_screen(&self) -> bool {
        self.screen.is_recording()
    }

    /// Anchor the composer to the placement the popup opened at.
    pub fn open_at(&mut self, x: f32, y: f32) {
        self.coords = Some((x, y));
    }

    /// Override the screen-capture safety limit (settings). Ignored while a
    /// session is recording.
    pub fn set_screen_capture_limit(&mut self, limit: std::time::Duration) {
        if !self.screen.is_recording() {
            self.screen = CaptureSession::with_limit(CaptureKind::Screen, Some(limit));
        }
    }

    pub fn set_comment(&mut self, text: &str) {
        self.comment = text.chars().take(MAX_COMMENT_LENGTH).collect();
    }

    /// Toggle a staff member in or out of the mention set. Clears any prior
    /// validation error.
    pub fn select_staff(&mut self, member: &StaffMember) {
        self.validation_error = None;
        if let Some(index) = self.selected_staff.iter().position(|s| s.id == member.id) {
            self.selected_staff.remove(index);
        } else {
            self.selected_staff.push(member.clone());
        }
    }

    /// Staff matching the search term that are not yet selected.
    pub fn staff_candidates<'a>(
        &self,
        available: &'a [StaffMember],
        search: &str,
    ) -> Vec<&'a StaffMember> {
        let needle = search.to_lowercase();
        available
            .iter()
            .filter(|member| member.name.to_lowercase().contains(&needle))
            .filter(|member| !self.selected_staff.iter().any(|s| s.id == member.id))
            .collect()
    }

    pub fn add_image_attachment(&mut self, file_name: &str, bytes: Vec<u8>) {
        let preview = PreviewSource::LocalBlob(self.blobs.create(bytes.clone()));
        self.attachments.push(PendingAttachment {
            id: new_attachment_id(),
            kind: AttachmentKind::Image,
            file_name: file_name.to_string(),
            mime: "image/png".into(),
            bytes,
            preview,
            remote_url: None,
            placeholder: false,
        });
    }

    /// Attach the drawing engine's finished raster. A corrupt data URL
    /// aborts only this step.
    pub fn attach_drawing(&mut self, data_url: &str) -> Result<(), OverlayError> {
        let png = decode_data_url(data_url)?;
        self.remove_attachment_by_id(DRAWING_ATTACHMENT_ID);
        let preview = PreviewSource::LocalBlob(self.blobs.create(png.clone()));
        self.attachments.push(PendingAttachment {
            id: DRAWING_ATTACHMENT_ID.into(),
            kind: AttachmentKind::Drawing,
            file_name: "inline_annotation.png".into(),
            mime: "image/png".into(),
            bytes: png,
            preview,
            remote_url: None,
            placeholder: false,
        });
        self.drawing_data_url = Some(data_url.to_string());
        Ok(())
    }

    /// Remove by position: releases the local preview blob and, when the
    /// removed item was a recording placeholder, aborts that session.
    pub fn remove_attachment(&mut self, index: usize) -> Option<PendingAttachment> {
        if index >= self.attachments.len() {
            return None;
        }
        let attachment = self.attachments.remove(index);
        if let PreviewSource::LocalBlob(id) = attachment.preview {
            self.blobs.release(id);
        }
        match attachment.id.as_str() {
            AUDIO_PLACEHOLDER_ID => self.audio.abort(),
            SCREEN_PLACEHOLDER_ID => self.screen.abort(),
            DRAWING_ATTACHMENT_ID => self.drawing_data_url = None,
            _ => {}
        }
        Some(attachment)
    }

    pub fn remove_attachment_by_id(&mut self, id: &str) -> Option<PendingAttachment> {
        let index = self.attachments.iter().position(|a| a.id == id)?;
        self.remove_attachment(index)
    }

    /// Explicit microphone toggle: first call starts, second call stops and
    /// attaches the recording.
    pub fn toggle_audio(
        &mut self,
        backend: &mut dyn CaptureBackend,
        now: Instant,
    ) -> Result<(), OverlayError> {
        if self.audio.is_recording() {
            let blob = self.audio.stop(now);
            self.finish_recording(AUDIO_PLACEHOLDER_ID, blob);
            return Ok(());
        }
        self.remove_attachment_by_id(AUDIO_PLACEHOLDER_ID);
        self.start_session_with_placeholder(SessionSlot::Audio, backend, now)
    }

    /// Press-and-hold microphone entry.
    pub fn press_audio(
        &mut self,
        backend: &mut dyn CaptureBackend,
        now: Instant,
    ) -> Result<(), OverlayError> {
        if self.audio.is_recording() {
            return Ok(());
        }
        self.remove_attachment_by_id(AUDIO_PLACEHOLDER_ID);
        self.push_placeholder(SessionSlot::Audio);
        self.audio.press(backend, now).inspect_err(|_| {
            self.remove_attachment_by_id(AUDIO_PLACEHOLDER_ID);
        })
    }

    /// Release of a press-and-hold (or pointer leaving the button).
    pub fn release_audio(&mut self, now: Instant) {
        let blob = self.audio.release_hold(now);
        self.finish_recording(AUDIO_PLACEHOLDER_ID, blob);
    }

    pub fn start_screen_capture(
        &mut self,
        backend: &mut dyn CaptureBackend,
        now: Instant,
    ) -> Result<(), OverlayError> {
        if self.screen.is_recording() {
            return Ok(());
        }
        self.remove_attachment_by_id(SCREEN_PLACEHOLDER_ID);
        self.start_session_with_placeholder(SessionSlot::Screen, backend, now)
    }

    pub fn stop_screen_capture(&mut self, now: Instant) {
        let blob = self.screen.stop(now);
        self.finish_recording(SCREEN_PLACEHOLDER_ID, blob);
    }

    /// Periodic pump for both capture sessions. Auto-stops (deadline,
    /// OS-side revocation) attach their recording like an explicit stop;
    /// device errors drop the placeholder and surface a warning.
    pub fn tick_captures(&mut self, now: Instant) {
        match self.audio.tick(now) {
            Ok(Some(blob)) => self.finish_recording(AUDIO_PLACEHOLDER_ID, Some(blob)),
            Ok(None) => {}
            Err(err) => {
                self.remove_attachment_by_id(AUDIO_PLACEHOLDER_ID);
                notices::push_error(err.to_string());
            }
        }
        match self.screen.tick(now) {
            Ok(Some(blob)) => self.finish_recording(SCREEN_PLACEHOLDER_ID, Some(blob)),
            Ok(None) => {}
            Err(err) => {
                self.remove_attachment_by_id(SCREEN_PLACEHOLDER_ID);
                notices::push_error(err.to_string());
            }
        }
    }

    /// Pre-populate for a reply: reuse the conversation id (or synthesize
    /// one from the parent), seed the original sender when resolvable.
    pub fn reply_from_notification(
        &mut self,
        notification: &Notification,
        available_staff: &[StaffMember],
    ) {
        self.reset();
        self.reply = Some(ReplyContext {
            conversation_id: notification
                .conversation_id
                .clone()
                .unwrap_or_else(|| format!("conv_{}", notification.id)),
            reply_to_id: notification.id.clone(),
        });
        if let Some(sender) = available_staff.iter().find(|s| s.id == notification.sender_id) {
            self.selected_staff.push(sender.clone());
        }
        self.coords = notification.coords;
    }

    /// Validate and detach an owned save job. Leaves every field untouched;
    /// a failed validation only records the message for the popup to show.
    pub fn begin_save(&mut self, user: &CurrentUser) -> Result<SaveJob, OverlayError> {
        if self.selected_staff.is_empty() {
            let message = "Tag at least one staff member.".to_string();
            self.validation_error = Some(message.clone());
            return Err(OverlayError::Validation(message));
        }

        let items = self
            .attachments
            .iter()
            .filter(|a| !(a.placeholder && a.bytes.is_empty()))
            .map(|a| UploadItem {
                id: a.id.clone(),
                kind: a.kind,
                file_name: a.file_name.clone(),
                bytes: a.bytes.clone(),
                remote_url: a.remote_url.clone(),
            })
            .collect();

        Ok(SaveJob {
            tag_id: new_tag_id(),
            folder: format!(
                "tags/{}/{}",
                user.id,
                chrono::Utc::now().timestamp_millis()
            ),
            items,
            comment: self.comment.clone(),
            staff_ids: self.selected_staff.iter().map(|s| s.id.clone()).collect(),
            coords: self.coords.unwrap_or((0.0, 0.0)),
            drawing_data_url: self.drawing_data_url.clone(),
            reply: self.reply.clone(),
            requires_approval: self.requires_approval,
            user: user.clone(),
            generation: self.generation,
        })
    }

    /// Apply a finished save. Returns false — and leaves the composer alone —
    /// when the host closed in between and the result must be ignored.
    pub fn apply_save_success(&mut self, outcome: &SaveOutcome) -> bool {
        if outcome.generation != self.generation {
            tracing::debug!(tag = %outcome.tag_id, "ignoring save result from a closed panel");
            return false;
        }
        self.reset();
        true
    }

    /// Synchronous save: validate, upload in parallel, persist, reset.
    pub fn save(
        &mut self,
        storage: &dyn AttachmentStorage,
        provider: &dyn NotificationProvider,
        user: &CurrentUser,
        progress: &mut dyn FnMut(SaveProgress),
    ) -> Result<SaveOutcome, OverlayError> {
        let job = self.begin_save(user)?;
        let outcome = job.run(storage, provider, progress)?;
        self.apply_save_success(&outcome);
        Ok(outcome)
    }

    /// The single teardown path: clears every field, revokes local preview
    /// blobs, and releases any open capture hardware. Invoked on popup
    /// close, host-panel close and successful save.
    pub fn reset(&mut self) {
        self.comment.clear();
        self.selected_staff.clear();
        self.attachments.clear();
        self.requires_approval = false;
        self.reply = None;
        self.coords = None;
        self.drawing_data_url = None;
        self.validation_error = None;
        self.blobs.release_all();
        self.audio.abort();
        self.screen.abort();
    }

    /// Host panel closed: any in-flight save result is ignored from here on.
    pub fn host_closed(&mut self) {
        self.generation += 1;
        self.reset();
    }

    fn start_session_with_placeholder(
        &mut self,
        slot: SessionSlot,
        backend: &mut dyn CaptureBackend,
        now: Instant,
    ) -> Result<(), OverlayError> {
        self.push_placeholder(slot);
        let result = match slot {
            SessionSlot::Audio => self.audio.start(backend, now),
            SessionSlot::Screen => self.screen.start(backend, now),
        };
        result.inspect_err(|_| {
            self.remove_attachment_by_id(slot.placeholder_id());
        })
    }

    fn push_placeholder(&mut self, slot: SessionSlot) {
        self.attachments.push(PendingAttachment {
            id: slot.placeholder_id().into(),
            kind: slot.kind(),
            file_name: String::new(),
            mime: slot.mime().into(),
            bytes: Vec::new(),
            preview: PreviewSource::None,
            remote_url: None,
            placeholder: true,
        });
    }

    fn finish_recording(&mut self, placeholder_id: &str, blob: Option<MediaBlob>) {
        let Some(blob) = blob else {
            // Nothing captured; drop the placeholder so it cannot be saved.
            self.remove_attachment_by_id(placeholder_id);
            return;
        };
        let preview = if blob.mime.starts_with("image/") {
            PreviewSource::LocalBlob(self.blobs.create(blob.bytes.clone()))
        } else {
            PreviewSource::None
        };
        let kind = AttachmentKind::from_mime(blob.mime);
        if let Some(attachment) = self.attachments.iter_mut().find(|a| a.id == placeholder_id) {
            attachment.kind = kind;
            attachment.file_name = blob.file_name;
            attachment.mime = blob.mime.to_string();
            attachment.bytes = blob.bytes;
            attachment.preview = preview;
            attachment.placeholder = false;
        } else {
            self.attachments.push(PendingAttachment {
                id: placeholder_id.into(),
                kind,
                file_name: blob.file_name,
                mime: blob.mime.to_string(),
                bytes: blob.bytes,
                preview,
                remote_url: None,
                placeholder: false,
            });
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum SessionSlot {
    Audio,
    Screen,
}

impl SessionSlot {
    fn placeholder_id(self) -> &'static str {
        match self {
            Self::Audio => AUDIO_PLACEHOLDER_ID,
            Self::Screen => SCREEN_PLACEHOLDER_ID,
        }
    }

    fn kind(self) -> AttachmentKind {
        match self {
            Self::Audio => AttachmentKind::Audio,
            Self::Screen => AttachmentKind::Video,
        }
    }

    fn mime(self) -> &'static str {
        match self {
            Self::Audio => "audio/webm",
            Self::Screen => "video/webm",
        }
    }
}
