use std::sync::Arc;
use std::time::Instant;
use tag_overlay::attachment::PreviewSource;
use tag_overlay::composer::{Composer, CurrentUser};
use tag_overlay::errors::OverlayError;
use tag_overlay::providers::memory::{MemoryProvider, MemoryStorage};
use tag_overlay::providers::{Notification, StaffMember};

fn user() -> CurrentUser {
    CurrentUser { id: "user_1".into(), name: "Current User".into() }
}

fn alice() -> StaffMember {
    StaffMember { id: "staff_1".into(), name: "Alice Wonderland".into() }
}

#[test]
fn zero_staff_save_is_rejected_with_all_state_preserved() {
    let mut composer = Composer::default();
    composer.set_comment("important note");
    composer.add_image_attachment("evidence.png", vec![1, 2, 3, 4]);
    composer.open_at(400.0, 300.0);

    let storage = MemoryStorage::default();
    let provider = MemoryProvider::default();
    let err = composer.save(&storage, &provider, &user(), &mut |_| {}).unwrap_err();

    assert!(matches!(err, OverlayError::Validation(_)));
    assert_eq!(composer.comment(), "important note");
    assert_eq!(composer.attachments().len(), 1);
    assert!(composer.selected_staff().is_empty());
    assert!(storage.uploads.lock().unwrap().is_empty(), "no uploads before validation passes");
}

#[test]
fn reply_to_notification_42_synthesizes_conv_42_and_opens_at_its_coordinates() {
    let notification = Notification {
        id: "42".into(),
        comment: "original comment".into(),
        sender_id: "staff_1".into(),
        sender_name: "Alice Wonderland".into(),
        coords: Some((333.0, 444.0)),
        conversation_id: None,
        attachments: vec![],
        read: false,
        requires_approval: false,
        approval_status: None,
    };

    let mut composer = Composer::default();
    composer.reply_from_notification(&notification, &[alice()]);

    let reply = composer.reply_context().expect("reply context");
    assert_eq!(reply.conversation_id, "conv_42");
    assert_eq!(reply.reply_to_id, "42");
    assert_eq!(composer.coords(), Some((333.0, 444.0)));
    assert_eq!(composer.selected_staff()[0].id, "staff_1");
}

#[test]
fn save_uploads_in_parallel_and_tolerates_individual_failures() {
    let mut composer = Composer::default();
    composer.select_staff(&alice());
    composer.set_comment("mixed bag");
    for index in 0..6 {
        composer.add_image_attachment(&format!("file_{index}.png"), vec![index as u8; 8]);
    }

    let storage = MemoryStorage {
        fail_names: vec!["file_2.png".into(), "file_5.png".into()],
        ..Default::default()
    };
    let provider = MemoryProvider::default();
    let outcome = composer
        .save(&storage, &provider, &user(), &mut |_| {})
        .expect("save survives per-file failures");

    assert_eq!(outcome.dropped_uploads, 2);
    let tags = provider.tags.lock().unwrap();
    assert_eq!(tags[0].attachments.len(), 4);
    assert!(tags[0].attachments.iter().all(|a| !a.file_name.contains("file_2")));
    assert_eq!(storage.uploads.lock().unwrap().len(), 4);
}

#[test]
fn blob_previews_do_not_leak_through_save_or_removal() {
    let mut composer = Composer::default();
    composer.select_staff(&alice());
    composer.add_image_attachment("a.png", vec![1]);
    composer.add_image_attachment("b.png", vec![2]);
    assert_eq!(composer.blobs().live_count(), 2);

    let PreviewSource::LocalBlob(removed_blob) = composer.attachments()[0].preview else {
        panic!("image attachment should carry a local preview");
    };
    composer.remove_attachment(0);
    assert!(!composer.blobs().is_live(removed_blob));
    assert_eq!(composer.blobs().live_count(), 1);

    let storage = MemoryStorage::default();
    let provider = MemoryProvider::default();
    composer.save(&storage, &provider, &user(), &mut |_| {}).expect("save");
    assert_eq!(composer.blobs().live_count(), 0, "save teardown must revoke previews");
}

#[test]
fn save_job_results_are_shareable_across_threads() {
    let mut composer = Composer::default();
    composer.select_staff(&alice());
    composer.set_comment("threaded save");
    composer.open_at(10.0, 20.0);

    let storage: Arc<MemoryStorage> = Arc::new(MemoryStorage::default());
    let provider: Arc<MemoryProvider> = Arc::new(MemoryProvider::default());
    let job = composer.begin_save(&user()).expect("job");

    let storage_for_thread = Arc::clone(&storage);
    let provider_for_thread = Arc::clone(&provider);
    let handle = std::thread::spawn(move || {
        job.run(storage_for_thread.as_ref(), provider_for_thread.as_ref(), &mut |_| {})
    });
    let outcome = handle.join().expect("join").expect("save");

    assert!(composer.apply_save_success(&outcome));
    assert!(composer.comment().is_empty());
    assert!(outcome.marker(Instant::now()).is_some());
    assert_eq!(provider.tags.lock().unwrap().len(), 1);
}
