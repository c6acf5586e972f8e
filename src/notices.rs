use chrono::Local;
use once_cell::sync::Lazy;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

pub const NOTICE_LOG_FILE: &str = "notices.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

/// A transient user-facing message. The headless layer queues notices; the
/// GUI drains them into toasts once per frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

static QUEUE: Lazy<Mutex<Vec<Notice>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub fn push(kind: NoticeKind, text: impl Into<String>) {
    let notice = Notice { kind, text: text.into() };
    append_notice_log(&notice.text);
    if let Ok(mut queue) = QUEUE.lock() {
        queue.push(notice);
    }
}

pub fn push_info(text: impl Into<String>) {
    push(NoticeKind::Info, text);
}

pub fn push_success(text: impl Into<String>) {
    push(NoticeKind::Success, text);
}

pub fn push_error(text: impl Into<String>) {
    push(NoticeKind::Error, text);
}

/// Take every pending notice, oldest first.
pub fn drain() -> Vec<Notice> {
    QUEUE.lock().map(|mut queue| std::mem::take(&mut *queue)).unwrap_or_default()
}

fn append_notice_log(msg: &str) {
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(NOTICE_LOG_FILE)
    {
        let _ = writeln!(file, "{} - {}", Local::now().to_rfc3339(), msg);
    }
}

#[cfg(test)]
mod tests {
    use super::{drain, push_error, push_success, NoticeKind};
    use serial_test::serial;

    #[test]
    #[serial]
    fn drain_returns_notices_in_push_order_and_empties_the_queue() {
        let _ = drain();
        push_success("tag saved");
        push_error("upload failed");

        let notices = drain();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].kind, NoticeKind::Success);
        assert_eq!(notices[0].text, "tag saved");
        assert_eq!(notices[1].kind, NoticeKind::Error);

        assert!(drain().is_empty());
    }
}
