use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialise logging. The default level is `info`; when debug logging is
/// enabled in the settings the level drops to `debug` and `RUST_LOG` may
/// override it. With debug logging off the filter is forced so a stray
/// `RUST_LOG` in the environment cannot produce verbose output.
pub fn init(debug: bool) {
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}

/// Like `init`, but also mirrors log lines into a daily-rolling file under
/// `dir`. The returned guard must stay alive for the writer to flush.
pub fn init_with_file(debug: bool, dir: &Path) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let level = if debug { "debug" } else { "info" };
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let appender = tracing_appender::rolling::daily(dir, "tag_overlay.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let initialised = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .is_ok();

    if initialised {
        Some(guard)
    } else {
        None
    }
}
