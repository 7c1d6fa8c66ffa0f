use std::io::IsTerminal;
use std::path::Path;

use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Keeps the background log writer alive; drop it only at exit.
#[derive(Debug)]
pub struct TelemetryGuard {
    _guard: Option<WorkerGuard>,
}

/// Log to `<logs_dir>/<file_name>` and to stderr.
///
/// The file gets every event allowed by `RUST_LOG` (default `info`) in
/// `HH:MM:SS LEVEL message` form. Stderr only shows warnings unless
/// `verbose` is set.
pub fn init_tracing(logs_dir: &Path, file_name: &str, verbose: bool) -> TelemetryGuard {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_appender = tracing_appender::rolling::never(logs_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let installed = subscriber(
        non_blocking,
        env_filter,
        std::io::stderr,
        std::io::stderr().is_terminal(),
        verbose,
    )
    .try_init();

    match installed {
        Ok(()) => TelemetryGuard {
            _guard: Some(guard),
        },
        Err(_) => TelemetryGuard { _guard: None },
    }
}

/// Each layer carries its own filter so `RUST_LOG` never hides what `-v`
/// asks stderr to show.
fn subscriber<F, E>(
    file_writer: F,
    file_filter: EnvFilter,
    stderr_writer: E,
    stderr_ansi: bool,
    verbose: bool,
) -> impl Subscriber + Send + Sync + 'static
where
    F: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    E: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(false)
        .with_timer(ChronoLocal::new("%H:%M:%S".to_string()))
        .with_filter(file_filter);

    let stderr_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(stderr_writer)
        .with_ansi(stderr_ansi)
        .with_target(false)
        .without_time()
        .with_filter(stderr_level);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ApiClient;
    use crate::report::{Outcome, sample_test};
    use crate::testing::TestContext;
    use crate::testing::hooks::{LogReportHook, RunHook};
    use std::io;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tracing::{Level, debug, info, warn};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn buffers(verbose: bool) -> (SharedBuf, SharedBuf, impl Subscriber + Send + Sync + 'static) {
        let file = SharedBuf::default();
        let stderr = SharedBuf::default();
        let (file_writer, stderr_writer) = (file.clone(), stderr.clone());
        let subscriber = subscriber(
            move || file_writer.clone(),
            EnvFilter::new("info"),
            move || stderr_writer.clone(),
            false,
            verbose,
        );
        (file, stderr, subscriber)
    }

    /// `HH:MM:SS` followed by the padded level.
    fn split_timestamp(line: &str) -> (&str, &str) {
        let (time, rest) = line.split_at(8);
        (time, rest.trim_start())
    }

    #[test]
    fn verbose_mirrors_debug_to_stderr() {
        let (file, stderr, subscriber) = buffers(true);

        tracing::subscriber::with_default(subscriber, || {
            assert!(tracing::enabled!(Level::DEBUG));
            debug!("GET https://api.test/users");
        });

        assert!(stderr.contents().contains("GET https://api.test/users"));
        assert!(!file.contents().contains("GET https://api.test/users"));
    }

    #[test]
    fn quiet_stderr_only_shows_warnings() {
        let (file, stderr, subscriber) = buffers(false);

        tracing::subscriber::with_default(subscriber, || {
            debug!("request sent");
            info!("collected 5 tests");
            warn!("Could not capture screenshot");
        });

        let stderr = stderr.contents();
        assert!(!stderr.contains("request sent"));
        assert!(!stderr.contains("collected 5 tests"));
        assert!(stderr.contains("Could not capture screenshot"));
        assert!(file.contents().contains("collected 5 tests"));
    }

    #[test]
    fn file_lines_are_time_level_message_without_ansi() {
        let (file, _stderr, subscriber) = buffers(false);
        let client = ApiClient::new(Duration::from_secs(1), &[]).unwrap();
        let ctx = TestContext::new(
            "get_response_code",
            "users::GetUser::get_response_code",
            "https://api.test/",
            client,
            "reports",
            None,
        );
        let mut report = sample_test("users::GetUser::get_response_code", Outcome::Passed, &[]);

        tracing::subscriber::with_default(subscriber, || {
            LogReportHook.after_call(&ctx, &mut report);
        });

        let contents = file.contents();
        assert!(!contents.contains('\u{1b}'));
        let line = contents.lines().next().unwrap();
        let (time, rest) = split_timestamp(line);
        assert!(
            time.chars()
                .enumerate()
                .all(|(i, c)| if i == 2 || i == 5 { c == ':' } else { c.is_ascii_digit() }),
            "{line}"
        );
        assert_eq!(
            rest,
            "INFO Test 'users::GetUser::get_response_code' PASSED in 0.25s"
        );
    }

    #[test]
    fn init_writes_to_log_file_under_logs_dir() {
        let tmp = tempfile::tempdir().unwrap();

        let guard = init_tracing(tmp.path(), "history.log", false);
        info!("starting run against https://api.test/");
        drop(guard);

        let path = tmp.path().join("history.log");
        assert!(path.is_file());
        let contents = std::fs::read_to_string(path).unwrap();
        assert!(contents.contains("INFO starting run against https://api.test/"));
    }
}
