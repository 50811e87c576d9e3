use tracing_subscriber::EnvFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable naming the log file prefix.
pub const LOG_ENV: &str = "COURSEWORK_LOG";

/// Initialize tracing with file output.
///
/// Logging is off unless `COURSEWORK_LOG` holds a path; a terminal screen
/// owns stdout and stderr, so nothing may be written there.  Levels follow
/// `RUST_LOG` and default to `info`.
///
/// Each process writes to `{path}.{timestamp}.{pid}` so concurrent demos
/// never share a file.  Returns the path in use, if any.
pub fn init_file_logging() -> Option<String> {
    let log_path = std::env::var(LOG_ENV).ok()?;
    let unique_path = format!(
        "{}.{}.{}",
        log_path,
        chrono::Utc::now().timestamp(),
        std::process::id()
    );

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let Ok(file) = std::fs::File::create(&unique_path) else {
        eprintln!("Warning: Failed to create log file: {unique_path}");
        return None;
    };

    let file_layer = fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(true)
        .with_level(true);

    // A subscriber installed earlier (a test harness, the host app) wins.
    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .ok()?;
    Some(unique_path)
}
