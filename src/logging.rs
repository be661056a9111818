use std::fs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Console + rolling-file logging. The file layer writes JSON lines under
/// `logs/` with daily rotation so pipeline runs stay auditable; the console
/// layer carries the operator-facing output.
pub fn init_logging() {
    let _ = fs::create_dir_all("logs");

    let file_appender = tracing_appender::rolling::daily("logs", "claims_etl.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("claims_etl=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_writer(file_writer))
        .with(fmt::layer().with_writer(std::io::stdout))
        .init();

    // The guard must outlive main so buffered file logs are flushed
    std::mem::forget(guard);
}
