//! provides logging helpers

use std::env;
use std::path::Path;

use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::filter::{self};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// Directory for rolling log files; logs go to stderr when unset.
pub const LOG_PATH_ENV_VAR: &str = "LOG_PATH";

const LOG_FILE_PREFIX: &str = "device-advertiser.log";

/// Builds the formatting layer, writing to a daily rolling file under `log_path`
/// when given and to stderr otherwise.
pub fn get_fmt_layer<S>(
    log_path: Option<impl AsRef<Path>>,
) -> (Box<dyn Layer<S> + Send + Sync>, Option<WorkerGuard>)
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    let env_filter = filter::EnvFilter::builder()
        .with_default_directive(filter::LevelFilter::INFO.into())
        .from_env_lossy();

    let appender = log_path.and_then(|path| {
        RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(LOG_FILE_PREFIX)
            .max_log_files(3)
            .build(path.as_ref())
            .map_err(|e| eprintln!("failed to create rolling file appender: {e}"))
            .ok()
    });

    match appender {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let fmt_layer = layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_filter(env_filter)
                .boxed();
            (fmt_layer, Some(guard))
        }
        None => {
            let fmt_layer = layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_filter(env_filter)
                .boxed();
            (fmt_layer, None)
        }
    }
}

/// initiate the global tracing subscriber
///
/// The returned guard must be held for the lifetime of the process when logging
/// to a file, otherwise buffered lines are lost on exit.
pub fn init() -> Option<WorkerGuard> {
    let log_path = env::var(LOG_PATH_ENV_VAR).ok();
    let (fmt_layer, guard) = get_fmt_layer(log_path);
    registry().with(fmt_layer).init();
    guard
}
