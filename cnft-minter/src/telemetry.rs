use std::sync::Once;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static INIT: Once = Once::new();

pub fn setup_telemetry() {
    INIT.call_once(|| {
        let file_appender = match RollingFileAppender::builder()
            .rotation(Rotation::HOURLY)
            .filename_prefix("cnft-minter")
            .filename_suffix("log")
            .max_log_files(48)
            .build("logs")
        {
            Ok(appender) => Some(appender),
            Err(e) => {
                eprintln!(
                    "Warning: Failed to create log file appender: {}. Logging to stdout only.",
                    e
                );
                None
            }
        };

        let stdout_env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let stdout_layer = fmt::Layer::new()
            .with_writer(std::io::stdout)
            .with_ansi(true)
            .with_filter(stdout_env_filter);

        match file_appender {
            Some(file_appender) => {
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
                let file_layer = fmt::Layer::new()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .with_filter(EnvFilter::new("info"));

                tracing_subscriber::registry()
                    .with(stdout_layer)
                    .with(file_layer)
                    .init();

                // The writer flushes until process exit.
                std::mem::forget(guard);
            }
            None => {
                tracing_subscriber::registry().with(stdout_layer).init();
            }
        }
    });
}
