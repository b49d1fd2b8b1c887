//! Logging - tracing-subscriber on stderr so stdout stays machine-readable

use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    /// `METHANE_LOG_JSON=1` selects JSON lines
    pub fn from_env() -> Self {
        match std::env::var("METHANE_LOG_JSON").as_deref() {
            Ok("1") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

pub fn init_logging() { init_logging_with(LogFormat::from_env()) }

/// `RUST_LOG` filter, default `info`. A second call is a no-op.
pub fn init_logging_with(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt::Subscriber::builder().with_env_filter(env_filter).with_writer(std::io::stderr);
    let _ = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
}
