//! Tracing initialization for the API binary.

use tracing_subscriber::{
    fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Console logging with a compact format; `RUST_LOG` overrides the default
/// filter.
pub fn init_telemetry() {
    let console_fmt = tracing_subscriber::fmt::layer()
        .event_format(Format::default().compact().with_target(false));
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vodcast=debug,tower_http=debug".into()),
        )
        .with(console_fmt)
        .init();
}
