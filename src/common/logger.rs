//! Tracing subscriber setup

use tracing::level_filters::LevelFilter as Level;
use tracing_subscriber::filter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::prelude::*;

/// Initialize the logger with the default settings.
///
/// Protocol-level diagnostics from the request pipeline are emitted under
/// the `fuse_ll::fuse` target; everything else defaults to `DEBUG`.
#[inline]
pub fn init_logger() {
    let filter = filter::Targets::new()
        .with_target("fuse_ll::fuse", Level::INFO)
        .with_target("", Level::DEBUG);

    let layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .event_format(tracing_subscriber::fmt::format().pretty())
        .with_writer(std::io::stderr)
        .with_filter(filter);

    let subscriber = tracing_subscriber::Registry::default().with(layer);

    if cfg!(test) {
        let _: Result<(), tracing::subscriber::SetGlobalDefaultError> =
            tracing::subscriber::set_global_default(subscriber);
    } else {
        subscriber.init();
    }
}
