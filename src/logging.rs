//! Logging setup. The bootstrap emits through the `log` facade; this wires
//! `env_logger` in as the sink.

/// Initialize the logger with `default_level` as the filter.
///
/// `RUST_LOG`, when set, replaces the default entirely.
pub(crate) fn init(default_level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();
}
