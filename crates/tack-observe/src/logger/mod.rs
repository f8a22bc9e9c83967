//! Process-wide `tracing` setup for the worker, driven by the `[log]` config section.

mod config;
mod error;
mod format;
mod log;

pub use config::LoggerConfig;
pub use error::LoggerError;
pub use format::LoggerFormat;

/// Install the global subscriber described by `cfg`.
///
/// Fails with [`LoggerError::AlreadyInitialized`] on a second call, and with
/// [`LoggerError::InvalidLogLevel`] when `cfg.level` is not a valid filter directive.
pub fn logger_init(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    let installed = match cfg.format {
        LoggerFormat::Text => log::Logger::text(cfg),
        LoggerFormat::Json => log::Logger::json(cfg),
        LoggerFormat::Journald => log::Logger::journald(cfg),
    };
    if installed.is_ok() {
        tracing::debug!(format = ?cfg.format, level = %cfg.level, "logger installed");
    }
    installed
}
