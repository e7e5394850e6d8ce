//! Logger set-up for the planner binaries
//!
//! Everything goes to stderr so stdout can carry protocol frames.

use std::time::Instant;

use log::{info, LevelFilter};
use thiserror::Error;

/// Environment variable selecting the minimum log level
pub const LOG_LEVEL_ENV: &str = "HIGHWAY_PLANNER_LOG";

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Unknown log level `{0}`")]
    InvalidLevel(String),

    #[error("An error occurred while setting up the logger: {0}")]
    FernInitError(#[from] log::SetLoggerError),
}

/// Log level from `HIGHWAY_PLANNER_LOG`, `default` when unset.
pub fn level_from_env(default: LevelFilter) -> Result<LevelFilter, LoggerInitError> {
    match std::env::var(LOG_LEVEL_ENV) {
        Ok(value) => parse_level(&value),
        Err(_) => Ok(default),
    }
}

/// Parse a level name such as `debug` or `WARN`
pub fn parse_level(value: &str) -> Result<LevelFilter, LoggerInitError> {
    value
        .trim()
        .parse::<LevelFilter>()
        .map_err(|_| LoggerInitError::InvalidLevel(value.to_string()))
}

/// Initialise the global logger.
///
/// Must only be called once per process.
pub fn logger_init(min_level: LevelFilter) -> Result<(), LoggerInitError> {
    let start = Instant::now();

    fern::Dispatch::new()
        .format(move |out, message, record| {
            let elapsed = start.elapsed().as_secs_f64();
            // Include the target for debug and trace output only
            if record.level() > log::Level::Info {
                out.finish(format_args!(
                    "[{:10.6} {}] {}: {}",
                    elapsed,
                    level_to_str(record.level()),
                    record.target(),
                    message
                ))
            } else {
                out.finish(format_args!(
                    "[{:10.6} {}] {}",
                    elapsed,
                    level_to_str(record.level()),
                    message
                ))
            }
        })
        .level(min_level)
        .chain(std::io::stderr())
        .apply()?;

    info!("Logging initialised at level {:?}", min_level);
    Ok(())
}

fn level_to_str(level: log::Level) -> &'static str {
    match level {
        log::Level::Trace => "TRC",
        log::Level::Debug => "DBG",
        log::Level::Info => "INF",
        log::Level::Warn => "WRN",
        log::Level::Error => "ERR",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug").unwrap(), LevelFilter::Debug);
        assert_eq!(parse_level(" WARN ").unwrap(), LevelFilter::Warn);
        assert!(matches!(parse_level("loud"), Err(LoggerInitError::InvalidLevel(_))));
    }
}
