use flexi_logger::{Logger, LoggerHandle};

use crate::config::LoggingConfig;
use crate::error::AlertDeskError;

/// Starts the global logger. The returned handle must be kept alive for the
/// lifetime of the process.
pub fn init(logging: &LoggingConfig) -> Result<LoggerHandle, AlertDeskError> {
    Logger::try_with_str(logging.log_spec())
        .and_then(|logger| {
            logger
                .log_to_stderr()
                .format(flexi_logger::detailed_format)
                .start()
        })
        .map_err(|e| AlertDeskError::ConfigError(format!("Failed to start logger: {}", e)))
}
