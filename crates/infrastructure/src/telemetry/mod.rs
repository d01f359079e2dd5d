//! Logging infrastructure

mod logging;

pub use logging::{LogFormat, LoggingConfig, LoggingError, init_logging};
