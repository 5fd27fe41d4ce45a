//! Utility module
//!
//! Reply log sinks and small formatting helpers used throughout the library.

pub mod log;

pub use self::log::{CsvFileLog, MemoryLog, ReplyLog, TracingLog};

/// Formats bytes as space-separated lowercase hex pairs
pub fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect::<Vec<_>>()
        .join(" ")
}
