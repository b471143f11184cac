//! Process-wide logging setup shared by the binaries.

/// Initialize process-wide tracing, reading the output format from
/// `ROSTER_LOG_FORMAT`.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Subscriber configuration (filters, output format).
pub mod tracing;

pub use self::tracing::{LOG_FORMAT_ENV, LogFormat, init_with};
