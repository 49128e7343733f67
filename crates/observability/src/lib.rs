//! Tracing and logging setup shared by the binaries.

pub mod tracing;

pub use crate::tracing::Format;

/// Initialize process-wide tracing with JSON output.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(Format::Json);
}

/// Initialize process-wide tracing with the given output format.
pub fn init_with(format: Format) {
    tracing::init(format);
}
