//! Logging utilities and structured logging support
//!
//! The crate logs through the `log` facade: build summaries at `debug`,
//! per-insert routing at `trace`, degenerate input at `warn`.

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system
///
/// Safe to call more than once; later calls are ignored.
pub fn init() {
    let _ = env_logger::builder().try_init();
}

/// Initialize logging for tests (captured by the test harness)
pub fn init_for_tests() {
    let _ = env_logger::builder().is_test(true).try_init();
}
