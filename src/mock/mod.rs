//! ## Mock
//!
//! Test helpers

// -- logger

/// Install the test logger; later calls are no-ops
pub fn logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
