//! Logging setup for binaries and tests.

use std::io::Write;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialise the process-wide logger once; safe to call repeatedly.
///
/// Respects `RUST_LOG`, defaulting to `info` for this crate.
pub fn init() {
    INIT.call_once(|| {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format(|buf, record| {
                writeln!(buf, "[{}] {}", record.level(), record.args())
            })
            .init();
    });
}
