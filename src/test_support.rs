//! Log output for tests.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Route `tracing` events through the test harness writer so they show up
/// next to a failing test. `RUST_LOG` overrides the default level.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("preview_native=debug"));
        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_test_writer().with_target(false))
            .with(filter)
            .try_init();
    });
}
