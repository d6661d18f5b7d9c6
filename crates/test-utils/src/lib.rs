//! Shared helpers for smokerun's integration tests.
//!
//! - [`builders`]: `SupervisorConfig` with fast timings.
//! - [`scripted_runner`]: a fake runner backend that plays back scripted
//!   output instead of launching processes.

pub mod builders;
pub mod scripted_runner;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use smokerun::logging::LOG_ENV;
use tracing_subscriber::{fmt, EnvFilter};

static TRACING: Once = Once::new();

/// Upper bound for any single supervisor wait in tests.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Install a tracing subscriber that writes through the test harness, so
/// supervisor logs only show up for failing tests.
///
/// The filter comes from `RUST_LOG`, then `SMOKERUN_LOG` (the binary's own
/// variable), and defaults to `warn` to keep passing runs quiet.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_from_env(LOG_ENV))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Await `f`, failing the test if it takes longer than [`TEST_TIMEOUT`].
///
/// Every wait on a run goes through this, so a stuck run fails the test
/// instead of hanging it.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(TEST_TIMEOUT, f).await {
        Ok(value) => value,
        Err(_) => panic!("run did not settle within {TEST_TIMEOUT:?}"),
    }
}
