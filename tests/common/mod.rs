#![allow(dead_code)]

pub use smokerun_test_utils::builders;
pub use smokerun_test_utils::scripted_runner;
pub use smokerun_test_utils::{init_tracing, with_timeout};

use std::path::PathBuf;

/// Path to a file under the repository's `configs/` directory.
pub fn config_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("configs")
        .join(name)
}
