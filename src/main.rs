// src/main.rs

use smokerun::config::{default_config_path, load_and_validate};
use smokerun::{logging, run, RunState};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("smokerun error: {err:?}");
            std::process::exit(1);
        }
    }
}

/// Returns whether the suite ran to completion without failures.
async fn run_main() -> anyhow::Result<bool> {
    logging::init_logging(None)?;

    let config_path = default_config_path();
    let config = load_and_validate(&config_path)?;
    let status = run(config).await?;

    if !status.output.is_empty() {
        println!("{}", status.output);
    }

    Ok(status.state == RunState::Finished && status.progress.failed == 0)
}
