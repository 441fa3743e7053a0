use anyhow::Result;
use couchboot::cli::{self, telemetry};
use std::time::Duration;

// Main function
fn main() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(async {
        let action = cli::start()?;

        let result = action.execute().await;

        telemetry::shutdown_tracer();

        result
    });

    // An interrupted prompt keeps its blocking thread until the terminal answers.
    runtime.shutdown_timeout(Duration::from_millis(250));

    result
}
