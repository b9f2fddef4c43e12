//! Interrupt-and-resume walkthrough against a filesystem store.
//!
//! Usage:
//!   cargo run --example resume            # start a new run
//!   cargo run --example resume -- <id>    # resume a previous run
//!
//! Interrupt the first invocation (Ctrl+C during the processing step),
//! then rerun with the printed id: completed phases are skipped and
//! execution continues from the first unfinished one.

use masar_core::{RunId, RunState, StepOutput, StepSequence};
use masar_persistence::FsStore;
use masar_runtime::StepRunner;
use serde_json::json;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("masar_runtime=debug")),
        )
        .init();

    let steps = StepSequence::builder()
        .then("collect", |mut state: RunState| async move {
            println!("[collect] gathering records...");
            tokio::time::sleep(Duration::from_secs(1)).await;
            state.set("records", 100)?;
            Ok::<_, anyhow::Error>(StepOutput::with_result(state, json!(100)))
        })
        .then("validate", |mut state: RunState| async move {
            println!("[validate] checking quality...");
            tokio::time::sleep(Duration::from_secs(1)).await;
            state.set("quality_score", 0.95)?;
            Ok::<_, anyhow::Error>(StepOutput::with_result(state, json!(0.95)))
        })
        .then("process", |mut state: RunState| async move {
            for batch in 1..=3 {
                println!("[process] batch {batch}/3...");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
            state.set("processed", true)?;
            Ok::<_, anyhow::Error>(StepOutput::new(state))
        })
        .then("report", |state: RunState| async move {
            let records = state.get("records").cloned().unwrap_or_default();
            let quality = state.get("quality_score").cloned().unwrap_or_default();
            let summary = json!({ "records": records, "quality_score": quality });
            println!("[report] {summary}");
            Ok::<_, anyhow::Error>(StepOutput::with_result(state, summary))
        })
        .build()?;

    let runner = StepRunner::new(FsStore::new("./runs"));

    let state = match std::env::args().nth(1) {
        Some(id) => {
            let run_id = RunId::new(id);
            println!("resuming run {run_id}");
            runner.resume(run_id, &steps).await?
        }
        None => {
            let run_id = RunId::generate();
            println!("starting run {run_id} (rerun with this id to resume)");
            runner
                .run(run_id.clone(), &steps, RunState::new(run_id.clone()))
                .await?
        }
    };

    println!(
        "run {} finished: {}/{} steps completed",
        state.run_id(),
        state.completed_steps(),
        steps.len()
    );
    Ok(())
}
