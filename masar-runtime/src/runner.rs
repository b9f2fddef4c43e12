//! Durable step runner with checkpoint/resume functionality.
//!
//! The runner saves the run state after every step transition, enabling
//! recovery and resumption across process restarts.

use masar_core::id::RunId;
use masar_core::sequence::StepSequence;
use masar_core::state::RunState;
use masar_persistence::{RunStore, StoreError};
use std::sync::Arc;

/// Error type for runner invocations.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A step raised an error. The failure is persisted before this is
    /// returned, so invoking again with the same id retries the step.
    #[error("Run '{run_id}' failed at step '{step}': {source}")]
    RunFailed {
        run_id: RunId,
        step: String,
        #[source]
        source: anyhow::Error,
    },
    /// Strict resume was requested for an id with no persisted record.
    #[error("No persisted state for run '{0}'")]
    UnknownRun(RunId),
    /// The persisted record was produced by a different step sequence.
    #[error(
        "Step sequence mismatch for run '{run_id}': expected hash '{expected}', found '{found}'"
    )]
    SequenceMismatch {
        run_id: RunId,
        expected: String,
        found: String,
    },
    /// The store failed; durability of this invocation is unresolved.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Executes named step sequences with state persisted after every
/// transition.
///
/// Steps within one run execute strictly sequentially. Distinct run ids
/// are independent and may execute concurrently; concurrent invocations
/// with the *same* id are the caller's responsibility to prevent.
///
/// # Example
///
/// ```rust,ignore
/// use masar_core::{RunState, StepOutput, StepSequence};
/// use masar_persistence::InMemoryStore;
/// use masar_runtime::StepRunner;
///
/// let steps = StepSequence::builder()
///     .then("collect", |mut state: RunState| async move {
///         state.set("records", 100)?;
///         Ok::<_, anyhow::Error>(StepOutput::new(state))
///     })
///     .build()?;
///
/// let runner = StepRunner::new(InMemoryStore::new());
/// let state = runner.run("order-42", &steps, RunState::new("order-42")).await?;
///
/// // A later invocation with the same id skips completed steps.
/// let state = runner.resume("order-42", &steps).await?;
/// ```
pub struct StepRunner<S> {
    store: Arc<S>,
}

impl<S> StepRunner<S>
where
    S: RunStore,
{
    /// Create a new runner over the given store.
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Execute a run, starting fresh or continuing from a persisted record.
    ///
    /// If the store holds a record for `run_id`, execution continues from
    /// it and `initial` is discarded. Otherwise `initial` is rebound to
    /// `run_id`, persisted, and execution starts from the first step.
    ///
    /// # Errors
    ///
    /// Returns `RunnerError::RunFailed` when a step fails (the failure is
    /// persisted first), `RunnerError::SequenceMismatch` when the
    /// persisted record was produced by a different sequence, or
    /// `RunnerError::Store` on persistence failures.
    pub async fn run(
        &self,
        run_id: impl Into<RunId>,
        steps: &StepSequence,
        initial: RunState,
    ) -> Result<RunState, RunnerError> {
        let run_id = run_id.into();
        let state = match self.store.load(&run_id).await {
            Ok(state) => {
                Self::check_sequence(&run_id, &state, steps)?;
                tracing::debug!(run_id = %run_id, "Continuing from persisted state");
                state
            }
            Err(StoreError::NotFound(_)) => {
                let mut state = initial;
                state.set_run_id(run_id.clone());
                state.set_sequence_hash(steps.hash());
                for name in steps.names() {
                    state.register_step(name);
                }
                self.store.save(&state).await?;
                tracing::debug!(run_id = %run_id, steps = steps.len(), "Starting new run");
                state
            }
            Err(e) => return Err(e.into()),
        };
        self.drive(run_id, state, steps).await
    }

    /// Resume a previously-started run, strictly.
    ///
    /// Unlike [`run`](Self::run), an id with no persisted record is an
    /// error rather than a fresh start, so a mistyped id cannot silently
    /// re-execute work.
    ///
    /// # Errors
    ///
    /// Returns `RunnerError::UnknownRun` if no record exists for the id;
    /// otherwise as [`run`](Self::run).
    pub async fn resume(
        &self,
        run_id: impl Into<RunId>,
        steps: &StepSequence,
    ) -> Result<RunState, RunnerError> {
        let run_id = run_id.into();
        let state = match self.store.load(&run_id).await {
            Ok(state) => state,
            Err(StoreError::NotFound(_)) => return Err(RunnerError::UnknownRun(run_id)),
            Err(e) => return Err(e.into()),
        };
        Self::check_sequence(&run_id, &state, steps)?;
        tracing::debug!(
            run_id = %run_id,
            completed = state.completed_steps(),
            "Resuming run"
        );
        self.drive(run_id, state, steps).await
    }

    fn check_sequence(
        run_id: &RunId,
        state: &RunState,
        steps: &StepSequence,
    ) -> Result<(), RunnerError> {
        match state.sequence_hash() {
            Some(found) if found != steps.hash() => Err(RunnerError::SequenceMismatch {
                run_id: run_id.clone(),
                expected: steps.hash().to_string(),
                found: found.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Execute the remaining steps, persisting after each transition.
    async fn drive(
        &self,
        run_id: RunId,
        mut state: RunState,
        steps: &StepSequence,
    ) -> Result<RunState, RunnerError> {
        for (name, step) in steps.iter() {
            if state.step_completed(name) {
                tracing::debug!(run_id = %run_id, step = name, "Step already completed, skipping");
                continue;
            }

            tracing::debug!(run_id = %run_id, step = name, "Executing step");
            match step.run(state.clone()).await {
                Ok(output) => {
                    // Adopt the step's user data; outcomes stay runner-owned
                    // so a step cannot rewrite completed history.
                    state.data = output.state.data;
                    state.mark_completed(name, output.result);
                    self.store.save(&state).await?;
                }
                Err(e) => {
                    tracing::error!(run_id = %run_id, step = name, error = %e, "Step failed");
                    state.mark_failed(name, e.to_string());
                    self.store.save(&state).await?;
                    return Err(RunnerError::RunFailed {
                        run_id,
                        step: name.to_string(),
                        source: e,
                    });
                }
            }
        }

        tracing::info!(run_id = %run_id, "Run complete");
        Ok(state)
    }
}
