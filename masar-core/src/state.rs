//! Run state: per-step outcomes plus the run's accumulated data.
//!
//! A `RunState` is the persisted record for one run. The runner writes it
//! back to the store after every step transition, so a later invocation
//! with the same `RunId` can pick up where the previous one stopped.

use crate::id::RunId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Outcome of a single named step within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StepOutcome {
    /// The step has not run yet.
    Pending,
    /// The step finished; its recorded result is retained across resumes.
    Completed { result: Value },
    /// The step raised an error; it re-executes on the next invocation.
    Failed { error: String },
}

impl StepOutcome {
    /// Check if this outcome is `Completed`.
    pub fn is_completed(&self) -> bool {
        matches!(self, StepOutcome::Completed { .. })
    }

    /// Check if this outcome is `Failed`.
    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed { .. })
    }
}

/// The complete persisted state of one durable run.
///
/// Holds the outcome of every declared step alongside arbitrary
/// user-defined fields in [`RunState::data`]. A `Completed` outcome is
/// final: the transition guards below never overwrite one, so re-running
/// a finished step is structurally impossible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    run_id: RunId,
    sequence_hash: Option<String>,
    steps: HashMap<String, StepOutcome>,
    /// User-defined fields accumulated by the steps.
    pub data: Map<String, Value>,
    /// When this state was first created.
    pub created_at: DateTime<Utc>,
    /// When this state was last mutated.
    pub updated_at: DateTime<Utc>,
}

impl RunState {
    /// Create a fresh state for a run.
    pub fn new(run_id: impl Into<RunId>) -> Self {
        let now = Utc::now();
        Self {
            run_id: run_id.into(),
            sequence_hash: None,
            steps: HashMap::new(),
            data: Map::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The id this state is persisted under.
    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// Rebind this state to a run id.
    ///
    /// Used when an initial state template is submitted under a
    /// caller-chosen id that differs from the one it was built with.
    pub fn set_run_id(&mut self, run_id: RunId) {
        self.run_id = run_id;
    }

    /// Hash of the step sequence this state was produced by, if any.
    pub fn sequence_hash(&self) -> Option<&str> {
        self.sequence_hash.as_deref()
    }

    /// Record the hash of the step sequence driving this run.
    pub fn set_sequence_hash(&mut self, hash: impl Into<String>) {
        self.sequence_hash = Some(hash.into());
    }

    /// Set a user-defined field.
    pub fn set(&mut self, key: impl Into<String>, value: impl Serialize) -> serde_json::Result<()> {
        let value = serde_json::to_value(value)?;
        self.data.insert(key.into(), value);
        self.touch();
        Ok(())
    }

    /// Get a user-defined field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Register a step as `Pending` if it has no outcome yet.
    pub fn register_step(&mut self, step: &str) {
        if !self.steps.contains_key(step) {
            self.steps.insert(step.to_string(), StepOutcome::Pending);
            self.touch();
        }
    }

    /// Get the outcome of a step, if it is known to this run.
    pub fn outcome(&self, step: &str) -> Option<&StepOutcome> {
        self.steps.get(step)
    }

    /// Check if a step has completed.
    pub fn step_completed(&self, step: &str) -> bool {
        self.steps.get(step).is_some_and(StepOutcome::is_completed)
    }

    /// Get the recorded result of a completed step, if available.
    pub fn result_of(&self, step: &str) -> Option<&Value> {
        match self.steps.get(step) {
            Some(StepOutcome::Completed { result }) => Some(result),
            _ => None,
        }
    }

    /// Mark a step as completed and record its result.
    ///
    /// A step that is already `Completed` keeps its original result;
    /// only `Pending` and `Failed` steps transition.
    pub fn mark_completed(&mut self, step: &str, result: Value) {
        if self.step_completed(step) {
            return;
        }
        self.steps
            .insert(step.to_string(), StepOutcome::Completed { result });
        self.touch();
    }

    /// Mark a step as failed and record the error.
    ///
    /// A `Completed` step never transitions back to `Failed`.
    pub fn mark_failed(&mut self, step: &str, error: impl Into<String>) {
        if self.step_completed(step) {
            return;
        }
        self.steps.insert(
            step.to_string(),
            StepOutcome::Failed {
                error: error.into(),
            },
        );
        self.touch();
    }

    /// Number of completed steps.
    pub fn completed_steps(&self) -> usize {
        self.steps.values().filter(|o| o.is_completed()).count()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
