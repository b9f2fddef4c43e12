//! Durable step execution.
//!
//! Runs named step sequences against a persisted [`RunState`]: state is
//! saved after every step transition, completed steps are never
//! re-executed, and a run can be resumed by invoking again with the same
//! [`RunId`] after a crash or a step failure.

mod runner;

// Re-exports
pub use runner::{RunnerError, StepRunner};

pub use masar_core::{
    RunId, RunState, SequenceBuilder, Step, StepOutcome, StepOutput, StepSequence, fn_step,
};
pub use masar_persistence as persistence;
