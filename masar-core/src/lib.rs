//! Core data model and step declaration for the masar durable step runner.
//!
//! A run is a named sequence of steps executed against a [`RunState`].
//! This crate defines the state record, the [`Step`] trait with its
//! closure adapter, and the [`StepSequence`] builder. Execution and
//! persistence live in `masar-runtime` and `masar-persistence`.

pub mod error;
pub mod id;
pub mod sequence;
pub mod state;
pub mod step;

pub use error::SequenceError;
pub use id::RunId;
pub use sequence::{SequenceBuilder, StepSequence};
pub use state::{RunState, StepOutcome};
pub use step::{BoxFuture, Step, StepOutput, fn_step};
