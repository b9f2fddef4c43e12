//! Ordered, named step sequences.
//!
//! A sequence is declared as a list of named function values applied in
//! order, built through [`SequenceBuilder`]. The declared order is the
//! execution order; the runner persists state between entries and skips
//! entries a previous invocation already completed.

use crate::error::SequenceError;
use crate::state::RunState;
use crate::step::{Step, StepOutput, fn_step};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

/// An ordered sequence of named steps.
///
/// # Example
///
/// ```
/// use masar_core::sequence::StepSequence;
/// use masar_core::state::RunState;
/// use masar_core::step::StepOutput;
///
/// let steps = StepSequence::builder()
///     .then("collect", |mut state: RunState| async move {
///         state.set("records", 100)?;
///         Ok::<_, anyhow::Error>(StepOutput::new(state))
///     })
///     .then("process", |state: RunState| async move {
///         Ok::<_, anyhow::Error>(StepOutput::new(state))
///     })
///     .build()?;
/// assert_eq!(steps.len(), 2);
/// # Ok::<(), masar_core::error::SequenceError>(())
/// ```
pub struct StepSequence {
    steps: Vec<(String, Arc<dyn Step>)>,
    hash: String,
}

impl StepSequence {
    /// Start declaring a sequence.
    pub fn builder() -> SequenceBuilder {
        SequenceBuilder { steps: Vec::new() }
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if the sequence is empty. Always false for a built sequence.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Check if a step name is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.steps.iter().any(|(n, _)| n == name)
    }

    /// Iterate step names in execution order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|(name, _)| name.as_str())
    }

    /// Iterate `(name, step)` pairs in execution order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn Step)> {
        self.steps
            .iter()
            .map(|(name, step)| (name.as_str(), step.as_ref()))
    }

    /// Deterministic hash over the ordered step names.
    ///
    /// Recorded into the run state on first execution and validated on
    /// resume, so a persisted run cannot silently continue under a
    /// different sequence.
    pub fn hash(&self) -> &str {
        &self.hash
    }
}

fn names_hash(steps: &[(String, Arc<dyn Step>)]) -> String {
    let mut hash: u64 = 5381;
    for (name, _) in steps {
        for byte in name.as_bytes() {
            hash = hash.wrapping_mul(33).wrapping_add(*byte as u64);
        }
        // separator so renames across name boundaries change the hash
        hash = hash.wrapping_mul(33).wrapping_add(0x1e);
    }
    format!("{hash:016x}")
}

/// Builder for [`StepSequence`].
pub struct SequenceBuilder {
    steps: Vec<(String, Arc<dyn Step>)>,
}

impl SequenceBuilder {
    /// Append a closure as the next step.
    pub fn then<F, Fut, E>(self, name: &str, func: F) -> Self
    where
        F: Fn(RunState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<StepOutput, E>> + Send + 'static,
        E: Into<anyhow::Error> + 'static,
    {
        self.step(name, fn_step(func))
    }

    /// Append a [`Step`] implementation as the next step.
    pub fn step<S>(mut self, name: &str, step: S) -> Self
    where
        S: Step + 'static,
    {
        self.steps.push((name.to_string(), Arc::new(step)));
        self
    }

    /// Finish declaring the sequence.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::DuplicateStep` if two steps share a name,
    /// or `SequenceError::Empty` if no steps were declared.
    pub fn build(self) -> Result<StepSequence, SequenceError> {
        if self.steps.is_empty() {
            return Err(SequenceError::Empty);
        }
        let mut seen = HashSet::new();
        for (name, _) in &self.steps {
            if !seen.insert(name.as_str()) {
                return Err(SequenceError::DuplicateStep(name.clone()));
            }
        }
        let hash = names_hash(&self.steps);
        Ok(StepSequence {
            steps: self.steps,
            hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> impl Step + 'static {
        fn_step(|state: RunState| async move { Ok::<_, anyhow::Error>(StepOutput::new(state)) })
    }

    #[test]
    fn declared_order_is_preserved() {
        let steps = StepSequence::builder()
            .step("a", noop())
            .step("b", noop())
            .step("c", noop())
            .build()
            .unwrap();

        let names: Vec<_> = steps.names().collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(steps.contains("b"));
        assert!(!steps.contains("d"));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let result = StepSequence::builder()
            .step("a", noop())
            .step("a", noop())
            .build();

        assert!(matches!(result, Err(SequenceError::DuplicateStep(name)) if name == "a"));
    }

    #[test]
    fn empty_sequence_is_rejected() {
        assert!(matches!(
            StepSequence::builder().build(),
            Err(SequenceError::Empty)
        ));
    }

    #[test]
    fn hash_is_deterministic() {
        let one = StepSequence::builder()
            .step("a", noop())
            .step("b", noop())
            .build()
            .unwrap();
        let two = StepSequence::builder()
            .step("a", noop())
            .step("b", noop())
            .build()
            .unwrap();

        assert_eq!(one.hash(), two.hash());
    }

    #[test]
    fn hash_depends_on_names_and_order() {
        let ab = StepSequence::builder()
            .step("a", noop())
            .step("b", noop())
            .build()
            .unwrap();
        let ba = StepSequence::builder()
            .step("b", noop())
            .step("a", noop())
            .build()
            .unwrap();
        let joined = StepSequence::builder().step("ab", noop()).build().unwrap();

        assert_ne!(ab.hash(), ba.hash());
        assert_ne!(ab.hash(), joined.hash());
    }
}
