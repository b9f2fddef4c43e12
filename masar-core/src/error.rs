//! Error types for masar-core.

/// Errors raised while building a step sequence.
#[derive(Debug)]
pub enum SequenceError {
    /// A duplicate step name was found during sequence building.
    DuplicateStep(String),
    /// The sequence contains no steps.
    Empty,
}

impl std::fmt::Display for SequenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SequenceError::DuplicateStep(name) => write!(f, "Duplicate step name: '{}'", name),
            SequenceError::Empty => write!(f, "Sequence must contain at least one step"),
        }
    }
}

impl std::error::Error for SequenceError {}
