use crate::state::RunState;
use anyhow::Result;
use serde_json::Value;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

pub type BoxFuture<'a, T> = std::pin::Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a step hands back to the runner: the successor state plus the
/// value recorded under the step's name once it is marked completed.
#[derive(Debug)]
pub struct StepOutput {
    /// The state the next step will receive.
    pub state: RunState,
    /// The value recorded in `Completed { result }` for this step.
    pub result: Value,
}

impl StepOutput {
    /// Successor state with no recorded result.
    pub fn new(state: RunState) -> Self {
        Self {
            state,
            result: Value::Null,
        }
    }

    /// Successor state with a result recorded under the step's name.
    pub fn with_result(state: RunState, result: Value) -> Self {
        Self { state, result }
    }
}

/// A single named unit of work within a run.
///
/// A step takes the current state by value and returns the successor
/// state. The runner guarantees a step is never invoked again for the
/// same run once it is marked completed, so a step only needs to be
/// idempotent with respect to its own partial effects.
pub trait Step: Send + Sync {
    fn run(&self, state: RunState) -> BoxFuture<'static, Result<StepOutput>>;
}

/// Internal wrapper that implements Step for async functions.
struct StepFnWrapper<F, Fut> {
    func: Arc<F>,
    _phantom: PhantomData<fn() -> Fut>,
}

impl<F, Fut, E> Step for StepFnWrapper<F, Fut>
where
    F: Fn(RunState) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<StepOutput, E>> + Send + 'static,
    E: Into<anyhow::Error> + 'static,
{
    fn run(&self, state: RunState) -> BoxFuture<'static, Result<StepOutput>> {
        let func = Arc::clone(&self.func);
        Box::pin(async move { func(state).await.map_err(Into::into) })
    }
}

/// Create a [`Step`] from any async function.
///
/// The function can return any `Result<StepOutput, E>` where `E` can be
/// converted to `anyhow::Error`.
///
/// # Example
/// ```
/// use masar_core::state::RunState;
/// use masar_core::step::{StepOutput, fn_step};
///
/// let _step = fn_step(|mut state: RunState| async move {
///     state.set("records", 100)?;
///     Ok::<_, anyhow::Error>(StepOutput::new(state))
/// });
/// ```
pub fn fn_step<F, Fut, E>(func: F) -> impl Step + 'static
where
    F: Fn(RunState) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<StepOutput, E>> + Send + 'static,
    E: Into<anyhow::Error> + 'static,
{
    StepFnWrapper {
        func: Arc::new(func),
        _phantom: PhantomData,
    }
}
