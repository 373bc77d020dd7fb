//! # Stage
//!
//! What a [`Coordinator`](crate::Coordinator) needs to know about one step
//! of the pipeline: how to capture an immutable input from the current
//! state, how to compute the output from it on a worker thread, and what a
//! failed output looks like.

/// One pipeline step.
///
/// `capture` runs on the control thread and must copy (or `Arc`-share)
/// everything the worker reads; `run` gets nothing else.
pub trait Stage: 'static {
    /// State the stage captures its input from.
    type Context: ?Sized;
    /// Immutable input handed to the worker.
    type Input: Send + 'static;
    /// Published result.
    type Output: Send + Sync + 'static;

    /// Name used in logs and failure messages.
    const NAME: &'static str;

    /// Captures the input, or `None` when the stage has nothing to work on.
    fn capture(&self, context: &Self::Context) -> Option<Self::Input>;

    /// Computes the output. Runs on a worker thread.
    fn run(input: Self::Input) -> Self::Output;

    /// Output published when the worker could not produce one.
    fn failed(message: String) -> Self::Output;

    /// Whether an output reports success.
    fn succeeded(output: &Self::Output) -> bool;
}
