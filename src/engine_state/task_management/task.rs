//! # Task System Core Trait
//!
//! A `Task` is a self-contained unit of work that moves to the worker thread
//! by value, runs there, and sends its output back by value. Nothing is shared
//! between the two threads while a task is in flight.
//!
//! ## Task Lifecycle
//! 1. A `Task` is created on the main thread and published via `TaskManager::publish_task()`
//! 2. The task's `process()` method consumes it on the worker thread
//! 3. The output is queued on the completion channel
//! 4. The main thread pops outputs one at a time with `TaskManager::try_next_result()`

/// A unit of work executed on the worker thread.
///
/// # Implementation Guidelines
/// - Must own every piece of data it touches (`Send + 'static`)
/// - Should be coarse-grained; one task per chunk, not per voxel
/// - Must not block on the main thread
pub trait Task: Send + 'static {
    /// What the task hands back to the main thread.
    type Output: Send + 'static;

    /// Performs the work. Runs on the worker thread.
    fn process(self) -> Self::Output;
}
