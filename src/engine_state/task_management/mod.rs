//! # Task Management System
//!
//! This module runs background work on a single dedicated worker thread and
//! hands results back to the main thread through a completion queue.
//!
//! ## Architecture Overview
//!
//! ```text
//!  main thread                                worker thread
//!  ───────────                                ─────────────
//!  publish_task(T) ──► submission channel ──► T::process()
//!  try_next_result() ◄── completion channel ◄──┘
//! ```
//!
//! - Both channels are FIFO; results come back in submission order.
//! - Ownership of a task's data moves with the task. The main thread cannot
//!   observe a task's buffers while the worker holds them.
//! - `try_next_result()` never blocks and yields at most one result per call,
//!   which lets callers throttle how much finished work they absorb per frame.
//!
//! ## Platform-Specific Behavior
//!
//! ### Native (Desktop) Implementation
//! - Uses `std::thread` with a named worker
//!
//! ### Web (WASM) Implementation
//! - Uses the `wasm_thread` crate, which backs the worker with a Web Worker
//!
//! ## Worker Lifecycle
//! The worker exits when the manager is dropped: dropping the submission
//! sender ends its receive loop.

pub mod task;

use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

use task::Task;

use crate::core::EngineError;

#[cfg(target_family = "wasm")]
mod wasm_imports {
    pub use wasm_thread as thread;
    pub use wasm_thread::JoinHandle;
}

#[cfg(target_family = "wasm")]
use self::wasm_imports::*;

#[cfg(not(target_family = "wasm"))]
use std::thread::{self, JoinHandle};

/// Owns the worker thread and both ends of its channels.
///
/// # Fields
/// - `task_sender`: Sends tasks from main thread to worker
/// - `result_receiver`: Receives task outputs from worker
/// - `num_tasks_in_flight`: Tasks published but not yet popped
/// - `_worker`: Handle to the worker thread
pub struct TaskManager<T: Task> {
    task_sender: Sender<T>,
    result_receiver: Receiver<T::Output>,
    num_tasks_in_flight: usize,
    _worker: JoinHandle<()>,
}

impl<T: Task> TaskManager<T> {
    /// Spawns the worker thread.
    ///
    /// # Arguments
    /// * `worker_name` - Thread name, visible in debuggers and panic messages
    ///
    /// # Returns
    /// `EngineError::WorkerSpawn` if the platform refuses to create the thread.
    pub fn new(worker_name: &str) -> Result<Self, EngineError> {
        let (task_tx, task_rx) = channel::<T>();
        let (result_tx, result_rx) = channel::<T::Output>();

        let task_closure = move || {
            while let Ok(task) = task_rx.recv() {
                let result = task.process();
                if result_tx.send(result).is_err() {
                    break;
                }
            }
        };

        let worker = thread::Builder::new()
            .name(worker_name.to_string())
            .spawn(task_closure)
            .map_err(EngineError::WorkerSpawn)?;

        log::info!("Spawned worker thread '{}'", worker_name);

        Ok(TaskManager {
            task_sender: task_tx,
            result_receiver: result_rx,
            num_tasks_in_flight: 0,
            _worker: worker,
        })
    }

    /// Queues a task for the worker. Never blocks.
    ///
    /// # Returns
    /// `EngineError::WorkerDisconnected` if the worker has exited.
    pub fn publish_task(&mut self, task: T) -> Result<(), EngineError> {
        self.task_sender
            .send(task)
            .map_err(|_| EngineError::WorkerDisconnected)?;
        self.num_tasks_in_flight += 1;
        Ok(())
    }

    /// Pops the oldest finished result, if one is ready.
    pub fn try_next_result(&mut self) -> Option<T::Output> {
        match self.result_receiver.try_recv() {
            Ok(result) => {
                self.num_tasks_in_flight -= 1;
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                if self.num_tasks_in_flight > 0 {
                    log::error!(
                        "Worker disconnected with {} task(s) in flight",
                        self.num_tasks_in_flight
                    );
                    self.num_tasks_in_flight = 0;
                }
                None
            }
        }
    }

    /// Waits up to `timeout` for the next result.
    ///
    /// Blocking; intended for start-up and shutdown, not the per-frame path.
    ///
    /// # Returns
    /// `Ok(None)` on timeout, `EngineError::WorkerDisconnected` if the worker is gone.
    pub fn wait_next_result(&mut self, timeout: Duration) -> Result<Option<T::Output>, EngineError> {
        match self.result_receiver.recv_timeout(timeout) {
            Ok(result) => {
                self.num_tasks_in_flight -= 1;
                Ok(Some(result))
            }
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(EngineError::WorkerDisconnected),
        }
    }

    /// Number of tasks published whose results have not been popped yet.
    pub fn tasks_in_flight(&self) -> usize {
        self.num_tasks_in_flight
    }
}
