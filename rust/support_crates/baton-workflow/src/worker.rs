//! Launching dedicated worker threads.
//!
//! Unlike `std::thread::spawn`, [`spawn_named`] does not panic when the OS
//! refuses to create a thread; the failure is returned to the caller, who is
//! expected to unwind whatever it has already set up.

use std::{io, thread};

use crate::{join_handle::JoinHandle, oneshot};

/// Options for launching a worker thread.
#[derive(Debug, Clone, Default)]
pub struct WorkerOptions {
    /// Thread name. An empty name leaves the thread unnamed.
    pub name: String,
    /// Stack size in bytes. `None` uses the platform default.
    pub stack_size: Option<usize>,
}

impl WorkerOptions {
    pub fn named(name: impl Into<String>) -> WorkerOptions {
        WorkerOptions {
            name: name.into(),
            stack_size: None,
        }
    }

    pub fn with_stack_size(mut self, stack_size: Option<usize>) -> WorkerOptions {
        self.stack_size = stack_size;
        self
    }
}

/// Runs `f` on a new thread named `name` and returns a handle to its result.
pub fn spawn_named<F, R>(name: impl Into<String>, f: F) -> io::Result<JoinHandle<R>>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    spawn_with(WorkerOptions::named(name), f)
}

/// Runs `f` on a new thread configured by `options` and returns a handle to
/// its result.
///
/// If `f` panics, the handle resolves to `None`.
pub fn spawn_with<F, R>(options: WorkerOptions, f: F) -> io::Result<JoinHandle<R>>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let (tx_result, rx_result) = oneshot::channel::<R>();

    let mut builder = thread::Builder::new();
    if !options.name.is_empty() {
        builder = builder.name(options.name.clone());
    }
    if let Some(stack_size) = options.stack_size {
        builder = builder.stack_size(stack_size);
    }

    builder
        .spawn(move || tx_result.send(f()))
        .inspect_err(|e| log::debug!("failed to launch worker '{}': {e}", options.name))?;
    Ok(JoinHandle::new(rx_result))
}
