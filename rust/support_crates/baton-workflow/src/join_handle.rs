//! Handles for waiting on the result of a worker thread.
//!
//! A [`JoinHandle`] is backed by a [`oneshot`](crate::oneshot) receiver rather
//! than by `std::thread::JoinHandle`, which makes it possible to wait with a
//! deadline: an owner can give up on an unresponsive worker instead of blocking
//! forever.
//!
//! ## Lifecycle
//!
//! 1. **Created**: returned when the worker is launched
//! 2. **Pending**: the worker is still running
//! 3. **Ready**: the worker returned, or died without returning
//! 4. **Consumed**: the outcome was retrieved via [`join()`](JoinHandle::join)

use std::{sync::mpsc::RecvTimeoutError, time::Duration};

use crate::oneshot::OneshotReceiver;

/// A handle for waiting on a worker's result.
pub struct JoinHandle<R>(OneshotReceiver<R>);

impl<R> JoinHandle<R> {
    pub(crate) fn new(rx: OneshotReceiver<R>) -> JoinHandle<R> {
        JoinHandle(rx)
    }

    /// Checks without blocking whether the worker has finished.
    pub fn is_ready(&self) -> bool {
        !self.0.is_pending()
    }

    /// Waits for the worker to finish.
    ///
    /// Returns `None` if the worker terminated without producing a result
    /// (it panicked).
    pub fn join(self) -> Option<R> {
        self.0.recv()
    }

    /// Waits for the worker to finish, for at most `timeout`.
    ///
    /// On timeout the handle is returned to the caller along with the error, so
    /// the wait can be resumed later.
    pub fn join_timeout(self, timeout: Duration) -> Result<Option<R>, (Self, RecvTimeoutError)> {
        match self.0.recv_timeout(timeout) {
            Ok(res) => Ok(res),
            Err(e) => Err((self, e)),
        }
    }

    /// Waits for all handles and collects their outcomes in order.
    pub fn join_all(handles: impl IntoIterator<Item = JoinHandle<R>>) -> Vec<Option<R>> {
        handles.into_iter().map(|h| h.join()).collect()
    }
}
