//! A single-value channel for returning a worker's result to its owner.
//!
//! Each channel has exactly one [`OneshotSender`] and one [`OneshotReceiver`].
//! The sender is consumed by [`send`](OneshotSender::send); dropping it without
//! sending (for example, because the worker panicked) resolves the receiver to
//! `None`, so a waiting owner always learns the outcome.
//!
//! The channel follows these state transitions:
//!
//! 1. Pending: waiting for the value
//! 2. Ready: the value has been sent and not yet taken
//! 3. Consumed: the value was taken, or the sender was dropped without sending

use std::{
    sync::{
        Arc, Condvar, Mutex,
        mpsc::{RecvTimeoutError, TryRecvError},
    },
    time::Duration,
};

/// Creates a new oneshot channel, returning a sender and receiver pair.
pub fn channel<T>() -> (OneshotSender<T>, OneshotReceiver<T>) {
    let cell = Arc::new(OneshotCell {
        state: Mutex::new(State::Pending),
        condvar: Condvar::new(),
    });
    (OneshotSender(Some(cell.clone())), OneshotReceiver(cell))
}

/// The sending half of a oneshot channel.
pub struct OneshotSender<T>(Option<Arc<OneshotCell<T>>>);

impl<T> OneshotSender<T> {
    /// Delivers `value` to the receiver.
    pub fn send(mut self, value: T) {
        if let Some(cell) = self.0.take() {
            cell.resolve(State::Ready(value));
        }
    }
}

impl<T> Drop for OneshotSender<T> {
    fn drop(&mut self) {
        if let Some(cell) = self.0.take() {
            cell.resolve(State::Consumed);
        }
    }
}

/// The receiving half of a oneshot channel.
pub struct OneshotReceiver<T>(Arc<OneshotCell<T>>);

impl<T> OneshotReceiver<T> {
    /// Blocks until the value arrives or the sender is dropped.
    ///
    /// Returns `None` if the sender was dropped without sending, or if the value
    /// has already been taken.
    pub fn recv(&self) -> Option<T> {
        let state = self.0.state.lock().unwrap();
        let mut state = self
            .0
            .condvar
            .wait_while(state, |state| state.is_pending())
            .unwrap();
        state.take()
    }

    /// Like [`recv`](Self::recv), but gives up after `timeout`.
    ///
    /// Returns `Err(RecvTimeoutError::Timeout)` if the channel is still pending.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<T>, RecvTimeoutError> {
        let state = self.0.state.lock().unwrap();
        let (mut state, res) = self
            .0
            .condvar
            .wait_timeout_while(state, timeout, |state| state.is_pending())
            .unwrap();
        if res.timed_out() && state.is_pending() {
            Err(RecvTimeoutError::Timeout)
        } else {
            Ok(state.take())
        }
    }

    /// Attempts to receive the value without blocking.
    ///
    /// Returns `Err(TryRecvError::Empty)` while the channel is pending.
    pub fn try_recv(&self) -> Result<Option<T>, TryRecvError> {
        let mut state = self.0.state.lock().unwrap();
        if state.is_pending() {
            Err(TryRecvError::Empty)
        } else {
            Ok(state.take())
        }
    }

    /// Returns `true` while neither a value nor a sender drop has been observed.
    pub fn is_pending(&self) -> bool {
        self.0.state.lock().unwrap().is_pending()
    }
}

struct OneshotCell<T> {
    state: Mutex<State<T>>,
    condvar: Condvar,
}

impl<T> OneshotCell<T> {
    fn resolve(&self, next: State<T>) {
        let mut state = self.state.lock().unwrap();
        if state.is_pending() {
            *state = next;
        }
        drop(state);
        self.condvar.notify_all();
    }
}

enum State<T> {
    Pending,
    Ready(T),
    Consumed,
}

impl<T> State<T> {
    fn is_pending(&self) -> bool {
        matches!(self, State::Pending)
    }

    /// Takes a ready value, leaving the state consumed. Must not be called
    /// while pending.
    fn take(&mut self) -> Option<T> {
        debug_assert!(!self.is_pending());
        match std::mem::replace(self, State::Consumed) {
            State::Ready(value) => Some(value),
            State::Pending | State::Consumed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::UnsafeCell, time::Duration};

    use crate::oneshot::{self, OneshotReceiver, OneshotSender};

    #[test]
    fn test_oneshot_send_sync() {
        fn is_send_sync<T: Send + Sync>() {}

        fn test<T: Send>() {
            is_send_sync::<OneshotReceiver<T>>();
            is_send_sync::<OneshotSender<T>>();
        }

        test::<usize>();
        test::<UnsafeCell<usize>>();
    }

    #[test]
    fn test_oneshot_basics() {
        let (tx, rx) = oneshot::channel::<i64>();
        assert!(rx.is_pending());
        assert!(rx.try_recv().is_err());
        tx.send(1);
        assert_eq!(rx.recv(), Some(1));
        assert_eq!(rx.recv(), None);

        let (tx, rx) = oneshot::channel::<i64>();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            tx.send(2);
        });
        assert!(rx.recv_timeout(Duration::from_millis(10)).is_err());
        assert!(rx.is_pending());
        assert_eq!(rx.recv(), Some(2));
    }

    #[test]
    fn test_oneshot_sender_dropped() {
        let (tx, rx) = oneshot::channel::<i64>();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            drop(tx);
        });
        assert_eq!(rx.recv(), None);
        assert!(!rx.is_pending());
        assert_eq!(rx.try_recv(), Ok(None));
    }

    #[test]
    fn test_oneshot_sender_panicked() {
        let (tx, rx) = oneshot::channel::<i64>();
        let worker = std::thread::spawn(move || {
            let _tx = tx;
            panic!("worker failure");
        });
        assert!(worker.join().is_err());
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(None));
    }
}
