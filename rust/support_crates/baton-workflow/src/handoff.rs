//! A closable, zero-capacity rendezvous point for passing values between threads.
//!
//! A [`HandoffPoint`] holds no values at rest. A sender deposits its value into a
//! single internal slot and then blocks until some receiver takes it, so a fast
//! producer can never run ahead of a slow consumer: every successful hand-off is
//! a meeting of exactly one sender and one receiver.
//!
//! ## Closure
//!
//! Any holder of the point may [`close`](HandoffPoint::close) it. Closing is
//! idempotent and wakes every blocked thread:
//!
//! - A receive on a closed, empty point returns [`Received::Closed`] instead of
//!   blocking. The result is a tagged value, never a default that could be
//!   confused with real data.
//! - A send whose value has not been taken fails with [`ClosedError`], which
//!   hands the value back to the caller.
//! - A value deposited before closure may still be drained by a receive that
//!   reaches the slot before its sender wakes up. The value is delivered exactly
//!   once: either a receiver drains it and the send returns `Ok(())`, or the
//!   sender reclaims it inside the `ClosedError`.
//!
//! [`send_and_close`](HandoffPoint::send_and_close) performs a final hand-off:
//! the point closes in the same critical section in which the value is taken,
//! so no other value can follow it.
//!
//! ## Thread Safety
//!
//! `HandoffPoint<T>` is `Send + Sync` when `T: Send`. Clones share the same
//! underlying point.

use std::{
    sync::{
        Arc, Condvar, Mutex,
        mpsc::{RecvTimeoutError, TryRecvError},
    },
    time::Duration,
};

/// The outcome of a receive operation on a [`HandoffPoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Received<T> {
    /// A value was handed off by a sender.
    Item(T),
    /// The point is closed and holds no deposited value.
    Closed,
}

impl<T> Received<T> {
    /// Converts the outcome into an `Option`, mapping closure to `None`.
    pub fn into_item(self) -> Option<T> {
        match self {
            Received::Item(value) => Some(value),
            Received::Closed => None,
        }
    }
}

/// Error returned by [`HandoffPoint::send`] when the point was closed before
/// the value could be deposited. The rejected value is handed back.
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct ClosedError<T>(pub T);

impl<T> ClosedError<T> {
    /// Returns the value that could not be sent.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::fmt::Debug for ClosedError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ClosedError(..)")
    }
}

impl<T> std::fmt::Display for ClosedError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("sending on a closed hand-off point")
    }
}

impl<T> std::error::Error for ClosedError<T> {}

/// A zero-capacity, closable rendezvous point.
///
/// See the [module documentation](self) for the hand-off and closure rules.
pub struct HandoffPoint<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for HandoffPoint<T> {
    /// Clones the handle. Both handles address the same point.
    fn clone(&self) -> Self {
        HandoffPoint {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for HandoffPoint<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HandoffPoint<T> {
    /// Creates a new, open hand-off point.
    pub fn new() -> Self {
        HandoffPoint {
            inner: Arc::new(Inner {
                state: Mutex::new(Slot {
                    item: None,
                    deposited: 0,
                    taken: 0,
                    close_after: None,
                    closed: false,
                }),
                filled: Condvar::new(),
                drained: Condvar::new(),
            }),
        }
    }

    /// Hands `value` to a receiver, blocking until one takes it.
    ///
    /// If another sender's value currently occupies the slot, this call first
    /// waits for that hand-off to complete. Returns `Err(ClosedError(value))` if
    /// the point is closed before a receiver takes the value.
    pub fn send(&self, value: T) -> Result<(), ClosedError<T>> {
        self.deposit(value, false)
    }

    /// Hands `value` to a receiver and closes the point at the moment the value
    /// is taken.
    ///
    /// No value can pass through the point after this one. Failure semantics are
    /// the same as for [`send`](Self::send).
    pub fn send_and_close(&self, value: T) -> Result<(), ClosedError<T>> {
        self.deposit(value, true)
    }

    /// Blocks until a value is handed off or the point is closed.
    ///
    /// A value deposited before closure is still delivered; `Received::Closed`
    /// is only returned once the point is both closed and empty.
    pub fn recv(&self) -> Received<T> {
        let mut state = self.inner.state.lock().unwrap();
        loop {
            if let Some(received) = self.take_locked(&mut state) {
                return received;
            }
            state = self.inner.filled.wait(state).unwrap();
        }
    }

    /// Like [`recv`](Self::recv), but gives up after `timeout`.
    ///
    /// Returns `Err(RecvTimeoutError::Timeout)` if the point is still open and
    /// empty when the timeout elapses.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Received<T>, RecvTimeoutError> {
        let state = self.inner.state.lock().unwrap();
        let (mut state, _) = self
            .inner
            .filled
            .wait_timeout_while(state, timeout, |slot| {
                slot.item.is_none() && !slot.closed
            })
            .unwrap();
        self.take_locked(&mut state)
            .ok_or(RecvTimeoutError::Timeout)
    }

    /// Attempts to receive without blocking.
    ///
    /// Returns `Err(TryRecvError::Empty)` if the point is open and no sender is
    /// currently waiting.
    pub fn try_recv(&self) -> Result<Received<T>, TryRecvError> {
        let mut state = self.inner.state.lock().unwrap();
        self.take_locked(&mut state).ok_or(TryRecvError::Empty)
    }

    /// Closes the point. Calling this more than once has no further effect.
    ///
    /// Wakes all blocked senders and receivers.
    pub fn close(&self) {
        let mut state = self.inner.state.lock().unwrap();
        if state.closed {
            return;
        }
        state.closed = true;
        drop(state);
        self.inner.filled.notify_all();
        self.inner.drained.notify_all();
    }

    /// Returns `true` if the point has been closed.
    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().unwrap().closed
    }

    fn deposit(&self, value: T, close_on_take: bool) -> Result<(), ClosedError<T>> {
        let mut state = self.inner.state.lock().unwrap();

        loop {
            if state.closed {
                return Err(ClosedError(value));
            }
            if state.item.is_none() {
                break;
            }
            // Another sender is mid hand-off.
            state = self.inner.drained.wait(state).unwrap();
        }

        state.item = Some(value);
        state.deposited += 1;
        let ticket = state.deposited;
        if close_on_take {
            state.close_after = Some(ticket);
        }
        self.inner.filled.notify_one();

        // Rendezvous: wait until our value is taken or the point closes.
        let mut state = self
            .inner
            .drained
            .wait_while(state, |slot| slot.taken < ticket && !slot.closed)
            .unwrap();
        if state.taken < ticket {
            // Closed with our value still in the slot.
            if let Some(value) = state.item.take() {
                drop(state);
                self.inner.drained.notify_all();
                return Err(ClosedError(value));
            }
        }
        Ok(())
    }

    /// Takes the deposited value or reports closure. Returns `None` if the point
    /// is open and empty.
    fn take_locked(&self, state: &mut Slot<T>) -> Option<Received<T>> {
        match state.item.take() {
            Some(value) => {
                state.taken += 1;
                if state.close_after == Some(state.taken) {
                    state.closed = true;
                    self.inner.filled.notify_all();
                }
                self.inner.drained.notify_all();
                Some(Received::Item(value))
            }
            None if state.closed => Some(Received::Closed),
            None => None,
        }
    }
}

/// The state protected by the mutex.
struct Slot<T> {
    /// At most one deposited value, waiting to be taken.
    item: Option<T>,
    /// Number of values ever deposited. Used as a ticket by senders.
    deposited: u64,
    /// Number of values ever taken.
    taken: u64,
    /// Ticket of a `send_and_close` deposit.
    close_after: Option<u64>,
    closed: bool,
}

struct Inner<T> {
    state: Mutex<Slot<T>>,
    filled: Condvar,  // Signals receivers that a value was deposited or the point closed.
    drained: Condvar, // Signals senders that a value was taken or the point closed.
}
