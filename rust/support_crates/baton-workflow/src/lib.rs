//! Thread-level building blocks for hand-off based workflows.
//!
//! This crate provides the small set of primitives the relay and turn-exchange
//! components are assembled from. Everything here is blocking and built on
//! `Mutex` + `Condvar`; there is no async runtime involved.
//!
//! # Key Components
//!
//! ## Hand-off
//!
//! - [`handoff::HandoffPoint`] - A zero-capacity rendezvous point. A send completes
//!   only when a receiver has taken the value. The point can be closed, after which
//!   blocked and future receives observe [`handoff::Received::Closed`] and sends are
//!   rejected with [`handoff::ClosedError`].
//!
//! ## Worker Results
//!
//! - [`oneshot`] - Single-value communication from a worker back to its owner
//! - [`join_handle`] - Handles for waiting on worker results, with timeouts
//! - [`worker`] - Launching named worker threads without panicking on
//!   resource exhaustion

pub mod handoff;
pub mod join_handle;
pub mod oneshot;
pub mod worker;
