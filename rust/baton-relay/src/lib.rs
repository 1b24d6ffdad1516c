//! Relay chains and turn exchanges over rendezvous hand-off points.
//!
//! Two independent components are built on
//! [`HandoffPoint`](baton_workflow::handoff::HandoffPoint):
//!
//! - [`RelayChain`]: a fixed sequence of one-shot stages. A seed token enters at
//!   the head, every stage increments it exactly once, strictly in ordinal order,
//!   and the initiator observes the result at the tail.
//! - [`TurnExchange`]: two peers alternately receive a shared token, transform it
//!   and hand it back over a single point, until the initiator closes the point
//!   after a real-time budget.
//!
//! Workers never share mutable state; the token is copied on every hand-off.
//! Only the initiator (the owner of a `RelayChain` or `TurnExchange`) closes the
//! points it exposes, and every worker is guaranteed to observe either chain
//! completion or closure and exit.

pub mod options;
pub mod relay_chain;
pub mod turn_exchange;

pub use options::{ChainOptions, ExchangeOptions};
pub use relay_chain::RelayChain;
pub use turn_exchange::{PeerState, TurnExchange};

/// The value threaded through hand-offs.
pub type Token = i64;

/// The stage transform: `token + 1`, wrapping at the integer boundary.
#[inline]
pub fn increment(token: Token) -> Token {
    token.wrapping_add(1)
}
