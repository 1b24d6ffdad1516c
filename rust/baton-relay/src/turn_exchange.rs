//! A bounded, alternating two-party exchange over a single hand-off point.
//!
//! Two peers share one [`HandoffPoint`] (the "table"). Each peer loops:
//!
//! ```text
//! WaitingTurn -> Transforming -> SendingBack -> WaitingTurn
//!      |
//!      +---> Terminated   (the table reports closure)
//! ```
//!
//! Since only one token exists and the table has no buffering, turns strictly
//! alternate between the peers. Whose turn it is follows from rendezvous order
//! and is not stored anywhere.
//!
//! The initiator seeds the table, sleeps for a real-time budget, closes the table
//! and recovers the token. The number of turns played in that budget is not
//! deterministic; it depends on scheduling.
//!
//! ## Recovering the token
//!
//! After the seed is sent, exactly one token exists. It is either deposited on
//! the table or held by a peer. Closure leaves one of two cases:
//!
//! - The initiator's final receive drains a send-back that was still pending
//!   on the table. That value is final.
//! - Otherwise a peer holds the token and its send-back is rejected. The peer
//!   returns the token it *received*, so the interrupted turn does not count.
//!
//! With increment transforms, the final token minus the seed is therefore the
//! number of completed turns.

use std::{
    io, thread,
    time::{Duration, Instant},
};

use baton_common::{Result, error::Error};
use baton_workflow::{
    handoff::{HandoffPoint, Received},
    join_handle::JoinHandle,
    worker,
};

use crate::{ExchangeOptions, Token};

/// A peer's loop, ready to run on its own thread.
type PeerTask = Box<dyn FnOnce() -> Option<Token> + Send + 'static>;

/// The phases of a peer's loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    /// Blocked on the table, waiting for the token.
    WaitingTurn,
    /// Applying the peer's transform to the received token.
    Transforming,
    /// Handing the transformed token back over the table.
    SendingBack,
    /// The table reported closure; the peer has exited.
    Terminated,
}

/// A started exchange whose peers wait for the initiator's seed.
pub struct TurnExchange {
    table: HandoffPoint<Token>,
    peers: Vec<(String, JoinHandle<Option<Token>>)>,
    join_timeout: Duration,
}

impl TurnExchange {
    /// Launches two peers labelled `ping` and `pong`, applying `transform_a` and
    /// `transform_b` respectively on their turns.
    pub fn start<A, B>(transform_a: A, transform_b: B) -> Result<TurnExchange>
    where
        A: Fn(Token) -> Token + Send + 'static,
        B: Fn(Token) -> Token + Send + 'static,
    {
        Self::start_with(&ExchangeOptions::default(), transform_a, transform_b)
    }

    /// Launches the two peers described by `options`.
    ///
    /// If the second peer cannot be launched, the table is closed so that the
    /// first one exits, and `PeerLaunch` is returned.
    pub fn start_with<A, B>(
        options: &ExchangeOptions,
        transform_a: A,
        transform_b: B,
    ) -> Result<TurnExchange>
    where
        A: Fn(Token) -> Token + Send + 'static,
        B: Fn(Token) -> Token + Send + 'static,
    {
        Self::start_with_launcher(options, transform_a, transform_b, |name, task| {
            worker::spawn_named(name, task)
        })
    }

    fn start_with_launcher<A, B, L>(
        options: &ExchangeOptions,
        transform_a: A,
        transform_b: B,
        mut launch: L,
    ) -> Result<TurnExchange>
    where
        A: Fn(Token) -> Token + Send + 'static,
        B: Fn(Token) -> Token + Send + 'static,
        L: FnMut(String, PeerTask) -> io::Result<JoinHandle<Option<Token>>>,
    {
        options.validate()?;

        let table = HandoffPoint::new();
        let [label_a, label_b] = options.labels.clone();

        let peer_a =
            Self::launch_peer(options, &table, label_a.clone(), transform_a, &mut launch)?;
        let peer_b =
            match Self::launch_peer(options, &table, label_b.clone(), transform_b, &mut launch) {
                Ok(peer) => peer,
                Err(e) => {
                    log::debug!("peer '{label_b}' failed to launch, closing the table");
                    table.close();
                    return Err(e);
                }
            };

        Ok(TurnExchange {
            table,
            peers: vec![(label_a, peer_a), (label_b, peer_b)],
            join_timeout: options.join_timeout,
        })
    }

    fn launch_peer<F, L>(
        options: &ExchangeOptions,
        table: &HandoffPoint<Token>,
        label: String,
        transform: F,
        launch: &mut L,
    ) -> Result<JoinHandle<Option<Token>>>
    where
        F: Fn(Token) -> Token + Send + 'static,
        L: FnMut(String, PeerTask) -> io::Result<JoinHandle<Option<Token>>>,
    {
        let peer = Peer {
            label: label.clone(),
            table: table.clone(),
            state: PeerState::WaitingTurn,
        };
        launch(
            options.peer_thread_name(&label),
            Box::new(move || peer.run(transform)),
        )
        .map_err(|e| Error::peer_launch(label, e))
    }

    /// Seeds the exchange, lets it run for `duration`, then closes it and
    /// returns the final token.
    ///
    /// A zero `duration` closes the table as the seed is taken, so the final
    /// token is the seed itself. After closing, the peers are joined within the
    /// configured join timeout. A peer stuck in its transform past that bound
    /// makes this fail with `TimeoutExceeded`; such a peer still exits as soon
    /// as its transform returns. A peer that panicked yields `WorkerFailed`.
    pub fn drive(mut self, seed: Token, duration: Duration) -> Result<Token> {
        let seeded = if duration.is_zero() {
            self.table.send_and_close(seed)
        } else {
            self.table.send(seed)
        };
        seeded.map_err(|_| Error::closed_point("turn exchange table"))?;

        if !duration.is_zero() {
            thread::sleep(duration);
        }
        self.table.close();

        // A pending send-back; otherwise a peer holds the token.
        let drained = self.table.recv().into_item();

        // No deadline when the join timeout is too large to represent.
        let deadline = Instant::now().checked_add(self.join_timeout);
        let mut held = None;
        for (label, handle) in self.peers.drain(..) {
            let joined = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    match handle.join_timeout(remaining) {
                        Ok(joined) => joined,
                        Err(_) => {
                            log::debug!("peer '{label}' did not observe closure in time");
                            return Err(Error::timeout_exceeded(self.join_timeout));
                        }
                    }
                }
                None => handle.join(),
            };
            match joined {
                Some(token) => held = held.or(token),
                None => return Err(Error::worker_failed(label)),
            }
        }

        let final_token = drained
            .or(held)
            .ok_or_else(|| Error::closed_point("turn exchange closed with no token in flight"))?;
        log::debug!("played {} turns", final_token.wrapping_sub(seed));
        Ok(final_token)
    }
}

impl Drop for TurnExchange {
    fn drop(&mut self) {
        // Releases the peers of an exchange that was never driven.
        self.table.close();
    }
}

struct Peer {
    label: String,
    table: HandoffPoint<Token>,
    state: PeerState,
}

impl Peer {
    /// Plays turns until the table closes. Returns the token this peer held
    /// when its send-back was rejected, if any.
    fn run(mut self, transform: impl Fn(Token) -> Token) -> Option<Token> {
        loop {
            let token = match self.table.recv() {
                Received::Item(token) => token,
                Received::Closed => {
                    self.enter(PeerState::Terminated);
                    return None;
                }
            };
            log::trace!("{token}\t{}", self.label);

            self.enter(PeerState::Transforming);
            let next = transform(token);

            self.enter(PeerState::SendingBack);
            if self.table.send(next).is_err() {
                self.enter(PeerState::Terminated);
                return Some(token);
            }
            self.enter(PeerState::WaitingTurn);
        }
    }

    fn enter(&mut self, state: PeerState) {
        log::trace!("peer '{}': {:?} -> {state:?}", self.label, self.state);
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io,
        sync::{Arc, Mutex},
        thread,
        time::{Duration, Instant},
    };

    use baton_common::error::ErrorKind;
    use baton_workflow::worker;

    use super::{PeerTask, TurnExchange};
    use crate::{ExchangeOptions, Token, increment};

    #[test]
    fn test_exchange_zero_duration() {
        let exchange = TurnExchange::start(increment, increment).unwrap();
        let final_token = exchange.drive(0, Duration::ZERO).unwrap();
        assert!(final_token == 0 || final_token == 1);
    }

    #[test]
    fn test_exchange_plays_turns() {
        let exchange = TurnExchange::start(increment, increment).unwrap();
        let final_token = exchange.drive(100, Duration::from_millis(50)).unwrap();
        assert!(final_token >= 100);
    }

    #[test]
    fn test_exchange_turns_alternate() {
        let log = Arc::new(Mutex::new(Vec::<(&'static str, Token)>::new()));
        let record = |label: &'static str, log: Arc<Mutex<Vec<(&'static str, Token)>>>| {
            move |token: Token| {
                log.lock().unwrap().push((label, token));
                token + 1
            }
        };

        let exchange =
            TurnExchange::start(record("a", log.clone()), record("b", log.clone())).unwrap();
        let final_token = exchange.drive(0, Duration::from_millis(30)).unwrap();

        let log = log.lock().unwrap();
        assert!(log.windows(2).all(|w| w[0].0 != w[1].0));
        assert!(log.windows(2).all(|w| w[1].1 == w[0].1 + 1));
        // Completed turns plus at most one interrupted turn.
        let turns = final_token as usize;
        assert!(log.len() == turns || log.len() == turns + 1);
    }

    #[test]
    fn test_exchange_distinct_transforms() {
        let exchange = TurnExchange::start(|t| t + 1, |t| t + 10).unwrap();
        let final_token = exchange.drive(0, Duration::from_millis(20)).unwrap();
        // Turns alternate, so the total is a mix of 1s and 10s with the two
        // counts differing by at most one.
        let rest = final_token % 11;
        assert!(rest == 0 || rest == 1 || rest == 10, "unexpected token {final_token}");
    }

    #[test]
    fn test_exchange_join_timeout() {
        let options = ExchangeOptions::default().with_join_timeout(Duration::from_millis(50));
        let slow = |token: Token| {
            thread::sleep(Duration::from_millis(500));
            token + 1
        };
        let exchange = TurnExchange::start_with(&options, slow, slow).unwrap();
        let err = exchange.drive(0, Duration::from_millis(10)).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::TimeoutExceeded { .. }));
    }

    #[test]
    fn test_exchange_peer_panic() {
        let boom = |_: Token| -> Token { panic!("transform failure") };
        let exchange = TurnExchange::start(boom, boom).unwrap();
        let err = exchange.drive(0, Duration::from_millis(10)).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::WorkerFailed { .. }));
    }

    #[test]
    fn test_exchange_invalid_labels() {
        let options = ExchangeOptions::default().with_labels("x", "x");
        let err = TurnExchange::start_with(&options, increment, increment)
            .err()
            .unwrap();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
    }

    #[test]
    fn test_exchange_drop_without_drive() {
        let mut exchange = TurnExchange::start(increment, increment).unwrap();
        let table = exchange.table.clone();
        let peers = std::mem::take(&mut exchange.peers);
        drop(exchange);
        assert!(table.is_closed());

        // Peers observe closure without any token ever being sent.
        for (label, handle) in peers {
            let outcome = handle.join_timeout(Duration::from_secs(5));
            assert_eq!(outcome.ok(), Some(Some(None)), "peer '{label}' leaked");
        }
    }

    #[test]
    fn test_exchange_unbounded_join_timeout() {
        let options = ExchangeOptions::default().with_join_timeout(Duration::MAX);
        let exchange = TurnExchange::start_with(&options, increment, increment).unwrap();
        let final_token = exchange.drive(0, Duration::from_millis(5)).unwrap();
        assert!(final_token >= 0);
    }

    #[test]
    fn test_exchange_second_peer_launch_failure() {
        let outcomes = Arc::new(Mutex::new(Vec::new()));
        let mut launched = 0;

        let err = TurnExchange::start_with_launcher(
            &ExchangeOptions::default(),
            increment,
            increment,
            {
                let outcomes = outcomes.clone();
                move |name: String, task: PeerTask| {
                    launched += 1;
                    if launched == 2 {
                        return Err(io::Error::other("out of threads"));
                    }
                    let outcomes = outcomes.clone();
                    worker::spawn_named(name, move || {
                        let outcome = task();
                        outcomes.lock().unwrap().push(outcome);
                        outcome
                    })
                }
            },
        )
        .err()
        .unwrap();

        match err.kind() {
            ErrorKind::PeerLaunch { peer, .. } => assert_eq!(peer, "pong"),
            other => panic!("unexpected error: {other}"),
        }

        // The first peer sees the closed table and exits without a token.
        let deadline = Instant::now() + Duration::from_secs(5);
        while outcomes.lock().unwrap().is_empty() {
            assert!(Instant::now() < deadline, "first peer leaked");
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(*outcomes.lock().unwrap(), vec![None]);
    }
}
