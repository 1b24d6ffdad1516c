//! A fixed-length chain of one-shot relay stages.
//!
//! Stage `i` owns an inbound and an outbound [`HandoffPoint`]; its outbound point
//! is stage `i + 1`'s inbound point. The chain itself only exposes the first
//! inbound point (the head) and the last outbound point (the tail):
//!
//! ```text
//! head -> [stage 0] -> [stage 1] -> ... -> [stage n-1] -> tail
//! ```
//!
//! Every stage is launched when the chain is built and blocks on its inbound
//! point. On receiving a token it forwards `token + 1` and terminates. Because the
//! points have no buffering, a token reaches stage `i + 1` strictly after it left
//! stage `i`, and no two stages hold the same token at once.
//!
//! A stage that observes closure on its inbound point closes its outbound point
//! before exiting. This passes a closure started by the chain owner down the
//! chain, so that dropping or abandoning a chain releases every stage.

use std::io;

use baton_common::{Result, error::Error};
use baton_workflow::{
    handoff::{HandoffPoint, Received},
    join_handle::JoinHandle,
    worker::{self, WorkerOptions},
};

use crate::{ChainOptions, Token, increment};

/// A built relay chain, ready to [`run`](RelayChain::run) exactly once.
pub struct RelayChain {
    head: HandoffPoint<Token>,
    tail: HandoffPoint<Token>,
    stages: Vec<(String, JoinHandle<StageOutcome>)>,
}

impl RelayChain {
    /// Builds a chain of `length` stages with default options.
    ///
    /// Fails with `InvalidTopology` if `length` is zero, and with `ChainBuild` if
    /// a stage thread cannot be launched.
    pub fn build(length: usize) -> Result<RelayChain> {
        Self::build_with(length, &ChainOptions::default())
    }

    /// Builds a chain of `length` stages.
    pub fn build_with(length: usize, options: &ChainOptions) -> Result<RelayChain> {
        Self::build_with_launcher(length, options, |name, stage, options| {
            let worker_options = WorkerOptions::named(name).with_stack_size(options.stack_size);
            worker::spawn_with(worker_options, move || stage.run())
        })
    }

    fn build_with_launcher<L>(
        length: usize,
        options: &ChainOptions,
        mut launch: L,
    ) -> Result<RelayChain>
    where
        L: FnMut(String, Stage, &ChainOptions) -> io::Result<JoinHandle<StageOutcome>>,
    {
        if length == 0 {
            return Err(Error::invalid_topology(length));
        }
        options.validate()?;

        let points = (0..=length)
            .map(|_| HandoffPoint::new())
            .collect::<Vec<_>>();

        let mut stages = Vec::with_capacity(length);
        for ordinal in 0..length {
            let stage = Stage {
                ordinal,
                inbound: points[ordinal].clone(),
                outbound: points[ordinal + 1].clone(),
            };
            let name = options.stage_thread_name(ordinal);
            match launch(name.clone(), stage, options) {
                Ok(handle) => stages.push((name, handle)),
                Err(e) => {
                    log::debug!("relay stage {ordinal} failed to launch, unwinding chain");
                    // Every launched stage is blocked on its inbound point.
                    for point in &points {
                        point.close();
                    }
                    return Err(Error::chain_build(ordinal, e));
                }
            }
        }

        log::debug!("relay chain of {length} stages built");
        Ok(RelayChain {
            head: points[0].clone(),
            tail: points[length].clone(),
            stages,
        })
    }

    /// Number of stages in the chain.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Always `false`: a chain has at least one stage.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Injects `seed` at the head and waits for the result at the tail.
    ///
    /// The result is `seed + len()` (wrapping). Consumes the chain: stages are
    /// one-shot. All stage threads have exited when this returns `Ok`.
    pub fn run(mut self, seed: Token) -> Result<Token> {
        self.head
            .send(seed)
            .map_err(|_| Error::closed_point("relay chain head"))?;

        let result = match self.tail.recv() {
            Received::Item(result) => result,
            Received::Closed => return Err(Error::closed_point("relay chain tail")),
        };

        for (name, handle) in self.stages.drain(..) {
            match handle.join() {
                Some(StageOutcome::Forwarded) => (),
                Some(outcome) => {
                    log::debug!("relay stage '{name}' exited early: {outcome:?}");
                    return Err(Error::closed_point(format!("relay stage '{name}'")));
                }
                None => return Err(Error::worker_failed(name)),
            }
        }

        log::debug!("relay chain delivered {result} from seed {seed}");
        Ok(result)
    }
}

impl Drop for RelayChain {
    fn drop(&mut self) {
        // No-op after a completed run. Otherwise releases the stages.
        self.head.close();
        self.tail.close();
    }
}

/// How a stage finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StageOutcome {
    /// Received a token and handed on its increment.
    Forwarded,
    /// The inbound point closed before a token arrived.
    UpstreamClosed,
    /// The outbound point closed before the increment could be handed on.
    DownstreamClosed,
}

struct Stage {
    ordinal: usize,
    inbound: HandoffPoint<Token>,
    outbound: HandoffPoint<Token>,
}

impl Stage {
    fn run(self) -> StageOutcome {
        let token = match self.inbound.recv() {
            Received::Item(token) => token,
            Received::Closed => {
                self.outbound.close();
                return StageOutcome::UpstreamClosed;
            }
        };

        log::trace!("stage {}: {token} -> {}", self.ordinal, increment(token));
        match self.outbound.send(increment(token)) {
            Ok(()) => StageOutcome::Forwarded,
            Err(_) => StageOutcome::DownstreamClosed,
        }
    }
}
