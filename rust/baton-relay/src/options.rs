//! Construction options for relay chains and turn exchanges.

use std::time::Duration;

use baton_common::{Result, verify_arg};

/// Options for [`RelayChain::build_with`](crate::RelayChain::build_with).
#[derive(Debug, Clone)]
pub struct ChainOptions {
    /// Stage threads are named `"{prefix}-{ordinal}"`. An empty prefix leaves
    /// them unnamed.
    pub thread_name_prefix: String,
    /// Stack size for stage threads. `None` uses the platform default.
    pub stack_size: Option<usize>,
}

impl Default for ChainOptions {
    fn default() -> Self {
        ChainOptions {
            thread_name_prefix: "relay-stage".to_string(),
            stack_size: None,
        }
    }
}

impl ChainOptions {
    pub(crate) fn stage_thread_name(&self, ordinal: usize) -> String {
        if self.thread_name_prefix.is_empty() {
            String::new()
        } else {
            format!("{}-{ordinal}", self.thread_name_prefix)
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        verify_arg!(
            thread_name_prefix,
            !self.thread_name_prefix.contains('\0')
        );
        Ok(())
    }
}

/// Options for [`TurnExchange::start_with`](crate::TurnExchange::start_with).
#[derive(Debug, Clone)]
pub struct ExchangeOptions {
    /// Labels of the two peers, used in thread names and trace events.
    pub labels: [String; 2],
    /// Peer threads are named `"{prefix}-{label}"`. An empty prefix leaves them
    /// unnamed.
    pub thread_name_prefix: String,
    /// Upper bound on how long `drive` waits for the peers to shut down after
    /// closing the exchange.
    pub join_timeout: Duration,
}

impl Default for ExchangeOptions {
    fn default() -> Self {
        ExchangeOptions {
            labels: ["ping".to_string(), "pong".to_string()],
            thread_name_prefix: "turn-exchange".to_string(),
            join_timeout: Duration::from_secs(5),
        }
    }
}

impl ExchangeOptions {
    pub fn with_labels(mut self, a: impl Into<String>, b: impl Into<String>) -> Self {
        self.labels = [a.into(), b.into()];
        self
    }

    pub fn with_join_timeout(mut self, join_timeout: Duration) -> Self {
        self.join_timeout = join_timeout;
        self
    }

    pub(crate) fn peer_thread_name(&self, label: &str) -> String {
        if self.thread_name_prefix.is_empty() {
            String::new()
        } else {
            format!("{}-{label}", self.thread_name_prefix)
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        verify_arg!(labels, self.labels[0] != self.labels[1]);
        verify_arg!(
            labels,
            self.labels.iter().all(|label| !label.contains('\0'))
        );
        verify_arg!(
            thread_name_prefix,
            !self.thread_name_prefix.contains('\0')
        );
        Ok(())
    }
}
