//! Exchange command implementation

use anyhow::{Context, Result};
use baton_relay::{Token, TurnExchange, increment};
use serde::Serialize;

use crate::{commands::print_summary, config::ExchangeConfig};

#[derive(Debug, Serialize)]
pub struct ExchangeSummary {
    pub seed: Token,
    pub duration_ms: u64,
    pub final_token: Token,
    pub turns: Token,
}

pub fn run(config: ExchangeConfig) -> Result<()> {
    let summary = exchange(&config)?;
    log::info!("played {} turns", summary.turns);
    print_summary(&summary)
}

pub fn exchange(config: &ExchangeConfig) -> Result<ExchangeSummary> {
    let exchange = TurnExchange::start_with(&config.options(), increment, increment)
        .context("Failed to start the turn exchange")?;
    let final_token = exchange
        .drive(config.seed, config.duration())
        .context("Turn exchange failed")?;
    Ok(ExchangeSummary {
        seed: config.seed,
        duration_ms: config.duration_ms,
        final_token,
        turns: final_token.wrapping_sub(config.seed),
    })
}

#[cfg(test)]
mod tests {
    use super::exchange;
    use crate::config::ExchangeConfig;

    #[test]
    fn test_exchange_summary() {
        let config = ExchangeConfig::default().with_overrides(Some(5), Some(10));
        let summary = exchange(&config).unwrap();
        assert_eq!(summary.seed, 5);
        assert!(summary.turns >= 0);
        assert_eq!(summary.final_token, 5 + summary.turns);
    }

    #[test]
    fn test_exchange_zero_duration() {
        let config = ExchangeConfig::default().with_overrides(None, Some(0));
        let summary = exchange(&config).unwrap();
        assert!(summary.turns == 0 || summary.turns == 1);
    }

    #[test]
    fn test_exchange_rejects_duplicate_labels() {
        let mut config = ExchangeConfig::default().with_overrides(None, Some(0));
        config.labels = ["same".to_string(), "same".to_string()];
        let err = exchange(&config).unwrap_err();
        assert!(err.to_string().contains("Failed to start the turn exchange"));
    }
}
