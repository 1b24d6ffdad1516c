//! Relay command implementation

use anyhow::{Context, Result};
use baton_relay::{RelayChain, Token};
use serde::Serialize;

use crate::{commands::print_summary, config::RelayConfig};

#[derive(Debug, Serialize)]
pub struct RelaySummary {
    pub length: usize,
    pub seed: Token,
    pub result: Token,
}

pub fn run(config: RelayConfig) -> Result<()> {
    let summary = relay(&config)?;
    log::info!("relay of {} stages returned {}", summary.length, summary.result);
    print_summary(&summary)
}

pub fn relay(config: &RelayConfig) -> Result<RelaySummary> {
    let chain = RelayChain::build(config.length)
        .with_context(|| format!("Failed to build a relay chain of {} stages", config.length))?;
    let result = chain.run(config.seed).context("Relay chain run failed")?;
    Ok(RelaySummary {
        length: config.length,
        seed: config.seed,
        result,
    })
}

#[cfg(test)]
mod tests {
    use super::relay;
    use crate::config::RelayConfig;

    #[test]
    fn test_relay_summary() {
        let summary = relay(&RelayConfig { length: 3, seed: 0 }).unwrap();
        assert_eq!(summary.result, 3);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["length"], 3);
        assert_eq!(json["result"], 3);
    }

    #[test]
    fn test_relay_zero_length_reports_context() {
        let err = relay(&RelayConfig { length: 0, seed: 0 }).unwrap_err();
        assert!(err.to_string().contains("Failed to build a relay chain of 0 stages"));
        assert!(format!("{err:#}").contains("at least one stage"));
    }
}
