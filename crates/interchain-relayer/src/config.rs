//! Relayer configuration.

use std::time::Duration;

use interchain_core::DatagramKind;

/// Tuning for one relayer direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayerConfig {
    /// Channel kinds to relay. Packets only by default; add receipts to
    /// carry acknowledgements back as well.
    pub kinds: Vec<DatagramKind>,
    /// Sleep between cycles that found nothing to do.
    pub poll_interval: Duration,
    /// Upper bound on every query and submission.
    pub request_timeout: Duration,
    /// Maximum datagrams submitted per kind per cycle.
    pub max_batch: u64,
}

impl Default for RelayerConfig {
    fn default() -> Self {
        Self {
            kinds: vec![DatagramKind::Packet],
            poll_interval: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            max_batch: 100,
        }
    }
}
