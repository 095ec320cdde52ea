//! The relay loop.
//!
//! Each cycle derives the gap between the source's egress length and the
//! destination's ingress counter, then submits the missing indices in
//! ascending order. No progress is kept locally: a restarted relayer picks
//! up exactly where the destination's counter says it should.

use std::future::Future;
use std::time::Duration;

use interchain_channel::{MsgReceive, SignedTx};
use interchain_core::{DatagramKind, Keypair};
use tokio::sync::watch;

use crate::client::ChainClient;
use crate::config::RelayerConfig;
use crate::error::{RelayerError, Result};

/// Counters for one or more relay cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayReport {
    /// Datagrams accepted by the destination.
    pub submitted: u64,
    /// Submissions that failed and ended their cycle early.
    pub failed: u64,
    pub cycles: u64,
}

impl RelayReport {
    pub fn merge(&mut self, other: &RelayReport) {
        self.submitted += other.submitted;
        self.failed += other.failed;
        self.cycles += other.cycles;
    }
}

/// Relays datagrams from `source` to `destination`.
pub struct Relayer<S, D> {
    source: S,
    destination: D,
    keypair: Keypair,
    config: RelayerConfig,
}

impl<S: ChainClient, D: ChainClient> Relayer<S, D> {
    pub fn new(source: S, destination: D, keypair: Keypair, config: RelayerConfig) -> Self {
        Self {
            source,
            destination,
            keypair,
            config,
        }
    }

    pub fn config(&self) -> &RelayerConfig {
        &self.config
    }

    /// Relay until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// The shutdown signal interrupts the sleep between cycles; a cycle in
    /// progress runs to completion.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> RelayReport {
        tracing::info!(
            source = self.source.chain_id(),
            destination = self.destination.chain_id(),
            relayer = %self.keypair.address(),
            kinds = ?self.config.kinds,
            "relayer started"
        );

        let mut total = RelayReport::default();
        while !*shutdown.borrow() {
            let report = self.relay_once().await;
            total.merge(&report);

            // A full, clean cycle may have left more behind the batch limit.
            if report.submitted > 0 && report.failed == 0 {
                continue;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::info!(
            submitted = total.submitted,
            failed = total.failed,
            cycles = total.cycles,
            "relayer stopped"
        );
        total
    }

    /// One cycle over every configured kind.
    pub async fn relay_once(&self) -> RelayReport {
        let mut report = RelayReport {
            cycles: 1,
            ..RelayReport::default()
        };
        for kind in &self.config.kinds {
            report.merge(&self.relay_kind(*kind).await);
        }
        report
    }

    /// Drain up to `max_batch` datagrams of one kind.
    pub async fn relay_kind(&self, kind: DatagramKind) -> RelayReport {
        let mut report = RelayReport::default();

        let (egress, ingress) = match self.gap(kind).await {
            Ok(gap) => gap,
            Err(e) => {
                tracing::warn!(%kind, error = %e, "could not determine relay gap");
                return report;
            }
        };
        if egress <= ingress {
            tracing::trace!(%kind, egress, ingress, "nothing to relay");
            return report;
        }

        let end = egress.min(ingress.saturating_add(self.config.max_batch));
        tracing::debug!(%kind, from = ingress, to = end, pending = egress - ingress, "relaying");

        for index in ingress..end {
            match self.relay_index(kind, index).await {
                Ok(()) => report.submitted += 1,
                Err(e) => {
                    // Later indices would fail the sequence check anyway.
                    tracing::warn!(%kind, index, error = %e, "submission failed, retrying next cycle");
                    report.failed += 1;
                    break;
                }
            }
        }
        report
    }

    /// `(source egress length, destination ingress counter)`, queried
    /// concurrently.
    async fn gap(&self, kind: DatagramKind) -> Result<(u64, u64)> {
        let timeout = self.config.request_timeout;
        let (egress, ingress) = tokio::join!(
            with_timeout(
                timeout,
                "egress length query",
                self.source.egress_length(kind, self.destination.chain_id()),
            ),
            with_timeout(
                timeout,
                "ingress counter query",
                self.destination.ingress_counter(kind, self.source.chain_id()),
            ),
        );
        Ok((egress?, ingress?))
    }

    async fn relay_index(&self, kind: DatagramKind, index: u64) -> Result<()> {
        let timeout = self.config.request_timeout;
        let datagram = with_timeout(
            timeout,
            "egress datagram query",
            self.source
                .egress_datagram(kind, self.destination.chain_id(), index),
        )
        .await?;

        let header = &datagram.header;
        if header.source_chain != self.source.chain_id()
            || header.destination_chain != self.destination.chain_id()
        {
            tracing::error!(
                %kind,
                index,
                source = %header.source_chain,
                destination = %header.destination_chain,
                "source queue holds a misaddressed datagram"
            );
            return Err(RelayerError::Decode(format!(
                "datagram {index} is addressed {} -> {}",
                header.source_chain, header.destination_chain
            )));
        }
        if datagram.kind() != kind {
            return Err(RelayerError::Decode(format!(
                "datagram {index} on the {kind} queue reports kind {}",
                datagram.kind()
            )));
        }

        let digest = datagram.digest()?;
        let msg = MsgReceive::new(datagram, index, self.keypair.address());
        let tx = SignedTx::sign(msg, &self.keypair)?;
        with_timeout(timeout, "submission", self.destination.submit(&tx)).await?;

        tracing::info!(
            %kind,
            index,
            source = self.source.chain_id(),
            destination = self.destination.chain_id(),
            type_tag = %tx.msg.datagram.payload.type_tag,
            %digest,
            "relayed datagram"
        );
        Ok(())
    }
}

async fn with_timeout<T>(
    after: Duration,
    what: &'static str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(after, fut)
        .await
        .map_err(|_| RelayerError::Timeout { what, after })?
}
