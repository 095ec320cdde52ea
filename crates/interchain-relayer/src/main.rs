use std::future::Future;
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use interchain_core::{DatagramKind, Keypair};
use interchain_relayer::{Relayer, RelayerConfig, RpcClient};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

/// Relay datagrams between two chains running the interchain channel module.
#[derive(Debug, Parser)]
#[command(name = "relayer", version, about)]
struct Cli {
    /// Store name the channel module is mounted under.
    #[arg(long, env = "RELAYER_STORE_NAME")]
    store_name: String,

    /// Chain ID of the chain whose egress queues are read.
    #[arg(long, env = "RELAYER_SRC_CHAIN_ID")]
    src_chain_id: String,

    /// RPC address of the source chain.
    #[arg(long, env = "RELAYER_SRC_CHAIN_NODE", default_value = "tcp://localhost:26657")]
    src_chain_node: String,

    /// Chain ID of the chain transactions are submitted to.
    #[arg(long, env = "RELAYER_DEST_CHAIN_ID")]
    dest_chain_id: String,

    /// RPC address of the destination chain.
    #[arg(long, env = "RELAYER_DEST_CHAIN_NODE", default_value = "tcp://localhost:36657")]
    dest_chain_node: String,

    /// Hex-encoded 32-byte Ed25519 seed of the relayer account.
    #[arg(long, env = "RELAYER_KEY", hide_env_values = true)]
    key: Option<String>,

    #[arg(long, env = "RELAYER_POLL_INTERVAL_MS", default_value_t = 5_000)]
    poll_interval_ms: u64,

    #[arg(long, env = "RELAYER_TIMEOUT_MS", default_value_t = 10_000)]
    timeout_ms: u64,

    /// Maximum datagrams submitted per kind per cycle.
    #[arg(long, env = "RELAYER_MAX_BATCH", default_value_t = 100)]
    max_batch: u64,

    /// Channel kinds to relay, comma separated.
    #[arg(long, env = "RELAYER_KINDS", value_delimiter = ',', default_value = "packet")]
    kinds: Vec<DatagramKind>,

    /// Also relay from the destination back to the source.
    #[arg(long, env = "RELAYER_BIDIRECTIONAL")]
    bidirectional: bool,
}

impl Cli {
    fn relayer_config(&self) -> RelayerConfig {
        RelayerConfig {
            kinds: self.kinds.clone(),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            request_timeout: Duration::from_millis(self.timeout_ms),
            max_batch: self.max_batch.max(1),
        }
    }

    fn keypair(&self) -> anyhow::Result<Keypair> {
        match &self.key {
            Some(seed) => Keypair::from_seed_hex(seed).context("invalid --key"),
            None => {
                tracing::warn!("no --key given, relaying with an ephemeral key");
                Ok(Keypair::generate())
            }
        }
    }
}

/// Flip `shutdown` once `signal` fires. The sender stays alive if the
/// signal cannot be listened for; dropping it would stop the relayers.
async fn shutdown_on(
    signal: impl Future<Output = std::io::Result<()>>,
    shutdown: watch::Sender<bool>,
) {
    match signal.await {
        Ok(()) => {
            tracing::info!("shutdown requested");
            let _ = shutdown.send(true);
        }
        Err(e) => {
            tracing::error!(error = %e, "cannot listen for ctrl-c, relaying until killed");
            std::future::pending::<()>().await;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let keypair = cli.keypair()?;
    let config = cli.relayer_config();

    let source = RpcClient::new(
        &cli.src_chain_node,
        &cli.src_chain_id,
        &cli.store_name,
        config.request_timeout,
    )
    .context("building source client")?;
    let destination = RpcClient::new(
        &cli.dest_chain_node,
        &cli.dest_chain_id,
        &cli.store_name,
        config.request_timeout,
    )
    .context("building destination client")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(shutdown_on(tokio::signal::ctrl_c(), shutdown_tx));

    let forward = Relayer::new(
        source.clone(),
        destination.clone(),
        keypair.clone(),
        config.clone(),
    );
    let report = if cli.bidirectional {
        let reverse = Relayer::new(destination, source, keypair, config);
        let (mut forward_report, reverse_report) =
            tokio::join!(forward.run(shutdown_rx.clone()), reverse.run(shutdown_rx));
        forward_report.merge(&reverse_report);
        forward_report
    } else {
        forward.run(shutdown_rx).await
    };

    tracing::info!(
        submitted = report.submitted,
        failed = report.failed,
        "relayer exited"
    );
    Ok(())
}
