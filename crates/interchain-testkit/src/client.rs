//! [`ChainClient`] over an in-process [`TestChain`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use interchain_channel::{QueryRequest, SignedTx};
use interchain_core::DatagramKind;
use interchain_relayer::{ChainClient, RelayerError, Result};

use crate::chain::TestChain;

/// Talks to a [`TestChain`] directly, with optional failure injection.
///
/// Transactions are round-tripped through their wire encoding before
/// delivery, like a real node would receive them.
pub struct LocalClient {
    chain: Arc<TestChain>,
    fail_submissions: AtomicUsize,
    accepted: Mutex<Vec<(DatagramKind, u64)>>,
}

impl LocalClient {
    pub fn new(chain: Arc<TestChain>) -> Self {
        Self {
            chain,
            fail_submissions: AtomicUsize::new(0),
            accepted: Mutex::new(Vec::new()),
        }
    }

    pub fn chain(&self) -> &Arc<TestChain> {
        &self.chain
    }

    /// Make the next `n` submissions fail before reaching the chain.
    pub fn fail_next_submissions(&self, n: usize) {
        self.fail_submissions.store(n, Ordering::SeqCst);
    }

    /// (kind, sequence) of every transaction the chain accepted, in order.
    pub fn accepted(&self) -> Vec<(DatagramKind, u64)> {
        self.accepted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn take_injected_failure(&self) -> bool {
        self.fail_submissions
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl ChainClient for LocalClient {
    fn chain_id(&self) -> &str {
        self.chain.chain_id()
    }

    async fn query(&self, request: &QueryRequest) -> Result<Vec<u8>> {
        let path = format!(
            "/custom/{}/{}",
            self.chain.keeper().config().module_name,
            request.path()
        );
        let response = self.chain.query(&path, &request.encode_params()?);
        if !response.is_ok() {
            return Err(RelayerError::Query {
                chain: self.chain.chain_id().to_string(),
                path,
                code: response.code,
                log: response.log,
            });
        }
        Ok(response.value)
    }

    async fn submit(&self, tx: &SignedTx) -> Result<()> {
        if self.take_injected_failure() {
            return Err(RelayerError::Transport("injected submission failure".into()));
        }

        let tx = SignedTx::from_bytes(&tx.to_bytes()?)?;
        match self.chain.deliver(&tx) {
            Ok(outcome) => {
                self.accepted
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push((outcome.kind, outcome.sequence));
                Ok(())
            }
            Err(e) => Err(RelayerError::Submission {
                chain: self.chain.chain_id().to_string(),
                code: e.code(),
                log: e.to_string(),
            }),
        }
    }
}
