//! The chain endpoint a relayer talks to.

use async_trait::async_trait;
use interchain_channel::{QueryRequest, SignedTx};
use interchain_core::{codec, Datagram, DatagramKind};

use crate::error::Result;

/// Read and write access to one chain's channel module.
///
/// Implementors provide the raw query and submission transport; the typed
/// channel reads are derived from [`query`](ChainClient::query).
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Chain ID of the chain behind this client.
    fn chain_id(&self) -> &str;

    /// Run a channel query and return the JSON response body.
    async fn query(&self, request: &QueryRequest) -> Result<Vec<u8>>;

    /// Submit a signed receive transaction and wait for it to be applied.
    async fn submit(&self, tx: &SignedTx) -> Result<()>;

    /// Length of this chain's egress queue towards `destination`.
    async fn egress_length(&self, kind: DatagramKind, destination: &str) -> Result<u64> {
        let request = QueryRequest::EgressIndex {
            dest_chain: destination.to_string(),
            kind,
        };
        Ok(codec::from_json(&self.query(&request).await?)?)
    }

    /// This chain's ingress counter for datagrams from `source`.
    async fn ingress_counter(&self, kind: DatagramKind, source: &str) -> Result<u64> {
        let request = QueryRequest::IngressIndex {
            src_chain: source.to_string(),
            kind,
        };
        Ok(codec::from_json(&self.query(&request).await?)?)
    }

    /// Datagram at `index` of this chain's egress queue towards `destination`.
    async fn egress_datagram(
        &self,
        kind: DatagramKind,
        destination: &str,
        index: u64,
    ) -> Result<Datagram> {
        let request = QueryRequest::EgressDatagram {
            dest_chain: destination.to_string(),
            kind,
            sequence: index,
        };
        Ok(codec::from_json(&self.query(&request).await?)?)
    }
}

#[async_trait]
impl<C: ChainClient + ?Sized> ChainClient for std::sync::Arc<C> {
    fn chain_id(&self) -> &str {
        (**self).chain_id()
    }

    async fn query(&self, request: &QueryRequest) -> Result<Vec<u8>> {
        (**self).query(request).await
    }

    async fn submit(&self, tx: &SignedTx) -> Result<()> {
        (**self).submit(tx).await
    }
}
