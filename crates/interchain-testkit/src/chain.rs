//! An in-process chain running the channel keeper.

use std::sync::{Mutex, MutexGuard, PoisonError};

use interchain_channel::{
    ChannelError, Context, HandlerRegistry, Keeper, KeeperConfig, QueryResponse, ReceiveOutcome,
    SignedTx,
};
use interchain_core::PayloadEnvelope;
use interchain_store::{CacheKv, KvStore, MemoryKv, StoreError};

/// Block time of height zero, unix milliseconds.
const GENESIS_TIME_MS: i64 = 1_700_000_000_000;
const BLOCK_TIME_MS: i64 = 1_000;

struct ChainState {
    store: Box<dyn KvStore>,
    height: u64,
}

/// A chain that executes one transaction per block.
///
/// Each transaction runs on a write buffer over the chain's store and is
/// committed only if it succeeds, the way a host chain applies a
/// transaction atomically.
pub struct TestChain {
    chain_id: String,
    keeper: Keeper,
    state: Mutex<ChainState>,
}

impl TestChain {
    /// Chain backed by a fresh [`MemoryKv`].
    pub fn new(chain_id: impl Into<String>, handlers: HandlerRegistry) -> Self {
        Self::with_store(chain_id, Keeper::new(KeeperConfig::default(), handlers), MemoryKv::new())
    }

    pub fn with_store(
        chain_id: impl Into<String>,
        keeper: Keeper,
        store: impl KvStore + 'static,
    ) -> Self {
        Self {
            chain_id: chain_id.into(),
            keeper,
            state: Mutex::new(ChainState {
                store: Box::new(store),
                height: 0,
            }),
        }
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn keeper(&self) -> &Keeper {
        &self.keeper
    }

    pub fn height(&self) -> u64 {
        self.lock().height
    }

    fn lock(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` as the only transaction of a new block.
    pub fn execute<T, E>(
        &self,
        f: impl FnOnce(&Context, &dyn KvStore) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let mut state = self.lock();
        state.height += 1;
        let ctx = Context::new(
            self.chain_id.clone(),
            state.height,
            GENESIS_TIME_MS + state.height as i64 * BLOCK_TIME_MS,
        );

        let cache = CacheKv::new(state.store.as_ref());
        let value = f(&ctx, &cache)?;
        cache.write()?;
        Ok(value)
    }

    /// Read the committed state.
    pub fn read<T>(&self, f: impl FnOnce(&dyn KvStore) -> T) -> T {
        let state = self.lock();
        f(state.store.as_ref())
    }

    /// Verify and apply a relayed transaction.
    pub fn deliver(&self, tx: &SignedTx) -> Result<ReceiveOutcome, ChannelError> {
        tx.verify()?;
        let result = self.execute(|ctx, store| self.keeper.handle_receive(ctx, store, &tx.msg));
        if let Err(e) = &result {
            tracing::debug!(chain = %self.chain_id, error = %e, "transaction rejected");
        }
        result
    }

    /// Enqueue a packet for `destination` from a module of this chain.
    pub fn send(&self, destination: &str, payload: PayloadEnvelope) -> Result<u64, ChannelError> {
        self.execute(|ctx, store| self.keeper.send(ctx, store, destination, payload))
    }

    /// Serve an ABCI-style query.
    ///
    /// Paths of the form `/custom/<module>/<endpoint>` are accepted as long
    /// as `<module>` names the keeper's module.
    pub fn query(&self, path: &str, data: &[u8]) -> QueryResponse {
        let result = self.route(path).and_then(|endpoint| {
            self.read(|store| self.keeper.query(store, endpoint, data))
        });
        QueryResponse::from_result(result)
    }

    fn route<'p>(&self, path: &'p str) -> Result<&'p str, ChannelError> {
        let Some(rest) = path.trim_start_matches('/').strip_prefix("custom/") else {
            return Ok(path);
        };
        let (module, endpoint) = rest.split_once('/').unwrap_or((rest, ""));
        if module != self.keeper.config().module_name {
            return Err(ChannelError::UnknownRequest(path.to_string()));
        }
        Ok(endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interchain_channel::query::EGRESS_INDEX;
    use interchain_channel::QueryRequest;
    use interchain_core::{codec, DatagramKind};

    #[test]
    fn test_execute_commits_only_on_success() {
        let chain = TestChain::new("chain-a", HandlerRegistry::new());

        let ok: Result<(), StoreError> = chain.execute(|_, store| store.set(b"k", b"v"));
        ok.unwrap();
        let err: Result<(), StoreError> = chain.execute(|_, store| {
            store.set(b"other", b"v")?;
            Err(StoreError::InvalidData("abort".into()))
        });
        assert!(err.is_err());

        assert_eq!(chain.height(), 2);
        chain.read(|store| {
            assert!(store.has(b"k").unwrap());
            assert!(!store.has(b"other").unwrap());
        });
    }

    #[test]
    fn test_query_routes_custom_paths() {
        let chain = TestChain::new("chain-a", HandlerRegistry::new());
        let data = QueryRequest::EgressIndex {
            dest_chain: "chain-b".into(),
            kind: DatagramKind::Packet,
        }
        .encode_params()
        .unwrap();

        for path in [EGRESS_INDEX, "/custom/ibc/egress-index"] {
            let response = chain.query(path, &data);
            assert!(response.is_ok(), "{path}: {}", response.log);
            assert_eq!(codec::from_json::<u64>(&response.value).unwrap(), 0);
        }

        let response = chain.query("/custom/bank/egress-index", &data);
        assert_eq!(response.code, ChannelError::UnknownRequest(String::new()).code());
    }
}
