//! Per-request view of one channel: a (kind, counterparty) pair.

use interchain_core::keys::{egress_queue_prefix, ingress_counter_key};
use interchain_core::{Datagram, DatagramKind};
use interchain_store::{KvStore, Linear, PrefixStore, Value};

use crate::error::{ChannelError, Result};

/// Egress queue and ingress counter of one channel.
///
/// Holds no state beyond its bindings; every call goes to the store. The
/// egress queue is the one towards `counterparty`, the ingress counter the
/// one for datagrams arriving from it.
pub struct ChannelRuntime<'a> {
    region: PrefixStore<'a>,
    kind: DatagramKind,
    counterparty: String,
}

impl<'a> ChannelRuntime<'a> {
    /// Bind to the keeper's region of `store`.
    pub fn new(
        store: &'a dyn KvStore,
        region_prefix: &[u8],
        kind: DatagramKind,
        counterparty: impl Into<String>,
    ) -> Self {
        Self {
            region: PrefixStore::new(store, region_prefix),
            kind,
            counterparty: counterparty.into(),
        }
    }

    pub fn kind(&self) -> DatagramKind {
        self.kind
    }

    fn egress(&self) -> Linear<'_, Datagram> {
        Linear::new(&self.region, egress_queue_prefix(self.kind, &self.counterparty))
    }

    fn ingress(&self) -> Value<'_, u64> {
        Value::new(&self.region, ingress_counter_key(self.kind, &self.counterparty))
    }

    /// Append a datagram to the egress queue, returning its index.
    pub fn push_egress(&self, datagram: &Datagram) -> Result<u64> {
        let index = self.egress().push(datagram)?;
        tracing::debug!(
            kind = %self.kind,
            destination = %self.counterparty,
            index,
            "pushed egress datagram"
        );
        Ok(index)
    }

    pub fn egress_length(&self) -> Result<u64> {
        Ok(self.egress().len()?)
    }

    /// Datagram at `index`. `NotFound` if `index >= egress_length()`.
    pub fn egress_at(&self, index: u64) -> Result<Datagram> {
        let egress = self.egress();
        match egress.get(index)? {
            Some(datagram) => Ok(datagram),
            None => Err(ChannelError::NotFound {
                index,
                length: egress.len()?,
            }),
        }
    }

    /// Datagrams with `start <= index < end`, in order.
    pub fn egress_range(&self, start: u64, end: u64) -> Result<Vec<(u64, Datagram)>> {
        Ok(self.egress().iterate(start, end)?)
    }

    /// Next expected ingress index. Zero if nothing was ever received.
    pub fn ingress_counter(&self) -> Result<u64> {
        Ok(self.ingress().get_or_default()?)
    }

    /// Overwrite the ingress counter.
    pub fn set_ingress_counter(&self, value: u64) -> Result<()> {
        self.ingress().set(&value)?;
        tracing::debug!(
            kind = %self.kind,
            source = %self.counterparty,
            counter = value,
            "set ingress counter"
        );
        Ok(())
    }
}
