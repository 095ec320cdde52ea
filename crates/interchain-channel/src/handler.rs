//! Payload handlers and the registry that routes payloads to them.

use std::collections::BTreeMap;
use std::sync::Arc;

use interchain_core::Datagram;
use interchain_store::KvStore;

use crate::context::Context;
use crate::error::{ChannelError, HandlerError, Result};

/// Result of a handler that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// Payload applied. Buffered writes are committed.
    Success,
    /// Payload rejected for an application reason. Buffered writes are
    /// discarded and a failure receipt carries the reason back.
    Failed(String),
}

/// What a [`PayloadHandler`] returns.
pub type HandlerResult = std::result::Result<HandlerOutcome, HandlerError>;

/// Application logic for one payload type.
///
/// `store` is a write buffer over the chain's state: writes become visible
/// only if the handler returns `Ok(HandlerOutcome::Success)`.
pub trait PayloadHandler: Send + Sync {
    fn handle(&self, ctx: &Context, store: &dyn KvStore, datagram: &Datagram) -> HandlerResult;
}

impl<F> PayloadHandler for F
where
    F: Fn(&Context, &dyn KvStore, &Datagram) -> HandlerResult + Send + Sync,
{
    fn handle(&self, ctx: &Context, store: &dyn KvStore, datagram: &Datagram) -> HandlerResult {
        self(ctx, store, datagram)
    }
}

/// Handlers keyed by payload type tag. Built once at wiring time.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, Arc<dyn PayloadHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `type_tag`.
    ///
    /// Receipt tags are reserved and a tag can only be registered once.
    pub fn register(
        &mut self,
        type_tag: impl Into<String>,
        handler: impl PayloadHandler + 'static,
    ) -> Result<()> {
        let type_tag = type_tag.into();
        if type_tag.is_empty() {
            return Err(ChannelError::InvalidArgument("empty payload type tag".into()));
        }
        if type_tag == interchain_core::ReceiptSuccess::TYPE_TAG
            || type_tag == interchain_core::ReceiptFail::TYPE_TAG
        {
            return Err(ChannelError::InvalidArgument(format!(
                "payload type tag {type_tag} is reserved"
            )));
        }
        if self.handlers.contains_key(&type_tag) {
            return Err(ChannelError::InvalidArgument(format!(
                "handler for {type_tag} already registered"
            )));
        }
        self.handlers.insert(type_tag, Arc::new(handler));
        Ok(())
    }

    pub fn get(&self, type_tag: &str) -> Option<&dyn PayloadHandler> {
        self.handlers.get(type_tag).map(|h| h.as_ref())
    }

    pub fn contains(&self, type_tag: &str) -> bool {
        self.handlers.contains_key(type_tag)
    }

    /// Registered type tags, sorted.
    pub fn type_tags(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("type_tags", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accept(_: &Context, _: &dyn KvStore, _: &Datagram) -> HandlerResult {
        Ok(HandlerOutcome::Success)
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = HandlerRegistry::new();
        registry.register("ping", accept).unwrap();
        assert!(registry.contains("ping"));
        assert!(registry.get("pong").is_none());
        assert_eq!(registry.type_tags().collect::<Vec<_>>(), vec!["ping"]);
    }

    #[test]
    fn test_duplicate_and_reserved_tags_rejected() {
        let mut registry = HandlerRegistry::new();
        registry.register("ping", accept).unwrap();
        assert!(matches!(
            registry.register("ping", accept),
            Err(ChannelError::InvalidArgument(_))
        ));
        assert!(registry.register("receipt/success", accept).is_err());
        assert!(registry.register("", accept).is_err());
    }
}
