//! A minimal token transfer module built on the channel keeper.
//!
//! Sending burns the sender's tokens and enqueues a [`TransferPayload`].
//! The destination credits the receiver with a voucher denominated
//! `<source chain>/<denom>`, or declines if the receiver is frozen. A
//! failure receipt returning to the source refunds the sender.

use interchain_channel::{
    ChannelError, Context, HandlerError, HandlerOutcome, HandlerRegistry, HandlerResult, Keeper,
    PayloadHandler,
};
use interchain_core::{
    Address, Datagram, DatagramKind, Payload, PayloadEnvelope, PayloadError, ReceiptFail,
};
use interchain_store::{KvStore, KvStoreExt, StoreError};
use serde::{Deserialize, Serialize};

pub const TRANSFER_TYPE_TAG: &str = "bank/transfer";

const MAX_DENOM_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPayload {
    pub sender: Address,
    pub receiver: Address,
    pub denom: String,
    pub amount: u64,
}

impl Payload for TransferPayload {
    fn type_tag(&self) -> &str {
        TRANSFER_TYPE_TAG
    }

    fn validate_basic(&self) -> Result<(), PayloadError> {
        if self.amount == 0 {
            return Err(PayloadError::Invalid("zero amount".into()));
        }
        if self.denom.is_empty()
            || self.denom.len() > MAX_DENOM_LEN
            || !self.denom.bytes().all(|b| b.is_ascii_alphanumeric())
        {
            return Err(PayloadError::Invalid(format!("bad denom {:?}", self.denom)));
        }
        if self.sender.is_zero() || self.receiver.is_zero() {
            return Err(PayloadError::Invalid("empty address".into()));
        }
        Ok(())
    }

    fn signers(&self) -> Vec<Address> {
        vec![self.sender]
    }

    fn datagram_kind(&self) -> DatagramKind {
        DatagramKind::Packet
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Ledger
// ─────────────────────────────────────────────────────────────────────────────

fn balance_key(owner: &Address, denom: &str) -> Vec<u8> {
    format!("bank/balance/{}/{}", owner.to_hex(), denom).into_bytes()
}

fn frozen_key(owner: &Address) -> Vec<u8> {
    format!("bank/frozen/{}", owner.to_hex()).into_bytes()
}

/// Denomination of vouchers for `denom` minted on behalf of `source_chain`.
pub fn voucher_denom(source_chain: &str, denom: &str) -> String {
    format!("{source_chain}/{denom}")
}

pub fn balance(store: &dyn KvStore, owner: &Address, denom: &str) -> Result<u64, StoreError> {
    Ok(store
        .get_decoded::<u64>(&balance_key(owner, denom))?
        .unwrap_or(0))
}

pub fn mint(
    store: &dyn KvStore,
    owner: &Address,
    denom: &str,
    amount: u64,
) -> Result<(), StoreError> {
    let updated = balance(store, owner, denom)?
        .checked_add(amount)
        .ok_or_else(|| StoreError::InvalidData("balance overflow".into()))?;
    store.set_encoded(&balance_key(owner, denom), &updated)
}

/// Remove `amount` from `owner`. Returns `false` without writing if the
/// balance is insufficient.
pub fn burn(
    store: &dyn KvStore,
    owner: &Address,
    denom: &str,
    amount: u64,
) -> Result<bool, StoreError> {
    let Some(updated) = balance(store, owner, denom)?.checked_sub(amount) else {
        return Ok(false);
    };
    store.set_encoded(&balance_key(owner, denom), &updated)?;
    Ok(true)
}

pub fn freeze(store: &dyn KvStore, owner: &Address) -> Result<(), StoreError> {
    store.set_encoded(&frozen_key(owner), &true)
}

pub fn is_frozen(store: &dyn KvStore, owner: &Address) -> Result<bool, StoreError> {
    store.has(&frozen_key(owner))
}

// ─────────────────────────────────────────────────────────────────────────────
// Module surfaces
// ─────────────────────────────────────────────────────────────────────────────

/// Burn the sender's tokens and enqueue the transfer. Returns the egress
/// index of the packet.
pub fn send_transfer(
    keeper: &Keeper,
    ctx: &Context,
    store: &dyn KvStore,
    destination: &str,
    transfer: &TransferPayload,
) -> Result<u64, ChannelError> {
    transfer.validate_basic()?;
    if !burn(store, &transfer.sender, &transfer.denom, transfer.amount)? {
        return Err(ChannelError::InvalidArgument(format!(
            "{} holds less than {} {}",
            transfer.sender, transfer.amount, transfer.denom
        )));
    }
    keeper.send(ctx, store, destination, PayloadEnvelope::wrap(transfer)?)
}

/// Handles transfer packets and the receipts acknowledging them.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferHandler;

impl TransferHandler {
    fn on_packet(&self, store: &dyn KvStore, datagram: &Datagram) -> HandlerResult {
        let transfer: TransferPayload = datagram.payload.decode()?;
        transfer
            .validate_basic()
            .map_err(|e| HandlerError::new(e.to_string()))?;

        if is_frozen(store, &transfer.receiver)? {
            return Ok(HandlerOutcome::Failed(format!(
                "receiver {} is frozen",
                transfer.receiver
            )));
        }
        let denom = voucher_denom(&datagram.header.source_chain, &transfer.denom);
        mint(store, &transfer.receiver, &denom, transfer.amount)?;
        Ok(HandlerOutcome::Success)
    }

    fn on_receipt(&self, store: &dyn KvStore, datagram: &Datagram) -> HandlerResult {
        if datagram.payload.type_tag != ReceiptFail::TYPE_TAG {
            return Ok(HandlerOutcome::Success);
        }
        let receipt: ReceiptFail = datagram.payload.decode()?;
        let transfer: TransferPayload = receipt.packet.decode()?;
        mint(store, &transfer.sender, &transfer.denom, transfer.amount)?;
        tracing::debug!(
            sender = %transfer.sender,
            amount = transfer.amount,
            reason = %receipt.reason,
            "transfer refunded"
        );
        Ok(HandlerOutcome::Success)
    }
}

impl PayloadHandler for TransferHandler {
    fn handle(&self, _ctx: &Context, store: &dyn KvStore, datagram: &Datagram) -> HandlerResult {
        match datagram.kind() {
            DatagramKind::Packet => self.on_packet(store, datagram),
            DatagramKind::Receipt => self.on_receipt(store, datagram),
        }
    }
}

/// Registry with the transfer handler installed.
pub fn transfer_registry() -> Result<HandlerRegistry, ChannelError> {
    let mut registry = HandlerRegistry::new();
    registry.register(TRANSFER_TYPE_TAG, TransferHandler)?;
    Ok(registry)
}
