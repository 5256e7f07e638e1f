//! Lock/mint pairing
//!
//! A `Locked` event on the source chain becomes a `mint` on the destination;
//! a `Burned` event on the destination becomes an `unlock` on the source. The
//! source transaction hash identifies the transfer on the other side, and the
//! bridges refuse to process the same hash twice.

use alloy::{
    primitives::{Address, B256, U256},
    providers::Provider,
    transports::Transport,
};
use eyre::Result;
use serde::Serialize;
use std::collections::HashSet;
use std::future::Future;
use tracing::{debug, info, warn};

use crate::bindings::{LockBridgeClient, MintBridgeClient};
use crate::contracts::{LockBridge, MintBridge};
use crate::error::BindingError;
use crate::events::{DecodedLog, EventQuery};

/// Mint owed on the destination for a lock on the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MintOrder {
    pub recipient: Address,
    /// Net amount locked (fee already deducted)
    pub amount: U256,
    pub source_tx_hash: B256,
}

impl MintOrder {
    /// `None` when the log carries no transaction hash (pending block)
    pub fn from_locked(log: &DecodedLog<LockBridge::Locked>) -> Option<Self> {
        Some(Self {
            recipient: log.event.sender,
            amount: log.event.amount,
            source_tx_hash: log.meta.tx_hash?,
        })
    }
}

/// Unlock owed on the source for a burn on the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnlockOrder {
    pub recipient: Address,
    pub amount: U256,
    pub source_tx_hash: B256,
}

impl UnlockOrder {
    pub fn from_burned(log: &DecodedLog<MintBridge::Burned>) -> Option<Self> {
        Some(Self {
            recipient: log.event.sender,
            amount: log.event.amount,
            source_tx_hash: log.meta.tx_hash?,
        })
    }
}

/// Outcome of one relay pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelaySummary {
    /// Transactions sent, by source transaction hash
    pub submitted: Vec<B256>,
    /// Orders already processed on the other side, or not relayable
    pub skipped: usize,
}

/// Keep the first order per source hash; later ones would be rejected on chain
fn dedup_orders<O>(orders: Vec<O>, hash: impl Fn(&O) -> B256) -> (Vec<O>, usize) {
    let mut seen = HashSet::new();
    let mut duplicates = 0;
    let unique = orders
        .into_iter()
        .filter(|order| {
            let fresh = seen.insert(hash(order));
            if !fresh {
                duplicates += 1;
            }
            fresh
        })
        .collect();
    (unique, duplicates)
}

/// Submit every order not yet processed on the other side.
///
/// Stops at the first failure with [`BindingError::RelayAborted`] wrapped
/// around the cause, so the hashes already submitted are not lost.
async fn submit_orders<O, C, CF, S, SF>(
    orders: Vec<O>,
    mut summary: RelaySummary,
    hash: impl Fn(&O) -> B256,
    is_processed: C,
    submit: S,
) -> Result<RelaySummary>
where
    C: Fn(B256) -> CF,
    CF: Future<Output = Result<bool>>,
    S: Fn(O) -> SF,
    SF: Future<Output = Result<()>>,
{
    for order in orders {
        let source_tx_hash = hash(&order);

        let result = match is_processed(source_tx_hash).await {
            Ok(true) => {
                debug!(source_tx_hash = %source_tx_hash, "Already processed");
                summary.skipped += 1;
                continue;
            }
            Ok(false) => submit(order).await,
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            warn!(
                source_tx_hash = %source_tx_hash,
                submitted = ?summary.submitted,
                "Relay pass aborted"
            );
            return Err(e.wrap_err(BindingError::RelayAborted {
                failed: source_tx_hash,
                submitted: summary.submitted,
            }));
        }
        summary.submitted.push(source_tx_hash);
    }

    Ok(summary)
}

/// Moves transfers between a lock bridge and its mint bridge.
///
/// Both clients must be bound to the bridge owner's key.
pub struct Relayer<T1, P1, T2, P2> {
    source: LockBridgeClient<T1, P1>,
    destination: MintBridgeClient<T2, P2>,
}

impl<T1, P1, T2, P2> Relayer<T1, P1, T2, P2>
where
    T1: Transport + Clone,
    P1: Provider<T1>,
    T2: Transport + Clone,
    P2: Provider<T2>,
{
    pub fn new(source: LockBridgeClient<T1, P1>, destination: MintBridgeClient<T2, P2>) -> Self {
        Self {
            source,
            destination,
        }
    }

    pub fn source(&self) -> &LockBridgeClient<T1, P1> {
        &self.source
    }

    pub fn destination(&self) -> &MintBridgeClient<T2, P2> {
        &self.destination
    }

    /// Mint on the destination for every unprocessed `Locked` event in `query`
    pub async fn relay_locks(&self, query: EventQuery) -> Result<RelaySummary> {
        let events = self.source.filter_locked(query, &[]).await?;
        let mut summary = RelaySummary::default();

        let mut orders = Vec::with_capacity(events.len());
        for event in &events {
            match MintOrder::from_locked(event) {
                Some(order) => orders.push(order),
                None => {
                    warn!(block = ?event.meta.block_number, "Locked log without tx hash, skipping");
                    summary.skipped += 1;
                }
            }
        }
        let (orders, duplicates) = dedup_orders(orders, |o| o.source_tx_hash);
        summary.skipped += duplicates;

        let destination = &self.destination;
        let summary = submit_orders(
            orders,
            summary,
            |o| o.source_tx_hash,
            move |hash| destination.is_mint_processed(hash),
            move |o: MintOrder| async move {
                destination
                    .mint(o.recipient, o.amount, o.source_tx_hash)
                    .await
                    .map(|_| ())
            },
        )
        .await?;

        info!(
            submitted = summary.submitted.len(),
            skipped = summary.skipped,
            "Relayed locks"
        );
        Ok(summary)
    }

    /// Unlock on the source for every unprocessed `Burned` event in `query`
    pub async fn relay_burns(&self, query: EventQuery) -> Result<RelaySummary> {
        let events = self.destination.filter_burned(query, &[]).await?;
        let mut summary = RelaySummary::default();

        let mut orders = Vec::with_capacity(events.len());
        for event in &events {
            match UnlockOrder::from_burned(event) {
                Some(order) => orders.push(order),
                None => {
                    warn!(block = ?event.meta.block_number, "Burned log without tx hash, skipping");
                    summary.skipped += 1;
                }
            }
        }
        let (orders, duplicates) = dedup_orders(orders, |o| o.source_tx_hash);
        summary.skipped += duplicates;

        let source = &self.source;
        let summary = submit_orders(
            orders,
            summary,
            |o| o.source_tx_hash,
            move |hash| source.is_unlock_processed(hash),
            move |o: UnlockOrder| async move {
                source
                    .unlock(o.recipient, o.amount, o.source_tx_hash)
                    .await
                    .map(|_| ())
            },
        )
        .await?;

        info!(
            submitted = summary.submitted.len(),
            skipped = summary.skipped,
            "Relayed burns"
        );
        Ok(summary)
    }
}
