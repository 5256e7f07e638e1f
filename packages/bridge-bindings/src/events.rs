//! Event log decoding
//!
//! Every contract event is decoded the same way: check topic0 against the
//! event signature, ABI-decode topics and data, keep the log's position on
//! chain alongside the decoded struct.

use alloy::{
    primitives::{Address, B256},
    rpc::types::{Filter, Log},
    sol_types::SolEvent,
};
use eyre::{Result, WrapErr};
use serde::Serialize;

use crate::error::BindingError;

/// Where a log was emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LogMeta {
    /// Emitting contract
    pub address: Address,
    pub block_number: Option<u64>,
    pub block_hash: Option<B256>,
    pub tx_hash: Option<B256>,
    /// Log index within the block
    pub log_index: Option<u64>,
    /// Set when the log was dropped by a reorg
    pub removed: bool,
}

impl LogMeta {
    pub fn from_log(log: &Log) -> Self {
        Self {
            address: log.address(),
            block_number: log.block_number,
            block_hash: log.block_hash,
            tx_hash: log.transaction_hash,
            log_index: log.log_index,
            removed: log.removed,
        }
    }

    /// Sort key placing logs in chain order
    pub fn position(&self) -> (u64, u64) {
        (
            self.block_number.unwrap_or(u64::MAX),
            self.log_index.unwrap_or(u64::MAX),
        )
    }
}

/// A decoded event together with its log metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLog<E> {
    pub event: E,
    pub meta: LogMeta,
}

/// Decode a single log as event `E`.
///
/// Fails with [`BindingError::EventMismatch`] when the log is a different event.
pub fn parse_log<E: SolEvent>(log: &Log) -> Result<DecodedLog<E>> {
    let topic0 = log.topic0().copied();
    if topic0 != Some(E::SIGNATURE_HASH) {
        return Err(BindingError::EventMismatch {
            expected: E::SIGNATURE,
            found: topic0,
        }
        .into());
    }

    let decoded = log
        .log_decode::<E>()
        .wrap_err_with(|| format!("Failed to decode {} log", E::SIGNATURE))?;

    Ok(DecodedLog {
        event: decoded.inner.data,
        meta: LogMeta::from_log(log),
    })
}

/// Indexed-address filter value as a topic word
pub fn address_topic(address: Address) -> B256 {
    address.into_word()
}

/// Block range and indexed-topic constraints for a log query.
///
/// An empty topic list matches any value in that position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    pub from_block: Option<u64>,
    pub to_block: Option<u64>,
    pub topic1: Vec<B256>,
    pub topic2: Vec<B256>,
    pub topic3: Vec<B256>,
}

impl EventQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn range(from_block: u64, to_block: u64) -> Self {
        Self {
            from_block: Some(from_block),
            to_block: Some(to_block),
            ..Self::default()
        }
    }

    pub fn from_block(mut self, block: u64) -> Self {
        self.from_block = Some(block);
        self
    }

    pub fn to_block(mut self, block: u64) -> Self {
        self.to_block = Some(block);
        self
    }

    pub fn topic1(mut self, values: impl IntoIterator<Item = B256>) -> Self {
        self.topic1 = values.into_iter().collect();
        self
    }

    pub fn topic2(mut self, values: impl IntoIterator<Item = B256>) -> Self {
        self.topic2 = values.into_iter().collect();
        self
    }

    pub fn topic3(mut self, values: impl IntoIterator<Item = B256>) -> Self {
        self.topic3 = values.into_iter().collect();
        self
    }

    /// Build the `eth_getLogs` filter for event `E` over `[from, to]`
    pub fn to_filter<E: SolEvent>(&self, address: Address, from: u64, to: u64) -> Filter {
        let mut filter = Filter::new()
            .address(address)
            .event_signature(E::SIGNATURE_HASH)
            .from_block(from)
            .to_block(to);

        if !self.topic1.is_empty() {
            filter = filter.topic1(self.topic1.clone());
        }
        if !self.topic2.is_empty() {
            filter = filter.topic2(self.topic2.clone());
        }
        if !self.topic3.is_empty() {
            filter = filter.topic3(self.topic3.clone());
        }
        filter
    }
}
