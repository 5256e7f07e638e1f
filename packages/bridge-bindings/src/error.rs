//! Typed failures surfaced by the bindings.
//!
//! Library functions return `eyre::Result`; the variants below are the cases a
//! caller may want to match on, reachable through `Report::downcast_ref`.

use alloy::primitives::{Address, B256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BindingError {
    /// Transaction was mined with status 0
    #[error("{method} reverted in transaction {tx_hash}")]
    Reverted { method: String, tx_hash: B256 },

    /// The node rejected the call with revert data matching a contract error
    #[error("{method} rejected by contract {address}: {reason}")]
    ContractRevert {
        method: String,
        address: Address,
        reason: String,
    },

    /// Creation transaction succeeded but the receipt has no contract address
    #[error("deployment of {contract} in {tx_hash} created no contract")]
    NoContractAddress { contract: String, tx_hash: B256 },

    /// A log was handed to the wrong event decoder
    #[error("log topic0 {found:?} does not match {expected}")]
    EventMismatch {
        expected: &'static str,
        found: Option<B256>,
    },

    /// Compiled artifact does not expose the interface the bindings expect
    #[error("artifact for {contract} is missing {missing} ABI item(s): {items}")]
    IncompatibleArtifact {
        contract: String,
        missing: usize,
        items: String,
    },

    /// Artifact bytecode still contains library placeholders
    #[error("artifact for {0} has unlinked library references")]
    UnlinkedBytecode(String),

    /// Artifact describes an interface or abstract contract
    #[error("artifact for {0} has no creation bytecode")]
    EmptyBytecode(String),

    #[error("unknown contract {0:?}")]
    UnknownContract(String),

    /// A relay pass stopped part-way; `submitted` went out before `failed`
    #[error("relay stopped at {failed} after submitting {} order(s)", .submitted.len())]
    RelayAborted {
        failed: B256,
        submitted: Vec<B256>,
    },
}
