//! Call and transaction options bound to a client
//!
//! A client carries one [`SessionOptions`]; every view call gets the
//! [`CallOptions`] applied and every state-changing call the
//! [`TransactOptions`]. Re-binding a client with different options is cheap
//! and leaves the original untouched.

use alloy::{
    contract::{CallBuilder, CallDecoder, Error as ContractError},
    eips::BlockId,
    primitives::{Address, B256, U256},
    providers::Provider,
    sol_types::SolInterface,
    transports::Transport,
};
use eyre::Result;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info, warn};

use crate::error::BindingError;

/// Options applied to read-only calls
#[derive(Debug, Clone, Copy, Default)]
pub struct CallOptions {
    /// Caller address seen by `msg.sender`
    pub from: Option<Address>,
    /// Block to evaluate against (latest if unset)
    pub block: Option<BlockId>,
}

impl CallOptions {
    pub fn at_block(block: impl Into<BlockId>) -> Self {
        Self {
            from: None,
            block: Some(block.into()),
        }
    }

    pub fn apply<T, P, D>(&self, mut call: CallBuilder<T, P, D>) -> CallBuilder<T, P, D>
    where
        T: Transport + Clone,
        P: Provider<T>,
        D: CallDecoder,
    {
        if let Some(from) = self.from {
            call = call.from(from);
        }
        if let Some(block) = self.block {
            call = call.block(block);
        }
        call
    }
}

/// Options applied to state-changing calls; unset fields are filled by the provider
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactOptions {
    pub from: Option<Address>,
    pub value: Option<U256>,
    pub gas_limit: Option<u64>,
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
    pub nonce: Option<u64>,
}

impl TransactOptions {
    pub fn apply<T, P, D>(&self, mut call: CallBuilder<T, P, D>) -> CallBuilder<T, P, D>
    where
        T: Transport + Clone,
        P: Provider<T>,
        D: CallDecoder,
    {
        if let Some(from) = self.from {
            call = call.from(from);
        }
        if let Some(value) = self.value {
            call = call.value(value);
        }
        if let Some(gas) = self.gas_limit {
            call = call.gas(gas);
        }
        if let Some(fee) = self.max_fee_per_gas {
            call = call.max_fee_per_gas(fee);
        }
        if let Some(tip) = self.max_priority_fee_per_gas {
            call = call.max_priority_fee_per_gas(tip);
        }
        if let Some(nonce) = self.nonce {
            call = call.nonce(nonce);
        }
        call
    }

    /// Options for a helper transaction (an ERC20 approval) sent ahead of
    /// the main one. Keeps sender, fee caps and nonce; value and gas limit
    /// belong to the main transaction only.
    pub fn preceding(&self) -> Self {
        Self {
            value: None,
            gas_limit: None,
            ..*self
        }
    }

    /// Options for the main transaction once `sent` helper transactions went
    /// out first; a fixed nonce moves past them
    pub fn after(&self, sent: u64) -> Self {
        Self {
            nonce: self.nonce.map(|n| n + sent),
            ..*self
        }
    }
}

/// Call and transact options carried together
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    pub call: CallOptions,
    pub transact: TransactOptions,
}

/// Mined transaction summary
#[derive(Debug, Clone, Serialize)]
pub struct TxOutcome {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// Decode revert data carried by a JSON-RPC error into a contract's error enum
pub fn decode_revert<E: SolInterface>(err: &ContractError) -> Option<E> {
    let ContractError::TransportError(transport) = err else {
        return None;
    };
    let payload = transport.as_error_resp()?;
    let data = payload.as_revert_data()?;
    E::abi_decode(&data, true).ok()
}

/// Turn a contract error into a report, preferring the decoded revert reason
pub fn contract_error<E>(err: ContractError, address: Address, method: &str) -> eyre::Report
where
    E: SolInterface + Debug,
{
    match decode_revert::<E>(&err) {
        Some(decoded) => BindingError::ContractRevert {
            method: method.to_string(),
            address,
            reason: format!("{:?}", decoded),
        }
        .into(),
        None => eyre::Report::new(err).wrap_err(format!("{} failed on {}", method, address)),
    }
}

/// Execute a view call, decoding contract errors of type `E`
pub async fn call_view<E, T, P, D>(
    call: CallBuilder<T, P, D>,
    address: Address,
    method: &str,
) -> Result<D::CallOutput>
where
    E: SolInterface + Debug,
    T: Transport + Clone,
    P: Provider<T>,
    D: CallDecoder + Unpin,
{
    call.call()
        .await
        .map_err(|e| contract_error::<E>(e, address, method))
}

/// Send a transaction and wait for its receipt.
///
/// A mined-but-reverted transaction yields [`BindingError::Reverted`].
pub async fn send_call<E, T, P, D>(
    call: CallBuilder<T, P, D>,
    address: Address,
    method: &str,
) -> Result<TxOutcome>
where
    E: SolInterface + Debug,
    T: Transport + Clone,
    P: Provider<T>,
    D: CallDecoder,
{
    debug!(contract = %address, method = method, "Sending transaction");

    let pending = call
        .send()
        .await
        .map_err(|e| contract_error::<E>(e, address, method))?;

    let tx_hash = *pending.tx_hash();
    info!(tx_hash = %tx_hash, method = method, "Transaction sent, waiting for confirmation");

    let receipt = pending
        .get_receipt()
        .await
        .map_err(|e| eyre::eyre!("Failed to get receipt for {}: {}", method, e))?;

    if !receipt.status() {
        warn!(tx_hash = %tx_hash, method = method, "Transaction reverted");
        return Err(BindingError::Reverted {
            method: method.to_string(),
            tx_hash,
        }
        .into());
    }

    Ok(TxOutcome {
        tx_hash,
        block_number: receipt.block_number,
        gas_used: u64::try_from(receipt.gas_used).unwrap_or(u64::MAX),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::LockBridge;
    use alloy::rpc::json_rpc::ErrorPayload;
    use alloy::sol_types::SolError;
    use alloy::transports::RpcError;

    fn revert_error(data: &[u8]) -> ContractError {
        let json = format!(
            r#"{{"code":3,"message":"execution reverted","data":"0x{}"}}"#,
            hex::encode(data)
        );
        let payload: ErrorPayload = serde_json::from_str(&json).unwrap();
        ContractError::TransportError(RpcError::ErrorResp(payload))
    }

    #[test]
    fn test_decode_revert_custom_error() {
        let encoded = LockBridge::DailyLimitExceeded {
            requested: U256::from(500u64),
            remaining: U256::from(100u64),
        }
        .abi_encode();

        let decoded =
            decode_revert::<LockBridge::LockBridgeErrors>(&revert_error(&encoded)).unwrap();

        match decoded {
            LockBridge::LockBridgeErrors::DailyLimitExceeded(e) => {
                assert_eq!(e.requested, U256::from(500u64));
                assert_eq!(e.remaining, U256::from(100u64));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_decode_revert_unknown_selector() {
        let err = revert_error(&[0xde, 0xad, 0xbe, 0xef]);
        assert!(decode_revert::<LockBridge::LockBridgeErrors>(&err).is_none());
        assert!(decode_revert::<LockBridge::LockBridgeErrors>(&ContractError::NotADeploymentTransaction).is_none());
    }

    #[test]
    fn test_contract_error_report() {
        let encoded = LockBridge::AlreadyProcessed {
            sourceTxHash: B256::repeat_byte(0xAA),
        }
        .abi_encode();
        let address = Address::repeat_byte(0x01);

        let report = contract_error::<LockBridge::LockBridgeErrors>(
            revert_error(&encoded),
            address,
            "unlock",
        );

        match report.downcast_ref::<BindingError>() {
            Some(BindingError::ContractRevert { method, reason, .. }) => {
                assert_eq!(method, "unlock");
                assert!(reason.contains("AlreadyProcessed"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_preceding_and_after_options() {
        let opts = TransactOptions {
            from: Some(Address::repeat_byte(0x07)),
            value: Some(U256::from(1u64)),
            gas_limit: Some(300_000),
            max_fee_per_gas: Some(2_000_000_000),
            nonce: Some(7),
            ..Default::default()
        };

        let helper = opts.preceding();
        assert_eq!(helper.from, opts.from);
        assert_eq!(helper.nonce, Some(7));
        assert_eq!(helper.max_fee_per_gas, Some(2_000_000_000));
        assert!(helper.value.is_none());
        assert!(helper.gas_limit.is_none());

        assert_eq!(opts.after(0).nonce, Some(7));
        assert_eq!(opts.after(1).nonce, Some(8));
        assert_eq!(opts.after(1).gas_limit, Some(300_000));
        assert!(TransactOptions::default().after(1).nonce.is_none());
    }

    #[test]
    fn test_call_options_at_block() {
        let opts = CallOptions::at_block(1234u64);
        assert!(opts.from.is_none());
        assert_eq!(opts.block, Some(BlockId::number(1234)));
    }
}
