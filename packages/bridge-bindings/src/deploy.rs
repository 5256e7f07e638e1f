//! Contract deployment
//!
//! Creation code comes from compiled [`Artifact`]s; constructor arguments are
//! encoded with the typed `constructorCall` of each binding. An artifact is
//! checked against the binding before anything is sent, so a client built on
//! the returned address always matches the deployed contract.

use alloy::{
    json_abi::JsonAbi,
    network::TransactionBuilder,
    primitives::{Address, Bytes, B256, U256},
    providers::Provider,
    rpc::types::TransactionRequest,
    sol_types::SolConstructor,
    transports::Transport,
};
use eyre::{eyre, Result, WrapErr};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::abi::{check_compatibility, ContractKind};
use crate::artifacts::Artifact;
use crate::bindings::{LockBridgeClient, MintBridgeClient, WrappedTokenClient};
use crate::contracts::{LockBridge, MintBridge, WrappedToken};
use crate::error::BindingError;
use crate::session::TransactOptions;

/// A contract created on chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Deployment {
    pub kind: ContractKind,
    pub address: Address,
    pub tx_hash: B256,
    pub block_number: Option<u64>,
}

/// Constructor arguments of `WrappedToken`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedTokenInit {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub owner: Address,
}

impl WrappedTokenInit {
    pub fn encode(&self) -> Vec<u8> {
        WrappedToken::constructorCall {
            name_: self.name.clone(),
            symbol_: self.symbol.clone(),
            decimals_: self.decimals,
            initialOwner: self.owner,
        }
        .abi_encode()
    }
}

/// Constructor arguments shared by `LockBridge` and `MintBridge`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeInit {
    /// Custodied token (lock side) or wrapped token (mint side)
    pub token: Address,
    pub fee_bps: U256,
    pub fee_recipient: Address,
    /// Zero disables the daily limit
    pub daily_limit: U256,
    pub owner: Address,
}

impl BridgeInit {
    pub fn encode_lock_bridge(&self) -> Vec<u8> {
        LockBridge::constructorCall {
            token_: self.token,
            feeBps_: self.fee_bps,
            feeRecipient_: self.fee_recipient,
            dailyLimit_: self.daily_limit,
            initialOwner: self.owner,
        }
        .abi_encode()
    }

    pub fn encode_mint_bridge(&self) -> Vec<u8> {
        MintBridge::constructorCall {
            wrappedToken_: self.token,
            feeBps_: self.fee_bps,
            feeRecipient_: self.fee_recipient,
            dailyLimit_: self.daily_limit,
            initialOwner: self.owner,
        }
        .abi_encode()
    }
}

fn constructor_types(abi: &JsonAbi) -> Vec<String> {
    abi.constructor
        .as_ref()
        .map(|c| c.inputs.iter().map(|p| p.selector_type().into_owned()).collect())
        .unwrap_or_default()
}

/// Reject artifacts whose ABI or constructor differs from the binding for `kind`
pub fn ensure_deployable(kind: ContractKind, artifact: &Artifact) -> Result<()> {
    if !kind.deployable() {
        return Err(eyre!("{} is not a deployable contract", kind));
    }

    check_compatibility(kind, &artifact.abi).into_result()?;

    let expected = constructor_types(&kind.abi());
    let found = constructor_types(&artifact.abi);
    if expected != found {
        return Err(BindingError::IncompatibleArtifact {
            contract: kind.to_string(),
            missing: 1,
            items: format!("constructor({})", expected.join(",")),
        }
        .into());
    }
    Ok(())
}

/// Send the creation transaction for `artifact` and wait for the receipt.
///
/// `constructor_args` must already be ABI-encoded.
pub async fn deploy_contract<T, P>(
    provider: &P,
    kind: ContractKind,
    artifact: &Artifact,
    constructor_args: &[u8],
    options: &TransactOptions,
) -> Result<Deployment>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    ensure_deployable(kind, artifact)?;

    let mut code = artifact.bytecode.to_vec();
    code.extend_from_slice(constructor_args);

    let mut tx = TransactionRequest::default().with_deploy_code(Bytes::from(code));
    if let Some(from) = options.from {
        tx = tx.with_from(from);
    }
    if let Some(value) = options.value {
        tx = tx.with_value(value);
    }
    if let Some(gas) = options.gas_limit {
        tx = tx.with_gas_limit(gas);
    }
    if let Some(fee) = options.max_fee_per_gas {
        tx = tx.with_max_fee_per_gas(fee);
    }
    if let Some(tip) = options.max_priority_fee_per_gas {
        tx = tx.with_max_priority_fee_per_gas(tip);
    }
    if let Some(nonce) = options.nonce {
        tx = tx.with_nonce(nonce);
    }

    debug!(contract = %kind, args_len = constructor_args.len(), "Sending deployment transaction");

    let pending = provider
        .send_transaction(tx)
        .await
        .wrap_err_with(|| format!("Failed to send deployment of {}", kind))?;
    let tx_hash = *pending.tx_hash();

    let receipt = pending
        .get_receipt()
        .await
        .map_err(|e| eyre!("Failed to get deployment receipt for {}: {}", kind, e))?;

    if !receipt.status() {
        warn!(tx_hash = %tx_hash, contract = %kind, "Deployment reverted");
        return Err(BindingError::Reverted {
            method: format!("deploy {}", kind),
            tx_hash,
        }
        .into());
    }

    let address = receipt
        .contract_address
        .ok_or_else(|| BindingError::NoContractAddress {
            contract: kind.to_string(),
            tx_hash: receipt.transaction_hash,
        })?;

    info!(
        contract = %kind,
        address = %address,
        tx_hash = %tx_hash,
        block = ?receipt.block_number,
        "Contract deployed"
    );

    Ok(Deployment {
        kind,
        address,
        tx_hash,
        block_number: receipt.block_number,
    })
}

/// Deploy a `WrappedToken` and bind a client to it
pub async fn deploy_wrapped_token<T, P>(
    provider: P,
    artifact: &Artifact,
    init: &WrappedTokenInit,
    options: &TransactOptions,
) -> Result<(Deployment, WrappedTokenClient<T, P>)>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    let deployment = deploy_contract::<T, P>(
        &provider,
        ContractKind::WrappedToken,
        artifact,
        &init.encode(),
        options,
    )
    .await?;
    Ok((deployment, WrappedTokenClient::new(deployment.address, provider)))
}

/// Deploy a `LockBridge` custodying `init.token` and bind a client to it
pub async fn deploy_lock_bridge<T, P>(
    provider: P,
    artifact: &Artifact,
    init: &BridgeInit,
    options: &TransactOptions,
) -> Result<(Deployment, LockBridgeClient<T, P>)>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    let deployment = deploy_contract::<T, P>(
        &provider,
        ContractKind::LockBridge,
        artifact,
        &init.encode_lock_bridge(),
        options,
    )
    .await?;
    Ok((deployment, LockBridgeClient::new(deployment.address, provider)))
}

/// Deploy a `MintBridge` controlling the wrapped token `init.token` and bind a client to it
pub async fn deploy_mint_bridge<T, P>(
    provider: P,
    artifact: &Artifact,
    init: &BridgeInit,
    options: &TransactOptions,
) -> Result<(Deployment, MintBridgeClient<T, P>)>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    let deployment = deploy_contract::<T, P>(
        &provider,
        ContractKind::MintBridge,
        artifact,
        &init.encode_mint_bridge(),
        options,
    )
    .await?;
    Ok((deployment, MintBridgeClient::new(deployment.address, provider)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::providers::ProviderBuilder;
    use alloy::transports::http::{Client, Http};

    fn artifact(kind: ContractKind, abi: JsonAbi) -> Artifact {
        Artifact {
            name: kind.name().to_string(),
            abi,
            bytecode: Bytes::from_static(&[0x60, 0x80]),
            deployed_bytecode: None,
        }
    }

    fn init() -> BridgeInit {
        BridgeInit {
            token: Address::repeat_byte(0x01),
            fee_bps: U256::from(30u64),
            fee_recipient: Address::repeat_byte(0x02),
            daily_limit: U256::ZERO,
            owner: Address::repeat_byte(0x03),
        }
    }

    #[test]
    fn test_bridge_constructor_encoding() {
        let encoded = init().encode_lock_bridge();
        // five static words, no selector
        assert_eq!(encoded.len(), 5 * 32);
        assert_eq!(&encoded[12..32], Address::repeat_byte(0x01).as_slice());
        assert_eq!(encoded[63], 30);

        // Same layout on the mint side
        assert_eq!(init().encode_mint_bridge(), encoded);
    }

    #[test]
    fn test_wrapped_token_constructor_encoding() {
        let encoded = WrappedTokenInit {
            name: "Wrapped Token".into(),
            symbol: "wTKN".into(),
            decimals: 18,
            owner: Address::ZERO,
        }
        .encode();
        // 4 head words + 2 dynamic strings (length + one data word each)
        assert_eq!(encoded.len(), 4 * 32 + 2 * 64);
    }

    #[test]
    fn test_ensure_deployable() {
        let good = artifact(ContractKind::LockBridge, ContractKind::LockBridge.abi());
        assert!(ensure_deployable(ContractKind::LockBridge, &good).is_ok());

        // Mixins are never deployed on their own
        let mixin = artifact(ContractKind::Ownable, ContractKind::Ownable.abi());
        assert!(ensure_deployable(ContractKind::Ownable, &mixin).is_err());
    }

    #[test]
    fn test_constructor_mismatch_rejected() {
        // Same functions, different constructor
        let mut abi = ContractKind::MintBridge.abi();
        abi.constructor = ContractKind::WrappedToken.abi().constructor;
        let wrong = artifact(ContractKind::MintBridge, abi);

        let err = ensure_deployable(ContractKind::MintBridge, &wrong).unwrap_err();
        match err.downcast_ref::<BindingError>() {
            Some(BindingError::IncompatibleArtifact { items, .. }) => {
                assert!(items.starts_with("constructor(address,uint256"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_incompatible_artifact_rejected_before_sending() {
        // Nothing listens on this port; the check must fail first
        let provider = ProviderBuilder::new().on_http("http://127.0.0.1:1".parse().unwrap());
        let wrong = artifact(ContractKind::LockBridge, ContractKind::WrappedToken.abi());

        let err = deploy_lock_bridge::<Http<Client>, _>(provider, &wrong, &init(), &TransactOptions::default())
            .await
            .err()
            .unwrap();

        assert!(matches!(
            err.downcast_ref::<BindingError>(),
            Some(BindingError::IncompatibleArtifact { .. })
        ));
    }
}
