//! EVM provider construction
//!
//! Read-only providers for queries and event watching, and wallet-backed
//! providers (with nonce, gas and chain-id fillers) for transactions.

use alloy::{
    eips::BlockNumberOrTag,
    network::EthereumWallet,
    primitives::Address,
    providers::{Provider, ProviderBuilder, RootProvider},
    rpc::types::BlockTransactionsKind,
    signers::local::PrivateKeySigner,
    transports::{
        http::{Client, Http},
        Transport,
    },
};
use eyre::{eyre, Result, WrapErr};
use tracing::info;

/// Create a read-only HTTP provider
pub fn read_provider(rpc_url: &str) -> Result<RootProvider<Http<Client>>> {
    let url = rpc_url
        .parse()
        .map_err(|e| eyre!("Invalid RPC URL: {}", e))?;
    Ok(ProviderBuilder::new().on_http(url))
}

/// Create an HTTP provider that signs with `private_key`.
///
/// Returns the provider and the signer address.
pub fn signer_provider(
    rpc_url: &str,
    private_key: &str,
) -> Result<(impl Provider<Http<Client>> + Clone, Address)> {
    let signer: PrivateKeySigner = private_key
        .trim()
        .parse()
        .map_err(|e| eyre!("Invalid private key: {}", e))?;

    let address = signer.address();
    let wallet = EthereumWallet::from(signer);

    let url = rpc_url
        .parse()
        .map_err(|e| eyre!("Invalid RPC URL: {}", e))?;
    let provider = ProviderBuilder::new()
        .with_recommended_fillers()
        .wallet(wallet)
        .on_http(url);

    info!(rpc_url = %rpc_url, address = %address, "Created EVM provider with signer");

    Ok((provider, address))
}

/// Fail unless the node reports `expected` as its chain id
pub async fn verify_chain_id<T, P>(provider: &P, expected: u64) -> Result<()>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    let actual = provider
        .get_chain_id()
        .await
        .wrap_err("Failed to get chain id")?;

    if actual != expected {
        return Err(eyre!(
            "Chain id mismatch: RPC reports {}, configured {}",
            actual,
            expected
        ));
    }
    Ok(())
}

/// Timestamp of the latest block
pub async fn latest_timestamp<T, P>(provider: &P) -> Result<u64>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    let block = provider
        .get_block_by_number(BlockNumberOrTag::Latest, BlockTransactionsKind::Hashes)
        .await
        .wrap_err("Failed to get latest block")?
        .ok_or_else(|| eyre!("Latest block not found"))?;
    Ok(block.header.timestamp)
}
