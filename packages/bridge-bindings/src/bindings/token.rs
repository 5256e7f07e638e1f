use alloy::{
    primitives::{Address, U256},
    providers::Provider,
    sol_types::GenericContractError,
    transports::Transport,
};
use eyre::Result;
use serde::Serialize;
use tracing::{debug, info};

use super::OwnableClient;
use crate::contracts::{
    WrappedToken::{self, WrappedTokenErrors},
    IERC20,
};
use crate::events::{address_topic, DecodedLog, EventQuery};
use crate::session::{call_view, send_call, TxOutcome};

/// Token info helper struct
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenInfo {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

contract_client!(
    /// Any ERC20 token, e.g. the asset custodied by a lock bridge
    Erc20Client => IERC20::IERC20Instance
);

impl<T, P> Erc20Client<T, P>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    /// Name, symbol and decimals, fetched concurrently
    pub async fn token_info(&self) -> Result<TokenInfo> {
        let address = self.address();
        let (name, symbol, decimals) = tokio::try_join!(
            async {
                let call = self.options.call.apply(self.instance.name());
                call_view::<GenericContractError, _, _, _>(call, address, "name")
                    .await
                    .map(|r| r._0)
            },
            async {
                let call = self.options.call.apply(self.instance.symbol());
                call_view::<GenericContractError, _, _, _>(call, address, "symbol")
                    .await
                    .map(|r| r._0)
            },
            async {
                let call = self.options.call.apply(self.instance.decimals());
                call_view::<GenericContractError, _, _, _>(call, address, "decimals")
                    .await
                    .map(|r| r._0)
            }
        )?;

        Ok(TokenInfo {
            address,
            name,
            symbol,
            decimals,
        })
    }

    pub async fn total_supply(&self) -> Result<U256> {
        let call = self.options.call.apply(self.instance.totalSupply());
        Ok(
            call_view::<GenericContractError, _, _, _>(call, self.address(), "totalSupply")
                .await?
                ._0,
        )
    }

    pub async fn balance_of(&self, account: Address) -> Result<U256> {
        let call = self.options.call.apply(self.instance.balanceOf(account));
        Ok(
            call_view::<GenericContractError, _, _, _>(call, self.address(), "balanceOf")
                .await?
                ._0,
        )
    }

    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<U256> {
        let call = self.options.call.apply(self.instance.allowance(owner, spender));
        Ok(
            call_view::<GenericContractError, _, _, _>(call, self.address(), "allowance")
                .await?
                ._0,
        )
    }

    pub async fn transfer(&self, to: Address, amount: U256) -> Result<TxOutcome> {
        let call = self.options.transact.apply(self.instance.transfer(to, amount));
        send_call::<GenericContractError, _, _, _>(call, self.address(), "transfer").await
    }

    pub async fn approve(&self, spender: Address, amount: U256) -> Result<TxOutcome> {
        let call = self.options.transact.apply(self.instance.approve(spender, amount));
        send_call::<GenericContractError, _, _, _>(call, self.address(), "approve").await
    }

    /// Approve `spender` for `amount` unless `owner` already allows at least that much.
    ///
    /// Returns `None` when no transaction was needed.
    pub async fn ensure_allowance(
        &self,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<Option<TxOutcome>> {
        let current = self.allowance(owner, spender).await?;
        if current >= amount {
            debug!(
                token = %self.address(),
                spender = %spender,
                allowance = %current,
                "Allowance already sufficient"
            );
            return Ok(None);
        }

        info!(
            token = %self.address(),
            spender = %spender,
            current = %current,
            amount = %amount,
            "Approving token spend"
        );
        self.approve(spender, amount).await.map(Some)
    }

    /// Transfers filtered by sender and/or recipient (empty slice = any)
    pub async fn filter_transfers(
        &self,
        query: EventQuery,
        from: &[Address],
        to: &[Address],
    ) -> Result<Vec<DecodedLog<IERC20::Transfer>>> {
        let mut query = query;
        if !from.is_empty() {
            query = query.topic1(from.iter().copied().map(address_topic));
        }
        if !to.is_empty() {
            query = query.topic2(to.iter().copied().map(address_topic));
        }
        self.events().filter(&query).await
    }
}

contract_client!(
    /// Bridge-controlled wrapped token on the destination chain
    WrappedTokenClient => WrappedToken::WrappedTokenInstance
);

impl<T, P> WrappedTokenClient<T, P>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    /// Standard ERC20 view of the same token
    pub fn erc20(&self) -> Erc20Client<T, P>
    where
        P: Clone,
    {
        rebind!(self, Erc20Client)
    }

    pub fn ownable(&self) -> OwnableClient<T, P>
    where
        P: Clone,
    {
        rebind!(self, OwnableClient)
    }

    /// The only address allowed to mint and burn
    pub async fn bridge(&self) -> Result<Address> {
        let call = self.options.call.apply(self.instance.bridge());
        Ok(call_view::<WrappedTokenErrors, _, _, _>(call, self.address(), "bridge")
            .await?
            ._0)
    }

    pub async fn set_bridge(&self, new_bridge: Address) -> Result<TxOutcome> {
        let call = self.options.transact.apply(self.instance.setBridge(new_bridge));
        send_call::<WrappedTokenErrors, _, _, _>(call, self.address(), "setBridge").await
    }

    pub async fn mint(&self, to: Address, amount: U256) -> Result<TxOutcome> {
        let call = self.options.transact.apply(self.instance.mint(to, amount));
        send_call::<WrappedTokenErrors, _, _, _>(call, self.address(), "mint").await
    }

    pub async fn burn(&self, from: Address, amount: U256) -> Result<TxOutcome> {
        let call = self.options.transact.apply(self.instance.burn(from, amount));
        send_call::<WrappedTokenErrors, _, _, _>(call, self.address(), "burn").await
    }

    pub async fn filter_bridge_updated(
        &self,
        query: &EventQuery,
    ) -> Result<Vec<DecodedLog<WrappedToken::BridgeUpdated>>> {
        self.events().filter(query).await
    }
}
