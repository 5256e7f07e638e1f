use alloy::{
    primitives::{Address, B256, U256},
    providers::Provider,
    rpc::types::Log,
    transports::Transport,
};
use eyre::Result;
use tracing::info;

use super::{
    mixin_state, transfer_preview, BridgeStatus, FeeManagerClient, OwnableClient, PausableClient,
    RateLimiterClient, WrappedTokenClient,
};
use crate::contracts::MintBridge::{self, MintBridgeErrors, MintBridgeEvents};
use crate::events::{address_topic, parse_log, DecodedLog, EventQuery};
use crate::preview::TransferPreview;
use crate::session::{call_view, send_call, TxOutcome};
use crate::watcher::Subscription;

contract_client!(
    /// Destination-chain bridge minting and burning the wrapped token
    MintBridgeClient => MintBridge::MintBridgeInstance
);

impl<T, P> MintBridgeClient<T, P>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    pub fn ownable(&self) -> OwnableClient<T, P>
    where
        P: Clone,
    {
        rebind!(self, OwnableClient)
    }

    pub fn pausable(&self) -> PausableClient<T, P>
    where
        P: Clone,
    {
        rebind!(self, PausableClient)
    }

    pub fn fees(&self) -> FeeManagerClient<T, P>
    where
        P: Clone,
    {
        rebind!(self, FeeManagerClient)
    }

    pub fn rate_limiter(&self) -> RateLimiterClient<T, P>
    where
        P: Clone,
    {
        rebind!(self, RateLimiterClient)
    }

    /// Client for the wrapped token this bridge controls
    pub async fn wrapped_token_client(&self) -> Result<WrappedTokenClient<T, P>>
    where
        P: Clone,
    {
        let token = self.wrapped_token().await?;
        Ok(WrappedTokenClient::from_parts(
            token,
            self.provider().clone(),
            self.options,
            self.watcher.clone(),
        ))
    }

    pub async fn wrapped_token(&self) -> Result<Address> {
        let call = self.options.call.apply(self.instance.wrappedToken());
        Ok(
            call_view::<MintBridgeErrors, _, _, _>(call, self.address(), "wrappedToken")
                .await?
                ._0,
        )
    }

    /// Whether the lock identified by `source_tx_hash` was already minted
    pub async fn is_mint_processed(&self, source_tx_hash: B256) -> Result<bool> {
        let call = self
            .options
            .call
            .apply(self.instance.processedMints(source_tx_hash));
        Ok(
            call_view::<MintBridgeErrors, _, _, _>(call, self.address(), "processedMints")
                .await?
                ._0,
        )
    }

    pub async fn paused(&self) -> Result<bool> {
        let call = self.options.call.apply(self.instance.paused());
        Ok(call_view::<MintBridgeErrors, _, _, _>(call, self.address(), "paused")
            .await?
            ._0)
    }

    pub async fn owner(&self) -> Result<Address> {
        let call = self.options.call.apply(self.instance.owner());
        Ok(call_view::<MintBridgeErrors, _, _, _>(call, self.address(), "owner")
            .await?
            ._0)
    }

    /// What `burn(amount)` by `sender` would do right now
    pub async fn preview_burn(&self, sender: Address, amount: U256) -> Result<TransferPreview> {
        let (token, paused) = tokio::try_join!(self.wrapped_token(), self.paused())?;
        transfer_preview::<T, P>(
            self.provider(),
            self.address(),
            self.options,
            token,
            paused,
            sender,
            amount,
            false,
        )
        .await
    }

    pub async fn status(&self) -> Result<BridgeStatus> {
        let (token, owner, paused, (fees, limit, remaining_daily_limit)) = tokio::try_join!(
            self.wrapped_token(),
            self.owner(),
            self.paused(),
            mixin_state::<T, P>(self.provider(), self.address(), self.options)
        )?;

        Ok(BridgeStatus {
            address: self.address(),
            token,
            owner,
            paused,
            fees,
            limit,
            remaining_daily_limit,
            total_locked: None,
        })
    }

    /// Credit `recipient` for a lock observed on the source chain (owner only)
    pub async fn mint(
        &self,
        recipient: Address,
        amount: U256,
        source_tx_hash: B256,
    ) -> Result<TxOutcome> {
        let call = self
            .options
            .transact
            .apply(self.instance.mint(recipient, amount, source_tx_hash));
        let outcome = send_call::<MintBridgeErrors, _, _, _>(call, self.address(), "mint").await?;
        info!(
            tx_hash = %outcome.tx_hash,
            recipient = %recipient,
            amount = %amount,
            source_tx_hash = %source_tx_hash,
            "Wrapped tokens minted"
        );
        Ok(outcome)
    }

    /// Burn the caller's wrapped tokens to release them on the source chain
    pub async fn burn(&self, amount: U256) -> Result<TxOutcome> {
        let call = self.options.transact.apply(self.instance.burn(amount));
        let outcome = send_call::<MintBridgeErrors, _, _, _>(call, self.address(), "burn").await?;
        info!(tx_hash = %outcome.tx_hash, amount = %amount, "Wrapped tokens burned");
        Ok(outcome)
    }

    pub async fn pause(&self) -> Result<TxOutcome> {
        let call = self.options.transact.apply(self.instance.pause());
        send_call::<MintBridgeErrors, _, _, _>(call, self.address(), "pause").await
    }

    pub async fn unpause(&self) -> Result<TxOutcome> {
        let call = self.options.transact.apply(self.instance.unpause());
        send_call::<MintBridgeErrors, _, _, _>(call, self.address(), "unpause").await
    }

    fn minted_query(
        query: EventQuery,
        recipients: &[Address],
        source_tx_hashes: &[B256],
    ) -> EventQuery {
        let mut query = query;
        if !recipients.is_empty() {
            query = query.topic1(recipients.iter().copied().map(address_topic));
        }
        if !source_tx_hashes.is_empty() {
            query = query.topic2(source_tx_hashes.iter().copied());
        }
        query
    }

    fn burned_query(query: EventQuery, senders: &[Address]) -> EventQuery {
        if senders.is_empty() {
            query
        } else {
            query.topic1(senders.iter().copied().map(address_topic))
        }
    }

    pub async fn filter_minted(
        &self,
        query: EventQuery,
        recipients: &[Address],
        source_tx_hashes: &[B256],
    ) -> Result<Vec<DecodedLog<MintBridge::Minted>>> {
        self.events()
            .filter(&Self::minted_query(query, recipients, source_tx_hashes))
            .await
    }

    pub fn watch_minted(
        &self,
        query: EventQuery,
        recipients: &[Address],
        source_tx_hashes: &[B256],
    ) -> Subscription<MintBridge::Minted>
    where
        P: Clone + 'static,
    {
        self.watcher()
            .watch(Self::minted_query(query, recipients, source_tx_hashes))
    }

    pub fn parse_minted(&self, log: &Log) -> Result<DecodedLog<MintBridge::Minted>> {
        parse_log(log)
    }

    /// `Burned` events, optionally restricted to the given senders
    pub async fn filter_burned(
        &self,
        query: EventQuery,
        senders: &[Address],
    ) -> Result<Vec<DecodedLog<MintBridge::Burned>>> {
        self.events()
            .filter(&Self::burned_query(query, senders))
            .await
    }

    pub fn watch_burned(
        &self,
        query: EventQuery,
        senders: &[Address],
    ) -> Subscription<MintBridge::Burned>
    where
        P: Clone + 'static,
    {
        self.watcher().watch(Self::burned_query(query, senders))
    }

    pub fn parse_burned(&self, log: &Log) -> Result<DecodedLog<MintBridge::Burned>> {
        parse_log(log)
    }

    pub async fn filter_fee_collected(
        &self,
        query: &EventQuery,
    ) -> Result<Vec<DecodedLog<MintBridge::FeeCollected>>> {
        self.events().filter(query).await
    }

    /// Every event of the bridge in chain order
    pub async fn filter_all(&self, query: &EventQuery) -> Result<Vec<DecodedLog<MintBridgeEvents>>> {
        self.events().filter_all::<MintBridgeEvents>(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::tests::rpc_log;
    use alloy::providers::{ProviderBuilder, RootProvider};
    use alloy::transports::http::{Client, Http};

    type TestClient = MintBridgeClient<Http<Client>, RootProvider<Http<Client>>>;

    fn client() -> TestClient {
        let provider = ProviderBuilder::new().on_http("http://localhost:8545".parse().unwrap());
        MintBridgeClient::new(Address::repeat_byte(0x43), provider)
    }

    #[test]
    fn test_minted_query_filters_source_hash() {
        let source = B256::repeat_byte(0x11);
        let recipient = Address::repeat_byte(0x22);
        let query = TestClient::minted_query(
            EventQuery::new().from_block(5),
            &[recipient],
            &[source],
        );

        assert_eq!(query.from_block, Some(5));
        assert_eq!(query.topic1, vec![address_topic(recipient)]);
        assert_eq!(query.topic2, vec![source]);
        assert!(query.topic3.is_empty());
    }

    #[test]
    fn test_parse_burned_and_minted() {
        let bridge = client();
        let burned = MintBridge::Burned {
            sender: Address::repeat_byte(0x05),
            amount: U256::from(1_000u64),
        };
        let log = rpc_log(bridge.address(), &burned, 30, 0);
        assert_eq!(bridge.parse_burned(&log).unwrap().event, burned);
        assert!(bridge.parse_minted(&log).is_err());
    }

    #[test]
    fn test_mixins_bound_to_bridge() {
        let bridge = client();
        assert_eq!(bridge.rate_limiter().address(), bridge.address());
        assert_eq!(bridge.ownable().address(), bridge.address());
    }
}
