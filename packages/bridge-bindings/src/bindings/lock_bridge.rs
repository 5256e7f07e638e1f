use alloy::{
    primitives::{Address, B256, U256},
    providers::Provider,
    rpc::types::Log,
    transports::Transport,
};
use eyre::Result;
use tracing::info;

use super::{
    mixin_state, transfer_preview, BridgeStatus, Erc20Client, FeeManagerClient, OwnableClient,
    PausableClient, RateLimiterClient,
};
use crate::contracts::LockBridge::{self, LockBridgeErrors, LockBridgeEvents};
use crate::events::{address_topic, parse_log, DecodedLog, EventQuery};
use crate::preview::TransferPreview;
use crate::session::{call_view, send_call, SessionOptions, TxOutcome};
use crate::watcher::Subscription;

contract_client!(
    /// Source-chain bridge holding the native token in custody
    LockBridgeClient => LockBridge::LockBridgeInstance
);

impl<T, P> LockBridgeClient<T, P>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    // =========================================================================
    // Mixins
    // =========================================================================

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

    // =========================================================================
    // Queries
    // =========================================================================

    /// Custodied ERC20 token
    pub async fn token(&self) -> Result<Address> {
        let call = self.options.call.apply(self.instance.token());
        Ok(call_view::<LockBridgeErrors, _, _, _>(call, self.address(), "token")
            .await?
            ._0)
    }

    pub async fn total_locked(&self) -> Result<U256> {
        let call = self.options.call.apply(self.instance.totalLocked());
        Ok(
            call_view::<LockBridgeErrors, _, _, _>(call, self.address(), "totalLocked")
                .await?
                ._0,
        )
    }

    /// Whether the burn identified by `source_tx_hash` was already released
    pub async fn is_unlock_processed(&self, source_tx_hash: B256) -> Result<bool> {
        let call = self
            .options
            .call
            .apply(self.instance.processedUnlocks(source_tx_hash));
        Ok(
            call_view::<LockBridgeErrors, _, _, _>(call, self.address(), "processedUnlocks")
                .await?
                ._0,
        )
    }

    pub async fn paused(&self) -> Result<bool> {
        let call = self.options.call.apply(self.instance.paused());
        Ok(call_view::<LockBridgeErrors, _, _, _>(call, self.address(), "paused")
            .await?
            ._0)
    }

    pub async fn owner(&self) -> Result<Address> {
        let call = self.options.call.apply(self.instance.owner());
        Ok(call_view::<LockBridgeErrors, _, _, _>(call, self.address(), "owner")
            .await?
            ._0)
    }

    /// What `lock(amount)` by `sender` would do right now, allowance included
    pub async fn preview_lock(&self, sender: Address, amount: U256) -> Result<TransferPreview> {
        let (token, paused) = tokio::try_join!(self.token(), self.paused())?;
        transfer_preview::<T, P>(
            self.provider(),
            self.address(),
            self.options,
            token,
            paused,
            sender,
            amount,
            true,
        )
        .await
    }

    pub async fn status(&self) -> Result<BridgeStatus> {
        let (token, owner, paused, total_locked, (fees, limit, remaining_daily_limit)) = tokio::try_join!(
            self.token(),
            self.owner(),
            self.paused(),
            self.total_locked(),
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
            total_locked: Some(total_locked),
        })
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Lock `amount` of the token; the bridge must already be approved
    pub async fn lock(&self, amount: U256) -> Result<TxOutcome> {
        let call = self.options.transact.apply(self.instance.lock(amount));
        let outcome = send_call::<LockBridgeErrors, _, _, _>(call, self.address(), "lock").await?;
        info!(tx_hash = %outcome.tx_hash, amount = %amount, "Tokens locked");
        Ok(outcome)
    }

    /// Session for the approval sent ahead of a lock
    fn approval_options(&self) -> SessionOptions {
        SessionOptions {
            call: self.options.call,
            transact: self.options.transact.preceding(),
        }
    }

    /// Approve the bridge for `amount` if needed, then lock.
    ///
    /// The approval carries no value or gas limit; with a fixed nonce the
    /// lock takes the next one.
    pub async fn lock_with_approval(&self, owner: Address, amount: U256) -> Result<TxOutcome>
    where
        P: Clone,
    {
        let token = self.token().await?;
        let erc20 = Erc20Client::from_parts(
            token,
            self.provider().clone(),
            self.approval_options(),
            self.watcher.clone(),
        );
        let approval = erc20.ensure_allowance(owner, self.address(), amount).await?;

        let sent = u64::from(approval.is_some());
        self.with_transact_options(self.options.transact.after(sent))
            .lock(amount)
            .await
    }

    /// Release custody for a burn observed on the destination chain (owner only)
    pub async fn unlock(
        &self,
        recipient: Address,
        amount: U256,
        source_tx_hash: B256,
    ) -> Result<TxOutcome> {
        let call = self
            .options
            .transact
            .apply(self.instance.unlock(recipient, amount, source_tx_hash));
        let outcome =
            send_call::<LockBridgeErrors, _, _, _>(call, self.address(), "unlock").await?;
        info!(
            tx_hash = %outcome.tx_hash,
            recipient = %recipient,
            amount = %amount,
            source_tx_hash = %source_tx_hash,
            "Tokens unlocked"
        );
        Ok(outcome)
    }

    pub async fn pause(&self) -> Result<TxOutcome> {
        let call = self.options.transact.apply(self.instance.pause());
        send_call::<LockBridgeErrors, _, _, _>(call, self.address(), "pause").await
    }

    pub async fn unpause(&self) -> Result<TxOutcome> {
        let call = self.options.transact.apply(self.instance.unpause());
        send_call::<LockBridgeErrors, _, _, _>(call, self.address(), "unpause").await
    }

    // =========================================================================
    // Events
    // =========================================================================

    fn locked_query(query: EventQuery, senders: &[Address]) -> EventQuery {
        if senders.is_empty() {
            query
        } else {
            query.topic1(senders.iter().copied().map(address_topic))
        }
    }

    fn unlocked_query(
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

    /// `Locked` events, optionally restricted to the given senders
    pub async fn filter_locked(
        &self,
        query: EventQuery,
        senders: &[Address],
    ) -> Result<Vec<DecodedLog<LockBridge::Locked>>> {
        self.events()
            .filter(&Self::locked_query(query, senders))
            .await
    }

    pub fn watch_locked(
        &self,
        query: EventQuery,
        senders: &[Address],
    ) -> Subscription<LockBridge::Locked>
    where
        P: Clone + 'static,
    {
        self.watcher().watch(Self::locked_query(query, senders))
    }

    pub fn parse_locked(&self, log: &Log) -> Result<DecodedLog<LockBridge::Locked>> {
        parse_log(log)
    }

    pub async fn filter_unlocked(
        &self,
        query: EventQuery,
        recipients: &[Address],
        source_tx_hashes: &[B256],
    ) -> Result<Vec<DecodedLog<LockBridge::Unlocked>>> {
        self.events()
            .filter(&Self::unlocked_query(query, recipients, source_tx_hashes))
            .await
    }

    pub fn watch_unlocked(
        &self,
        query: EventQuery,
        recipients: &[Address],
        source_tx_hashes: &[B256],
    ) -> Subscription<LockBridge::Unlocked>
    where
        P: Clone + 'static,
    {
        self.watcher()
            .watch(Self::unlocked_query(query, recipients, source_tx_hashes))
    }

    pub fn parse_unlocked(&self, log: &Log) -> Result<DecodedLog<LockBridge::Unlocked>> {
        parse_log(log)
    }

    pub async fn filter_fee_collected(
        &self,
        query: &EventQuery,
    ) -> Result<Vec<DecodedLog<LockBridge::FeeCollected>>> {
        self.events().filter(query).await
    }

    /// Every event of the bridge in chain order
    pub async fn filter_all(&self, query: &EventQuery) -> Result<Vec<DecodedLog<LockBridgeEvents>>> {
        self.events().filter_all::<LockBridgeEvents>(query).await
    }
}
