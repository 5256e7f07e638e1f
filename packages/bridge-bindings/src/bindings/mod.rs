//! Typed contract clients
//!
//! One client per contract, each wrapping the generated `sol!` instance with
//! the [`SessionOptions`](crate::session::SessionOptions) applied to every
//! call. Reads, writes and event queries live on the same client. Mixin
//! functionality of the bridges is reached by re-binding the bridge address
//! (`bridge.fees()`, `bridge.rate_limiter()`, ...).

use alloy::{
    primitives::{Address, U256},
    providers::Provider,
    transports::Transport,
};
use eyre::Result;
use serde::Serialize;

use crate::client::latest_timestamp;
use crate::fees::FeeSchedule;
use crate::preview::TransferPreview;
use crate::rate_limit::DailyLimitWindow;
use crate::session::SessionOptions;
use crate::watcher::WatcherConfig;

/// Generates the client struct and the accessors every client shares
macro_rules! contract_client {
    ($(#[$doc:meta])* $client:ident => $contract:ident :: $instance:ident) => {
        $(#[$doc])*
        #[derive(Clone)]
        pub struct $client<T, P> {
            instance: $crate::contracts::$contract::$instance<T, P>,
            options: $crate::session::SessionOptions,
            watcher: $crate::watcher::WatcherConfig,
        }

        impl<T, P> $client<T, P>
        where
            T: ::alloy::transports::Transport + Clone,
            P: ::alloy::providers::Provider<T>,
        {
            /// Bind to a deployed contract
            pub fn new(address: ::alloy::primitives::Address, provider: P) -> Self {
                Self::from_parts(
                    address,
                    provider,
                    $crate::session::SessionOptions::default(),
                    $crate::watcher::WatcherConfig::default(),
                )
            }

            pub(crate) fn from_parts(
                address: ::alloy::primitives::Address,
                provider: P,
                options: $crate::session::SessionOptions,
                watcher: $crate::watcher::WatcherConfig,
            ) -> Self {
                Self {
                    instance: $crate::contracts::$contract::new(address, provider),
                    options,
                    watcher,
                }
            }

            pub fn address(&self) -> ::alloy::primitives::Address {
                *self.instance.address()
            }

            pub fn provider(&self) -> &P {
                self.instance.provider()
            }

            pub fn options(&self) -> &$crate::session::SessionOptions {
                &self.options
            }

            /// Generated `sol!` instance, for calls the client does not wrap
            pub fn instance(&self) -> &$crate::contracts::$contract::$instance<T, P> {
                &self.instance
            }

            /// Copy of this client using `options` for every call
            pub fn with_options(&self, options: $crate::session::SessionOptions) -> Self
            where
                P: Clone,
            {
                let mut client = self.clone();
                client.options = options;
                client
            }

            pub fn with_call_options(&self, call: $crate::session::CallOptions) -> Self
            where
                P: Clone,
            {
                let mut client = self.clone();
                client.options.call = call;
                client
            }

            pub fn with_transact_options(&self, transact: $crate::session::TransactOptions) -> Self
            where
                P: Clone,
            {
                let mut client = self.clone();
                client.options.transact = transact;
                client
            }

            pub fn with_watcher_config(mut self, config: $crate::watcher::WatcherConfig) -> Self {
                self.watcher = config;
                self
            }

            /// Log filterer bound to this contract
            pub fn events(&self) -> $crate::watcher::EventWatcher<T, &P> {
                $crate::watcher::EventWatcher::with_config(
                    self.provider(),
                    self.address(),
                    self.watcher.clone(),
                )
            }

            /// Owned watcher, needed for subscriptions
            pub fn watcher(&self) -> $crate::watcher::EventWatcher<T, P>
            where
                P: Clone,
            {
                $crate::watcher::EventWatcher::with_config(
                    self.provider().clone(),
                    self.address(),
                    self.watcher.clone(),
                )
            }
        }
    };
}

/// Re-binds a client's address, provider and options to another client type
macro_rules! rebind {
    ($self:ident, $client:ident) => {
        $client::from_parts(
            $self.address(),
            $self.provider().clone(),
            $self.options,
            $self.watcher.clone(),
        )
    };
}

mod fee_manager;
mod lock_bridge;
mod mint_bridge;
mod ownable;
mod pausable;
mod rate_limiter;
mod token;

pub use fee_manager::FeeManagerClient;
pub use lock_bridge::LockBridgeClient;
pub use mint_bridge::MintBridgeClient;
pub use ownable::OwnableClient;
pub use pausable::PausableClient;
pub use rate_limiter::RateLimiterClient;
pub use token::{Erc20Client, TokenInfo, WrappedTokenClient};

/// Snapshot of a bridge's configuration and state
#[derive(Debug, Clone, Serialize)]
pub struct BridgeStatus {
    pub address: Address,
    /// Custodied token (lock side) or wrapped token (mint side)
    pub token: Address,
    pub owner: Address,
    pub paused: bool,
    pub fees: FeeSchedule,
    pub limit: DailyLimitWindow,
    pub remaining_daily_limit: U256,
    /// Only reported by the lock side
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_locked: Option<U256>,
}

/// Fee schedule, limit window and contract-computed remaining limit of a bridge
pub(crate) async fn mixin_state<T, P>(
    provider: &P,
    bridge: Address,
    options: SessionOptions,
) -> Result<(FeeSchedule, DailyLimitWindow, U256)>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    let fees = FeeManagerClient::<T, &P>::from_parts(bridge, provider, options, WatcherConfig::default());
    let limiter =
        RateLimiterClient::<T, &P>::from_parts(bridge, provider, options, WatcherConfig::default());

    tokio::try_join!(
        fees.schedule(),
        limiter.window(),
        limiter.remaining_daily_limit()
    )
}

/// Preview a user transfer of `token` into `bridge`.
///
/// With `check_allowance` the bridge must also be approved for the gross
/// amount, as `lock` pulls it with `transferFrom`.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn transfer_preview<T, P>(
    provider: &P,
    bridge: Address,
    options: SessionOptions,
    token: Address,
    paused: bool,
    sender: Address,
    amount: U256,
    check_allowance: bool,
) -> Result<TransferPreview>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    let erc20 = Erc20Client::<T, &P>::from_parts(token, provider, options, WatcherConfig::default());

    let allowance = async {
        if check_allowance {
            erc20.allowance(sender, bridge).await.map(Some)
        } else {
            Ok(None)
        }
    };

    let ((fees, window, _), now, balance, allowance) = tokio::try_join!(
        mixin_state::<T, P>(provider, bridge, options),
        latest_timestamp::<T, P>(provider),
        erc20.balance_of(sender),
        allowance
    )?;

    let preview = TransferPreview::build(amount, &fees, &window, paused, now).with_balance(balance);
    Ok(match allowance {
        Some(allowance) => preview.with_allowance(allowance),
        None => preview,
    })
}
