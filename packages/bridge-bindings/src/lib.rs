//! Bridge Bindings
//!
//! Typed EVM bindings for the lock/mint token bridge: a `LockBridge` holding
//! the native token on the source chain, a `MintBridge` and `WrappedToken` on
//! the destination chain, and the mixins they share (`Ownable`, `Pausable`,
//! `ReentrancyGuard`, `FeeManager`, `DailyRateLimiter`).
//!
//! ## Modules
//!
//! - [`contracts`] - `sol!` declarations of every contract
//! - [`abi`] - JSON ABIs and artifact compatibility checks
//! - [`artifacts`] - Foundry/Hardhat compiler output
//! - [`deploy`] - Contract deployment
//! - [`bindings`] - Typed clients (reads, transactions, event filters)
//! - [`session`] - Call and transaction options
//! - [`events`] / [`watcher`] - Log decoding, filtering and watching
//! - [`fees`] / [`rate_limit`] / [`preview`] - Off-chain models of bridge rules
//! - [`relay`] - Lock/mint pairing
//! - [`client`] / [`config`] - Provider construction and environment config
//!
//! ## Example
//!
//! ```ignore
//! use bridge_bindings::{bindings::LockBridgeClient, client::read_provider, events::EventQuery};
//!
//! let provider = read_provider("http://localhost:8545")?;
//! let bridge = LockBridgeClient::new(bridge_address, provider);
//!
//! let preview = bridge.preview_lock(sender, amount).await?;
//! for locked in bridge.filter_locked(EventQuery::range(0, 1000), &[]).await? {
//!     println!("{} locked {}", locked.event.sender, locked.event.amount);
//! }
//! ```

pub mod abi;
pub mod artifacts;
pub mod bindings;
pub mod client;
pub mod config;
pub mod contracts;
pub mod deploy;
pub mod error;
pub mod events;
pub mod fees;
pub mod preview;
pub mod rate_limit;
pub mod redact;
pub mod relay;
pub mod session;
pub mod watcher;

pub use abi::{check_compatibility, AbiReport, ContractKind};
pub use artifacts::Artifact;
pub use bindings::{
    BridgeStatus, Erc20Client, FeeManagerClient, LockBridgeClient, MintBridgeClient,
    OwnableClient, PausableClient, RateLimiterClient, TokenInfo, WrappedTokenClient,
};
pub use deploy::{
    deploy_contract, deploy_lock_bridge, deploy_mint_bridge, deploy_wrapped_token, BridgeInit,
    Deployment, WrappedTokenInit,
};
pub use error::BindingError;
pub use events::{parse_log, DecodedLog, EventQuery, LogMeta};
pub use fees::{FeeError, FeeSchedule};
pub use preview::{DenyReason, TransferPreview};
pub use rate_limit::{DailyLimitWindow, LimitError};
pub use relay::{MintOrder, RelaySummary, Relayer, UnlockOrder};
pub use session::{CallOptions, SessionOptions, TransactOptions, TxOutcome};
pub use watcher::{EventWatcher, Subscription, WatcherConfig};
