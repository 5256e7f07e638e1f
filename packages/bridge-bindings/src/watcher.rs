//! Event filtering and watching
//!
//! Polling-based, like the rest of the bindings: logs are fetched with
//! `eth_getLogs` in bounded block windows and decoded with
//! [`crate::events::parse_log`]. Watching spawns a task that keeps polling
//! the safe head and pushes decoded events into a [`Subscription`].
//!
//! ## Usage
//!
//! ```ignore
//! let watcher = EventWatcher::new(provider, bridge_address);
//! let locked = watcher.filter::<LockBridge::Locked>(&EventQuery::range(100, 200)).await?;
//!
//! let mut sub = watcher.watch::<LockBridge::Locked>(EventQuery::new());
//! while let Some(event) = sub.next().await {
//!     let event = event?;
//! }
//! ```

use alloy::{
    primitives::Address,
    providers::Provider,
    rpc::types::{Filter, Log},
    sol_types::{SolEvent, SolEventInterface},
    transports::Transport,
};
use eyre::{Result, WrapErr};
use futures::Stream;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::events::{parse_log, DecodedLog, EventQuery, LogMeta};

/// Buffered events per subscription before the poller waits on the consumer
const SUBSCRIPTION_BUFFER: usize = 256;

/// Event watcher configuration
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Poll interval between checks
    pub poll_interval: Duration,
    /// Number of confirmations before a block is considered safe
    pub confirmations: u64,
    /// Maximum block range per query (to avoid RPC limits)
    pub max_block_range: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            confirmations: 1,
            max_block_range: 10_000,
        }
    }
}

/// Split `[from, to]` into inclusive windows of at most `max_range` blocks
pub fn chunk_ranges(from: u64, to: u64, max_range: u64) -> Vec<(u64, u64)> {
    let max_range = max_range.max(1);
    let mut ranges = Vec::new();
    let mut current = from;

    while current <= to {
        let end = current.saturating_add(max_range - 1).min(to);
        ranges.push((current, end));
        if end == u64::MAX {
            break;
        }
        current = end + 1;
    }
    ranges
}

/// Log filterer and watcher bound to one contract address
pub struct EventWatcher<T, P> {
    provider: P,
    address: Address,
    config: WatcherConfig,
    _transport: PhantomData<T>,
}

impl<T, P: Clone> Clone for EventWatcher<T, P> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            address: self.address,
            config: self.config.clone(),
            _transport: PhantomData,
        }
    }
}

impl<T, P> EventWatcher<T, P>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    /// Create a new event watcher
    pub fn new(provider: P, address: Address) -> Self {
        Self::with_config(provider, address, WatcherConfig::default())
    }

    /// Create with custom configuration
    pub fn with_config(provider: P, address: Address, config: WatcherConfig) -> Self {
        Self {
            provider,
            address,
            config,
            _transport: PhantomData,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn config(&self) -> &WatcherConfig {
        &self.config
    }

    /// Latest block minus the configured confirmations
    pub async fn safe_head(&self) -> Result<u64> {
        let current = self
            .provider
            .get_block_number()
            .await
            .wrap_err("Failed to get block number")?;
        Ok(current.saturating_sub(self.config.confirmations))
    }

    async fn resolve_range(&self, query: &EventQuery) -> Result<(u64, u64)> {
        let from = query.from_block.unwrap_or(0);
        let to = match query.to_block {
            Some(to) => to,
            None => self.safe_head().await?,
        };
        Ok((from, to))
    }

    async fn get_logs_chunked(&self, from: u64, to: u64, filter: impl Fn(u64, u64) -> Filter) -> Result<Vec<Log>> {
        let mut all_logs = Vec::new();

        for (start, end) in chunk_ranges(from, to, self.config.max_block_range) {
            let logs = self
                .provider
                .get_logs(&filter(start, end))
                .await
                .wrap_err_with(|| format!("Failed to get logs from block {} to {}", start, end))?;
            all_logs.extend(logs);
        }

        Ok(all_logs)
    }

    /// Fetch and decode every `E` log matching `query` in `[from, to]`
    pub async fn filter_range<E: SolEvent>(
        &self,
        query: &EventQuery,
        from: u64,
        to: u64,
    ) -> Result<Vec<DecodedLog<E>>> {
        if from > to {
            return Ok(Vec::new());
        }

        let logs = self
            .get_logs_chunked(from, to, |start, end| {
                query.to_filter::<E>(self.address, start, end)
            })
            .await?;

        let mut events = Vec::with_capacity(logs.len());
        for log in &logs {
            match parse_log::<E>(log) {
                Ok(event) => events.push(event),
                Err(e) => warn!(
                    event = E::SIGNATURE,
                    block = ?log.block_number,
                    tx = ?log.transaction_hash,
                    error = %e,
                    "Failed to parse event from log"
                ),
            }
        }
        events.sort_by_key(|e| e.meta.position());

        if !events.is_empty() {
            debug!(
                event = E::SIGNATURE,
                count = events.len(),
                from = from,
                to = to,
                "Found events"
            );
        }

        Ok(events)
    }

    /// Fetch and decode every `E` log matching `query`.
    ///
    /// Without an explicit `to_block` the range ends at the safe head.
    pub async fn filter<E: SolEvent>(&self, query: &EventQuery) -> Result<Vec<DecodedLog<E>>> {
        let (from, to) = self.resolve_range(query).await?;
        self.filter_range::<E>(query, from, to).await
    }

    /// Decode every log of the contract into its events enum.
    ///
    /// Topic constraints in `query` are ignored; logs of unknown events are skipped.
    pub async fn filter_all<I: SolEventInterface>(
        &self,
        query: &EventQuery,
    ) -> Result<Vec<DecodedLog<I>>> {
        let (from, to) = self.resolve_range(query).await?;
        if from > to {
            return Ok(Vec::new());
        }

        let address = self.address;
        let logs = self
            .get_logs_chunked(from, to, |start, end| {
                Filter::new().address(address).from_block(start).to_block(end)
            })
            .await?;

        let mut events = Vec::with_capacity(logs.len());
        for log in &logs {
            match I::decode_log(&log.inner, true) {
                Ok(decoded) => events.push(DecodedLog {
                    event: decoded.data,
                    meta: LogMeta::from_log(log),
                }),
                Err(e) => debug!(
                    topic0 = ?log.topic0(),
                    block = ?log.block_number,
                    error = %e,
                    "Skipping unrecognized log"
                ),
            }
        }
        events.sort_by_key(|e| e.meta.position());

        Ok(events)
    }
}

impl<T, P> EventWatcher<T, P>
where
    T: Transport + Clone,
    P: Provider<T> + Clone + 'static,
{
    /// Stream `E` events as they reach the safe head.
    ///
    /// Starts at `query.from_block`, or the block after the current safe head
    /// when unset. Stops after `query.to_block` if given. The first RPC error
    /// is delivered and ends the subscription.
    pub fn watch<E>(&self, query: EventQuery) -> Subscription<E>
    where
        E: SolEvent + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let watcher = self.clone();

        let handle = tokio::spawn(async move {
            let mut next = match query.from_block {
                Some(block) => block,
                None => match watcher.safe_head().await {
                    Ok(head) => head + 1,
                    Err(e) => {
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                },
            };

            debug!(
                event = E::SIGNATURE,
                address = %watcher.address,
                from = next,
                "Starting event watch"
            );

            loop {
                if let Some(end) = query.to_block {
                    if next > end {
                        debug!(event = E::SIGNATURE, end = end, "Watch reached end block");
                        return;
                    }
                }

                let head = match watcher.safe_head().await {
                    Ok(head) => head,
                    Err(e) => {
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                };
                let until = query.to_block.map_or(head, |end| end.min(head));

                if next <= until {
                    match watcher.filter_range::<E>(&query, next, until).await {
                        Ok(events) => {
                            for event in events {
                                if tx.send(Ok(event)).await.is_err() {
                                    return;
                                }
                            }
                        }
                        Err(e) => {
                            let _ = tx.send(Err(e)).await;
                            return;
                        }
                    }
                    next = until + 1;
                }

                if tx.is_closed() {
                    return;
                }
                tokio::time::sleep(watcher.config.poll_interval).await;
            }
        });

        Subscription::from_parts(rx, handle)
    }
}

/// Live event feed produced by [`EventWatcher::watch`].
///
/// Dropping or closing the subscription stops the polling task.
pub struct Subscription<E> {
    rx: mpsc::Receiver<Result<DecodedLog<E>>>,
    handle: JoinHandle<()>,
}

impl<E> Subscription<E> {
    pub(crate) fn from_parts(rx: mpsc::Receiver<Result<DecodedLog<E>>>, handle: JoinHandle<()>) -> Self {
        Self { rx, handle }
    }

    /// Next event, `None` once the watch has ended
    pub async fn next(&mut self) -> Option<Result<DecodedLog<E>>> {
        self.rx.recv().await
    }

    /// Stop watching
    pub fn close(mut self) {
        self.handle.abort();
        self.rx.close();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl<E> Drop for Subscription<E> {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl<E> Stream for Subscription<E> {
    type Item = Result<DecodedLog<E>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::LockBridge;
    use crate::client::read_provider;
    use crate::events::tests::rpc_log;
    use alloy::primitives::U256;
    use alloy::providers::RootProvider;
    use alloy::transports::http::{Client, Http};
    use futures::StreamExt;

    #[test]
    fn test_watcher_config_default() {
        let config = WatcherConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.confirmations, 1);
        assert_eq!(config.max_block_range, 10_000);
    }

    #[test]
    fn test_chunk_ranges() {
        assert_eq!(chunk_ranges(0, 9, 10), vec![(0, 9)]);
        assert_eq!(chunk_ranges(0, 10, 10), vec![(0, 9), (10, 10)]);
        assert_eq!(chunk_ranges(5, 25, 7), vec![(5, 11), (12, 18), (19, 25)]);
        assert!(chunk_ranges(10, 9, 5).is_empty());
        // zero range is treated as single-block windows
        assert_eq!(chunk_ranges(1, 3, 0), vec![(1, 1), (2, 2), (3, 3)]);
        assert_eq!(chunk_ranges(u64::MAX - 1, u64::MAX, 10), vec![(u64::MAX - 1, u64::MAX)]);
    }

    fn locked(block: u64) -> DecodedLog<LockBridge::Locked> {
        let event = LockBridge::Locked {
            sender: Address::repeat_byte(0x01),
            amount: U256::from(block),
        };
        parse_log(&rpc_log(Address::ZERO, &event, block, 0)).unwrap()
    }

    #[tokio::test]
    async fn test_subscription_stream_delivers_in_order() {
        let (tx, rx) = mpsc::channel(4);
        let handle = tokio::spawn(async move {
            for block in [1u64, 2, 3] {
                tx.send(Ok(locked(block))).await.unwrap();
            }
        });

        let sub = Subscription::from_parts(rx, handle);
        let events: Vec<_> = sub.collect().await;

        let blocks: Vec<_> = events
            .into_iter()
            .map(|e| e.unwrap().meta.block_number.unwrap())
            .collect();
        assert_eq!(blocks, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_subscription_delivers_error_then_ends() {
        let (tx, rx) = mpsc::channel(4);
        let handle = tokio::spawn(async move {
            tx.send(Ok(locked(1))).await.unwrap();
            tx.send(Err(eyre::eyre!("rpc unavailable"))).await.unwrap();
        });

        let mut sub = Subscription::from_parts(rx, handle);
        assert!(sub.next().await.unwrap().is_ok());
        let err = sub.next().await.unwrap().unwrap_err();
        assert!(err.to_string().contains("rpc unavailable"));
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn test_dropping_subscription_aborts_task() {
        let (_tx, rx) = mpsc::channel::<Result<DecodedLog<LockBridge::Locked>>>(1);
        let handle = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });
        let abort = handle.abort_handle();

        let sub = Subscription::from_parts(rx, handle);
        assert!(!sub.is_finished());
        drop(sub);

        for _ in 0..100 {
            if abort.is_finished() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(abort.is_finished());
    }

    /// Watcher on a port nothing listens on
    fn offline_watcher() -> EventWatcher<Http<Client>, RootProvider<Http<Client>>> {
        let provider = read_provider("http://127.0.0.1:1").unwrap();
        EventWatcher::new(provider, Address::repeat_byte(0x42))
    }

    #[tokio::test]
    async fn test_watch_from_safe_head_delivers_rpc_error_then_ends() {
        let mut sub = offline_watcher().watch::<LockBridge::Locked>(EventQuery::new());

        let err = sub.next().await.unwrap().unwrap_err();
        assert!(err.to_string().contains("Failed to get block number"));
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn test_watch_from_block_delivers_rpc_error_then_ends() {
        let mut sub = offline_watcher().watch::<LockBridge::Locked>(EventQuery::new().from_block(5));

        assert!(sub.next().await.unwrap().is_err());
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn test_watch_past_end_block_ends_without_rpc() {
        let mut sub = offline_watcher().watch::<LockBridge::Locked>(EventQuery::range(10, 5));
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn test_filter_propagates_rpc_errors() {
        let watcher = offline_watcher();

        let err = watcher
            .filter::<LockBridge::Locked>(&EventQuery::range(1, 2))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to get logs from block 1 to 2"));

        // Open-ended queries need the safe head first
        let err = watcher
            .filter::<LockBridge::Locked>(&EventQuery::new().from_block(1))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to get block number"));

        assert!(watcher
            .filter_all::<LockBridge::LockBridgeEvents>(&EventQuery::range(1, 2))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_filter_empty_range_skips_rpc() {
        let events = offline_watcher()
            .filter_range::<LockBridge::Locked>(&EventQuery::new(), 9, 3)
            .await
            .unwrap();
        assert!(events.is_empty());
    }
}
