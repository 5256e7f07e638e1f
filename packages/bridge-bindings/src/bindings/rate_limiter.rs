use alloy::{primitives::U256, providers::Provider, transports::Transport};
use eyre::Result;

use crate::contracts::DailyRateLimiter::{self, DailyRateLimiterErrors};
use crate::events::{DecodedLog, EventQuery};
use crate::rate_limit::DailyLimitWindow;
use crate::session::{call_view, send_call, TxOutcome};

contract_client!(
    /// Daily volume cap of a bridge
    RateLimiterClient => DailyRateLimiter::DailyRateLimiterInstance
);

impl<T, P> RateLimiterClient<T, P>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    /// Configured limit; zero means unlimited
    pub async fn daily_limit(&self) -> Result<U256> {
        let call = self.options.call.apply(self.instance.dailyLimit());
        Ok(
            call_view::<DailyRateLimiterErrors, _, _, _>(call, self.address(), "dailyLimit")
                .await?
                ._0,
        )
    }

    /// Usage recorded on `last_reset_day`
    pub async fn daily_usage(&self) -> Result<U256> {
        let call = self.options.call.apply(self.instance.dailyUsage());
        Ok(
            call_view::<DailyRateLimiterErrors, _, _, _>(call, self.address(), "dailyUsage")
                .await?
                .used,
        )
    }

    pub async fn last_reset_day(&self) -> Result<u64> {
        let call = self.options.call.apply(self.instance.lastResetDay());
        let day =
            call_view::<DailyRateLimiterErrors, _, _, _>(call, self.address(), "lastResetDay")
                .await?
                ._0;
        Ok(day.saturating_to())
    }

    /// Remaining volume as computed by the contract at the current block
    pub async fn remaining_daily_limit(&self) -> Result<U256> {
        let call = self.options.call.apply(self.instance.remainingDailyLimit());
        Ok(call_view::<DailyRateLimiterErrors, _, _, _>(
            call,
            self.address(),
            "remainingDailyLimit",
        )
        .await?
        .remaining)
    }

    /// Current limiter state as an off-chain model
    pub async fn window(&self) -> Result<DailyLimitWindow> {
        let (limit, used, day) =
            tokio::try_join!(self.daily_limit(), self.daily_usage(), self.last_reset_day())?;
        Ok(DailyLimitWindow::new(limit, used, day))
    }

    pub async fn set_daily_limit(&self, new_limit: U256) -> Result<TxOutcome> {
        let call = self.options.transact.apply(self.instance.setDailyLimit(new_limit));
        send_call::<DailyRateLimiterErrors, _, _, _>(call, self.address(), "setDailyLimit").await
    }

    pub async fn filter_daily_limit_updated(
        &self,
        query: &EventQuery,
    ) -> Result<Vec<DecodedLog<DailyRateLimiter::DailyLimitUpdated>>> {
        self.events().filter(query).await
    }
}
