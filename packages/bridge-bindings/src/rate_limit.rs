//! Off-chain daily limit model
//!
//! The bridges cap the volume of user transfers per UTC day
//! (`block.timestamp / 1 days`). Usage resets on the first transfer of a new
//! day. A limit of zero disables the cap.

use alloy::primitives::U256;
use serde::Serialize;
use thiserror::Error;

/// Rate limit period (24 hours)
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Day number of a unix timestamp
pub fn day_index(timestamp: u64) -> u64 {
    timestamp / SECONDS_PER_DAY
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimitError {
    #[error("daily limit exceeded: requested {requested}, remaining {remaining}")]
    Exceeded { requested: U256, remaining: U256 },
}

/// Snapshot of a rate limiter's state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyLimitWindow {
    pub limit: U256,
    /// Volume already used during `day`
    pub used: U256,
    /// Day index the usage belongs to
    pub day: u64,
}

impl DailyLimitWindow {
    pub fn new(limit: U256, used: U256, day: u64) -> Self {
        Self { limit, used, day }
    }

    /// No limit configured
    pub fn unlimited() -> Self {
        Self::new(U256::ZERO, U256::ZERO, 0)
    }

    pub fn is_unlimited(&self) -> bool {
        self.limit.is_zero()
    }

    fn used_at(&self, now: u64) -> U256 {
        if day_index(now) > self.day {
            U256::ZERO
        } else {
            self.used
        }
    }

    /// Volume still available at `now`; `U256::MAX` when unlimited
    pub fn remaining(&self, now: u64) -> U256 {
        if self.is_unlimited() {
            return U256::MAX;
        }
        self.limit.saturating_sub(self.used_at(now))
    }

    pub fn check(&self, amount: U256, now: u64) -> Result<(), LimitError> {
        let remaining = self.remaining(now);
        if amount > remaining {
            return Err(LimitError::Exceeded {
                requested: amount,
                remaining,
            });
        }
        Ok(())
    }

    /// Check `amount` and account for it
    pub fn record(&mut self, amount: U256, now: u64) -> Result<(), LimitError> {
        self.check(amount, now)?;

        let today = day_index(now);
        if today > self.day {
            self.day = today;
            self.used = U256::ZERO;
        }
        self.used = self.used.saturating_add(amount);
        Ok(())
    }
}
