//! Transfer previews
//!
//! Combines a bridge's fee schedule, daily limit window and pause flag into
//! the outcome a `lock` or `burn` would have, without sending anything.

use alloy::primitives::U256;
use serde::Serialize;
use std::fmt;

use crate::fees::FeeSchedule;
use crate::rate_limit::{DailyLimitWindow, LimitError};

/// Why a transfer would be rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DenyReason {
    ZeroAmount,
    Paused,
    DailyLimitExceeded { requested: U256, remaining: U256 },
    InsufficientBalance { balance: U256, required: U256 },
    /// The bridge may not pull the gross amount from the sender yet
    InsufficientAllowance { allowance: U256, required: U256 },
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::ZeroAmount => write!(f, "amount is zero"),
            DenyReason::Paused => write!(f, "bridge is paused"),
            DenyReason::DailyLimitExceeded {
                requested,
                remaining,
            } => write!(
                f,
                "daily limit exceeded (requested {}, remaining {})",
                requested, remaining
            ),
            DenyReason::InsufficientBalance { balance, required } => write!(
                f,
                "insufficient balance (have {}, need {})",
                balance, required
            ),
            DenyReason::InsufficientAllowance {
                allowance,
                required,
            } => write!(
                f,
                "insufficient allowance (approved {}, need {})",
                allowance, required
            ),
        }
    }
}

/// Expected result of a user transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferPreview {
    /// Gross amount pulled from the user
    pub amount: U256,
    pub fee: U256,
    /// Amount credited on the other chain
    pub net_amount: U256,
    pub remaining_daily_limit: U256,
    pub paused: bool,
    pub allowed: bool,
    pub reason: Option<DenyReason>,
}

impl TransferPreview {
    /// Preview a transfer of `amount` at block timestamp `now`.
    ///
    /// The gross amount counts against the daily limit.
    pub fn build(
        amount: U256,
        fees: &FeeSchedule,
        window: &DailyLimitWindow,
        paused: bool,
        now: u64,
    ) -> Self {
        let fee = fees.fee_for(amount);
        let remaining_daily_limit = window.remaining(now);

        let reason = if amount.is_zero() {
            Some(DenyReason::ZeroAmount)
        } else if paused {
            Some(DenyReason::Paused)
        } else {
            match window.check(amount, now) {
                Ok(()) => None,
                Err(LimitError::Exceeded {
                    requested,
                    remaining,
                }) => Some(DenyReason::DailyLimitExceeded {
                    requested,
                    remaining,
                }),
            }
        };

        Self {
            amount,
            fee,
            net_amount: amount.saturating_sub(fee),
            remaining_daily_limit,
            paused,
            allowed: reason.is_none(),
            reason,
        }
    }

    /// Also deny when the sender holds less than the gross amount
    pub fn with_balance(mut self, balance: U256) -> Self {
        if self.allowed && balance < self.amount {
            self.allowed = false;
            self.reason = Some(DenyReason::InsufficientBalance {
                balance,
                required: self.amount,
            });
        }
        self
    }

    /// Also deny when the bridge is approved for less than the gross amount
    pub fn with_allowance(mut self, allowance: U256) -> Self {
        if self.allowed && allowance < self.amount {
            self.allowed = false;
            self.reason = Some(DenyReason::InsufficientAllowance {
                allowance,
                required: self.amount,
            });
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::SECONDS_PER_DAY;
    use alloy::primitives::Address;

    const NOW: u64 = 20 * SECONDS_PER_DAY + 500;

    fn fees() -> FeeSchedule {
        FeeSchedule::new(U256::from(30u64), U256::from(500u64), Address::ZERO)
    }

    fn window(limit: u64, used: u64) -> DailyLimitWindow {
        DailyLimitWindow::new(U256::from(limit), U256::from(used), 20)
    }

    #[test]
    fn test_allowed_preview() {
        let preview = TransferPreview::build(
            U256::from(1_000_000u64),
            &fees(),
            &window(10_000_000, 0),
            false,
            NOW,
        );

        assert!(preview.allowed);
        assert!(preview.reason.is_none());
        assert_eq!(preview.fee, U256::from(3_000u64));
        assert_eq!(preview.net_amount, U256::from(997_000u64));
        assert_eq!(preview.remaining_daily_limit, U256::from(10_000_000u64));
    }

    #[test]
    fn test_zero_amount_denied() {
        let preview = TransferPreview::build(U256::ZERO, &fees(), &window(100, 0), false, NOW);
        assert!(!preview.allowed);
        assert_eq!(preview.reason, Some(DenyReason::ZeroAmount));
    }

    #[test]
    fn test_paused_denied() {
        let preview =
            TransferPreview::build(U256::from(10u64), &fees(), &window(100, 0), true, NOW);
        assert!(!preview.allowed);
        assert!(preview.paused);
        assert_eq!(preview.reason, Some(DenyReason::Paused));
    }

    #[test]
    fn test_limit_checks_gross_amount() {
        // Net amount (997) would fit, gross (1000) does not
        let preview = TransferPreview::build(
            U256::from(1_000u64),
            &fees(),
            &window(5_000, 4_001),
            false,
            NOW,
        );
        assert!(!preview.allowed);
        assert_eq!(
            preview.reason,
            Some(DenyReason::DailyLimitExceeded {
                requested: U256::from(1_000u64),
                remaining: U256::from(999u64),
            })
        );
        assert!(preview
            .reason
            .unwrap()
            .to_string()
            .contains("daily limit exceeded"));
    }

    #[test]
    fn test_insufficient_balance() {
        let preview =
            TransferPreview::build(U256::from(500u64), &fees(), &window(0, 0), false, NOW);
        assert!(preview.clone().with_balance(U256::from(500u64)).allowed);

        let denied = preview.with_balance(U256::from(499u64));
        assert!(!denied.allowed);
        assert_eq!(
            denied.reason,
            Some(DenyReason::InsufficientBalance {
                balance: U256::from(499u64),
                required: U256::from(500u64),
            })
        );

        // An earlier denial is kept
        let paused = TransferPreview::build(U256::from(500u64), &fees(), &window(0, 0), true, NOW)
            .with_balance(U256::ZERO);
        assert_eq!(paused.reason, Some(DenyReason::Paused));
    }

    #[test]
    fn test_insufficient_allowance() {
        let preview =
            TransferPreview::build(U256::from(500u64), &fees(), &window(0, 0), false, NOW)
                .with_balance(U256::from(1_000u64));
        assert!(preview.clone().with_allowance(U256::from(500u64)).allowed);

        let denied = preview.with_allowance(U256::from(100u64));
        assert!(!denied.allowed);
        assert_eq!(
            denied.reason,
            Some(DenyReason::InsufficientAllowance {
                allowance: U256::from(100u64),
                required: U256::from(500u64),
            })
        );
        assert!(denied.reason.unwrap().to_string().contains("allowance"));

        // Balance is reported before allowance
        let poor = TransferPreview::build(U256::from(500u64), &fees(), &window(0, 0), false, NOW)
            .with_balance(U256::ZERO)
            .with_allowance(U256::ZERO);
        assert!(matches!(
            poor.reason,
            Some(DenyReason::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn test_preview_serializes_reason() {
        let preview = TransferPreview::build(U256::ZERO, &fees(), &window(0, 0), false, NOW);
        let json = serde_json::to_value(&preview).unwrap();
        assert_eq!(json["allowed"], false);
        assert_eq!(json["reason"]["kind"], "zero_amount");
    }
}
