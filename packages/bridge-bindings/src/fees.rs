//! Off-chain fee model
//!
//! Mirrors `FeeManager.calculateFee` so transfer previews agree with what the
//! bridge will actually charge.

use alloy::primitives::{Address, U256};
use serde::Serialize;
use thiserror::Error;

/// Basis points in 100%
pub const BPS_DENOMINATOR: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeeError {
    #[error("fee of {fee_bps} bps exceeds the maximum of {max_fee_bps} bps")]
    TooHigh { fee_bps: U256, max_fee_bps: U256 },
}

/// Snapshot of a bridge's fee configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeeSchedule {
    pub fee_bps: U256,
    pub max_fee_bps: U256,
    pub recipient: Address,
}

impl FeeSchedule {
    pub fn new(fee_bps: U256, max_fee_bps: U256, recipient: Address) -> Self {
        Self {
            fee_bps,
            max_fee_bps,
            recipient,
        }
    }

    /// Fee charged on `amount`: `amount * fee_bps / 10_000`, rounded down
    pub fn fee_for(&self, amount: U256) -> U256 {
        fee_for_bps(amount, self.fee_bps)
    }

    /// Amount left after the fee
    pub fn net_amount(&self, amount: U256) -> U256 {
        amount.saturating_sub(self.fee_for(amount))
    }

    pub fn validate(&self) -> Result<(), FeeError> {
        validate_fee_bps(self.fee_bps, self.max_fee_bps)
    }
}

/// Floor of `amount * fee_bps / 10_000` without intermediate overflow
pub fn fee_for_bps(amount: U256, fee_bps: U256) -> U256 {
    let denominator = U256::from(BPS_DENOMINATOR);
    if let Some(product) = amount.checked_mul(fee_bps) {
        return product / denominator;
    }

    // Split amount = q * D + r so the multiplication stays in range
    let (q, r) = amount.div_rem(denominator);
    q.saturating_mul(fee_bps)
        .saturating_add(r.saturating_mul(fee_bps) / denominator)
}

pub fn validate_fee_bps(fee_bps: U256, max_fee_bps: U256) -> Result<(), FeeError> {
    if fee_bps > max_fee_bps {
        return Err(FeeError::TooHigh {
            fee_bps,
            max_fee_bps,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(fee_bps: u64) -> FeeSchedule {
        FeeSchedule::new(U256::from(fee_bps), U256::from(500u64), Address::ZERO)
    }

    #[test]
    fn test_fee_for() {
        let fees = schedule(30); // 0.30%

        // 1,000,000 * 30 bps = 3,000
        assert_eq!(fees.fee_for(U256::from(1_000_000u64)), U256::from(3_000u64));
        assert_eq!(
            fees.net_amount(U256::from(1_000_000u64)),
            U256::from(997_000u64)
        );
    }

    #[test]
    fn test_fee_rounds_down() {
        let fees = schedule(30);
        // 333 * 30 / 10000 = 0.999
        assert_eq!(fees.fee_for(U256::from(333u64)), U256::ZERO);
        assert_eq!(fees.fee_for(U256::from(334u64)), U256::from(1u64));
        assert_eq!(fees.net_amount(U256::from(333u64)), U256::from(333u64));
    }

    #[test]
    fn test_zero_fee() {
        let fees = schedule(0);
        assert_eq!(fees.fee_for(U256::from(123_456u64)), U256::ZERO);
        assert_eq!(fees.net_amount(U256::from(123_456u64)), U256::from(123_456u64));
    }

    #[test]
    fn test_fee_on_huge_amount_does_not_overflow() {
        let fees = schedule(100); // 1%
        let fee = fees.fee_for(U256::MAX);
        assert_eq!(fee, U256::MAX / U256::from(100u64));
        assert_eq!(fees.net_amount(U256::MAX), U256::MAX - fee);
    }

    #[test]
    fn test_validate() {
        assert!(schedule(500).validate().is_ok());

        let err = schedule(501).validate().unwrap_err();
        assert_eq!(
            err,
            FeeError::TooHigh {
                fee_bps: U256::from(501u64),
                max_fee_bps: U256::from(500u64),
            }
        );
    }
}
