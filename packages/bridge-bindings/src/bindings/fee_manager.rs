use alloy::{
    primitives::{Address, U256},
    providers::Provider,
    transports::Transport,
};
use eyre::{Result, WrapErr};

use crate::contracts::FeeManager::{self, FeeManagerErrors};
use crate::events::{DecodedLog, EventQuery};
use crate::fees::{validate_fee_bps, FeeSchedule};
use crate::session::{call_view, send_call, TxOutcome};

contract_client!(
    /// Fee configuration of a bridge
    FeeManagerClient => FeeManager::FeeManagerInstance
);

impl<T, P> FeeManagerClient<T, P>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    pub async fn fee_bps(&self) -> Result<U256> {
        let call = self.options.call.apply(self.instance.feeBps());
        Ok(call_view::<FeeManagerErrors, _, _, _>(call, self.address(), "feeBps")
            .await?
            ._0)
    }

    pub async fn fee_recipient(&self) -> Result<Address> {
        let call = self.options.call.apply(self.instance.feeRecipient());
        Ok(
            call_view::<FeeManagerErrors, _, _, _>(call, self.address(), "feeRecipient")
                .await?
                ._0,
        )
    }

    pub async fn max_fee_bps(&self) -> Result<U256> {
        let call = self.options.call.apply(self.instance.MAX_FEE_BPS());
        Ok(
            call_view::<FeeManagerErrors, _, _, _>(call, self.address(), "MAX_FEE_BPS")
                .await?
                ._0,
        )
    }

    /// Fee the contract would charge on `amount`
    pub async fn calculate_fee(&self, amount: U256) -> Result<U256> {
        let call = self.options.call.apply(self.instance.calculateFee(amount));
        Ok(
            call_view::<FeeManagerErrors, _, _, _>(call, self.address(), "calculateFee")
                .await?
                .fee,
        )
    }

    /// Current fee configuration as an off-chain model
    pub async fn schedule(&self) -> Result<FeeSchedule> {
        let (fee_bps, max_fee_bps, recipient) =
            tokio::try_join!(self.fee_bps(), self.max_fee_bps(), self.fee_recipient())?;
        Ok(FeeSchedule::new(fee_bps, max_fee_bps, recipient))
    }

    /// Update the fee; values above `MAX_FEE_BPS` are rejected before sending
    pub async fn set_fee_bps(&self, new_fee_bps: U256) -> Result<TxOutcome> {
        let max = self.max_fee_bps().await?;
        validate_fee_bps(new_fee_bps, max).wrap_err("Refusing to send setFeeBps")?;

        let call = self.options.transact.apply(self.instance.setFeeBps(new_fee_bps));
        send_call::<FeeManagerErrors, _, _, _>(call, self.address(), "setFeeBps").await
    }

    pub async fn set_fee_recipient(&self, new_recipient: Address) -> Result<TxOutcome> {
        let call = self
            .options
            .transact
            .apply(self.instance.setFeeRecipient(new_recipient));
        send_call::<FeeManagerErrors, _, _, _>(call, self.address(), "setFeeRecipient").await
    }

    pub async fn filter_fee_updated(
        &self,
        query: &EventQuery,
    ) -> Result<Vec<DecodedLog<FeeManager::FeeUpdated>>> {
        self.events().filter(query).await
    }
}
