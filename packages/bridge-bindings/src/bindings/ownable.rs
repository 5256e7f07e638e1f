use alloy::{primitives::Address, providers::Provider, transports::Transport};
use eyre::Result;

use crate::contracts::Ownable::{self, OwnableErrors};
use crate::events::{address_topic, DecodedLog, EventQuery};
use crate::session::{call_view, send_call, TxOutcome};

contract_client!(
    /// Single-owner access control shared by every bridge contract
    OwnableClient => Ownable::OwnableInstance
);

impl<T, P> OwnableClient<T, P>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    pub async fn owner(&self) -> Result<Address> {
        let call = self.options.call.apply(self.instance.owner());
        Ok(call_view::<OwnableErrors, _, _, _>(call, self.address(), "owner")
            .await?
            ._0)
    }

    pub async fn transfer_ownership(&self, new_owner: Address) -> Result<TxOutcome> {
        let call = self
            .options
            .transact
            .apply(self.instance.transferOwnership(new_owner));
        send_call::<OwnableErrors, _, _, _>(call, self.address(), "transferOwnership").await
    }

    pub async fn renounce_ownership(&self) -> Result<TxOutcome> {
        let call = self.options.transact.apply(self.instance.renounceOwnership());
        send_call::<OwnableErrors, _, _, _>(call, self.address(), "renounceOwnership").await
    }

    /// Ownership transfers, optionally restricted to given previous owners
    pub async fn filter_ownership_transferred(
        &self,
        query: EventQuery,
        previous_owners: &[Address],
    ) -> Result<Vec<DecodedLog<Ownable::OwnershipTransferred>>> {
        let query = if previous_owners.is_empty() {
            query
        } else {
            query.topic1(previous_owners.iter().copied().map(address_topic))
        };
        self.events().filter(&query).await
    }
}
