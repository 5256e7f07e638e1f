use alloy::{providers::Provider, transports::Transport};
use eyre::Result;

use crate::contracts::Pausable::{self, PausableErrors};
use crate::events::{DecodedLog, EventQuery};
use crate::session::call_view;

contract_client!(
    /// Emergency stop state of a bridge
    PausableClient => Pausable::PausableInstance
);

impl<T, P> PausableClient<T, P>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    pub async fn paused(&self) -> Result<bool> {
        let call = self.options.call.apply(self.instance.paused());
        Ok(call_view::<PausableErrors, _, _, _>(call, self.address(), "paused")
            .await?
            ._0)
    }

    pub async fn filter_paused(&self, query: &EventQuery) -> Result<Vec<DecodedLog<Pausable::Paused>>> {
        self.events().filter(query).await
    }

    pub async fn filter_unpaused(
        &self,
        query: &EventQuery,
    ) -> Result<Vec<DecodedLog<Pausable::Unpaused>>> {
        self.events().filter(query).await
    }
}
