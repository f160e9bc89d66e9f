use async_trait::async_trait;
use tessera_core::{Duty, UnsignedDataSet};
use tokio_util::sync::CancellationToken;

use crate::{errors::TransportError, message::LeaderCastMessage};

/// Carries a leader's proposal to the rest of the cluster.
///
/// Delivery to other nodes is best effort: `broadcast` succeeds even when some peers could not
/// be reached, and a lost proposal is never repaired. Followers that miss it simply wait for the
/// next duty.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn broadcast(
        &self,
        cancel: &CancellationToken,
        from_index: usize,
        duty: Duty,
        data: &UnsignedDataSet,
    ) -> Result<(), TransportError>;

    /// Waits for the next proposal from another node.
    async fn await_next(
        &self,
        cancel: &CancellationToken,
    ) -> Result<LeaderCastMessage, TransportError>;
}
