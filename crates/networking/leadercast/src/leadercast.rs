use std::sync::Arc;

use anyhow::ensure;
use futures::{FutureExt, future::BoxFuture};
use parking_lot::RwLock;
use tessera_core::{Duty, UnsignedDataSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{errors::TransportError, message::LeaderCastMessage, transport::Transport};

pub type Subscriber = Arc<
    dyn Fn(CancellationToken, Duty, UnsignedDataSet) -> BoxFuture<'static, anyhow::Result<()>>
        + Send
        + Sync,
>;

/// Index of the node that proposes `duty`. Rotates with the slot and differs between duty
/// types of the same slot.
///
/// # Panics
///
/// If `nodes` is zero.
pub fn leader_index(duty: &Duty, nodes: usize) -> usize {
    assert!(nodes > 0, "leader election needs at least one node");
    ((duty.slot + duty.duty_type.discriminant()) % nodes as u64) as usize
}

/// One node's side of leader-cast: the leader proposes its own fetched data, followers adopt
/// whatever the leader sent. Both end by handing the agreed set to the subscribers.
///
/// The leader is trusted. There is no voting, no retry and no repair of a lost proposal.
pub struct LeaderCast {
    transport: Arc<dyn Transport>,
    peer_index: usize,
    nodes: usize,
    subscribers: RwLock<Vec<Subscriber>>,
}

impl LeaderCast {
    pub fn new(
        transport: Arc<dyn Transport>,
        peer_index: usize,
        nodes: usize,
    ) -> anyhow::Result<Self> {
        ensure!(
            peer_index < nodes,
            "Peer index {peer_index} out of range for a cluster of {nodes} nodes"
        );
        Ok(Self {
            transport,
            peer_index,
            nodes,
            subscribers: RwLock::new(Vec::new()),
        })
    }

    pub fn subscribe<F, Fut>(&self, subscriber: F)
    where
        F: Fn(CancellationToken, Duty, UnsignedDataSet) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let subscriber: Subscriber =
            Arc::new(move |cancel, duty, data| subscriber(cancel, duty, data).boxed());
        self.subscribers.write().push(subscriber);
    }

    pub fn is_leader(&self, duty: &Duty) -> bool {
        leader_index(duty, self.nodes) == self.peer_index
    }

    /// Broadcasts locally fetched data if this node leads `duty`, then delivers it to the local
    /// subscribers. Followers ignore their own data and wait for the leader's.
    pub async fn propose(
        &self,
        cancel: &CancellationToken,
        duty: Duty,
        data: UnsignedDataSet,
    ) -> Result<(), TransportError> {
        if !self.is_leader(&duty) {
            debug!(
                slot = duty.slot,
                duty = %duty.duty_type,
                leader = leader_index(&duty, self.nodes),
                "Not the leader, awaiting proposal"
            );
            return Ok(());
        }

        self.transport
            .broadcast(cancel, self.peer_index, duty, &data)
            .await?;
        self.notify(cancel, duty, data).await
    }

    /// Receives proposals until `cancel` fires. Proposals from nodes that do not lead their duty
    /// are dropped.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), TransportError> {
        info!(peer_index = self.peer_index, nodes = self.nodes, "LeaderCast started");
        loop {
            let message = match self.transport.await_next(&cancel).await {
                Ok(message) => message,
                Err(TransportError::Cancelled) => break,
                Err(err) => return Err(err),
            };

            if let Err(err) = self.check_leader(&message) {
                warn!("Dropping leadercast message: {err}");
                continue;
            }

            let (slot, duty) = (message.duty.slot, message.duty.duty_type);
            if let Err(err) = self.notify(&cancel, message.duty, message.data).await {
                warn!(slot, %duty, "Failed to handle leader proposal: {err}");
            }
        }
        info!(peer_index = self.peer_index, "LeaderCast stopped");
        Ok(())
    }

    fn check_leader(&self, message: &LeaderCastMessage) -> Result<(), TransportError> {
        let leader = leader_index(&message.duty, self.nodes);
        if message.sender_index != leader {
            return Err(TransportError::UnexpectedLeader {
                duty: message.duty,
                leader,
                sender: message.sender_index,
            });
        }
        Ok(())
    }

    async fn notify(
        &self,
        cancel: &CancellationToken,
        duty: Duty,
        data: UnsignedDataSet,
    ) -> Result<(), TransportError> {
        let subscribers = self.subscribers.read().clone();
        for subscriber in subscribers {
            subscriber(cancel.clone(), duty, data.clone())
                .await
                .map_err(TransportError::Subscriber)?;
        }
        Ok(())
    }
}
