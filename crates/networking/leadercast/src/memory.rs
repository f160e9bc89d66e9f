use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use parking_lot::Mutex;
use tessera_core::{Duty, UnsignedData, UnsignedDataSet};
use tokio::sync::{
    Mutex as AsyncMutex,
    mpsc::{self, UnboundedReceiver, UnboundedSender},
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    errors::TransportError, message::LeaderCastMessage, task::AbortOnDrop, transport::Transport,
};

struct Envelope {
    hub_index: usize,
    message: LeaderCastMessage,
}

type Outputs = Arc<Mutex<HashMap<usize, UnboundedSender<LeaderCastMessage>>>>;

/// In-process fan-out for simulated clusters.
///
/// Each hub is independent: transports from different hubs never see each other's messages.
/// Delivery is reliable and keeps each sender's order.
pub struct MemTransportHub {
    input: UnboundedSender<Envelope>,
    outputs: Outputs,
    next_index: AtomicUsize,
    _delivery: AbortOnDrop<()>,
}

impl MemTransportHub {
    /// Starts the delivery loop. It runs until `cancel` fires or the hub is dropped.
    pub fn new(cancel: CancellationToken) -> Self {
        let (input, receiver) = mpsc::unbounded_channel();
        let outputs = Outputs::default();
        let delivery = tokio::spawn(deliver(receiver, outputs.clone(), cancel));

        Self {
            input,
            outputs,
            next_index: AtomicUsize::new(0),
            _delivery: AbortOnDrop(delivery),
        }
    }

    pub fn new_transport(&self) -> MemTransport {
        let hub_index = self.next_index.fetch_add(1, Ordering::SeqCst);
        let (sender, receiver) = mpsc::unbounded_channel();
        self.outputs.lock().insert(hub_index, sender);

        MemTransport {
            hub_index,
            input: self.input.clone(),
            outputs: self.outputs.clone(),
            output: AsyncMutex::new(receiver),
        }
    }
}

async fn deliver(
    mut input: UnboundedReceiver<Envelope>,
    outputs: Outputs,
    cancel: CancellationToken,
) {
    loop {
        let envelope = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            envelope = input.recv() => match envelope {
                Some(envelope) => envelope,
                None => break,
            },
        };

        let registered = outputs.lock();
        for (hub_index, output) in registered.iter() {
            if *hub_index == envelope.hub_index {
                continue;
            }
            if output.send(envelope.message.clone()).is_err() {
                debug!(hub_index, "Dropping message for a closed transport");
            }
        }
    }
    debug!("Memory transport delivery loop stopped");
}

/// A node's handle on a [`MemTransportHub`]. Dropping it deregisters the node.
pub struct MemTransport {
    hub_index: usize,
    input: UnboundedSender<Envelope>,
    outputs: Outputs,
    output: AsyncMutex<UnboundedReceiver<LeaderCastMessage>>,
}

impl Drop for MemTransport {
    fn drop(&mut self) {
        self.outputs.lock().remove(&self.hub_index);
    }
}

#[async_trait]
impl Transport for MemTransport {
    async fn broadcast(
        &self,
        cancel: &CancellationToken,
        from_index: usize,
        duty: Duty,
        data: &UnsignedDataSet,
    ) -> Result<(), TransportError> {
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        UnsignedData::validate_set(&duty, data).map_err(TransportError::Encode)?;

        self.input
            .send(Envelope {
                hub_index: self.hub_index,
                message: LeaderCastMessage::new(from_index, duty, data.clone()),
            })
            .map_err(|_| TransportError::Closed)
    }

    async fn await_next(
        &self,
        cancel: &CancellationToken,
    ) -> Result<LeaderCastMessage, TransportError> {
        let mut output = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransportError::Cancelled),
            output = self.output.lock() => output,
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TransportError::Cancelled),
            message = output.recv() => message.ok_or(TransportError::Closed),
        }
    }
}
