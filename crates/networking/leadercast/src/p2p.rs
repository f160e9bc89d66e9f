use std::sync::Arc;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use futures::{
    AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, Stream, StreamExt, future::join_all,
};
use libp2p::PeerId;
use libp2p_stream::Control;
use tessera_core::{Duty, UnsignedDataSet};
use tessera_metrics::{
    LEADERCAST_BROADCAST_ERRORS, LEADERCAST_INBOUND_DROPPED,
    helpers::{inc_int_counter_vec, inc_int_counter_vec_by},
};
use tokio::{
    sync::{
        Mutex,
        mpsc::{self, error::SendTimeoutError},
    },
    time::{Instant, timeout, timeout_at},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::{
    PROTOCOL, config::LeaderCastConfig, errors::TransportError, message,
    message::LeaderCastMessage, task::AbortOnDrop, transport::Transport,
};

pub type BoxedWriteStream = Box<dyn AsyncWrite + Send + Unpin>;

/// Opens outbound leader-cast streams.
#[async_trait]
pub trait StreamDialer: Send + Sync {
    async fn open(&self, peer: PeerId) -> anyhow::Result<BoxedWriteStream>;
}

/// Dials peers through a `libp2p-stream` behaviour running in the node's swarm.
pub struct Libp2pDialer {
    control: Control,
}

impl Libp2pDialer {
    pub fn new(control: Control) -> Self {
        Self { control }
    }
}

#[async_trait]
impl StreamDialer for Libp2pDialer {
    async fn open(&self, peer: PeerId) -> anyhow::Result<BoxedWriteStream> {
        let mut control = self.control.clone();
        let stream = control
            .open_stream(peer, PROTOCOL)
            .await
            .map_err(|err| anyhow!("Failed to open leadercast stream to {peer}: {err}"))?;
        Ok(Box::new(stream))
    }
}

/// Reads one proposal per inbound stream into the transport's mailbox.
#[derive(Clone)]
pub struct InboundHandler {
    mailbox: mpsc::Sender<LeaderCastMessage>,
    config: LeaderCastConfig,
}

impl InboundHandler {
    /// Decodes a single message from `stream` and enqueues it. Reading and enqueueing share one
    /// deadline; a message that misses it is dropped.
    pub async fn handle<S>(&self, peer: PeerId, stream: S)
    where
        S: AsyncRead + Unpin,
    {
        let deadline = Instant::now() + self.config.inbound_timeout;

        let message =
            match timeout_at(deadline, read_message(stream, self.config.max_message_size)).await {
                Ok(Ok(message)) => message,
                Ok(Err(err)) => {
                    error!(%peer, "Decode leadercast message: {err}");
                    inc_int_counter_vec(&LEADERCAST_INBOUND_DROPPED, &["decode"]);
                    return;
                }
                Err(_) => {
                    warn!(%peer, "Timed out reading leadercast message");
                    inc_int_counter_vec(&LEADERCAST_INBOUND_DROPPED, &["timeout"]);
                    return;
                }
            };

        let (slot, duty) = (message.duty.slot, message.duty.duty_type);
        match self
            .mailbox
            .send_timeout(message, deadline.saturating_duration_since(Instant::now()))
            .await
        {
            Ok(()) => debug!(%peer, slot, %duty, "Received leadercast message"),
            Err(SendTimeoutError::Timeout(_)) => {
                warn!(%peer, slot, %duty, "Leadercast mailbox full, dropping message");
                inc_int_counter_vec(&LEADERCAST_INBOUND_DROPPED, &["mailbox_full"]);
            }
            Err(SendTimeoutError::Closed(_)) => {
                debug!(%peer, slot, %duty, "Leadercast mailbox closed, dropping message");
                inc_int_counter_vec(&LEADERCAST_INBOUND_DROPPED, &["closed"]);
            }
        }
    }

    /// Handles every incoming stream on its own task until `cancel` fires or the streams end.
    pub async fn run<I, S>(self, mut incoming: I, cancel: CancellationToken)
    where
        I: Stream<Item = (PeerId, S)> + Unpin,
        S: AsyncRead + Unpin + Send + 'static,
    {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                next = incoming.next() => match next {
                    Some((peer, stream)) => {
                        let handler = self.clone();
                        tokio::spawn(async move { handler.handle(peer, stream).await });
                    }
                    None => break,
                },
            }
        }
        debug!("Leadercast inbound loop stopped");
    }
}

async fn read_message<S>(stream: S, limit: usize) -> Result<LeaderCastMessage, TransportError>
where
    S: AsyncRead + Unpin,
{
    let mut bytes = Vec::new();
    stream
        .take(limit as u64 + 1)
        .read_to_end(&mut bytes)
        .await?;
    if bytes.len() > limit {
        return Err(TransportError::MessageTooLarge { limit });
    }
    LeaderCastMessage::decode(&bytes)
}

/// Leader-cast over one libp2p stream per peer and message.
///
/// `peers` lists every node of the cluster, this one included, in cluster order.
pub struct P2PTransport {
    dialer: Arc<dyn StreamDialer>,
    peers: Vec<PeerId>,
    peer_index: usize,
    inbound: InboundHandler,
    inbox: Mutex<mpsc::Receiver<LeaderCastMessage>>,
    _inbound_task: Option<AbortOnDrop<()>>,
}

impl P2PTransport {
    pub fn new(
        dialer: Arc<dyn StreamDialer>,
        peers: Vec<PeerId>,
        peer_index: usize,
        config: LeaderCastConfig,
    ) -> Self {
        let (mailbox, inbox) = mpsc::channel(config.mailbox_capacity);
        Self {
            dialer,
            peers,
            peer_index,
            inbound: InboundHandler { mailbox, config },
            inbox: Mutex::new(inbox),
            _inbound_task: None,
        }
    }

    /// Registers the leader-cast protocol on the swarm's stream behaviour and starts accepting
    /// inbound streams.
    pub fn with_libp2p(
        mut control: Control,
        peers: Vec<PeerId>,
        peer_index: usize,
        config: LeaderCastConfig,
        cancel: CancellationToken,
    ) -> anyhow::Result<Self> {
        let incoming = control
            .accept(PROTOCOL)
            .map_err(|err| anyhow!("Failed to accept {PROTOCOL} streams: {err}"))?;

        let mut transport = Self::new(
            Arc::new(Libp2pDialer::new(control)),
            peers,
            peer_index,
            config,
        );
        transport._inbound_task = Some(AbortOnDrop(tokio::spawn(
            transport.inbound_handler().run(incoming, cancel),
        )));
        Ok(transport)
    }

    pub fn inbound_handler(&self) -> InboundHandler {
        self.inbound.clone()
    }

    async fn send(&self, peer: PeerId, bytes: &[u8]) -> anyhow::Result<()> {
        let deadline = self.inbound.config.outbound_timeout;
        timeout(deadline, async {
            let mut stream = self.dialer.open(peer).await?;
            stream
                .write_all(bytes)
                .await
                .context("Failed to write leadercast message")?;
            stream
                .close()
                .await
                .context("Failed to close leadercast stream")?;
            Ok::<_, anyhow::Error>(())
        })
        .await
        .map_err(|_| anyhow!("Timed out sending leadercast message after {deadline:?}"))?
    }
}

#[async_trait]
impl Transport for P2PTransport {
    async fn broadcast(
        &self,
        cancel: &CancellationToken,
        from_index: usize,
        duty: Duty,
        data: &UnsignedDataSet,
    ) -> Result<(), TransportError> {
        let bytes = message::encode(from_index, duty, data)?;

        let sends = self
            .peers
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != self.peer_index)
            .map(|(_, peer)| {
                let bytes = &bytes;
                async move { (*peer, self.send(*peer, bytes).await) }
            });

        let results = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransportError::Cancelled),
            results = join_all(sends) => results,
        };

        let failures = results
            .into_iter()
            .filter_map(|(peer, result)| result.err().map(|err| (peer, err)))
            .collect::<Vec<_>>();

        if failures.is_empty() {
            debug!(slot = duty.slot, duty = %duty.duty_type, "Leader propose value success");
        } else {
            for (peer, err) in &failures {
                warn!(%peer, slot = duty.slot, "Failed to send leadercast message: {err:#}");
            }
            inc_int_counter_vec_by(&LEADERCAST_BROADCAST_ERRORS, failures.len() as u64, &[]);
            warn!(
                slot = duty.slot,
                duty = %duty.duty_type,
                failed = failures.len(),
                "Leader propose value with errors"
            );
        }

        Ok(())
    }

    async fn await_next(
        &self,
        cancel: &CancellationToken,
    ) -> Result<LeaderCastMessage, TransportError> {
        let mut inbox = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransportError::Cancelled),
            inbox = self.inbox.lock() => inbox,
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TransportError::Cancelled),
            message = inbox.recv() => message.ok_or(TransportError::Closed),
        }
    }
}
