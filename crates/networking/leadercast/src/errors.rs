use tessera_core::{CoreError, Duty};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to encode leadercast message: {0}")]
    Encode(#[source] CoreError),

    #[error("Failed to decode leadercast message: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Leadercast message exceeds {limit} bytes")]
    MessageTooLarge { limit: usize },

    #[error("Leadercast stream error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Duty {duty} is led by node {leader}, not by node {sender}")]
    UnexpectedLeader {
        duty: Duty,
        leader: usize,
        sender: usize,
    },

    #[error("Transport cancelled")]
    Cancelled,

    #[error("Transport closed")]
    Closed,

    #[error(transparent)]
    Subscriber(anyhow::Error),
}
