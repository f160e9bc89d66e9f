pub mod config;
pub mod errors;
pub mod leadercast;
pub mod memory;
pub mod message;
pub mod p2p;
mod task;
pub mod transport;

use libp2p::StreamProtocol;

pub use config::LeaderCastConfig;
pub use errors::TransportError;
pub use leadercast::{LeaderCast, leader_index};
pub use memory::{MemTransport, MemTransportHub};
pub use message::LeaderCastMessage;
pub use p2p::{InboundHandler, Libp2pDialer, P2PTransport, StreamDialer};
pub use transport::Transport;

/// Protocol of the one-message-per-stream leader-cast exchange.
pub const PROTOCOL: StreamProtocol = StreamProtocol::new("/tessera/leadercast/1.0.0");
