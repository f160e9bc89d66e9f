use std::time::Duration;

#[derive(Debug, Clone)]
pub struct LeaderCastConfig {
    /// Deadline for reading and enqueueing one inbound message.
    pub inbound_timeout: Duration,
    /// Deadline for opening, writing and closing the stream to one peer.
    pub outbound_timeout: Duration,
    pub mailbox_capacity: usize,
    pub max_message_size: usize,
}

impl Default for LeaderCastConfig {
    fn default() -> Self {
        Self {
            inbound_timeout: Duration::from_secs(1),
            outbound_timeout: Duration::from_secs(1),
            mailbox_capacity: 64,
            max_message_size: 10 * 1024 * 1024,
        }
    }
}
