// Client configuration

use std::time::Duration;

/// Maximum allowed JDWP packet size (10MB)
pub const DEFAULT_MAX_PACKET_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub handshake_timeout: Duration,
    /// Applied to `call_and_await` when the caller passes no timeout.
    /// `None` waits until the reply arrives or the connection stops.
    pub reply_timeout: Option<Duration>,
    pub max_packet_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(5),
            reply_timeout: Some(Duration::from_secs(30)),
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
        }
    }
}

impl ClientConfig {
    pub fn with_reply_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.reply_timeout = timeout;
        self
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }
}
