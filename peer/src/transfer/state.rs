//! Per-role transfer state

/// Sender role state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SenderState {
    /// No transfer held
    #[default]
    Idle,
    /// Metadata delivered, first chunk not yet out
    MetadataSent,
    /// Writing the current chunk to the channel
    Sending,
    /// One chunk in flight, waiting for its acknowledgment
    AwaitingAck,
    /// Channel lost, send failed or retries exhausted; resumable
    Paused,
    /// Last chunk acknowledged
    Complete,
}

/// Receiver role state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReceiverState {
    #[default]
    Idle,
    /// Metadata accepted, no chunk yet
    AwaitingChunks,
    Receiving,
    Paused,
    /// File assembled and handed off
    Complete,
}
