/// Which side of the room this endpoint is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Created the room; makes the offer
    Initiator,
    /// Joined the room; answers
    Joiner,
}

/// Negotiation progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandshakeState {
    #[default]
    Idle,
    OfferCreated,
    OfferReceived,
    AnswerExchanged,
    ChannelOpen,
    Closed,
}
