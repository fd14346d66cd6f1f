//! The direct peer channel as seen by the transfer layer.

use crate::error::TransportError;

/// An ordered, message-oriented text channel to the other endpoint.
///
/// Implemented by the host's WebRTC data channel. Delivery order is assumed
/// to match send order.
pub trait DataChannel {
    fn send_text(&mut self, text: &str) -> Result<(), TransportError>;
}

impl<C: DataChannel + ?Sized> DataChannel for &mut C {
    fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        (**self).send_text(text)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Records every sent message; can be told to fail sends.
    #[derive(Debug, Default)]
    pub struct RecordingChannel {
        pub sent: Vec<String>,
        pub failing: bool,
    }

    impl RecordingChannel {
        pub fn take(&mut self) -> Vec<crate::transfer::PeerMessage> {
            self.sent
                .drain(..)
                .map(|text| crate::transfer::PeerMessage::from_json(&text).unwrap())
                .collect()
        }
    }

    impl DataChannel for RecordingChannel {
        fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
            if self.failing {
                return Err(TransportError::Send("channel refused data".to_string()));
            }
            self.sent.push(text.to_string());
            Ok(())
        }
    }
}
