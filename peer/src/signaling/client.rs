//! Persistent control connection to the broker

use std::io;
use std::net::TcpStream;
use std::time::Duration;

use native_tls::{TlsConnector, TlsStream};
use protocol::{ProtocolError, RoomCode, SignalMessage, read_message, write_message};

use crate::error::TransportError;

const READ_POLL: Duration = Duration::from_millis(100);

enum ClientStream {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

/// Framed `SignalMessage` exchange with the broker, over plain TCP or TLS.
pub struct SignalingClient {
    stream: ClientStream,
    logger: logging::Logger,
}

impl SignalingClient {
    pub fn connect(addr: &str, logger: logging::Logger) -> Result<Self, TransportError> {
        logger.info(&format!("Connecting to signaling server: {}", addr));
        let stream = TcpStream::connect(addr)?;
        stream.set_read_timeout(Some(READ_POLL))?;
        Ok(SignalingClient {
            stream: ClientStream::Plain(stream),
            logger,
        })
    }

    /// Connects with TLS. `accept_invalid_certs` is for self-signed
    /// development certificates only.
    pub fn connect_tls(
        addr: &str,
        accept_invalid_certs: bool,
        logger: logging::Logger,
    ) -> Result<Self, TransportError> {
        let hostname = addr.split(':').next().unwrap_or(addr);
        logger.info(&format!("Connecting to signaling server with TLS: {}", addr));

        let stream = TcpStream::connect(addr)?;
        stream.set_read_timeout(Some(READ_POLL))?;

        let connector = TlsConnector::builder()
            .danger_accept_invalid_certs(accept_invalid_certs)
            .danger_accept_invalid_hostnames(accept_invalid_certs)
            .build()
            .map_err(|e| TransportError::Tls(format!("TLS connector error: {}", e)))?;
        let tls_stream = connector
            .connect(hostname, stream)
            .map_err(|e| TransportError::Tls(format!("TLS handshake failed: {}", e)))?;

        logger.info("TLS handshake successful");
        Ok(SignalingClient {
            stream: ClientStream::Tls(Box::new(tls_stream)),
            logger,
        })
    }

    pub fn send(&mut self, message: &SignalMessage) -> Result<(), TransportError> {
        self.logger.debug(&format!("Sending {}", message.kind()));
        let result = match &mut self.stream {
            ClientStream::Plain(stream) => write_message(stream, message),
            ClientStream::Tls(stream) => write_message(stream.as_mut(), message),
        };
        result.map_err(Self::transport_error)
    }

    pub fn create_room(&mut self) -> Result<(), TransportError> {
        self.send(&SignalMessage::CreateRoom)
    }

    pub fn join_room(&mut self, code: &RoomCode) -> Result<(), TransportError> {
        self.send(&SignalMessage::JoinRoom {
            room_id: code.to_string(),
        })
    }

    /// Returns the next message if one arrives within the poll interval.
    pub fn poll(&mut self) -> Result<Option<SignalMessage>, TransportError> {
        let result = match &mut self.stream {
            ClientStream::Plain(stream) => read_message(stream),
            ClientStream::Tls(stream) => read_message(stream.as_mut()),
        };
        match result {
            Ok(message) => {
                self.logger.debug(&format!("Received {}", message.kind()));
                Ok(Some(message))
            }
            Err(e) if e.is_timeout() => Ok(None),
            Err(e) => Err(Self::transport_error(e)),
        }
    }

    /// Waits up to `timeout` for the next message.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Result<Option<SignalMessage>, TransportError> {
        let polls = (timeout.as_millis() / READ_POLL.as_millis()).max(1);
        for _ in 0..polls {
            if let Some(message) = self.poll()? {
                return Ok(Some(message));
            }
        }
        Ok(None)
    }

    fn transport_error(error: ProtocolError) -> TransportError {
        match error {
            ProtocolError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                TransportError::Disconnected
            }
            other => TransportError::Signaling(other),
        }
    }
}
