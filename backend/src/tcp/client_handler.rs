//! Per-connection thread: frames in, queued messages out.

use std::io;
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::time::Duration;

use protocol::SignalMessage;

use crate::domain::ConnectionId;
use crate::tcp::event::BrokerEvent;
use crate::tcp::stream_type::StreamType;
use crate::tcp::tls::accept_tls;

const READ_POLL: Duration = Duration::from_millis(100);

/// Moves bytes between one socket and the broker loop. Holds no room state.
pub struct ClientHandler {
    connection: ConnectionId,
    peer_addr: SocketAddr,
    stream: StreamType,
    events: Sender<BrokerEvent>,
    outbound: Receiver<SignalMessage>,
    logger: logging::Logger,
}

impl ClientHandler {
    /// Completes the TLS handshake if configured and registers the
    /// connection with the broker.
    pub fn new(
        connection: ConnectionId,
        stream: TcpStream,
        events: Sender<BrokerEvent>,
        logger: logging::Logger,
        tls_acceptor: Option<Arc<native_tls::TlsAcceptor>>,
    ) -> io::Result<Self> {
        let peer_addr = stream.peer_addr()?;

        let stream = match tls_acceptor {
            Some(acceptor) => match accept_tls(&acceptor, stream) {
                Ok(tls_stream) => StreamType::Tls(Box::new(tls_stream)),
                Err(e) => {
                    logger.error(&format!("TLS handshake failed with {}: {}", peer_addr, e));
                    return Err(io::Error::other(e.to_string()));
                }
            },
            None => StreamType::Plain(stream),
        };

        // Reads time out so queued outbound messages get flushed.
        stream.set_read_timeout(READ_POLL)?;

        let (outbox, outbound) = channel();
        events
            .send(BrokerEvent::Connected { connection, outbox })
            .map_err(|_| io::Error::other("broker loop is not running"))?;

        Ok(ClientHandler {
            connection,
            peer_addr,
            stream,
            events,
            outbound,
            logger,
        })
    }

    /// Runs until the socket closes or the broker goes away. Always reports
    /// the disconnect so the broker can apply room lifecycle rules.
    pub fn handle(&mut self) -> io::Result<()> {
        self.logger
            .info(&format!("{} opened from {}", self.connection, self.peer_addr));

        let result = self.pump();
        let _ = self.events.send(BrokerEvent::Disconnected {
            connection: self.connection,
        });

        match &result {
            Ok(()) => self.logger.info(&format!("{} closed", self.connection)),
            Err(e) => self
                .logger
                .warn(&format!("{} closed with error: {}", self.connection, e)),
        }
        result
    }

    fn pump(&mut self) -> io::Result<()> {
        loop {
            if !self.flush_outbound()? {
                return Ok(());
            }

            match self.stream.read_frame() {
                Ok(payload) => {
                    let event = BrokerEvent::Frame {
                        connection: self.connection,
                        payload,
                    };
                    if self.events.send(event).is_err() {
                        return Ok(());
                    }
                }
                Err(e) if e.is_timeout() => continue,
                Err(protocol::ProtocolError::Io(e))
                    if e.kind() == io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(());
                }
                Err(e) => return Err(io::Error::other(e.to_string())),
            }
        }
    }

    /// Writes every queued message. Returns false once the broker dropped
    /// this connection's sender.
    fn flush_outbound(&mut self) -> io::Result<bool> {
        loop {
            match self.outbound.try_recv() {
                Ok(message) => {
                    self.stream.write_message(&message).map_err(|e| {
                        io::Error::new(io::ErrorKind::BrokenPipe, e.to_string())
                    })?;
                }
                Err(TryRecvError::Empty) => return Ok(true),
                Err(TryRecvError::Disconnected) => return Ok(false),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_peer_gone_before_handling_still_reports_disconnect() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (accepted, _) = listener.accept().unwrap();
        let (events, broker) = channel();

        let mut handler = ClientHandler::new(
            ConnectionId(7),
            accepted,
            events,
            logging::Logger::disabled(),
            None,
        )
        .unwrap();
        drop(client);
        let _ = handler.handle();

        let connected = broker.recv_timeout(Duration::from_secs(1)).unwrap();
        assert!(matches!(
            connected,
            BrokerEvent::Connected { connection: ConnectionId(7), .. }
        ));
        assert!(matches!(
            broker.recv_timeout(Duration::from_secs(1)).unwrap(),
            BrokerEvent::Disconnected { connection: ConnectionId(7) }
        ));
    }
}
