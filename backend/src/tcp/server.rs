//! TCP server accepting endpoint control connections.

use std::io;
use std::net::{SocketAddr, TcpListener};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::thread;

use crate::domain::ConnectionId;
use crate::tcp::event::BrokerEvent;
use crate::tcp::tls::{TlsError, load_tls_acceptor};

use super::client_handler::ClientHandler;

/// Accept loop. One thread per connection, all feeding one broker loop.
pub struct TcpServer {
    events: Sender<BrokerEvent>,
    logger: logging::Logger,
    tls_acceptor: Option<Arc<native_tls::TlsAcceptor>>,
    max_connections: usize,
    active: Arc<AtomicUsize>,
}

impl TcpServer {
    pub fn new(events: Sender<BrokerEvent>, logger: logging::Logger, max_connections: usize) -> Self {
        TcpServer {
            events,
            logger,
            tls_acceptor: None,
            max_connections,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Enable TLS with the given PKCS#12 file and password
    pub fn with_tls(mut self, pkcs12_path: &Path, password: &str) -> Result<Self, TlsError> {
        let acceptor = load_tls_acceptor(pkcs12_path, password)?;
        self.logger.info(&format!(
            "TLS enabled with certificate: {}",
            pkcs12_path.display()
        ));
        self.tls_acceptor = Some(acceptor);
        Ok(self)
    }

    pub fn start(&self, bind_addr: &str) -> io::Result<()> {
        let listener = TcpListener::bind(bind_addr)?;
        self.serve(listener)
    }

    /// Binds to an ephemeral port and serves on a background thread.
    pub fn spawn_local(self) -> io::Result<SocketAddr> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        thread::spawn(move || self.serve(listener));
        Ok(addr)
    }

    pub fn serve(&self, listener: TcpListener) -> io::Result<()> {
        let protocol = if self.tls_acceptor.is_some() {
            "TLS"
        } else {
            "Plain TCP"
        };
        self.logger.info(&format!(
            "Listening on {} ({} protocol)",
            listener.local_addr()?,
            protocol
        ));

        let mut next_id = 0u64;
        for stream in listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    self.logger
                        .error(&format!("Failed to accept connection: {}", e));
                    continue;
                }
            };

            if self.active.load(Ordering::SeqCst) >= self.max_connections {
                self.logger.warn(&format!(
                    "Connection limit {} reached, refusing {:?}",
                    self.max_connections,
                    stream.peer_addr().ok()
                ));
                continue;
            }

            next_id += 1;
            let connection = ConnectionId(next_id);
            let events = self.events.clone();
            let logger = self.logger.for_component("Connection");
            let tls_acceptor = self.tls_acceptor.clone();
            let active = self.active.clone();
            active.fetch_add(1, Ordering::SeqCst);

            thread::spawn(move || {
                match ClientHandler::new(connection, stream, events, logger.clone(), tls_acceptor) {
                    Ok(mut handler) => {
                        if let Err(e) = handler.handle() {
                            logger.debug(&format!("{} handler ended: {}", connection, e));
                        }
                    }
                    Err(e) => {
                        logger.error(&format!("Failed to set up {}: {}", connection, e));
                    }
                }
                active.fetch_sub(1, Ordering::SeqCst);
            });
        }

        Ok(())
    }
}
