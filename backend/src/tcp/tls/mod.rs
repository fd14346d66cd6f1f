//! TLS support for control connections.

mod acceptor;
mod error;

pub use acceptor::{accept_tls, load_tls_acceptor};
pub use error::TlsError;
