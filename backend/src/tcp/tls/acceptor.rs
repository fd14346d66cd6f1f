//! TLS acceptor loading.

use native_tls::{Identity, TlsAcceptor};
use std::fs;
use std::net::TcpStream;
use std::path::Path;
use std::sync::Arc;

use super::error::TlsError;

/// Builds a shareable acceptor from a PKCS#12 bundle.
pub fn load_tls_acceptor(pkcs12_path: &Path, password: &str) -> Result<Arc<TlsAcceptor>, TlsError> {
    let identity_data = fs::read(pkcs12_path).map_err(|e| {
        TlsError::InvalidCertificate(format!("Cannot open {}: {}", pkcs12_path.display(), e))
    })?;

    if identity_data.is_empty() {
        return Err(TlsError::InvalidCertificate(
            "Certificate file is empty".to_string(),
        ));
    }

    let identity = Identity::from_pkcs12(&identity_data, password)
        .map_err(|e| TlsError::InvalidCertificate(format!("Invalid PKCS#12 format: {}", e)))?;

    Ok(Arc::new(TlsAcceptor::new(identity)?))
}

/// Server side of the TLS handshake on an accepted socket.
pub fn accept_tls(
    acceptor: &TlsAcceptor,
    stream: TcpStream,
) -> Result<native_tls::TlsStream<TcpStream>, TlsError> {
    Ok(acceptor.accept(stream)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_nonexistent_cert() {
        let result = load_tls_acceptor(Path::new("nonexistent.pfx"), "password");
        assert!(matches!(result, Err(TlsError::InvalidCertificate(_))));
    }

    #[test]
    fn test_empty_cert_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let result = load_tls_acceptor(file.path(), "password");
        assert!(matches!(result, Err(TlsError::InvalidCertificate(msg)) if msg.contains("empty")));
    }

    #[test]
    fn test_garbage_cert_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"definitely not pkcs12").unwrap();
        assert!(load_tls_acceptor(file.path(), "password").is_err());
    }
}
