//! Plain TCP or TLS control connection.

use std::io;
use std::net::TcpStream;
use std::time::Duration;

use protocol::{ProtocolError, SignalMessage, read_frame, write_message};

pub(crate) enum StreamType {
    Plain(TcpStream),
    Tls(Box<native_tls::TlsStream<TcpStream>>),
}

impl StreamType {
    fn tcp(&self) -> &TcpStream {
        match self {
            StreamType::Plain(stream) => stream,
            StreamType::Tls(stream) => stream.get_ref(),
        }
    }

    pub(crate) fn set_read_timeout(&self, duration: Duration) -> io::Result<()> {
        self.tcp().set_read_timeout(Some(duration))
    }

    pub(crate) fn read_frame(&mut self) -> Result<Vec<u8>, ProtocolError> {
        match self {
            StreamType::Plain(stream) => read_frame(stream),
            StreamType::Tls(stream) => read_frame(stream.as_mut()),
        }
    }

    pub(crate) fn write_message(&mut self, msg: &SignalMessage) -> Result<(), ProtocolError> {
        match self {
            StreamType::Plain(stream) => write_message(stream, msg),
            StreamType::Tls(stream) => write_message(stream.as_mut(), msg),
        }
    }
}
