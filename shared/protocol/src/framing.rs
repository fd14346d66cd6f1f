//! Length-prefixed JSON framing for the control-plane socket.
//!
//! Format: `[4 bytes big-endian length][N bytes JSON]`

use std::io::{self, ErrorKind, Read, Write};
use std::time::Duration;

use crate::error::{ProtocolError, Result};
use crate::message::SignalMessage;

pub const MAX_MESSAGE_SIZE: u32 = 1024 * 1024; // 1 MB
const RETRY_DELAY_MS: u64 = 10;

/// Fills `buf`, tolerating read timeouts once a frame has started.
///
/// A timeout before the first byte is surfaced so the caller can do other
/// work; a timeout in the middle of a frame is retried.
fn read_exact_with_retry<S: Read>(
    stream: &mut S,
    buf: &mut [u8],
    description: &str,
    frame_started: bool,
) -> io::Result<()> {
    let mut total_read = 0;

    while total_read < buf.len() {
        match stream.read(&mut buf[total_read..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    ErrorKind::UnexpectedEof,
                    format!("connection closed while reading {}", description),
                ));
            }
            Ok(n) => total_read += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                if total_read == 0 && !frame_started {
                    return Err(e);
                }
                std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS));
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Reads one raw frame payload.
pub fn read_frame<S: Read>(stream: &mut S) -> Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    read_exact_with_retry(stream, &mut len_buf, "length header", false)?;
    let len = u32::from_be_bytes(len_buf);

    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge(len));
    }

    let mut payload = vec![0u8; len as usize];
    read_exact_with_retry(stream, &mut payload, "payload", true)?;
    Ok(payload)
}

/// Writes one raw frame payload and flushes.
pub fn write_frame<S: Write>(stream: &mut S, payload: &[u8]) -> Result<()> {
    let len = u32::try_from(payload.len()).unwrap_or(u32::MAX);
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge(len));
    }
    stream.write_all(&len.to_be_bytes())?;
    stream.write_all(payload)?;
    stream.flush()?;
    Ok(())
}

pub fn read_message<S: Read>(stream: &mut S) -> Result<SignalMessage> {
    let payload = read_frame(stream)?;
    Ok(SignalMessage::from_json(&payload)?)
}

pub fn write_message<S: Write>(stream: &mut S, message: &SignalMessage) -> Result<()> {
    let json = message.to_json()?;
    write_frame(stream, json.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room_code::RoomCode;
    use std::io::Cursor;

    #[test]
    fn test_write_then_read_message() {
        let mut buffer = Vec::new();
        let sent = SignalMessage::RoomJoined {
            room_id: RoomCode::parse("7F2K").unwrap(),
        };
        write_message(&mut buffer, &sent).unwrap();

        let declared = u32::from_be_bytes(buffer[..4].try_into().unwrap());
        assert_eq!(declared as usize, buffer.len() - 4);

        let mut cursor = Cursor::new(buffer);
        assert_eq!(read_message(&mut cursor).unwrap(), sent);
    }

    #[test]
    fn test_message_too_large_on_write() {
        let mut buffer = Vec::new();
        let message = SignalMessage::Error {
            message: "x".repeat(MAX_MESSAGE_SIZE as usize),
        };
        let result = write_message(&mut buffer, &message);
        assert!(matches!(result, Err(ProtocolError::MessageTooLarge(_))));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_message_too_large_on_read() {
        let mut cursor = Cursor::new((MAX_MESSAGE_SIZE + 1).to_be_bytes().to_vec());
        assert!(matches!(
            read_frame(&mut cursor),
            Err(ProtocolError::MessageTooLarge(_))
        ));
    }

    #[test]
    fn test_read_truncated_header() {
        let mut cursor = Cursor::new(vec![0u8, 1u8]);
        let result = read_frame(&mut cursor);
        assert!(matches!(result, Err(ProtocolError::Io(_))));
    }

    #[test]
    fn test_malformed_json_is_protocol_error() {
        let mut buffer = Vec::new();
        write_frame(&mut buffer, b"{\"type\":").unwrap();
        let result = read_message(&mut Cursor::new(buffer));
        assert!(matches!(result, Err(ProtocolError::Json(_))));
    }

    #[test]
    fn test_timeout_classification() {
        let err = ProtocolError::Io(io::Error::new(ErrorKind::WouldBlock, "later"));
        assert!(err.is_timeout());
        let err = ProtocolError::Io(io::Error::new(ErrorKind::UnexpectedEof, "closed"));
        assert!(!err.is_timeout());
    }
}
