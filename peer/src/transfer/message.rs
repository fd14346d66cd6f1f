//! Direct-channel message protocol
//!
//! JSON text messages tagged by `type`, e.g.
//! `{"type":"CHUNK_ACK","fileId":"9f2c...","index":4}`.

use serde::{Deserialize, Serialize};

use crate::channel::DataChannel;
use crate::transfer::TransferError;

/// File announcement sent once before the first chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMeta {
    pub file_id: String,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub chunk_size: u32,
    pub total_chunks: u32,
}

/// Messages exchanged between the two endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum PeerMessage {
    FileMeta(FileMeta),
    /// `data` is the chunk payload in standard base64
    FileChunk {
        file_id: String,
        index: u32,
        data: String,
    },
    ChunkAck {
        file_id: String,
        index: u32,
    },
    /// `last_received_chunk` is -1 when nothing was accepted yet
    ResumeRequest {
        file_id: String,
        last_received_chunk: i64,
    },
    FileReject {
        file_id: String,
        reason: String,
    },
}

impl PeerMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            PeerMessage::FileMeta(_) => "FILE_META",
            PeerMessage::FileChunk { .. } => "FILE_CHUNK",
            PeerMessage::ChunkAck { .. } => "CHUNK_ACK",
            PeerMessage::ResumeRequest { .. } => "RESUME_REQUEST",
            PeerMessage::FileReject { .. } => "FILE_REJECT",
        }
    }

    pub fn file_id(&self) -> &str {
        match self {
            PeerMessage::FileMeta(meta) => &meta.file_id,
            PeerMessage::FileChunk { file_id, .. }
            | PeerMessage::ChunkAck { file_id, .. }
            | PeerMessage::ResumeRequest { file_id, .. }
            | PeerMessage::FileReject { file_id, .. } => file_id,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// Serializes and writes one message.
pub(crate) fn transmit<C: DataChannel + ?Sized>(
    channel: &mut C,
    message: &PeerMessage,
) -> Result<(), TransferError> {
    let text = message.to_json()?;
    channel.send_text(&text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_wire_field_names() {
        let meta = PeerMessage::FileMeta(FileMeta {
            file_id: "f1".to_string(),
            name: "photo.jpg".to_string(),
            size: 40000,
            mime_type: "image/jpeg".to_string(),
            chunk_size: 16384,
            total_chunks: 3,
        });
        let value: Value = serde_json::from_str(&meta.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "FILE_META",
                "fileId": "f1",
                "name": "photo.jpg",
                "size": 40000,
                "mimeType": "image/jpeg",
                "chunkSize": 16384,
                "totalChunks": 3
            })
        );

        let resume = PeerMessage::ResumeRequest {
            file_id: "f1".to_string(),
            last_received_chunk: -1,
        };
        let value: Value = serde_json::from_str(&resume.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"type": "RESUME_REQUEST", "fileId": "f1", "lastReceivedChunk": -1})
        );
    }

    #[test]
    fn test_parse_ack() {
        let message = PeerMessage::from_json(r#"{"type":"CHUNK_ACK","fileId":"f1","index":2}"#).unwrap();
        assert_eq!(
            message,
            PeerMessage::ChunkAck {
                file_id: "f1".to_string(),
                index: 2
            }
        );
        assert_eq!(message.kind(), "CHUNK_ACK");
        assert_eq!(message.file_id(), "f1");
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(PeerMessage::from_json(r#"{"type":"FILE_DONE","fileId":"f1"}"#).is_err());
        assert!(PeerMessage::from_json(r#"{"type":"CHUNK_ACK","fileId":"f1","index":-3}"#).is_err());
    }
}
