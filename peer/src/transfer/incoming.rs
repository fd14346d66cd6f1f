//! Incoming file transfer (receiver side)

use crate::channel::DataChannel;
use crate::transfer::chunker;
use crate::transfer::message::transmit;
use crate::transfer::{
    Direction, FileMeta, PeerMessage, ReceiverState, TransferConfig, TransferError, TransferEvent,
};

/// A fully received file, ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedFile {
    pub file_id: String,
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug)]
struct IncomingSession {
    file_id: String,
    name: String,
    mime_type: String,
    size: u64,
    chunk_size: u32,
    total_chunks: u32,
    /// Next index the receiver will accept
    cursor: u32,
    /// Accepted chunks, concatenated in order
    received: Vec<u8>,
}

impl IncomingSession {
    fn last_received_chunk(&self) -> i64 {
        i64::from(self.cursor) - 1
    }
}

/// Receiver role for one direct channel
#[derive(Debug)]
pub struct TransferReceiver {
    session: Option<IncomingSession>,
    state: ReceiverState,
    /// Final index of the last completed file, so a retransmission caused
    /// by a lost final ack is still answered
    last_completed: Option<(String, u32)>,
    config: TransferConfig,
    events: Vec<TransferEvent>,
    logger: logging::Logger,
}

impl TransferReceiver {
    pub fn new(config: TransferConfig, logger: logging::Logger) -> Self {
        TransferReceiver {
            session: None,
            state: ReceiverState::Idle,
            last_completed: None,
            config,
            events: Vec::new(),
            logger,
        }
    }

    pub fn state(&self) -> ReceiverState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn file_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.file_id.as_str())
    }

    pub fn cursor(&self) -> Option<u32> {
        self.session.as_ref().map(|s| s.cursor)
    }

    /// Index of the last chunk fully accepted, -1 if none
    pub fn last_received_chunk(&self) -> Option<i64> {
        self.session.as_ref().map(IncomingSession::last_received_chunk)
    }

    pub fn drain_events(&mut self) -> Vec<TransferEvent> {
        std::mem::take(&mut self.events)
    }

    /// Accepts or refuses a file announcement.
    ///
    /// A repeat of the announcement for the file already being received is
    /// ignored. Any other announcement while busy, an oversized file or
    /// inconsistent chunk counts are answered with `FILE_REJECT`. An empty
    /// file is complete on arrival.
    pub fn on_meta<C: DataChannel + ?Sized>(
        &mut self,
        channel: &mut C,
        meta: FileMeta,
    ) -> Result<Option<ReceivedFile>, TransferError> {
        if let Some(active) = &self.session {
            if active.file_id == meta.file_id {
                self.logger
                    .debug(&format!("Ignoring repeated metadata for {}", meta.file_id));
                return Ok(None);
            }
            let active_id = active.file_id.clone();
            self.reject(channel, &meta.file_id, "receiver is busy with another file")?;
            return Err(TransferError::Busy(active_id));
        }

        if meta.size > self.config.max_file_size {
            self.reject(channel, &meta.file_id, "file is too large")?;
            return Err(TransferError::TooLarge {
                size: meta.size,
                limit: self.config.max_file_size,
            });
        }
        let expected = chunker::total_chunks(meta.size, meta.chunk_size);
        if meta.chunk_size == 0 || meta.total_chunks != expected {
            self.reject(channel, &meta.file_id, "inconsistent chunk layout")?;
            return Err(TransferError::InvalidMetadata(format!(
                "{} chunks of {} bytes cannot hold {} bytes",
                meta.total_chunks, meta.chunk_size, meta.size
            )));
        }

        self.logger.info(&format!(
            "Receiving {} ({} bytes, {} chunks) as {}",
            meta.name, meta.size, meta.total_chunks, meta.file_id
        ));
        self.events.push(TransferEvent::Started {
            file_id: meta.file_id.clone(),
            direction: Direction::Incoming,
            name: meta.name.clone(),
            size: meta.size,
        });
        self.session = Some(IncomingSession {
            file_id: meta.file_id,
            name: meta.name,
            mime_type: meta.mime_type,
            size: meta.size,
            chunk_size: meta.chunk_size,
            total_chunks: meta.total_chunks,
            cursor: 0,
            received: Vec::new(),
        });
        self.last_completed = None;
        self.state = ReceiverState::AwaitingChunks;

        if expected == 0 {
            return Ok(self.complete());
        }
        Ok(None)
    }

    /// Accepts chunk `index` only if it is the next one expected.
    ///
    /// A duplicate of the last accepted chunk is acknowledged again without
    /// any state change; other mismatches are returned as errors.
    pub fn on_chunk<C: DataChannel + ?Sized>(
        &mut self,
        channel: &mut C,
        file_id: &str,
        index: u32,
        data: &str,
    ) -> Result<Option<ReceivedFile>, TransferError> {
        match &self.session {
            Some(session) if session.file_id == file_id => {
                if session.cursor > 0 && index == session.cursor - 1 {
                    return self.ack_duplicate(channel, file_id, index);
                }
                if index != session.cursor {
                    return Err(TransferError::OutOfOrder {
                        expected: session.cursor,
                        got: index,
                    });
                }
            }
            _ => {
                if let Some((done_id, last)) = &self.last_completed
                    && done_id == file_id
                    && *last == index
                {
                    return self.ack_duplicate(channel, file_id, index);
                }
                return Err(TransferError::UnknownFile(file_id.to_string()));
            }
        }

        let Some(session) = self.session.as_mut() else {
            return Err(TransferError::UnknownFile(file_id.to_string()));
        };
        let payload = chunker::decode(data)?;
        let expected = chunker::chunk_len(session.size, session.chunk_size, index);
        if payload.len() != expected {
            return Err(TransferError::ChunkLength {
                index,
                expected,
                actual: payload.len(),
            });
        }

        session.received.extend_from_slice(&payload);
        session.cursor += 1;
        let progress = TransferEvent::Progress {
            file_id: session.file_id.clone(),
            direction: Direction::Incoming,
            index,
            bytes: session.received.len() as u64,
            total: session.size,
        };
        let done = session.cursor == session.total_chunks;
        self.events.push(progress);
        self.state = ReceiverState::Receiving;

        let ack = PeerMessage::ChunkAck {
            file_id: file_id.to_string(),
            index,
        };
        if let Err(e) = transmit(channel, &ack) {
            // The sender retransmits and the duplicate is acked again.
            self.logger
                .warn(&format!("Ack for chunk {} of {} not sent: {}", index, file_id, e));
            if !done {
                self.pause(&format!("ack send failed: {}", e));
            }
        }

        if done {
            return Ok(self.complete());
        }
        Ok(None)
    }

    /// Pauses an active transfer. Returns false if there was nothing to pause.
    pub fn pause(&mut self, reason: &str) -> bool {
        let Some(session) = &self.session else {
            return false;
        };
        if self.state == ReceiverState::Paused {
            return false;
        }
        self.logger.warn(&format!(
            "Pausing incoming {} after chunk {}: {}",
            session.file_id,
            session.last_received_chunk(),
            reason
        ));
        self.events.push(TransferEvent::Paused {
            file_id: session.file_id.clone(),
            direction: Direction::Incoming,
            reason: reason.to_string(),
        });
        self.state = ReceiverState::Paused;
        true
    }

    /// Builds the resume request for a held transfer, if any.
    pub fn resume_request(&mut self) -> Option<PeerMessage> {
        let session = self.session.as_ref()?;
        let message = PeerMessage::ResumeRequest {
            file_id: session.file_id.clone(),
            last_received_chunk: session.last_received_chunk(),
        };
        self.events.push(TransferEvent::Resumed {
            file_id: session.file_id.clone(),
            direction: Direction::Incoming,
            from_chunk: session.cursor,
        });
        self.state = if session.cursor == 0 {
            ReceiverState::AwaitingChunks
        } else {
            ReceiverState::Receiving
        };
        self.logger.info(&format!(
            "Requesting resume of {} after chunk {}",
            session.file_id,
            session.last_received_chunk()
        ));
        Some(message)
    }

    /// Drops the transfer and everything received so far.
    pub fn cancel(&mut self) -> Option<String> {
        let session = self.session.take()?;
        self.state = ReceiverState::Idle;
        self.logger.info(&format!(
            "Cancelled incoming {}, discarding {} bytes",
            session.file_id,
            session.received.len()
        ));
        Some(session.file_id)
    }

    fn ack_duplicate<C: DataChannel + ?Sized>(
        &mut self,
        channel: &mut C,
        file_id: &str,
        index: u32,
    ) -> Result<Option<ReceivedFile>, TransferError> {
        self.logger.debug(&format!(
            "Duplicate chunk {} of {}, acknowledging again",
            index, file_id
        ));
        transmit(
            channel,
            &PeerMessage::ChunkAck {
                file_id: file_id.to_string(),
                index,
            },
        )?;
        if self.state == ReceiverState::Paused && self.session.is_some() {
            self.state = ReceiverState::Receiving;
        }
        Ok(None)
    }

    pub(crate) fn reject<C: DataChannel + ?Sized>(
        &mut self,
        channel: &mut C,
        file_id: &str,
        reason: &str,
    ) -> Result<(), TransferError> {
        self.logger
            .warn(&format!("Rejecting file {}: {}", file_id, reason));
        transmit(
            channel,
            &PeerMessage::FileReject {
                file_id: file_id.to_string(),
                reason: reason.to_string(),
            },
        )?;
        self.events.push(TransferEvent::Rejected {
            file_id: file_id.to_string(),
            direction: Direction::Incoming,
            reason: reason.to_string(),
        });
        Ok(())
    }

    fn complete(&mut self) -> Option<ReceivedFile> {
        let session = self.session.take()?;
        self.logger.info(&format!(
            "Received {} ({} bytes)",
            session.file_id,
            session.received.len()
        ));
        if session.total_chunks > 0 {
            self.last_completed = Some((session.file_id.clone(), session.total_chunks - 1));
        }
        self.events.push(TransferEvent::Completed {
            file_id: session.file_id.clone(),
            direction: Direction::Incoming,
        });
        self.state = ReceiverState::Complete;
        Some(ReceivedFile {
            file_id: session.file_id,
            name: session.name,
            mime_type: session.mime_type,
            bytes: session.received,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::test_support::RecordingChannel;

    fn receiver() -> TransferReceiver {
        TransferReceiver::new(TransferConfig::default(), logging::Logger::disabled())
    }

    fn meta(file_id: &str, size: u64) -> FileMeta {
        FileMeta {
            file_id: file_id.to_string(),
            name: "photo.jpg".to_string(),
            size,
            mime_type: "image/jpeg".to_string(),
            chunk_size: 16384,
            total_chunks: chunker::total_chunks(size, 16384),
        }
    }

    fn encoded(bytes: &[u8], index: u32) -> String {
        chunker::encode(chunker::chunk_of(bytes, 16384, index))
    }

    fn acks(messages: &[PeerMessage]) -> Vec<u32> {
        messages
            .iter()
            .filter_map(|m| match m {
                PeerMessage::ChunkAck { index, .. } => Some(*index),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_accepts_only_the_expected_index() {
        let bytes = vec![7u8; 40000];
        let mut channel = RecordingChannel::default();
        let mut receiver = receiver();
        receiver.on_meta(&mut channel, meta("f", 40000)).unwrap();
        assert_eq!(receiver.state(), ReceiverState::AwaitingChunks);

        assert!(matches!(
            receiver.on_chunk(&mut channel, "f", 1, &encoded(&bytes, 1)),
            Err(TransferError::OutOfOrder {
                expected: 0,
                got: 1
            })
        ));
        assert_eq!(receiver.cursor(), Some(0));
        assert!(channel.take().is_empty());

        receiver
            .on_chunk(&mut channel, "f", 0, &encoded(&bytes, 0))
            .unwrap();
        assert_eq!(receiver.cursor(), Some(1));
        assert_eq!(receiver.state(), ReceiverState::Receiving);
        assert_eq!(acks(&channel.take()), vec![0]);
    }

    #[test]
    fn test_full_file_is_delivered_byte_identical() {
        let bytes: Vec<u8> = (0..40000u32).map(|i| (i * 31 % 256) as u8).collect();
        let mut channel = RecordingChannel::default();
        let mut receiver = receiver();
        receiver.on_meta(&mut channel, meta("f", 40000)).unwrap();

        let mut delivered = None;
        for index in 0..3 {
            delivered = receiver
                .on_chunk(&mut channel, "f", index, &encoded(&bytes, index))
                .unwrap();
        }
        let file = delivered.expect("file after last chunk");
        assert_eq!(file.bytes, bytes);
        assert_eq!(file.name, "photo.jpg");
        assert_eq!(acks(&channel.take()), vec![0, 1, 2]);
        assert_eq!(receiver.state(), ReceiverState::Complete);
        assert!(!receiver.is_active());
    }

    #[test]
    fn test_empty_file_delivered_on_meta() {
        let mut channel = RecordingChannel::default();
        let mut receiver = receiver();
        let file = receiver.on_meta(&mut channel, meta("f", 0)).unwrap().unwrap();
        assert!(file.bytes.is_empty());
        assert_eq!(receiver.state(), ReceiverState::Complete);
    }

    #[test]
    fn test_duplicate_is_reacked_without_state_change() {
        let bytes = vec![1u8; 40000];
        let mut channel = RecordingChannel::default();
        let mut receiver = receiver();
        receiver.on_meta(&mut channel, meta("f", 40000)).unwrap();
        receiver
            .on_chunk(&mut channel, "f", 0, &encoded(&bytes, 0))
            .unwrap();
        channel.take();

        receiver
            .on_chunk(&mut channel, "f", 0, &encoded(&bytes, 0))
            .unwrap();
        assert_eq!(acks(&channel.take()), vec![0]);
        assert_eq!(receiver.cursor(), Some(1));
    }

    #[test]
    fn test_final_chunk_reacked_after_completion() {
        let bytes = vec![1u8; 100];
        let mut channel = RecordingChannel::default();
        let mut receiver = receiver();
        receiver.on_meta(&mut channel, meta("f", 100)).unwrap();
        assert!(
            receiver
                .on_chunk(&mut channel, "f", 0, &encoded(&bytes, 0))
                .unwrap()
                .is_some()
        );
        channel.take();

        assert!(
            receiver
                .on_chunk(&mut channel, "f", 0, &encoded(&bytes, 0))
                .unwrap()
                .is_none()
        );
        assert_eq!(acks(&channel.take()), vec![0]);
        assert!(matches!(
            receiver.on_chunk(&mut channel, "g", 0, &encoded(&bytes, 0)),
            Err(TransferError::UnknownFile(_))
        ));
    }

    #[test]
    fn test_bad_payloads_leave_cursor_alone() {
        let mut channel = RecordingChannel::default();
        let mut receiver = receiver();
        receiver.on_meta(&mut channel, meta("f", 40000)).unwrap();

        assert!(matches!(
            receiver.on_chunk(&mut channel, "f", 0, "%%%"),
            Err(TransferError::Decode(_))
        ));
        assert!(matches!(
            receiver.on_chunk(&mut channel, "f", 0, &chunker::encode(&[1, 2, 3])),
            Err(TransferError::ChunkLength { .. })
        ));
        assert_eq!(receiver.cursor(), Some(0));
        assert!(channel.take().is_empty());
    }

    #[test]
    fn test_busy_receiver_rejects_second_file() {
        let mut channel = RecordingChannel::default();
        let mut receiver = receiver();
        receiver.on_meta(&mut channel, meta("f", 40000)).unwrap();

        // Same file again is ignored.
        assert!(receiver.on_meta(&mut channel, meta("f", 40000)).unwrap().is_none());
        assert!(channel.take().is_empty());

        assert!(matches!(
            receiver.on_meta(&mut channel, meta("g", 10)),
            Err(TransferError::Busy(active)) if active == "f"
        ));
        assert!(matches!(
            channel.take().as_slice(),
            [PeerMessage::FileReject { file_id, .. }] if file_id == "g"
        ));
        assert_eq!(receiver.file_id(), Some("f"));
    }

    #[test]
    fn test_oversized_and_inconsistent_metadata_rejected() {
        let mut channel = RecordingChannel::default();
        let mut receiver = TransferReceiver::new(
            TransferConfig {
                max_file_size: 1000,
                ..TransferConfig::default()
            },
            logging::Logger::disabled(),
        );
        assert!(matches!(
            receiver.on_meta(&mut channel, meta("f", 1001)),
            Err(TransferError::TooLarge { .. })
        ));

        let mut bad = meta("g", 500);
        bad.total_chunks = 4;
        assert!(matches!(
            receiver.on_meta(&mut channel, bad),
            Err(TransferError::InvalidMetadata(_))
        ));
        assert_eq!(channel.take().len(), 2);
        assert_eq!(receiver.state(), ReceiverState::Idle);
    }

    #[test]
    fn test_resume_request_reports_last_accepted() {
        let bytes = vec![3u8; 40000];
        let mut channel = RecordingChannel::default();
        let mut receiver = receiver();
        receiver.on_meta(&mut channel, meta("f", 40000)).unwrap();

        assert!(receiver.pause("channel closed"));
        assert_eq!(
            receiver.resume_request(),
            Some(PeerMessage::ResumeRequest {
                file_id: "f".to_string(),
                last_received_chunk: -1
            })
        );

        receiver
            .on_chunk(&mut channel, "f", 0, &encoded(&bytes, 0))
            .unwrap();
        receiver
            .on_chunk(&mut channel, "f", 1, &encoded(&bytes, 1))
            .unwrap();
        receiver.pause("channel closed");
        assert_eq!(receiver.state(), ReceiverState::Paused);
        assert_eq!(
            receiver.resume_request(),
            Some(PeerMessage::ResumeRequest {
                file_id: "f".to_string(),
                last_received_chunk: 1
            })
        );
        assert_eq!(receiver.state(), ReceiverState::Receiving);
    }

    #[test]
    fn test_cancel_discards_partial_data() {
        let bytes = vec![3u8; 40000];
        let mut channel = RecordingChannel::default();
        let mut receiver = receiver();
        receiver.on_meta(&mut channel, meta("f", 40000)).unwrap();
        receiver
            .on_chunk(&mut channel, "f", 0, &encoded(&bytes, 0))
            .unwrap();
        assert_eq!(receiver.cancel(), Some("f".to_string()));
        assert!(receiver.resume_request().is_none());
        assert_eq!(receiver.state(), ReceiverState::Idle);
    }
}
