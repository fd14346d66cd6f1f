//! Outgoing file transfer (sender side)
//!
//! At most one chunk is in flight. Its encoded payload is kept until the
//! matching ack arrives so it can be retransmitted unchanged, then released.

use std::time::Instant;

use crate::channel::DataChannel;
use crate::transfer::chunker;
use crate::transfer::message::transmit;
use crate::transfer::{
    Direction, FileMeta, PeerMessage, SenderState, TransferConfig, TransferError, TransferEvent,
};

/// The chunk currently on the wire.
#[derive(Debug)]
struct InFlight {
    index: u32,
    data: String,
    /// Transmissions of this chunk; 1 after the first send
    tx_count: u32,
    sent_at: Instant,
}

#[derive(Debug)]
struct OutgoingSession {
    file_id: String,
    name: String,
    mime_type: String,
    bytes: Vec<u8>,
    chunk_size: u32,
    total_chunks: u32,
    /// Next chunk index to transmit
    cursor: u32,
    in_flight: Option<InFlight>,
}

impl OutgoingSession {
    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn meta(&self) -> PeerMessage {
        PeerMessage::FileMeta(FileMeta {
            file_id: self.file_id.clone(),
            name: self.name.clone(),
            size: self.size(),
            mime_type: self.mime_type.clone(),
            chunk_size: self.chunk_size,
            total_chunks: self.total_chunks,
        })
    }

    /// Payload of the chunk at `cursor`, reusing the buffered encoding when
    /// it is a retransmission.
    fn take_current(&mut self) -> (String, u32) {
        match self.in_flight.take() {
            Some(entry) if entry.index == self.cursor => (entry.data, entry.tx_count),
            _ => (
                chunker::encode(chunker::chunk_of(&self.bytes, self.chunk_size, self.cursor)),
                0,
            ),
        }
    }
}

fn new_file_id() -> String {
    format!("{:016x}", rand::random::<u64>())
}

/// Sender role for one direct channel
#[derive(Debug)]
pub struct TransferSender {
    session: Option<OutgoingSession>,
    state: SenderState,
    config: TransferConfig,
    events: Vec<TransferEvent>,
    logger: logging::Logger,
}

impl TransferSender {
    pub fn new(config: TransferConfig, logger: logging::Logger) -> Self {
        TransferSender {
            session: None,
            state: SenderState::Idle,
            config,
            events: Vec::new(),
            logger,
        }
    }

    pub fn state(&self) -> SenderState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn file_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.file_id.as_str())
    }

    /// Next chunk index to transmit
    pub fn cursor(&self) -> Option<u32> {
        self.session.as_ref().map(|s| s.cursor)
    }

    /// Index of the chunk waiting for an ack
    pub fn in_flight(&self) -> Option<u32> {
        self.session
            .as_ref()
            .and_then(|s| s.in_flight.as_ref())
            .map(|entry| entry.index)
    }

    pub fn drain_events(&mut self) -> Vec<TransferEvent> {
        std::mem::take(&mut self.events)
    }

    /// Announces `bytes` to the receiver and sends the first chunk.
    ///
    /// Fails without starting anything if a transfer is already held or the
    /// metadata cannot be sent. A failure on the first chunk leaves the
    /// transfer `Paused`.
    pub fn start<C: DataChannel + ?Sized>(
        &mut self,
        channel: &mut C,
        name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, TransferError> {
        if let Some(active) = &self.session {
            return Err(TransferError::Busy(active.file_id.clone()));
        }
        let size = bytes.len() as u64;
        if size > self.config.max_file_size {
            return Err(TransferError::TooLarge {
                size,
                limit: self.config.max_file_size,
            });
        }

        let chunk_size = self.config.chunk_size();
        let session = OutgoingSession {
            file_id: new_file_id(),
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            total_chunks: chunker::total_chunks(size, chunk_size),
            bytes,
            chunk_size,
            cursor: 0,
            in_flight: None,
        };
        transmit(channel, &session.meta())?;

        let file_id = session.file_id.clone();
        self.logger.info(&format!(
            "Sending {} ({} bytes, {} chunks) as {}",
            session.name, size, session.total_chunks, file_id
        ));
        self.events.push(TransferEvent::Started {
            file_id: file_id.clone(),
            direction: Direction::Outgoing,
            name: session.name.clone(),
            size,
        });
        let empty = session.total_chunks == 0;
        self.session = Some(session);
        self.state = SenderState::MetadataSent;

        if empty {
            self.finish();
        } else if let Err(e) = self.send_current(channel) {
            self.logger
                .warn(&format!("First chunk of {} not sent: {}", file_id, e));
        }
        Ok(file_id)
    }

    /// Applies an ack. Only the ack for the in-flight chunk advances the
    /// cursor; anything else is returned as an error with no state change.
    pub fn on_ack<C: DataChannel + ?Sized>(
        &mut self,
        channel: &mut C,
        file_id: &str,
        index: u32,
    ) -> Result<(), TransferError> {
        let awaiting = self.state == SenderState::AwaitingAck;
        let session = self.session_for(file_id)?;
        if !awaiting || session.cursor != index {
            return Err(TransferError::UnexpectedAck { got: index });
        }

        session.in_flight = None;
        session.cursor += 1;
        let event = TransferEvent::Progress {
            file_id: session.file_id.clone(),
            direction: Direction::Outgoing,
            index,
            bytes: chunker::bytes_through(session.size(), session.chunk_size, session.cursor),
            total: session.size(),
        };
        let done = session.cursor >= session.total_chunks;
        self.events.push(event);

        if done {
            self.finish();
            Ok(())
        } else {
            self.send_current(channel)
        }
    }

    /// Continues after the receiver's last accepted chunk, with no metadata
    /// renegotiation.
    pub fn on_resume_request<C: DataChannel + ?Sized>(
        &mut self,
        channel: &mut C,
        file_id: &str,
        last_received_chunk: i64,
    ) -> Result<(), TransferError> {
        let session = self.session_for(file_id)?;
        let next = last_received_chunk + 1;
        // The receiver cannot have accepted anything past the chunk on the wire.
        let limit = (session.cursor + 1).min(session.total_chunks);
        if next < 0 || next > i64::from(limit) {
            return Err(TransferError::ResumeOutOfRange(last_received_chunk));
        }

        let next = next as u32;
        session.cursor = next;
        session.in_flight = None;
        let done = next == session.total_chunks;
        let file_id = session.file_id.clone();

        self.logger
            .info(&format!("Resuming {} from chunk {}", file_id, next));
        self.events.push(TransferEvent::Resumed {
            file_id,
            direction: Direction::Outgoing,
            from_chunk: next,
        });

        if done {
            self.finish();
            Ok(())
        } else {
            self.send_current(channel)
        }
    }

    /// The receiver refused the file; the sender goes back to idle.
    pub fn on_reject(&mut self, file_id: &str, reason: &str) -> Result<(), TransferError> {
        self.session_for(file_id)?;
        self.session = None;
        self.state = SenderState::Idle;
        self.logger
            .warn(&format!("Transfer {} rejected: {}", file_id, reason));
        self.events.push(TransferEvent::Rejected {
            file_id: file_id.to_string(),
            direction: Direction::Outgoing,
            reason: reason.to_string(),
        });
        Ok(())
    }

    /// Retries the current chunk of a paused transfer without moving the
    /// cursor. The retransmit budget starts over.
    pub fn resume<C: DataChannel + ?Sized>(&mut self, channel: &mut C) -> Result<(), TransferError> {
        if self.state != SenderState::Paused {
            return Err(TransferError::NothingToResume);
        }
        let Some(session) = self.session.as_mut() else {
            return Err(TransferError::NothingToResume);
        };
        if let Some(entry) = session.in_flight.as_mut() {
            entry.tx_count = 0;
        }
        let event = TransferEvent::Resumed {
            file_id: session.file_id.clone(),
            direction: Direction::Outgoing,
            from_chunk: session.cursor,
        };
        self.events.push(event);
        self.send_current(channel)
    }

    /// Pauses an active transfer. Returns false if there was nothing to pause.
    pub fn pause(&mut self, reason: &str) -> bool {
        let Some(session) = &self.session else {
            return false;
        };
        if self.state == SenderState::Paused {
            return false;
        }
        self.logger.warn(&format!(
            "Pausing {} at chunk {}: {}",
            session.file_id, session.cursor, reason
        ));
        self.events.push(TransferEvent::Paused {
            file_id: session.file_id.clone(),
            direction: Direction::Outgoing,
            reason: reason.to_string(),
        });
        self.state = SenderState::Paused;
        true
    }

    /// Retransmits the in-flight chunk once its ack is overdue, or pauses when
    /// the retransmit budget is spent. Returns true if anything was done.
    pub fn poll_timeout<C: DataChannel + ?Sized>(
        &mut self,
        channel: &mut C,
        now: Instant,
    ) -> Result<bool, TransferError> {
        if self.state != SenderState::AwaitingAck {
            return Ok(false);
        }
        let Some(entry) = self.session.as_ref().and_then(|s| s.in_flight.as_ref()) else {
            return Ok(false);
        };
        if now.saturating_duration_since(entry.sent_at) < self.config.ack_timeout() {
            return Ok(false);
        }

        let (index, tx_count) = (entry.index, entry.tx_count);
        if tx_count > self.config.max_retransmits {
            self.pause(&format!(
                "no ack for chunk {} after {} transmissions",
                index, tx_count
            ));
            return Ok(true);
        }

        self.logger.debug(&format!(
            "Ack for chunk {} overdue, retransmitting (attempt {})",
            index,
            tx_count + 1
        ));
        self.send_current(channel)?;
        Ok(true)
    }

    /// Drops the transfer immediately. Returns its id if one was held.
    pub fn cancel(&mut self) -> Option<String> {
        let session = self.session.take()?;
        self.state = SenderState::Idle;
        self.logger.info(&format!(
            "Cancelled outgoing {} at chunk {}",
            session.file_id, session.cursor
        ));
        Some(session.file_id)
    }

    fn session_for(&mut self, file_id: &str) -> Result<&mut OutgoingSession, TransferError> {
        self.session
            .as_mut()
            .filter(|s| s.file_id == file_id)
            .ok_or_else(|| TransferError::UnknownFile(file_id.to_string()))
    }

    /// Transmits the chunk at `cursor`. A failed send pauses the transfer.
    fn send_current<C: DataChannel + ?Sized>(&mut self, channel: &mut C) -> Result<(), TransferError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        self.state = SenderState::Sending;

        let index = session.cursor;
        let (data, tx_count) = session.take_current();
        let message = PeerMessage::FileChunk {
            file_id: session.file_id.clone(),
            index,
            data,
        };
        let result = transmit(channel, &message);
        let PeerMessage::FileChunk { data, .. } = message else {
            return Ok(());
        };

        let sent = result.is_ok();
        session.in_flight = Some(InFlight {
            index,
            data,
            tx_count: if sent { tx_count + 1 } else { tx_count },
            sent_at: Instant::now(),
        });

        match result {
            Ok(()) => {
                self.state = SenderState::AwaitingAck;
                Ok(())
            }
            Err(e) => {
                self.pause(&format!("sending chunk {} failed: {}", index, e));
                Err(e)
            }
        }
    }

    fn finish(&mut self) {
        if let Some(session) = self.session.take() {
            self.logger.info(&format!(
                "Transfer {} complete ({} chunks acknowledged)",
                session.file_id, session.total_chunks
            ));
            self.events.push(TransferEvent::Completed {
                file_id: session.file_id,
                direction: Direction::Outgoing,
            });
        }
        self.state = SenderState::Complete;
    }
}
