//! Endpoint transfer session over one direct channel

use std::path::Path;
use std::time::Instant;

use crate::channel::DataChannel;
use crate::error::TransportError;
use crate::session::{FileDelivery, WakeLock, guess_mime_type};
use crate::transfer::message::transmit;
use crate::transfer::{
    PeerMessage, ReceivedFile, ReceiverState, SenderState, TransferConfig, TransferError,
    TransferEvent, TransferReceiver, TransferSender,
};

/// Owns the sender and receiver roles for one direct channel and routes
/// inbound messages between them by kind.
///
/// At most one transfer is active on the channel, in either direction. A
/// local send is refused while a file is arriving, and an announcement is
/// answered with `FILE_REJECT` while a file is going out.
///
/// The wake lock is held exactly while either role holds a transfer,
/// including a paused one.
pub struct PeerSession<C: DataChannel> {
    channel: C,
    channel_open: bool,
    sender: TransferSender,
    receiver: TransferReceiver,
    delivery: Box<dyn FileDelivery>,
    wake_lock: Box<dyn WakeLock>,
    wake_lock_held: bool,
    events: Vec<TransferEvent>,
    logger: logging::Logger,
}

impl<C: DataChannel> PeerSession<C> {
    /// Creates a session for a channel that has just opened.
    pub fn new(
        channel: C,
        config: TransferConfig,
        delivery: Box<dyn FileDelivery>,
        wake_lock: Box<dyn WakeLock>,
        logger: logging::Logger,
    ) -> Self {
        PeerSession {
            channel,
            channel_open: true,
            sender: TransferSender::new(config.clone(), logger.for_component("Sender")),
            receiver: TransferReceiver::new(config, logger.for_component("Receiver")),
            delivery,
            wake_lock,
            wake_lock_held: false,
            events: Vec::new(),
            logger,
        }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn is_channel_open(&self) -> bool {
        self.channel_open
    }

    pub fn sender_state(&self) -> SenderState {
        self.sender.state()
    }

    pub fn receiver_state(&self) -> ReceiverState {
        self.receiver.state()
    }

    pub fn sender(&self) -> &TransferSender {
        &self.sender
    }

    pub fn receiver(&self) -> &TransferReceiver {
        &self.receiver
    }

    /// True while either role holds a transfer
    pub fn is_busy(&self) -> bool {
        self.sender.is_active() || self.receiver.is_active()
    }

    pub fn is_wake_lock_held(&self) -> bool {
        self.wake_lock_held
    }

    /// Starts sending `bytes`; returns the new file id.
    pub fn send_file(
        &mut self,
        name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, TransferError> {
        if !self.channel_open {
            return Err(TransportError::ChannelClosed.into());
        }
        if let Some(incoming) = self.receiver.file_id() {
            return Err(TransferError::Busy(incoming.to_string()));
        }
        let result = self.sender.start(&mut self.channel, name, mime_type, bytes);
        self.sync();
        result
    }

    /// Reads a file from disk and sends it under its file name.
    pub fn send_path(&mut self, path: &Path) -> Result<String, TransferError> {
        let bytes = std::fs::read(path).map_err(TransportError::from)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        let mime_type = guess_mime_type(&name);
        self.send_file(&name, &mime_type, bytes)
    }

    /// Handles one inbound direct-channel text message. Malformed or
    /// inapplicable messages are logged and dropped.
    pub fn on_text(&mut self, text: &str) -> Result<(), TransferError> {
        match PeerMessage::from_json(text) {
            Ok(message) => self.on_message(message),
            Err(e) => {
                self.logger
                    .warn(&format!("Dropping malformed direct-channel message: {}", e));
                Err(e.into())
            }
        }
    }

    pub fn on_message(&mut self, message: PeerMessage) -> Result<(), TransferError> {
        let kind = message.kind();
        let file_id = message.file_id().to_string();

        let result = match message {
            PeerMessage::FileMeta(meta) => match self.sender.file_id().map(str::to_string) {
                Some(outgoing) => {
                    let busy = TransferError::Busy(outgoing);
                    self.receiver
                        .reject(&mut self.channel, &meta.file_id, "peer is sending a file")
                        .and(Err(busy))
                }
                None => self
                    .receiver
                    .on_meta(&mut self.channel, meta)
                    .and_then(|file| self.deliver(file)),
            },
            PeerMessage::FileChunk {
                file_id,
                index,
                data,
            } => self
                .receiver
                .on_chunk(&mut self.channel, &file_id, index, &data)
                .and_then(|file| self.deliver(file)),
            PeerMessage::ChunkAck { file_id, index } => {
                self.sender.on_ack(&mut self.channel, &file_id, index)
            }
            PeerMessage::ResumeRequest {
                file_id,
                last_received_chunk,
            } => self
                .sender
                .on_resume_request(&mut self.channel, &file_id, last_received_chunk),
            PeerMessage::FileReject { file_id, reason } => self.sender.on_reject(&file_id, &reason),
        };

        if let Err(e) = &result {
            self.logger
                .warn(&format!("Dropping {} for {}: {}", kind, file_id, e));
        }
        self.sync();
        result
    }

    /// The direct channel closed: both roles pause, keeping their progress.
    pub fn on_channel_close(&mut self) {
        self.channel_open = false;
        self.sender.pause("direct channel closed");
        self.receiver.pause("direct channel closed");
        self.sync();
    }

    /// The direct channel reopened: a receiver holding a transfer asks the
    /// sender to continue after its last accepted chunk.
    pub fn on_channel_open(&mut self) -> Result<(), TransferError> {
        self.channel_open = true;
        let result = match self.receiver.resume_request() {
            Some(request) => transmit(&mut self.channel, &request),
            None => Ok(()),
        };
        if let Err(e) = &result {
            self.logger.warn(&format!("Resume request not sent: {}", e));
            self.receiver.pause("resume request failed");
        }
        self.sync();
        result
    }

    /// Manual resume of a paused outgoing transfer.
    pub fn resume(&mut self) -> Result<(), TransferError> {
        if !self.channel_open {
            return Err(TransportError::ChannelClosed.into());
        }
        let result = self.sender.resume(&mut self.channel);
        self.sync();
        result
    }

    /// Drives the sender's ack timeout.
    pub fn poll_timeout(&mut self, now: Instant) -> Result<bool, TransferError> {
        if !self.channel_open {
            return Ok(false);
        }
        let result = self.sender.poll_timeout(&mut self.channel, now);
        self.sync();
        result
    }

    /// Tears down both roles immediately, discarding partial data. Returns
    /// the ids of the dropped transfers.
    pub fn cancel(&mut self) -> Vec<String> {
        let cancelled: Vec<String> = [self.sender.cancel(), self.receiver.cancel()]
            .into_iter()
            .flatten()
            .collect();
        self.sync();
        cancelled
    }

    pub fn drain_events(&mut self) -> Vec<TransferEvent> {
        self.sync();
        std::mem::take(&mut self.events)
    }

    fn deliver(&mut self, file: Option<ReceivedFile>) -> Result<(), TransferError> {
        let Some(file) = file else {
            return Ok(());
        };
        self.collect_role_events();
        match self.delivery.deliver(&file) {
            Ok(path) => {
                self.logger.info(&format!(
                    "Delivered {} to {}",
                    file.name,
                    path.display()
                ));
                self.events.push(TransferEvent::Delivered {
                    file_id: file.file_id,
                    path,
                });
                Ok(())
            }
            Err(e) => {
                self.logger
                    .error(&format!("Failed to deliver {}: {}", file.name, e));
                Err(TransportError::from(e).into())
            }
        }
    }

    fn collect_role_events(&mut self) {
        self.events.append(&mut self.sender.drain_events());
        self.events.append(&mut self.receiver.drain_events());
    }

    /// Collects role events and matches the wake lock to activity.
    fn sync(&mut self) {
        self.collect_role_events();

        let busy = self.is_busy();
        if busy && !self.wake_lock_held {
            self.wake_lock.acquire();
            self.wake_lock_held = true;
            self.logger.debug("Wake lock acquired");
        } else if !busy && self.wake_lock_held {
            self.wake_lock.release();
            self.wake_lock_held = false;
            self.logger.debug("Wake lock released");
        }
    }
}
