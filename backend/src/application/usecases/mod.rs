//! Use cases - implemented as `SignalingBroker` methods, one file per concern
mod room_usecase;
mod signaling_usecase;
