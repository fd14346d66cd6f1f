//! One direct channel with both transfer roles and the host collaborators

mod delivery;
mod mime;
mod peer_session;
mod wake_lock;

pub use delivery::{DirectoryDelivery, FileDelivery};
pub use mime::guess_mime_type;
pub use peer_session::PeerSession;
pub use wake_lock::{NoWakeLock, WakeLock};
