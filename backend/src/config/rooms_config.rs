use serde::{Deserialize, Serialize};

/// Room registry limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomsConfig {
    /// Upper bound on concurrently live rooms; `None` means unbounded.
    pub max_rooms: Option<usize>,
    /// Fresh codes tried before CreateRoom gives up on collisions.
    pub code_attempts: usize,
}

impl Default for RoomsConfig {
    fn default() -> Self {
        RoomsConfig {
            max_rooms: None,
            code_attempts: 64,
        }
    }
}
