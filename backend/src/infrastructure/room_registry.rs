//! In-memory room repository owned by one broker instance

use std::collections::HashMap;

use protocol::RoomCode;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::RoomsConfig;
use crate::domain::{ConnectionId, Room, RoomError, RoomSlot};

/// Supplies candidate room codes. Collisions are the registry's problem.
pub trait CodeSource: Send {
    fn next_code(&mut self) -> RoomCode;
}

/// Uniformly random codes from the room-code alphabet.
pub struct RandomCodes {
    rng: StdRng,
}

impl RandomCodes {
    pub fn new() -> Self {
        RandomCodes {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        RandomCodes {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomCodes {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeSource for RandomCodes {
    fn next_code(&mut self) -> RoomCode {
        RoomCode::random(&mut self.rng)
    }
}

/// Successful join: who to tell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Joined {
    pub code: RoomCode,
    pub initiator: ConnectionId,
}

/// What a closed connection left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Departure {
    /// The connection held no room slot.
    NotInRoom,
    /// The room was deleted; `joiner` (if any) must be told.
    InitiatorLeft {
        code: RoomCode,
        joiner: Option<ConnectionId>,
    },
    /// The room survives and waits for a new joiner.
    JoinerLeft {
        code: RoomCode,
        initiator: ConnectionId,
    },
}

/// Maps room codes to rooms and connections to the room they occupy.
///
/// Pure data plus invariant enforcement; no I/O. Every room has exactly one
/// initiator, at most one joiner, and a code unique among live rooms.
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, Room>,
    membership: HashMap<ConnectionId, RoomCode>,
    codes: Box<dyn CodeSource>,
    max_rooms: Option<usize>,
    code_attempts: usize,
}

impl RoomRegistry {
    pub fn new(config: &RoomsConfig) -> Self {
        Self::with_code_source(config, Box::new(RandomCodes::new()))
    }

    pub fn with_code_source(config: &RoomsConfig, codes: Box<dyn CodeSource>) -> Self {
        RoomRegistry {
            rooms: HashMap::new(),
            membership: HashMap::new(),
            codes,
            max_rooms: config.max_rooms,
            code_attempts: config.code_attempts.max(1),
        }
    }

    /// Registers `initiator` in a fresh room and returns its code.
    pub fn create(&mut self, initiator: ConnectionId) -> Result<RoomCode, RoomError> {
        if let Some(code) = self.membership.get(&initiator) {
            return Err(RoomError::AlreadyInRoom(code.clone()));
        }
        if self.max_rooms.is_some_and(|max| self.rooms.len() >= max) {
            return Err(RoomError::CapacityReached);
        }

        let code = (0..self.code_attempts)
            .map(|_| self.codes.next_code())
            .find(|candidate| !self.rooms.contains_key(candidate))
            .ok_or(RoomError::CodeSpaceExhausted)?;

        self.rooms
            .insert(code.clone(), Room::new(code.clone(), initiator));
        self.membership.insert(initiator, code.clone());
        Ok(code)
    }

    /// Places `joiner` in the room addressed by `raw_code` (any case).
    pub fn join(&mut self, raw_code: &str, joiner: ConnectionId) -> Result<Joined, RoomError> {
        let not_found = || RoomError::RoomNotFound(raw_code.trim().to_ascii_uppercase());
        let code = RoomCode::parse(raw_code).map_err(|_| not_found())?;
        let current = self.membership.get(&joiner).cloned();
        let room = self.rooms.get_mut(&code).ok_or_else(not_found)?;

        if room.is_paired() {
            return Err(RoomError::RoomFull(code));
        }
        if room.initiator == joiner {
            return Err(RoomError::SelfJoin(code));
        }
        if let Some(other) = current {
            return Err(RoomError::AlreadyInRoom(other));
        }

        room.joiner = Some(joiner);
        let initiator = room.initiator;
        self.membership.insert(joiner, code.clone());
        Ok(Joined { code, initiator })
    }

    /// Enforces the lifecycle rules for a closed connection.
    pub fn remove_connection(&mut self, connection: ConnectionId) -> Departure {
        let Some(code) = self.membership.remove(&connection) else {
            return Departure::NotInRoom;
        };
        let Some(room) = self.rooms.get_mut(&code) else {
            return Departure::NotInRoom;
        };

        match room.slot_of(connection) {
            Some(RoomSlot::Initiator) => {
                let joiner = room.joiner;
                self.rooms.remove(&code);
                if let Some(joiner) = joiner {
                    self.membership.remove(&joiner);
                }
                Departure::InitiatorLeft { code, joiner }
            }
            Some(RoomSlot::Joiner) => {
                room.joiner = None;
                Departure::JoinerLeft {
                    code,
                    initiator: room.initiator,
                }
            }
            None => Departure::NotInRoom,
        }
    }

    pub fn room_of(&self, connection: ConnectionId) -> Option<&Room> {
        self.membership
            .get(&connection)
            .and_then(|code| self.rooms.get(code))
    }

    pub fn peer_of(&self, connection: ConnectionId) -> Option<ConnectionId> {
        self.room_of(connection)?.peer_of(connection)
    }

    pub fn get(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn paired_count(&self) -> usize {
        self.rooms.values().filter(|room| room.is_paired()).count()
    }

    /// Drops every room, returning what was live.
    pub fn dispose(&mut self) -> Vec<Room> {
        self.membership.clear();
        self.rooms.drain().map(|(_, room)| room).collect()
    }
}
