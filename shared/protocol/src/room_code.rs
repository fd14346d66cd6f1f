//! Short human-typable room codes.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::InvalidRoomCode;

/// Characters a code may contain. `I`, `O`, `0` and `1` are left out so a
/// code read off a screen cannot be mistyped.
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const ROOM_CODE_LEN: usize = 4;

/// A validated, upper-cased room code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Normalizes to upper case and checks length and alphabet.
    pub fn parse(raw: &str) -> Result<Self, InvalidRoomCode> {
        let normalized = raw.trim().to_ascii_uppercase();
        let valid = normalized.len() == ROOM_CODE_LEN
            && normalized.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b));
        if valid {
            Ok(RoomCode(normalized))
        } else {
            Err(InvalidRoomCode(raw.to_string()))
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..ROOM_CODE_LEN)
            .map(|_| ROOM_CODE_ALPHABET[rng.gen_range(0..ROOM_CODE_ALPHABET.len())] as char)
            .collect();
        RoomCode(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoomCode {
    type Err = InvalidRoomCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoomCode::parse(s)
    }
}

impl TryFrom<String> for RoomCode {
    type Error = InvalidRoomCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        RoomCode::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_parse_is_case_insensitive() {
        let code = RoomCode::parse("7f2k").unwrap();
        assert_eq!(code.as_str(), "7F2K");
        assert_eq!(code, "7F2K".parse().unwrap());
    }

    #[test]
    fn test_parse_rejects_ambiguous_and_wrong_length() {
        assert!(RoomCode::parse("O0I1").is_err());
        assert!(RoomCode::parse("ABC").is_err());
        assert!(RoomCode::parse("ABCDE").is_err());
        assert!(RoomCode::parse("AB-D").is_err());
        assert!(RoomCode::parse("").is_err());
    }

    #[test]
    fn test_random_codes_stay_in_alphabet() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let code = RoomCode::random(&mut rng);
            assert_eq!(code.as_str().len(), ROOM_CODE_LEN);
            assert!(code.as_str().bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_alphabet_has_no_ambiguous_symbols() {
        for ambiguous in [b'I', b'O', b'0', b'1'] {
            assert!(!ROOM_CODE_ALPHABET.contains(&ambiguous));
        }
    }

    #[test]
    fn test_serde_validates() {
        let code: RoomCode = serde_json::from_str("\"abcd\"").unwrap();
        assert_eq!(code.as_str(), "ABCD");
        assert!(serde_json::from_str::<RoomCode>("\"AB0D\"").is_err());
    }
}
