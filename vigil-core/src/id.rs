//! Resource Identifiers
//!
//! Every managed resource (check, organization, task, label) is addressed by
//! a 64-bit [`Id`] that travels on the wire as a fixed-width 16-digit
//! lowercase hex string. The zero value is reserved as "unset".

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::Error;

/// Length of the wire encoding, in bytes.
const ID_STRING_LENGTH: usize = 16;

/// A non-zero 64-bit resource identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(u64);

impl Id {
    /// Wrap a raw value. Zero is permitted here so that entities can carry
    /// an unset id before creation; use [`Id::valid`] to distinguish.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Whether this id refers to an actual resource.
    pub fn valid(self) -> bool {
        self.0 != 0
    }

    pub fn is_zero(id: &Id) -> bool {
        id.0 == 0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for Id {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ID_STRING_LENGTH {
            return Err(Error::invalid("id must have a length of 16 bytes"));
        }
        // from_str_radix tolerates a leading sign; the wire form does not.
        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::invalid("id must contain only hex digits"));
        }
        let raw = u64::from_str_radix(s, 16)
            .map_err(|e| Error::invalid(format!("invalid id: {e}")))?;
        if raw == 0 {
            return Err(Error::invalid("id cannot be zero"));
        }
        Ok(Self(raw))
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Source of fresh identifiers.
///
/// Injected into storage backends so tests can substitute deterministic
/// generators (see [`crate::mock`]).
pub trait IdGenerator: Send + Sync {
    fn id(&self) -> Id;
}

/// Default generator backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn id(&self) -> Id {
        loop {
            let raw: u64 = rand::random();
            if raw != 0 {
                return Id::new(raw);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_round_trips_through_hex() {
        let id = Id::new(0x020f755c3c082000);
        assert_eq!(id.to_string(), "020f755c3c082000");
        assert_eq!("020f755c3c082000".parse::<Id>().unwrap(), id);
    }

    #[test]
    fn id_rejects_bad_input() {
        assert!("short".parse::<Id>().is_err());
        assert!("zzzzzzzzzzzzzzzz".parse::<Id>().is_err());
        assert!("0000000000000000".parse::<Id>().is_err());
        // Right length, but a sign is not a hex digit.
        assert!("+00000000000000ff".parse::<Id>().is_err());
        assert!("-00000000000000ff".parse::<Id>().is_err());
    }

    #[test]
    fn random_generator_yields_valid_ids() {
        let generator = RandomIdGenerator;
        assert!(generator.id().valid());
    }
}
