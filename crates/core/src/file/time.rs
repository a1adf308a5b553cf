use std::{
    fmt::Display,
    num::ParseIntError,
    ops::{Add, Deref},
    str::FromStr,
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};

/// The fewest digits a whole-file timestamp may have, which is every
/// millisecond epoch timestamp since September 2001
pub const MIN_TIMESTAMP_DIGITS: usize = 13;

/// Wrapper for the number of milliseconds since the unix epoch, used as the
/// nonce which is committed into every signed message of a run
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    pub const fn from_millis(milliseconds: u64) -> Self {
        Self(milliseconds)
    }

    /// The current wall clock time, truncated to milliseconds
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self(millis)
    }

    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// The timestamp one millisecond later, used to prove that the timestamp
    /// is actually committed to by a signature. The last representable
    /// millisecond has no successor, so it can never be proven committed.
    pub const fn next(&self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(ms) => Some(Self(ms)),
            None => None,
        }
    }

    /// Parses a timestamp which must be purely decimal and have at least
    /// [MIN_TIMESTAMP_DIGITS] digits, returning `None` if the shape is wrong
    pub fn parse_strict(s: &str) -> Option<Self> {
        if s.len() < MIN_TIMESTAMP_DIGITS || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        s.parse().ok().map(Self)
    }
}

impl FromStr for Timestamp {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl From<Timestamp> for u64 {
    fn from(value: Timestamp) -> Self {
        value.0
    }
}

impl From<u64> for Timestamp {
    fn from(value: u64) -> Self {
        Timestamp(value)
    }
}

impl Deref for Timestamp {
    type Target = u64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Add<u64> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: u64) -> Self::Output {
        Timestamp(self.0.saturating_add(rhs))
    }
}
