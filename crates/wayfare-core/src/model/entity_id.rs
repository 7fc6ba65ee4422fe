// ── Core identity type ──
//
// EntityId is the key of every normalized collection. The API hands out
// numeric ids for most records and string ids for a few; route parameters
// and CLI arguments arrive as text. All three must compare equal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical identifier for any Wayfare entity.
///
/// Canonical decimal strings are normalized to [`EntityId::Num`], so `"7"` from a
/// route parameter and `7` from a JSON payload address the same record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged, from = "RawId")]
pub enum EntityId {
    Num(u64),
    Str(String),
}

/// Wire shape before normalization.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Num(u64),
    Str(String),
}

impl From<RawId> for EntityId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Num(n) => Self::Num(n),
            RawId::Str(s) => Self::from(s),
        }
    }
}

impl EntityId {
    pub fn as_num(&self) -> Option<u64> {
        match self {
            Self::Num(n) => Some(*n),
            Self::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Num(_) => None,
        }
    }

    /// `0` and `""` never name a record. Lookups treat them like a missing id.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Num(n) => *n == 0,
            Self::Str(s) => s.trim().is_empty(),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<u64> for EntityId {
    fn from(n: u64) -> Self {
        Self::Num(n)
    }
}

impl From<u32> for EntityId {
    fn from(n: u32) -> Self {
        Self::Num(u64::from(n))
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        // Only canonical decimals: "007" and "+7" are distinct server ids.
        match s.parse::<u64>() {
            Ok(n) if n.to_string() == s => Self::Num(n),
            _ => Self::Str(s),
        }
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}
