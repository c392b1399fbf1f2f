use std::fmt;
use std::str::FromStr;

use thiserror::Error;

// --- Field names ---

/// Primary key of every stored event. Immutable once assigned.
pub const EVENT_ID: &str = "eventId";
pub const TITLE: &str = "title";
/// Canonical description field.
pub const DESCRIPTIONS: &str = "descriptions";
/// Accepted synonym for `descriptions`. Always mirrors it.
pub const DESCRIPTION: &str = "description";
pub const DATE: &str = "date";
pub const LOCATION: &str = "location";
pub const CAPACITY: &str = "capacity";
pub const ORGANIZER: &str = "organizer";
pub const STATUS: &str = "status";

/// Required fields in the order they are checked on creation.
/// The description pair is checked last and reported under its canonical name.
pub const REQUIRED_FIELDS: [&str; 7] = [
    TITLE,
    DATE,
    LOCATION,
    CAPACITY,
    ORGANIZER,
    STATUS,
    DESCRIPTIONS,
];

pub const TITLE_MAX_CHARS: usize = 200;

// --- Status ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventStatus {
    Active,
    Cancelled,
    Completed,
}

impl EventStatus {
    pub const ALL: [EventStatus; 3] = [Self::Active, Self::Cancelled, Self::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown event status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for EventStatus {
    type Err = UnknownStatus;

    /// Exact, case-sensitive match.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}
