//! Backend identifiers
//!
//! json-server hands out numeric IDs in older versions and short strings in newer ones, the
//! apps have to cope with both

use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

/// An identifier assigned by the backend
///
/// Written back in the same shape it was read in, compared by its textual form
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Id {
    /// Numeric ID, `1`
    Number(u64),
    /// Textual ID, `"event-1"`
    Text(String),
}

impl PartialEq for Id {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Id::Number(left), Id::Number(right)) => left == right,
            (Id::Text(left), Id::Text(right)) => left == right,
            _ => self.to_string() == other.to_string(),
        }
    }
}

impl Eq for Id {}

impl Hash for Id {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Number(number) => write!(f, "{number}"),
            Id::Text(text) => f.write_str(text),
        }
    }
}

/// Invalid ID, an empty string
#[derive(Debug, PartialEq, Eq)]
pub struct EmptyId;

impl fmt::Display for EmptyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ID can not be empty")
    }
}

impl std::error::Error for EmptyId {}

impl FromStr for Id {
    type Err = EmptyId;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();

        if value.is_empty() {
            return Err(EmptyId);
        }

        // only numbers that print back to the same text, "0123" stays textual
        match value.parse::<u64>() {
            Ok(number) if number.to_string() == value => Ok(Id::Number(number)),
            _ => Ok(Id::Text(value.to_string())),
        }
    }
}
