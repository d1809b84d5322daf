use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Shareable fields
// ---------------------------------------------------------------------------

/// A field identifier a user may approve for disclosure to a partner.
///
/// Identifiers the pipeline does not know about are kept verbatim so that a
/// relationship's `shared_fields` survives a round trip through the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SharedField {
    MoodTrend,
    Notes,
    Other(String),
}

impl SharedField {
    pub fn as_str(&self) -> &str {
        match self {
            Self::MoodTrend => "mood_trend",
            Self::Notes => "notes",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for SharedField {
    fn from(s: &str) -> Self {
        match s {
            "mood_trend" => Self::MoodTrend,
            "notes" => Self::Notes,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for SharedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SharedField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SharedField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}

// ---------------------------------------------------------------------------
// Audit actions
// ---------------------------------------------------------------------------

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown tag: {0}")]
pub struct UnknownTag(pub String);

/// Outcome tag written on an audit entry for a delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    DigestSent,
    DigestSendFailed,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DigestSent => "digest_sent",
            Self::DigestSendFailed => "digest_send_failed",
        }
    }
}

impl FromStr for AuditAction {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "digest_sent" => Ok(Self::DigestSent),
            "digest_send_failed" => Ok(Self::DigestSendFailed),
            other => Err(UnknownTag(other.to_string())),
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Digest kind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigestKind {
    Weekly,
}

impl DigestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
        }
    }
}

impl FromStr for DigestKind {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weekly" => Ok(Self::Weekly),
            other => Err(UnknownTag(other.to_string())),
        }
    }
}

impl fmt::Display for DigestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
