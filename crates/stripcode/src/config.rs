//! Encoder configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Protocol revision used when building chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Row 7 is the inverse clock everywhere; the left finder has no markers
    Base,
    /// Row 7 of payload columns carries the timeline track; the left finder carries
    /// first/last chunk holes
    #[default]
    Enhanced,
}

impl Protocol {
    /// True if payload row 7 carries the timeline track.
    pub fn has_timeline(self) -> bool {
        matches!(self, Protocol::Enhanced)
    }

    /// True if the left finder carries first/last holes.
    pub fn has_sequence_markers(self) -> bool {
        matches!(self, Protocol::Enhanced)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Base => write!(f, "base"),
            Protocol::Enhanced => write!(f, "enhanced"),
        }
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "base" | "v8" => Ok(Protocol::Base),
            "enhanced" | "v9" => Ok(Protocol::Enhanced),
            other => Err(format!("unknown protocol '{other}', expected base or enhanced")),
        }
    }
}

/// Configuration for [`crate::encoder::Encoder`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Protocol revision
    #[serde(default)]
    pub protocol: Protocol,
}

impl EncoderConfig {
    /// Configuration for the given protocol revision.
    pub fn with_protocol(protocol: Protocol) -> Self {
        Self { protocol }
    }
}
