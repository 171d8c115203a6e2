//! Aspect ratio handling for generation requests.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Aspect ratios accepted by the generation capability.
///
/// The upstream service only understands a fixed allow-list. Anything
/// outside it is silently normalized to the default rather than rejected,
/// so a stale client can never wedge a job on an invalid ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum AspectRatio {
    /// 16:9 landscape (default)
    #[default]
    Wide,
    /// 9:16 portrait
    Portrait,
    /// 1:1 square
    Square,
}

impl AspectRatio {
    /// All ratios the generation capability accepts.
    pub const ALL: &'static [AspectRatio] =
        &[AspectRatio::Wide, AspectRatio::Portrait, AspectRatio::Square];

    /// Wire representation expected by the generation API.
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Wide => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Square => "1:1",
        }
    }

    /// Parse a user-supplied ratio, normalizing unknown values to the
    /// default instead of failing.
    pub fn normalize(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = UnknownAspectRatio;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "16:9" | "wide" | "landscape" => Ok(AspectRatio::Wide),
            "9:16" | "portrait" | "vertical" => Ok(AspectRatio::Portrait),
            "1:1" | "square" => Ok(AspectRatio::Square),
            other => Err(UnknownAspectRatio(other.to_string())),
        }
    }
}

/// Error returned when an aspect ratio string is not on the allow-list.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown aspect ratio: {0}")]
pub struct UnknownAspectRatio(pub String);
