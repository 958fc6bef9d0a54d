//! Content source model for tracking where ingested text came from.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Origin of an ingested document.
///
/// The core never inspects the text differently per source; the tag exists
/// so owners can filter their stored content by where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContentSource {
    /// Text the user typed or pasted directly
    #[default]
    User,
    /// Scraped web page
    Web,
    /// Notion page walk
    Notion,
    /// YouTube transcript
    Youtube,
}

impl fmt::Display for ContentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentSource::User => write!(f, "user"),
            ContentSource::Web => write!(f, "web"),
            ContentSource::Notion => write!(f, "notion"),
            ContentSource::Youtube => write!(f, "youtube"),
        }
    }
}

impl std::str::FromStr for ContentSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(ContentSource::User),
            "web" => Ok(ContentSource::Web),
            "notion" => Ok(ContentSource::Notion),
            "youtube" => Ok(ContentSource::Youtube),
            other => Err(format!(
                "unknown source '{other}' (expected user, web, notion, or youtube)"
            )),
        }
    }
}

impl Serialize for ContentSource {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ContentSource {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
