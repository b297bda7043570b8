use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// `"<guildId>_<channelId>"`; at most one board per channel.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoardKey(String);

impl BoardKey {
    pub fn from_location(guild_id: &str, channel_id: &str) -> Self {
        BoardKey(format!("{guild_id}_{channel_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BoardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BoardKey {
    fn from(s: &str) -> Self {
        BoardKey(s.to_string())
    }
}

/// One live stock message. Field names match the on-disk `boards.json`.
///
/// Missing fields deserialize as empty strings so one damaged entry does not
/// make the whole registry unreadable; `is_valid` filters those out at resume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    #[serde(default)]
    pub guild_id: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub message_id: String,
}

impl Board {
    pub fn new(guild_id: impl Into<String>, channel_id: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            guild_id: guild_id.into(),
            channel_id: channel_id.into(),
            message_id: message_id.into(),
        }
    }

    pub fn key(&self) -> BoardKey {
        BoardKey::from_location(&self.guild_id, &self.channel_id)
    }

    pub fn is_valid(&self) -> bool {
        !self.channel_id.is_empty() && !self.message_id.is_empty()
    }
}

/// The registry document.
pub type BoardMap = BTreeMap<BoardKey, Board>;
