//! Platform identifiers.
//!
//! Discord snowflakes are plain `u64`s; the newtypes keep users, channels and
//! roles from being mixed up once they leave the SDK.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Newtype for a platform user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl UserId {
    /// `<@id>`
    pub fn mention(&self) -> String {
        format!("<@{}>", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Newtype for a channel id. Channel categories ("groupings") are channels too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub u64);

impl ChannelId {
    /// `<#id>`
    pub fn mention(&self) -> String {
        format!("<#{}>", self.0)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ChannelId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Newtype for a guild role id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleId(pub u64);

impl RoleId {
    /// `<@&id>`
    pub fn mention(&self) -> String {
        format!("<@&{}>", self.0)
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RoleId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// The parts of a user the ticket desk cares about.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserRef {
    pub id: UserId,
    /// Account name, used for the channel name.
    pub username: String,
    /// Display tag (`name` or `name#1234`), used in the topic and embeds.
    pub tag: String,
}

impl UserRef {
    pub fn new(id: impl Into<UserId>, username: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            tag: tag.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mentions() {
        assert_eq!(UserId(42).mention(), "<@42>");
        assert_eq!(ChannelId(7).mention(), "<#7>");
        assert_eq!(RoleId(9).mention(), "<@&9>");
    }
}
