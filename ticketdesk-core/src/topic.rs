//! The ticket's ownership record, stored in the channel topic.
//!
//! The topic is the only place a ticket's owner and category survive between
//! interactions, so it is written as a fixed sequence of fields:
//!
//! ```text
//! Ticket owner: <tag> (<user id>) | kategori: <label> | key: <category key>
//! ```
//!
//! Fields are separated by unescaped `|`. Inside values, `\`, `|`, `(` and `)`
//! are backslash-escaped, so a tag or label can never smuggle in another
//! ticket's fields. Topics written before the `key` field existed still
//! decode; their category is identified by label alone.

use thiserror::Error;

use crate::category::Category;
use crate::ids::{UserId, UserRef};

pub const OWNER_MARKER: &str = "Ticket owner: ";
const CATEGORY_FIELD: &str = "kategori:";
const KEY_FIELD: &str = "key:";
const FIELD_SEPARATOR: char = '|';
const ESCAPE: char = '\\';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopicError {
    #[error("topic does not start with '{}'", OWNER_MARKER.trim_end())]
    MissingOwnerMarker,
    #[error("owner field is not of the form '<tag> (<id>)'")]
    MalformedOwner,
    #[error("owner id is not a number: {0}")]
    InvalidOwnerId(String),
    #[error("topic has no category field")]
    MissingCategory,
}

/// Decoded ticket topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketTopic {
    pub owner_tag: String,
    pub owner_id: UserId,
    pub category_label: String,
    /// Absent on topics written by older versions of the bot.
    pub category_key: Option<String>,
}

impl TicketTopic {
    pub fn new(owner: &UserRef, category: &Category) -> Self {
        Self {
            owner_tag: owner.tag.clone(),
            owner_id: owner.id,
            category_label: category.label.clone(),
            category_key: Some(category.key.clone()),
        }
    }

    pub fn encode(&self) -> String {
        let mut topic = format!(
            "{}{} ({}) {} {} {}",
            OWNER_MARKER,
            escape(&self.owner_tag),
            self.owner_id,
            FIELD_SEPARATOR,
            CATEGORY_FIELD,
            escape(&self.category_label)
        );
        if let Some(key) = &self.category_key {
            topic.push_str(&format!(" {} {} {}", FIELD_SEPARATOR, KEY_FIELD, escape(key)));
        }
        topic
    }

    pub fn decode(topic: &str) -> Result<Self, TopicError> {
        let rest = topic
            .strip_prefix(OWNER_MARKER)
            .ok_or(TopicError::MissingOwnerMarker)?;

        let mut fields = split_unescaped(rest, FIELD_SEPARATOR).into_iter().map(str::trim);
        let (owner_tag, owner_id) = fields
            .next()
            .ok_or(TopicError::MalformedOwner)
            .and_then(parse_owner)?;

        let mut category_label = None;
        let mut category_key = None;
        for field in fields {
            if let Some(value) = field.strip_prefix(CATEGORY_FIELD) {
                category_label = Some(unescape(value.trim()));
            } else if let Some(value) = field.strip_prefix(KEY_FIELD) {
                category_key = Some(unescape(value.trim()));
            }
            // Unknown fields are ignored so newer topics stay readable.
        }

        Ok(Self {
            owner_tag,
            owner_id,
            category_label: category_label.ok_or(TopicError::MissingCategory)?,
            category_key,
        })
    }

    pub fn belongs_to(&self, user: UserId) -> bool {
        self.owner_id == user
    }

    pub fn is_category(&self, category: &Category) -> bool {
        match &self.category_key {
            Some(key) => *key == category.key,
            None => self.category_label == category.label,
        }
    }
}

fn parse_owner(field: &str) -> Result<(String, UserId), TopicError> {
    let inner = field.strip_suffix(')').ok_or(TopicError::MalformedOwner)?;
    let open = last_unescaped(inner, '(').ok_or(TopicError::MalformedOwner)?;

    let raw_id = &inner[open + 1..];
    let id = raw_id
        .parse::<u64>()
        .map_err(|_| TopicError::InvalidOwnerId(raw_id.to_string()))?;

    Ok((unescape(inner[..open].trim_end()), UserId(id)))
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '|' | '(' | ')') {
            escaped.push(ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

fn unescape(raw: &str) -> String {
    let mut value = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == ESCAPE {
            // A trailing lone backslash is kept as-is.
            value.push(chars.next().unwrap_or(ESCAPE));
        } else {
            value.push(c);
        }
    }
    value
}

fn split_unescaped(raw: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in raw.char_indices() {
        if escaped {
            escaped = false;
        } else if c == ESCAPE {
            escaped = true;
        } else if c == separator {
            parts.push(&raw[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&raw[start..]);
    parts
}

fn last_unescaped(raw: &str, target: char) -> Option<usize> {
    let mut found = None;
    let mut escaped = false;
    for (i, c) in raw.char_indices() {
        if escaped {
            escaped = false;
        } else if c == ESCAPE {
            escaped = true;
        } else if c == target {
            found = Some(i);
        }
    }
    found
}
