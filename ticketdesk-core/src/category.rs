//! The ticket category table.
//!
//! Texts and keys are static; the channel-category ("grouping") and staff-role
//! ids come from configuration, so a [`CategoryRegistry`] is built at startup
//! from [`BUILTIN_CATEGORIES`] plus the configured ids.

use thiserror::Error;

use crate::ids::{ChannelId, RoleId};

/// Key of the category used when a request names none.
pub const DEFAULT_CATEGORY_KEY: &str = "general";

/// Static description of a category, before ids are attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryTemplate {
    pub key: &'static str,
    pub label: &'static str,
    pub emoji: &'static str,
    pub description: &'static str,
    /// Prefix of the `<PREFIX>_CATEGORY_ID` / `<PREFIX>_STAFF_ROLE_ID` variables.
    pub env_prefix: &'static str,
}

impl CategoryTemplate {
    pub fn build(&self, grouping: ChannelId, staff_role: RoleId) -> Category {
        Category {
            key: self.key.to_string(),
            label: self.label.to_string(),
            emoji: self.emoji.to_string(),
            description: self.description.to_string(),
            grouping,
            staff_role,
        }
    }
}

pub const BUILTIN_CATEGORIES: &[CategoryTemplate] = &[
    CategoryTemplate {
        key: "ckpk",
        label: "CK/PK",
        emoji: "⚔️",
        description: "Rapportér karakterdrab eller problematiske situationer omkring CK/PK.",
        env_prefix: "CKPK",
    },
    CategoryTemplate {
        key: "general",
        label: "General",
        emoji: "💬",
        description: "Generelle spørgsmål om serveren, tekniske issues eller hjælp til systemer.",
        env_prefix: "GENERAL",
    },
    CategoryTemplate {
        key: "kompensation",
        label: "Kompensation",
        emoji: "💰",
        description: "Ansøg om kompensation for tabte genstande, køretøjer eller økonomi.",
        env_prefix: "KOMPENSATION",
    },
    CategoryTemplate {
        key: "firma",
        label: "Firma",
        emoji: "🏢",
        description: "Firma- og virksomhedsrelaterede henvendelser, samarbejde eller spons.",
        env_prefix: "FIRMA",
    },
    CategoryTemplate {
        key: "unban",
        label: "Unban",
        emoji: "🔓",
        description: "Anmod om genåbning af en ban og forklar din side af sagen.",
        env_prefix: "UNBAN",
    },
    CategoryTemplate {
        key: "bande",
        label: "Bande",
        emoji: "🛡️",
        description: "Bande-ansøgninger, ændringer eller administrative bande-henvendelser.",
        env_prefix: "BANDE",
    },
];

/// A routing bucket for tickets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Stable identifier, also embedded in channel names. Lowercase alphanumeric.
    pub key: String,
    pub label: String,
    pub emoji: String,
    pub description: String,
    /// Channel category new tickets are created under.
    pub grouping: ChannelId,
    /// Effective staff role (category-specific or the global fallback).
    pub staff_role: RoleId,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("category table is empty")]
    Empty,
    #[error("duplicate category key: {0}")]
    DuplicateKey(String),
    #[error("default category '{0}' is not in the category table")]
    MissingDefault(String),
}

/// Read-only lookup over the configured categories, in table order.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
    default_index: usize,
}

impl CategoryRegistry {
    pub fn new(categories: Vec<Category>, default_key: &str) -> Result<Self, RegistryError> {
        if categories.is_empty() {
            return Err(RegistryError::Empty);
        }

        for (i, category) in categories.iter().enumerate() {
            if categories[..i].iter().any(|c| c.key == category.key) {
                return Err(RegistryError::DuplicateKey(category.key.clone()));
            }
        }

        let default_index = categories
            .iter()
            .position(|c| c.key == default_key)
            .ok_or_else(|| RegistryError::MissingDefault(default_key.to_string()))?;

        Ok(Self {
            categories,
            default_index,
        })
    }

    /// Exact lookup by key.
    pub fn get(&self, key: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.key == key)
    }

    /// `None` resolves to the default category; an unknown key resolves to nothing.
    pub fn resolve(&self, key: Option<&str>) -> Option<&Category> {
        match key {
            Some(key) => self.get(key),
            None => Some(self.default_category()),
        }
    }

    /// Like [`resolve`](Self::resolve), but an unknown key also falls back to the default.
    pub fn resolve_or_default(&self, key: Option<&str>) -> &Category {
        self.resolve(key).unwrap_or_else(|| self.default_category())
    }

    /// Lookup by display label, for topics written without a key field.
    pub fn by_label(&self, label: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.label == label)
    }

    pub fn default_category(&self) -> &Category {
        &self.categories[self.default_index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn test_registry() -> CategoryRegistry {
    let categories = BUILTIN_CATEGORIES
        .iter()
        .enumerate()
        .map(|(i, t)| t.build(ChannelId(1000 + i as u64), RoleId(2000 + i as u64)))
        .collect();
    CategoryRegistry::new(categories, DEFAULT_CATEGORY_KEY).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_category_resolves_to_itself() {
        let registry = test_registry();
        for category in registry.iter() {
            assert_eq!(registry.get(&category.key), Some(category));
            assert_eq!(registry.resolve(Some(&category.key)), Some(category));
        }
        assert_eq!(registry.len(), BUILTIN_CATEGORIES.len());
    }

    #[test]
    fn test_unknown_key_is_not_found() {
        let registry = test_registry();
        assert_eq!(registry.get("nope"), None);
        assert_eq!(registry.resolve(Some("nope")), None);
        // Keys are case-sensitive
        assert_eq!(registry.get("General"), None);
    }

    #[test]
    fn test_missing_key_resolves_to_default() {
        let registry = test_registry();
        assert_eq!(registry.resolve(None).map(|c| c.key.as_str()), Some("general"));
        assert_eq!(registry.resolve_or_default(Some("nope")).key, "general");
        assert_eq!(registry.resolve_or_default(Some("unban")).key, "unban");
    }

    #[test]
    fn test_by_label() {
        let registry = test_registry();
        assert_eq!(registry.by_label("CK/PK").map(|c| c.key.as_str()), Some("ckpk"));
        assert_eq!(registry.by_label("ckpk"), None);
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let template = BUILTIN_CATEGORIES[1];
        let categories = vec![
            template.build(ChannelId(1), RoleId(2)),
            template.build(ChannelId(3), RoleId(4)),
        ];
        assert_eq!(
            CategoryRegistry::new(categories, "general").unwrap_err(),
            RegistryError::DuplicateKey("general".to_string())
        );
    }

    #[test]
    fn test_missing_default_rejected() {
        let categories = vec![BUILTIN_CATEGORIES[0].build(ChannelId(1), RoleId(2))];
        assert_eq!(
            CategoryRegistry::new(categories, "general").unwrap_err(),
            RegistryError::MissingDefault("general".to_string())
        );
        assert_eq!(
            CategoryRegistry::new(vec![], "general").unwrap_err(),
            RegistryError::Empty
        );
    }

    #[test]
    fn test_builtin_keys_are_channel_name_safe() {
        for template in BUILTIN_CATEGORIES {
            assert!(
                template
                    .key
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()),
                "key {} must be lowercase alphanumeric",
                template.key
            );
        }
    }
}
