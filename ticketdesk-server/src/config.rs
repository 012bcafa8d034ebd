use std::env;
use std::fmt;

use thiserror::Error;

use ticketdesk_core::category::DEFAULT_CATEGORY_KEY;
use ticketdesk_core::{
    CategoryRegistry, ChannelId, RegistryError, RoleId, BUILTIN_CATEGORIES,
};

use crate::scheduler::RetryPolicy;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0}")]
    Variables(VariableProblems),
    #[error("invalid category table: {0}")]
    Registry(#[from] RegistryError),
}

/// Every missing or malformed variable, reported together.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct VariableProblems {
    pub missing: Vec<String>,
    pub invalid: Vec<String>,
}

impl VariableProblems {
    fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.invalid.is_empty()
    }
}

impl fmt::Display for VariableProblems {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!(
                "Missing required environment variables: {}",
                self.missing.join(", ")
            ));
        }
        if !self.invalid.is_empty() {
            parts.push(format!(
                "Invalid environment variables: {}",
                self.invalid.join(", ")
            ));
        }
        write!(f, "{}", parts.join("; "))
    }
}

#[derive(Clone)]
pub struct Config {
    pub discord_token: String,
    pub client_id: u64,
    pub guild_id: u64,
    /// Global staff role; also the fallback for categories without their own.
    pub staff_role: RoleId,
    /// Shared channel category used when a category's own grouping is unusable.
    pub fallback_grouping: Option<ChannelId>,
    pub categories: CategoryRegistry,
    pub close_delay_secs: u64,
    pub delete_retry: RetryPolicy,
    pub port: u16,
    /// If set, requests to /status must include `Authorization: Bearer <token>`.
    /// If unset, /status is disabled.
    pub status_auth_token: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("discord_token", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("guild_id", &self.guild_id)
            .field("staff_role", &self.staff_role)
            .field("fallback_grouping", &self.fallback_grouping)
            .field("categories", &self.categories.len())
            .field("close_delay_secs", &self.close_delay_secs)
            .field("delete_retry", &self.delete_retry)
            .field("port", &self.port)
            .field(
                "status_auth_token",
                &self.status_auth_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Collects values from a lookup, remembering what was wrong with them.
struct Reader<F> {
    lookup: F,
    problems: VariableProblems,
}

impl<F> Reader<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Empty and whitespace-only values count as unset.
    fn optional_raw(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&mut self, key: &str) -> Option<String> {
        let value = self.optional_raw(key);
        if value.is_none() {
            self.problems.missing.push(key.to_string());
        }
        value
    }

    fn parse<T: std::str::FromStr>(&mut self, key: &str, raw: Option<String>) -> Option<T> {
        let raw = raw?;
        match raw.parse::<T>() {
            Ok(value) => Some(value),
            Err(_) => {
                self.problems.invalid.push(key.to_string());
                None
            }
        }
    }

    fn required_parsed<T: std::str::FromStr>(&mut self, key: &str) -> Option<T> {
        let raw = self.required(key);
        self.parse(key, raw)
    }

    fn optional_parsed<T: std::str::FromStr>(&mut self, key: &str) -> Option<T> {
        let raw = self.optional_raw(key);
        self.parse(key, raw)
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut reader = Reader {
            lookup,
            problems: VariableProblems::default(),
        };

        let discord_token = reader.required("DISCORD_TOKEN");
        let client_id = reader.required_parsed::<u64>("DISCORD_CLIENT_ID");
        let guild_id = reader.required_parsed::<u64>("DISCORD_GUILD_ID");
        let staff_role = reader.required_parsed::<u64>("STAFF_ROLE_ID").map(RoleId);

        let categories: Vec<_> = BUILTIN_CATEGORIES
            .iter()
            .map(|template| {
                let grouping = reader
                    .required_parsed::<u64>(&format!("{}_CATEGORY_ID", template.env_prefix))
                    .map(ChannelId);
                let own_role = reader
                    .optional_parsed::<u64>(&format!("{}_STAFF_ROLE_ID", template.env_prefix))
                    .map(RoleId);
                (template, grouping, own_role)
            })
            .collect();

        let fallback_grouping = reader
            .optional_parsed::<u64>("TICKET_CATEGORY_ID")
            .map(ChannelId);
        let close_delay_secs = reader
            .optional_parsed::<u64>("TICKET_CLOSE_DELAY_SECS")
            .unwrap_or(5);
        let delete_attempts = reader
            .optional_parsed::<u32>("TICKET_DELETE_ATTEMPTS")
            .unwrap_or(3);
        let port = reader.optional_parsed::<u16>("PORT").unwrap_or(3000);
        let status_auth_token = reader.optional_raw("STATUS_AUTH_TOKEN");

        if delete_attempts == 0 {
            reader.problems.invalid.push("TICKET_DELETE_ATTEMPTS".to_string());
        }

        if !reader.problems.is_empty() {
            return Err(ConfigError::Variables(reader.problems));
        }

        // With no problems recorded every required value is present.
        let (Some(discord_token), Some(client_id), Some(guild_id), Some(staff_role)) =
            (discord_token, client_id, guild_id, staff_role)
        else {
            return Err(ConfigError::Variables(reader.problems));
        };

        let categories = categories
            .into_iter()
            .filter_map(|(template, grouping, own_role)| {
                grouping.map(|g| template.build(g, own_role.unwrap_or(staff_role)))
            })
            .collect();
        let categories = CategoryRegistry::new(categories, DEFAULT_CATEGORY_KEY)?;

        Ok(Config {
            discord_token,
            client_id,
            guild_id,
            staff_role,
            fallback_grouping,
            categories,
            close_delay_secs,
            delete_retry: RetryPolicy {
                attempts: delete_attempts,
                ..RetryPolicy::default()
            },
            port,
            status_auth_token,
        })
    }
}
