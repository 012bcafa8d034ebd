//! Ticket channel names.
//!
//! A name looks like `ticket-general-alice-6789`: prefix, category key,
//! sanitized username fragment, last four digits of the user id.

use crate::category::Category;
use crate::ids::{UserId, UserRef};

pub const TICKET_CHANNEL_PREFIX: &str = "ticket-";

/// Longest username fragment kept in a channel name.
const USERNAME_FRAGMENT_LEN: usize = 8;

/// Used when nothing of the username survives sanitizing.
const USERNAME_PLACEHOLDER: &str = "bruger";

const ID_SUFFIX_LEN: usize = 4;

pub fn channel_name(user: &UserRef, category: &Category) -> String {
    format!(
        "{}{}-{}-{}",
        TICKET_CHANNEL_PREFIX,
        sanitize(&category.key),
        username_fragment(&user.username),
        id_suffix(user.id)
    )
}

pub fn has_ticket_prefix(name: &str) -> bool {
    name.starts_with(TICKET_CHANNEL_PREFIX)
}

/// Lowercase and keep only ASCII letters and digits.
fn sanitize(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

fn username_fragment(username: &str) -> String {
    let fragment: String = sanitize(username)
        .chars()
        .take(USERNAME_FRAGMENT_LEN)
        .collect();
    if fragment.is_empty() {
        USERNAME_PLACEHOLDER.to_string()
    } else {
        fragment
    }
}

fn id_suffix(id: UserId) -> String {
    let digits = id.0.to_string();
    let start = digits.len().saturating_sub(ID_SUFFIX_LEN);
    digits[start..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::test_registry;
    use proptest::prelude::*;

    fn user(id: u64, username: &str) -> UserRef {
        UserRef::new(id, username, username)
    }

    #[test]
    fn test_channel_name_layout() {
        let registry = test_registry();
        let general = registry.get("general").unwrap();
        assert_eq!(
            channel_name(&user(123456789, "Alice"), general),
            "ticket-general-alice-6789"
        );
    }

    #[test]
    fn test_username_is_stripped_and_capped() {
        let registry = test_registry();
        let unban = registry.get("unban").unwrap();
        assert_eq!(
            channel_name(&user(42, "Mr. Very_Long-Name"), unban),
            "ticket-unban-mrverylo-42"
        );
        assert_eq!(
            channel_name(&user(1111222233334444, "ÆØÅ bob"), unban),
            "ticket-unban-bob-4444"
        );
    }

    #[test]
    fn test_empty_username_uses_placeholder() {
        let registry = test_registry();
        let firma = registry.get("firma").unwrap();
        assert_eq!(channel_name(&user(9, "___"), firma), "ticket-firma-bruger-9");
        assert_eq!(channel_name(&user(9, "日本語"), firma), "ticket-firma-bruger-9");
    }

    #[test]
    fn test_has_ticket_prefix() {
        assert!(has_ticket_prefix("ticket-general-alice-6789"));
        assert!(!has_ticket_prefix("general"));
        assert!(!has_ticket_prefix("Ticket-general"));
    }

    proptest! {
        #[test]
        fn channel_name_is_prefixed_and_scoped(id in any::<u64>(), username in ".*", idx in 0usize..6) {
            let registry = test_registry();
            let category = registry.iter().nth(idx).unwrap();
            let name = channel_name(&user(id, &username), category);

            prop_assert!(name.starts_with(TICKET_CHANNEL_PREFIX));
            let expected_key = format!("-{}-", category.key);
            prop_assert!(name.contains(&expected_key));
            prop_assert!(name
                .chars()
                .all(|c| c == '-' || c.is_ascii_lowercase() || c.is_ascii_digit()));
            prop_assert!(name.ends_with(&id_suffix(UserId(id))));
        }
    }
}
