//! Serenity builders for the desk's messages and permission overwrites.

use serenity::all::{
    ButtonStyle, CreateActionRow, CreateAllowedMentions, CreateButton, CreateEmbed,
    CreateEmbedFooter, CreateInteractionResponseMessage, CreateMessage, CreateSelectMenu,
    CreateSelectMenuKind, CreateSelectMenuOption, EditInteractionResponse, GuildId,
    PermissionOverwrite, PermissionOverwriteType, Permissions, ReactionType, Timestamp,
};

use ticketdesk_core::access::{Capability, Overwrite, OverwriteTarget};
use ticketdesk_core::messages::{CLOSE_BUTTON_LABEL, PANEL_COLOR, WELCOME_COLOR};
use ticketdesk_core::{Notice, Panel, Reply, Tone, Welcome};

use crate::command::{CATEGORY_SELECT_ID, CLOSE_BUTTON_ID};

const ERROR_COLOR: u32 = 0xe74c3c;
const INFO_COLOR: u32 = 0x3498db;
const SUCCESS_COLOR: u32 = 0x2ecc71;

pub fn permissions(capabilities: &[Capability]) -> Permissions {
    capabilities
        .iter()
        .fold(Permissions::empty(), |acc, capability| {
            acc | match capability {
                Capability::ViewChannel => Permissions::VIEW_CHANNEL,
                Capability::SendMessages => Permissions::SEND_MESSAGES,
                Capability::AttachFiles => Permissions::ATTACH_FILES,
                Capability::ReadMessageHistory => Permissions::READ_MESSAGE_HISTORY,
                Capability::ManageChannels => Permissions::MANAGE_CHANNELS,
            }
        })
}

/// `@everyone` is the role whose id equals the guild id.
pub fn permission_overwrite(overwrite: &Overwrite, guild: GuildId) -> PermissionOverwrite {
    let kind = match overwrite.target {
        OverwriteTarget::Everyone => PermissionOverwriteType::Role(guild.get().into()),
        OverwriteTarget::Member(user) => PermissionOverwriteType::Member(user.0.into()),
        OverwriteTarget::Role(role) => PermissionOverwriteType::Role(role.0.into()),
    };
    PermissionOverwrite {
        allow: permissions(&overwrite.allow),
        deny: permissions(&overwrite.deny),
        kind,
    }
}

pub fn welcome_message(welcome: &Welcome) -> CreateMessage {
    let embed = CreateEmbed::new()
        .colour(WELCOME_COLOR)
        .title(Welcome::EMBED_TITLE)
        .description(welcome.embed_description())
        .field(Welcome::OWNER_FIELD, welcome.owner_field_value(), false)
        .timestamp(Timestamp::now());

    let close = CreateButton::new(CLOSE_BUTTON_ID)
        .label(CLOSE_BUTTON_LABEL)
        .style(ButtonStyle::Danger)
        .emoji(ReactionType::Unicode("🔒".to_string()));

    // Only the owner and the staff role are pinged, whatever else the text holds.
    let mentions = CreateAllowedMentions::new()
        .users(vec![welcome.owner.id.0])
        .roles(vec![welcome.mention_role.0]);

    CreateMessage::new()
        .content(welcome.content())
        .embed(embed)
        .components(vec![CreateActionRow::Buttons(vec![close])])
        .allowed_mentions(mentions)
}

pub fn notice_message(notice: &Notice) -> CreateMessage {
    let mentions = match notice {
        Notice::ClosingCountdown { .. } => CreateAllowedMentions::new(),
        Notice::MemberAdded { user, .. } => CreateAllowedMentions::new().users(vec![user.0]),
    };
    CreateMessage::new()
        .content(notice.text())
        .allowed_mentions(mentions)
}

pub fn panel_message(panel: &Panel) -> CreateMessage {
    let embed = panel.entries.iter().fold(
        CreateEmbed::new()
            .colour(PANEL_COLOR)
            .title(Panel::TITLE)
            .description(Panel::DESCRIPTION)
            .footer(CreateEmbedFooter::new(panel.footer()))
            .timestamp(Timestamp::now()),
        |embed, entry| embed.field(entry.field_name(), &entry.description, false),
    );

    let options = panel
        .entries
        .iter()
        .map(|entry| {
            CreateSelectMenuOption::new(&entry.label, &entry.key)
                .description(entry.option_description())
                .emoji(ReactionType::Unicode(entry.emoji.clone()))
        })
        .collect();

    let menu = CreateSelectMenu::new(CATEGORY_SELECT_ID, CreateSelectMenuKind::String { options })
        .placeholder(Panel::PLACEHOLDER);

    CreateMessage::new()
        .embed(embed)
        .components(vec![CreateActionRow::SelectMenu(menu)])
}

fn tone_color(tone: Tone) -> u32 {
    match tone {
        Tone::Error => ERROR_COLOR,
        Tone::Info => INFO_COLOR,
        Tone::Success => SUCCESS_COLOR,
    }
}

fn reply_embed(reply: &Reply) -> CreateEmbed {
    CreateEmbed::new()
        .colour(tone_color(reply.tone()))
        .description(reply.text())
}

/// A fresh private answer.
pub fn reply_message(reply: &Reply) -> CreateInteractionResponseMessage {
    CreateInteractionResponseMessage::new()
        .embed(reply_embed(reply))
        .ephemeral(true)
}

/// Fills in a deferred answer.
pub fn reply_edit(reply: &Reply) -> EditInteractionResponse {
    EditInteractionResponse::new().embed(reply_embed(reply))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use ticketdesk_core::access::{collaborator_overwrite, ticket_overwrites};
    use ticketdesk_core::{RoleId, UserId};

    fn capability() -> impl Strategy<Value = Capability> {
        prop_oneof![
            Just(Capability::ViewChannel),
            Just(Capability::SendMessages),
            Just(Capability::AttachFiles),
            Just(Capability::ReadMessageHistory),
            Just(Capability::ManageChannels),
        ]
    }

    #[test]
    fn test_everyone_maps_to_guild_role() {
        let overwrites = ticket_overwrites(UserId(42), RoleId(7));
        let everyone = permission_overwrite(&overwrites[0], GuildId::new(99));

        assert_eq!(everyone.kind, PermissionOverwriteType::Role(serenity::all::RoleId::new(99)));
        assert_eq!(everyone.deny, Permissions::VIEW_CHANNEL);
        assert!(everyone.allow.is_empty());
    }

    #[test]
    fn test_owner_and_staff_permissions() {
        let overwrites = ticket_overwrites(UserId(42), RoleId(7));
        let owner = permission_overwrite(&overwrites[1], GuildId::new(99));
        let staff = permission_overwrite(&overwrites[2], GuildId::new(99));

        assert_eq!(owner.kind, PermissionOverwriteType::Member(serenity::all::UserId::new(42)));
        assert!(owner.allow.view_channel() && owner.allow.attach_files());
        assert!(!owner.allow.manage_channels());

        assert_eq!(staff.kind, PermissionOverwriteType::Role(serenity::all::RoleId::new(7)));
        assert!(staff.allow.manage_channels());
        assert!(!staff.allow.attach_files());
    }

    #[test]
    fn test_collaborator_permissions() {
        let added = permission_overwrite(&collaborator_overwrite(UserId(5)), GuildId::new(99));
        assert_eq!(
            added.allow,
            Permissions::VIEW_CHANNEL
                | Permissions::SEND_MESSAGES
                | Permissions::READ_MESSAGE_HISTORY
                | Permissions::ATTACH_FILES
        );
        assert!(added.deny.is_empty());
    }

    proptest! {
        #[test]
        fn one_flag_per_distinct_capability(caps in proptest::collection::vec(capability(), 0..8)) {
            let mut distinct = caps.clone();
            distinct.sort_by_key(|c| format!("{:?}", c));
            distinct.dedup();
            prop_assert_eq!(permissions(&caps).bits().count_ones() as usize, distinct.len());
        }
    }
}
