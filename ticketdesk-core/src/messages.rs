//! Every text the bot shows to users.
//!
//! Replies go privately to the invoking user; notices are posted into the
//! ticket channel; the welcome and panel are the two rich messages. Rendering
//! them into platform builders happens in the server crate.

use crate::category::{Category, CategoryRegistry};
use crate::ids::{ChannelId, RoleId, UserId, UserRef};

/// Embed colour of the welcome message.
pub const WELCOME_COLOR: u32 = 0x5865f2;
/// Embed colour of the category panel.
pub const PANEL_COLOR: u32 = 0x6c5ce7;

pub const CLOSE_BUTTON_LABEL: &str = "Luk ticket";

/// Longest option description the platform accepts in a select menu.
const SELECT_DESCRIPTION_MAX_CHARS: usize = 100;

/// How a reply should read: a rejection, a neutral notice, or a confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Info,
    Error,
    Success,
}

/// Private answer to an interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    TicketCreated { label: String, channel: ChannelId },
    AlreadyOpen { label: String, channel: ChannelId },
    UnknownCategory,
    /// `ticket close` / `ticket add` outside a ticket channel.
    NotATicket,
    /// The close button pressed outside a ticket channel.
    NotATicketChannel,
    GroupingUnavailable { label: String },
    CreateFailed,
    CloseDenied,
    Closing,
    AlreadyClosing,
    CloseFailed,
    AddDenied,
    MemberNotFound,
    AlreadyHasAccess,
    MemberAdded { user: UserId },
    AddFailed,
    PanelSent { channel: ChannelId },
    PanelChannelInvalid,
    PanelFailed,
    GuildOnly,
}

impl Reply {
    pub fn text(&self) -> String {
        match self {
            Reply::TicketCreated { label, channel } => {
                format!("Din ticket ({}) er oprettet: {}", label, channel.mention())
            }
            Reply::AlreadyOpen { label, channel } => format!(
                "Du har allerede en åben ticket i kategorien {}: {}",
                label,
                channel.mention()
            ),
            Reply::UnknownCategory => "Kunne ikke finde den valgte kategori.".to_string(),
            Reply::NotATicket => "Denne kommando kan kun bruges i en ticket.".to_string(),
            Reply::NotATicketChannel => "Dette er ikke en ticket kanal.".to_string(),
            Reply::GroupingUnavailable { label } => format!(
                "Kategorien {} er ikke sat korrekt op. Kontakt en administrator.",
                label
            ),
            Reply::CreateFailed => {
                "Noget gik galt under oprettelsen af din ticket. Prøv igen senere.".to_string()
            }
            Reply::CloseDenied => "Du har ikke adgang til at lukke denne ticket.".to_string(),
            Reply::Closing => "Ticketen bliver lukket. Tak for din henvendelse!".to_string(),
            Reply::AlreadyClosing => "Ticketen er allerede ved at blive lukket.".to_string(),
            Reply::CloseFailed => "Der opstod en fejl under lukning af ticketen.".to_string(),
            Reply::AddDenied => {
                "Du skal have staff-adgang for at tilføje brugere til en ticket.".to_string()
            }
            Reply::MemberNotFound => "Kunne ikke finde den angivne bruger.".to_string(),
            Reply::AlreadyHasAccess => "Denne bruger har allerede adgang til ticketen.".to_string(),
            Reply::MemberAdded { user } => format!("{} er tilføjet til ticketen.", user.mention()),
            Reply::AddFailed => {
                "Der skete en fejl under tilføjelsen af brugeren til ticketen.".to_string()
            }
            Reply::PanelSent { channel } => {
                format!("Ticket-panelet er sendt til {}.", channel.mention())
            }
            Reply::PanelChannelInvalid => {
                "Kunne ikke finde en gyldig kanal til panelet.".to_string()
            }
            Reply::PanelFailed => {
                "Der skete en fejl under udsendelsen af ticket-panelet.".to_string()
            }
            Reply::GuildOnly => "Kan kun bruges på serveren.".to_string(),
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            Reply::TicketCreated { .. }
            | Reply::Closing
            | Reply::MemberAdded { .. }
            | Reply::PanelSent { .. } => Tone::Success,
            Reply::AlreadyOpen { .. } | Reply::AlreadyClosing | Reply::AlreadyHasAccess => {
                Tone::Info
            }
            _ => Tone::Error,
        }
    }
}

/// Plain message posted into a ticket channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    ClosingCountdown { seconds: u64 },
    MemberAdded { user: UserId, by: UserId },
}

impl Notice {
    pub fn text(&self) -> String {
        match self {
            Notice::ClosingCountdown { seconds } => {
                format!("Ticketen bliver lukket om {} sekunder...", seconds)
            }
            Notice::MemberAdded { user, by } => format!(
                "{} blev tilføjet til ticketen af {}.",
                user.mention(),
                by.mention()
            ),
        }
    }
}

/// First message in a new ticket channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Welcome {
    pub owner: UserRef,
    /// Role pinged alongside the owner.
    pub mention_role: RoleId,
    pub category_label: String,
    pub category_emoji: String,
    /// Optional subject given with `ticket create`.
    pub subject: Option<String>,
}

impl Welcome {
    pub const EMBED_TITLE: &'static str = "Support Ticket";
    pub const OWNER_FIELD: &'static str = "Bruger";

    pub fn new(
        owner: UserRef,
        mention_role: RoleId,
        category: &Category,
        subject: Option<String>,
    ) -> Self {
        Self {
            owner,
            mention_role,
            category_label: category.label.clone(),
            category_emoji: category.emoji.clone(),
            subject,
        }
    }

    pub fn content(&self) -> String {
        [
            format!("{} {}", self.owner.id.mention(), self.mention_role.mention()),
            format!("{} **{}**", self.category_emoji, self.category_label),
            "Velkommen til supporten! Beskriv dit problem så detaljeret som muligt.".to_string(),
            "Når sagen er løst, kan du lukke ticketen med knappen nedenfor.".to_string(),
        ]
        .join("\n")
    }

    pub fn embed_description(&self) -> String {
        let subject = match &self.subject {
            Some(subject) => format!("**Emne:** {}", subject),
            None => "Beskriv venligst din henvendelse så detaljeret som muligt.".to_string(),
        };
        format!(
            "{} **Kategori:** {}\n\n{}",
            self.category_emoji, self.category_label, subject
        )
    }

    pub fn owner_field_value(&self) -> String {
        format!("{} ({})", self.owner.tag, self.owner.id)
    }
}

/// One category as shown on the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelEntry {
    pub key: String,
    pub label: String,
    pub emoji: String,
    pub description: String,
}

impl PanelEntry {
    pub fn field_name(&self) -> String {
        format!("{} {}", self.emoji, self.label)
    }

    /// The description cut to what a select option can hold.
    pub fn option_description(&self) -> String {
        self.description
            .chars()
            .take(SELECT_DESCRIPTION_MAX_CHARS)
            .collect()
    }
}

/// The category overview with its select menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    pub guild_name: String,
    pub entries: Vec<PanelEntry>,
}

impl Panel {
    pub const TITLE: &'static str = "Opret en Ticket";
    pub const DESCRIPTION: &'static str =
        "Vælg den kategori der passer bedst til dit behov. Klik på dropdown-menuen nedenfor.";
    pub const PLACEHOLDER: &'static str = "Vælg en kategori...";

    pub fn new(guild_name: impl Into<String>, registry: &CategoryRegistry) -> Self {
        Self {
            guild_name: guild_name.into(),
            entries: registry
                .iter()
                .map(|category| PanelEntry {
                    key: category.key.clone(),
                    label: category.label.clone(),
                    emoji: category.emoji.clone(),
                    description: category.description.clone(),
                })
                .collect(),
        }
    }

    pub fn footer(&self) -> String {
        format!("{} • Ticket System", self.guild_name)
    }
}
