//! The `ticket` slash command: its definition and parsing of invocations.
use std::fmt;

use serenity::all::{ChannelType, CommandOptionType, CreateCommand, CreateCommandOption};

use ticketdesk_core::{Category, CategoryRegistry, ChannelId, UserId};

pub const COMMAND_NAME: &str = "ticket";
/// Custom id of the close button under the welcome message.
pub const CLOSE_BUTTON_ID: &str = "division-ticket-close";
/// Custom id of the panel's category select menu.
pub const CATEGORY_SELECT_ID: &str = "division-ticket-category-select";

pub const SUBJECT_MIN_CHARS: u16 = 3;
pub const SUBJECT_MAX_CHARS: u16 = 140;

/// A parsed `ticket` subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketCommand {
    Create {
        category: Option<String>,
        subject: Option<String>,
    },
    Close,
    Add {
        user: Option<UserId>,
    },
    /// Post the panel in `channel`, or in the invoking channel.
    Panel {
        channel: Option<ChannelId>,
    },
}

impl fmt::Display for TicketCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketCommand::Create { category, .. } => {
                write!(f, "create")?;
                if let Some(category) = category {
                    write!(f, " kategori:{}", category)?;
                }
                Ok(())
            }
            TicketCommand::Close => write!(f, "close"),
            TicketCommand::Add { user } => match user {
                Some(user) => write!(f, "add bruger:{}", user),
                None => write!(f, "add"),
            },
            TicketCommand::Panel { channel } => match channel {
                Some(channel) => write!(f, "panel kanal:{}", channel),
                None => write!(f, "panel"),
            },
        }
    }
}

/// Result of parsing a command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseResult {
    /// The subcommand was not recognized (stale registration, most likely)
    UnrecognizedCommand {
        /// The subcommand name that was attempted
        attempted: String,
    },
    /// A valid command was found
    Command(TicketCommand),
}

/// An interaction option, detached from the SDK's borrowed types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOption {
    pub name: String,
    pub value: OptionValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    SubCommand(Vec<CommandOption>),
    String(String),
    User(UserId),
    Channel(ChannelId),
    Other,
}

fn string_option(options: &[CommandOption], name: &str) -> Option<String> {
    options.iter().find(|o| o.name == name).and_then(|o| match &o.value {
        OptionValue::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        _ => None,
    })
}

/// Parses the options of a `ticket` invocation.
pub fn parse_command(options: &[CommandOption]) -> ParseResult {
    let Some(CommandOption {
        name,
        value: OptionValue::SubCommand(sub_options),
    }) = options.first()
    else {
        return ParseResult::UnrecognizedCommand {
            attempted: String::new(),
        };
    };

    let command = match name.as_str() {
        "create" => TicketCommand::Create {
            category: string_option(sub_options, "kategori"),
            subject: string_option(sub_options, "emne"),
        },
        "close" => TicketCommand::Close,
        "add" => TicketCommand::Add {
            user: sub_options.iter().find_map(|o| match (&o.name[..], &o.value) {
                ("bruger", OptionValue::User(user)) => Some(*user),
                _ => None,
            }),
        },
        "panel" => TicketCommand::Panel {
            channel: sub_options.iter().find_map(|o| match (&o.name[..], &o.value) {
                ("kanal", OptionValue::Channel(channel)) => Some(*channel),
                _ => None,
            }),
        },
        other => {
            return ParseResult::UnrecognizedCommand {
                attempted: other.to_string(),
            }
        }
    };
    ParseResult::Command(command)
}

fn choice_name(category: &Category) -> String {
    format!("{} {}", category.emoji, category.label)
}

/// The guild command registered at startup. Category choices come from the
/// configured registry.
pub fn ticket_command(categories: &CategoryRegistry) -> CreateCommand {
    let category_option = categories.iter().fold(
        CreateCommandOption::new(CommandOptionType::String, "kategori", "Vælg kategori")
            .required(false),
        |option, category| option.add_string_choice(choice_name(category), &category.key),
    );

    let create = CreateCommandOption::new(
        CommandOptionType::SubCommand,
        "create",
        "Opret en ny support-ticket",
    )
    .add_sub_option(category_option)
    .add_sub_option(
        CreateCommandOption::new(CommandOptionType::String, "emne", "Kort beskrivelse af din sag")
            .required(false)
            .min_length(SUBJECT_MIN_CHARS)
            .max_length(SUBJECT_MAX_CHARS),
    );

    let close = CreateCommandOption::new(
        CommandOptionType::SubCommand,
        "close",
        "Luk den nuværende ticket",
    );

    let add = CreateCommandOption::new(
        CommandOptionType::SubCommand,
        "add",
        "Tilføj et medlem til ticketen",
    )
    .add_sub_option(
        CreateCommandOption::new(CommandOptionType::User, "bruger", "Medlem der skal tilføjes")
            .required(true),
    );

    let panel = CreateCommandOption::new(
        CommandOptionType::SubCommand,
        "panel",
        "Send ticket-panelet med kategori-dropdown",
    )
    .add_sub_option(
        CreateCommandOption::new(CommandOptionType::Channel, "kanal", "Kanal panelet skal sendes i")
            .required(false)
            .channel_types(vec![ChannelType::Text]),
    );

    CreateCommand::new(COMMAND_NAME)
        .description("Ticket system kommandoer")
        .add_option(create)
        .add_option(close)
        .add_option(add)
        .add_option(panel)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(name: &str, options: Vec<CommandOption>) -> Vec<CommandOption> {
        vec![CommandOption {
            name: name.to_string(),
            value: OptionValue::SubCommand(options),
        }]
    }

    fn string(name: &str, value: &str) -> CommandOption {
        CommandOption {
            name: name.to_string(),
            value: OptionValue::String(value.to_string()),
        }
    }

    #[test]
    fn test_parse_create_without_options() {
        assert_eq!(
            parse_command(&sub("create", vec![])),
            ParseResult::Command(TicketCommand::Create {
                category: None,
                subject: None,
            })
        );
    }

    #[test]
    fn test_parse_create_with_options() {
        let options = sub(
            "create",
            vec![string("kategori", "unban"), string("emne", "  Ban appeal  ")],
        );
        assert_eq!(
            parse_command(&options),
            ParseResult::Command(TicketCommand::Create {
                category: Some("unban".to_string()),
                subject: Some("Ban appeal".to_string()),
            })
        );
    }

    #[test]
    fn test_parse_blank_subject_is_dropped() {
        let options = sub("create", vec![string("emne", "   ")]);
        assert_eq!(
            parse_command(&options),
            ParseResult::Command(TicketCommand::Create {
                category: None,
                subject: None,
            })
        );
    }

    #[test]
    fn test_parse_add_and_panel() {
        let add = sub(
            "add",
            vec![CommandOption {
                name: "bruger".to_string(),
                value: OptionValue::User(UserId(43)),
            }],
        );
        assert_eq!(
            parse_command(&add),
            ParseResult::Command(TicketCommand::Add {
                user: Some(UserId(43))
            })
        );

        let panel = sub(
            "panel",
            vec![CommandOption {
                name: "kanal".to_string(),
                value: OptionValue::Channel(ChannelId(9)),
            }],
        );
        assert_eq!(
            parse_command(&panel),
            ParseResult::Command(TicketCommand::Panel {
                channel: Some(ChannelId(9))
            })
        );
        assert_eq!(
            parse_command(&sub("panel", vec![])),
            ParseResult::Command(TicketCommand::Panel { channel: None })
        );
    }

    #[test]
    fn test_parse_close() {
        assert_eq!(
            parse_command(&sub("close", vec![])),
            ParseResult::Command(TicketCommand::Close)
        );
    }

    #[test]
    fn test_unknown_subcommand() {
        assert_eq!(
            parse_command(&sub("reopen", vec![])),
            ParseResult::UnrecognizedCommand {
                attempted: "reopen".to_string()
            }
        );
        assert_eq!(
            parse_command(&[string("kategori", "general")]),
            ParseResult::UnrecognizedCommand {
                attempted: String::new()
            }
        );
    }

    #[test]
    fn test_display() {
        let create = TicketCommand::Create {
            category: Some("firma".to_string()),
            subject: None,
        };
        assert_eq!(create.to_string(), "create kategori:firma");
        assert_eq!(TicketCommand::Close.to_string(), "close");
        assert_eq!(
            TicketCommand::Add {
                user: Some(UserId(5))
            }
            .to_string(),
            "add bruger:5"
        );
    }

    #[test]
    fn test_category_choices_show_emoji_and_label() {
        let command = serde_json::to_value(ticket_command(&crate::testing::registry())).unwrap();
        let create = &command["options"][0];
        assert_eq!(create["name"], "create");

        let kategori = &create["options"][0];
        assert_eq!(kategori["name"], "kategori");
        let general = kategori["choices"]
            .as_array()
            .unwrap()
            .iter()
            .find(|choice| choice["value"] == "general")
            .unwrap();
        assert_eq!(general["name"], "💬 General");
    }
}
