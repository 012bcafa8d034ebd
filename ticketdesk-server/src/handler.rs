//! Gateway event handler: dispatches interactions to the ticket desk.

use std::sync::Arc;

use serenity::all::{
    CommandInteraction, ComponentInteraction, ComponentInteractionDataKind, Context,
    EventHandler, GuildChannel, GuildId, Http, Interaction, Message, Ready,
};
use serenity::async_trait;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use ticketdesk_core::state_machine::CloseTrigger;
use ticketdesk_core::{ChannelId, Reply};

use crate::command::{
    parse_command, ticket_command, ParseResult, TicketCommand, CATEGORY_SELECT_ID,
    CLOSE_BUTTON_ID, COMMAND_NAME,
};
use crate::desk::TicketDesk;
use crate::discord::{command_options, member_standing, user_ref, DiscordResponder};
use crate::platform::Responder;

pub struct Handler {
    desk: Arc<TicketDesk>,
    guild: GuildId,
    http: Arc<Http>,
}

impl Handler {
    /// `http` is the client the desk's platform uses; interaction answers go
    /// through it as well.
    pub fn new(desk: Arc<TicketDesk>, guild: GuildId, http: Arc<Http>) -> Self {
        Self { desk, guild, http }
    }

    async fn handle_command(&self, command: CommandInteraction) {
        if command.data.name != COMMAND_NAME {
            return;
        }

        let options = command_options(&command.data.options());
        let owner = user_ref(&command.user);
        let standing = member_standing(command.member.as_deref());
        let channel = ChannelId(command.channel_id.get());
        let responder = DiscordResponder::for_command(self.http.clone(), command);

        let parsed = match parse_command(&options) {
            ParseResult::Command(parsed) => parsed,
            ParseResult::UnrecognizedCommand { attempted } => {
                warn!("Unrecognized ticket subcommand '{}'", attempted);
                return;
            }
        };
        info!("{} ran ticket {}", owner.id, parsed);

        match parsed {
            TicketCommand::Create { category, subject } => {
                self.desk
                    .create_from_command(&responder, owner, category.as_deref(), subject)
                    .await;
            }
            TicketCommand::Close => {
                self.desk
                    .close(&responder, channel, owner, standing, CloseTrigger::Command)
                    .await;
            }
            TicketCommand::Add { user: Some(target) } => {
                self.desk
                    .add_member(&responder, channel, owner, standing, target)
                    .await;
            }
            TicketCommand::Add { user: None } => {
                send(&responder, Reply::MemberNotFound).await;
            }
            TicketCommand::Panel { channel: target } => {
                self.desk
                    .send_panel(&responder, target.unwrap_or(channel))
                    .await;
            }
        }
    }

    async fn handle_component(&self, component: ComponentInteraction) {
        let custom_id = component.data.custom_id.clone();
        let owner = user_ref(&component.user);
        let standing = member_standing(component.member.as_ref());
        let channel = ChannelId(component.channel_id.get());
        let in_guild = component.guild_id.is_some();
        let selected = match &component.data.kind {
            ComponentInteractionDataKind::StringSelect { values } => values.first().cloned(),
            _ => None,
        };
        let responder = DiscordResponder::for_component(self.http.clone(), component);

        if custom_id == CATEGORY_SELECT_ID {
            match selected {
                Some(key) => {
                    self.desk
                        .create_from_selection(&responder, owner, &key)
                        .await;
                }
                None => send(&responder, Reply::UnknownCategory).await,
            }
        } else if custom_id == CLOSE_BUTTON_ID {
            if !in_guild {
                send(&responder, Reply::GuildOnly).await;
                return;
            }
            self.desk
                .close(&responder, channel, owner, standing, CloseTrigger::Button)
                .await;
        }
    }
}

async fn send(responder: &dyn Responder, reply: Reply) {
    if let Err(e) = responder.reply(&reply).await {
        error!("Failed to send reply {:?}: {}", reply, e);
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("Logged in as {}", ready.user.tag());

        let command = ticket_command(self.desk.categories());
        match self.guild.set_commands(&ctx.http, vec![command]).await {
            Ok(commands) => info!("Registered {} guild command(s)", commands.len()),
            Err(e) => error!("Failed to register guild commands: {}", e),
        }
    }

    async fn interaction_create(&self, _ctx: Context, interaction: Interaction) {
        let correlation_id = Uuid::new_v4();
        match interaction {
            Interaction::Command(command) => {
                let span = info_span!(
                    "interaction",
                    %correlation_id,
                    kind = "command",
                    user = %command.user.id
                );
                self.handle_command(command).instrument(span).await;
            }
            Interaction::Component(component) => {
                let span = info_span!(
                    "interaction",
                    %correlation_id,
                    kind = "component",
                    custom_id = %component.data.custom_id,
                    user = %component.user.id
                );
                self.handle_component(component).instrument(span).await;
            }
            _ => {}
        }
    }

    async fn channel_delete(
        &self,
        _ctx: Context,
        channel: GuildChannel,
        _messages: Option<Vec<Message>>,
    ) {
        if channel.guild_id != self.guild {
            return;
        }
        self.desk.channel_deleted(ChannelId(channel.id.get())).await;
    }
}
