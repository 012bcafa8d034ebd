//! Serenity adapters for [`TicketPlatform`] and [`Responder`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serenity::all::{
    Channel, ChannelType, CommandInteraction, ComponentInteraction, CreateChannel,
    CreateInteractionResponse, CreateInteractionResponseMessage, GuildChannel, GuildId, Http,
    Member, ResolvedOption, ResolvedValue,
};
use tracing::debug;

use ticketdesk_core::access::Overwrite;
use ticketdesk_core::state_machine::ChannelRequest;
use ticketdesk_core::{
    ChannelId, ChannelKind, ChannelSnapshot, MemberStanding, Notice, Panel, Reply, UserId,
    UserRef, Welcome,
};

use crate::command::{CommandOption, OptionValue};
use crate::platform::{PlatformError, Responder, TicketPlatform};
use crate::render;

fn map_error(err: serenity::Error) -> PlatformError {
    if let serenity::Error::Http(http_err) = &err {
        if http_err.status_code().map(|s| s.as_u16()) == Some(404) {
            return PlatformError::NotFound;
        }
    }
    PlatformError::Api(err.to_string())
}

fn channel_id(id: ChannelId) -> serenity::all::ChannelId {
    serenity::all::ChannelId::new(id.0)
}

fn snapshot(channel: &GuildChannel) -> ChannelSnapshot {
    ChannelSnapshot {
        id: ChannelId(channel.id.get()),
        name: channel.name.clone(),
        kind: match channel.kind {
            ChannelType::Text => ChannelKind::Text,
            ChannelType::Category => ChannelKind::Category,
            _ => ChannelKind::Other,
        },
        topic: channel.topic.clone(),
        parent: channel.parent_id.map(|p| ChannelId(p.get())),
    }
}

pub fn user_ref(user: &serenity::all::User) -> UserRef {
    UserRef::new(user.id.get(), user.name.clone(), user.tag())
}

/// Roles plus the manage-channels permission resolved for the invoking channel.
pub fn member_standing(member: Option<&Member>) -> MemberStanding {
    match member {
        Some(member) => MemberStanding {
            roles: member.roles.iter().map(|r| r.get().into()).collect(),
            manage_channels: member
                .permissions
                .is_some_and(|p| p.manage_channels()),
        },
        None => MemberStanding::default(),
    }
}

/// Copies interaction options out of the SDK's borrowed representation.
pub fn command_options(options: &[ResolvedOption<'_>]) -> Vec<CommandOption> {
    options
        .iter()
        .map(|option| CommandOption {
            name: option.name.to_string(),
            value: match &option.value {
                ResolvedValue::SubCommand(sub) => OptionValue::SubCommand(command_options(sub)),
                ResolvedValue::String(s) => OptionValue::String(s.to_string()),
                ResolvedValue::User(user, _) => OptionValue::User(UserId(user.id.get())),
                ResolvedValue::Channel(channel) => {
                    OptionValue::Channel(ChannelId(channel.id.get()))
                }
                _ => OptionValue::Other,
            },
        })
        .collect()
}

/// The ticket guild, reached over the REST API.
pub struct DiscordPlatform {
    http: Arc<Http>,
    guild: GuildId,
}

impl DiscordPlatform {
    pub fn new(http: Arc<Http>, guild: GuildId) -> Self {
        Self { http, guild }
    }

    async fn guild_channel(&self, channel: ChannelId) -> Result<GuildChannel, PlatformError> {
        match self.http.get_channel(channel_id(channel)).await.map_err(map_error)? {
            Channel::Guild(channel) if channel.guild_id == self.guild => Ok(channel),
            // DMs and other guilds' channels are never ticket channels.
            _ => Err(PlatformError::NotFound),
        }
    }
}

#[async_trait]
impl TicketPlatform for DiscordPlatform {
    async fn guild_name(&self) -> Result<String, PlatformError> {
        let guild = self
            .guild
            .to_partial_guild(&*self.http)
            .await
            .map_err(map_error)?;
        Ok(guild.name)
    }

    async fn list_channels(&self) -> Result<Vec<ChannelSnapshot>, PlatformError> {
        let channels = self.guild.channels(&*self.http).await.map_err(map_error)?;
        Ok(channels.values().map(snapshot).collect())
    }

    async fn get_channel(&self, channel: ChannelId) -> Result<ChannelSnapshot, PlatformError> {
        Ok(snapshot(&self.guild_channel(channel).await?))
    }

    async fn create_channel(&self, request: &ChannelRequest) -> Result<ChannelId, PlatformError> {
        let overwrites = request
            .overwrites
            .iter()
            .map(|o| render::permission_overwrite(o, self.guild))
            .collect::<Vec<_>>();
        let builder = CreateChannel::new(&request.name)
            .kind(ChannelType::Text)
            .topic(&request.topic)
            .category(channel_id(request.parent))
            .permissions(overwrites);

        let channel = self
            .guild
            .create_channel(&*self.http, builder)
            .await
            .map_err(map_error)?;
        Ok(ChannelId(channel.id.get()))
    }

    async fn post_welcome(
        &self,
        channel: ChannelId,
        welcome: &Welcome,
    ) -> Result<(), PlatformError> {
        channel_id(channel)
            .send_message(&*self.http, render::welcome_message(welcome))
            .await
            .map_err(map_error)?;
        Ok(())
    }

    async fn post_notice(&self, channel: ChannelId, notice: &Notice) -> Result<(), PlatformError> {
        channel_id(channel)
            .send_message(&*self.http, render::notice_message(notice))
            .await
            .map_err(map_error)?;
        Ok(())
    }

    async fn post_panel(&self, channel: ChannelId, panel: &Panel) -> Result<(), PlatformError> {
        channel_id(channel)
            .send_message(&*self.http, render::panel_message(panel))
            .await
            .map_err(map_error)?;
        Ok(())
    }

    async fn member_can_view(
        &self,
        channel: ChannelId,
        user: UserId,
    ) -> Result<bool, PlatformError> {
        let member = self
            .guild
            .member(&*self.http, serenity::all::UserId::new(user.0))
            .await
            .map_err(map_error)?;
        let channel = self.guild_channel(channel).await?;
        let guild = self
            .guild
            .to_partial_guild(&*self.http)
            .await
            .map_err(map_error)?;

        let permissions = guild.user_permissions_in(&channel, &member);
        debug!("Member {} has {:?} in {}", user, permissions, channel.id);
        Ok(permissions.view_channel())
    }

    async fn grant_access(
        &self,
        channel: ChannelId,
        overwrite: &Overwrite,
    ) -> Result<(), PlatformError> {
        channel_id(channel)
            .create_permission(&*self.http, render::permission_overwrite(overwrite, self.guild))
            .await
            .map_err(map_error)
    }

    async fn delete_channel(&self, channel: ChannelId, reason: &str) -> Result<(), PlatformError> {
        self.http
            .delete_channel(channel_id(channel), Some(reason))
            .await
            .map_err(map_error)?;
        Ok(())
    }
}

#[derive(Clone)]
enum PendingInteraction {
    Command(CommandInteraction),
    Component(ComponentInteraction),
}

/// Answers one interaction. Every answer is ephemeral; after a defer the
/// deferred response is edited instead of creating a new one.
pub struct DiscordResponder {
    http: Arc<Http>,
    interaction: PendingInteraction,
    deferred: AtomicBool,
}

impl DiscordResponder {
    pub fn for_command(http: Arc<Http>, interaction: CommandInteraction) -> Self {
        Self {
            http,
            interaction: PendingInteraction::Command(interaction),
            deferred: AtomicBool::new(false),
        }
    }

    pub fn for_component(http: Arc<Http>, interaction: ComponentInteraction) -> Self {
        Self {
            http,
            interaction: PendingInteraction::Component(interaction),
            deferred: AtomicBool::new(false),
        }
    }

    async fn create_response(
        &self,
        response: CreateInteractionResponse,
    ) -> Result<(), serenity::Error> {
        match &self.interaction {
            PendingInteraction::Command(i) => i.create_response(&*self.http, response).await,
            PendingInteraction::Component(i) => i.create_response(&*self.http, response).await,
        }
    }
}

#[async_trait]
impl Responder for DiscordResponder {
    async fn defer(&self) -> Result<(), PlatformError> {
        let response =
            CreateInteractionResponse::Defer(CreateInteractionResponseMessage::new().ephemeral(true));
        self.create_response(response).await.map_err(map_error)?;
        self.deferred.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn reply(&self, reply: &Reply) -> Result<(), PlatformError> {
        if self.deferred.load(Ordering::SeqCst) {
            let edit = render::reply_edit(reply);
            match &self.interaction {
                PendingInteraction::Command(i) => i.edit_response(&*self.http, edit).await,
                PendingInteraction::Component(i) => i.edit_response(&*self.http, edit).await,
            }
            .map_err(map_error)?;
            return Ok(());
        }

        let response = CreateInteractionResponse::Message(render::reply_message(reply));
        self.create_response(response).await.map_err(map_error)
    }
}
