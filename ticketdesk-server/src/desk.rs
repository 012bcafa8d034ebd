//! The ticket desk: turns user requests into state-machine runs.
//!
//! The desk works out which state a ticket is in (there is no stored state;
//! the channel list, the open-ticket index and the deletion scheduler are
//! the record), builds the request event and hands both to the interpreter.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use ticketdesk_core::state_machine::{
    CloseTrigger, CreateRequest, Effect, Event, TicketRecord, TicketState,
};
use ticketdesk_core::{
    find_open_ticket, has_staff_capability, Actor, Category, CategoryRegistry, ChannelId,
    ChannelKind, MemberStanding, Panel, Reply, RoleId, TicketChannel, TicketKey, UserId, UserRef,
};

use crate::config::Config;
use crate::index::OpenTicketIndex;
use crate::interpreter::{drive, execute_effects, InterpreterContext};
use crate::locks::KeyedLocks;
use crate::platform::{PlatformError, Responder, TicketPlatform};
use crate::scheduler::{DeletionScheduler, RetryPolicy};
use crate::status::StatusData;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeskSettings {
    /// Global staff role, checked alongside the ticket category's own role.
    pub staff_role: RoleId,
    pub fallback_grouping: Option<ChannelId>,
    pub close_delay_secs: u64,
    pub delete_retry: RetryPolicy,
}

impl DeskSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            staff_role: config.staff_role,
            fallback_grouping: config.fallback_grouping,
            close_delay_secs: config.close_delay_secs,
            delete_retry: config.delete_retry,
        }
    }
}

pub struct TicketDesk {
    ctx: InterpreterContext,
    categories: CategoryRegistry,
    settings: DeskSettings,
    locks: KeyedLocks,
}

impl TicketDesk {
    pub fn new(
        platform: Arc<dyn TicketPlatform>,
        categories: CategoryRegistry,
        settings: DeskSettings,
    ) -> Self {
        Self {
            ctx: InterpreterContext {
                platform,
                index: Arc::new(OpenTicketIndex::new()),
                scheduler: Arc::new(DeletionScheduler::new()),
                retry: settings.delete_retry,
            },
            categories,
            settings,
            locks: KeyedLocks::new(),
        }
    }

    pub fn from_config(platform: Arc<dyn TicketPlatform>, config: &Config) -> Self {
        Self::new(
            platform,
            config.categories.clone(),
            DeskSettings::from_config(config),
        )
    }

    pub fn categories(&self) -> &CategoryRegistry {
        &self.categories
    }

    async fn process(
        &self,
        responder: &dyn Responder,
        state: TicketState,
        event: Event,
    ) -> TicketState {
        drive(&self.ctx, Some(responder), state, event).await
    }

    /// Answers outside the state machine (lookup failures, bad input).
    async fn reply(&self, responder: &dyn Responder, reply: Reply) {
        execute_effects(&self.ctx, Some(responder), vec![Effect::Reply(reply)]).await;
    }

    async fn defer(&self, responder: &dyn Responder) {
        execute_effects(&self.ctx, Some(responder), vec![Effect::Defer]).await;
    }

    /// `ticket create`: an unknown or missing key falls back to the default
    /// category.
    pub async fn create_from_command(
        &self,
        responder: &dyn Responder,
        owner: UserRef,
        category_key: Option<&str>,
        subject: Option<String>,
    ) -> TicketState {
        let category = self.categories.resolve_or_default(category_key);
        self.create(responder, owner, category, subject).await
    }

    /// A pick from the panel's select menu.
    pub async fn create_from_selection(
        &self,
        responder: &dyn Responder,
        owner: UserRef,
        category_key: &str,
    ) -> TicketState {
        match self.categories.get(category_key) {
            Some(category) => self.create(responder, owner, category, None).await,
            None => {
                warn!("Panel selection for unknown category '{}'", category_key);
                self.reply(responder, Reply::UnknownCategory).await;
                TicketState::Absent
            }
        }
    }

    pub async fn create(
        &self,
        responder: &dyn Responder,
        owner: UserRef,
        category: &Category,
        subject: Option<String>,
    ) -> TicketState {
        // The guard and provisioning can outlast the interaction deadline.
        self.defer(responder).await;

        let key = TicketKey::new(owner.id, category);
        let _guard = self.locks.lock(&key).await;

        let state = match self.find_open(&key, category).await {
            Ok(Some(record)) => self.state_of(record),
            Ok(None) => TicketState::Absent,
            Err(e) => {
                error!(
                    "Failed to look up open tickets of {} in {}: {}",
                    owner.id, category.key, e
                );
                self.reply(responder, Reply::CreateFailed).await;
                return TicketState::Absent;
            }
        };

        let parent = match state {
            TicketState::Absent => match self.resolve_parent(category).await {
                Some(parent) => parent,
                None => {
                    self.reply(
                        responder,
                        Reply::GroupingUnavailable {
                            label: category.label.clone(),
                        },
                    )
                    .await;
                    return TicketState::Absent;
                }
            },
            _ => category.grouping,
        };

        let request = CreateRequest {
            owner,
            category: category.clone(),
            parent,
            subject,
            mention_role: self.settings.staff_role,
        };
        self.process(responder, state, Event::CreateRequested { request })
            .await
    }

    pub async fn close(
        &self,
        responder: &dyn Responder,
        channel: ChannelId,
        user: UserRef,
        standing: MemberStanding,
        trigger: CloseTrigger,
    ) -> TicketState {
        let event = |actor| Event::CloseRequested {
            actor,
            trigger,
            delay_secs: self.settings.close_delay_secs,
        };

        let record = match self.load_ticket(channel).await {
            Ok(record) => record,
            Err(e) => {
                error!("Failed to load channel {} for close: {}", channel, e);
                self.reply(responder, Reply::CloseFailed).await;
                return TicketState::Absent;
            }
        };
        let Some(record) = record else {
            let actor = self.actor(user, &standing, None);
            return self
                .process(responder, TicketState::Absent, event(actor))
                .await;
        };

        let _guard = self.locks.lock(&record.key).await;
        let actor = self.actor(user, &standing, Some(&record.key.category_key));
        let state = self.state_of(record);
        self.process(responder, state, event(actor)).await
    }

    pub async fn add_member(
        &self,
        responder: &dyn Responder,
        channel: ChannelId,
        user: UserRef,
        standing: MemberStanding,
        target: UserId,
    ) -> TicketState {
        let record = match self.load_ticket(channel).await {
            Ok(record) => record,
            Err(e) => {
                error!("Failed to load channel {} for add: {}", channel, e);
                self.reply(responder, Reply::AddFailed).await;
                return TicketState::Absent;
            }
        };
        let Some(record) = record else {
            let actor = self.actor(user, &standing, None);
            let event = Event::AddMemberRequested {
                actor,
                user: target,
            };
            return self.process(responder, TicketState::Absent, event).await;
        };

        let _guard = self.locks.lock(&record.key).await;
        let actor = self.actor(user, &standing, Some(&record.key.category_key));
        let state = self.state_of(record);
        let event = Event::AddMemberRequested {
            actor,
            user: target,
        };
        self.process(responder, state, event).await
    }

    /// Posts the category panel into `target`, which must be a text channel.
    pub async fn send_panel(&self, responder: &dyn Responder, target: ChannelId) {
        self.defer(responder).await;
        let reply = match self.post_panel(target).await {
            Ok(()) => {
                info!("Posted ticket panel in {}", target);
                Reply::PanelSent { channel: target }
            }
            Err(PanelError::NotText) => Reply::PanelChannelInvalid,
            Err(PanelError::Platform(e)) => {
                error!("Failed to post ticket panel in {}: {}", target, e);
                Reply::PanelFailed
            }
        };
        self.reply(responder, reply).await;
    }

    async fn post_panel(&self, target: ChannelId) -> Result<(), PanelError> {
        let channel = match self.ctx.platform.get_channel(target).await {
            Ok(channel) => channel,
            Err(PlatformError::NotFound) => return Err(PanelError::NotText),
            Err(e) => return Err(PanelError::Platform(e)),
        };
        if channel.kind != ChannelKind::Text {
            return Err(PanelError::NotText);
        }
        let guild_name = self.ctx.platform.guild_name().await?;
        let panel = Panel::new(guild_name, &self.categories);
        self.ctx.platform.post_panel(target, &panel).await?;
        Ok(())
    }

    /// A channel was deleted on the platform, by us or by someone else.
    pub async fn channel_deleted(&self, channel: ChannelId) {
        let cancelled = self.ctx.scheduler.cancel(channel);
        let forgotten = self.ctx.index.forget_channel(channel).await;
        if cancelled || forgotten.is_some() {
            info!(
                "Channel {} deleted (pending deletion cancelled: {}, ticket: {:?})",
                channel, cancelled, forgotten
            );
        }
    }

    pub async fn status(&self) -> StatusData {
        StatusData {
            version: crate::get_bot_version(),
            open_tickets_indexed: self.ctx.index.len().await,
            categories: self.categories.iter().map(|c| c.key.clone()).collect(),
            pending_deletions: self
                .ctx
                .scheduler
                .snapshot()
                .into_iter()
                .map(Into::into)
                .collect(),
        }
    }

    fn actor(&self, user: UserRef, standing: &MemberStanding, category_key: Option<&str>) -> Actor {
        let mut staff_roles = vec![self.settings.staff_role];
        if let Some(category) = category_key.and_then(|key| self.categories.get(key)) {
            staff_roles.push(category.staff_role);
        }
        Actor {
            is_staff: has_staff_capability(standing, &staff_roles),
            user,
        }
    }

    fn state_of(&self, record: TicketRecord) -> TicketState {
        match self.ctx.scheduler.pending_trigger(record.channel) {
            Some(trigger) => TicketState::Closing {
                ticket: record,
                trigger,
            },
            None => TicketState::Open(record),
        }
    }

    /// The ticket record of `channel`, or `None` if it is not a ticket.
    async fn load_ticket(&self, channel: ChannelId) -> Result<Option<TicketRecord>, PlatformError> {
        let snapshot = match self.ctx.platform.get_channel(channel).await {
            Ok(snapshot) => snapshot,
            Err(PlatformError::NotFound) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(TicketChannel::recognise(&snapshot)
            .map(|ticket| TicketRecord::from_channel(&ticket, &self.categories)))
    }

    /// Looks for an open ticket for `key`: the index first, then a full scan.
    async fn find_open(
        &self,
        key: &TicketKey,
        category: &Category,
    ) -> Result<Option<TicketRecord>, PlatformError> {
        if let Some(channel) = self.ctx.index.get(key).await {
            match self.ctx.platform.get_channel(channel).await {
                Ok(snapshot) => {
                    let ticket = TicketChannel::recognise(&snapshot)
                        .filter(|t| t.is_open_ticket_of(key.owner, category));
                    if let Some(ticket) = ticket {
                        return Ok(Some(TicketRecord::from_channel(&ticket, &self.categories)));
                    }
                }
                Err(PlatformError::NotFound) => {}
                Err(e) => return Err(e),
            }
            debug!("Dropping stale index entry {:?} -> {}", key, channel);
            self.ctx.index.forget(key, channel).await;
        }

        let channels = self.ctx.platform.list_channels().await?;
        let found = find_open_ticket(&channels, key.owner, category)
            .map(|ticket| TicketRecord::from_channel(&ticket, &self.categories));
        if let Some(record) = &found {
            self.ctx.index.remember(key.clone(), record.channel).await;
        }
        Ok(found)
    }

    /// The category's own grouping if it is a channel category, else the
    /// shared fallback.
    async fn resolve_parent(&self, category: &Category) -> Option<ChannelId> {
        let candidates =
            std::iter::once(category.grouping).chain(self.settings.fallback_grouping);
        for candidate in candidates {
            match self.ctx.platform.get_channel(candidate).await {
                Ok(channel) if channel.kind == ChannelKind::Category => return Some(candidate),
                Ok(_) => warn!("Channel {} is not a channel category", candidate),
                Err(e) => warn!("Grouping {} is unavailable: {}", candidate, e),
            }
        }
        None
    }
}

enum PanelError {
    NotText,
    Platform(PlatformError),
}

impl From<PlatformError> for PanelError {
    fn from(e: PlatformError) -> Self {
        PanelError::Platform(e)
    }
}
