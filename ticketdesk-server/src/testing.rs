//! In-memory platform and responder for lifecycle tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use ticketdesk_core::access::{Capability, Overwrite, OverwriteTarget};
use ticketdesk_core::state_machine::ChannelRequest;
use ticketdesk_core::category::DEFAULT_CATEGORY_KEY;
use ticketdesk_core::{
    CategoryRegistry, ChannelId, ChannelKind, ChannelSnapshot, Notice, Panel, Reply, RoleId,
    UserId, Welcome, BUILTIN_CATEGORIES,
};

use crate::platform::{PlatformError, Responder, TicketPlatform};

/// Global staff role used by desk tests.
pub const STAFF_ROLE: RoleId = RoleId(7);

/// The built-in categories with groupings `1000 + i` and staff roles `2000 + i`.
pub fn registry() -> CategoryRegistry {
    let categories = BUILTIN_CATEGORIES
        .iter()
        .enumerate()
        .map(|(i, template)| {
            template.build(ChannelId(1000 + i as u64), RoleId(2000 + i as u64))
        })
        .collect();
    CategoryRegistry::new(categories, DEFAULT_CATEGORY_KEY).unwrap()
}

#[derive(Default)]
struct FakeGuild {
    channels: BTreeMap<ChannelId, ChannelSnapshot>,
    overwrites: HashMap<ChannelId, Vec<Overwrite>>,
    members: HashSet<UserId>,
    next_id: u64,
    welcomes: Vec<(ChannelId, Welcome)>,
    notices: Vec<(ChannelId, Notice)>,
    panels: Vec<(ChannelId, Panel)>,
    grant_calls: usize,
    delete_calls: usize,
    failing_deletes: u32,
    fail_creates: bool,
    fail_notices: bool,
}

pub struct FakePlatform {
    guild: Mutex<FakeGuild>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self {
            guild: Mutex::new(FakeGuild {
                next_id: 10_000,
                ..FakeGuild::default()
            }),
        }
    }

    fn guild(&self) -> std::sync::MutexGuard<'_, FakeGuild> {
        self.guild.lock().unwrap()
    }

    pub fn insert_channel(&self, snapshot: ChannelSnapshot) {
        self.guild().channels.insert(snapshot.id, snapshot);
    }

    pub fn add_text_channel(&self, name: &str, topic: Option<&str>) -> ChannelId {
        let mut guild = self.guild();
        guild.next_id += 1;
        let id = ChannelId(guild.next_id);
        guild.channels.insert(
            id,
            ChannelSnapshot {
                id,
                name: name.to_string(),
                kind: ChannelKind::Text,
                topic: topic.map(str::to_string),
                parent: None,
            },
        );
        id
    }

    /// Adds a channel category with a fixed id.
    pub fn add_grouping(&self, id: ChannelId) {
        self.insert_channel(ChannelSnapshot {
            id,
            name: format!("grouping-{}", id),
            kind: ChannelKind::Category,
            topic: None,
            parent: None,
        });
    }

    pub fn add_member(&self, user: UserId) {
        self.guild().members.insert(user);
    }

    pub fn fail_next_deletes(&self, count: u32) {
        self.guild().failing_deletes = count;
    }

    pub fn fail_creates(&self) {
        self.guild().fail_creates = true;
    }

    pub fn fail_notices(&self) {
        self.guild().fail_notices = true;
    }

    pub fn channel(&self, id: ChannelId) -> Option<ChannelSnapshot> {
        self.guild().channels.get(&id).cloned()
    }

    pub fn has_channel(&self, id: ChannelId) -> bool {
        self.guild().channels.contains_key(&id)
    }

    /// Channels whose name starts with `ticket-`.
    pub fn ticket_channels(&self) -> Vec<ChannelSnapshot> {
        self.guild()
            .channels
            .values()
            .filter(|c| c.name.starts_with("ticket-"))
            .cloned()
            .collect()
    }

    pub fn overwrites(&self, id: ChannelId) -> Vec<Overwrite> {
        self.guild().overwrites.get(&id).cloned().unwrap_or_default()
    }

    pub fn welcomes(&self) -> Vec<(ChannelId, Welcome)> {
        self.guild().welcomes.clone()
    }

    pub fn notices(&self) -> Vec<(ChannelId, Notice)> {
        self.guild().notices.clone()
    }

    pub fn panels(&self) -> Vec<(ChannelId, Panel)> {
        self.guild().panels.clone()
    }

    pub fn grant_calls(&self) -> usize {
        self.guild().grant_calls
    }

    pub fn delete_calls(&self) -> usize {
        self.guild().delete_calls
    }
}

fn allows_view(overwrite: &Overwrite, user: UserId) -> bool {
    overwrite.target == OverwriteTarget::Member(user)
        && overwrite.allow.contains(&Capability::ViewChannel)
}

#[async_trait]
impl TicketPlatform for FakePlatform {
    async fn guild_name(&self) -> Result<String, PlatformError> {
        Ok("Division RP".to_string())
    }

    async fn list_channels(&self) -> Result<Vec<ChannelSnapshot>, PlatformError> {
        Ok(self.guild().channels.values().cloned().collect())
    }

    async fn get_channel(&self, channel: ChannelId) -> Result<ChannelSnapshot, PlatformError> {
        self.channel(channel).ok_or(PlatformError::NotFound)
    }

    async fn create_channel(&self, request: &ChannelRequest) -> Result<ChannelId, PlatformError> {
        let mut guild = self.guild();
        if guild.fail_creates {
            return Err(PlatformError::Api("missing permissions".to_string()));
        }
        guild.next_id += 1;
        let id = ChannelId(guild.next_id);
        guild.channels.insert(
            id,
            ChannelSnapshot {
                id,
                name: request.name.clone(),
                kind: ChannelKind::Text,
                topic: Some(request.topic.clone()),
                parent: Some(request.parent),
            },
        );
        guild.overwrites.insert(id, request.overwrites.clone());
        Ok(id)
    }

    async fn post_welcome(
        &self,
        channel: ChannelId,
        welcome: &Welcome,
    ) -> Result<(), PlatformError> {
        let mut guild = self.guild();
        if !guild.channels.contains_key(&channel) {
            return Err(PlatformError::NotFound);
        }
        guild.welcomes.push((channel, welcome.clone()));
        Ok(())
    }

    async fn post_notice(&self, channel: ChannelId, notice: &Notice) -> Result<(), PlatformError> {
        let mut guild = self.guild();
        if guild.fail_notices {
            return Err(PlatformError::Api("cannot send messages".to_string()));
        }
        if !guild.channels.contains_key(&channel) {
            return Err(PlatformError::NotFound);
        }
        guild.notices.push((channel, notice.clone()));
        Ok(())
    }

    async fn post_panel(&self, channel: ChannelId, panel: &Panel) -> Result<(), PlatformError> {
        let mut guild = self.guild();
        if !guild.channels.contains_key(&channel) {
            return Err(PlatformError::NotFound);
        }
        guild.panels.push((channel, panel.clone()));
        Ok(())
    }

    async fn member_can_view(
        &self,
        channel: ChannelId,
        user: UserId,
    ) -> Result<bool, PlatformError> {
        let guild = self.guild();
        if !guild.members.contains(&user) {
            return Err(PlatformError::NotFound);
        }
        Ok(guild
            .overwrites
            .get(&channel)
            .is_some_and(|overwrites| overwrites.iter().any(|o| allows_view(o, user))))
    }

    async fn grant_access(
        &self,
        channel: ChannelId,
        overwrite: &Overwrite,
    ) -> Result<(), PlatformError> {
        let mut guild = self.guild();
        guild.grant_calls += 1;
        if !guild.channels.contains_key(&channel) {
            return Err(PlatformError::NotFound);
        }
        guild
            .overwrites
            .entry(channel)
            .or_default()
            .push(overwrite.clone());
        Ok(())
    }

    async fn delete_channel(&self, channel: ChannelId, _reason: &str) -> Result<(), PlatformError> {
        let mut guild = self.guild();
        guild.delete_calls += 1;
        if guild.failing_deletes > 0 {
            guild.failing_deletes -= 1;
            return Err(PlatformError::Api("service unavailable".to_string()));
        }
        match guild.channels.remove(&channel) {
            Some(_) => {
                guild.overwrites.remove(&channel);
                Ok(())
            }
            None => Err(PlatformError::NotFound),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponderCall {
    Defer,
    Reply(Reply),
}

/// Records what an interaction was answered with.
#[derive(Default)]
pub struct FakeResponder {
    calls: Mutex<Vec<ResponderCall>>,
    failing: bool,
}

impl FakeResponder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<ResponderCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn replies(&self) -> Vec<Reply> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ResponderCall::Reply(reply) => Some(reply),
                ResponderCall::Defer => None,
            })
            .collect()
    }
}

#[async_trait]
impl Responder for FakeResponder {
    async fn defer(&self) -> Result<(), PlatformError> {
        self.calls.lock().unwrap().push(ResponderCall::Defer);
        if self.failing {
            return Err(PlatformError::Api("interaction expired".to_string()));
        }
        Ok(())
    }

    async fn reply(&self, reply: &Reply) -> Result<(), PlatformError> {
        self.calls.lock().unwrap().push(ResponderCall::Reply(reply.clone()));
        if self.failing {
            return Err(PlatformError::Api("interaction expired".to_string()));
        }
        Ok(())
    }
}
