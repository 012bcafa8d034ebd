//! Effect interpreter that executes effects against the chat platform.
//!
//! The interpreter is the boundary between the pure state machine and the
//! platform. It takes effects (descriptions of what to do), executes them,
//! and returns the resulting events, which [`drive`] feeds back into the
//! state machine until none are left.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, info_span, warn, Instrument};

use ticketdesk_core::state_machine::{
    transition, AddTarget, CloseTrigger, Effect, Event, LogLevel, Operation, TicketRecord,
    TicketState, TransitionResult,
};

use crate::index::OpenTicketIndex;
use crate::platform::{PlatformError, Responder, TicketPlatform};
use crate::scheduler::{delete_with_retry, DeletionScheduler, RetryPolicy};

/// Context needed by the interpreter to execute effects.
#[derive(Clone)]
pub struct InterpreterContext {
    pub platform: Arc<dyn TicketPlatform>,
    pub index: Arc<OpenTicketIndex>,
    pub scheduler: Arc<DeletionScheduler>,
    pub retry: RetryPolicy,
}

/// Result of executing an effect.
#[derive(Debug)]
pub enum EffectResult {
    /// Effect completed, produced result events.
    Ok(Vec<Event>),
    /// Effect failed with an error.
    Err(String),
}

impl EffectResult {
    pub fn single(event: Event) -> Self {
        Self::Ok(vec![event])
    }

    pub fn none() -> Self {
        Self::Ok(vec![])
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self::Err(msg.into())
    }
}

/// Runs `event` and every event its effects produce through the state
/// machine, starting from `state`. Returns the final state.
///
/// `responder` is the interaction being answered, if any; background work
/// such as the deletion task has none.
pub async fn drive(
    ctx: &InterpreterContext,
    responder: Option<&dyn Responder>,
    state: TicketState,
    event: Event,
) -> TicketState {
    let mut current_state = state;

    // Event loop: process initial event and any result events from effects
    let mut events_to_process = vec![event];

    while let Some(event) = events_to_process.pop() {
        info!(
            "Processing event {} in state {}",
            event.log_summary(),
            current_state.name()
        );

        let TransitionResult { state, effects } = transition(current_state, event);
        current_state = state;

        if !effects.is_empty() {
            let result_events = execute_effects(ctx, responder, effects).await;

            // Reversed so they are popped in the order they were produced
            for result_event in result_events.into_iter().rev() {
                events_to_process.push(result_event);
            }
        }
    }

    info!("Final state: {}", current_state.name());
    current_state
}

/// Execute a list of effects and collect result events.
///
/// Effects are executed sequentially. If an effect fails, execution continues
/// with remaining effects, and the error is logged.
pub async fn execute_effects(
    ctx: &InterpreterContext,
    responder: Option<&dyn Responder>,
    effects: Vec<Effect>,
) -> Vec<Event> {
    let mut result_events = Vec::new();

    for effect in effects {
        match execute_effect(ctx, responder, effect).await {
            EffectResult::Ok(events) => result_events.extend(events),
            EffectResult::Err(err) => {
                error!("Effect execution failed: {}", err);
            }
        }
    }

    result_events
}

fn platform_failed(operation: Operation, error: PlatformError) -> EffectResult {
    EffectResult::single(Event::PlatformFailed {
        operation,
        error: error.to_string(),
    })
}

/// Execute a single effect.
async fn execute_effect(
    ctx: &InterpreterContext,
    responder: Option<&dyn Responder>,
    effect: Effect,
) -> EffectResult {
    match effect {
        Effect::CreateChannel { request } => match ctx.platform.create_channel(&request).await {
            Ok(channel) => {
                info!("Created ticket channel {} ({})", request.name, channel);
                EffectResult::single(Event::ChannelCreated { channel })
            }
            Err(e) => platform_failed(Operation::CreateChannel, e),
        },

        Effect::PostWelcome { channel, welcome } => {
            match ctx.platform.post_welcome(channel, &welcome).await {
                Ok(()) => EffectResult::single(Event::WelcomePosted),
                Err(e) => platform_failed(Operation::PostWelcome, e),
            }
        }

        Effect::PostNotice { channel, notice } => {
            match ctx.platform.post_notice(channel, &notice).await {
                Ok(()) => EffectResult::single(Event::NoticePosted { notice }),
                Err(e) => platform_failed(Operation::PostNotice, e),
            }
        }

        Effect::ResolveMember { channel, user, by } => {
            match ctx.platform.member_can_view(channel, user).await {
                Ok(can_view) => EffectResult::single(Event::MemberResolved {
                    target: AddTarget::Member { user, can_view },
                    by,
                }),
                Err(PlatformError::NotFound) => EffectResult::single(Event::MemberResolved {
                    target: AddTarget::NotAMember,
                    by,
                }),
                Err(e) => platform_failed(Operation::ResolveMember, e),
            }
        }

        Effect::GrantAccess {
            channel,
            overwrite,
            user,
            by,
        } => match ctx.platform.grant_access(channel, &overwrite).await {
            Ok(()) => EffectResult::single(Event::AccessGranted { user, by }),
            Err(e) => platform_failed(Operation::GrantAccess, e),
        },

        Effect::ScheduleDeletion {
            ticket,
            delay_secs,
            trigger,
        } => {
            schedule_deletion(ctx, ticket, Duration::from_secs(delay_secs), trigger);
            EffectResult::none()
        }

        Effect::Defer => {
            let Some(responder) = responder else {
                return EffectResult::err("Defer requested without an interaction");
            };
            match responder.defer().await {
                Ok(()) => EffectResult::none(),
                Err(e) => EffectResult::err(format!("Failed to defer interaction: {}", e)),
            }
        }

        Effect::Reply(reply) => {
            let Some(responder) = responder else {
                return EffectResult::err(format!(
                    "No interaction to deliver reply to: {:?}",
                    reply
                ));
            };
            match responder.reply(&reply).await {
                Ok(()) => EffectResult::none(),
                Err(e) => EffectResult::err(format!("Failed to send reply {:?}: {}", reply, e)),
            }
        }

        Effect::RememberTicket { key, channel } => {
            ctx.index.remember(key, channel).await;
            EffectResult::none()
        }

        Effect::ForgetTicket { key, channel } => {
            ctx.index.forget(&key, channel).await;
            EffectResult::none()
        }

        Effect::Log { level, message } => {
            match level {
                LogLevel::Debug => tracing::debug!("{}", message),
                LogLevel::Info => info!("{}", message),
                LogLevel::Warn => warn!("{}", message),
                LogLevel::Error => error!("{}", message),
            }
            EffectResult::none()
        }
    }
}

/// Hands the deletion to the scheduler. The task reports its outcome back
/// through the state machine without an interaction to answer.
fn schedule_deletion(
    ctx: &InterpreterContext,
    ticket: TicketRecord,
    delay: Duration,
    trigger: CloseTrigger,
) {
    let channel = ticket.channel;
    let task_ctx = ctx.clone();
    let span = info_span!("deletion", channel = %channel);

    let task = async move {
        let outcome = delete_with_retry(
            task_ctx.platform.as_ref(),
            channel,
            trigger.deletion_reason(),
            task_ctx.retry,
        )
        .await;

        let event = match outcome {
            Ok(()) => Event::DeletionCompleted,
            Err(e) => Event::DeletionFailed {
                error: e.to_string(),
            },
        };
        drive(&task_ctx, None, TicketState::Closing { ticket, trigger }, event).await;
    }
    .instrument(span);

    info!("Deleting channel {} in {:?}", channel, delay);
    ctx.scheduler.schedule(channel, trigger, delay, task);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakePlatform, FakeResponder};
    use ticketdesk_core::state_machine::Event;
    use ticketdesk_core::{Reply, UserId};

    fn context(platform: Arc<FakePlatform>) -> InterpreterContext {
        InterpreterContext {
            platform,
            index: Arc::new(OpenTicketIndex::new()),
            scheduler: Arc::new(DeletionScheduler::new()),
            retry: RetryPolicy::default(),
        }
    }

    #[tokio::test]
    async fn test_unknown_member_resolves_to_not_a_member() {
        let platform = Arc::new(FakePlatform::new());
        let channel = platform.add_text_channel("ticket-general-alice-42", None);
        let ctx = context(platform);

        let events = execute_effects(
            &ctx,
            None,
            vec![Effect::ResolveMember {
                channel,
                user: UserId(999),
                by: UserId(1),
            }],
        )
        .await;

        assert_eq!(
            events,
            vec![Event::MemberResolved {
                target: AddTarget::NotAMember,
                by: UserId(1),
            }]
        );
    }

    #[tokio::test]
    async fn test_reply_without_responder_is_not_fatal() {
        let ctx = context(Arc::new(FakePlatform::new()));
        let events = execute_effects(
            &ctx,
            None,
            vec![
                Effect::Reply(Reply::NotATicket),
                Effect::log(LogLevel::Info, "still running"),
            ],
        )
        .await;
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_failed_reply_is_logged_and_skipped() {
        let ctx = context(Arc::new(FakePlatform::new()));
        let responder = FakeResponder::failing();

        let events = execute_effects(
            &ctx,
            Some(&responder),
            vec![Effect::Reply(Reply::NotATicket), Effect::Reply(Reply::AddDenied)],
        )
        .await;

        assert!(events.is_empty());
        assert_eq!(responder.attempts(), 2);
    }

    #[tokio::test]
    async fn test_failed_create_becomes_platform_failed() {
        let platform = Arc::new(FakePlatform::new());
        platform.fail_creates();
        let ctx = context(platform);

        let request = ticketdesk_core::state_machine::ChannelRequest {
            name: "ticket-general-alice-42".to_string(),
            topic: "t".to_string(),
            parent: ticketdesk_core::ChannelId(1),
            overwrites: vec![],
        };
        let events = execute_effects(&ctx, None, vec![Effect::CreateChannel { request }]).await;

        assert!(matches!(
            events.as_slice(),
            [Event::PlatformFailed {
                operation: Operation::CreateChannel,
                ..
            }]
        ));
    }
}
