//! Inbound event classification.
//!
//! Decides whether a chat event is a candidate decision event at all and,
//! if so, which stored context it refers to. Button taps and free text are
//! two distinct variants here; they converge on one resolver and one
//! processor downstream.

use crate::action::Decision;
use crate::context::{ButtonContext, ContextStore};
use crate::grammar::{Command, LeaveQuery, parse_command};
use crate::names::ApplicantNameExtractor;
use ag_channels::{ChatEvent, ChatId, EventKind, MessageId};

#[derive(Debug, Clone)]
pub enum ClassifiedEvent {
    /// A button tap that resolved to a known context.
    ButtonTap {
        context: ButtonContext,
        origin_message_id: Option<MessageId>,
        selected_id: Option<String>,
        label_text: Option<String>,
    },
    /// A typed approval/rejection that resolved to a known context.
    Manual {
        context: ButtonContext,
        origin_message_id: Option<MessageId>,
        decision: Decision,
    },
    /// Informational commands; no context needed.
    Help,
    ShowLeaves(LeaveQuery),
}

pub struct Classifier {
    notification_chat: ChatId,
    extractor: Box<dyn ApplicantNameExtractor>,
}

impl Classifier {
    pub fn new(notification_chat: ChatId, extractor: Box<dyn ApplicantNameExtractor>) -> Self {
        Self {
            notification_chat,
            extractor,
        }
    }

    /// Classify one inbound event. `None` means the event is not for this
    /// engine: wrong chat, our own message, not a command, or no context
    /// could be resolved (already logged here).
    pub fn classify(&self, event: &ChatEvent, store: &ContextStore) -> Option<ClassifiedEvent> {
        match &event.kind {
            EventKind::ButtonTap {
                selected_id,
                selected_label,
            } => self.classify_tap(event, store, selected_id.as_deref(), selected_label.as_deref()),
            EventKind::Text => self.classify_text(event, store),
        }
    }

    fn classify_tap(
        &self,
        event: &ChatEvent,
        store: &ContextStore,
        selected_id: Option<&str>,
        selected_label: Option<&str>,
    ) -> Option<ClassifiedEvent> {
        let (origin_message_id, context) = resolve_tap_context(event, store, selected_id);
        let Some(context) = context else {
            tracing::warn!(
                selected_id = selected_id.unwrap_or(""),
                selected_label = selected_label.unwrap_or(""),
                "no button context found for tap; dropping"
            );
            return None;
        };
        if event.chat_id != self.notification_chat {
            return None;
        }

        let label_text = selected_label
            .or(non_empty(&event.body))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Some(ClassifiedEvent::ButtonTap {
            context: (*context).clone(),
            origin_message_id,
            selected_id: selected_id.map(str::to_string),
            label_text,
        })
    }

    fn classify_text(&self, event: &ChatEvent, store: &ContextStore) -> Option<ClassifiedEvent> {
        if event.from_me {
            return None;
        }
        if event.chat_id != self.notification_chat {
            return None;
        }
        let command = parse_command(&event.body)?;
        let decision = match command {
            Command::Help => return Some(ClassifiedEvent::Help),
            Command::ShowLeaves(query) => return Some(ClassifiedEvent::ShowLeaves(query)),
            Command::Approve => Decision::Approve,
            Command::Reject => Decision::Reject,
        };

        let (origin_message_id, context) = resolve_text_context(event, store);
        let Some(context) = context else {
            tracing::warn!(chat_id = %event.chat_id, "typed decision without context; ignoring");
            return None;
        };
        let mut context = (*context).clone();

        // A reply to an announcement names the applicant only in the quoted
        // body; an extracted name overrides whatever the metadata carried.
        if let Some(quoted) = &event.quoted {
            if let Some(name) = self.extractor.extract(&quoted.body) {
                context.metadata.applicant_display_name = Some(name);
            }
        }

        Some(ClassifiedEvent::Manual {
            context,
            origin_message_id,
            decision,
        })
    }
}

fn resolve_tap_context(
    event: &ChatEvent,
    store: &ContextStore,
    selected_id: Option<&str>,
) -> (Option<MessageId>, Option<std::sync::Arc<ButtonContext>>) {
    let (origin_message_id, context) = resolve_quoted_context(event, store);
    if context.is_some() {
        return (origin_message_id, context);
    }
    // Fall back to the request id embedded in the tapped action.
    let mapped = selected_id
        .and_then(crate::action::ActionId::parse)
        .and_then(|action| action.request_id)
        .and_then(|request_id| store.message_id_for_request(&request_id));
    if let Some(message_id) = mapped {
        let context = store.get_by_message_id(&message_id);
        return (Some(message_id), context);
    }
    (origin_message_id, None)
}

fn resolve_text_context(
    event: &ChatEvent,
    store: &ContextStore,
) -> (Option<MessageId>, Option<std::sync::Arc<ButtonContext>>) {
    let (origin_message_id, context) = resolve_quoted_context(event, store);
    if context.is_some() {
        return (origin_message_id, context);
    }
    if let Some(latest) = store.latest_for_chat(&event.chat_id) {
        let origin = Some(latest.message_id.clone());
        return (origin, Some(latest));
    }
    (origin_message_id, None)
}

fn resolve_quoted_context(
    event: &ChatEvent,
    store: &ContextStore,
) -> (Option<MessageId>, Option<std::sync::Arc<ButtonContext>>) {
    match &event.quoted {
        Some(quoted) => {
            let context = store.get_by_message_id(&quoted.message_id);
            (Some(quoted.message_id.clone()), context)
        }
        None => (None, None),
    }
}

fn non_empty(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() { None } else { Some(text) }
}
