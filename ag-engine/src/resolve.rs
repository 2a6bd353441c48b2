//! Decision resolution.
//!
//! Turns a classified event plus its context into a concrete decision and
//! the identifiers the processor forwards. The tapped action id is
//! authoritative when the context knows it; the display label is the first
//! fallback, the raw tapped id the last.

use crate::action::{ActionId, Decision};
use crate::classify::ClassifiedEvent;
use crate::context::ButtonContext;
use ag_channels::{MessageId, RequestId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionSource {
    Button,
    Manual,
}

impl DecisionSource {
    pub fn as_str(self) -> &'static str {
        match self {
            DecisionSource::Button => "button",
            DecisionSource::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedDecision {
    pub decision: Decision,
    /// The action behind the decision; for typed decisions this is
    /// synthesized (`manual:…`) purely so downstream logging is uniform.
    pub action: ActionId,
    pub request_id: Option<RequestId>,
    pub context: ButtonContext,
    pub origin_message_id: Option<MessageId>,
    pub source: DecisionSource,
}

/// Resolve a classified decision event. `None` for informational variants
/// (those never resolve) and for taps whose action cannot be mapped.
pub fn resolve_decision(classified: ClassifiedEvent) -> Option<ResolvedDecision> {
    match classified {
        ClassifiedEvent::ButtonTap {
            context,
            origin_message_id,
            selected_id,
            label_text,
        } => resolve_button(context, origin_message_id, selected_id, label_text),
        ClassifiedEvent::Manual {
            context,
            origin_message_id,
            decision,
        } => Some(resolve_manual(context, origin_message_id, decision)),
        ClassifiedEvent::Help | ClassifiedEvent::ShowLeaves(_) => None,
    }
}

fn resolve_button(
    context: ButtonContext,
    origin_message_id: Option<MessageId>,
    selected_id: Option<String>,
    label_text: Option<String>,
) -> Option<ResolvedDecision> {
    let direct = selected_id.as_deref().and_then(ActionId::parse);

    let action = match direct {
        Some(action) if context.actions_by_id.contains_key(&action) => Some(action),
        direct => label_text
            .as_deref()
            .and_then(|label| context.actions_by_label.get(label).cloned())
            .flatten()
            .or(direct),
    };
    let Some(action) = action else {
        tracing::warn!(
            selected_id = selected_id.as_deref().unwrap_or(""),
            label = label_text.as_deref().unwrap_or(""),
            "unable to determine action for button response"
        );
        return None;
    };

    let request_id = action.request_id.clone().or_else(|| context.request_id());
    Some(ResolvedDecision {
        decision: action.decision,
        action,
        request_id,
        context,
        origin_message_id,
        source: DecisionSource::Button,
    })
}

fn resolve_manual(
    context: ButtonContext,
    origin_message_id: Option<MessageId>,
    decision: Decision,
) -> ResolvedDecision {
    let request_id = context.request_id();
    ResolvedDecision {
        decision,
        action: ActionId::manual(decision, request_id.clone()),
        request_id,
        context,
        origin_message_id,
        source: DecisionSource::Manual,
    }
}
