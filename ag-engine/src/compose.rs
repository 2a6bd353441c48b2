//! Outbound request composition.
//!
//! Turns a caller-supplied specification (body, choices, metadata) into the
//! render payload the transport sends plus the action maps the context will
//! carry. Composition never registers anything in the store: the message id
//! is only known after the transport confirms the send, so the caller does
//! the registration.

use crate::action::{ActionId, infer_action_from_label};
use crate::context::ButtonContext;
use crate::metadata::RequestMetadata;
use ag_channels::{ChatId, InteractiveButton, InteractiveMessage, MessageId};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ComposeError {
    #[error("request body is empty")]
    EmptyBody,
    #[error("no usable choices after reconciling actions")]
    NoChoices,
}

/// One requested choice: a display label plus an optional explicit wire
/// action id.
#[derive(Debug, Clone, Default)]
pub struct ChoiceSpec {
    pub label: String,
    pub action_id: Option<String>,
}

/// Composition output: the payload to send and the maps to register once the
/// transport reports the message id.
#[derive(Debug, Clone)]
pub struct ComposedRequest {
    pub message: InteractiveMessage,
    pub actions_by_id: HashMap<ActionId, String>,
    pub actions_by_label: HashMap<String, Option<ActionId>>,
    pub metadata: RequestMetadata,
}

impl ComposedRequest {
    /// Bind the composition to the sent message, producing the context the
    /// caller registers in the store.
    pub fn into_context(self, chat_id: ChatId, message_id: MessageId) -> ButtonContext {
        ButtonContext {
            actions_by_id: self.actions_by_id,
            actions_by_label: self.actions_by_label,
            metadata: self.metadata,
            chat_id,
            message_id,
            created_at: chrono::Utc::now(),
        }
    }
}

pub fn compose_request(
    body: &str,
    choices: &[ChoiceSpec],
    title: Option<&str>,
    footer: Option<&str>,
    metadata: RequestMetadata,
) -> Result<ComposedRequest, ComposeError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(ComposeError::EmptyBody);
    }

    let mut label_actions = parse_label_actions(&metadata);

    let mut resolved: Vec<(String, Option<String>)> = Vec::new();
    for choice in choices {
        let label = choice.label.trim();
        if label.is_empty() {
            continue;
        }
        let explicit = choice
            .action_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let action = explicit.or_else(|| label_actions.get(label).cloned());
        resolved.push((label.to_string(), action));
    }

    // No explicit choice list: fall back to the metadata label→action map.
    if resolved.is_empty() && !label_actions.is_empty() {
        let mut entries: Vec<(String, String)> = label_actions.drain().collect();
        entries.sort();
        for (label, action) in entries {
            let label = label.trim().to_string();
            if label.is_empty() {
                continue;
            }
            let action = Some(action.trim().to_string()).filter(|s| !s.is_empty());
            resolved.push((label, action));
        }
    }

    if resolved.is_empty() {
        return Err(ComposeError::NoChoices);
    }

    let mut buttons = Vec::with_capacity(resolved.len());
    let mut actions_by_id = HashMap::new();
    let mut actions_by_label = HashMap::new();

    for (label, explicit) in resolved {
        match reconcile_action(explicit.as_deref(), &label) {
            ReconciledAction::Decision(action) => {
                buttons.push(InteractiveButton {
                    id: action.to_string(),
                    label: label.clone(),
                });
                actions_by_id.insert(action.clone(), label.clone());
                actions_by_label.insert(label, Some(action));
            }
            ReconciledAction::Opaque(id) => {
                buttons.push(InteractiveButton {
                    id,
                    label: label.clone(),
                });
                actions_by_label.insert(label, None);
            }
        }
    }

    Ok(ComposedRequest {
        message: InteractiveMessage {
            body: body.to_string(),
            buttons,
            title: trimmed_opt(title),
            footer: trimmed_opt(footer),
            mentions: Vec::new(),
        },
        actions_by_id,
        actions_by_label,
        metadata,
    })
}

enum ReconciledAction {
    Decision(ActionId),
    /// The button is clickable but carries no resolvable decision.
    Opaque(String),
}

fn reconcile_action(explicit: Option<&str>, label: &str) -> ReconciledAction {
    if let Some(raw) = explicit {
        match ActionId::parse(raw) {
            Some(action) => return ReconciledAction::Decision(action),
            // An explicit id without a recognizable decision still keys the
            // button on the wire; it just never resolves.
            None => return ReconciledAction::Opaque(raw.to_string()),
        }
    }
    match infer_action_from_label(label) {
        Some(action) => ReconciledAction::Decision(action),
        None => ReconciledAction::Opaque(opaque_button_id()),
    }
}

fn opaque_button_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Pull the optional label→action JSON map out of the metadata. Malformed
/// JSON is discarded with a warning; composition continues without it.
fn parse_label_actions(metadata: &RequestMetadata) -> HashMap<String, String> {
    let Some(raw) = metadata.button_actions_json.as_deref() else {
        return HashMap::new();
    };
    match serde_json::from_str::<HashMap<String, String>>(raw) {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!(%e, "failed to parse button_actions_json; ignoring");
            HashMap::new()
        }
    }
}

fn trimmed_opt(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::{ChoiceSpec, ComposeError, compose_request};
    use crate::action::Decision;
    use crate::metadata::RequestMetadata;
    use ag_channels::{ChatId, MessageId};

    fn choice(label: &str) -> ChoiceSpec {
        ChoiceSpec {
            label: label.to_string(),
            action_id: None,
        }
    }

    #[test]
    fn empty_body_is_rejected() {
        let err = compose_request("   ", &[choice("Approve")], None, None, RequestMetadata::default())
            .expect_err("should reject");
        assert_eq!(err, ComposeError::EmptyBody);
    }

    #[test]
    fn no_usable_choices_is_rejected() {
        let err = compose_request(
            "Leave request",
            &[choice("  ")],
            None,
            None,
            RequestMetadata::default(),
        )
        .expect_err("should reject");
        assert_eq!(err, ComposeError::NoChoices);
    }

    #[test]
    fn decision_labels_get_auto_actions() {
        let composed = compose_request(
            "New leave request",
            &[choice("Approve"), choice("Reject")],
            Some("Leave"),
            None,
            RequestMetadata::default(),
        )
        .expect("should compose");

        for label in ["Approve", "Reject"] {
            let action = composed.actions_by_label[label]
                .as_ref()
                .expect("label should carry an action");
            assert!(action.to_string().starts_with("auto:"));
            assert_eq!(composed.actions_by_id[action], label);
        }
        assert_eq!(
            composed.actions_by_label["Approve"].as_ref().unwrap().decision,
            Decision::Approve
        );
        assert_eq!(composed.message.buttons.len(), 2);
        assert_eq!(composed.message.title.as_deref(), Some("Leave"));
    }

    #[test]
    fn explicit_ids_override_inference() {
        let composed = compose_request(
            "body",
            &[ChoiceSpec {
                label: "Approve".to_string(),
                action_id: Some("auto:approve:REQ-7".to_string()),
            }],
            None,
            None,
            RequestMetadata::default(),
        )
        .expect("should compose");
        let action = composed.actions_by_label["Approve"].as_ref().unwrap();
        assert_eq!(action.request_id.as_deref(), Some("REQ-7"));
    }

    #[test]
    fn neutral_labels_stay_clickable_but_actionless() {
        let composed = compose_request(
            "body",
            &[choice("More info")],
            None,
            None,
            RequestMetadata::default(),
        )
        .expect("should compose");
        assert_eq!(composed.actions_by_label["More info"], None);
        assert!(composed.actions_by_id.is_empty());
        assert!(
            !composed.message.buttons[0].id.is_empty(),
            "opaque id keeps the button clickable"
        );
    }

    #[test]
    fn metadata_action_map_supplies_choices_when_list_is_empty() {
        let metadata = RequestMetadata::from_value(serde_json::json!({
            "button_actions_json": r#"{"Ya":"auto:approve:REQ-3","Tidak":"auto:reject:REQ-3"}"#,
        }));
        let composed =
            compose_request("body", &[], None, None, metadata).expect("should compose");
        assert_eq!(composed.message.buttons.len(), 2);
        assert!(composed.actions_by_label["Ya"].is_some());
        assert!(composed.actions_by_label["Tidak"].is_some());
    }

    #[test]
    fn malformed_action_map_is_discarded_not_fatal() {
        let metadata = RequestMetadata::from_value(serde_json::json!({
            "button_actions_json": "{not json",
        }));
        let composed = compose_request("body", &[choice("Approve")], None, None, metadata)
            .expect("should compose despite bad map");
        assert!(composed.actions_by_label["Approve"].is_some());
    }

    #[test]
    fn into_context_binds_chat_and_message_identity() {
        let composed = compose_request(
            "body",
            &[choice("Approve")],
            None,
            None,
            RequestMetadata::from_value(serde_json::json!({"request_id": "REQ-5"})),
        )
        .expect("should compose");
        let context = composed.into_context(ChatId::new("chat-a"), MessageId::new("M1"));
        assert_eq!(context.chat_id.as_str(), "chat-a");
        assert_eq!(context.message_id.as_str(), "M1");
        assert_eq!(context.request_id().as_deref(), Some("REQ-5"));
    }
}
