//! Backend decision forwarding.
//!
//! One-shot JSON POST per decision, at most once: there is no retry, no
//! queue, and no delivery guarantee. Callers must not assume the backend
//! received anything; if the backend needs exactly-once semantics it has to
//! deduplicate on `request_id` itself. The only response-driven branch is
//! the capacity-full follow-up message.

use crate::grammar::LeaveQuery;
use crate::messages;
use crate::metadata::{CAPACITY_FULL, RequestMetadata};
use ag_channels::{ChatId, ChatTransport, OutboundText};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Approver identity forwarded alongside a decision.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApproverInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default, rename = "pushName")]
    pub push_name: Option<String>,
    #[serde(default, rename = "shortName")]
    pub short_name: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DecisionEnvelope {
    pub action: String,
    #[serde(rename = "chatId")]
    pub chat_id: String,
    pub metadata: RequestMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(rename = "messageId", skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(rename = "originMessageId", skip_serializing_if = "Option::is_none")]
    pub origin_message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approver: Option<ApproverInfo>,
}

#[derive(Debug, Serialize)]
struct ShowLeavesEnvelope<'a> {
    action: &'static str,
    #[serde(rename = "chatId")]
    chat_id: &'a str,
    metadata: ShowLeavesMetadata<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    command: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ShowLeavesMetadata<'a> {
    request_type: &'static str,
    source: &'static str,
    leave_query: &'a LeaveQuery,
}

#[derive(Debug, Default, Deserialize)]
struct ForwardResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    rejection_reason: Option<String>,
}

impl ForwardResponse {
    fn wants_capacity_follow_up(&self) -> bool {
        self.rejection_reason.as_deref() == Some(CAPACITY_FULL)
    }
}

/// Seam between the processor and the outbound backend call, so processing
/// can be tested without a network.
#[async_trait]
pub trait DecisionForwarder: Send + Sync {
    /// Forward an approve/reject decision. Failures are logged, never
    /// surfaced: a lost notification must not block context retirement.
    async fn forward_decision(&self, envelope: DecisionEnvelope);

    /// Forward a show-leaves query with the parsed period and the literal
    /// command text.
    async fn forward_show_leaves(&self, chat_id: &ChatId, query: &LeaveQuery, command: &str);
}

pub struct HttpBackendForwarder {
    http: reqwest::Client,
    endpoint: Url,
    transport: Arc<dyn ChatTransport>,
}

impl HttpBackendForwarder {
    pub fn new(endpoint: &str, transport: Arc<dyn ChatTransport>) -> Result<Self> {
        let endpoint = Url::parse(endpoint.trim())
            .map_err(|e| anyhow!("invalid approval endpoint {endpoint:?}: {e}"))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            endpoint,
            transport,
        })
    }

    async fn post<T: Serialize>(&self, payload: &T) -> Result<ForwardResponse> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(payload)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("backend returned status={status} body={body}"));
        }
        // A success with an unparsable body still counts as delivered.
        Ok(response.json().await.unwrap_or_default())
    }
}

#[async_trait]
impl DecisionForwarder for HttpBackendForwarder {
    async fn forward_decision(&self, envelope: DecisionEnvelope) {
        let chat_id = ChatId::new(envelope.chat_id.clone());
        let parsed = match self.post(&envelope).await {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::error!(%e, action = %envelope.action, "failed to notify backend about decision");
                return;
            }
        };
        if !parsed.ok {
            tracing::warn!(action = %envelope.action, "backend acknowledged decision with ok=false");
        }
        if parsed.wants_capacity_follow_up() {
            let follow_up = messages::capacity_follow_up(&envelope.metadata);
            if let Err(e) = self
                .transport
                .send_text(&chat_id, OutboundText::plain(follow_up))
                .await
            {
                tracing::error!(%e, chat_id = %chat_id, "failed to send capacity explanation");
            }
        }
    }

    async fn forward_show_leaves(&self, chat_id: &ChatId, query: &LeaveQuery, command: &str) {
        let envelope = ShowLeavesEnvelope {
            action: "show_leaves",
            chat_id: chat_id.as_str(),
            metadata: ShowLeavesMetadata {
                request_type: "show_leaves",
                source: "manual",
                leave_query: query,
            },
            command: Some(command).filter(|c| !c.trim().is_empty()),
        };
        if let Err(e) = self.post(&envelope).await {
            tracing::error!(%e, "failed to request approved leaves from backend");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ApproverInfo, DecisionEnvelope, ForwardResponse};
    use crate::metadata::RequestMetadata;

    #[test]
    fn envelope_serializes_with_wire_field_names() {
        let envelope = DecisionEnvelope {
            action: "approve".to_string(),
            chat_id: "chat@g.us".to_string(),
            metadata: RequestMetadata::from_value(serde_json::json!({"request_id": "REQ-1"})),
            request_id: Some("REQ-1".to_string()),
            message_id: Some("R1".to_string()),
            origin_message_id: Some("M1".to_string()),
            approver: Some(ApproverInfo {
                id: Some("60123@c.us".to_string()),
                number: Some("60123".to_string()),
                push_name: Some("Tan".to_string()),
                short_name: None,
                name: "Tan".to_string(),
            }),
        };
        let value = serde_json::to_value(&envelope).expect("should serialize");
        assert_eq!(value["action"], "approve");
        assert_eq!(value["chatId"], "chat@g.us");
        assert_eq!(value["messageId"], "R1");
        assert_eq!(value["originMessageId"], "M1");
        assert_eq!(value["metadata"]["request_id"], "REQ-1");
        assert_eq!(value["approver"]["pushName"], "Tan");
    }

    #[test]
    fn optional_envelope_fields_are_omitted_not_null() {
        let envelope = DecisionEnvelope {
            action: "reject".to_string(),
            chat_id: "chat@g.us".to_string(),
            metadata: RequestMetadata::default(),
            request_id: None,
            message_id: None,
            origin_message_id: None,
            approver: None,
        };
        let value = serde_json::to_value(&envelope).expect("should serialize");
        assert!(value.get("request_id").is_none());
        assert!(value.get("approver").is_none());
    }

    #[test]
    fn capacity_follow_up_triggers_only_on_the_exact_reason() {
        let response: ForwardResponse =
            serde_json::from_str(r#"{"ok":true,"rejection_reason":"capacity_full"}"#).unwrap();
        assert!(response.wants_capacity_follow_up());

        let response: ForwardResponse = serde_json::from_str(r#"{"ok":true}"#).unwrap();
        assert!(!response.wants_capacity_follow_up());

        let response: ForwardResponse =
            serde_json::from_str(r#"{"ok":false,"rejection_reason":"other"}"#).unwrap();
        assert!(!response.wants_capacity_follow_up());
    }
}
