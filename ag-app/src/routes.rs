//! HTTP front door: readiness, outbound sends, and the bridge webhook.

use ag_channels::{ChatEvent, ChatId, ChatTransport, normalize_jid};
use ag_engine::{ChoiceSpec, ComposedRequest, ContextStore, RequestMetadata, compose_request};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct AppState {
    pub transport: Arc<dyn ChatTransport>,
    pub store: Arc<ContextStore>,
    pub events_tx: mpsc::Sender<ChatEvent>,
}

pub fn router(state: AppState) -> axum::Router {
    axum::Router::new()
        .route("/status", get(status))
        .route("/send", post(send))
        .route("/events", post(events))
        .with_state(state)
}

async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ready": state.transport.ready().await }))
}

#[derive(Debug, Deserialize)]
struct SendRequest {
    #[serde(rename = "chatId")]
    chat_id: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    buttons: Vec<ButtonSpec>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    footer: Option<String>,
    #[serde(default)]
    metadata: serde_json::Value,
    #[serde(default)]
    request_id: Option<String>,
    #[serde(default, rename = "mentionNumbers")]
    mention_numbers: Vec<String>,
    #[serde(default)]
    mentions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ButtonSpec {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, alias = "label")]
    body: Option<String>,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn error(status: StatusCode, message: &str) -> ApiError {
    (status, Json(serde_json::json!({ "error": message })))
}

async fn send(
    State(state): State<AppState>,
    Json(request): Json<SendRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.transport.ready().await {
        return Err(error(StatusCode::SERVICE_UNAVAILABLE, "WhatsApp not ready yet"));
    }
    let Some(chat_id) = request
        .chat_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    else {
        return Err(error(StatusCode::BAD_REQUEST, "chatId is required"));
    };
    let chat_id = ChatId::new(chat_id);

    if request.kind.as_deref() == Some("buttons") {
        return send_interactive(&state, &chat_id, &request).await;
    }

    if let Some(content) = request.content.as_deref() {
        let message = ag_channels::OutboundText {
            content: content.to_string(),
            mentions: resolve_mentions(&request),
        };
        state
            .transport
            .send_text(&chat_id, message)
            .await
            .map_err(|e| {
                tracing::error!(%e, chat_id = %chat_id, "text send failed");
                error(StatusCode::INTERNAL_SERVER_ERROR, "send failed")
            })?;
        return Ok(Json(serde_json::json!({ "id": null })));
    }

    Err(error(
        StatusCode::BAD_REQUEST,
        "Provide either {content} for text or {type: buttons, body, buttons}",
    ))
}

async fn send_interactive(
    state: &AppState,
    chat_id: &ChatId,
    request: &SendRequest,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut metadata = RequestMetadata::from_value(request.metadata.clone());
    if metadata.request_id.is_none() {
        metadata.request_id = request
            .request_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
    }

    let choices: Vec<ChoiceSpec> = request
        .buttons
        .iter()
        .filter_map(|b| {
            let label = b.body.as_deref()?.trim();
            if label.is_empty() {
                return None;
            }
            Some(ChoiceSpec {
                label: label.to_string(),
                action_id: b.id.clone(),
            })
        })
        .collect();

    let composed: ComposedRequest = compose_request(
        request.body.as_deref().unwrap_or_default(),
        &choices,
        request.title.as_deref(),
        request.footer.as_deref(),
        metadata,
    )
    .map_err(|e| {
        tracing::warn!(%e, "rejected buttons payload");
        error(StatusCode::BAD_REQUEST, "Invalid buttons payload")
    })?;

    let mut message = composed.message.clone();
    message.mentions = resolve_mentions(request);

    let message_id = state
        .transport
        .send_interactive(chat_id, message)
        .await
        .map_err(|e| {
            tracing::error!(%e, chat_id = %chat_id, "interactive send failed");
            error(StatusCode::INTERNAL_SERVER_ERROR, "send failed")
        })?;

    // Registration happens only now: the context key is the id the
    // transport assigned to the sent message.
    state
        .store
        .put(composed.into_context(chat_id.clone(), message_id.clone()));

    Ok(Json(serde_json::json!({ "id": message_id.as_str() })))
}

fn resolve_mentions(request: &SendRequest) -> Vec<String> {
    let mut seen = std::collections::BTreeSet::new();
    request
        .mention_numbers
        .iter()
        .chain(request.mentions.iter())
        .filter_map(|value| normalize_jid(value))
        .filter(|jid| seen.insert(jid.clone()))
        .collect()
}

async fn events(
    State(state): State<AppState>,
    Json(event): Json<ChatEvent>,
) -> Result<StatusCode, ApiError> {
    state.events_tx.send(event).await.map_err(|e| {
        tracing::error!(%e, "inbound event queue closed");
        error(StatusCode::INTERNAL_SERVER_ERROR, "event queue unavailable")
    })?;
    Ok(StatusCode::ACCEPTED)
}

#[cfg(test)]
mod tests {
    use super::{ButtonSpec, SendRequest, resolve_mentions};

    fn base_request() -> SendRequest {
        SendRequest {
            chat_id: Some("chat@g.us".to_string()),
            content: None,
            kind: None,
            body: None,
            buttons: vec![],
            title: None,
            footer: None,
            metadata: serde_json::Value::Null,
            request_id: None,
            mention_numbers: vec![],
            mentions: vec![],
        }
    }

    #[test]
    fn send_request_accepts_the_wire_shape() {
        let parsed: SendRequest = serde_json::from_value(serde_json::json!({
            "chatId": "chat@g.us",
            "type": "buttons",
            "body": "New leave request",
            "buttons": [{"body": "Approve"}, {"label": "Reject", "id": "auto:reject:REQ-1"}],
            "metadata": {"request_id": "REQ-1"},
            "mentionNumbers": ["0123456789"],
        }))
        .expect("should deserialize");
        assert_eq!(parsed.kind.as_deref(), Some("buttons"));
        assert_eq!(parsed.buttons.len(), 2);
        assert_eq!(parsed.buttons[1].id.as_deref(), Some("auto:reject:REQ-1"));
        assert_eq!(parsed.mention_numbers, vec!["0123456789"]);
    }

    #[test]
    fn mentions_are_normalized_and_deduplicated() {
        let mut request = base_request();
        request.mention_numbers = vec!["0123456789".to_string(), "garbage".to_string()];
        request.mentions = vec!["60123456789@c.us".to_string()];
        assert_eq!(resolve_mentions(&request), vec!["60123456789@c.us".to_string()]);
    }

    #[test]
    fn button_spec_accepts_body_or_label() {
        let spec: ButtonSpec =
            serde_json::from_value(serde_json::json!({"label": "Approve"})).unwrap();
        assert_eq!(spec.body.as_deref(), Some("Approve"));
    }
}
