use crate::traits::ChatTransport;
use crate::types::{ChatId, ContactProfile, InteractiveMessage, MessageId, OutboundText};
use anyhow::{Result, anyhow};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

/// HTTP client for the whatsapp-web bridge sidecar that owns the actual
/// device session. Inbound events are delivered separately via the webhook
/// route wiring in ag-app.
#[derive(Clone)]
pub struct WhatsAppBridge {
    http: reqwest::Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    ready: bool,
}

impl WhatsAppBridge {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = base_url.trim();
        if base_url.is_empty() {
            return Err(anyhow!("bridge base url is required"));
        }
        let base_url = Url::parse(base_url)
            .map_err(|e| anyhow!("invalid bridge base url {base_url:?}: {e}"))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| anyhow!("invalid bridge endpoint {path:?}: {e}"))
    }

    async fn post_send(&self, payload: serde_json::Value) -> Result<Option<MessageId>> {
        let url = self.endpoint("send")?;
        let response = self.http.post(url).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("bridge send failed: status={status} body={body}"));
        }
        let parsed: SendResponse = response.json().await?;
        Ok(parsed.id.map(MessageId::new))
    }
}

#[async_trait::async_trait]
impl ChatTransport for WhatsAppBridge {
    async fn send_text(&self, chat_id: &ChatId, message: OutboundText) -> Result<()> {
        let mut payload = serde_json::json!({
            "chatId": chat_id.as_str(),
            "content": message.content,
        });
        if !message.mentions.is_empty() {
            payload["mentions"] = serde_json::json!(message.mentions);
        }
        self.post_send(payload).await?;
        Ok(())
    }

    async fn send_interactive(
        &self,
        chat_id: &ChatId,
        message: InteractiveMessage,
    ) -> Result<MessageId> {
        let buttons: Vec<serde_json::Value> = message
            .buttons
            .iter()
            .map(|b| serde_json::json!({"id": b.id, "body": b.label}))
            .collect();
        let mut payload = serde_json::json!({
            "chatId": chat_id.as_str(),
            "type": "buttons",
            "body": message.body,
            "buttons": buttons,
        });
        if let Some(title) = &message.title {
            payload["title"] = serde_json::json!(title);
        }
        if let Some(footer) = &message.footer {
            payload["footer"] = serde_json::json!(footer);
        }
        if !message.mentions.is_empty() {
            payload["mentions"] = serde_json::json!(message.mentions);
        }
        self.post_send(payload)
            .await?
            .ok_or_else(|| anyhow!("bridge send returned no message id for interactive message"))
    }

    async fn contact_profile(&self, jid: &str) -> Result<Option<ContactProfile>> {
        let url = self.endpoint(&format!("contacts/{jid}"))?;
        let response = self.http.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "bridge contact lookup failed: status={status} body={body}"
            ));
        }
        Ok(Some(response.json().await?))
    }

    async fn ready(&self) -> bool {
        let Ok(url) = self.endpoint("status") else {
            return false;
        };
        match self.http.get(url).send().await {
            Ok(response) if response.status().is_success() => response
                .json::<StatusResponse>()
                .await
                .map(|s| s.ready)
                .unwrap_or(false),
            Ok(response) => {
                tracing::warn!(status = %response.status(), "bridge status probe failed");
                false
            }
            Err(e) => {
                tracing::warn!(%e, "bridge status probe unreachable");
                false
            }
        }
    }
}
