//! Decision processing.
//!
//! One inbound event at a time flows classify → resolve → process. For a
//! resolved approve/reject this composes the localized confirmations, fires
//! them and the backend forward concurrently, then retires the context
//! unconditionally: once a decision has been acted on locally, the
//! correlation window for that request is over, delivered or not.

use crate::classify::{Classifier, ClassifiedEvent};
use crate::context::ContextStore;
use crate::forward::{ApproverInfo, DecisionEnvelope, DecisionForwarder};
use crate::messages::{self, Language};
use crate::metadata::RequestMetadata;
use crate::resolve::{ResolvedDecision, resolve_decision};
use ag_channels::{ChatEvent, ChatId, ChatTransport, ContactProfile, OutboundText, normalize_jid};
use std::sync::Arc;

pub struct ProcessorConfig {
    /// The chat decisions are accepted from; also receives every audit
    /// confirmation.
    pub notification_chat: ChatId,
    /// Always-notified confirmation chat. Usually the notification chat.
    pub audit_chat: ChatId,
    /// Target chat of last resort when neither metadata nor context name one.
    pub fallback_chat: ChatId,
}

pub struct DecisionProcessor {
    store: Arc<ContextStore>,
    transport: Arc<dyn ChatTransport>,
    forwarder: Arc<dyn DecisionForwarder>,
    classifier: Classifier,
    audit_chat: ChatId,
    fallback_chat: ChatId,
}

impl DecisionProcessor {
    pub fn new(
        store: Arc<ContextStore>,
        transport: Arc<dyn ChatTransport>,
        forwarder: Arc<dyn DecisionForwarder>,
        classifier: Classifier,
        config: ProcessorConfig,
    ) -> Self {
        Self {
            store,
            transport,
            forwarder,
            classifier,
            audit_chat: config.audit_chat,
            fallback_chat: config.fallback_chat,
        }
    }

    /// Handle one inbound chat event to completion. Never fails: every
    /// problem degrades to a log line and a dropped event.
    pub async fn handle_event(&self, event: &ChatEvent) {
        let Some(classified) = self.classifier.classify(event, &self.store) else {
            return;
        };
        match classified {
            ClassifiedEvent::Help => self.send_help(&event.chat_id).await,
            ClassifiedEvent::ShowLeaves(query) => {
                self.forwarder
                    .forward_show_leaves(&event.chat_id, &query, &event.body)
                    .await;
            }
            decision_event => {
                let Some(resolved) = resolve_decision(decision_event) else {
                    return;
                };
                self.process(resolved, event).await;
            }
        }
    }

    async fn process(&self, resolved: ResolvedDecision, event: &ChatEvent) {
        let mut metadata = resolved.context.metadata.clone();
        if metadata.request_id.is_none() {
            metadata.request_id = resolved.request_id.as_deref().map(str::to_string);
        }

        let approver = self.approver_for(event).await;
        let (applicant_id, mention_tag) = self.applicant_mention(&metadata).await;
        let range_label = metadata
            .date_range_label
            .as_deref()
            .map(|label| format!(" ({label})"))
            .unwrap_or_default();

        let original_chat = metadata
            .chat_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ChatId::new)
            .or_else(|| non_empty_chat(&resolved.context.chat_id));
        let target_chat = original_chat
            .clone()
            .or_else(|| non_empty_chat(&event.chat_id))
            .unwrap_or_else(|| self.fallback_chat.clone());

        let mentions: Vec<String> = applicant_id.iter().cloned().collect();

        let original_send = async {
            let Some(chat) = original_chat.as_ref().filter(|c| **c != self.audit_chat) else {
                return;
            };
            let text = messages::confirmation_text(
                resolved.decision,
                Language::Ms,
                &mention_tag,
                &range_label,
                &approver.name,
                &metadata,
            );
            self.send_confirmation(chat, text, &mentions).await;
        };
        let audit_send = async {
            let text = messages::confirmation_text(
                resolved.decision,
                Language::Zh,
                &mention_tag,
                &range_label,
                &approver.name,
                &metadata,
            );
            self.send_confirmation(&self.audit_chat, text, &mentions).await;
        };

        let mut forwarded_metadata = metadata.clone();
        if forwarded_metadata.decision_source.is_none() {
            forwarded_metadata.decision_source = Some(resolved.source.as_str().to_string());
        }
        let envelope = DecisionEnvelope {
            action: resolved.decision.as_str().to_string(),
            chat_id: target_chat.clone().into_inner(),
            metadata: forwarded_metadata,
            request_id: resolved.request_id.as_deref().map(str::to_string),
            message_id: Some(event.message_id.clone().into_inner()),
            origin_message_id: resolved
                .origin_message_id
                .clone()
                .map(ag_channels::MessageId::into_inner),
            approver: Some(approver.clone()),
        };
        let forward = self.forwarder.forward_decision(envelope);

        // Confirmations and the backend forward are independent; run them
        // together, but all must finish before the context is retired.
        tokio::join!(original_send, audit_send, forward);

        tracing::info!(
            decision = %resolved.decision,
            action = %resolved.action,
            source = resolved.source.as_str(),
            request_id = resolved.request_id.as_deref().unwrap_or(""),
            target_chat = %target_chat,
            "decision processed"
        );

        self.store.evict(
            resolved.origin_message_id.as_ref(),
            resolved.request_id.as_ref(),
            Some(&target_chat),
        );
    }

    async fn send_help(&self, chat_id: &ChatId) {
        if let Err(e) = self
            .transport
            .send_text(chat_id, OutboundText::plain(messages::help_menu()))
            .await
        {
            tracing::error!(%e, chat_id = %chat_id, "failed to send help menu");
        }
    }

    async fn send_confirmation(&self, chat_id: &ChatId, text: String, mentions: &[String]) {
        let message = OutboundText {
            content: text,
            mentions: mentions.to_vec(),
        };
        if let Err(e) = self.transport.send_text(chat_id, message).await {
            tracing::error!(%e, chat_id = %chat_id, "failed to send decision confirmation");
        }
    }

    async fn approver_for(&self, event: &ChatEvent) -> ApproverInfo {
        let profile = match self.transport.contact_profile(&event.sender_id).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(%e, sender = %event.sender_id, "unable to fetch approver contact");
                None
            }
        };
        approver_from_profile(profile)
    }

    /// Resolve who the decision is about: a mentionable JID when the
    /// metadata names one, else a display name, else a generic placeholder.
    async fn applicant_mention(&self, metadata: &RequestMetadata) -> (Option<String>, String) {
        let applicant_jid = metadata
            .applicant_jid
            .as_deref()
            .and_then(normalize_jid)
            .or_else(|| {
                metadata
                    .applicant_phone_number
                    .as_deref()
                    .and_then(normalize_jid)
            });
        let Some(jid) = applicant_jid else {
            return (None, display_name_tag(metadata));
        };

        let contact = match self.transport.contact_profile(&jid).await {
            Ok(contact) => contact,
            Err(e) => {
                tracing::warn!(%e, jid = %jid, "unable to fetch applicant contact for mention");
                None
            }
        };
        let applicant_id = contact.and_then(|c| c.id).unwrap_or(jid);
        let handle = applicant_id.split('@').next().unwrap_or_default();
        let tag = if handle.is_empty() {
            display_name_tag(metadata)
        } else {
            format!("@{handle}")
        };
        (Some(applicant_id), tag)
    }
}

fn approver_from_profile(profile: Option<ContactProfile>) -> ApproverInfo {
    let Some(profile) = profile else {
        return ApproverInfo {
            name: "Admin".to_string(),
            ..ApproverInfo::default()
        };
    };
    let name = profile
        .push_name
        .clone()
        .or_else(|| profile.name.clone())
        .or_else(|| profile.short_name.clone())
        .or_else(|| profile.number.clone())
        .unwrap_or_else(|| "Admin".to_string());
    ApproverInfo {
        id: profile.id,
        number: profile.number,
        push_name: profile.push_name,
        short_name: profile.short_name,
        name,
    }
}

fn display_name_tag(metadata: &RequestMetadata) -> String {
    metadata
        .applicant_display_name
        .clone()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| "Pemohon".to_string())
}

fn non_empty_chat(chat_id: &ChatId) -> Option<ChatId> {
    let trimmed = chat_id.as_str().trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(ChatId::new(trimmed))
    }
}
