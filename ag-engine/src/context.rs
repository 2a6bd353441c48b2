//! In-memory registry of outstanding interactive requests.
//!
//! The registry is volatile: it is rebuilt per process and a restart forgets
//! every pending request. A context stays live until a decision referencing
//! it is fully processed, at which point all indices are purged. Two replies
//! racing on the same context can both resolve it before either eviction
//! lands; the backend owns idempotency for that case.

use crate::action::ActionId;
use crate::metadata::RequestMetadata;
use ag_channels::{ChatId, MessageId, RequestId};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// One outstanding interactive request.
#[derive(Debug, Clone)]
pub struct ButtonContext {
    /// Reverse lookup for a tapped choice: action → display label.
    pub actions_by_id: HashMap<ActionId, String>,
    /// Display label → action. `None` means the label exists but carries no
    /// machine action.
    pub actions_by_label: HashMap<String, Option<ActionId>>,
    pub metadata: RequestMetadata,
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub created_at: DateTime<Utc>,
}

impl ButtonContext {
    pub fn request_id(&self) -> Option<RequestId> {
        self.metadata
            .request_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(RequestId::new)
    }
}

/// Three-way index over live contexts: by sent message id (primary), by
/// business request id, and by "latest request in this chat".
///
/// All lookups are constant-time; absent keys resolve to `None`, nothing
/// panics. Entries never expire on their own — `prune_stale` exists so the
/// application can bound retention on a timer.
#[derive(Default)]
pub struct ContextStore {
    by_message: DashMap<MessageId, Arc<ButtonContext>>,
    request_to_message: DashMap<RequestId, MessageId>,
    latest_by_chat: DashMap<ChatId, Arc<ButtonContext>>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite all three indices for a context.
    pub fn put(&self, context: ButtonContext) {
        let context = Arc::new(context);
        if let Some(request_id) = context.request_id() {
            self.request_to_message
                .insert(request_id, context.message_id.clone());
        }
        self.latest_by_chat
            .insert(context.chat_id.clone(), Arc::clone(&context));
        self.by_message
            .insert(context.message_id.clone(), context);
    }

    pub fn get_by_message_id(&self, id: &MessageId) -> Option<Arc<ButtonContext>> {
        self.by_message.get(id).map(|entry| Arc::clone(&entry))
    }

    /// Indirect lookup: request id resolves to a message id, then to the
    /// context stored under it.
    pub fn get_by_request_id(&self, id: &RequestId) -> Option<Arc<ButtonContext>> {
        let message_id = self
            .request_to_message
            .get(id)
            .map(|entry| entry.clone())?;
        self.get_by_message_id(&message_id)
    }

    pub fn message_id_for_request(&self, id: &RequestId) -> Option<MessageId> {
        self.request_to_message.get(id).map(|entry| entry.clone())
    }

    /// The most recent request sent into a chat, if any.
    pub fn latest_for_chat(&self, chat_id: &ChatId) -> Option<Arc<ButtonContext>> {
        self.latest_by_chat
            .get(chat_id)
            .map(|entry| Arc::clone(&entry))
    }

    /// Remove every index for a retired context. Any subset of identifiers
    /// may be absent; missing keys are simply skipped.
    pub fn evict(
        &self,
        message_id: Option<&MessageId>,
        request_id: Option<&RequestId>,
        chat_id: Option<&ChatId>,
    ) {
        if let Some(message_id) = message_id {
            self.by_message.remove(message_id);
        }
        if let Some(request_id) = request_id {
            self.request_to_message.remove(request_id);
        }
        if let Some(chat_id) = chat_id {
            self.latest_by_chat.remove(chat_id);
        }
    }

    /// Drop contexts older than `max_age` from every index. Returns how many
    /// primary entries were removed.
    pub fn prune_stale(&self, max_age: Duration) -> usize {
        let Ok(max_age) = chrono::Duration::from_std(max_age) else {
            return 0;
        };
        let cutoff = Utc::now() - max_age;
        let before = self.by_message.len();
        self.by_message.retain(|_, context| context.created_at >= cutoff);
        self.request_to_message
            .retain(|_, message_id| self.by_message.contains_key(message_id));
        self.latest_by_chat
            .retain(|_, context| context.created_at >= cutoff);
        before - self.by_message.len()
    }

    pub fn len(&self) -> usize {
        self.by_message.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_message.is_empty()
    }
}
