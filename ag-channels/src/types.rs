use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl Deref for $name {
            type Target = str;

            fn deref(&self) -> &Self::Target {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

id_newtype!(ChatId);
id_newtype!(MessageId);
id_newtype!(SenderId);
id_newtype!(RequestId);

/// WhatsApp contact profile fields as the bridge reports them. Any of them
/// may be missing for contacts that never set a profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactProfile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default, rename = "pushName")]
    pub push_name: Option<String>,
    #[serde(default, rename = "shortName")]
    pub short_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// The message a reply quotes, when the transport exposes the relation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotedMessage {
    pub message_id: MessageId,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum EventKind {
    /// A tap on one of an interactive message's buttons.
    ButtonTap {
        #[serde(default)]
        selected_id: Option<String>,
        #[serde(default)]
        selected_label: Option<String>,
    },
    /// An ordinary typed message.
    Text,
}

/// One inbound chat event as delivered by the bridge webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEvent {
    #[serde(flatten)]
    pub kind: EventKind,
    pub message_id: MessageId,
    pub chat_id: ChatId,
    pub sender_id: SenderId,
    #[serde(default)]
    pub from_me: bool,
    #[serde(default)]
    pub is_group: bool,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub quoted: Option<QuotedMessage>,
    pub received_at: DateTime<Utc>,
}

/// Plain text send, optionally tagging contacts so the client renders
/// `@number` spans as real mentions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutboundText {
    pub content: String,
    #[serde(default)]
    pub mentions: Vec<String>,
}

impl OutboundText {
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            mentions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractiveButton {
    pub id: String,
    pub label: String,
}

/// Render payload for an interactive request: the literal text plus the
/// ordered button row the client displays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractiveMessage {
    pub body: String,
    pub buttons: Vec<InteractiveButton>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub footer: Option<String>,
    #[serde(default)]
    pub mentions: Vec<String>,
}

/// Normalize a phone number or serialized id into a WhatsApp JID.
///
/// Already-serialized ids (`…@c.us`, `…@g.us`) pass through. Anything else is
/// reduced to digits; local `0`-prefixed numbers get the Malaysian country
/// code, matching how applicants register their numbers.
pub fn normalize_jid(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.ends_with("@c.us") || trimmed.ends_with("@g.us") {
        return Some(trimmed.to_string());
    }
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    if digits.starts_with("60") {
        return Some(format!("{digits}@c.us"));
    }
    if digits.starts_with('0') && digits.len() > 1 {
        return Some(format!("6{}@c.us", &digits[1..]));
    }
    Some(format!("{digits}@c.us"))
}
