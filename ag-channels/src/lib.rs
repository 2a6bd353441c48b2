//! Chat transport seam for approvegate.
//!
//! This crate is pure I/O: shared identifier types, the inbound event shape
//! delivered by the WhatsApp bridge, and the `ChatTransport` trait the
//! decision engine sends through. No approval logic lives here.

mod bridge;
mod traits;
mod types;

pub use bridge::WhatsAppBridge;
pub use traits::ChatTransport;
pub use types::{
    ChatEvent, ChatId, ContactProfile, EventKind, InteractiveButton, InteractiveMessage,
    MessageId, OutboundText, QuotedMessage, RequestId, SenderId, normalize_jid,
};
