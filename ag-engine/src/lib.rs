//! Interactive decision correlation engine.
//!
//! The engine sends interactive approval requests into a chat, correlates
//! human responses (button taps or typed shortcuts) back to the request they
//! answer, and forwards the normalized decision to the approval backend.
//!
//! Core pieces: a volatile [`ContextStore`] indexing outstanding requests,
//! the [`compose_request`] builder for outbound payloads, the free-text
//! command grammar, the two-variant inbound [`Classifier`], the decision
//! resolver, and the [`DecisionProcessor`] that orchestrates confirmations,
//! backend forwarding, and context retirement.

mod action;
mod classify;
mod compose;
mod context;
mod forward;
mod grammar;
mod messages;
mod metadata;
mod names;
mod process;
mod resolve;

pub use action::{ActionId, ActionOrigin, Decision, infer_action_from_label};
pub use classify::{ClassifiedEvent, Classifier};
pub use compose::{ChoiceSpec, ComposeError, ComposedRequest, compose_request};
pub use context::{ButtonContext, ContextStore};
pub use forward::{
    ApproverInfo, DecisionEnvelope, DecisionForwarder, HttpBackendForwarder,
};
pub use grammar::{Command, LeaveQuery, LeaveScope, parse_command, parse_command_at};
pub use messages::{Language, capacity_follow_up, confirmation_text, help_menu};
pub use metadata::RequestMetadata;
pub use names::{ApplicantNameExtractor, PatternNameExtractor};
pub use process::{DecisionProcessor, ProcessorConfig};
pub use resolve::{DecisionSource, ResolvedDecision, resolve_decision};
