//! Typed action identifiers.
//!
//! On the wire an action is a colon-separated string, `{origin}:{decision}:{request_id}`,
//! attached to a button choice and echoed back when the button is tapped.
//! It is parsed into `ActionId` exactly once, at the boundary; nothing
//! downstream re-splits the string.

use ag_channels::RequestId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A resolved business decision. Informational commands (help, show-leaves)
/// are not decisions; they never reach the backend as one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Reject => "reject",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionOrigin {
    /// Inferred from the button label at composition time.
    Auto,
    /// Synthesized for a typed approval/rejection.
    Manual,
    /// Anything else a caller supplied explicitly.
    Other,
}

impl ActionOrigin {
    fn as_str(self) -> &'static str {
        match self {
            ActionOrigin::Auto => "auto",
            ActionOrigin::Manual => "manual",
            ActionOrigin::Other => "ext",
        }
    }
}

/// Parsed form of a wire action id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionId {
    pub origin: ActionOrigin,
    pub decision: Decision,
    pub request_id: Option<RequestId>,
}

impl ActionId {
    pub fn auto(decision: Decision, slug: impl Into<String>) -> Self {
        Self {
            origin: ActionOrigin::Auto,
            decision,
            request_id: Some(RequestId::new(slug)),
        }
    }

    pub fn manual(decision: Decision, request_id: Option<RequestId>) -> Self {
        Self {
            origin: ActionOrigin::Manual,
            decision,
            request_id,
        }
    }

    /// Parse a wire action id. Returns `None` for anything that does not
    /// carry a recognizable decision: fewer than two colon fields, or a
    /// middle field outside `approve/approved/reject/rejected`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let mut parts = raw.splitn(3, ':');
        let origin = parts.next()?;
        let decision = parts.next()?;
        let decision = match decision.to_ascii_lowercase().as_str() {
            "approve" | "approved" => Decision::Approve,
            "reject" | "rejected" => Decision::Reject,
            _ => return None,
        };
        let origin = match origin {
            "auto" => ActionOrigin::Auto,
            "manual" => ActionOrigin::Manual,
            _ => ActionOrigin::Other,
        };
        let request_id = parts
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(RequestId::new);
        Some(Self {
            origin,
            decision,
            request_id,
        })
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.origin.as_str(),
            self.decision,
            self.request_id.as_ref().map(|r| r.as_str()).unwrap_or("")
        )
    }
}

const APPROVE_TOKENS: &[&str] = &["lulus", "approve", "approved", "setuju", "ok"];
const REJECT_TOKENS: &[&str] = &["tolak", "reject", "rejected", "batal", "no"];

/// Infer an action from a button label. A label containing an approval token
/// becomes `auto:approve:<slug>`, a rejection token `auto:reject:<slug>`.
/// Approval wins when a label somehow contains both. No token, no action.
pub fn infer_action_from_label(label: &str) -> Option<ActionId> {
    let lower = label.to_lowercase();
    if lower.is_empty() {
        return None;
    }
    if APPROVE_TOKENS.iter().any(|t| lower.contains(t)) {
        return Some(ActionId::auto(Decision::Approve, slugify(&lower)));
    }
    if REJECT_TOKENS.iter().any(|t| lower.contains(t)) {
        return Some(ActionId::auto(Decision::Reject, slugify(&lower)));
    }
    None
}

/// Lower-cased label with non-alphanumeric runs collapsed to single hyphens
/// and edge hyphens trimmed. Empty labels slug to "default".
fn slugify(lower: &str) -> String {
    let mut slug = String::with_capacity(lower.len());
    let mut pending_hyphen = false;
    for c in lower.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }
    if slug.is_empty() {
        "default".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::{ActionId, ActionOrigin, Decision, infer_action_from_label, slugify};

    #[test]
    fn parse_normalizes_past_tense_decisions() {
        let approved = ActionId::parse("auto:approved:req-1").expect("should parse");
        assert_eq!(approved.decision, Decision::Approve);
        assert_eq!(approved.request_id.as_deref(), Some("req-1"));

        let rejected = ActionId::parse("manual:REJECTED:").expect("should parse");
        assert_eq!(rejected.decision, Decision::Reject);
        assert_eq!(rejected.origin, ActionOrigin::Manual);
        assert_eq!(rejected.request_id, None, "empty third field is no id");
    }

    #[test]
    fn parse_rejects_short_and_unknown_forms() {
        assert_eq!(ActionId::parse("approve"), None, "needs two fields");
        assert_eq!(ActionId::parse("auto:maybe:x"), None);
        assert_eq!(ActionId::parse(""), None);
        assert_eq!(ActionId::parse("aB3dE9"), None, "opaque button ids");
    }

    #[test]
    fn display_round_trips_through_parse() {
        let action = ActionId::auto(Decision::Approve, "approve");
        assert_eq!(action.to_string(), "auto:approve:approve");
        assert_eq!(ActionId::parse(&action.to_string()), Some(action));
    }

    #[test]
    fn label_inference_matches_keyword_sets() {
        let approve = infer_action_from_label("Approve ✅").expect("should infer");
        assert_eq!(approve.decision, Decision::Approve);
        assert_eq!(approve.to_string(), "auto:approve:approve");

        let reject = infer_action_from_label("Tolak / Batal").expect("should infer");
        assert_eq!(reject.decision, Decision::Reject);
        assert_eq!(reject.to_string(), "auto:reject:tolak-batal");

        assert_eq!(infer_action_from_label("Maybe later"), None);
    }

    #[test]
    fn approval_tokens_win_over_rejection_tokens() {
        let action = infer_action_from_label("OK tolak").expect("should infer");
        assert_eq!(action.decision, Decision::Approve);
    }

    #[test]
    fn slugify_collapses_runs_and_trims_edges() {
        assert_eq!(slugify("  ya, setuju!  "), "ya-setuju");
        assert_eq!(slugify("!!!"), "default");
    }
}
