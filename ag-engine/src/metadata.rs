//! Business metadata carried from request creation to decision forwarding.
//!
//! Callers send a free-form string map; the well-known keys get named fields
//! so the engine reads them with compile-time checking, and everything else
//! rides along untouched in `extra`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const CAPACITY_FULL: &str = "capacity_full";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applicant_jid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applicant_phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applicant_display_name: Option<String>,
    /// Capacity-reject flag arrives under any of three historical keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reject_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_source: Option<String>,
    /// Optional label→action map supplied at composition time, as a JSON
    /// object string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_actions_json: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl RequestMetadata {
    /// Build from an arbitrary JSON value, the shape `/send` callers post.
    /// Scalar values are stringified; null/undefined entries and nested
    /// structures are dropped with a warning, everything else continues.
    pub fn from_value(value: serde_json::Value) -> Self {
        let serde_json::Value::Object(map) = value else {
            if !value.is_null() {
                tracing::warn!("metadata payload is not an object; ignoring");
            }
            return Self::default();
        };
        let mut flat = BTreeMap::new();
        for (key, value) in map {
            match value {
                serde_json::Value::String(s) => {
                    flat.insert(key, s);
                }
                serde_json::Value::Bool(b) => {
                    flat.insert(key, b.to_string());
                }
                serde_json::Value::Number(n) => {
                    flat.insert(key, n.to_string());
                }
                serde_json::Value::Null => {}
                other => {
                    tracing::warn!(key = %key, value = %other, "dropping non-scalar metadata field");
                }
            }
        }
        // Round-trip through serde to split well-known keys from the rest.
        match serde_json::to_value(&flat).and_then(serde_json::from_value) {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!(%e, "metadata did not deserialize; starting empty");
                Self::default()
            }
        }
    }

    pub fn is_capacity_reject(&self) -> bool {
        [&self.reject_reason, &self.rejection_reason, &self.reason]
            .into_iter()
            .any(|field| field.as_deref() == Some(CAPACITY_FULL))
    }
}

#[cfg(test)]
mod tests {
    use super::RequestMetadata;

    #[test]
    fn from_value_splits_known_fields_and_keeps_the_rest() {
        let metadata = RequestMetadata::from_value(serde_json::json!({
            "request_id": "REQ-9",
            "date_range_label": "1 Jan - 3 Jan",
            "applicant_jid": "60123456789@c.us",
            "shift": "night",
            "priority": 2,
        }));
        assert_eq!(metadata.request_id.as_deref(), Some("REQ-9"));
        assert_eq!(metadata.date_range_label.as_deref(), Some("1 Jan - 3 Jan"));
        assert_eq!(metadata.extra.get("shift").map(String::as_str), Some("night"));
        assert_eq!(
            metadata.extra.get("priority").map(String::as_str),
            Some("2"),
            "numbers should be stringified"
        );
    }

    #[test]
    fn from_value_discards_malformed_fields_and_continues() {
        let metadata = RequestMetadata::from_value(serde_json::json!({
            "request_id": "REQ-1",
            "nested": {"a": 1},
            "gone": null,
        }));
        assert_eq!(metadata.request_id.as_deref(), Some("REQ-1"));
        assert!(metadata.extra.is_empty());
    }

    #[test]
    fn capacity_flag_is_recognized_under_all_three_keys() {
        for key in ["reject_reason", "rejection_reason", "reason"] {
            let metadata =
                RequestMetadata::from_value(serde_json::json!({key: "capacity_full"}));
            assert!(metadata.is_capacity_reject(), "key {key} should flag");
        }
        let metadata = RequestMetadata::from_value(serde_json::json!({"reason": "other"}));
        assert!(!metadata.is_capacity_reject());
    }

    #[test]
    fn serializes_back_to_a_flat_string_map() {
        let metadata = RequestMetadata::from_value(serde_json::json!({
            "request_id": "REQ-2",
            "vehicle": "lowbed-7",
        }));
        let value = serde_json::to_value(&metadata).expect("should serialize");
        assert_eq!(value["request_id"], "REQ-2");
        assert_eq!(value["vehicle"], "lowbed-7");
        assert!(value.get("chat_id").is_none(), "absent fields stay absent");
    }
}
