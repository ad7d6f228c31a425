//! Wire shapes specific to the REST transport.
//!
//! Record types (`Candidate`, `AlertSubscription`, ...) live in
//! `fieldfinder-core`; this module only holds envelopes and patch bodies.

use serde::{Deserialize, Serialize};

/// Collection responses come either as a bare JSON array or wrapped as
/// `{ "data": [...] }` depending on the backend route.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope {
    Bare(Vec<serde_json::Value>),
    Wrapped { data: Vec<serde_json::Value> },
}

impl ListEnvelope {
    #[must_use]
    pub fn into_items(self) -> Vec<serde_json::Value> {
        match self {
            ListEnvelope::Bare(items) | ListEnvelope::Wrapped { data: items } => items,
        }
    }
}

/// Body of `PATCH /alerts/{id}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivePatch {
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_accepts_bare_array() {
        let env: ListEnvelope = serde_json::from_str(r#"[{"id": "a"}, {"id": "b"}]"#).unwrap();
        assert_eq!(env.into_items().len(), 2);
    }

    #[test]
    fn envelope_accepts_data_wrapper() {
        let env: ListEnvelope = serde_json::from_str(r#"{"data": [{"id": "a"}]}"#).unwrap();
        assert_eq!(env.into_items().len(), 1);
    }

    #[test]
    fn active_patch_is_camel_case() {
        let json = serde_json::to_string(&ActivePatch { is_active: false }).unwrap();
        assert_eq!(json, r#"{"isActive":false}"#);
    }
}
