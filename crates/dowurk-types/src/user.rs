//! Locally persisted user record.
//!
//! The authentication flow (outside this client) writes the signed-in user's
//! profile under the `"user"` key of the session store. The payment poller
//! patches `role` after a confirmed purchase; every other field is preserved.

use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;

/// Session store key holding the signed-in user's profile.
pub const USER_RECORD_KEY: &str = "user";

/// The signed-in user's profile as stored locally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Subscription package the user holds (e.g. "professional").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Fields written by other parts of the application.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_fields_survive_roundtrip() {
        let value = json!({"email": "kim@example.com", "role": "free", "token_expiry": 1234});
        let mut record: UserRecord = serde_json::from_value(value).unwrap();
        record.role = Some("business".to_string());

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["role"], "business");
        assert_eq!(back["token_expiry"], 1234);
        assert_eq!(back["email"], "kim@example.com");
    }
}
