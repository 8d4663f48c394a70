use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::Role;

/// Claim names the codec owns; never taken from `extra`.
pub const RESERVED_CLAIMS: [&str; 3] = ["sub", "iat", "exp"];

/// Token payload: subject, issue/expiry instants (epoch milliseconds), extras.
///
/// Fields are private so a `Claims` cannot change after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Claims {
    pub fn new(
        subject: impl Into<String>,
        issued_at_ms: i64,
        expires_at_ms: i64,
        mut extra: Map<String, Value>,
    ) -> Self {
        for name in RESERVED_CLAIMS {
            extra.remove(name);
        }

        Self {
            sub: subject.into(),
            iat: issued_at_ms,
            exp: expires_at_ms,
            extra,
        }
    }

    pub fn subject(&self) -> &str {
        &self.sub
    }

    #[cfg(test)]
    pub fn issued_at_ms(&self) -> i64 {
        self.iat
    }

    pub fn expires_at_ms(&self) -> i64 {
        self.exp
    }

    #[cfg(test)]
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    // Informational only: the store's role is authoritative for authorization.
    pub fn role(&self) -> Option<Role> {
        self.extra.get("role")?.as_str()?.parse().ok()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() >= self.exp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reserved_names_in_extra_are_dropped() {
        let mut extra = Map::new();
        extra.insert("sub".into(), json!("mallory"));
        extra.insert("exp".into(), json!(i64::MAX));
        extra.insert("role".into(), json!("ADMIN"));

        let claims = Claims::new("bob", 1_000, 2_000, extra);

        assert_eq!(claims.subject(), "bob");
        assert_eq!(claims.expires_at_ms(), 2_000);
        assert_eq!(claims.extra().len(), 1);
        assert_eq!(claims.role(), Some(Role::Admin));
    }

    #[test]
    fn wire_shape_is_flat() {
        let mut extra = Map::new();
        extra.insert("role".into(), json!("USER"));
        let claims = Claims::new("bob", 10, 20, extra);

        let v = serde_json::to_value(&claims).unwrap();
        assert_eq!(v, json!({"sub": "bob", "iat": 10, "exp": 20, "role": "USER"}));

        let back: Claims = serde_json::from_value(v).unwrap();
        assert_eq!(back, claims);
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let claims = Claims::new("bob", 0, 1_000, Map::new());
        let at = |ms| DateTime::from_timestamp_millis(ms).unwrap();

        assert!(!claims.is_expired_at(at(999)));
        assert!(claims.is_expired_at(at(1_000)));
        assert!(claims.is_expired_at(at(1_001)));
    }
}
