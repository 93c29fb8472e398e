//! Session token inspection
//!
//! The client never verifies the token signature; it only reads the
//! payload to decide whether a persisted token is still worth using.

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, Utc};
use helfinka_types::TokenClaims;
use serde::Deserialize;

/// Decode the payload segment of a JWT-shaped token.
///
/// Accepts URL-safe or standard base64, padded or not. Returns `None` for
/// anything that is not a JSON object of claims.
pub fn decode_token_claims(token: &str) -> Option<TokenClaims> {
    let payload = token.split('.').nth(1)?;
    if payload.is_empty() {
        return None;
    }

    let payload = payload.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| STANDARD_NO_PAD.decode(payload))
        .ok()?;

    let value: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    if !value.is_object() {
        return None;
    }
    TokenClaims::deserialize(value).ok()
}

/// Undecodable tokens and tokens without `exp` count as expired
pub fn is_token_expired(token: &str, now: DateTime<Utc>) -> bool {
    match decode_token_claims(token) {
        Some(claims) => claims.is_expired_at(now),
        None => {
            tracing::debug!("Token payload could not be decoded");
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use serde_json::json;

    fn token_with(payload: &serde_json::Value) -> String {
        format!(
            "eyJhbGciOiJIUzI1NiJ9.{}.signature",
            URL_SAFE_NO_PAD.encode(payload.to_string())
        )
    }

    #[test]
    fn test_expiry_boundaries() {
        let now = Utc::now();
        let ts = now.timestamp();

        assert!(is_token_expired(&token_with(&json!({"exp": ts - 1})), now));
        assert!(!is_token_expired(&token_with(&json!({"exp": ts + 3600})), now));
        assert!(is_token_expired(&token_with(&json!({"sub": "u-1"})), now));
    }

    #[test]
    fn test_expired_exactly_at_exp() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert!(is_token_expired(&token_with(&json!({"exp": 1_700_000_000})), now));
    }

    #[test]
    fn test_undecodable_tokens_are_expired() {
        let now = Utc::now();
        for token in ["", "abc", "a..c", "a.!!!.c", "a.bm90IGpzb24.c"] {
            assert!(is_token_expired(token, now), "token {token:?}");
        }
    }

    #[test]
    fn test_unrelated_claims_do_not_affect_expiry() {
        let now = Utc::now();
        let exp = now.timestamp() + 3600;

        for payload in [
            json!({"sub": 42, "exp": exp}),
            json!({"roles": "admin", "exp": exp}),
            json!({"roles": null, "exp": exp}),
            json!({"displayName": {"first": "Ann"}, "iat": "now", "exp": exp}),
        ] {
            assert!(!is_token_expired(&token_with(&payload), now), "payload {payload}");
        }
    }

    #[test]
    fn test_non_object_payloads_are_expired() {
        let now = Utc::now();
        for payload in [json!([1, 2, 3]), json!(4102444800_i64), json!(null)] {
            assert!(is_token_expired(&token_with(&payload), now), "payload {payload}");
        }
    }

    #[test]
    fn test_far_future_expiry_is_live() {
        assert!(!is_token_expired(&token_with(&json!({"exp": 1e20})), Utc::now()));
    }

    #[test]
    fn test_decode_accepts_standard_padded_base64() {
        // Standard alphabet with padding, as some issuers emit
        let payload = STANDARD.encode(r#"{"sub":"u-1","exp":4102444800,"roles":["user"]}"#);
        let claims = decode_token_claims(&format!("h.{payload}.s")).unwrap();

        assert_eq!(claims.sub.as_deref(), Some("u-1"));
        assert_eq!(claims.roles, vec!["user".to_string()]);
        assert!(!claims.is_expired_at(Utc::now()));
    }

    #[test]
    fn test_decode_reads_camel_case_claims() {
        let token = token_with(&json!({
            "sub": "u-1",
            "email": "ann@example.com",
            "displayName": "Ann",
            "sessionId": "s-9",
            "iat": 1_700_000_000,
            "exp": 1_700_003_600
        }));
        let claims = decode_token_claims(&token).unwrap();

        assert_eq!(claims.display_name.as_deref(), Some("Ann"));
        assert_eq!(claims.session_id.as_deref(), Some("s-9"));
        assert_eq!(claims.exp, Some(1_700_003_600.0));
    }
}
