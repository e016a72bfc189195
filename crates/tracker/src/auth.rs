//! Script-credential authentication against the ShotGrid REST API.

use std::time::{Duration, Instant};

use serde::Deserialize;

/// Tokens are refreshed this long before ShotGrid says they expire.
pub(crate) const REFRESH_MARGIN: Duration = Duration::from_secs(30);

/// Response body of `POST /api/v1/auth/access_token`.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime in seconds.
    pub expires_in: u64,
}

/// A bearer token and the instant it stops being usable.
#[derive(Debug, Clone)]
pub(crate) struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    pub(crate) fn from_response(response: TokenResponse, issued_at: Instant) -> Self {
        let lifetime = Duration::from_secs(response.expires_in).saturating_sub(REFRESH_MARGIN);
        Self {
            value: response.access_token,
            expires_at: issued_at + lifetime,
        }
    }

    /// `true` while the token can still be sent.
    pub(crate) fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }

    pub(crate) fn value(&self) -> &str {
        &self.value
    }
}

/// Form body for the client-credentials grant.
pub(crate) fn credentials_form<'a>(script_name: &'a str, api_key: &'a str) -> [(&'static str, &'a str); 3] {
    [
        ("grant_type", "client_credentials"),
        ("client_id", script_name),
        ("client_secret", api_key),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(expires_in: u64) -> TokenResponse {
        TokenResponse {
            access_token: "abc".to_string(),
            token_type: Some("Bearer".to_string()),
            expires_in,
        }
    }

    #[test]
    fn token_expires_ahead_of_the_server_deadline() {
        let issued = Instant::now();
        let token = AccessToken::from_response(response(600), issued);

        assert!(token.is_fresh(issued + Duration::from_secs(569)));
        assert!(!token.is_fresh(issued + Duration::from_secs(570)));
        assert_eq!(token.value(), "abc");
    }

    #[test]
    fn very_short_lifetimes_are_never_fresh() {
        let issued = Instant::now();
        let token = AccessToken::from_response(response(10), issued);
        assert!(!token.is_fresh(issued));
    }

    #[test]
    fn token_response_decodes() {
        let parsed: TokenResponse = serde_json::from_str(
            r#"{"token_type":"Bearer","access_token":"t0k","expires_in":600,"refresh_token":"r"}"#,
        )
        .unwrap();
        assert_eq!(parsed.access_token, "t0k");
        assert_eq!(parsed.expires_in, 600);
    }

    #[test]
    fn credentials_form_uses_script_name_as_client_id() {
        let form = credentials_form("relay", "secret");
        assert_eq!(form[1], ("client_id", "relay"));
        assert_eq!(form[2], ("client_secret", "secret"));
    }
}
