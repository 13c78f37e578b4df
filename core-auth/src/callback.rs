//! Authorization URL construction and redirect callback parsing.
//!
//! The backend performs the real OAuth exchange. The client only opens
//! `<backend>/auth/google?callback_scheme=<scheme>` and reads the
//! custom-scheme redirect the backend finishes on:
//!
//! - `<scheme>://...?token=<credential>` carries the credential itself
//! - `<scheme>://...?status=success` reports a server-side session
//!
//! A non-empty `token` wins over `status`. Anything else is malformed.

use crate::error::{AuthError, Result};
use crate::types::{CallbackOutcome, Credential};
use url::Url;

const AUTH_PATH: &str = "auth/google";

/// Builds the backend authorization URL for `callback_scheme`.
pub fn build_authorization_url(backend_base_url: &str, callback_scheme: &str) -> Result<Url> {
    let base = format!("{}/", backend_base_url.trim_end_matches('/'));
    let mut url = Url::parse(&base)
        .and_then(|base| base.join(AUTH_PATH))
        .map_err(|e| {
            AuthError::InvalidConfiguration(format!(
                "Backend URL '{}' is invalid: {}",
                backend_base_url, e
            ))
        })?;

    url.query_pairs_mut()
        .append_pair("callback_scheme", callback_scheme);

    Ok(url)
}

/// Interprets the redirect URI the browser session ended on.
pub fn parse_callback(callback_uri: &str, expected_scheme: &str) -> Result<CallbackOutcome> {
    let url = Url::parse(callback_uri).map_err(|e| AuthError::CallbackMalformed {
        reason: format!("callback is not a valid URI: {}", e),
    })?;

    if !url.scheme().eq_ignore_ascii_case(expected_scheme) {
        return Err(AuthError::CallbackMalformed {
            reason: format!(
                "unexpected callback scheme '{}', expected '{}'",
                url.scheme(),
                expected_scheme
            ),
        });
    }

    let mut token = None;
    let mut status = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "token" if token.is_none() => token = Credential::new(value.into_owned()),
            "status" if status.is_none() => status = Some(value.into_owned()),
            "error" if error.is_none() => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(credential) = token {
        return Ok(CallbackOutcome::Token(credential));
    }

    if status.as_deref() == Some("success") {
        return Ok(CallbackOutcome::SessionEstablished);
    }

    let reason = match (error, status) {
        (Some(error), _) => format!("backend reported error '{}'", error),
        (None, Some(status)) => format!("unexpected status '{}' and no token", status),
        (None, None) => "neither token nor status=success present".to_string(),
    };
    Err(AuthError::CallbackMalformed { reason })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_url() {
        let url = build_authorization_url("http://localhost:8000", "scoutapp").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/auth/google?callback_scheme=scoutapp"
        );

        let url = build_authorization_url("https://api.example.com/v1/", "scoutapp").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/v1/auth/google?callback_scheme=scoutapp"
        );
    }

    #[test]
    fn test_authorization_url_rejects_garbage_base() {
        assert!(matches!(
            build_authorization_url("not a url", "scoutapp"),
            Err(AuthError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_token_callback_yields_credential() {
        for (uri, expected) in [
            ("scoutapp://auth?token=T", "T"),
            ("scoutapp://callback?token=ya29.a0AfH6&status=success", "ya29.a0AfH6"),
            ("scoutapp:?token=abc%2Fdef", "abc/def"),
            ("SCOUTAPP://auth?token=x", "x"),
        ] {
            match parse_callback(uri, "scoutapp").unwrap() {
                CallbackOutcome::Token(credential) => assert_eq!(credential.expose(), expected),
                other => panic!("{} parsed as {:?}", uri, other),
            }
        }
    }

    #[test]
    fn test_status_success_without_token() {
        assert_eq!(
            parse_callback("scoutapp://auth?status=success", "scoutapp").unwrap(),
            CallbackOutcome::SessionEstablished
        );
        // An empty token counts as absent
        assert_eq!(
            parse_callback("scoutapp://auth?token=&status=success", "scoutapp").unwrap(),
            CallbackOutcome::SessionEstablished
        );
    }

    #[test]
    fn test_malformed_callbacks() {
        for uri in [
            "scoutapp://auth",
            "scoutapp://auth?status=failed",
            "scoutapp://auth?token=",
            "scoutapp://auth?error=access_denied",
            "otherapp://auth?token=T",
            "::not a uri::",
        ] {
            let err = parse_callback(uri, "scoutapp").unwrap_err();
            assert!(
                matches!(err, AuthError::CallbackMalformed { .. }),
                "{} gave {:?}",
                uri,
                err
            );
        }
    }

    #[test]
    fn test_error_parameter_is_reported() {
        let err = parse_callback("scoutapp://auth?error=access_denied", "scoutapp").unwrap_err();
        assert!(err.to_string().contains("access_denied"));
    }
}
