use thiserror::Error;

use crate::authorize::Reason;

/// Opaque bearer token presented by a client.
///
/// The token is the lookup key into the credential store and must never end
/// up in logs, so `Debug` is redacted and there is no `Display`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for Credential {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingCredential,

    #[error("Invalid Authorization format")]
    MalformedCredential,

    #[error("Invalid API key")]
    UnknownCredential,
}

impl AuthError {
    pub fn reason(&self) -> Reason {
        match self {
            AuthError::MissingCredential => Reason::MissingCredential,
            AuthError::MalformedCredential => Reason::MalformedCredential,
            AuthError::UnknownCredential => Reason::UnknownCredential,
        }
    }
}

const BEARER_SCHEME: &str = "Bearer";

/// Extract the token from an `Authorization` header value.
///
/// Accepts `Bearer <token>`: case-sensitive scheme, at least one whitespace
/// character, then a single run of non-whitespace characters. Whitespace
/// around the whole value is ignored.
pub fn parse_bearer(header: Option<&str>) -> Result<Credential, AuthError> {
    let header = header.ok_or(AuthError::MissingCredential)?;

    let rest = header
        .trim()
        .strip_prefix(BEARER_SCHEME)
        .ok_or(AuthError::MalformedCredential)?;

    if !rest.starts_with(char::is_whitespace) {
        return Err(AuthError::MalformedCredential);
    }

    let token = rest.trim_start();
    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(AuthError::MalformedCredential);
    }

    Ok(Credential::new(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_header_is_missing_credential() {
        assert_eq!(parse_bearer(None), Err(AuthError::MissingCredential));
    }

    #[test]
    fn well_formed_bearer_yields_token() {
        let credential = parse_bearer(Some("Bearer abc123")).unwrap();
        assert_eq!(credential.as_str(), "abc123");

        let credential = parse_bearer(Some("  Bearer \t tok-en.9  ")).unwrap();
        assert_eq!(credential.as_str(), "tok-en.9");
    }

    #[test]
    fn malformed_headers_are_rejected() {
        for header in [
            "",
            "Bearer",
            "Bearer ",
            "bearer abc",
            "BEARER abc",
            "Basic abc",
            "Bearerabc",
            "Bearer abc def",
            "Token Bearer abc",
        ] {
            assert_eq!(
                parse_bearer(Some(header)),
                Err(AuthError::MalformedCredential),
                "header {header:?}"
            );
        }
    }

    #[test]
    fn debug_output_hides_the_token() {
        let credential = Credential::new("super-secret");
        assert!(!format!("{credential:?}").contains("super-secret"));
    }
}
