//! Optional authentication for the HTTP endpoints.
//!
//! By default the server is open to anyone on the network, which is what the
//! phone automation expects. Setting the `BRIGHTSYNC_TOKEN` environment
//! variable turns on token checks. They are an optional extra and not part of
//! the request format Shortcuts sends: with a token set, the automation's URL
//! must carry it as well.
//!
//! The token can be passed either way:
//! - query parameter: `http://laptop.local:5000/brightness?token=secret`
//! - header: `Authorization: Bearer secret`

use std::collections::HashMap;

/// Environment variable holding the expected token.
pub const TOKEN_ENV_VAR: &str = "BRIGHTSYNC_TOKEN";

/// Authentication error returned when token validation fails.
#[derive(Debug, Clone)]
pub struct AuthError {
    /// Error message
    pub message: &'static str,
}

impl AuthError {
    /// Create a new auth error.
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AuthError {}

/// Token presented by a client, if any.
#[derive(Debug, Clone, Default)]
pub struct TokenAuth {
    /// The token from the query string or Authorization header
    pub token: Option<String>,
}

impl TokenAuth {
    /// Create a new TokenAuth with the given token.
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }

    /// Validate the token against an expected value.
    pub fn validate(&self, expected: &str) -> Result<(), AuthError> {
        match &self.token {
            Some(token) if token == expected => Ok(()),
            Some(_) => Err(AuthError::new("Invalid token")),
            None => Err(AuthError::new("Missing token")),
        }
    }

    /// Validate against an environment variable.
    ///
    /// If the variable is unset or empty every request is allowed.
    pub fn validate_env(&self, env_var: &str) -> Result<(), AuthError> {
        match std::env::var(env_var) {
            Ok(expected) if !expected.is_empty() => self.validate(&expected),
            _ => Ok(()),
        }
    }

    /// Extract the `token` parameter from a query string.
    pub fn from_query_string(query: &str) -> Self {
        let params: HashMap<_, _> = form_urlencoded::parse(query.as_bytes()).collect();
        Self {
            token: params.get("token").map(|s| s.to_string()),
        }
    }

    /// Extract a bearer token from an `Authorization` header value.
    pub fn from_authorization(value: &str) -> Self {
        let token = value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        Self { token }
    }

    /// Prefer the header token, fall back to the query token.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        if self.token.is_some() {
            self
        } else {
            other
        }
    }
}

#[cfg(feature = "axum")]
mod axum_impl {
    use super::*;
    use axum::extract::FromRequestParts;
    use axum::http::request::Parts;
    use axum::http::{header, StatusCode};

    /// Axum extractor for TokenAuth.
    ///
    /// Reads `Authorization: Bearer ...` first, then the `token` query parameter.
    impl<S> FromRequestParts<S> for TokenAuth
    where
        S: Send + Sync,
    {
        type Rejection = (StatusCode, &'static str);

        async fn from_request_parts(
            parts: &mut Parts,
            _state: &S,
        ) -> Result<Self, Self::Rejection> {
            let from_header = parts
                .headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(TokenAuth::from_authorization)
                .unwrap_or_default();
            let from_query = parts
                .uri
                .query()
                .map(TokenAuth::from_query_string)
                .unwrap_or_default();

            Ok(from_header.or(from_query))
        }
    }
}
