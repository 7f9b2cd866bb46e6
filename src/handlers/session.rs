use crate::AppState;
use axum::{
    extract::FromRequestParts,
    http::{header::COOKIE, request::Parts},
};
use tracing::debug;
use uuid::Uuid;

/// Opaque session identifier correlating requests to a cart.
///
/// Read from the configured session cookie; when the cookie is absent a
/// per-request `temp_…` id is generated, which makes cart persistence
/// best-effort for cookie-less clients.
#[derive(Debug, Clone)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait::async_trait]
impl FromRequestParts<AppState> for SessionId {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookie_name = state.config.session_cookie.as_str();

        for header in parts.headers.get_all(COOKIE) {
            let Ok(raw) = header.to_str() else { continue };
            for pair in raw.split(';') {
                if let Some((name, value)) = pair.trim().split_once('=') {
                    if name == cookie_name && !value.is_empty() {
                        return Ok(SessionId(value.to_string()));
                    }
                }
            }
        }

        let temp = format!("temp_{}", Uuid::new_v4());
        debug!("No session cookie present; using temporary session id");
        Ok(SessionId(temp))
    }
}
