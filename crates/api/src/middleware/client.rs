//! Client metadata extraction: user agent and best-effort client IP.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;

/// User agent and client IP pulled from request headers.
///
/// The IP is taken from `X-Forwarded-For` (first hop) or `X-Real-IP`,
/// which assumes a trusted reverse proxy in front of the service. Both
/// fields default to empty strings; whether empty metadata is acceptable
/// is decided per operation (registration rejects it, login tolerates it).
#[derive(Debug, Clone)]
pub struct ClientMeta {
    pub user_agent: String,
    pub ip: String,
}

impl<S> FromRequestParts<S> for ClientMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_agent = header_str(parts, "user-agent");

        let ip = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| header_str(parts, "x-real-ip"));

        Ok(ClientMeta { user_agent, ip })
    }
}

fn header_str(parts: &Parts, name: &str) -> String {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
