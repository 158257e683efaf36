use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

pub const USER_ID_HEADER: &str = "x-user-id";

/// Per-request session context.
///
/// The client holds a bare user identifier (set by out-of-scope tooling) and
/// sends it in the `x-user-id` header. Absence is a valid state: an
/// anonymous visitor has no order history and cannot place an order.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub user_id: Option<String>,
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(Session { user_id })
    }
}
