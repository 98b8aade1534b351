//! `AuthUser` extractor: reads the identity forwarded by the authenticating
//! gateway and injects it as a [`RequestContext`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use cloudvault_core::error::AppError;
use cloudvault_core::types::UserId;
use cloudvault_service::context::RequestContext;

use crate::error::ApiError;

/// Header carrying the authenticated user's ID.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying `true`/`1` for administrators.
pub const USER_ADMIN_HEADER: &str = "x-user-admin";

/// Extracted authenticated user context available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub RequestContext);

impl AuthUser {
    /// Returns the inner `RequestContext`.
    pub fn context(&self) -> &RequestContext {
        &self.0
    }
}

impl std::ops::Deref for AuthUser {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::authentication("Missing X-User-Id header"))?;

        let user_id = raw_id
            .trim()
            .parse::<UserId>()
            .map_err(|_| AppError::authentication("Invalid X-User-Id header"))?;

        let is_admin = parts
            .headers
            .get(USER_ADMIN_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1"));

        let ctx = if is_admin {
            RequestContext::admin(user_id)
        } else {
            RequestContext::new(user_id)
        };
        Ok(AuthUser(ctx))
    }
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use tower::ServiceExt;

    use super::*;

    async fn whoami(auth: AuthUser) -> String {
        format!("{} {}", auth.user_id, auth.is_admin())
    }

    async fn call(headers: &[(&str, &str)]) -> (StatusCode, String) {
        let mut req = Request::builder().uri("/whoami");
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        let response = Router::new()
            .route("/whoami", get(whoami))
            .oneshot(req.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_identity_headers() {
        let id = UserId::new();

        let (status, body) = call(&[(USER_ID_HEADER, &id.to_string())]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, format!("{id} false"));

        let (_, body) = call(&[(USER_ID_HEADER, &id.to_string()), (USER_ADMIN_HEADER, "TRUE")]).await;
        assert_eq!(body, format!("{id} true"));
    }

    #[tokio::test]
    async fn test_missing_or_bad_identity() {
        let (status, body) = call(&[]).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("UNAUTHORIZED"));

        let (status, _) = call(&[(USER_ID_HEADER, "not-a-uuid")]).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
