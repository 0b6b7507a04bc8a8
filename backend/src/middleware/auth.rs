//! Authentication middleware
//!
//! JWT bearer authentication and role guards

use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use shared::Role;
use uuid::Uuid;

use crate::error::{error_envelope, AppError, AppResult, ErrorResponse};
use crate::services::auth::{decode_token, TokenKind};

/// Authenticated user information extracted from JWT
#[derive(Clone, Copy, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }
}

/// Guard for operations restricted to some roles
pub fn require_any_role(user: &AuthUser, roles: &[Role]) -> AppResult<()> {
    if user.has_any_role(roles) {
        Ok(())
    } else {
        Err(AppError::InsufficientPermissions)
    }
}

/// Secret used by the middleware, which runs without application state
fn jwt_secret() -> String {
    std::env::var("WMS__JWT__SECRET")
        .or_else(|_| std::env::var("WMS_JWT_SECRET"))
        .unwrap_or_else(|_| "development-secret-key".to_string())
}

/// Authentication middleware that validates access tokens
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => token,
        None => return unauthorized_response("Missing or invalid Authorization header"),
    };

    let claims = match decode_token(token, &jwt_secret(), TokenKind::Access) {
        Ok(claims) => claims,
        Err(AppError::TokenExpired) => return AppError::TokenExpired.into_response(),
        Err(_) => return unauthorized_response("Invalid token"),
    };

    let user_id = match Uuid::parse_str(&claims.sub) {
        Ok(id) => id,
        Err(_) => return unauthorized_response("Invalid user ID in token"),
    };

    request.extensions_mut().insert(AuthUser {
        user_id,
        role: claims.role,
    });

    next.run(request).await
}

fn unauthorized_response(message: &str) -> Response {
    let body = error_envelope(
        StatusCode::UNAUTHORIZED,
        "UNAUTHORIZED",
        "Vui lòng đăng nhập".to_string(),
        message.to_string(),
        None,
    );
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

/// Extractor for the authenticated user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .map(CurrentUser)
            .ok_or_else(|| {
                let body = error_envelope(
                    StatusCode::UNAUTHORIZED,
                    "UNAUTHORIZED",
                    "Vui lòng đăng nhập".to_string(),
                    "Authentication required".to_string(),
                    None,
                );
                (StatusCode::UNAUTHORIZED, Json(body))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request as HttpRequest, routing::get, Router};
    use tower::ServiceExt;

    fn keeper() -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            role: Role::WarehouseKeeper,
        }
    }

    #[test]
    fn test_require_any_role() {
        let user = keeper();
        assert!(require_any_role(&user, &[Role::WarehouseKeeper, Role::Admin]).is_ok());
        assert!(matches!(
            require_any_role(&user, &[Role::Admin]),
            Err(AppError::InsufficientPermissions)
        ));
    }

    #[test]
    fn test_missing_header_is_rejected() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .route_layer(axum::middleware::from_fn(auth_middleware));

        let response = tokio_test::block_on(
            app.oneshot(HttpRequest::builder().uri("/").body(Body::empty()).unwrap()),
        )
        .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
