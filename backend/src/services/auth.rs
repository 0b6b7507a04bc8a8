//! Authentication service: login and token management

use bcrypt::verify;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use shared::{Role, User};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::repositories::users;

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub kind: TokenKind,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshInput {
    pub refresh_token: String,
}

/// Authentication tokens
#[derive(Debug, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Decode a token and check that it is of the expected kind
pub fn decode_token(token: &str, secret: &str, kind: TokenKind) -> AppResult<Claims> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::TokenExpired,
        _ => AppError::InvalidToken,
    })?;

    if claims.kind != kind {
        return Err(AppError::InvalidToken);
    }
    Ok(claims)
}

impl AuthService {
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
            refresh_token_expiry: config.jwt.refresh_token_expiry,
        }
    }

    /// Verify the password and issue a token pair
    pub async fn login(&self, input: LoginInput) -> AppResult<AuthTokens> {
        input.validate()?;

        let mut conn = self.db.acquire().await?;
        let credentials = users::find_credentials(&mut conn, &input.username)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !credentials.is_active {
            return Err(AppError::Unauthorized {
                message: "Account is disabled".to_string(),
                message_vi: "Tài khoản đã bị khóa".to_string(),
            });
        }

        let valid = verify(&input.password, &credentials.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if !valid {
            tracing::warn!(username = %input.username, "login failed");
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!(user_id = %credentials.id, role = %credentials.role, "user logged in");
        self.issue_tokens(credentials.id, credentials.role)
    }

    /// Exchange a refresh token for a new pair; the role is re-read from the database
    pub async fn refresh(&self, input: RefreshInput) -> AppResult<AuthTokens> {
        let claims = decode_token(&input.refresh_token, &self.jwt_secret, TokenKind::Refresh)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidToken)?;

        let mut conn = self.db.acquire().await?;
        let user = users::find_by_id(&mut conn, user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::InvalidToken)?;

        self.issue_tokens(user.id, user.role)
    }

    pub async fn me(&self, user_id: Uuid) -> AppResult<User> {
        let mut conn = self.db.acquire().await?;
        users::find_by_id(&mut conn, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User", "người dùng"))
    }

    fn issue_tokens(&self, user_id: Uuid, role: Role) -> AppResult<AuthTokens> {
        Ok(AuthTokens {
            access_token: self.sign(user_id, role, TokenKind::Access, self.access_token_expiry)?,
            refresh_token: self.sign(user_id, role, TokenKind::Refresh, self.refresh_token_expiry)?,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
        })
    }

    fn sign(&self, user_id: Uuid, role: Role, kind: TokenKind, expiry: i64) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            kind,
            exp: (now + Duration::seconds(expiry)).timestamp(),
            iat: now.timestamp(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token encoding failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(kind: TokenKind, exp_offset: i64) -> String {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            role: Role::SalesManager,
            kind,
            exp: now + exp_offset,
            iat: now,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap()
    }

    #[test]
    fn test_decode_access_token() {
        let claims = decode_token(&token(TokenKind::Access, 60), "secret", TokenKind::Access).unwrap();
        assert_eq!(claims.role, Role::SalesManager);
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let result = decode_token(&token(TokenKind::Refresh, 60), "secret", TokenKind::Access);
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_expired_token() {
        let result = decode_token(&token(TokenKind::Access, -3600), "secret", TokenKind::Access);
        assert!(matches!(result, Err(AppError::TokenExpired)));
    }

    #[test]
    fn test_wrong_secret() {
        let result = decode_token(&token(TokenKind::Access, 60), "other", TokenKind::Access);
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }
}
