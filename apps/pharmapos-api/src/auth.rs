//! # Authentication
//!
//! Password hashing, JWT access tokens and the extractors that guard routes.
//!
//! ## Request Flow
//! ```text
//! POST /auth/login {username, password}
//!      │  argon2 verify against users.password_hash
//!      ▼
//! { token, tokenType: "Bearer", expiresIn, user }
//!
//! GET /products   Authorization: Bearer <token>
//!      │
//!      ▼
//! AuthUser extractor ── missing / bad / expired ──► 401
//!      │  reload users row by `sub` ── deleted ───► 401
//!      │
//! AdminUser extractor ── stored role != Admin ────► 403
//!      │
//!      ▼
//! handler
//! ```
//!
//! Username and role come from the users table on every request, so a
//! demotion or deletion takes effect before the token expires.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use pharmapos_core::{User, UserRole};
use pharmapos_db::{Database, DbError};

// =============================================================================
// Tokens
// =============================================================================

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    pub username: String,

    pub role: UserRole,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// JWT token manager (HS256).
pub struct JwtManager {
    secret: String,
    lifetime_secs: i64,
}

impl JwtManager {
    pub fn new(secret: String, lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            lifetime_secs,
        }
    }

    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }

    /// Issues an access token for `user`.
    pub fn issue(&self, user: &User) -> ApiResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.lifetime_secs)).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::internal(format!("Failed to generate token: {}", e)))
    }

    /// Validates signature and expiry, returning the claims.
    pub fn validate(&self, token: &str) -> ApiResult<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            debug!(error = %e, "Rejected token");
            ApiError::unauthorized("Invalid or expired token")
        })
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// =============================================================================
// Passwords
// =============================================================================

/// Hashes a password into an argon2 PHC string for storage.
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))
}

/// Checks a password against a stored hash. Malformed hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Accounts created on first start.
pub const DEFAULT_USERS: &[(&str, &str, UserRole)] = &[
    ("admin", "adminpass", UserRole::Admin),
    ("pharmacist", "pharmpass", UserRole::Pharmacist),
    ("cashier", "cashpass", UserRole::Cashier),
];

/// Creates [`DEFAULT_USERS`] when there are no accounts yet.
///
/// Returns how many accounts were created.
pub async fn seed_default_users(db: &Database) -> ApiResult<usize> {
    if db.users().count().await? > 0 {
        return Ok(0);
    }
    for (username, password, role) in DEFAULT_USERS {
        let hash = hash_password(password)?;
        db.users().create(username, &hash, *role).await?;
    }
    info!(count = DEFAULT_USERS.len(), "Seeded default user accounts");
    Ok(DEFAULT_USERS.len())
}

// =============================================================================
// Extractors
// =============================================================================

/// The caller: the account named by a valid bearer token, as stored now.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
    pub role: UserRole,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;

        let token = extract_bearer_token(header)
            .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;

        let claims = state.jwt.validate(token)?;
        let user = match state.db.users().get(&claims.sub).await {
            Ok(user) => user,
            Err(DbError::NotFound { .. }) => {
                debug!(sub = %claims.sub, jti = %claims.jti, "Token for a removed account");
                return Err(ApiError::unauthorized("Invalid or expired token"));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(AuthUser {
            id: user.id,
            username: user.username,
            role: user.role,
        })
    }
}

/// An authenticated caller with the Admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != UserRole::Admin {
            return Err(ApiError::forbidden("Admin role required"));
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole) -> User {
        User {
            id: "u-1".into(),
            username: "maria".into(),
            password_hash: String::new(),
            role,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_token_roundtrip() {
        let jwt = JwtManager::new("test-secret".into(), 3600);
        let token = jwt.issue(&user(UserRole::Pharmacist)).unwrap();
        let claims = jwt.validate(&token).unwrap();
        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.username, "maria");
        assert_eq!(claims.role, UserRole::Pharmacist);
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let token = JwtManager::new("a".into(), 3600)
            .issue(&user(UserRole::Admin))
            .unwrap();
        let err = JwtManager::new("b".into(), 3600).validate(&token).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_expired_token_rejected() {
        // default validation allows 60s leeway
        let jwt = JwtManager::new("s".into(), -120);
        let token = jwt.issue(&user(UserRole::Cashier)).unwrap();
        assert!(jwt.validate(&token).is_err());
    }

    #[test]
    fn test_password_hashing() {
        let hash = hash_password("cashpass").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("cashpass", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("cashpass", "not-a-hash"));
    }

    #[test]
    fn test_bearer_parsing() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }
}
