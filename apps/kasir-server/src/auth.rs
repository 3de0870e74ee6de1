//! # Session Authentication
//!
//! Passwords are stored as Argon2 PHC strings. A successful login issues an
//! HS256 JWT that travels either in the `kasir_session` cookie (browser) or
//! an `Authorization: Bearer` header (scripts, tests).
//!
//! ```text
//! POST /api/auth/login ──► verify_password ──► SessionManager::issue
//!                                                    │
//!                          Set-Cookie: kasir_session=<jwt>; HttpOnly; SameSite=Lax
//!                                                    │
//! GET /api/... ──► AuthUser extractor ──► SessionManager::verify ──► handler
//!                      │
//!                      └── missing / invalid / expired ──► 401 UNAUTHORIZED
//! ```

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use kasir_core::{Role, User};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "kasir_session";

// =============================================================================
// Passwords
// =============================================================================

/// Hashes a password for storage.
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))
}

/// Verifies a password against its stored hash. A malformed hash never
/// verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

// =============================================================================
// Session Tokens
// =============================================================================

/// JWT claims carried by a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    pub username: String,
    pub name: String,
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Issues and verifies session tokens, and renders the session cookie.
pub struct SessionManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
    cookie_secure: bool,
}

impl SessionManager {
    pub fn new(secret: &str, ttl_secs: i64, cookie_secure: bool) -> Self {
        SessionManager {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
            cookie_secure,
        }
    }

    pub fn issue(&self, user: &User) -> ApiResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            name: user.name.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.ttl_secs)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ApiError::internal(format!("Failed to sign session: {}", e)))
    }

    /// Decodes a token, checking signature and expiry.
    pub fn verify(&self, token: &str) -> ApiResult<Claims> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Rejected session token");
                ApiError::unauthorized()
            })
    }

    /// `Set-Cookie` value carrying `token`.
    pub fn session_cookie(&self, token: &str) -> String {
        self.cookie(token, self.ttl_secs)
    }

    /// `Set-Cookie` value that removes the session.
    pub fn expired_cookie(&self) -> String {
        self.cookie("", 0)
    }

    fn cookie(&self, value: &str, max_age: i64) -> String {
        let mut cookie = format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
            SESSION_COOKIE, value, max_age
        );
        if self.cookie_secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Session token from the `Authorization` header, falling back to the cookie.
fn session_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token)
        .filter(|token| !token.is_empty())
}

// =============================================================================
// Extractor
// =============================================================================

/// The logged-in user, extracted from the session.
///
/// Adding it to a handler's arguments makes the route require a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
    pub name: String,
    pub role: Role,
}

impl AuthUser {
    /// 403 unless the user holds one of `allowed`.
    pub fn require_role(&self, allowed: &[Role]) -> ApiResult<()> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            debug!(user = %self.username, role = self.role.as_str(), "Role not allowed");
            Err(ApiError::forbidden())
        }
    }

    /// Catalogue edits and stock adjustments: ADMIN or MANAGER.
    pub fn require_inventory_manager(&self) -> ApiResult<()> {
        self.require_role(&[Role::Admin, Role::Manager])
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        AuthUser {
            id: claims.sub,
            username: claims.username,
            name: claims.name,
            role: claims.role,
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or_else(ApiError::unauthorized)?;
        let claims = state.sessions.verify(token)?;
        Ok(AuthUser::from(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn user(role: Role) -> User {
        User {
            id: "u-1".to_string(),
            username: "admin".to_string(),
            name: "Admin Toko".to_string(),
            role,
            password_hash: String::new(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_session_roundtrip() {
        let sessions = SessionManager::new("secret", 3600, false);
        let token = sessions.issue(&user(Role::Manager)).unwrap();

        let claims = sessions.verify(&token).unwrap();
        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.role, Role::Manager);
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let token = SessionManager::new("one", 3600, false)
            .issue(&user(Role::Admin))
            .unwrap();
        assert!(SessionManager::new("two", 3600, false).verify(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        // Past the default 60 second leeway
        let token = SessionManager::new("secret", -120, false)
            .issue(&user(Role::Admin))
            .unwrap();
        assert!(SessionManager::new("secret", 3600, false).verify(&token).is_err());
    }

    #[test]
    fn test_cookie_attributes() {
        let sessions = SessionManager::new("secret", 3600, true);
        let cookie = sessions.session_cookie("abc");
        assert!(cookie.starts_with("kasir_session=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(cookie.ends_with("; Secure"));

        assert!(sessions.expired_cookie().contains("Max-Age=0"));
    }

    #[test]
    fn test_session_token_sources() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);

        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; kasir_session=from-cookie"));
        assert_eq!(session_token(&headers), Some("from-cookie"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(session_token(&headers), Some("from-header"));
    }

    #[test]
    fn test_password_hashing() {
        let hash = hash_password("rahasia123").unwrap();
        assert!(verify_password("rahasia123", &hash));
        assert!(!verify_password("salah", &hash));
        assert!(!verify_password("rahasia123", "not-a-hash"));
    }

    #[test]
    fn test_require_role() {
        let cashier = AuthUser::from(Claims {
            sub: "u-2".to_string(),
            username: "kasir1".to_string(),
            name: "Siti".to_string(),
            role: Role::Cashier,
            iat: 0,
            exp: 0,
        });
        assert!(cashier.require_inventory_manager().is_err());
        assert!(cashier.require_role(&[Role::Cashier]).is_ok());
    }
}
