//! Registration, login, and bearer-token authentication.
//!
//! Passwords are stored as salted argon2 hashes.  Sessions are stateless:
//! a signed HS256 token carries the user's id, email, and role, and every
//! data route revalidates it through the [`AuthUser`] extractor.

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::info;

use homestash_store::{Role, StoreError, User};

use crate::api::AppState;
use crate::error::ApiError;

/// Minimum accepted password length, in characters.
const MIN_PASSWORD_LEN: usize = 6;

// ---------------------------------------------------------------------------
// Password hashing
// ---------------------------------------------------------------------------

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("failed to hash password: {e}")))
}

/// Check a password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Session tokens
// ---------------------------------------------------------------------------

/// Claims carried by a session token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User id.
    sub: i64,
    email: String,
    role: Role,
    /// Issued-at (unix seconds).
    iat: i64,
    /// Expiry (unix seconds).
    exp: i64,
}

/// HS256 signing and verification keys, derived once from the configured
/// secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a signed token for the user, valid for `ttl_days`.
    pub fn issue(&self, user: &User, ttl_days: i64) -> Result<String, ApiError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + Duration::days(ttl_days)).timestamp(),
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("failed to sign token: {e}")))
    }

    /// Validate signature and expiry, returning the authenticated identity.
    pub fn decode(&self, token: &str) -> Result<AuthUser, ApiError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;
        Ok(AuthUser {
            id: data.claims.sub,
            role: data.claims.role,
        })
    }
}

/// The identity decoded from a request's bearer token.  The token also
/// carries the email, but downstream handlers only ever act on id and role.
///
/// This extractor is what gates the API: a handler taking an `AuthUser`
/// argument rejects unauthenticated requests with 401 before running.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: i64,
    pub role: Role,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(missing_token)?;

        let token = header.strip_prefix("Bearer ").ok_or_else(missing_token)?;

        let auth = state.token_keys.decode(token)?;
        tracing::debug!(user = auth.id, role = ?auth.role, "authenticated request");
        Ok(auth)
    }
}

fn missing_token() -> ApiError {
    ApiError::Unauthorized("Missing authorization token".to_string())
}

/// The one message both login failure modes share, so responses do not
/// reveal which accounts exist.
fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid email or password".to_string())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    user: User,
    token: String,
}

#[derive(Serialize)]
pub struct MeResponse {
    user: User,
}

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    if req.name.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::InvalidInput(
            "Name, email, and password are required".to_string(),
        ));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::InvalidInput(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let password_hash = hash_password(&req.password)?;

    let user = {
        let mut db = state.db.lock().await;
        db.create_user(&req.name, &req.email, &password_hash)
            .map_err(|e| match e {
                StoreError::Constraint(_) => {
                    ApiError::Conflict("User with this email already exists".to_string())
                }
                other => ApiError::from(other),
            })?
    };

    info!(user = user.id, role = ?user.role, "registered user");

    let token = state.token_keys.issue(&user, state.config.token_ttl_days)?;
    Ok((StatusCode::CREATED, Json(AuthResponse { user, token })))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::InvalidInput(
            "Email and password are required".to_string(),
        ));
    }

    let user = {
        let db = state.db.lock().await;
        db.get_user_by_email(&req.email)?
    };

    let user = user.ok_or_else(invalid_credentials)?;
    if !verify_password(&req.password, &user.password_hash) {
        return Err(invalid_credentials());
    }

    let token = state.token_keys.issue(&user, state.config.token_ttl_days)?;
    Ok(Json(AuthResponse { user, token }))
}

/// `GET /api/auth/me`
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<MeResponse>, ApiError> {
    let db = state.db.lock().await;
    let user = db.get_user(auth.id).map_err(|e| match e {
        // A valid token for a deleted account is still not a session.
        StoreError::NotFound => ApiError::Unauthorized("Account no longer exists".to_string()),
        other => ApiError::from(other),
    })?;
    Ok(Json(MeResponse { user }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_user() -> User {
        User {
            id: 7,
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "unused".to_string(),
            role: Role::Admin,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert_ne!(hash, "correct horse");
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn hashing_twice_yields_different_salts() {
        let first = hash_password("secret-1").unwrap();
        let second = hash_password("secret-1").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("secret-1", &second));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn token_round_trip() {
        let keys = TokenKeys::new("test-secret");
        let user = test_user();

        let token = keys.issue(&user, 7).unwrap();
        let decoded = keys.decode(&token).unwrap();

        assert_eq!(decoded.id, user.id);
        assert_eq!(decoded.role, Role::Admin);
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let keys = TokenKeys::new("test-secret");
        let other = TokenKeys::new("different-secret");
        let token = other.issue(&test_user(), 7).unwrap();

        assert!(matches!(
            keys.decode(&token),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = TokenKeys::new("test-secret");
        // Issued with a negative TTL: expired a full day ago, well past any
        // validation leeway.
        let token = keys.issue(&test_user(), -1).unwrap();

        assert!(matches!(
            keys.decode(&token),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let keys = TokenKeys::new("test-secret");
        let mut token = keys.issue(&test_user(), 7).unwrap();
        token.push('x');

        assert!(matches!(
            keys.decode(&token),
            Err(ApiError::Unauthorized(_))
        ));
    }
}
