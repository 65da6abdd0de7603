//! Authentication middleware
//!
//! Verifies the HS256 session JWT issued by the ModelHub login service and
//! attaches the caller's identity to the request. Claims are trusted as
//! signed; there is no user lookup.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{debug, instrument, warn};

use crate::{error::AppError, AppState};

type HmacSha256 = Hmac<Sha256>;

/// Roles allowed to test arbitrary model endpoints
pub const MODEL_TEST_ROLES: &[&str] = &["admin", "developer"];

/// User IDs are numeric in the ModelHub database but some issuers quote them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserId::Number(n) => write!(f, "{}", n),
            UserId::Text(s) => f.write_str(s),
        }
    }
}

/// Session token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: UserId,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub role: String,
    /// Expiry, seconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct JwtHeader {
    alg: String,
}

/// Extract user ID from request
///
/// This struct is used to pass authenticated user info to handlers.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: String,
    pub username: String,
    pub role: String,
}

impl AuthenticatedUser {
    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|role| self.role.eq_ignore_ascii_case(role))
    }
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.id.to_string(),
            username: claims.username,
            role: claims.role,
        }
    }
}

/// Extract the Authorization header and return the bearer token
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Verify an HS256 token and return its claims.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let mut parts = token.split('.');
    let (header_b64, payload_b64, signature_b64) =
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(h), Some(p), Some(s), None) => (h, p, s),
            _ => return Err(AppError::InvalidToken("malformed token".to_string())),
        };

    let header: JwtHeader = decode_segment(header_b64)?;
    if header.alg != "HS256" {
        return Err(AppError::InvalidToken(format!(
            "unsupported algorithm {}",
            header.alg
        )));
    }

    let signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AppError::InvalidToken("malformed signature".to_string()))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid JWT secret: {}", e)))?;
    mac.update(header_b64.as_bytes());
    mac.update(b".");
    mac.update(payload_b64.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| AppError::InvalidToken("signature mismatch".to_string()))?;

    let claims: Claims = decode_segment(payload_b64)?;
    if let Some(exp) = claims.exp {
        if exp <= chrono::Utc::now().timestamp() {
            return Err(AppError::InvalidToken("token expired".to_string()));
        }
    }

    Ok(claims)
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T, AppError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| AppError::InvalidToken("malformed token".to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| AppError::InvalidToken(format!("bad claims: {}", e)))
}

/// Sign claims into an HS256 token.
#[cfg(any(test, feature = "test-utils"))]
pub fn issue_token(claims: &Claims, secret: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).expect("claims serialize"));

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key");
    mac.update(header.as_bytes());
    mac.update(b".");
    mac.update(payload.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    format!("{}.{}.{}", header, payload, signature)
}

/// Authentication middleware
///
/// This middleware:
/// 1. Extracts the JWT from the Authorization header
/// 2. Verifies signature and expiry against `JWT_SECRET`
/// 3. Adds AuthenticatedUser to request extensions
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = extract_bearer_token(auth_header).ok_or(AppError::Unauthorized)?;

    let claims = match verify_token(token, &state.config.jwt_secret) {
        Ok(claims) => claims,
        Err(e) => {
            warn!(error = %e, "JWT verification failed");
            return Err(e);
        }
    };

    let user = AuthenticatedUser::from(claims);
    debug!(user_id = %user.id, role = %user.role, "User authenticated successfully");

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Role gate for model testing; must run after [`auth_middleware`].
pub async fn require_developer(request: Request, next: Next) -> Result<Response, AppError> {
    let allowed = request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|user| user.has_any_role(MODEL_TEST_ROLES))
        .unwrap_or(false);

    if !allowed {
        return Err(AppError::Forbidden);
    }

    Ok(next.run(request).await)
}
