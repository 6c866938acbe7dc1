use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;
use uuid::Uuid;

use serde_json::json;
use shared_models::auth::{JwtClaims, User, UserRole};

type HmacSha256 = Hmac<Sha256>;

/// Sessions last one day. Clients are expected to re-authenticate after that.
pub const TOKEN_TTL_HOURS: i64 = 24;

pub fn validate_token(token: &str, jwt_secret: &str) -> Result<User, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    // Split token into parts
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid token format".to_string());
    }

    let header_b64 = parts[0];
    let claims_b64 = parts[1];
    let signature_b64 = parts[2];

    let signature = match URL_SAFE_NO_PAD.decode(signature_b64) {
        Ok(sig) => sig,
        Err(e) => {
            debug!("Failed to decode signature: {}", e);
            return Err("Invalid signature encoding".to_string());
        }
    };

    let signature_string = format!("{}.{}", header_b64, claims_b64);

    let mut mac = match HmacSha256::new_from_slice(jwt_secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return Err("Failed to create HMAC".to_string()),
    };

    mac.update(signature_string.as_bytes());

    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err("Invalid token signature".to_string());
    }

    // Decode claims
    let claims_json = match URL_SAFE_NO_PAD.decode(claims_b64) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(json_str) => json_str,
            Err(_) => return Err("Invalid claims encoding".to_string()),
        },
        Err(_) => return Err("Invalid claims encoding".to_string()),
    };

    let claims: JwtClaims = match serde_json::from_str(&claims_json) {
        Ok(c) => c,
        Err(e) => {
            debug!("Failed to parse claims: {}", e);
            return Err("Invalid claims format".to_string());
        }
    };

    // Check expiration
    let now = Utc::now().timestamp() as u64;
    if claims.exp < now {
        debug!("Token expired at {} (now: {})", claims.exp, now);
        return Err("Token expired".to_string());
    }

    let id = Uuid::parse_str(&claims.sub).map_err(|_| "Invalid subject claim".to_string())?;

    let user = User {
        id,
        email: claims.email,
        role: claims.role,
    };

    debug!("Token validated successfully for user: {}", user.id);
    Ok(user)
}

/// Signs a fresh HS256 token for the given user. Returns the compact token
/// and its expiry as a unix timestamp.
pub fn issue_token(
    user_id: Uuid,
    email: &str,
    role: UserRole,
    jwt_secret: &str,
) -> Result<(String, u64), String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let now = Utc::now();
    let exp = now + Duration::hours(TOKEN_TTL_HOURS);

    let header = json!({
        "alg": "HS256",
        "typ": "JWT"
    });

    let payload = json!({
        "sub": user_id.to_string(),
        "email": email,
        "role": role,
        "iat": now.timestamp(),
        "exp": exp.timestamp()
    });

    let header_encoded = URL_SAFE_NO_PAD.encode(header.to_string());
    let payload_encoded = URL_SAFE_NO_PAD.encode(payload.to_string());
    let signing_input = format!("{}.{}", header_encoded, payload_encoded);

    let mut mac = HmacSha256::new_from_slice(jwt_secret.as_bytes())
        .map_err(|_| "Failed to create HMAC".to_string())?;
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok((
        format!("{}.{}", signing_input, signature),
        exp.timestamp() as u64,
    ))
}
