//! Shared-password sessions.
//!
//! A single password (from configuration) gates the mutating endpoints. Signing
//! in with it yields a token of the form `<expiry>.<mac>`:
//!
//! ```text
//! expiry = unix seconds when the token stops being valid (now + 8h)
//! mac    = hex(HMAC-SHA256(key = password, "<sha256(password)>:<expiry>"))
//! ```
//!
//! The password keys the MAC and its hash is part of the signed payload, so
//! changing the password invalidates every outstanding token.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Token lifetime in seconds.
pub const TOKEN_TTL_SECS: i64 = 8 * 60 * 60;

/// Name of the cookie carrying the token.
pub const TOKEN_COOKIE: &str = "token";

pub fn password_hash(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Whether `candidate` is the configured password. An empty candidate never is.
///
/// Both sides are compared as HMAC tags so the check runs in constant time.
pub fn check_password(candidate: &str, configured: &str) -> bool {
    if candidate.is_empty() {
        return false;
    }
    let Ok(mut mac) = HmacSha256::new_from_slice(configured.as_bytes()) else {
        return false;
    };
    mac.update(configured.as_bytes());
    let expected = mac.finalize().into_bytes();

    let Ok(mut mac) = HmacSha256::new_from_slice(configured.as_bytes()) else {
        return false;
    };
    mac.update(candidate.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

pub fn issue_token(password: &str, now: DateTime<Utc>) -> Option<String> {
    let expires = now.timestamp() + TOKEN_TTL_SECS;
    let mac = signer(password, expires)?;
    Some(format!("{expires}.{}", hex::encode(mac.finalize().into_bytes())))
}

pub fn verify_token(token: &str, password: &str, now: DateTime<Utc>) -> bool {
    if token.is_empty() || password.is_empty() {
        return false;
    }
    let Some((expires, signature)) = token.split_once('.') else {
        return false;
    };
    let Ok(expires) = expires.parse::<i64>() else {
        return false;
    };
    let Ok(signature) = hex::decode(signature) else {
        return false;
    };
    if expires <= now.timestamp() {
        return false;
    }
    signer(password, expires).is_some_and(|mac| mac.verify_slice(&signature).is_ok())
}

/// Extract the session token from a raw `Cookie` header value.
pub fn token_from_cookie_header(header: &str) -> Option<&str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, value)| value)
}

/// MAC over the signed payload for `expires`, ready to finalize or verify.
fn signer(password: &str, expires: i64) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(password.as_bytes()).ok()?;
    mac.update(format!("{}:{expires}", password_hash(password)).as_bytes());
    Some(mac)
}
