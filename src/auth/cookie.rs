//! Session cookie transport.
//!
//! Binds the signed session token to an HTTP cookie and extracts it from
//! inbound requests. The cookie itself is not signed or encrypted — the
//! token's own signature is the integrity boundary.
//!
//! Cookie format: `auth_token=<jwt>; HttpOnly; SameSite=Lax; Path=/; [Secure]`
//! - `HttpOnly`: not accessible via JavaScript (XSS protection)
//! - `SameSite=Lax`: not sent on cross-site POST (CSRF protection)
//! - `Path=/`: sent for every route on the origin
//! - `Secure`: only over HTTPS (omitted in localhost/non-TLS mode)

use axum::http::HeaderValue;

/// Cookie name for the session token.
pub const SESSION_COOKIE_NAME: &str = "auth_token";

/// Build the `Set-Cookie` header value carrying the session token.
///
/// # Arguments
/// * `token` - The signed session token
/// * `max_age_secs` - Cookie lifetime in seconds (matches the token expiry)
/// * `is_secure` - Whether to add the `Secure` flag (HTTPS deployments)
pub fn build_session_cookie(token: &str, max_age_secs: u64, is_secure: bool) -> HeaderValue {
    let secure_flag = if is_secure { "; Secure" } else { "" };
    let cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
        SESSION_COOKIE_NAME, token, max_age_secs, secure_flag
    );
    // HeaderValue::from_str can fail on non-ASCII, but a JWT is base64url
    HeaderValue::from_str(&cookie).expect("cookie value is valid ASCII")
}

/// Build a `Set-Cookie` header that clears (deletes) the session cookie.
///
/// Used by `POST /auth/logout`. The token string itself stays valid until
/// its expiry — clearing only removes it from the browser.
pub fn build_clear_cookie(is_secure: bool) -> HeaderValue {
    let secure_flag = if is_secure { "; Secure" } else { "" };
    let cookie = format!(
        "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0{}",
        SESSION_COOKIE_NAME, secure_flag
    );
    HeaderValue::from_str(&cookie).expect("cookie value is valid ASCII")
}

/// Extract the session token from a `Cookie` header value.
///
/// Parses the cookie string to find `auth_token=<value>`.
pub fn extract_session_token(cookie_header: &str) -> Option<String> {
    for part in cookie_header.split(';') {
        let trimmed = part.trim();
        if let Some(value) = trimmed.strip_prefix(&format!("{}=", SESSION_COOKIE_NAME)) {
            let token = value.trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }
    None
}

/// Determine whether the `Secure` flag should be set on cookies.
///
/// Returns `true` if the frontend is served via HTTPS, `false` for
/// localhost / non-TLS setups.
pub fn should_set_secure(frontend_url: Option<&str>) -> bool {
    frontend_url.is_some_and(|url| url.starts_with("https://"))
}

// ============================================================================
// Tests
// ============================================================================
