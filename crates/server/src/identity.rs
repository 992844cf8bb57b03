//! `uid` cookie identity.
//!
//! The core treats user identity as an opaque token. This binding keeps it in
//! a long-lived `uid` cookie and mints a fresh v4 UUID for first-time visitors.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::Response;

const COOKIE_NAME: &str = "uid";
const COOKIE_MAX_AGE_SECS: u64 = 31_536_000;

/// The caller's identity, plus the cookie to set if it was just issued.
#[derive(Debug, Clone)]
pub struct UserId {
    pub uid: String,
    issued: bool,
}

impl UserId {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        match find_cookie(headers, COOKIE_NAME) {
            Some(uid) => Self { uid, issued: false },
            None => Self { uid: uuid::Uuid::new_v4().to_string(), issued: true },
        }
    }

    /// Attach `Set-Cookie` when the identity was minted for this request.
    pub fn attach(&self, mut response: Response) -> Response {
        if self.issued {
            let cookie = format!("{COOKIE_NAME}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={COOKIE_MAX_AGE_SECS}", self.uid);
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                response.headers_mut().append(SET_COOKIE, value);
            }
        }
        response
    }
}

impl<S: Send + Sync> FromRequestParts<S> for UserId {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

fn find_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
