//! Login and token refresh.
//!
//! ## `login` — `POST /eapi/login` (backend `/api/login`, encrypted response)
//!
//! Request:
//! ```json
//! { "username": "me@163.com", "password": "<md5 hex>", "type": "0",
//!   "remember": "true", "https": "true", "e_r": true }
//! ```
//!
//! On success the gateway sets `MUSIC_U` (and friends) via `Set-Cookie`
//! and returns `{ "code": 200, "account": {...}, "profile": {...} }`.
//!
//! ## `refresh_session` — `POST /eapi/login/token/refresh`
//!
//! Request: `{ "cookieToken": "<MUSIC_U>" }`. Extends the token lifetime.

use crate::client::{EapiClient, Endpoint, success};
use crate::crypto::md5_hex;
use crate::error::Result;
use crate::session::Session;
use crate::types::{LoginResult, parse_profile};
use serde_json::{Map, Value, json};
use tracing::info;

impl EapiClient {
    /// Log in with a username and clear-text password.
    ///
    /// `login_type` is sent verbatim as the `type` parameter (0 = email).
    pub fn login(
        &self,
        session: &mut Session,
        username: &str,
        password: &str,
        login_type: u32,
    ) -> Result<Option<LoginResult>> {
        let mut params = Map::new();
        params.insert("username".into(), json!(username));
        params.insert("password".into(), json!(md5_hex(password.as_bytes())));
        params.insert("type".into(), json!(login_type.to_string()));
        params.insert("remember".into(), json!("true"));
        params.insert("https".into(), json!("true"));
        params.insert("e_r".into(), json!(true));

        let resp = self.request_eapi(session, Endpoint::LOGIN, params, true)?;
        let Some(resp) = success(resp, "login") else {
            return Ok(None);
        };
        let result = LoginResult {
            account: resp.get("account").cloned().unwrap_or(Value::Null),
            profile: parse_profile(&resp["profile"]),
        };
        info!(user_id = result.profile.id, "logged in");
        Ok(Some(result))
    }

    /// Refresh the `MUSIC_U` token.
    ///
    /// Returns `false` without touching the network when no token is set.
    pub fn refresh_session(&self, session: &mut Session) -> Result<bool> {
        let Some(music_u) = session.music_u() else {
            return Ok(false);
        };
        let mut params = Map::new();
        params.insert("cookieToken".into(), json!(music_u));

        let resp = self.request_eapi(session, Endpoint::TOKEN_REFRESH, params, false)?;
        Ok(success(resp, "token refresh").is_some())
    }
}
