//! User info API.
//!
//! Endpoint: `POST /eapi/v1/user/info` (backend `/api/v1/user/info`)
//!
//! Request: `{}` (authentication is via cookie).
//!
//! Response:
//! ```json
//! {
//!   "code": 200,
//!   "userPoint": { "userId": 413184081, "balance": 10, ... },
//!   "profile": { "userId": 413184081, "nickname": "用户名", ... },
//!   ...
//! }
//! ```
//!
//! Returns a code other than 200 (usually 301) if the cookie is missing
//! or expired.

use crate::client::{EapiClient, Endpoint};
use crate::error::Result;
use crate::session::Session;
use crate::types::{UserProfile, parse_profile};
use serde_json::{Map, Value};

impl EapiClient {
    /// Fetch the raw user info document.
    ///
    /// The caller inspects `code`: anything but 200 means not logged in.
    pub fn user_info(&self, session: &mut Session) -> Result<Option<Value>> {
        self.request_eapi(session, Endpoint::USER_INFO, Map::new(), false)
    }
}

/// `userPoint.userId` of a successful user info response.
pub fn signed_in_user_id(info: &Value) -> Option<u64> {
    if info.get("code").and_then(Value::as_i64) != Some(200) {
        return None;
    }
    info.get("userPoint")?.get("userId")?.as_u64()
}

/// `profile` block of a successful user info response.
pub fn user_profile(info: &Value) -> Option<UserProfile> {
    if info.get("code").and_then(Value::as_i64) != Some(200) {
        return None;
    }
    info.get("profile").filter(|p| p.is_object()).map(parse_profile)
}
