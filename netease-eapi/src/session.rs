//! Explicit session context: the cookie jar plus the signed-in user id.
//!
//! Every client operation takes a `&mut Session` so that response cookies
//! flow back into the jar without any process-wide state.

use crate::cookie::CookieJar;
use crate::error::Result;
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

/// Cookie carrying the login token.
pub const MUSIC_U: &str = "MUSIC_U";

/// Cookies the macOS desktop client always sends.
pub const DEFAULT_COOKIES: &[(&str, &str)] = &[
    ("appver", "1.5.9"),
    ("channel", "netease"),
    ("os", "osx"),
    ("osver", "版本 10.13.6（版号 17G65）"),
];

/// Per-run login state.
#[derive(Debug, Clone)]
pub struct Session {
    cookies: CookieJar,
    user_id: u64,
}

impl Session {
    /// Load cookies from `path` over [`DEFAULT_COOKIES`], generating a
    /// `deviceId` if the store has none yet.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let mut cookies = CookieJar::load(path, DEFAULT_COOKIES);
        if cookies.get("deviceId").is_none() {
            let device_id = generate_device_id();
            info!(%device_id, "generated new device id");
            cookies.put("deviceId", device_id);
        }
        Self { cookies, user_id: 0 }
    }

    /// Load from [`CookieJar::default_path`].
    pub fn load_default() -> Result<Self> {
        Ok(Self::load(CookieJar::default_path()?))
    }

    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    pub fn cookies_mut(&mut self) -> &mut CookieJar {
        &mut self.cookies
    }

    /// The `MUSIC_U` token, if any.
    pub fn music_u(&self) -> Option<&str> {
        self.cookies.get(MUSIC_U).filter(|u| !u.is_empty())
    }

    /// Install a raw `MUSIC_U` token (in memory only).
    pub fn set_session_token(&mut self, token: impl Into<String>) {
        self.cookies.put(MUSIC_U, token);
    }

    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    pub fn set_user_id(&mut self, user_id: u64) {
        self.user_id = user_id;
    }
}

/// `UPPER(<uuid v1>|<uuid v4>)`, the shape the desktop client uses.
fn generate_device_id() -> String {
    let node_id: [u8; 6] = rand::random();
    format!("{}|{}", Uuid::now_v1(&node_id), Uuid::new_v4()).to_uppercase()
}
