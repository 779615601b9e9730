//! Netease Cloud Music EAPI client library.
//!
//! Speaks the encrypted gateway used by the macOS desktop client: login,
//! token refresh, user info, the personal radio queue, playback URLs and
//! client log uploads. A [`PlayLog`] buffers playback records in the
//! client's log format for periodic upload.
//!
//! # Session
//!
//! Login state is an explicit [`Session`] (cookie jar + user id) passed to
//! every call. Cookies persist to `~/.config/ncm-listen/cookies.json`.
//!
//! ```no_run
//! use netease_eapi::{EapiClient, Session};
//!
//! let mut session = Session::load_default().unwrap();
//! session.set_session_token("YOUR_MUSIC_U");
//!
//! let client = EapiClient::new().unwrap();
//! let songs = client.radio_queue(&mut session).unwrap();
//! ```
//!
//! # API endpoint mapping
//!
//! | Method                               | Gateway path                    | Description         |
//! |--------------------------------------|---------------------------------|---------------------|
//! | [`EapiClient::login`]                | `/eapi/login`                   | Password login      |
//! | [`EapiClient::refresh_session`]      | `/eapi/login/token/refresh`     | Extend `MUSIC_U`    |
//! | [`EapiClient::user_info`]            | `/eapi/v1/user/info`            | Current user        |
//! | [`EapiClient::radio_queue`]          | `/eapi/v1/radio/get`            | Personal radio      |
//! | [`EapiClient::playback_urls`]        | `/eapi/song/enhance/player/url` | Playback URLs       |
//! | [`EapiClient::batch`]                | `/eapi/batch`                   | Several calls       |
//! | [`EapiClient::submit_log_archive`]   | `/api/feedback/client/log`      | Upload playback log |
//!
//! # Encryption
//!
//! Requests are signed with MD5 and encrypted with AES-128-ECB under a fixed
//! key, matching the desktop client byte for byte. See [`crypto`].

pub mod archive;
mod auth;
pub mod client;
pub mod cookie;
pub mod crypto;
pub mod error;
mod feedback;
pub mod playlog;
mod radio;
pub mod session;
#[cfg(test)]
mod test_server;
mod track;
pub mod types;
mod user;

pub use client::{EapiClient, Endpoint};
pub use cookie::CookieJar;
pub use error::{EapiError, Result};
pub use playlog::{PlayLog, PlayRecord, PlaySource};
pub use session::Session;
pub use user::{signed_in_user_id, user_profile};
