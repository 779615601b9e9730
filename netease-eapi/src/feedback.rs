//! Client log upload.
//!
//! Endpoint: `POST http://music.163.com/api/feedback/client/log[?MUSIC_U=…]`
//!
//! Multipart body with one file field, `attach`, named `<userId>log.zip`.
//! The zip holds a single entry `<userId>_<YYYY-mm-dd HH:MM:SS>.log` with
//! the flushed [`PlayLog`](crate::playlog::PlayLog) bytes.
//!
//! Response: `{ "code": 200 }` on acceptance.

use crate::archive;
use crate::client::{EapiClient, success};
use crate::error::Result;
use crate::session::Session;
use reqwest::blocking::multipart::{Form, Part};
use serde_json::Value;
use tracing::warn;

impl EapiClient {
    /// Post a ready-made log archive.
    ///
    /// Returns `true` iff the response `code` is 200.
    pub fn submit_log_archive(&self, session: &mut Session, archive: Vec<u8>) -> Result<bool> {
        let mut url = format!("{}/api/feedback/client/log", self.feedback_base_url());
        if let Some(music_u) = session.music_u() {
            url.push_str("?MUSIC_U=");
            url.push_str(&urlencoding::encode(music_u));
        }

        let part = Part::bytes(archive).file_name(format!("{}log.zip", session.user_id()));
        let req = self.http().post(&url).multipart(Form::new().part("attach", part));

        let Some(body) = self.send(session, req)? else {
            return Ok(false);
        };
        let resp = match serde_json::from_slice::<Value>(&body) {
            Ok(resp) => resp,
            Err(e) => {
                warn!("log upload response is not JSON: {e}");
                return Ok(false);
            }
        };
        Ok(success(Some(resp), "log upload").is_some())
    }

    /// Archive flushed playback log bytes and submit them.
    pub fn upload_playlog(&self, session: &mut Session, log: &[u8]) -> Result<bool> {
        let entry = log_entry_name(session.user_id(), chrono::Local::now().naive_local());
        let archive = archive::compress([(entry, log)])?;
        self.submit_log_archive(session, archive)
    }
}

fn log_entry_name(user_id: u64, at: chrono::NaiveDateTime) -> String {
    format!("{user_id}_{}.log", at.format("%Y-%m-%d %H:%M:%S"))
}
