//! Playback URL API.
//!
//! Endpoint: `POST /eapi/song/enhance/player/url`
//! (backend `/api/song/enhance/player/url`, encrypted response)
//!
//! Request: `{ "ids": "[\"123\"]", "br": "320000", "e_r": true }`
//!
//! Response:
//! ```json
//! {
//!   "code": 200,
//!   "data": [{
//!     "id": 123,
//!     "url": "https://m701.music.126.net/...",  // null if unavailable
//!     "br": 320000,
//!     "size": 12345678,
//!     "type": "mp3"
//!   }]
//! }
//! ```

use crate::client::{EapiClient, Endpoint, success};
use crate::error::Result;
use crate::session::Session;
use crate::types::{PlaybackUrl, parse_playback_url};
use serde_json::{Map, Value, json};

impl EapiClient {
    /// Fetch playback metadata for `song_ids` at up to `bitrate` bps.
    ///
    /// The desktop client requests a song's URL right before playing it;
    /// the result order follows the server, not `song_ids`.
    pub fn playback_urls(
        &self,
        session: &mut Session,
        song_ids: &[String],
        bitrate: u64,
    ) -> Result<Option<Vec<PlaybackUrl>>> {
        let mut params = Map::new();
        params.insert("ids".into(), json!(serde_json::to_string(song_ids)?));
        params.insert("br".into(), json!(bitrate.to_string()));
        params.insert("e_r".into(), json!(true));

        let resp = self.request_eapi(session, Endpoint::PLAYER_URL, params, true)?;
        Ok(success(resp, "playback url").map(|resp| parse_urls(&resp)))
    }
}

fn parse_urls(resp: &Value) -> Vec<PlaybackUrl> {
    resp["data"]
        .as_array()
        .map(|arr| arr.iter().map(parse_playback_url).collect())
        .unwrap_or_default()
}
