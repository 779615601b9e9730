//! Personal radio (private FM) queue.
//!
//! Endpoint: `POST /eapi/v1/radio/get` (backend `/api/v1/radio/get`)
//!
//! Response:
//! ```json
//! {
//!   "code": 200,
//!   "data": [{
//!     "id": 186016, "name": "晴天", "duration": 269000, "alg": "itembased",
//!     "artists": [{ "id": 6452, "name": "周杰伦" }],
//!     "privilege": { "fee": 8, ... }
//!   }]
//! }
//! ```
//!
//! Each call serves a fresh batch of a few songs.

use crate::client::{EapiClient, Endpoint, success};
use crate::error::Result;
use crate::session::Session;
use crate::types::{RadioSong, parse_radio_song};
use serde_json::{Map, Value};

impl EapiClient {
    /// Fetch the next batch of radio songs.
    pub fn radio_queue(&self, session: &mut Session) -> Result<Option<Vec<RadioSong>>> {
        let resp = self.request_eapi(session, Endpoint::RADIO_GET, Map::new(), false)?;
        Ok(success(resp, "radio queue").map(|resp| parse_songs(&resp)))
    }
}

fn parse_songs(resp: &Value) -> Vec<RadioSong> {
    resp["data"]
        .as_array()
        .map(|arr| arr.iter().map(parse_radio_song).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn songs_in_order() {
        let resp = json!({
            "code": 200,
            "data": [
                { "id": 1, "name": "a", "duration": 1000, "alg": "x" },
                { "id": 2, "name": "b", "duration": 2000, "alg": "y" }
            ]
        });
        let ids: Vec<u64> = parse_songs(&resp).iter().map(|s| s.id).collect();
        assert_eq!(ids, [1, 2]);
    }

    #[test]
    fn missing_data_is_empty() {
        assert!(parse_songs(&json!({ "code": 200 })).is_empty());
    }
}
