//! Data types for EAPI responses.
//!
//! Parsed by hand from the raw JSON returned by the gateway. Field names
//! follow Rust conventions rather than the API's camelCase.

use serde_json::Value;

/// A music artist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artist {
    /// Netease artist ID.
    pub id: u64,
    /// Display name.
    pub name: String,
}

/// Profile of the signed-in user.
///
/// API JSON path: `response.profile` with `userId`, `nickname`, `avatarUrl`.
#[derive(Debug, Clone)]
pub struct UserProfile {
    /// Netease user ID.
    pub id: u64,
    /// Display nickname.
    pub nickname: String,
    /// Avatar image URL.
    pub avatar_url: Option<String>,
}

/// Successful login.
///
/// `account` is passed through as-is; its shape varies with the login type.
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub account: Value,
    pub profile: UserProfile,
}

/// One song served by the personal radio queue.
///
/// API JSON fields: `id`, `name`, `artists`, `duration` (ms), `alg`
/// (recommendation tag echoed back in play logs), `privilege.fee`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioSong {
    pub id: u64,
    pub name: String,
    pub artists: Vec<Artist>,
    /// Duration in milliseconds.
    pub duration_ms: u64,
    pub alg: String,
    /// Download fee class; 0 when the song has no `privilege` block.
    pub fee: i64,
}

impl RadioSong {
    /// First credited artist's id, or 0.
    pub fn artist_id(&self) -> u64 {
        self.artists.first().map_or(0, |a| a.id)
    }
}

/// Playback metadata for one song.
///
/// `url` is `None` when the track requires VIP/purchase or is region-locked.
#[derive(Debug, Clone)]
pub struct PlaybackUrl {
    pub id: u64,
    pub url: Option<String>,
    /// Actual bitrate served.
    pub bitrate: u64,
    /// File size in bytes.
    pub size: u64,
    /// Container, e.g. `mp3`.
    pub kind: Option<String>,
}

/// Bitrate the desktop client asks for (320 kbps).
pub const DEFAULT_BITRATE: u64 = 320_000;

pub(crate) fn parse_profile(p: &Value) -> UserProfile {
    UserProfile {
        id: p["userId"].as_u64().unwrap_or(0),
        nickname: p["nickname"].as_str().unwrap_or("").to_owned(),
        avatar_url: p["avatarUrl"].as_str().map(String::from),
    }
}

pub(crate) fn parse_radio_song(v: &Value) -> RadioSong {
    let artists = v["artists"]
        .as_array()
        .or_else(|| v["ar"].as_array())
        .map(|arr| {
            arr.iter()
                .map(|a| Artist {
                    id: a["id"].as_u64().unwrap_or(0),
                    name: a["name"].as_str().unwrap_or("").to_owned(),
                })
                .collect()
        })
        .unwrap_or_default();

    RadioSong {
        id: v["id"].as_u64().unwrap_or(0),
        name: v["name"].as_str().unwrap_or("").to_owned(),
        artists,
        duration_ms: v["duration"]
            .as_u64()
            .or_else(|| v["dt"].as_u64())
            .unwrap_or(0),
        alg: v["alg"].as_str().unwrap_or("").to_owned(),
        fee: v["privilege"]["fee"].as_i64().unwrap_or(0),
    }
}

pub(crate) fn parse_playback_url(v: &Value) -> PlaybackUrl {
    PlaybackUrl {
        id: v["id"].as_u64().unwrap_or(0),
        url: v["url"].as_str().map(String::from),
        bitrate: v["br"].as_u64().unwrap_or(0),
        size: v["size"].as_u64().unwrap_or(0),
        kind: v["type"].as_str().map(String::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn radio_song_fields() {
        let v = json!({
            "id": 186016,
            "name": "晴天",
            "artists": [{ "id": 6452, "name": "周杰伦" }, { "id": 1, "name": "x" }],
            "duration": 269000,
            "alg": "itembased",
            "privilege": { "fee": 8 }
        });
        let song = parse_radio_song(&v);
        assert_eq!(song.id, 186_016);
        assert_eq!(song.artist_id(), 6452);
        assert_eq!(song.duration_ms, 269_000);
        assert_eq!(song.alg, "itembased");
        assert_eq!(song.fee, 8);
    }

    #[test]
    fn radio_song_without_privilege_has_zero_fee() {
        let song = parse_radio_song(&json!({ "id": 1, "name": "a", "duration": 1000 }));
        assert_eq!(song.fee, 0);
        assert_eq!(song.artist_id(), 0);
        assert!(song.alg.is_empty());
    }

    #[test]
    fn playback_url_null_url() {
        let url = parse_playback_url(&json!({ "id": 5, "url": null, "br": 0, "size": 0 }));
        assert_eq!(url.id, 5);
        assert!(url.url.is_none());
        assert!(url.kind.is_none());
    }
}
