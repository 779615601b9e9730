//! Playback log writer.
//!
//! Records are buffered in the desktop client's log format, one per call:
//!
//! ```text
//! <unix seconds> 0x01 <type> 0x01 <compact json params incl. "seq"> \n \n
//! ```
//!
//! The sequence number keeps counting across flushes; callers persist
//! [`PlayLog::seq`] after a successful upload and hand it back to
//! [`PlayLog::new`] on the next run so the server sees no gaps or replays.

use serde_json::{Map, Value, json};

const UNIT_SEPARATOR: u8 = 0x01;
const RECORD_END: &[u8] = b"\n\n";

/// In-memory log buffer with a running sequence number.
#[derive(Debug)]
pub struct PlayLog {
    buf: Vec<u8>,
    seq: u64,
}

impl PlayLog {
    /// Resume at sequence `seq`.
    ///
    /// `seq <= 1` means this device never reported before: an `active`
    /// record with sequence 1 is buffered first and counting resumes at 2.
    pub fn new(seq: u64) -> Self {
        if seq > 1 {
            return Self { buf: Vec::new(), seq };
        }
        let mut log = Self {
            buf: Vec::new(),
            seq: 1,
        };
        let mut params = Map::new();
        params.insert("source".into(), json!("netease"));
        log.write("active", params);
        log
    }

    /// Sequence number the next record will carry.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Append a record stamped with the current time.
    pub fn write(&mut self, log_type: &str, params: Map<String, Value>) {
        self.write_at(log_type, params, chrono::Utc::now().timestamp());
    }

    /// Append a record with an explicit Unix timestamp (seconds).
    pub fn write_at(&mut self, log_type: &str, mut params: Map<String, Value>, timestamp: i64) {
        params.insert("seq".into(), json!(self.seq));
        self.buf.extend_from_slice(timestamp.to_string().as_bytes());
        self.buf.push(UNIT_SEPARATOR);
        self.buf.extend_from_slice(log_type.as_bytes());
        self.buf.push(UNIT_SEPARATOR);
        self.buf
            .extend_from_slice(Value::Object(params).to_string().as_bytes());
        self.buf.extend_from_slice(RECORD_END);
        self.seq += 1;
    }

    /// Record that a song was played to the end.
    pub fn play(&mut self, record: &PlayRecord) {
        let mut params = Map::new();
        params.insert("type".into(), json!("song"));
        params.insert("id".into(), json!(record.song_id));
        params.insert("time".into(), json!(record.play_time));
        params.insert("network".into(), json!(1));
        params.insert("artistid".into(), json!(record.artist_id));
        params.insert("download".into(), json!(0));
        params.insert("end".into(), json!("playend"));
        params.insert("source".into(), json!(record.source.name()));
        params.insert("bitrate".into(), json!(128));
        params.insert("startlogtime".into(), json!(record.start_play_time));
        params.insert("status".into(), json!("back"));
        params.insert("fee".into(), json!(record.fee));
        match &record.source {
            PlaySource::UserFm { alg } => {
                params.insert("alg".into(), json!(alg));
            }
            PlaySource::List { source_id } => {
                params.insert("sourceId".into(), json!(source_id));
            }
        }
        self.write_at("play", params, record.end_time());
    }

    /// Take the buffered bytes, leaving the buffer empty.
    pub fn flush(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// Where a played song came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaySource {
    /// Personal radio; `alg` is the recommendation tag served with the song.
    UserFm { alg: String },
    /// A playlist.
    List { source_id: String },
}

impl PlaySource {
    fn name(&self) -> &'static str {
        match self {
            Self::UserFm { .. } => "userfm",
            Self::List { .. } => "list",
        }
    }
}

/// One finished playback.
#[derive(Debug, Clone)]
pub struct PlayRecord {
    pub song_id: u64,
    /// First credited artist.
    pub artist_id: u64,
    /// Seconds listened.
    pub play_time: i64,
    pub fee: i64,
    pub source: PlaySource,
    /// Playback start, Unix milliseconds.
    pub start_play_time: i64,
}

impl PlayRecord {
    /// Unix seconds at which playback ended: `ceil(start / 1000) + play_time`.
    fn end_time(&self) -> i64 {
        let start = self.start_play_time;
        start.div_euclid(1000) + i64::from(start.rem_euclid(1000) != 0) + self.play_time
    }
}
