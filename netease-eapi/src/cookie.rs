//! Persistent cookie store.
//!
//! Cookies live in a flat JSON object on disk:
//!
//! ```json
//! { "MUSIC_U": "00AABBCC...", "deviceId": "…", "os": "osx" }
//! ```
//!
//! The store is loaded once, merged over a set of defaults (saved values
//! win), updated from every response's `Set-Cookie` headers and rewritten
//! after each non-empty update batch.

use crate::error::{EapiError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Name/value cookie set backed by a JSON file.
#[derive(Debug, Clone)]
pub struct CookieJar {
    path: PathBuf,
    cookies: BTreeMap<String, String>,
}

impl CookieJar {
    /// Load the store at `path`, layered over `defaults`.
    ///
    /// A missing, unreadable or corrupt file is not an error: the jar
    /// simply starts from `defaults`.
    pub fn load(path: impl Into<PathBuf>, defaults: &[(&str, &str)]) -> Self {
        let path = path.into();
        let mut cookies: BTreeMap<String, String> = defaults
            .iter()
            .map(|&(k, v)| (k.to_owned(), v.to_owned()))
            .collect();

        match fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str::<BTreeMap<String, String>>(&data) {
                Ok(saved) => cookies.extend(saved),
                Err(e) => warn!(path = %path.display(), "ignoring corrupt cookie store: {e}"),
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no cookie store yet, using defaults");
            }
            Err(e) => warn!(path = %path.display(), "cannot read cookie store: {e}"),
        }

        Self { path, cookies }
    }

    /// Default location: `<config_dir>/ncm-listen/cookies.json`.
    pub fn default_path() -> Result<PathBuf> {
        let config = dirs::config_dir()
            .ok_or_else(|| EapiError::Other("cannot determine config directory".into()))?;
        Ok(config.join("ncm-listen").join("cookies.json"))
    }

    /// File this jar persists to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Value of a single cookie.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Assign a cookie in memory. Not persisted until the next
    /// [`set_from_headers`](Self::set_from_headers) or [`save`](Self::save).
    pub fn put(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name.into(), value.into());
    }

    /// All cookies as a `Cookie` header value: `a=1;b=2`, URL-encoded.
    pub fn header_value(&self) -> String {
        self.cookies
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Apply raw `Set-Cookie` header values and persist the result.
    ///
    /// Only the leading `name=value` pair of each header is kept; attributes
    /// such as `Path` or `Expires` are dropped. An empty batch is a no-op and
    /// leaves the file untouched. A failed write is returned to the caller.
    pub fn set_from_headers<I, S>(&mut self, headers: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = false;
        for header in headers {
            seen = true;
            let pair = header.as_ref().split(';').next().unwrap_or_default();
            if let Some((name, value)) = pair.split_once('=') {
                self.cookies.insert(name.to_owned(), value.to_owned());
            }
        }
        if !seen {
            return Ok(());
        }
        self.save()
    }

    /// Write the full cookie set to disk, creating parent directories.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_string_pretty(&self.cookies)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let jar = CookieJar::load(dir.path().join("cookies.json"), &[("os", "osx")]);
        assert_eq!(jar.get("os"), Some("osx"));
        assert_eq!(jar.get("MUSIC_U"), None);
    }

    #[test]
    fn saved_values_win_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        fs::write(&path, r#"{"k":"v1","extra":"x"}"#).unwrap();

        let jar = CookieJar::load(&path, &[("k", "v2"), ("os", "osx")]);
        assert_eq!(jar.get("k"), Some("v1"));
        assert_eq!(jar.get("extra"), Some("x"));
        assert_eq!(jar.get("os"), Some("osx"));
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        fs::write(&path, b"\x80not json").unwrap();

        let jar = CookieJar::load(&path, &[("k", "v2")]);
        assert_eq!(jar.get("k"), Some("v2"));
    }

    #[test]
    fn header_value_joins_encoded_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let mut jar = CookieJar::load(dir.path().join("c.json"), &[("a", "1"), ("b", "2")]);
        assert_eq!(jar.header_value(), "a=1;b=2");

        jar.put("osver", "10.13 (17G65)");
        let header = jar.header_value();
        assert!(header.contains("a=1"));
        assert!(header.contains("b=2"));
        assert!(header.contains("osver=10.13%20%2817G65%29"));
    }

    #[test]
    fn set_from_headers_keeps_first_pair_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cookies.json");
        let mut jar = CookieJar::load(&path, &[]);

        jar.set_from_headers([
            "MUSIC_U=abc=def; Expires=Sat, 01 Jan 2028 00:00:00 GMT; Path=/",
            "__csrf=123; HTTPOnly",
            "garbage",
        ])
        .unwrap();

        assert_eq!(jar.get("MUSIC_U"), Some("abc=def"));
        assert_eq!(jar.get("__csrf"), Some("123"));
        assert_eq!(jar.get("garbage"), None);

        let reloaded = CookieJar::load(&path, &[]);
        assert_eq!(reloaded.get("MUSIC_U"), Some("abc=def"));
    }

    #[test]
    fn empty_batch_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        fs::write(&path, r#"{"k":"v"}"#).unwrap();

        let mut jar = CookieJar::load(&path, &[]);
        jar.put("unsaved", "1");
        jar.set_from_headers(Vec::<String>::new()).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"k":"v"}"#);
        assert_eq!(jar.get("k"), Some("v"));
    }

    #[test]
    fn put_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        let mut jar = CookieJar::load(&path, &[]);
        jar.put("MUSIC_U", "token");
        assert!(!path.exists());

        jar.save().unwrap();
        assert_eq!(CookieJar::load(&path, &[]).get("MUSIC_U"), Some("token"));
    }

    #[test]
    fn write_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes the write fail.
        let path = dir.path().join("cookies.json");
        fs::create_dir(&path).unwrap();

        let mut jar = CookieJar::load(&path, &[]);
        assert!(matches!(jar.set_from_headers(["a=1"]), Err(EapiError::Io(_))));
    }
}
