//! HTTP client for the Netease EAPI gateway.
//!
//! Every request goes through the EAPI envelope:
//!
//! 1. Append the common parameters (`verifyId`, `os`, `header`)
//! 2. Sign and encrypt them for the backend path → `params` (uppercase hex)
//! 3. POST `params=<hex>` to `https://music.163.com{gateway}`
//! 4. Apply `Set-Cookie` headers to the session, then check the status
//! 5. Optionally decrypt the body, parse it as JSON
//!
//! The server responds with JSON containing a `code` field (200 = success).
//! Transport failures, non-200 HTTP statuses and unparsable bodies all map
//! to `Ok(None)`; only cookie persistence failures surface as errors.

use crate::crypto::{eapi_decrypt, eapi_encrypt};
use crate::error::Result;
use crate::session::Session;
use rand::Rng;
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, COOKIE, HeaderMap, HeaderValue, ORIGIN, SET_COOKIE,
};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

const BASE_URL: &str = "https://music.163.com";
const FEEDBACK_BASE_URL: &str = "http://music.163.com";
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_13_6) \
    AppleWebKit/605.1.15 (KHTML, like Gecko)";
const APP_VERSION: &str = "1.5.9";

/// A gateway path paired with the backend path the envelope is signed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub gateway: &'static str,
    pub backend: &'static str,
}

impl Endpoint {
    pub const LOGIN: Self = Self::new("/eapi/login", "/api/login");
    pub const TOKEN_REFRESH: Self =
        Self::new("/eapi/login/token/refresh", "/api/login/token/refresh");
    pub const USER_INFO: Self = Self::new("/eapi/v1/user/info", "/api/v1/user/info");
    pub const RADIO_GET: Self = Self::new("/eapi/v1/radio/get", "/api/v1/radio/get");
    pub const PLAYER_URL: Self =
        Self::new("/eapi/song/enhance/player/url", "/api/song/enhance/player/url");
    pub const BATCH: Self = Self::new("/eapi/batch", "/batch");

    const fn new(gateway: &'static str, backend: &'static str) -> Self {
        Self { gateway, backend }
    }
}

/// Blocking HTTP client for the EAPI gateway.
///
/// Holds only the transport; login state lives in the [`Session`] passed
/// to each call. API methods are implemented in separate modules (`auth`,
/// `user`, `radio`, `track`, `feedback`) as `impl EapiClient` blocks.
pub struct EapiClient {
    http: Client,
    base_url: String,
    feedback_base_url: String,
}

impl EapiClient {
    /// Create a client for the production hosts.
    pub fn new() -> Result<Self> {
        Self::build(BASE_URL.to_owned(), FEEDBACK_BASE_URL.to_owned())
    }

    /// Create a client that sends every request to `base_url` instead.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        Self::build(base_url.clone(), base_url)
    }

    fn build(base_url: String, feedback_base_url: String) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ORIGIN, HeaderValue::from_static("orpheus://orpheus"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("zh-cn"));
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url,
            feedback_base_url,
        })
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    pub(crate) fn feedback_base_url(&self) -> &str {
        &self.feedback_base_url
    }

    /// Send an envelope request to `endpoint`.
    ///
    /// `params` keep their insertion order; the common parameters are
    /// appended after them. With `decrypt` set, the response body is
    /// envelope-decrypted before parsing (callers also pass `e_r: true`).
    pub fn request_eapi(
        &self,
        session: &mut Session,
        endpoint: Endpoint,
        params: Map<String, Value>,
        decrypt: bool,
    ) -> Result<Option<Value>> {
        let params = with_common_params(params);
        let payload = eapi_encrypt(endpoint.backend, &params)?;
        let url = format!("{}{}", self.base_url, endpoint.gateway);
        debug!(gateway = endpoint.gateway, decrypt, "eapi request");

        let req = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(format!("params={payload}"));

        let Some(body) = self.send(session, req)? else {
            return Ok(None);
        };
        let body = if decrypt {
            match eapi_decrypt(&body) {
                Ok(plain) => plain,
                Err(e) => {
                    warn!(gateway = endpoint.gateway, "cannot decrypt response: {e}");
                    return Ok(None);
                }
            }
        } else {
            body
        };

        match serde_json::from_slice(&body) {
            Ok(json) => Ok(Some(json)),
            Err(e) => {
                warn!(gateway = endpoint.gateway, "response is not JSON: {e}");
                Ok(None)
            }
        }
    }

    /// Issue several backend calls in one envelope.
    ///
    /// `apis` maps backend paths to their JSON-encoded parameter strings,
    /// e.g. `"/api/discovery/hotspot" => "{\"limit\":12}"`. Returns the raw
    /// response.
    pub fn batch(
        &self,
        session: &mut Session,
        apis: Map<String, Value>,
    ) -> Result<Option<Value>> {
        self.request_eapi(session, Endpoint::BATCH, apis, false)
    }

    /// Attach cookies, send, and fold `Set-Cookie` back into the session.
    ///
    /// Returns the body only for HTTP 200.
    pub(crate) fn send(
        &self,
        session: &mut Session,
        req: RequestBuilder,
    ) -> Result<Option<Vec<u8>>> {
        let req = req.header(COOKIE, session.cookies().header_value());
        let resp = match req.send() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("request failed: {e}");
                return Ok(None);
            }
        };

        let set_cookies: Vec<String> = resp
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(String::from)
            .collect();
        session.cookies_mut().set_from_headers(&set_cookies)?;

        let status = resp.status();
        if status != StatusCode::OK {
            warn!(url = %resp.url(), %status, "unexpected HTTP status");
            return Ok(None);
        }
        match resp.bytes() {
            Ok(bytes) => Ok(Some(bytes.to_vec())),
            Err(e) => {
                warn!("cannot read response body: {e}");
                Ok(None)
            }
        }
    }
}

/// Append the parameters every desktop-client request carries.
pub(crate) fn with_common_params(mut params: Map<String, Value>) -> Map<String, Value> {
    let request_id: u32 = rand::rng().random_range(10_000_000..=99_999_999);
    let header = json!({
        "os": "osx",
        "appver": APP_VERSION,
        "requestId": request_id.to_string(),
        "clientSign": "",
    });
    params.insert("verifyId".into(), json!(1));
    params.insert("os".into(), json!("OSX"));
    params.insert("header".into(), Value::String(header.to_string()));
    params
}

/// Keep `resp` only if its application `code` is 200.
pub(crate) fn success(resp: Option<Value>, what: &str) -> Option<Value> {
    let resp = resp?;
    match resp.get("code").and_then(Value::as_i64) {
        Some(200) => Some(resp),
        code => {
            let message = resp
                .get("message")
                .or_else(|| resp.get("msg"))
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            warn!(?code, "{what} failed: {message}");
            None
        }
    }
}
