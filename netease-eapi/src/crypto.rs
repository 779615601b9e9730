//! EAPI envelope for the Netease mobile/desktop gateway.
//!
//! Request flow:
//!
//! ```text
//! json = compact(params)
//! sign = md5("nobody" + path + "use" + json + "md5forencrypt")   (lowercase hex)
//! body = path + "-36cd479b6b5-" + json + "-36cd479b6b5-" + sign
//! params = UPPER(hex(AES-128-ECB(EAPI_KEY, pkcs7(body))))
//! ```
//!
//! Responses requested with `e_r = true` come back as raw AES-128-ECB
//! ciphertext under the same key.
//!
//! PKCS#7 always appends padding, so an already block-aligned body gets a
//! full 16-byte `0x10` block. The desktop client does the same.

use std::fmt::Write as _;

use aes::Aes128;
use ecb::cipher::block_padding::{NoPadding, Pkcs7};
use ecb::cipher::{BlockDecryptMut, BlockEncryptMut, KeyInit};
use md5::{Digest, Md5};
use serde_json::{Map, Value};

use crate::error::{EapiError, Result};

const EAPI_KEY: &[u8; 16] = b"e82ckenh8dichen8";
const DELIMITER: &str = "-36cd479b6b5-";
const BLOCK: usize = 16;

type Aes128EcbEnc = ecb::Encryptor<Aes128>;
type Aes128EcbDec = ecb::Decryptor<Aes128>;

/// Lowercase hex MD5 digest of `data`.
pub fn md5_hex(data: &[u8]) -> String {
    format!("{:x}", Md5::digest(data))
}

/// Build the signed plaintext for `path` and `params`, before padding.
///
/// Parameters are serialized compactly in insertion order; the signature
/// covers these exact bytes.
pub fn eapi_plaintext(path: &str, params: &Map<String, Value>) -> Result<Vec<u8>> {
    let json = serde_json::to_string(params)?;
    let sign = md5_hex(format!("nobody{path}use{json}md5forencrypt").as_bytes());
    Ok(format!("{path}{DELIMITER}{json}{DELIMITER}{sign}").into_bytes())
}

/// Encrypt `params` for the backend `path` into the value of the `params`
/// form field.
pub fn eapi_encrypt(path: &str, params: &Map<String, Value>) -> Result<String> {
    let plaintext = eapi_plaintext(path, params)?;
    let ciphertext = aes_ecb_encrypt(&plaintext)?;
    let mut hex = String::with_capacity(ciphertext.len() * 2);
    for b in &ciphertext {
        let _ = write!(hex, "{b:02X}");
    }
    Ok(hex)
}

/// Decrypt a raw EAPI response body.
///
/// The trailing pad byte is stripped only when it lies in `1..=16`;
/// anything else is returned untouched.
pub fn eapi_decrypt(data: &[u8]) -> Result<Vec<u8>> {
    let mut buf = data.to_vec();
    let len = Aes128EcbDec::new(EAPI_KEY.into())
        .decrypt_padded_mut::<NoPadding>(&mut buf)
        .map_err(|e| EapiError::Crypto(e.to_string()))?
        .len();
    buf.truncate(len);
    if let Some(&pad) = buf.last() {
        let pad = usize::from(pad);
        if (1..=BLOCK).contains(&pad) && pad <= buf.len() {
            buf.truncate(buf.len() - pad);
        }
    }
    Ok(buf)
}

/// AES-128-ECB encrypt with PKCS#7 padding.
pub(crate) fn aes_ecb_encrypt(plaintext: &[u8]) -> Result<Vec<u8>> {
    let pad_len = BLOCK - plaintext.len() % BLOCK;
    let mut buf = vec![0u8; plaintext.len() + pad_len];
    buf[..plaintext.len()].copy_from_slice(plaintext);
    let ct = Aes128EcbEnc::new(EAPI_KEY.into())
        .encrypt_padded_mut::<Pkcs7>(&mut buf, plaintext.len())
        .map_err(|e| EapiError::Crypto(e.to_string()))?;
    Ok(ct.to_vec())
}
