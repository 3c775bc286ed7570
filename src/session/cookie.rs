use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use axum::http::{header, HeaderMap};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::Rng;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Cookie encryption/decryption errors
#[derive(Error, Debug)]
pub enum CookieError {
    #[error("Failed to serialize cookie data: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Failed to encrypt cookie: {0}")]
    EncryptionError(String),

    #[error("Failed to decrypt cookie: {0}")]
    DecryptionError(String),

    #[error("Invalid cookie format: {0}")]
    InvalidFormat(String),

    #[error("Failed to decode base64: {0}")]
    Base64Error(#[from] base64::DecodeError),
}

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Seals cookie payloads with AES-256-GCM.
///
/// Cookie value: unpadded URL-safe base64 of `nonce || ciphertext || tag`, so it
/// needs no quoting in a `Cookie` header.
pub struct CookieCipher {
    cipher: Aes256Gcm,
}

impl CookieCipher {
    pub fn new(key: &[u8; 32]) -> Self {
        Self {
            cipher: Aes256Gcm::new(key.into()),
        }
    }

    pub fn encrypt<T: Serialize>(&self, payload: &T) -> Result<String, CookieError> {
        let json = serde_json::to_vec(payload)?;
        let nonce: [u8; NONCE_LEN] = rand::thread_rng().gen();

        let sealed = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), json.as_slice())
            .map_err(|e| CookieError::EncryptionError(e.to_string()))?;

        Ok(URL_SAFE_NO_PAD.encode([nonce.as_slice(), sealed.as_slice()].concat()))
    }

    /// Fails on a wrong key, tampered or truncated values, and foreign payloads.
    pub fn decrypt<T: DeserializeOwned>(&self, value: &str) -> Result<T, CookieError> {
        let bytes = URL_SAFE_NO_PAD.decode(value)?;
        if bytes.len() < NONCE_LEN + TAG_LEN {
            return Err(CookieError::InvalidFormat(format!(
                "{} bytes, need at least {}",
                bytes.len(),
                NONCE_LEN + TAG_LEN
            )));
        }

        let (nonce, sealed) = bytes.split_at(NONCE_LEN);
        let json = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|e| CookieError::DecryptionError(e.to_string()))?;

        Ok(serde_json::from_slice(&json)?)
    }
}

/// Extract cookie value from request headers
pub fn extract_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|cookie| {
            let (name, value) = cookie.trim().split_once('=')?;
            if name == cookie_name {
                Some(value.trim().to_string())
            } else {
                None
            }
        })
}

/// `Set-Cookie` value for a browser-session cookie (no Max-Age)
pub fn session_cookie_header(name: &str, value: &str, secure: bool) -> String {
    let mut cookie = format!("{}={}; HttpOnly; SameSite=Lax; Path=/", name, value);
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
