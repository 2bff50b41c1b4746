//! Compact JWE (RFC 7516)
//!
//! Only one algorithm pair is supported:
//! - `alg = A256KW`: the 32-byte key-encryption key wraps a random CEK (RFC 3394)
//! - `enc = A256CBC-HS512`: AES-256-CBC + HMAC-SHA-512/256 (RFC 7518 §5.2.5)
//!
//! Serialization: `header.encrypted_key.iv.ciphertext.tag`, each part base64url.

use aes::Aes256;
use aes_kw::KekAes256;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha512;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::crypto::{from_base64url, random_array, to_base64url};

type HmacSha512 = Hmac<Sha512>;

const HEADER_JSON: &str = r#"{"alg":"A256KW","enc":"A256CBC-HS512"}"#;
const CEK_LEN: usize = 64;
const WRAPPED_CEK_LEN: usize = CEK_LEN + 8;
const IV_LEN: usize = 16;
const TAG_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JweError {
    #[error("JWE must have five dot-separated parts")]
    Malformed,

    #[error("Invalid base64url in JWE part `{0}`")]
    Encoding(&'static str),

    #[error("Unsupported JWE header")]
    UnsupportedHeader,

    #[error("Key wrap failed")]
    KeyWrap,

    #[error("Encryption failed")]
    Encryption,

    #[error("Key unwrap failed")]
    KeyUnwrap,

    #[error("Authentication tag mismatch")]
    TagMismatch,

    #[error("Decryption failed")]
    Decryption,
}

/// Symmetric `A256KW` / `A256CBC-HS512` encrypter.
///
/// ```rust
/// use platform::jwe::Jwe;
///
/// let jwe = Jwe::new([7u8; 32]);
/// let token = jwe.encrypt(b"hello").unwrap();
/// assert_eq!(token.split('.').count(), 5);
/// assert_eq!(jwe.decrypt(&token).unwrap(), b"hello");
/// ```
#[derive(Clone)]
pub struct Jwe {
    key: Zeroizing<[u8; 32]>,
}

impl Jwe {
    pub fn new(key: [u8; 32]) -> Self {
        Self {
            key: Zeroizing::new(key),
        }
    }

    fn kek(&self) -> KekAes256 {
        KekAes256::from(*self.key)
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String, JweError> {
        let cek = Zeroizing::new(random_array::<CEK_LEN>());
        let iv = random_array::<IV_LEN>();

        let mut wrapped = [0u8; WRAPPED_CEK_LEN];
        self.kek()
            .wrap(cek.as_slice(), &mut wrapped)
            .map_err(|_| JweError::KeyWrap)?;

        let header = to_base64url(HEADER_JSON.as_bytes());
        let (mac_key, enc_key) = cek.split_at(CEK_LEN / 2);

        let ciphertext = cbc::Encryptor::<Aes256>::new_from_slices(enc_key, &iv)
            .map_err(|_| JweError::Encryption)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        let tag = authentication_tag(mac_key, header.as_bytes(), &iv, &ciphertext)?
            .finalize()
            .into_bytes();

        Ok(format!(
            "{}.{}.{}.{}.{}",
            header,
            to_base64url(&wrapped),
            to_base64url(&iv),
            to_base64url(&ciphertext),
            to_base64url(&tag[..TAG_LEN]),
        ))
    }

    pub fn decrypt(&self, token: &str) -> Result<Vec<u8>, JweError> {
        let parts: Vec<&str> = token.split('.').collect();
        let [header, wrapped, iv, ciphertext, tag] = parts.as_slice() else {
            return Err(JweError::Malformed);
        };

        let header_json = from_base64url(header).map_err(|_| JweError::Encoding("header"))?;
        check_header(&header_json)?;

        let wrapped = from_base64url(wrapped).map_err(|_| JweError::Encoding("encrypted_key"))?;
        let iv = from_base64url(iv).map_err(|_| JweError::Encoding("iv"))?;
        let ciphertext = from_base64url(ciphertext).map_err(|_| JweError::Encoding("ciphertext"))?;
        let tag = from_base64url(tag).map_err(|_| JweError::Encoding("tag"))?;

        if wrapped.len() != WRAPPED_CEK_LEN {
            return Err(JweError::KeyUnwrap);
        }
        if iv.len() != IV_LEN || tag.len() != TAG_LEN {
            return Err(JweError::Malformed);
        }

        let mut cek = Zeroizing::new([0u8; CEK_LEN]);
        self.kek()
            .unwrap(&wrapped, cek.as_mut_slice())
            .map_err(|_| JweError::KeyUnwrap)?;
        let (mac_key, enc_key) = cek.split_at(CEK_LEN / 2);

        authentication_tag(mac_key, header.as_bytes(), &iv, &ciphertext)?
            .verify_truncated_left(&tag)
            .map_err(|_| JweError::TagMismatch)?;

        cbc::Decryptor::<Aes256>::new_from_slices(enc_key, &iv)
            .map_err(|_| JweError::Decryption)?
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| JweError::Decryption)
    }
}

/// MAC over `AAD || IV || ciphertext || AL`, AL being the AAD bit length as u64 big-endian
fn authentication_tag(
    mac_key: &[u8],
    aad: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
) -> Result<HmacSha512, JweError> {
    let mut mac = HmacSha512::new_from_slice(mac_key).map_err(|_| JweError::TagMismatch)?;
    mac.update(aad);
    mac.update(iv);
    mac.update(ciphertext);
    mac.update(&((aad.len() as u64) * 8).to_be_bytes());
    Ok(mac)
}

/// Protected header members this implementation looks at
#[derive(Deserialize)]
struct ProtectedHeader {
    alg: String,
    enc: String,
    zip: Option<Value>,
    crit: Option<Value>,
}

fn check_header(raw: &[u8]) -> Result<(), JweError> {
    let header: ProtectedHeader =
        serde_json::from_slice(raw).map_err(|_| JweError::UnsupportedHeader)?;
    if header.alg == "A256KW"
        && header.enc == "A256CBC-HS512"
        && header.zip.is_none()
        && header.crit.is_none()
    {
        Ok(())
    } else {
        Err(JweError::UnsupportedHeader)
    }
}
