//! Request signing.
//!
//! SUBMAIL authenticates every request either by sending the app key verbatim
//! (plaintext mode) or by hashing a canonical rendering of the request
//! parameters wrapped in the credential pair (digest mode):
//!
//! ```text
//! appid + appkey + "k1=v1&k2=v2&..." + appid + appkey
//! ```
//!
//! Keys are sorted byte-wise and `signature`, `tag` and `sms_signature` never
//! take part in the rendering.
//!
//! ```rust
//! use submail::signing::{AuthMode, Credential, ParameterSet, SignAlgorithm, Signer};
//! use submail::UnixTimestamp;
//!
//! let credential = Credential::new("112455", "a086b0d1").unwrap();
//! let signer = Signer::new(&credential, AuthMode::Digest(SignAlgorithm::Md5));
//! let params: ParameterSet = [("to", "13800138000"), ("content", "hi")].into_iter().collect();
//! let signed = signer.authorize(params, UnixTimestamp::new(1_700_000_000));
//! assert_eq!(signed.get("sign_type"), Some("md5"));
//! assert_eq!(signed.get("signature").map(str::len), Some(32));
//! ```

use std::collections::BTreeMap;
use std::str::FromStr;

use md5::{Digest, Md5};
use sha1::Sha1;

use crate::domain::{AppId, AppKey, UnixTimestamp, ValidationError};

/// Field carrying the computed signature.
pub const SIGNATURE_FIELD: &str = "signature";
/// Field naming the digest algorithm in digest mode.
pub const SIGN_TYPE_FIELD: &str = "sign_type";

/// Transmitted fields that never take part in the canonical string.
pub const UNSIGNED_FIELDS: [&str; 3] = [SIGNATURE_FIELD, "tag", "sms_signature"];

#[derive(Debug, Clone, PartialEq, Eq)]
/// The `appid` / `appkey` pair issued by SUBMAIL.
pub struct Credential {
    app_id: AppId,
    app_key: AppKey,
}

impl Credential {
    /// Validate and pair an app id and app key.
    pub fn new(
        app_id: impl Into<String>,
        app_key: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            app_id: AppId::new(app_id)?,
            app_key: AppKey::new(app_key)?,
        })
    }

    pub fn from_parts(app_id: AppId, app_key: AppKey) -> Self {
        Self { app_id, app_key }
    }

    pub fn app_id(&self) -> &AppId {
        &self.app_id
    }

    pub fn app_key(&self) -> &AppKey {
        &self.app_key
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported signature algorithm: {0:?} (expected md5 or sha1)")]
pub struct UnsupportedAlgorithm(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
/// Digest used in digest mode (`sign_type`).
pub enum SignAlgorithm {
    #[default]
    Md5,
    Sha1,
}

impl SignAlgorithm {
    /// Wire value of `sign_type`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
        }
    }

    /// Lowercase hex digest of `input`.
    pub fn hex_digest(self, input: &str) -> String {
        match self {
            Self::Md5 => hex::encode(Md5::digest(input.as_bytes())),
            Self::Sha1 => hex::encode(Sha1::digest(input.as_bytes())),
        }
    }
}

impl SignAlgorithm {
    /// Parse a configured `sign_type`, treating an empty value as the default (MD5).
    pub fn from_sign_type(value: &str) -> Result<Self, UnsupportedAlgorithm> {
        if value.trim().is_empty() {
            return Ok(Self::default());
        }
        value.parse()
    }
}

impl FromStr for SignAlgorithm {
    type Err = UnsupportedAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim();
        if normalized.eq_ignore_ascii_case("md5") {
            Ok(Self::Md5)
        } else if normalized.eq_ignore_ascii_case("sha1") {
            Ok(Self::Sha1)
        } else {
            Err(UnsupportedAlgorithm(s.to_owned()))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// How requests prove knowledge of the app key.
pub enum AuthMode {
    /// `signature = appkey`. Weak; intended for testing flows.
    Plaintext,
    /// `signature = hex(digest(canonical string))`.
    Digest(SignAlgorithm),
}

impl Default for AuthMode {
    fn default() -> Self {
        Self::Digest(SignAlgorithm::Md5)
    }
}

impl AuthMode {
    pub fn is_digest(self) -> bool {
        matches!(self, Self::Digest(_))
    }

    /// Value of `sign_type` sent alongside the signature, if any.
    pub fn sign_type(self) -> Option<&'static str> {
        match self {
            Self::Plaintext => None,
            Self::Digest(algorithm) => Some(algorithm.as_str()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Request fields, ordered by key (byte-wise).
pub struct ParameterSet(BTreeMap<String, String>);

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a field, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Insert a field only when a value is present.
    pub fn insert_opt(&mut self, key: impl Into<String>, value: Option<impl Into<String>>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Flatten into form pairs, in key order.
    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.0.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// `appid + appkey + sorted pairs + appid + appkey`, skipping [`UNSIGNED_FIELDS`].
pub fn canonical_string(credential: &Credential, params: &ParameterSet) -> String {
    let joined = params
        .iter()
        .filter(|(key, _)| !UNSIGNED_FIELDS.contains(key))
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    let id = credential.app_id.as_str();
    let key = credential.app_key.as_str();
    format!("{id}{key}{joined}{id}{key}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// What [`Signer::preview`] computed, for troubleshooting rejected signatures.
pub struct SignaturePreview {
    /// The hashed input; `None` in plaintext mode.
    pub canonical: Option<String>,
    pub signature: String,
}

#[derive(Debug, Clone, Copy)]
/// Computes signatures for one credential under one auth mode.
///
/// Pure: no I/O, no shared state. Safe to use from any number of threads.
pub struct Signer<'a> {
    credential: &'a Credential,
    mode: AuthMode,
}

impl<'a> Signer<'a> {
    pub fn new(credential: &'a Credential, mode: AuthMode) -> Self {
        Self { credential, mode }
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    /// Signature for `params` at `timestamp`.
    ///
    /// Digest mode signs a copy of `params` with `appid` and `timestamp` added;
    /// the caller's set is left untouched.
    pub fn sign(&self, params: &ParameterSet, timestamp: UnixTimestamp) -> String {
        self.preview(params, timestamp).signature
    }

    /// Like [`Signer::sign`], but also returns the canonical string.
    pub fn preview(&self, params: &ParameterSet, timestamp: UnixTimestamp) -> SignaturePreview {
        match self.mode {
            AuthMode::Plaintext => SignaturePreview {
                canonical: None,
                signature: self.credential.app_key.as_str().to_owned(),
            },
            AuthMode::Digest(algorithm) => {
                let mut signed = params.clone();
                signed.insert(AppId::FIELD, self.credential.app_id.as_str());
                signed.insert(UnixTimestamp::FIELD, timestamp.to_string());
                let canonical = canonical_string(self.credential, &signed);
                let signature = algorithm.hex_digest(&canonical);
                SignaturePreview {
                    canonical: Some(canonical),
                    signature,
                }
            }
        }
    }

    /// Turn an unsigned parameter set into the set sent on the wire.
    ///
    /// Digest mode adds `appid`, `sign_type`, `timestamp` and `signature`
    /// (`sign_type` is itself signed). Plaintext mode adds `appid` and
    /// `signature = appkey` only. A stale `signature` is always replaced.
    pub fn authorize(&self, mut params: ParameterSet, timestamp: UnixTimestamp) -> ParameterSet {
        params.remove(SIGNATURE_FIELD);
        params.insert(AppId::FIELD, self.credential.app_id.as_str());
        if let AuthMode::Digest(algorithm) = self.mode {
            params.insert(SIGN_TYPE_FIELD, algorithm.as_str());
            params.insert(UnixTimestamp::FIELD, timestamp.to_string());
        }
        let signature = self.sign(&params, timestamp);
        params.insert(SIGNATURE_FIELD, signature);
        params
    }
}
