use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use sha2::Sha256;

use crate::core::error::{BootError, BootResult};

/// Hash algorithms a repository may publish next to an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HashType {
    #[default]
    Sha1,
    Sha256,
    Md5,
}

impl HashType {
    /// Sidecar file extension used by Maven repositories (`.sha1`, ...).
    pub fn extension(self) -> &'static str {
        match self {
            HashType::Sha1 => "sha1",
            HashType::Sha256 => "sha256",
            HashType::Md5 => "md5",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HashType::Sha1 => "SHA-1",
            HashType::Sha256 => "SHA-256",
            HashType::Md5 => "MD5",
        }
    }

    pub fn digest_hex(self, bytes: &[u8]) -> String {
        match self {
            HashType::Sha1 => hex::encode(Sha1::digest(bytes)),
            HashType::Sha256 => hex::encode(Sha256::digest(bytes)),
            HashType::Md5 => hex::encode(Md5::digest(bytes)),
        }
    }
}

/// Expected digest of a remote resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checksum {
    pub hash_type: HashType,
    pub value: String,
}

impl Checksum {
    pub fn new(hash_type: HashType, value: impl Into<String>) -> Self {
        Self {
            hash_type,
            value: value.into(),
        }
    }

    /// Parse a sidecar file body. Sidecars may carry a trailing file name
    /// (`<hex>  file.jar`), only the first token is the digest.
    pub fn from_sidecar(hash_type: HashType, body: &str) -> Option<Self> {
        let token = body.split_whitespace().next()?;
        if token.is_empty() || !token.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        Some(Self::new(hash_type, token.to_ascii_lowercase()))
    }

    pub fn verify(&self, location: &str, bytes: &[u8]) -> BootResult<()> {
        let actual = self.hash_type.digest_hex(bytes);
        if actual.eq_ignore_ascii_case(&self.value) {
            return Ok(());
        }
        Err(BootError::ChecksumMismatch {
            location: location.to_string(),
            algorithm: self.hash_type.label(),
            expected: self.value.clone(),
            actual,
        })
    }
}
