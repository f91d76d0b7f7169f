//! Content fingerprint used for idempotent output naming.

use md5::{Digest, Md5};
use std::fmt;
use std::io::Read;

/// 128-bit content hash of a source file.
///
/// Only used to derive a stable output identifier. Collisions are an
/// unlikely name clash, not an integrity failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 16]);

impl Fingerprint {
    /// Hash an in-memory byte stream.
    pub fn of_bytes(data: &[u8]) -> Self {
        let mut hasher = Md5::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Hash a reader in 8 KiB chunks.
    pub fn of_reader<R: Read>(mut reader: R) -> std::io::Result<Self> {
        let mut hasher = Md5::new();
        let mut buf = [0u8; 8192];
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(Self(hasher.finalize().into()))
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Lowercase hex digest (32 characters).
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Output identifier: `stem + "_" + first 8 hex chars`.
    pub fn identifier(&self, stem: &str) -> String {
        let hex = self.to_hex();
        format!("{}_{}", stem, &hex[..8])
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
