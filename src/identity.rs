//! Persisted node identity.
//!
//! Each node carries a versioned identity record: an 8-byte peer id, two
//! 32-byte key pairs, and a display nickname, persisted as a single binary
//! file. The codec layer treats peer ids and signatures as opaque byte
//! blocks, so this module is the seam where real Curve25519/Ed25519
//! primitives plug in.
//!
//! The key slots are currently filled with plain random bytes. They have the
//! right shape for the wire format and for storage, but no cryptographic
//! meaning; nothing in this crate signs or verifies with them.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};
use zeroize::Zeroize;

use crate::error::{ProtocolError, Result};
use crate::utils::ident::peer_id_to_hex;

/// Bump when the stored record layout changes; old files are rejected.
const IDENTITY_VERSION: u8 = 1;

/// Longest nickname stored, in bytes.
pub const MAX_NICKNAME_LEN: usize = 31;

/// A node's long-lived identity record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    version: u8,
    /// First 8 bytes of the noise public key; the wire-format sender id.
    pub peer_id: [u8; 8],
    noise_private_key: [u8; 32],
    pub noise_public_key: [u8; 32],
    signing_private_key: [u8; 32],
    pub signing_public_key: [u8; 32],
    nickname: String,
}

impl Identity {
    /// Generate a fresh identity with placeholder key material and a
    /// nickname derived from the peer id.
    pub fn generate() -> Result<Self> {
        let mut noise_private_key = [0u8; 32];
        let mut noise_public_key = [0u8; 32];
        let mut signing_private_key = [0u8; 32];
        let mut signing_public_key = [0u8; 32];
        for key in [
            &mut noise_private_key,
            &mut noise_public_key,
            &mut signing_private_key,
            &mut signing_public_key,
        ] {
            getrandom::fill(key)
                .map_err(|e| ProtocolError::IdentityError(format!("RNG unavailable: {e}")))?;
        }

        let mut peer_id = [0u8; 8];
        peer_id.copy_from_slice(&noise_public_key[..8]);

        let nickname = format!(
            "mesh_{:02x}{:02x}{:02x}{:02x}",
            peer_id[0], peer_id[1], peer_id[2], peer_id[3]
        );

        info!(nickname = %nickname, "created new identity");

        Ok(Self {
            version: IDENTITY_VERSION,
            peer_id,
            noise_private_key,
            noise_public_key,
            signing_private_key,
            signing_public_key,
            nickname,
        })
    }

    /// Load an identity record from a file.
    ///
    /// # Errors
    /// `ProtocolError::Io` when the file cannot be read,
    /// `ProtocolError::IdentityError` when it is malformed or from an
    /// incompatible version.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(&path)?;
        let identity: Identity = bincode::deserialize(&bytes)
            .map_err(|e| ProtocolError::IdentityError(format!("invalid identity file: {e}")))?;

        if identity.version != IDENTITY_VERSION {
            return Err(ProtocolError::IdentityError(format!(
                "unsupported identity version: {}",
                identity.version
            )));
        }

        info!(nickname = %identity.nickname, "loaded identity");
        Ok(identity)
    }

    /// Load the identity at `path`, or generate and persist a new one.
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(&path)
        } else {
            debug!("no identity file found, generating");
            let identity = Self::generate()?;
            identity.save(&path)?;
            Ok(identity)
        }
    }

    /// Persist the identity record, creating parent directories as needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let bytes = bincode::serialize(self)
            .map_err(|e| ProtocolError::IdentityError(format!("serialize failed: {e}")))?;
        std::fs::write(&path, bytes)?;
        debug!("identity saved");
        Ok(())
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// Set the display nickname, truncated to [`MAX_NICKNAME_LEN`] bytes on
    /// a character boundary.
    pub fn set_nickname(&mut self, nickname: &str) {
        let mut end = nickname.len().min(MAX_NICKNAME_LEN);
        while !nickname.is_char_boundary(end) {
            end -= 1;
        }
        self.nickname = nickname[..end].to_string();
        info!(nickname = %self.nickname, "nickname changed");
    }

    /// Hex text form of the peer id, as carried in chat messages.
    pub fn peer_id_hex(&self) -> String {
        peer_id_to_hex(&self.peer_id)
    }
}

impl Drop for Identity {
    fn drop(&mut self) {
        self.noise_private_key.zeroize();
        self.signing_private_key.zeroize();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn peer_id_comes_from_public_key() {
        let identity = Identity::generate().unwrap();
        assert_eq!(identity.peer_id, identity.noise_public_key[..8]);
    }

    #[test]
    fn default_nickname_derives_from_peer_id() {
        let identity = Identity::generate().unwrap();
        let expected = format!(
            "mesh_{:02x}{:02x}{:02x}{:02x}",
            identity.peer_id[0], identity.peer_id[1], identity.peer_id[2], identity.peer_id[3]
        );
        assert_eq!(identity.nickname(), expected);
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.bin");

        let mut original = Identity::generate().unwrap();
        original.set_nickname("alice");
        original.save(&path).unwrap();

        let loaded = Identity::load(&path).unwrap();
        assert_eq!(loaded.peer_id, original.peer_id);
        assert_eq!(loaded.noise_public_key, original.noise_public_key);
        assert_eq!(loaded.nickname(), "alice");
    }

    #[test]
    fn load_or_create_persists_first_identity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("identity.bin");

        let first = Identity::load_or_create(&path).unwrap();
        let second = Identity::load_or_create(&path).unwrap();
        assert_eq!(first.peer_id, second.peer_id);
    }

    #[test]
    fn corrupt_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.bin");
        std::fs::write(&path, b"not an identity").unwrap();
        assert!(matches!(
            Identity::load(&path),
            Err(ProtocolError::IdentityError(_))
        ));
    }

    #[test]
    fn long_nickname_truncated() {
        let mut identity = Identity::generate().unwrap();
        identity.set_nickname(&"n".repeat(100));
        assert_eq!(identity.nickname().len(), MAX_NICKNAME_LEN);
    }

    #[test]
    fn generated_identities_differ() {
        let a = Identity::generate().unwrap();
        let b = Identity::generate().unwrap();
        assert_ne!(a.peer_id, b.peer_id);
    }
}
