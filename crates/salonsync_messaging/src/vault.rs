// --- File: crates/salonsync_messaging/src/vault.rs ---
//! AES-256-GCM protection for channel secrets at rest.
//!
//! Stored form is `base64(nonce || ciphertext || tag)` with a fresh 96-bit
//! nonce per encryption. The key comes from configuration only.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use salonsync_config::VaultConfig;

use crate::error::VaultError;

pub const KEY_LEN: usize = 32;

pub struct CredentialVault {
    key: LessSafeKey,
    rng: SystemRandom,
}

impl CredentialVault {
    pub fn new(key_bytes: &[u8]) -> Result<Self, VaultError> {
        if key_bytes.len() != KEY_LEN {
            return Err(VaultError::InvalidKey(format!(
                "expected {} bytes, got {}",
                KEY_LEN,
                key_bytes.len()
            )));
        }
        let unbound = UnboundKey::new(&AES_256_GCM, key_bytes)
            .map_err(|_| VaultError::InvalidKey("rejected by AES-256-GCM".to_string()))?;
        Ok(Self {
            key: LessSafeKey::new(unbound),
            rng: SystemRandom::new(),
        })
    }

    /// Builds the vault from a base64 encoded key.
    pub fn from_base64_key(encoded: &str) -> Result<Self, VaultError> {
        let key_bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| VaultError::InvalidKey(e.to_string()))?;
        Self::new(&key_bytes)
    }

    pub fn from_config(config: &VaultConfig) -> Result<Self, VaultError> {
        Self::from_base64_key(&config.encryption_key)
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, VaultError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| VaultError::EncryptionFailed)?;

        let mut in_out = plaintext.as_bytes().to_vec();
        self.key
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::empty(),
                &mut in_out,
            )
            .map_err(|_| VaultError::EncryptionFailed)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + in_out.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&in_out);
        Ok(STANDARD.encode(sealed))
    }

    pub fn decrypt(&self, encoded: &str) -> Result<String, VaultError> {
        let sealed = STANDARD
            .decode(encoded.trim())
            .map_err(|e| VaultError::DecryptionFailed(format!("not base64: {}", e)))?;
        if sealed.len() < NONCE_LEN + AES_256_GCM.tag_len() {
            return Err(VaultError::DecryptionFailed(
                "ciphertext too short".to_string(),
            ));
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
            .map_err(|_| VaultError::DecryptionFailed("bad nonce".to_string()))?;
        let mut in_out = ciphertext.to_vec();
        let plaintext = self
            .key
            .open_in_place(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| VaultError::DecryptionFailed("authentication failed".to_string()))?;

        String::from_utf8(plaintext.to_vec())
            .map_err(|_| VaultError::DecryptionFailed("plaintext is not UTF-8".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault(fill: u8) -> CredentialVault {
        CredentialVault::new(&[fill; KEY_LEN]).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let vault = vault(7);
        let sealed = vault.encrypt("channel-secret").unwrap();
        assert_ne!(sealed, "channel-secret");
        assert_eq!(vault.decrypt(&sealed).unwrap(), "channel-secret");
    }

    #[test]
    fn test_fresh_nonce_per_encryption() {
        let vault = vault(7);
        assert_ne!(vault.encrypt("same").unwrap(), vault.encrypt("same").unwrap());
    }

    #[test]
    fn test_wrong_key_fails() {
        let sealed = vault(7).encrypt("token").unwrap();
        assert!(matches!(
            vault(8).decrypt(&sealed),
            Err(VaultError::DecryptionFailed(_))
        ));
    }

    #[test]
    fn test_tampering_fails() {
        let vault = vault(7);
        let mut sealed = STANDARD.decode(vault.encrypt("token").unwrap()).unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        assert!(vault.decrypt(&STANDARD.encode(sealed)).is_err());
    }

    #[test]
    fn test_malformed_input_fails() {
        let vault = vault(7);
        assert!(vault.decrypt("not base64!").is_err());
        assert!(vault.decrypt(&STANDARD.encode([1u8; 8])).is_err());
    }

    #[test]
    fn test_key_must_be_32_bytes() {
        assert!(matches!(
            CredentialVault::from_base64_key(&STANDARD.encode([0u8; 16])),
            Err(VaultError::InvalidKey(_))
        ));
        assert!(CredentialVault::from_base64_key(&STANDARD.encode([0u8; 32])).is_ok());
    }

    #[test]
    fn test_decryption_error_maps_to_reconfigure_status() {
        let err: salonsync_common::SalonError =
            vault(8).decrypt(&vault(7).encrypt("x").unwrap()).unwrap_err().into();
        assert!(matches!(err, salonsync_common::SalonError::DecryptionError(_)));
    }
}
