/*!
 * Authenticated encryption of provider API keys.
 *
 * Each record is sealed with a fresh AES-256-GCM data key. The data key is
 * wrapped with RSA-OAEP (SHA-256) under the session key pair, and an
 * HMAC-SHA256 tag over the ciphertext and nonce guards the whole record.
 *
 * Record layout, all hex encoded:
 * - `ciphertext`: wrapped data key followed by the GCM output
 * - `nonce`: 12 byte GCM nonce
 * - `mac`: HMAC-SHA256 over `ciphertext || nonce`
 *
 * Decryption fails closed: callers get an empty string, never a panic.
 */

use std::fmt;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use hmac::{Hmac, Mac};
use log::warn;
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::errors::CredentialError;

type HmacSha256 = Hmac<Sha256>;

/// GCM nonce length in bytes
pub const NONCE_LEN: usize = 12;

/// An encrypted credential. Replaced wholesale, never edited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub ciphertext: String,
    pub mac: String,
    pub nonce: String,
}

impl CredentialRecord {
    /// An empty slot placeholder
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn is_blank(&self) -> bool {
        self.ciphertext.trim().is_empty() && self.mac.trim().is_empty() && self.nonce.trim().is_empty()
    }

    /// Every field must be present before any cryptography is attempted
    pub fn validate(&self) -> Result<(), CredentialError> {
        if self.ciphertext.trim().is_empty() {
            return Err(CredentialError::MissingField("ciphertext"));
        }
        if self.mac.trim().is_empty() {
            return Err(CredentialError::MissingField("mac"));
        }
        if self.nonce.trim().is_empty() {
            return Err(CredentialError::MissingField("nonce"));
        }
        Ok(())
    }
}

/// Trim and drop control characters before sealing
pub fn sanitize_secret(plaintext: &str) -> String {
    plaintext.trim().chars().filter(|c| !c.is_control()).collect()
}

/// Session-scoped vault holding the key pair and the MAC key
pub struct CredentialVault {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
    mac_key: Vec<u8>,
}

impl fmt::Debug for CredentialVault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialVault")
            .field("key_bits", &(self.public_key.size() * 8))
            .finish_non_exhaustive()
    }
}

impl CredentialVault {
    pub const DEFAULT_KEY_BITS: usize = 2048;

    /// Create a vault with a fresh 2048-bit key pair
    pub fn generate() -> Result<Self, CredentialError> {
        Self::with_key_size(Self::DEFAULT_KEY_BITS)
    }

    /// Create a vault with a key pair of the given modulus size
    pub fn with_key_size(bits: usize) -> Result<Self, CredentialError> {
        let private_key = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| CredentialError::KeyGeneration(e.to_string()))?;
        let public_key = RsaPublicKey::from(&private_key);
        let mac_key = Aes256Gcm::generate_key(OsRng).to_vec();

        Ok(Self {
            private_key,
            public_key,
            mac_key,
        })
    }

    fn mac(&self, ciphertext: &str, nonce: &str) -> Result<HmacSha256, CredentialError> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.mac_key)
            .map_err(|e| CredentialError::Encryption(e.to_string()))?;
        mac.update(ciphertext.as_bytes());
        mac.update(nonce.as_bytes());
        Ok(mac)
    }

    /// Seal a plaintext key into a new record
    pub fn encrypt(&self, plaintext: &str) -> Result<CredentialRecord, CredentialError> {
        let secret = sanitize_secret(plaintext);
        if secret.is_empty() {
            return Err(CredentialError::MissingField("plaintext"));
        }

        let data_key = Aes256Gcm::generate_key(OsRng);
        let cipher = Aes256Gcm::new(&data_key);
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = cipher
            .encrypt(&nonce, secret.as_bytes())
            .map_err(|e| CredentialError::Encryption(e.to_string()))?;

        let wrapped = self
            .public_key
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), data_key.as_slice())
            .map_err(|e| CredentialError::Encryption(e.to_string()))?;

        let mut blob = wrapped;
        blob.extend_from_slice(&sealed);

        let ciphertext = hex::encode(blob);
        let nonce = hex::encode(nonce);
        let mac = hex::encode(self.mac(&ciphertext, &nonce)?.finalize().into_bytes());

        Ok(CredentialRecord { ciphertext, mac, nonce })
    }

    /// Open a record, reporting why it failed
    pub fn try_decrypt(&self, record: &CredentialRecord) -> Result<String, CredentialError> {
        record.validate()?;

        let nonce = hex::decode(record.nonce.trim()).map_err(|_| CredentialError::InvalidNonce(record.nonce.len()))?;
        if nonce.len() != NONCE_LEN {
            return Err(CredentialError::InvalidNonce(nonce.len()));
        }

        let tag = hex::decode(record.mac.trim()).map_err(|_| CredentialError::Integrity)?;
        self.mac(&record.ciphertext, &record.nonce)?
            .verify_slice(&tag)
            .map_err(|_| CredentialError::Integrity)?;

        let blob = hex::decode(&record.ciphertext).map_err(|e| CredentialError::Decryption(e.to_string()))?;
        let wrapped_len = self.private_key.size();
        if blob.len() <= wrapped_len {
            return Err(CredentialError::Decryption("ciphertext too short".to_string()));
        }
        let (wrapped, sealed) = blob.split_at(wrapped_len);

        let data_key = self
            .private_key
            .decrypt(Oaep::new::<Sha256>(), wrapped)
            .map_err(|e| CredentialError::Decryption(e.to_string()))?;
        let cipher = <Aes256Gcm as KeyInit>::new_from_slice(&data_key)
            .map_err(|e| CredentialError::Decryption(e.to_string()))?;
        let plain = cipher
            .decrypt(Nonce::from_slice(&nonce), sealed)
            .map_err(|e| CredentialError::Decryption(e.to_string()))?;

        String::from_utf8(plain).map_err(|e| CredentialError::Decryption(e.to_string()))
    }

    /// Open a record; any failure yields an empty string
    pub fn decrypt(&self, record: &CredentialRecord) -> String {
        match self.try_decrypt(record) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                warn!("Credential rejected: {}", e);
                String::new()
            }
        }
    }
}
