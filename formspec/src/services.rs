//! Collaborator services used by leaf visitors.
//!
//! - [`PasswordStore`] enumerates stored passwords a spec may reference.
//! - [`TransitCipher`] protects explicit passwords on their way through the
//!   frontend, so plaintext never appears in rendered output.

use std::{collections::BTreeMap, fmt, sync::Arc};

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Error raised by a [`TransitCipher`].
#[derive(Debug, Error)]
pub enum CipherError {
    /// The ciphertext is not in the expected format.
    #[error("malformed ciphertext")]
    Malformed,
    /// Integrity check failed: wrong key or tampered data.
    #[error("ciphertext authentication failed")]
    Authentication,
    /// Decrypted bytes are not UTF-8.
    #[error("decrypted password is not valid UTF-8")]
    Encoding,
    /// The configured key is unusable.
    #[error("invalid key: {0}")]
    Key(String),
}

/// Encrypts passwords for the frontend round trip.
pub trait TransitCipher: Send + Sync {
    /// Encrypt a plaintext password.
    fn encrypt(&self, plaintext: &str) -> Result<String, CipherError>;
    /// Decrypt a value produced by [`TransitCipher::encrypt`].
    fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError>;
}

const NONCE_LEN: usize = 16;
const TAG_LEN: usize = 32;

/// Default transit cipher.
///
/// SHA-256 in counter mode over `key || nonce || counter` produces the
/// keystream. An HMAC-SHA256 under a separate derived key over
/// `nonce || len(ciphertext) || ciphertext` guards integrity. Output is `hex(nonce) . hex(ciphertext) . hex(tag)` joined with
/// `$`. The random nonce makes encrypting the same password twice yield
/// different ciphertexts.
pub struct StreamCipher {
    key: [u8; 32],
    mac_key: [u8; 32],
}

impl fmt::Debug for StreamCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StreamCipher(..)")
    }
}

impl StreamCipher {
    /// Cipher with a fresh random key, valid for this process only.
    pub fn random() -> Self {
        Self::from_key(rand::random())
    }

    /// Cipher keyed by arbitrary key material.
    pub fn from_key_material(material: &[u8]) -> Self {
        let mut key = [0u8; 32];
        key.copy_from_slice(&Sha256::digest(material));
        Self::from_key(key)
    }

    fn from_key(key: [u8; 32]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"formspec transit mac");
        hasher.update(key);
        let mut mac_key = [0u8; 32];
        mac_key.copy_from_slice(&hasher.finalize());
        Self { key, mac_key }
    }

    /// Cipher keyed by a hex string.
    pub fn from_hex_key(hex_key: &str) -> Result<Self, CipherError> {
        let material = hex::decode(hex_key.trim()).map_err(|e| CipherError::Key(e.to_string()))?;
        if material.len() < 16 {
            return Err(CipherError::Key(
                "key must be at least 16 bytes".to_string(),
            ));
        }
        Ok(Self::from_key_material(&material))
    }

    fn keystream_xor(&self, nonce: &[u8], data: &mut [u8]) {
        for (counter, chunk) in data.chunks_mut(32).enumerate() {
            let mut hasher = Sha256::new();
            hasher.update(self.key);
            hasher.update(nonce);
            hasher.update((counter as u64).to_be_bytes());
            let block = hasher.finalize();
            for (byte, k) in chunk.iter_mut().zip(block.iter()) {
                *byte ^= k;
            }
        }
    }

    fn mac(&self, nonce: &[u8], ciphertext: &[u8]) -> Result<HmacSha256, CipherError> {
        let mut mac = HmacSha256::new_from_slice(&self.mac_key)
            .map_err(|e| CipherError::Key(e.to_string()))?;
        mac.update(nonce);
        mac.update(&(ciphertext.len() as u64).to_be_bytes());
        mac.update(ciphertext);
        Ok(mac)
    }
}

impl TransitCipher for StreamCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let nonce: [u8; NONCE_LEN] = rand::random();
        let mut data = plaintext.as_bytes().to_vec();
        self.keystream_xor(&nonce, &mut data);
        let tag = self.mac(&nonce, &data)?.finalize().into_bytes();
        Ok(format!(
            "{}${}${}",
            hex::encode(nonce),
            hex::encode(&data),
            hex::encode(tag)
        ))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError> {
        let mut parts = ciphertext.split('$');
        let (Some(nonce), Some(data), Some(tag), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(CipherError::Malformed);
        };
        let nonce = hex::decode(nonce).map_err(|_| CipherError::Malformed)?;
        let mut data = hex::decode(data).map_err(|_| CipherError::Malformed)?;
        let tag = hex::decode(tag).map_err(|_| CipherError::Malformed)?;
        if nonce.len() != NONCE_LEN || tag.len() != TAG_LEN {
            return Err(CipherError::Malformed);
        }
        let expected = self.mac(&nonce, &data)?.finalize().into_bytes();
        if !bool::from(expected.as_slice().ct_eq(&tag)) {
            return Err(CipherError::Authentication);
        }
        self.keystream_xor(&nonce, &mut data);
        String::from_utf8(data).map_err(|_| CipherError::Encoding)
    }
}

/// Source of stored passwords a password spec may reference.
pub trait PasswordStore: Send + Sync {
    /// `(id, title)` of every stored password visible to the current user.
    fn entries(&self) -> Vec<(String, String)>;

    /// Whether `id` names a stored password.
    fn contains(&self, id: &str) -> bool {
        self.entries().iter().any(|(entry, _)| entry == id)
    }
}

/// Password store backed by a map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPasswordStore {
    entries: BTreeMap<String, String>,
}

impl InMemoryPasswordStore {
    /// Store holding `(id, title)` entries.
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl PasswordStore for InMemoryPasswordStore {
    fn entries(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }
}

/// Collaborators handed to every visitor.
#[derive(Clone)]
pub struct Services {
    /// Password store.
    pub password_store: Arc<dyn PasswordStore>,
    /// Transit cipher for explicit passwords.
    pub cipher: Arc<dyn TransitCipher>,
}

impl Default for Services {
    fn default() -> Self {
        Self {
            password_store: Arc::new(InMemoryPasswordStore::default()),
            cipher: Arc::new(StreamCipher::random()),
        }
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cipher_roundtrip() {
        let cipher = StreamCipher::random();
        let ct = cipher.encrypt("secret").unwrap();
        assert!(!ct.contains("secret"));
        assert_eq!(cipher.decrypt(&ct).unwrap(), "secret");
        // nonce makes ciphertexts differ
        assert_ne!(ct, cipher.encrypt("secret").unwrap());
    }

    #[test]
    fn test_cipher_long_plaintext() {
        let cipher = StreamCipher::from_key_material(b"test key");
        let plaintext = "x".repeat(100);
        let ct = cipher.encrypt(&plaintext).unwrap();
        assert_eq!(cipher.decrypt(&ct).unwrap(), plaintext);
    }

    #[test]
    fn test_cipher_rejects_tampering() {
        let cipher = StreamCipher::random();
        let ct = cipher.encrypt("secret").unwrap();
        let other = StreamCipher::random();
        assert!(matches!(
            other.decrypt(&ct),
            Err(CipherError::Authentication)
        ));
        assert!(matches!(
            cipher.decrypt("not-a-ciphertext"),
            Err(CipherError::Malformed)
        ));
    }

    #[test]
    fn test_cipher_rejects_modified_tag_and_ciphertext() {
        let cipher = StreamCipher::from_key_material(b"test key");
        let ct = cipher.encrypt("secret").unwrap();
        let parts: Vec<&str> = ct.split('$').collect();
        let flip = |hex_str: &str| {
            let mut bytes = hex::decode(hex_str).unwrap();
            bytes[0] ^= 1;
            hex::encode(bytes)
        };

        let bad_tag = format!("{}${}${}", parts[0], parts[1], flip(parts[2]));
        assert!(matches!(cipher.decrypt(&bad_tag), Err(CipherError::Authentication)));

        let bad_data = format!("{}${}${}", parts[0], flip(parts[1]), parts[2]);
        assert!(matches!(cipher.decrypt(&bad_data), Err(CipherError::Authentication)));

        // truncated ciphertext must not verify under the original tag
        let truncated = format!("{}${}${}", parts[0], &parts[1][..parts[1].len() - 2], parts[2]);
        assert!(matches!(cipher.decrypt(&truncated), Err(CipherError::Authentication)));
    }

    #[test]
    fn test_cipher_tag_is_hmac_sha256() {
        let cipher = StreamCipher::from_key_material(b"test key");
        let ct = cipher.encrypt("pw").unwrap();
        let parts: Vec<&str> = ct.split('$').collect();
        let nonce = hex::decode(parts[0]).unwrap();
        let data = hex::decode(parts[1]).unwrap();

        let mut mac = HmacSha256::new_from_slice(&cipher.mac_key).unwrap();
        mac.update(&nonce);
        mac.update(&(data.len() as u64).to_be_bytes());
        mac.update(&data);
        mac.verify_slice(&hex::decode(parts[2]).unwrap()).unwrap();
        assert_ne!(cipher.mac_key, cipher.key);
    }

    #[test]
    fn test_hex_key() {
        assert!(StreamCipher::from_hex_key("00112233445566778899aabbccddeeff").is_ok());
        assert!(matches!(
            StreamCipher::from_hex_key("abcd"),
            Err(CipherError::Key(_))
        ));
    }

    #[test]
    fn test_in_memory_store() {
        let store = InMemoryPasswordStore::new([("db", "Database")]);
        assert!(store.contains("db"));
        assert!(!store.contains("web"));
        assert_eq!(store.entries(), vec![("db".to_string(), "Database".to_string())]);
    }
}
