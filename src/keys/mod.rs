//! secp256k1 keys and the signing primitive used by the sighash chain.
//!
//! The chain only needs two things from a key: a 65-byte recoverable signature over
//! a 32-byte hash, and the public key (so it knows the key encoding). Both are
//! behind [`SigningKey`], so hardware or remote signers can stand in for
//! [`PrivateKey`].

mod signature;

pub use self::signature::{MESSAGE_SIGNATURE_ENCODED_SIZE, MessageSignature};

use crate::util::{Error, Result, SigHash};
use secp256k1::{Message, Secp256k1, SecretKey};
use std::fmt;

/// Whether a public key is committed to in compressed or uncompressed form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PublicKeyEncoding {
    /// 33-byte SEC1 encoding
    Compressed = 0x00,
    /// 65-byte SEC1 encoding
    Uncompressed = 0x01,
}

impl PublicKeyEncoding {
    /// Parses the wire byte.
    #[must_use]
    pub fn from_u8(n: u8) -> Option<PublicKeyEncoding> {
        match n {
            0x00 => Some(PublicKeyEncoding::Compressed),
            0x01 => Some(PublicKeyEncoding::Uncompressed),
            _ => None,
        }
    }

    /// The wire byte.
    #[must_use]
    #[inline]
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

/// A secp256k1 public key together with the encoding it is committed to in.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey {
    key: secp256k1::PublicKey,
    compressed: bool,
}

impl PublicKey {
    /// Wraps a curve point.
    #[must_use]
    pub fn new(key: secp256k1::PublicKey, compressed: bool) -> PublicKey {
        PublicKey { key, compressed }
    }

    /// Parses a 33-byte compressed or 65-byte uncompressed SEC1 key.
    pub fn from_slice(bytes: &[u8]) -> Result<PublicKey> {
        let compressed = match bytes.len() {
            33 => true,
            65 => false,
            n => return Err(Error::BadArgument(format!("Invalid public key length: {}", n))),
        };
        let key = secp256k1::PublicKey::from_slice(bytes)?;
        Ok(PublicKey { key, compressed })
    }

    /// Parses a hex-encoded SEC1 key.
    pub fn from_hex(s: &str) -> Result<PublicKey> {
        PublicKey::from_slice(&hex::decode(s)?)
    }

    /// Whether the key is committed to in compressed form.
    #[must_use]
    #[inline]
    pub fn compressed(&self) -> bool {
        self.compressed
    }

    /// Changes the committed form without touching the point.
    #[inline]
    pub fn set_compressed(&mut self, compressed: bool) {
        self.compressed = compressed;
    }

    /// The key encoding flag for this key.
    #[must_use]
    #[inline]
    pub fn encoding(&self) -> PublicKeyEncoding {
        if self.compressed {
            PublicKeyEncoding::Compressed
        } else {
            PublicKeyEncoding::Uncompressed
        }
    }

    /// SEC1 bytes in the committed form (33 or 65 bytes).
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        if self.compressed {
            self.key.serialize().to_vec()
        } else {
            self.key.serialize_uncompressed().to_vec()
        }
    }

    /// SEC1 compressed bytes, regardless of the committed form.
    #[must_use]
    #[inline]
    pub fn to_bytes_compressed(&self) -> [u8; 33] {
        self.key.serialize()
    }

    /// The underlying curve point.
    #[must_use]
    #[inline]
    pub fn inner(&self) -> &secp256k1::PublicKey {
        &self.key
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hex::encode(self.to_bytes()))
    }
}

/// The external signing primitive consumed by the sighash chain.
pub trait SigningKey {
    /// Produces a 65-byte recoverable signature over a 32-byte hash.
    ///
    /// # Errors
    /// Whatever the underlying signer reports.
    fn sign(&self, hash: &SigHash) -> Result<MessageSignature>;

    /// The public key matching this signer.
    fn public_key(&self) -> PublicKey;
}

/// A secp256k1 private key that signs deterministically (RFC6979).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PrivateKey {
    key: SecretKey,
    compress_public: bool,
}

impl PrivateKey {
    /// Wraps a secret key.
    #[must_use]
    pub fn new(key: SecretKey, compress_public: bool) -> PrivateKey {
        PrivateKey { key, compress_public }
    }

    /// Parses 32 raw bytes (uncompressed public key) or 33 bytes ending in `0x01`
    /// (compressed public key).
    pub fn from_slice(bytes: &[u8]) -> Result<PrivateKey> {
        let compress_public = match bytes.len() {
            32 => false,
            33 if bytes[32] == 0x01 => true,
            33 => return Err(Error::BadArgument("Invalid private key compression byte".to_string())),
            n => return Err(Error::BadArgument(format!("Invalid private key length: {}", n))),
        };
        let key = SecretKey::from_slice(&bytes[..32])?;
        Ok(PrivateKey { key, compress_public })
    }

    /// Parses a hex-encoded private key, see [`PrivateKey::from_slice`].
    pub fn from_hex(s: &str) -> Result<PrivateKey> {
        PrivateKey::from_slice(&hex::decode(s)?)
    }

    /// Whether the matching public key is compressed.
    #[must_use]
    #[inline]
    pub fn compress_public(&self) -> bool {
        self.compress_public
    }
}

impl SigningKey for PrivateKey {
    fn sign(&self, hash: &SigHash) -> Result<MessageSignature> {
        let secp = Secp256k1::signing_only();
        let message = Message::from_digest(hash.0);
        let signature = secp.sign_ecdsa_recoverable(&message, &self.key);
        MessageSignature::from_recoverable(&signature)
    }

    fn public_key(&self) -> PublicKey {
        let secp = Secp256k1::signing_only();
        PublicKey::new(
            secp256k1::PublicKey::from_secret_key(&secp, &self.key),
            self.compress_public,
        )
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // Never print key material.
        write!(f, "PrivateKey({:?})", self.public_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::hash32;
    use pretty_assertions::assert_eq;

    const PRIVKEY: &str = "edf9aee84d9b7abc145504dde6726c64f369d37ee34ded868fabd876c26570bc01";

    #[test]
    fn private_key_compression_flag() -> Result<()> {
        let compressed = PrivateKey::from_hex(PRIVKEY)?;
        assert!(compressed.compress_public());
        assert_eq!(compressed.public_key().to_bytes().len(), 33);
        assert_eq!(compressed.public_key().encoding(), PublicKeyEncoding::Compressed);

        let uncompressed = PrivateKey::from_hex(&PRIVKEY[..64])?;
        assert!(!uncompressed.compress_public());
        assert_eq!(uncompressed.public_key().to_bytes().len(), 65);
        assert_eq!(uncompressed.public_key().encoding(), PublicKeyEncoding::Uncompressed);
        Ok(())
    }

    #[test]
    fn private_key_rejects_bad_input() {
        assert!(PrivateKey::from_hex(&format!("{}02", &PRIVKEY[..64])).is_err());
        assert!(PrivateKey::from_hex(&PRIVKEY[..62]).is_err());
        assert!(PrivateKey::from_slice(&[0u8; 32]).is_err());
    }

    #[test]
    fn sign_then_recover() -> Result<()> {
        let key = PrivateKey::from_hex(PRIVKEY)?;
        let hash = hash32(b"sighash");
        let sig = key.sign(&hash)?;
        assert!(!sig.is_empty());
        assert!(sig.0[0] <= 3);
        assert_eq!(&sig.recover(&hash)?, key.public_key().inner());
        Ok(())
    }

    #[test]
    fn signing_is_deterministic() -> Result<()> {
        let key = PrivateKey::from_hex(PRIVKEY)?;
        let hash = hash32(b"same input");
        assert_eq!(key.sign(&hash)?, key.sign(&hash)?);
        Ok(())
    }

    #[test]
    fn public_key_round_trip() -> Result<()> {
        let pk = PublicKey::from_hex("03ef2340518b5867b23598a9cf74611f8b98064f7d55cdb8c107c67b5efcbc5c77")?;
        assert!(pk.compressed());
        let mut uncompressed = pk;
        uncompressed.set_compressed(false);
        let bytes = uncompressed.to_bytes();
        assert_eq!(bytes.len(), 65);
        assert_eq!(PublicKey::from_slice(&bytes)?, uncompressed);
        assert_eq!(uncompressed.to_bytes_compressed().to_vec(), pk.to_bytes());
        assert_eq!(PublicKeyEncoding::from_u8(0x01), Some(PublicKeyEncoding::Uncompressed));
        assert_eq!(PublicKeyEncoding::from_u8(0x02), None);
        Ok(())
    }
}
