//! Fixed-width recoverable signatures.

use crate::util::{Error, Result, Serializable, SigHash};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, Secp256k1};
use std::fmt;
use std::io;
use std::io::{Read, Write};

/// Encoded size of a recoverable signature: recovery id, then r and s.
pub const MESSAGE_SIGNATURE_ENCODED_SIZE: usize = 65;

/// A 65-byte recoverable ECDSA signature laid out as `recid ‖ r ‖ s`.
///
/// The all-zero value is the "no signature" sentinel, see [`MessageSignature::empty`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageSignature(pub [u8; MESSAGE_SIGNATURE_ENCODED_SIZE]);

impl MessageSignature {
    /// The unset sentinel.
    #[must_use]
    #[inline]
    pub const fn empty() -> MessageSignature {
        MessageSignature([0; MESSAGE_SIGNATURE_ENCODED_SIZE])
    }

    /// Whether this is the unset sentinel.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        *self == MessageSignature::empty()
    }

    /// Copies a signature out of a slice.
    ///
    /// # Errors
    /// `Error::InvalidSignatureLength` unless the slice is exactly 65 bytes.
    pub fn from_raw(bytes: &[u8]) -> Result<MessageSignature> {
        let array: [u8; MESSAGE_SIGNATURE_ENCODED_SIZE] = bytes
            .try_into()
            .map_err(|_| Error::InvalidSignatureLength(bytes.len()))?;
        Ok(MessageSignature(array))
    }

    /// Encodes a secp256k1 recoverable signature.
    pub fn from_recoverable(sig: &RecoverableSignature) -> Result<MessageSignature> {
        let (recid, compact) = sig.serialize_compact();
        let recid = u8::try_from(recid.to_i32())
            .map_err(|_| Error::BadData("Recovery id out of range".to_string()))?;
        let mut bytes = [0u8; MESSAGE_SIGNATURE_ENCODED_SIZE];
        bytes[0] = recid;
        bytes[1..].copy_from_slice(&compact);
        Ok(MessageSignature(bytes))
    }

    /// Decodes into a secp256k1 recoverable signature.
    pub fn to_recoverable(&self) -> Result<RecoverableSignature> {
        let recid = RecoveryId::from_i32(i32::from(self.0[0]))?;
        Ok(RecoverableSignature::from_compact(&self.0[1..], recid)?)
    }

    /// Recovers the public key that produced this signature over `hash`.
    pub fn recover(&self, hash: &SigHash) -> Result<secp256k1::PublicKey> {
        let secp = Secp256k1::verification_only();
        let message = Message::from_digest(hash.0);
        Ok(secp.recover_ecdsa(&message, &self.to_recoverable()?)?)
    }

    /// Borrows the raw bytes.
    #[must_use]
    #[inline]
    pub fn as_bytes(&self) -> &[u8; MESSAGE_SIGNATURE_ENCODED_SIZE] {
        &self.0
    }
}

impl Default for MessageSignature {
    fn default() -> Self {
        MessageSignature::empty()
    }
}

impl Serializable<MessageSignature> for MessageSignature {
    fn read(reader: &mut dyn Read) -> Result<MessageSignature> {
        let mut bytes = [0; MESSAGE_SIGNATURE_ENCODED_SIZE];
        reader.read_exact(&mut bytes)?;
        Ok(MessageSignature(bytes))
    }
    fn write(&self, writer: &mut dyn Write) -> io::Result<()> {
        writer.write_all(&self.0)
    }
}

impl fmt::Debug for MessageSignature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}
