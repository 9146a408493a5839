//! 256-bit signature hash carried through the authorization signing chain.
//!
//! The textual form is plain lowercase hex in byte order.
use crate::util::{Error, Result, Serializable};
use bitcoin_hashes::{sha512_256, Hash as BHHash};
use std::fmt;
use std::io;
use std::io::{Read, Write};

/// Length of a sighash in bytes.
pub const SIGHASH_SIZE: usize = 32;

/// 256-bit sighash.
#[derive(Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SigHash(pub [u8; SIGHASH_SIZE]);

impl SigHash {
    /// Converts the hash into a hex string.
    #[must_use]
    #[inline]
    pub fn encode(&self) -> String {
        hex::encode(self.0)
    }

    /// Converts a string of 64 hex characters into a hash.
    pub fn decode(s: &str) -> Result<SigHash> {
        let decoded_bytes = hex::decode(s)?;
        if decoded_bytes.len() != SIGHASH_SIZE {
            return Err(Error::BadArgument(format!("Length {} of decoded bytes", decoded_bytes.len())));
        }
        let mut hash_bytes = [0; SIGHASH_SIZE];
        hash_bytes.copy_from_slice(&decoded_bytes);
        Ok(SigHash(hash_bytes))
    }

    /// Borrows the raw bytes.
    #[must_use]
    #[inline]
    pub fn as_bytes(&self) -> &[u8; SIGHASH_SIZE] {
        &self.0
    }
}

impl Serializable<SigHash> for SigHash {
    fn read(reader: &mut dyn Read) -> Result<SigHash> {
        let mut bytes = [0; SIGHASH_SIZE];
        reader.read_exact(&mut bytes)?;
        Ok(SigHash(bytes))
    }
    fn write(&self, writer: &mut dyn Write) -> io::Result<()> {
        writer.write_all(&self.0)
    }
}

/// Hashes a data array with SHA-512/256.
///
/// This is the one hash used for every link of the sighash chain.
#[must_use]
#[inline]
pub fn hash32(data: &[u8]) -> SigHash {
    SigHash(sha512_256::Hash::hash(data).to_byte_array())
}

impl fmt::Debug for SigHash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl fmt::Display for SigHash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}
