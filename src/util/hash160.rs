//! Hash160 computation (SHA256 then RIPEMD160), the 20-byte signer hash.

use crate::util::{Error, Result, Serializable};
use bitcoin_hashes::{hash160 as bh_hash160, Hash as BHHash};
use std::fmt;
use std::io;
use std::io::{Read, Write};

/// 20-byte hash identifying the key(s) behind a spending condition.
#[derive(Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hash160(pub [u8; 20]);

impl Hash160 {
    /// Converts the hash into a hex string.
    #[must_use]
    #[inline]
    pub fn encode(&self) -> String {
        hex::encode(self.0)
    }

    /// Converts a string of 40 hex characters into a hash.
    pub fn decode(s: &str) -> Result<Hash160> {
        let bytes = hex::decode(s)?;
        let array: [u8; 20] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| Error::BadArgument(format!("Length {} of decoded bytes", v.len())))?;
        Ok(Hash160(array))
    }
}

/// Computes Hash160 (RIPEMD160(SHA256(data))).
#[must_use]
#[inline]
pub fn hash160(data: &[u8]) -> Hash160 {
    let h = bh_hash160::Hash::hash(data).to_byte_array();
    Hash160(h)
}

impl From<[u8; 20]> for Hash160 {
    fn from(bytes: [u8; 20]) -> Self {
        Hash160(bytes)
    }
}

impl Serializable<Hash160> for Hash160 {
    fn read(reader: &mut dyn Read) -> Result<Hash160> {
        let mut bytes = [0; 20];
        reader.read_exact(&mut bytes)?;
        Ok(Hash160(bytes))
    }
    fn write(&self, writer: &mut dyn Write) -> io::Result<()> {
        writer.write_all(&self.0)
    }
}

impl fmt::Debug for Hash160 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl fmt::Display for Hash160 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn tohash160() {
        let pubkey = hex!("126999eabe3f84a3a9f5c09e87faab27484818a0ec1d67b94c9a02e40268499d98538cf770198550adfb9d1d473e5e926bb00e4c58baec1fb42ffa6069781003e4");
        let expected = hex!("3c231b5e624a42e99a87160c6e4231718a6d77c0");
        assert_eq!(hash160(&pubkey).0, expected);
    }

    #[test]
    fn decode_rejects_wrong_length() {
        assert!(Hash160::decode("3c231b5e624a42e99a87160c6e4231718a6d77c0").is_ok());
        assert!(Hash160::decode("3c231b5e624a42e99a87160c6e4231718a6d77").is_err());
        assert!(Hash160::decode("zz231b5e624a42e99a87160c6e4231718a6d77c0").is_err());
    }

    #[test]
    fn write_read() -> Result<()> {
        let h = Hash160([0x11; 20]);
        let mut v = Vec::new();
        h.write(&mut v)?;
        assert_eq!(v.len(), 20);
        assert_eq!(Hash160::read(&mut Cursor::new(&v))?, h);
        Ok(())
    }
}
