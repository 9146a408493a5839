//! Sighash chaining for authorization signing.
//!
//! Each signer signs a rolling hash instead of a fresh serialization of the
//! transaction. Before signing, the current hash is extended with the
//! authorization flag, fee rate and nonce (`presign`). After signing, the result is
//! extended with the key encoding and the signature itself (`postsign`). The next
//! signer starts from the postsign hash, so every signature commits to every
//! signature before it.
use crate::keys::{MESSAGE_SIGNATURE_ENCODED_SIZE, MessageSignature, PublicKey, PublicKeyEncoding, SigningKey};
use crate::util::{Error, Result, SIGHASH_SIZE, Serializable, SigHash, hash32};
use byteorder::{BigEndian, WriteBytesExt};
use log::trace;

/// Authorization flag committed to by every presign hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AuthType {
    /// The origin pays its own fee.
    Standard = 0x04,
    /// A second account pays on behalf of the origin.
    Sponsored = 0x05,
}

impl AuthType {
    /// Parses the wire byte.
    #[must_use]
    pub fn from_u8(n: u8) -> Option<AuthType> {
        match n {
            0x04 => Some(AuthType::Standard),
            0x05 => Some(AuthType::Sponsored),
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

/// Length of the presign hash input: sighash, flag, fee rate, nonce.
pub const PRESIGN_INPUT_LEN: usize = SIGHASH_SIZE + 1 + 8 + 8;
/// Length of the postsign hash input: sighash, key encoding, signature.
pub const POSTSIGN_INPUT_LEN: usize = SIGHASH_SIZE + 1 + MESSAGE_SIGNATURE_ENCODED_SIZE;

fn check_len(bytes: &[u8], expected: usize) -> Result<()> {
    if bytes.len() != expected {
        return Err(Error::EncodingLength { expected, actual: bytes.len() });
    }
    Ok(())
}

/// Builds the 49-byte presign input `cur ‖ auth_type ‖ tx_fee ‖ nonce`.
///
/// # Errors
/// `Error::EncodingLength` if the material is not exactly [`PRESIGN_INPUT_LEN`] bytes.
pub fn presign_input(cur_sighash: &SigHash, auth_type: AuthType, tx_fee: u64, nonce: u64) -> Result<Vec<u8>> {
    let mut s = Vec::with_capacity(PRESIGN_INPUT_LEN);
    cur_sighash.write(&mut s)?;
    s.write_u8(auth_type.to_u8())?;
    s.write_u64::<BigEndian>(tx_fee)?;
    s.write_u64::<BigEndian>(nonce)?;
    check_len(&s, PRESIGN_INPUT_LEN)?;
    Ok(s)
}

/// Builds the 98-byte postsign input `presign ‖ key_encoding ‖ signature`.
///
/// # Errors
/// `Error::EncodingLength` if the material is not exactly [`POSTSIGN_INPUT_LEN`] bytes.
pub fn postsign_input(
    presign_sighash: &SigHash,
    key_encoding: PublicKeyEncoding,
    signature: &MessageSignature,
) -> Result<Vec<u8>> {
    let mut s = Vec::with_capacity(POSTSIGN_INPUT_LEN);
    presign_sighash.write(&mut s)?;
    s.write_u8(key_encoding.to_u8())?;
    signature.write(&mut s)?;
    check_len(&s, POSTSIGN_INPUT_LEN)?;
    Ok(s)
}

/// Computes the hash a signer signs.
pub fn presign(cur_sighash: &SigHash, auth_type: AuthType, tx_fee: u64, nonce: u64) -> Result<SigHash> {
    Ok(hash32(&presign_input(cur_sighash, auth_type, tx_fee, nonce)?))
}

/// Computes the hash the next signer starts from.
pub fn postsign(
    presign_sighash: &SigHash,
    key_encoding: PublicKeyEncoding,
    signature: &MessageSignature,
) -> Result<SigHash> {
    Ok(hash32(&postsign_input(presign_sighash, key_encoding, signature)?))
}

/// One party signs: presign, sign, postsign.
///
/// Returns the signature and the sighash the subsequent key must sign from.
pub fn next_signature(
    cur_sighash: &SigHash,
    auth_type: AuthType,
    tx_fee: u64,
    nonce: u64,
    key: &dyn SigningKey,
) -> Result<(MessageSignature, SigHash)> {
    let sighash_presign = presign(cur_sighash, auth_type, tx_fee, nonce)?;
    let signature = key.sign(&sighash_presign)?;
    let key_encoding = key.public_key().encoding();
    let next_sighash = postsign(&sighash_presign, key_encoding, &signature)?;
    trace!("signed {} -> {} ({:?})", cur_sighash, next_sighash, auth_type);
    Ok((signature, next_sighash))
}

/// Mirror of [`next_signature`] for verifiers: recovers the signer's public key
/// and computes the sighash the subsequent signature was made over.
pub fn next_verification(
    cur_sighash: &SigHash,
    auth_type: AuthType,
    tx_fee: u64,
    nonce: u64,
    key_encoding: PublicKeyEncoding,
    signature: &MessageSignature,
) -> Result<(PublicKey, SigHash)> {
    let sighash_presign = presign(cur_sighash, auth_type, tx_fee, nonce)?;
    let recovered = signature
        .recover(&sighash_presign)
        .map_err(|e| Error::VerifyingError(e.to_string()))?;
    let public_key = PublicKey::new(recovered, key_encoding == PublicKeyEncoding::Compressed);
    let next_sighash = postsign(&sighash_presign, key_encoding, signature)?;
    Ok((public_key, next_sighash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::PrivateKey;
    use hex_literal::hex;
    use pretty_assertions::assert_eq;

    const H0: [u8; 32] = hex!("6a2bbd2e52e1e8e3ca4ac0bb8ab5c6d1f3a4b0c3e5d6a7f8091a2b3c4d5e6f70");

    /// Signs with a fixed signature so the chain can be checked without curve math.
    struct FixedSigner {
        signature: MessageSignature,
        public_key: PublicKey,
    }

    impl SigningKey for FixedSigner {
        fn sign(&self, _hash: &SigHash) -> Result<MessageSignature> {
            Ok(self.signature)
        }
        fn public_key(&self) -> PublicKey {
            self.public_key
        }
    }

    fn private_key() -> Result<PrivateKey> {
        PrivateKey::from_hex("edf9aee84d9b7abc145504dde6726c64f369d37ee34ded868fabd876c26570bc01")
    }

    #[test]
    fn presign_input_layout() -> Result<()> {
        let input = presign_input(&SigHash(H0), AuthType::Standard, 180, 0)?;
        assert_eq!(input.len(), 49);
        assert_eq!(&input[..32], &H0[..]);
        assert_eq!(input[32], 0x04);
        assert_eq!(&input[33..41], &hex!("00000000000000b4")[..]);
        assert_eq!(&input[41..49], &hex!("0000000000000000")[..]);
        Ok(())
    }

    #[test]
    fn presign_is_hash_of_input() -> Result<()> {
        let h0 = SigHash(H0);
        let input = presign_input(&h0, AuthType::Sponsored, 1, 2)?;
        assert_eq!(presign(&h0, AuthType::Sponsored, 1, 2)?, hash32(&input));
        Ok(())
    }

    #[test]
    fn presign_is_deterministic_for_extremes() -> Result<()> {
        let h0 = SigHash(H0);
        for (fee, nonce) in [(0, 0), (u64::MAX, 0), (0, u64::MAX), (u64::MAX, u64::MAX), (180, 7)] {
            let a = presign(&h0, AuthType::Standard, fee, nonce)?;
            let b = presign(&h0, AuthType::Standard, fee, nonce)?;
            assert_eq!(a, b);
            assert_eq!(a.0.len(), 32);
        }
        Ok(())
    }

    #[test]
    fn presign_commits_to_every_field() -> Result<()> {
        let h0 = SigHash(H0);
        let base = presign(&h0, AuthType::Standard, 180, 0)?;
        assert!(base != presign(&h0, AuthType::Sponsored, 180, 0)?);
        assert!(base != presign(&h0, AuthType::Standard, 181, 0)?);
        assert!(base != presign(&h0, AuthType::Standard, 180, 1)?);
        // Fee and nonce are not interchangeable.
        assert!(presign(&h0, AuthType::Standard, 0, 180)? != base);
        assert!(base != presign(&SigHash::default(), AuthType::Standard, 180, 0)?);
        Ok(())
    }

    #[test]
    fn postsign_input_layout() -> Result<()> {
        let sig = MessageSignature([0xfe; 65]);
        let input = postsign_input(&SigHash(H0), PublicKeyEncoding::Uncompressed, &sig)?;
        assert_eq!(input.len(), 98);
        assert_eq!(input[32], 0x01);
        assert_eq!(&input[33..], &sig.0[..]);
        assert_eq!(postsign(&SigHash(H0), PublicKeyEncoding::Uncompressed, &sig)?, hash32(&input));
        Ok(())
    }

    #[test]
    fn check_len_reports_actual() {
        match check_len(&[0u8; 48], PRESIGN_INPUT_LEN) {
            Err(Error::EncodingLength { expected: 49, actual: 48 }) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn next_signature_chains_presign_and_postsign() -> Result<()> {
        let key = private_key()?;
        let signer = FixedSigner {
            signature: MessageSignature([0x11; 65]),
            public_key: key.public_key(),
        };
        let h0 = SigHash(H0);
        let (sig, next) = next_signature(&h0, AuthType::Standard, 180, 0, &signer)?;
        assert_eq!(sig, MessageSignature([0x11; 65]));
        let expected = postsign(
            &presign(&h0, AuthType::Standard, 180, 0)?,
            PublicKeyEncoding::Compressed,
            &sig,
        )?;
        assert_eq!(next, expected);
        Ok(())
    }

    #[test]
    fn next_signature_is_reproducible() -> Result<()> {
        let key = private_key()?;
        let h0 = SigHash(H0);
        let first = next_signature(&h0, AuthType::Standard, 180, 0, &key)?;
        let second = next_signature(&h0, AuthType::Standard, 180, 0, &key)?;
        assert_eq!(first, second);
        assert_eq!(first.0.as_bytes().len(), 65);
        Ok(())
    }

    #[test]
    fn verification_recovers_signer_and_next_hash() -> Result<()> {
        let key = private_key()?;
        let h0 = SigHash(H0);
        let (sig, next) = next_signature(&h0, AuthType::Sponsored, 9, 3, &key)?;
        let (pk, verified_next) =
            next_verification(&h0, AuthType::Sponsored, 9, 3, PublicKeyEncoding::Compressed, &sig)?;
        assert_eq!(pk, key.public_key());
        assert_eq!(verified_next, next);

        // A different fee recovers some other key.
        let (other, _) =
            next_verification(&h0, AuthType::Sponsored, 10, 3, PublicKeyEncoding::Compressed, &sig)?;
        assert!(other != key.public_key());
        Ok(())
    }

    #[test]
    fn auth_type_bytes() {
        assert_eq!(AuthType::from_u8(0x04), Some(AuthType::Standard));
        assert_eq!(AuthType::from_u8(0x05), Some(AuthType::Sponsored));
        assert_eq!(AuthType::from_u8(0x06), None);
        assert_eq!(AuthType::Sponsored.to_u8(), 5);
    }
}
