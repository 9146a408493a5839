//! Spending conditions: who may authorize a transaction and the signatures they made.
//!
//! A single-signature condition carries one signature. A multi-signature
//! condition carries an ordered list of fields, each either a public key (the key
//! has not signed) or a signature (the key has signed, and its public key is
//! recovered from the signature during verification). Keys sign in field order.

use super::sighash::{AuthType, next_signature, next_verification};
use crate::address::{
    Address, AddressHashMode, ORDER_INDEPENDENT_P2SH, ORDER_INDEPENDENT_P2WSH, public_keys_to_address_hash,
};
use crate::keys::{MessageSignature, PublicKey, PublicKeyEncoding, SigningKey};
use crate::network::Network;
use crate::util::{Error, Hash160, Result, Serializable, SigHash};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, warn};
use std::io;
use std::io::{Cursor, Read, Write};

/// Maximum number of fields accepted when decoding a multi-signature condition.
pub const MAX_AUTH_FIELDS: u32 = 1024;

/// Field id of a compressed public key.
pub const FIELD_PUBLIC_KEY_COMPRESSED: u8 = 0x00;
/// Field id of an uncompressed public key.
pub const FIELD_PUBLIC_KEY_UNCOMPRESSED: u8 = 0x01;
/// Field id of a signature made with a compressed key.
pub const FIELD_SIGNATURE_COMPRESSED: u8 = 0x02;
/// Field id of a signature made with an uncompressed key.
pub const FIELD_SIGNATURE_UNCOMPRESSED: u8 = 0x03;

/// Hash modes valid for a single-signature condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SinglesigHashMode {
    /// Key hash
    P2PKH = 0x00,
    /// P2SH-wrapped segwit key hash
    P2WPKH = 0x02,
}

impl SinglesigHashMode {
    /// Narrows an address hash mode.
    #[must_use]
    pub fn from_address_hash_mode(mode: AddressHashMode) -> Option<SinglesigHashMode> {
        match mode {
            AddressHashMode::P2PKH => Some(SinglesigHashMode::P2PKH),
            AddressHashMode::P2WPKH => Some(SinglesigHashMode::P2WPKH),
            _ => None,
        }
    }

    /// Widens into an address hash mode.
    #[must_use]
    #[inline]
    pub fn to_address_hash_mode(self) -> AddressHashMode {
        match self {
            SinglesigHashMode::P2PKH => AddressHashMode::P2PKH,
            SinglesigHashMode::P2WPKH => AddressHashMode::P2WPKH,
        }
    }
}

/// Hash modes valid for a multi-signature condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MultisigHashMode {
    /// Redeem script hash
    P2SH = 0x01,
    /// P2SH-wrapped segwit script hash
    P2WSH = 0x03,
}

impl MultisigHashMode {
    /// Narrows an address hash mode.
    #[must_use]
    pub fn from_address_hash_mode(mode: AddressHashMode) -> Option<MultisigHashMode> {
        match mode {
            AddressHashMode::P2SH => Some(MultisigHashMode::P2SH),
            AddressHashMode::P2WSH => Some(MultisigHashMode::P2WSH),
            _ => None,
        }
    }

    /// Widens into an address hash mode.
    #[must_use]
    #[inline]
    pub fn to_address_hash_mode(self) -> AddressHashMode {
        match self {
            MultisigHashMode::P2SH => AddressHashMode::P2SH,
            MultisigHashMode::P2WSH => AddressHashMode::P2WSH,
        }
    }
}

/// One slot of a multi-signature condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthField {
    /// A key that has not signed
    PublicKey(PublicKey),
    /// A signature, with the encoding of the key that made it
    Signature(PublicKeyEncoding, MessageSignature),
}

impl AuthField {
    /// Whether this slot holds a signature.
    #[must_use]
    #[inline]
    pub fn is_signature(&self) -> bool {
        matches!(self, AuthField::Signature(..))
    }
}

impl Serializable<AuthField> for AuthField {
    fn read(reader: &mut dyn Read) -> Result<AuthField> {
        let field_id = reader.read_u8()?;
        match field_id {
            FIELD_PUBLIC_KEY_COMPRESSED | FIELD_PUBLIC_KEY_UNCOMPRESSED => {
                // Keys always travel compressed, the id carries the committed form.
                let mut bytes = [0u8; 33];
                reader.read_exact(&mut bytes)?;
                let mut key = PublicKey::from_slice(&bytes)
                    .map_err(|e| Error::BadData(format!("Bad public key field: {}", e)))?;
                key.set_compressed(field_id == FIELD_PUBLIC_KEY_COMPRESSED);
                Ok(AuthField::PublicKey(key))
            }
            FIELD_SIGNATURE_COMPRESSED | FIELD_SIGNATURE_UNCOMPRESSED => {
                let encoding = if field_id == FIELD_SIGNATURE_COMPRESSED {
                    PublicKeyEncoding::Compressed
                } else {
                    PublicKeyEncoding::Uncompressed
                };
                Ok(AuthField::Signature(encoding, MessageSignature::read(reader)?))
            }
            _ => Err(Error::BadData(format!("Unknown auth field id: {:#04x}", field_id))),
        }
    }

    fn write(&self, writer: &mut dyn Write) -> io::Result<()> {
        match self {
            AuthField::PublicKey(key) => {
                let field_id = if key.compressed() {
                    FIELD_PUBLIC_KEY_COMPRESSED
                } else {
                    FIELD_PUBLIC_KEY_UNCOMPRESSED
                };
                writer.write_u8(field_id)?;
                writer.write_all(&key.to_bytes_compressed())
            }
            AuthField::Signature(encoding, signature) => {
                let field_id = match encoding {
                    PublicKeyEncoding::Compressed => FIELD_SIGNATURE_COMPRESSED,
                    PublicKeyEncoding::Uncompressed => FIELD_SIGNATURE_UNCOMPRESSED,
                };
                writer.write_u8(field_id)?;
                signature.write(writer)
            }
        }
    }
}

/// A condition satisfied by one signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinglesigSpendingCondition {
    /// How `signer` is derived from the key
    pub hash_mode: SinglesigHashMode,
    /// HASH160 identifying the signer
    pub signer: Hash160,
    /// Account nonce
    pub nonce: u64,
    /// Fee rate
    pub tx_fee: u64,
    /// Encoding of the key that signs
    pub key_encoding: PublicKeyEncoding,
    /// The signature, or the empty sentinel
    pub signature: MessageSignature,
}

impl SinglesigSpendingCondition {
    /// Number of signatures present, 0 or 1.
    #[must_use]
    #[inline]
    pub fn num_signatures(&self) -> u16 {
        if self.signature.is_empty() { 0 } else { 1 }
    }

    /// Zeroes fee and nonce and resets the signature to the empty sentinel.
    pub fn clear(&mut self) {
        self.tx_fee = 0;
        self.nonce = 0;
        self.signature = MessageSignature::empty();
    }

    /// Signs `cur_sighash` with `key` and stores the signature.
    ///
    /// # Errors
    /// `Error::BadArgument` if the key does not hash to `signer` or its encoding
    /// differs from `key_encoding`.
    pub fn sign(&mut self, cur_sighash: &SigHash, auth_type: AuthType, key: &dyn SigningKey) -> Result<SigHash> {
        let public_key = key.public_key();
        if public_key.encoding() != self.key_encoding {
            return Err(Error::BadArgument(format!(
                "Key encoding {:?} does not match condition encoding {:?}",
                public_key.encoding(),
                self.key_encoding
            )));
        }
        let signer = public_keys_to_address_hash(self.hash_mode.to_address_hash_mode(), 1, &[public_key])?;
        if signer != self.signer {
            return Err(Error::BadArgument(format!("Key {:?} is not the signer {}", public_key, self.signer)));
        }
        let (signature, next_sighash) = next_signature(cur_sighash, auth_type, self.tx_fee, self.nonce, key)?;
        self.signature = signature;
        Ok(next_sighash)
    }

    /// Verifies the signature against `initial_sighash` and returns the next sighash.
    pub fn verify(&self, initial_sighash: &SigHash, auth_type: AuthType) -> Result<SigHash> {
        if self.signature.is_empty() {
            return Err(Error::VerifyingError("Missing signature".to_string()));
        }
        let (public_key, next_sighash) = next_verification(
            initial_sighash,
            auth_type,
            self.tx_fee,
            self.nonce,
            self.key_encoding,
            &self.signature,
        )?;
        let signer = public_keys_to_address_hash(self.hash_mode.to_address_hash_mode(), 1, &[public_key])
            .map_err(|e| Error::VerifyingError(e.to_string()))?;
        if signer != self.signer {
            return Err(Error::VerifyingError(format!(
                "Signer hash does not equal hash of public key(s): {} != {}",
                signer, self.signer
            )));
        }
        Ok(next_sighash)
    }

    fn read_after_mode(hash_mode: SinglesigHashMode, reader: &mut dyn Read) -> Result<Self> {
        let signer = Hash160::read(reader)?;
        let nonce = u64::read(reader)?;
        let tx_fee = u64::read(reader)?;
        let key_encoding_u8 = reader.read_u8()?;
        let key_encoding = PublicKeyEncoding::from_u8(key_encoding_u8)
            .ok_or_else(|| Error::BadData(format!("Unknown key encoding: {:#04x}", key_encoding_u8)))?;
        let signature = MessageSignature::read(reader)?;
        if hash_mode == SinglesigHashMode::P2WPKH && key_encoding != PublicKeyEncoding::Compressed {
            return Err(Error::BadData("P2WPKH requires a compressed key".to_string()));
        }
        Ok(SinglesigSpendingCondition { hash_mode, signer, nonce, tx_fee, key_encoding, signature })
    }
}

impl Serializable<SinglesigSpendingCondition> for SinglesigSpendingCondition {
    fn read(reader: &mut dyn Read) -> Result<SinglesigSpendingCondition> {
        let mode = read_hash_mode(reader)?;
        let hash_mode = SinglesigHashMode::from_address_hash_mode(mode)
            .ok_or_else(|| Error::BadData(format!("{:?} is not a single-signature mode", mode)))?;
        SinglesigSpendingCondition::read_after_mode(hash_mode, reader)
    }

    fn write(&self, writer: &mut dyn Write) -> io::Result<()> {
        writer.write_u8(self.hash_mode as u8)?;
        self.signer.write(writer)?;
        self.nonce.write(writer)?;
        self.tx_fee.write(writer)?;
        writer.write_u8(self.key_encoding.to_u8())?;
        self.signature.write(writer)
    }
}

/// A condition satisfied by `signatures_required` of its keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultisigSpendingCondition {
    /// How `signer` is derived from the keys
    pub hash_mode: MultisigHashMode,
    /// HASH160 identifying the key set
    pub signer: Hash160,
    /// Account nonce
    pub nonce: u64,
    /// Fee rate
    pub tx_fee: u64,
    /// One slot per key, in key order
    pub fields: Vec<AuthField>,
    /// Threshold
    pub signatures_required: u16,
}

impl MultisigSpendingCondition {
    /// Number of slots that hold a signature.
    #[must_use]
    pub fn num_signatures(&self) -> u16 {
        let n = self.fields.iter().filter(|f| f.is_signature()).count();
        u16::try_from(n).unwrap_or(u16::MAX)
    }

    /// Zeroes fee and nonce and drops every field.
    ///
    /// The result encodes but does not decode: with no fields left the threshold
    /// exceeds the key count. It only exists to be hashed into the initial sighash.
    pub fn clear(&mut self) {
        self.tx_fee = 0;
        self.nonce = 0;
        self.fields.clear();
    }

    /// Signs with `key` into its slot and returns the next sighash.
    ///
    /// The key's slot must follow every slot already signed.
    ///
    /// # Errors
    /// `Error::BadArgument` if `key` has no unsigned slot after the last signature.
    pub fn sign(&mut self, cur_sighash: &SigHash, auth_type: AuthType, key: &dyn SigningKey) -> Result<SigHash> {
        let public_key = key.public_key();
        let start = self.fields.iter().rposition(AuthField::is_signature).map_or(0, |i| i + 1);
        let slot = self.fields[start..]
            .iter()
            .position(|f| *f == AuthField::PublicKey(public_key))
            .map(|i| start + i);
        let slot = match slot {
            Some(slot) => slot,
            None if self.fields[..start].contains(&AuthField::PublicKey(public_key)) => {
                return Err(Error::BadArgument(format!(
                    "Key {:?} must sign before the signature at slot {}",
                    public_key,
                    start - 1
                )));
            }
            None => {
                return Err(Error::BadArgument(format!("Key {:?} has no unsigned slot", public_key)));
            }
        };
        let (signature, next_sighash) = next_signature(cur_sighash, auth_type, self.tx_fee, self.nonce, key)?;
        self.fields[slot] = AuthField::Signature(public_key.encoding(), signature);
        debug!("multisig slot {} of {} signed", slot, self.fields.len());
        Ok(next_sighash)
    }

    /// Walks the fields, recovering keys from signatures, and checks the threshold
    /// and the signer hash. Returns the sighash after the last signature.
    pub fn verify(&self, initial_sighash: &SigHash, auth_type: AuthType) -> Result<SigHash> {
        let mut cur_sighash = *initial_sighash;
        let mut public_keys = Vec::with_capacity(self.fields.len());
        let mut num_sigs: u16 = 0;
        let mut have_uncompressed = false;
        for field in self.fields.iter() {
            let public_key = match field {
                AuthField::PublicKey(public_key) => *public_key,
                AuthField::Signature(encoding, signature) => {
                    let (public_key, next_sighash) =
                        next_verification(&cur_sighash, auth_type, self.tx_fee, self.nonce, *encoding, signature)?;
                    cur_sighash = next_sighash;
                    num_sigs = num_sigs
                        .checked_add(1)
                        .ok_or_else(|| Error::VerifyingError("Too many signatures".to_string()))?;
                    public_key
                }
            };
            have_uncompressed |= !public_key.compressed();
            public_keys.push(public_key);
        }

        if num_sigs != self.signatures_required {
            return Err(Error::VerifyingError(format!(
                "Incorrect number of signatures: {} of {} required",
                num_sigs, self.signatures_required
            )));
        }
        if have_uncompressed && self.hash_mode == MultisigHashMode::P2WSH {
            return Err(Error::VerifyingError("Uncompressed keys are not allowed in P2WSH".to_string()));
        }

        let signer = public_keys_to_address_hash(
            self.hash_mode.to_address_hash_mode(),
            self.signatures_required,
            &public_keys,
        )
        .map_err(|e| Error::VerifyingError(e.to_string()))?;
        if signer != self.signer {
            return Err(Error::VerifyingError(format!(
                "Signer hash does not equal hash of public key(s): {} != {}",
                signer, self.signer
            )));
        }
        Ok(cur_sighash)
    }

    fn read_after_mode(hash_mode: MultisigHashMode, reader: &mut dyn Read) -> Result<Self> {
        let signer = Hash160::read(reader)?;
        let nonce = u64::read(reader)?;
        let tx_fee = u64::read(reader)?;
        let num_fields = u32::read(reader)?;
        if num_fields > MAX_AUTH_FIELDS {
            return Err(Error::BadData(format!("Too many auth fields: {}", num_fields)));
        }
        let mut fields = Vec::with_capacity(num_fields as usize);
        for _i in 0..num_fields {
            fields.push(AuthField::read(reader)?);
        }
        let signatures_required = u16::read(reader)?;

        let mut num_sigs = 0usize;
        let mut have_uncompressed = false;
        for field in fields.iter() {
            match field {
                AuthField::PublicKey(key) => have_uncompressed |= !key.compressed(),
                AuthField::Signature(encoding, _) => {
                    num_sigs += 1;
                    have_uncompressed |= *encoding == PublicKeyEncoding::Uncompressed;
                }
            }
        }
        if signatures_required == 0 || usize::from(signatures_required) > fields.len() {
            return Err(Error::BadData(format!(
                "Cannot require {} of {} signatures",
                signatures_required,
                fields.len()
            )));
        }
        // Partially signed conditions decode; verification insists on the exact count.
        if num_sigs > usize::from(signatures_required) {
            return Err(Error::BadData(format!(
                "{} signatures present, {} required",
                num_sigs, signatures_required
            )));
        }
        if have_uncompressed && hash_mode == MultisigHashMode::P2WSH {
            return Err(Error::BadData("Uncompressed keys are not allowed in P2WSH".to_string()));
        }
        Ok(MultisigSpendingCondition { hash_mode, signer, nonce, tx_fee, fields, signatures_required })
    }
}

impl Serializable<MultisigSpendingCondition> for MultisigSpendingCondition {
    fn read(reader: &mut dyn Read) -> Result<MultisigSpendingCondition> {
        let mode = read_hash_mode(reader)?;
        let hash_mode = MultisigHashMode::from_address_hash_mode(mode)
            .ok_or_else(|| Error::BadData(format!("{:?} is not a multi-signature mode", mode)))?;
        MultisigSpendingCondition::read_after_mode(hash_mode, reader)
    }

    fn write(&self, writer: &mut dyn Write) -> io::Result<()> {
        let num_fields = u32::try_from(self.fields.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "Too many auth fields"))?;
        writer.write_u8(self.hash_mode as u8)?;
        self.signer.write(writer)?;
        self.nonce.write(writer)?;
        self.tx_fee.write(writer)?;
        writer.write_u32::<BigEndian>(num_fields)?;
        for field in self.fields.iter() {
            field.write(writer)?;
        }
        self.signatures_required.write(writer)
    }
}

/// Reads the mode byte that opens every spending condition.
fn read_hash_mode(reader: &mut dyn Read) -> Result<AddressHashMode> {
    let hash_mode_u8 = reader.read_u8()?;
    match AddressHashMode::from_u8(hash_mode_u8) {
        Some(mode) => Ok(mode),
        None if hash_mode_u8 == ORDER_INDEPENDENT_P2SH || hash_mode_u8 == ORDER_INDEPENDENT_P2WSH => {
            debug!("rejecting order-independent hash mode {:#04x}", hash_mode_u8);
            Err(Error::Unimplemented(format!(
                "Order-independent multisig hash mode {:#04x}",
                hash_mode_u8
            )))
        }
        None => {
            debug!("rejecting unknown hash mode {:#04x}", hash_mode_u8);
            Err(Error::UnknownAddressHashMode(hash_mode_u8))
        }
    }
}

/// Who may authorize a transaction, with the signatures collected so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpendingCondition {
    /// One key, one signature
    Singlesig(SinglesigSpendingCondition),
    /// m-of-n keys
    Multisig(MultisigSpendingCondition),
}

impl SpendingCondition {
    /// A P2PKH condition for `public_key` with zero nonce and fee.
    pub fn new_singlesig_p2pkh(public_key: PublicKey) -> Result<SpendingCondition> {
        let signer = public_keys_to_address_hash(AddressHashMode::P2PKH, 1, &[public_key])?;
        Ok(SpendingCondition::Singlesig(SinglesigSpendingCondition {
            hash_mode: SinglesigHashMode::P2PKH,
            signer,
            nonce: 0,
            tx_fee: 0,
            key_encoding: public_key.encoding(),
            signature: MessageSignature::empty(),
        }))
    }

    /// A P2WPKH condition for `public_key`, which must be compressed.
    pub fn new_singlesig_p2wpkh(public_key: PublicKey) -> Result<SpendingCondition> {
        let signer = public_keys_to_address_hash(AddressHashMode::P2WPKH, 1, &[public_key])?;
        Ok(SpendingCondition::Singlesig(SinglesigSpendingCondition {
            hash_mode: SinglesigHashMode::P2WPKH,
            signer,
            nonce: 0,
            tx_fee: 0,
            key_encoding: PublicKeyEncoding::Compressed,
            signature: MessageSignature::empty(),
        }))
    }

    /// A P2SH `num_sigs`-of-n condition. Keys sign in the given order.
    pub fn new_multisig_p2sh(num_sigs: u16, public_keys: Vec<PublicKey>) -> Result<SpendingCondition> {
        SpendingCondition::new_multisig(MultisigHashMode::P2SH, num_sigs, public_keys)
    }

    /// A P2WSH `num_sigs`-of-n condition. Keys must be compressed.
    pub fn new_multisig_p2wsh(num_sigs: u16, public_keys: Vec<PublicKey>) -> Result<SpendingCondition> {
        SpendingCondition::new_multisig(MultisigHashMode::P2WSH, num_sigs, public_keys)
    }

    fn new_multisig(
        hash_mode: MultisigHashMode,
        num_sigs: u16,
        public_keys: Vec<PublicKey>,
    ) -> Result<SpendingCondition> {
        let signer = public_keys_to_address_hash(hash_mode.to_address_hash_mode(), num_sigs, &public_keys)?;
        Ok(SpendingCondition::Multisig(MultisigSpendingCondition {
            hash_mode,
            signer,
            nonce: 0,
            tx_fee: 0,
            fields: public_keys.into_iter().map(AuthField::PublicKey).collect(),
            signatures_required: num_sigs,
        }))
    }

    /// The placeholder a sponsor condition is replaced with when computing the
    /// initial sighash: P2PKH, zero signer, nonce and fee, empty signature.
    #[must_use]
    pub fn new_initial_sighash() -> SpendingCondition {
        SpendingCondition::Singlesig(SinglesigSpendingCondition {
            hash_mode: SinglesigHashMode::P2PKH,
            signer: Hash160([0; 20]),
            nonce: 0,
            tx_fee: 0,
            key_encoding: PublicKeyEncoding::Compressed,
            signature: MessageSignature::empty(),
        })
    }

    /// Hash mode.
    #[must_use]
    pub fn hash_mode(&self) -> AddressHashMode {
        match self {
            SpendingCondition::Singlesig(data) => data.hash_mode.to_address_hash_mode(),
            SpendingCondition::Multisig(data) => data.hash_mode.to_address_hash_mode(),
        }
    }

    /// Signer hash.
    #[must_use]
    pub fn signer(&self) -> Hash160 {
        match self {
            SpendingCondition::Singlesig(data) => data.signer,
            SpendingCondition::Multisig(data) => data.signer,
        }
    }

    /// Account nonce.
    #[must_use]
    pub fn nonce(&self) -> u64 {
        match self {
            SpendingCondition::Singlesig(data) => data.nonce,
            SpendingCondition::Multisig(data) => data.nonce,
        }
    }

    /// Fee rate.
    #[must_use]
    pub fn tx_fee(&self) -> u64 {
        match self {
            SpendingCondition::Singlesig(data) => data.tx_fee,
            SpendingCondition::Multisig(data) => data.tx_fee,
        }
    }

    /// Sets the account nonce. Existing signatures no longer verify.
    pub fn set_nonce(&mut self, nonce: u64) {
        match self {
            SpendingCondition::Singlesig(data) => data.nonce = nonce,
            SpendingCondition::Multisig(data) => data.nonce = nonce,
        }
    }

    /// Sets the fee rate. Existing signatures no longer verify.
    pub fn set_tx_fee(&mut self, tx_fee: u64) {
        match self {
            SpendingCondition::Singlesig(data) => data.tx_fee = tx_fee,
            SpendingCondition::Multisig(data) => data.tx_fee = tx_fee,
        }
    }

    /// Signatures collected so far.
    #[must_use]
    pub fn num_signatures(&self) -> u16 {
        match self {
            SpendingCondition::Singlesig(data) => data.num_signatures(),
            SpendingCondition::Multisig(data) => data.num_signatures(),
        }
    }

    /// Signatures needed: 1 for single-signature conditions.
    #[must_use]
    pub fn signatures_required(&self) -> u16 {
        match self {
            SpendingCondition::Singlesig(_) => 1,
            SpendingCondition::Multisig(data) => data.signatures_required,
        }
    }

    /// Whether the threshold has been reached.
    #[must_use]
    #[inline]
    pub fn is_fully_signed(&self) -> bool {
        self.num_signatures() >= self.signatures_required()
    }

    /// The address of this condition's signer on `network`.
    #[must_use]
    pub fn address(&self, network: Network) -> Address {
        Address::for_network(network, self.hash_mode(), self.signer())
    }

    /// Zeroes fee and nonce and removes all signatures, leaving the form that is
    /// hashed into the initial sighash. A cleared multi-signature condition has
    /// no fields at all, so it can be written but not read back.
    pub fn clear(&mut self) {
        match self {
            SpendingCondition::Singlesig(data) => data.clear(),
            SpendingCondition::Multisig(data) => data.clear(),
        }
    }

    /// Adds the next signature from `key` and returns the next sighash.
    pub fn sign_next(&mut self, cur_sighash: &SigHash, auth_type: AuthType, key: &dyn SigningKey) -> Result<SigHash> {
        match self {
            SpendingCondition::Singlesig(data) => data.sign(cur_sighash, auth_type, key),
            SpendingCondition::Multisig(data) => data.sign(cur_sighash, auth_type, key),
        }
    }

    /// Verifies every signature in the condition, starting from `initial_sighash`.
    ///
    /// # Errors
    /// `Error::VerifyingError` if a signature does not recover, the signature count
    /// is wrong, or the recovered keys do not hash to the signer.
    pub fn verify(&self, initial_sighash: &SigHash, auth_type: AuthType) -> Result<SigHash> {
        let result = match self {
            SpendingCondition::Singlesig(data) => data.verify(initial_sighash, auth_type),
            SpendingCondition::Multisig(data) => data.verify(initial_sighash, auth_type),
        };
        if let Err(e) = &result {
            warn!("spending condition {} failed to verify: {}", self.signer(), e);
        }
        result
    }

    /// Serializes into a new buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut v = Vec::new();
        self.write(&mut v)?;
        Ok(v)
    }

    /// Deserializes from `bytes`, which must hold exactly one condition.
    pub fn from_bytes(bytes: &[u8]) -> Result<SpendingCondition> {
        let mut cursor = Cursor::new(bytes);
        let condition = SpendingCondition::read(&mut cursor)?;
        if cursor.position() != bytes.len() as u64 {
            return Err(Error::BadData(format!(
                "{} trailing bytes after spending condition",
                bytes.len() as u64 - cursor.position()
            )));
        }
        Ok(condition)
    }
}

impl Serializable<SpendingCondition> for SpendingCondition {
    fn read(reader: &mut dyn Read) -> Result<SpendingCondition> {
        let mode = read_hash_mode(reader)?;
        if let Some(hash_mode) = SinglesigHashMode::from_address_hash_mode(mode) {
            let data = SinglesigSpendingCondition::read_after_mode(hash_mode, reader)?;
            return Ok(SpendingCondition::Singlesig(data));
        }
        match MultisigHashMode::from_address_hash_mode(mode) {
            Some(hash_mode) => Ok(SpendingCondition::Multisig(MultisigSpendingCondition::read_after_mode(
                hash_mode, reader,
            )?)),
            None => Err(Error::UnknownAddressHashMode(mode.to_u8())),
        }
    }

    fn write(&self, writer: &mut dyn Write) -> io::Result<()> {
        match self {
            SpendingCondition::Singlesig(data) => data.write(writer),
            SpendingCondition::Multisig(data) => data.write(writer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::PrivateKey;
    use crate::transaction::sighash::{postsign, presign};
    use crate::util::hash160;
    use pretty_assertions::assert_eq;

    const PK_HEX: &str = "03ef2340518b5867b23598a9cf74611f8b98064f7d55cdb8c107c67b5efcbc5c77";
    const PRIVKEYS: [&str; 3] = [
        "edf9aee84d9b7abc145504dde6726c64f369d37ee34ded868fabd876c26570bc01",
        "2a584d899fed1d24e26b524f202763c8ab30260167429f157f1c119f550fa6af01",
        "d5200dee706ee53ae98a03fba6cf4fdcc5084c30cfa9e1b3462dcdeaa3e0f1d201",
    ];

    fn keys() -> Result<Vec<PrivateKey>> {
        PRIVKEYS.iter().map(|k| PrivateKey::from_hex(k)).collect()
    }

    fn header(mode: u8, nonce: u64, tx_fee: u64) -> Vec<u8> {
        let mut v = vec![mode];
        v.extend_from_slice(&[0x11; 20]);
        v.extend_from_slice(&nonce.to_be_bytes());
        v.extend_from_slice(&tx_fee.to_be_bytes());
        v
    }

    #[test]
    fn singlesig_codec() -> Result<()> {
        let condition = SpendingCondition::Singlesig(SinglesigSpendingCondition {
            hash_mode: SinglesigHashMode::P2PKH,
            signer: Hash160([0x11; 20]),
            nonce: 345,
            tx_fee: 456,
            key_encoding: PublicKeyEncoding::Compressed,
            signature: MessageSignature([0xfe; 65]),
        });
        let mut expected = header(0x00, 345, 456);
        assert_eq!(&expected[21..29], &[0, 0, 0, 0, 0, 0, 0x01, 0x59]);
        expected.push(0x00);
        expected.extend_from_slice(&[0xfe; 65]);

        let bytes = condition.to_bytes()?;
        assert_eq!(bytes, expected);
        assert_eq!(SpendingCondition::from_bytes(&bytes)?, condition);
        Ok(())
    }

    #[test]
    fn multisig_codec() -> Result<()> {
        let key = PublicKey::from_hex(PK_HEX)?;
        let mut uncompressed = key;
        uncompressed.set_compressed(false);
        let condition = SpendingCondition::Multisig(MultisigSpendingCondition {
            hash_mode: MultisigHashMode::P2SH,
            signer: Hash160([0x11; 20]),
            nonce: 123,
            tx_fee: 456,
            fields: vec![
                AuthField::Signature(PublicKeyEncoding::Uncompressed, MessageSignature([0xff; 65])),
                AuthField::Signature(PublicKeyEncoding::Uncompressed, MessageSignature([0xfe; 65])),
                AuthField::PublicKey(uncompressed),
            ],
            signatures_required: 2,
        });
        let mut expected = header(0x01, 123, 456);
        expected.extend_from_slice(&[0x00, 0x00, 0x00, 0x03]);
        expected.push(FIELD_SIGNATURE_UNCOMPRESSED);
        expected.extend_from_slice(&[0xff; 65]);
        expected.push(FIELD_SIGNATURE_UNCOMPRESSED);
        expected.extend_from_slice(&[0xfe; 65]);
        expected.push(FIELD_PUBLIC_KEY_UNCOMPRESSED);
        expected.extend_from_slice(&hex::decode(PK_HEX)?);
        expected.extend_from_slice(&[0x00, 0x02]);

        let bytes = condition.to_bytes()?;
        assert_eq!(bytes, expected);
        assert_eq!(SpendingCondition::from_bytes(&bytes)?, condition);
        Ok(())
    }

    #[test]
    fn unknown_and_unsupported_hash_modes() -> Result<()> {
        let mut bytes = SpendingCondition::new_initial_sighash().to_bytes()?;
        bytes[0] = 0x04;
        match SpendingCondition::from_bytes(&bytes) {
            Err(Error::UnknownAddressHashMode(0x04)) => {}
            other => panic!("unexpected {:?}", other),
        }
        bytes[0] = ORDER_INDEPENDENT_P2SH;
        assert!(matches!(SpendingCondition::from_bytes(&bytes), Err(Error::Unimplemented(_))));
        bytes[0] = ORDER_INDEPENDENT_P2WSH;
        assert!(matches!(SpendingCondition::from_bytes(&bytes), Err(Error::Unimplemented(_))));
        Ok(())
    }

    #[test]
    fn bad_hash_mode_consumes_only_the_mode_byte() {
        let mut cursor = Cursor::new(vec![0x09, 1, 2, 3]);
        match SpendingCondition::read(&mut cursor) {
            Err(Error::UnknownAddressHashMode(0x09)) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(cursor.position(), 1);

        for mode in [ORDER_INDEPENDENT_P2SH, ORDER_INDEPENDENT_P2WSH] {
            let mut cursor = Cursor::new(vec![mode, 1, 2, 3]);
            assert!(matches!(SpendingCondition::read(&mut cursor), Err(Error::Unimplemented(_))));
            assert_eq!(cursor.position(), 1);
        }
    }

    #[test]
    fn rejects_malformed_bytes() -> Result<()> {
        let bytes = SpendingCondition::new_initial_sighash().to_bytes()?;
        // truncated
        assert!(SpendingCondition::from_bytes(&bytes[..bytes.len() - 1]).is_err());
        // trailing
        let mut long = bytes.clone();
        long.push(0);
        assert!(SpendingCondition::from_bytes(&long).is_err());
        // bad key encoding
        let mut bad = bytes.clone();
        bad[37] = 0x02;
        assert!(matches!(SpendingCondition::from_bytes(&bad), Err(Error::BadData(_))));
        // P2WPKH with an uncompressed key
        let mut wpkh = bytes;
        wpkh[0] = 0x02;
        wpkh[37] = 0x01;
        assert!(matches!(SpendingCondition::from_bytes(&wpkh), Err(Error::BadData(_))));
        Ok(())
    }

    #[test]
    fn multisig_decode_checks() -> Result<()> {
        let mut over = header(0x01, 0, 0);
        over.extend_from_slice(&[0, 0, 0, 2]);
        for _ in 0..2 {
            over.push(FIELD_SIGNATURE_COMPRESSED);
            over.extend_from_slice(&[0xfe; 65]);
        }
        over.extend_from_slice(&[0, 1]);
        assert!(matches!(SpendingCondition::from_bytes(&over), Err(Error::BadData(_))));

        let mut too_many = header(0x01, 0, 0);
        too_many.extend_from_slice(&(MAX_AUTH_FIELDS + 1).to_be_bytes());
        assert!(matches!(SpendingCondition::from_bytes(&too_many), Err(Error::BadData(_))));

        let mut bad_field = header(0x01, 0, 0);
        bad_field.extend_from_slice(&[0, 0, 0, 1, 0x04]);
        assert!(matches!(SpendingCondition::from_bytes(&bad_field), Err(Error::BadData(_))));

        let mut wsh = header(0x03, 0, 0);
        wsh.extend_from_slice(&[0, 0, 0, 1, FIELD_SIGNATURE_UNCOMPRESSED]);
        wsh.extend_from_slice(&[0xfe; 65]);
        wsh.extend_from_slice(&[0, 1]);
        assert!(matches!(SpendingCondition::from_bytes(&wsh), Err(Error::BadData(_))));
        Ok(())
    }

    #[test]
    fn partially_signed_multisig_decodes() -> Result<()> {
        let keys = keys()?;
        let public_keys = keys.iter().map(|k| k.public_key()).collect();
        let mut condition = SpendingCondition::new_multisig_p2sh(2, public_keys)?;
        condition.sign_next(&SigHash::default(), AuthType::Standard, &keys[0])?;
        let decoded = SpendingCondition::from_bytes(&condition.to_bytes()?)?;
        assert_eq!(decoded, condition);
        assert_eq!(decoded.num_signatures(), 1);
        assert!(!decoded.is_fully_signed());
        Ok(())
    }

    #[test]
    fn singlesig_sign_and_verify() -> Result<()> {
        let key = PrivateKey::from_hex(PRIVKEYS[0])?;
        let mut condition = SpendingCondition::new_singlesig_p2pkh(key.public_key())?;
        condition.set_tx_fee(180);
        assert_eq!(condition.signer(), hash160(&key.public_key().to_bytes()));
        let h0 = SigHash([7; 32]);

        let next = condition.sign_next(&h0, AuthType::Standard, &key)?;
        assert_eq!(condition.num_signatures(), 1);
        assert_eq!(condition.verify(&h0, AuthType::Standard)?, next);
        assert!(condition.verify(&h0, AuthType::Sponsored).is_err());

        condition.set_tx_fee(181);
        assert!(condition.verify(&h0, AuthType::Standard).is_err());
        condition.set_tx_fee(180);
        condition.set_nonce(1);
        assert!(condition.verify(&h0, AuthType::Standard).is_err());

        condition.clear();
        assert_eq!(condition.num_signatures(), 0);
        assert_eq!(condition.nonce(), 0);
        assert_eq!(condition.tx_fee(), 0);
        Ok(())
    }

    #[test]
    fn singlesig_uncompressed_key() -> Result<()> {
        let key = PrivateKey::from_hex(&PRIVKEYS[1][..64])?;
        assert_eq!(key.public_key().encoding(), PublicKeyEncoding::Uncompressed);
        let mut condition = SpendingCondition::new_singlesig_p2pkh(key.public_key())?;
        condition.set_nonce(2);
        condition.set_tx_fee(180);
        assert_eq!(condition.signer(), hash160(&key.public_key().to_bytes()));
        let h0 = SigHash([5; 32]);

        let next = condition.sign_next(&h0, AuthType::Standard, &key)?;
        let signature = match &condition {
            SpendingCondition::Singlesig(data) => {
                assert_eq!(data.key_encoding, PublicKeyEncoding::Uncompressed);
                data.signature
            }
            other => panic!("unexpected {:?}", other),
        };
        let presign_sighash = presign(&h0, AuthType::Standard, 180, 2)?;
        assert_eq!(next, postsign(&presign_sighash, PublicKeyEncoding::Uncompressed, &signature)?);
        assert!(next != postsign(&presign_sighash, PublicKeyEncoding::Compressed, &signature)?);
        assert_eq!(condition.verify(&h0, AuthType::Standard)?, next);

        let bytes = condition.to_bytes()?;
        assert_eq!(bytes[37], PublicKeyEncoding::Uncompressed.to_u8());
        assert_eq!(SpendingCondition::from_bytes(&bytes)?.verify(&h0, AuthType::Standard)?, next);

        // The compressed form of the same key is a different signer.
        let compressed = PrivateKey::from_hex(PRIVKEYS[1])?;
        assert!(matches!(
            condition.sign_next(&h0, AuthType::Standard, &compressed),
            Err(Error::BadArgument(_))
        ));
        Ok(())
    }

    #[test]
    fn cleared_multisig_encodes_but_does_not_decode() -> Result<()> {
        let keys = keys()?;
        let public_keys: Vec<PublicKey> = keys.iter().map(|k| k.public_key()).collect();
        let mut condition = SpendingCondition::new_multisig_p2sh(2, public_keys)?;
        condition.set_tx_fee(9);
        condition.clear();
        let bytes = condition.to_bytes()?;
        let mut expected = vec![0x01];
        expected.extend_from_slice(&condition.signer().0);
        expected.extend_from_slice(&[0; 16]);
        expected.extend_from_slice(&[0, 0, 0, 0, 0, 2]);
        assert_eq!(bytes, expected);
        assert!(matches!(SpendingCondition::from_bytes(&bytes), Err(Error::BadData(_))));
        Ok(())
    }

    #[test]
    fn singlesig_rejects_wrong_key() -> Result<()> {
        let keys = keys()?;
        let mut condition = SpendingCondition::new_singlesig_p2wpkh(keys[0].public_key())?;
        let result = condition.sign_next(&SigHash::default(), AuthType::Standard, &keys[1]);
        assert!(matches!(result, Err(Error::BadArgument(_))));
        let uncompressed = PrivateKey::from_hex(&PRIVKEYS[0][..64])?;
        assert!(SpendingCondition::new_singlesig_p2wpkh(uncompressed.public_key()).is_err());
        Ok(())
    }

    #[test]
    fn multisig_two_of_three() -> Result<()> {
        let keys = keys()?;
        let public_keys: Vec<PublicKey> = keys.iter().map(|k| k.public_key()).collect();
        let mut condition = SpendingCondition::new_multisig_p2sh(2, public_keys)?;
        let h0 = SigHash([9; 32]);

        let h1 = condition.sign_next(&h0, AuthType::Standard, &keys[0])?;
        assert!(condition.verify(&h0, AuthType::Standard).is_err());
        let h2 = condition.sign_next(&h1, AuthType::Standard, &keys[2])?;
        assert_eq!(condition.num_signatures(), 2);
        assert_eq!(condition.verify(&h0, AuthType::Standard)?, h2);

        let decoded = SpendingCondition::from_bytes(&condition.to_bytes()?)?;
        assert_eq!(decoded.verify(&h0, AuthType::Standard)?, h2);
        Ok(())
    }

    #[test]
    fn multisig_signs_in_order() -> Result<()> {
        let keys = keys()?;
        let public_keys: Vec<PublicKey> = keys.iter().map(|k| k.public_key()).collect();
        let mut condition = SpendingCondition::new_multisig_p2wsh(2, public_keys)?;
        let h0 = SigHash::default();
        let h1 = condition.sign_next(&h0, AuthType::Standard, &keys[1])?;
        assert!(matches!(
            condition.sign_next(&h1, AuthType::Standard, &keys[0]),
            Err(Error::BadArgument(_))
        ));
        assert!(matches!(
            condition.sign_next(&h1, AuthType::Standard, &keys[1]),
            Err(Error::BadArgument(_))
        ));
        let outsider = PrivateKey::from_hex(&format!("{}01", "11".repeat(32)))?;
        assert!(matches!(
            condition.sign_next(&h1, AuthType::Standard, &outsider),
            Err(Error::BadArgument(_))
        ));
        condition.sign_next(&h1, AuthType::Standard, &keys[2])?;
        condition.verify(&h0, AuthType::Standard)?;
        Ok(())
    }

    #[test]
    fn multisig_tampering_fails() -> Result<()> {
        let keys = keys()?;
        let public_keys: Vec<PublicKey> = keys.iter().map(|k| k.public_key()).collect();
        let mut condition = SpendingCondition::new_multisig_p2sh(2, public_keys)?;
        let h0 = SigHash::default();
        let h1 = condition.sign_next(&h0, AuthType::Standard, &keys[0])?;
        condition.sign_next(&h1, AuthType::Standard, &keys[1])?;

        if let SpendingCondition::Multisig(data) = &mut condition {
            if let AuthField::Signature(_, signature) = &mut data.fields[1] {
                signature.0[10] ^= 0x01;
            }
        }
        assert!(condition.verify(&h0, AuthType::Standard).is_err());
        Ok(())
    }

    #[test]
    fn multisig_reordered_signatures_fail() -> Result<()> {
        let keys = keys()?;
        let public_keys: Vec<PublicKey> = keys.iter().map(|k| k.public_key()).collect();
        let mut condition = SpendingCondition::new_multisig_p2sh(2, public_keys)?;
        let h0 = SigHash([3; 32]);
        let h1 = condition.sign_next(&h0, AuthType::Sponsored, &keys[0])?;
        condition.sign_next(&h1, AuthType::Sponsored, &keys[1])?;
        condition.verify(&h0, AuthType::Sponsored)?;

        let mut swapped = condition.clone();
        if let SpendingCondition::Multisig(data) = &mut swapped {
            data.fields.swap(0, 1);
        }
        assert!(swapped.verify(&h0, AuthType::Sponsored).is_err());

        condition.clear();
        assert_eq!(condition.num_signatures(), 0);
        if let SpendingCondition::Multisig(data) = &condition {
            assert!(data.fields.is_empty());
            assert_eq!(data.signatures_required, 2);
        }
        Ok(())
    }

    #[test]
    fn initial_sighash_sentinel() -> Result<()> {
        let sentinel = SpendingCondition::new_initial_sighash();
        assert_eq!(sentinel.hash_mode(), AddressHashMode::P2PKH);
        assert_eq!(sentinel.signer(), Hash160([0; 20]));
        assert_eq!(sentinel.nonce(), 0);
        assert_eq!(sentinel.tx_fee(), 0);
        assert_eq!(sentinel.num_signatures(), 0);
        assert_eq!(sentinel.to_bytes()?.len(), 1 + 20 + 8 + 8 + 1 + 65);
        Ok(())
    }

    #[test]
    fn addresses_per_network() -> Result<()> {
        let key = PublicKey::from_hex(PK_HEX)?;
        let condition = SpendingCondition::new_singlesig_p2pkh(key)?;
        assert_eq!(condition.address(Network::Mainnet).version, 22);
        assert_eq!(condition.address(Network::Testnet).version, 26);
        let wpkh = SpendingCondition::new_singlesig_p2wpkh(key)?;
        assert_eq!(wpkh.address(Network::Mainnet).version, 20);
        Ok(())
    }
}
