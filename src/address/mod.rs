//! Address hash modes and derivation of the 20-byte signer hash from public keys.
//!
//! A spending condition names its signer by a HASH160 computed from the public
//! key(s) according to its [`AddressHashMode`]. Encoding that hash as a
//! human-readable string is left to the caller.

pub mod script;

use crate::keys::PublicKey;
use crate::network::Network;
use crate::util::{Error, Hash160, Result, hash160};

/// Mode byte for order-independent P2SH multisig, which this library does not support.
pub const ORDER_INDEPENDENT_P2SH: u8 = 0x05;
/// Mode byte for order-independent P2WSH multisig, which this library does not support.
pub const ORDER_INDEPENDENT_P2WSH: u8 = 0x07;

/// How the signer hash of a spending condition is computed from its keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AddressHashMode {
    /// HASH160 of a single public key
    P2PKH = 0x00,
    /// HASH160 of an m-of-n multisig redeem script
    P2SH = 0x01,
    /// HASH160 of a P2SH-wrapped P2WPKH witness program
    P2WPKH = 0x02,
    /// HASH160 of a P2SH-wrapped P2WSH witness program
    P2WSH = 0x03,
}

impl AddressHashMode {
    /// Parses the wire byte.
    #[must_use]
    pub fn from_u8(n: u8) -> Option<AddressHashMode> {
        match n {
            0x00 => Some(AddressHashMode::P2PKH),
            0x01 => Some(AddressHashMode::P2SH),
            0x02 => Some(AddressHashMode::P2WPKH),
            0x03 => Some(AddressHashMode::P2WSH),
            _ => None,
        }
    }

    /// The wire byte.
    #[must_use]
    #[inline]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Whether this mode is for exactly one key.
    #[must_use]
    #[inline]
    pub fn is_singlesig(self) -> bool {
        matches!(self, AddressHashMode::P2PKH | AddressHashMode::P2WPKH)
    }

    /// Whether this mode only admits compressed keys.
    #[must_use]
    #[inline]
    pub fn requires_compressed(self) -> bool {
        matches!(self, AddressHashMode::P2WPKH | AddressHashMode::P2WSH)
    }
}

/// Computes the signer hash for `public_keys` under `mode`.
///
/// # Errors
/// `Error::BadArgument` if a single-key mode is not given exactly one key, a segwit mode
/// is given an uncompressed key, or the threshold does not fit the key count.
pub fn public_keys_to_address_hash(
    mode: AddressHashMode,
    num_sigs: u16,
    public_keys: &[PublicKey],
) -> Result<Hash160> {
    if mode.requires_compressed() && public_keys.iter().any(|k| !k.compressed()) {
        return Err(Error::BadArgument(format!("{:?} requires compressed public keys", mode)));
    }
    if mode.is_singlesig() {
        let key = match public_keys {
            [key] if num_sigs == 1 => key,
            _ => {
                return Err(Error::BadArgument(format!(
                    "{:?} takes exactly one key and one signature",
                    mode
                )));
            }
        };
        let key_hash = hash160(&key.to_bytes());
        return match mode {
            AddressHashMode::P2WPKH => Ok(hash160(&script::create_p2wpkh_program(&key_hash.0))),
            _ => Ok(key_hash),
        };
    }
    let redeem_script = script::create_multisig_redeem_script(num_sigs, public_keys)?;
    match mode {
        AddressHashMode::P2WSH => Ok(hash160(&script::create_p2wsh_program(&redeem_script))),
        _ => Ok(hash160(&redeem_script)),
    }
}

/// A version byte plus signer hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    /// Address version byte, see [`crate::network`]
    pub version: u8,
    /// Signer hash
    pub bytes: Hash160,
}

impl Address {
    /// Derives an address from public keys.
    pub fn from_public_keys(
        version: u8,
        mode: AddressHashMode,
        num_sigs: u16,
        public_keys: &[PublicKey],
    ) -> Result<Address> {
        let bytes = public_keys_to_address_hash(mode, num_sigs, public_keys)?;
        Ok(Address { version, bytes })
    }

    /// Builds the address of a signer hash for `network`.
    #[must_use]
    pub fn for_network(network: Network, mode: AddressHashMode, bytes: Hash160) -> Address {
        let version = network.address_version(mode == AddressHashMode::P2PKH);
        Address { version, bytes }
    }
}
