//! Scripts whose HASH160 becomes the signer hash of a spending condition.
//!
//! P2PKH hashes the key itself; P2SH hashes an m-of-n CHECKMULTISIG redeem script;
//! P2WPKH and P2WSH hash the version-0 witness program that would appear in a
//! P2SH-wrapped segwit output.
use crate::keys::PublicKey;
use crate::util::{Error, Result};
use bitcoin_hashes::{sha256, Hash as BHHash};

/// Pushes empty array (0/false) onto the stack; also the segwit version 0 tag.
pub const OP_0: u8 = 0;
/// Pushes 1 onto the stack; OP_2..OP_16 follow it.
pub const OP_1: u8 = 81;
/// Pushes 16 onto the stack.
pub const OP_16: u8 = 96;
/// Next byte is push length (up to 255 bytes).
pub const OP_PUSHDATA1: u8 = 76;
/// m-of-n signature check.
pub const OP_CHECKMULTISIG: u8 = 174;

/// Appends a data push for `data` (at most 255 bytes).
fn append_data(script: &mut Vec<u8>, data: &[u8]) -> Result<()> {
    match data.len() {
        n @ 0..=75 => script.push(n as u8),
        n @ 76..=255 => {
            script.push(OP_PUSHDATA1);
            script.push(n as u8);
        }
        n => return Err(Error::BadArgument(format!("Push of {} bytes too large", n))),
    }
    script.extend_from_slice(data);
    Ok(())
}

/// Appends the minimal push of a small non-negative integer.
fn append_num(script: &mut Vec<u8>, n: u16) -> Result<()> {
    match n {
        0 => script.push(OP_0),
        1..=16 => script.push(OP_1 + (n - 1) as u8),
        _ => {
            // Script numbers are little-endian sign-magnitude.
            let mut bytes: Vec<u8> = n.to_le_bytes().to_vec();
            while bytes.last() == Some(&0) {
                bytes.pop();
            }
            if bytes.last().is_some_and(|b| b & 0x80 != 0) {
                bytes.push(0);
            }
            append_data(script, &bytes)?;
        }
    }
    Ok(())
}

/// Creates the `OP_m <pk1> .. <pkn> OP_n OP_CHECKMULTISIG` redeem script.
///
/// Keys are pushed in their committed encoding and in the given order.
///
/// # Errors
/// `Error::BadArgument` if `num_sigs` is zero, exceeds the key count, or more than
/// `u16::MAX` keys are given.
pub fn create_multisig_redeem_script(num_sigs: u16, public_keys: &[PublicKey]) -> Result<Vec<u8>> {
    let num_keys = u16::try_from(public_keys.len())
        .map_err(|_| Error::BadArgument(format!("Too many public keys: {}", public_keys.len())))?;
    if num_sigs == 0 || num_sigs > num_keys {
        return Err(Error::BadArgument(format!(
            "Cannot require {} of {} signatures",
            num_sigs, num_keys
        )));
    }
    let mut script = Vec::with_capacity(3 + public_keys.len() * 66);
    append_num(&mut script, num_sigs)?;
    for key in public_keys {
        append_data(&mut script, &key.to_bytes())?;
    }
    append_num(&mut script, num_keys)?;
    script.push(OP_CHECKMULTISIG);
    Ok(script)
}

/// Creates the version-0 witness program `OP_0 <20-byte key hash>`.
#[must_use]
pub fn create_p2wpkh_program(key_hash: &[u8; 20]) -> Vec<u8> {
    let mut script = Vec::with_capacity(22);
    script.push(OP_0);
    script.push(20);
    script.extend_from_slice(key_hash);
    script
}

/// Creates the version-0 witness program `OP_0 <32-byte SHA256(witness script)>`.
#[must_use]
pub fn create_p2wsh_program(witness_script: &[u8]) -> Vec<u8> {
    let script_hash = sha256::Hash::hash(witness_script).to_byte_array();
    let mut script = Vec::with_capacity(34);
    script.push(OP_0);
    script.push(32);
    script.extend_from_slice(&script_hash);
    script
}
