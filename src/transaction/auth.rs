//! Transaction authorization: the origin's spending condition and, for sponsored
//! transactions, the sponsor's.
//!
//! The origin always signs with [`AuthType::Standard`], even inside a sponsored
//! authorization, so its signatures survive a sponsor being attached later. The
//! sponsor signs with [`AuthType::Sponsored`] starting from the sighash the origin
//! finished on.

use super::condition::SpendingCondition;
use super::sighash::AuthType;
use crate::keys::PublicKey;
use crate::util::{Error, Result, Serializable, SigHash};
use byteorder::{ReadBytesExt, WriteBytesExt};
use log::debug;
use std::io;
use std::io::{Cursor, Read, Write};

/// Authorization of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    /// The origin pays
    Standard(SpendingCondition),
    /// The sponsor (second) pays on behalf of the origin (first)
    Sponsored(SpendingCondition, SpendingCondition),
}

impl Authorization {
    /// Standard authorization by a single P2PKH key.
    pub fn from_p2pkh(public_key: PublicKey) -> Result<Authorization> {
        Ok(Authorization::Standard(SpendingCondition::new_singlesig_p2pkh(public_key)?))
    }

    /// Standard authorization by a single P2WPKH key.
    pub fn from_p2wpkh(public_key: PublicKey) -> Result<Authorization> {
        Ok(Authorization::Standard(SpendingCondition::new_singlesig_p2wpkh(public_key)?))
    }

    /// Standard authorization by `num_sigs` of `public_keys` under P2SH.
    pub fn from_p2sh(num_sigs: u16, public_keys: Vec<PublicKey>) -> Result<Authorization> {
        Ok(Authorization::Standard(SpendingCondition::new_multisig_p2sh(num_sigs, public_keys)?))
    }

    /// Standard authorization by `num_sigs` of `public_keys` under P2WSH.
    pub fn from_p2wsh(num_sigs: u16, public_keys: Vec<PublicKey>) -> Result<Authorization> {
        Ok(Authorization::Standard(SpendingCondition::new_multisig_p2wsh(num_sigs, public_keys)?))
    }

    /// Turns a standard authorization into a sponsored one, taking the sponsor's
    /// condition from `sponsor_auth`.
    ///
    /// # Errors
    /// `Error::InvalidOperation` unless both authorizations are standard.
    pub fn into_sponsored(self, sponsor_auth: Authorization) -> Result<Authorization> {
        match (self, sponsor_auth) {
            (Authorization::Standard(origin), Authorization::Standard(sponsor)) => {
                Ok(Authorization::Sponsored(origin, sponsor))
            }
            _ => Err(Error::InvalidOperation("Both authorizations must be standard".to_string())),
        }
    }

    /// Replaces the sponsor's spending condition.
    ///
    /// # Errors
    /// `Error::InvalidOperation` on a standard authorization.
    pub fn set_sponsor(&mut self, sponsor_condition: SpendingCondition) -> Result<()> {
        match self {
            Authorization::Sponsored(_, sponsor) => {
                *sponsor = sponsor_condition;
                Ok(())
            }
            Authorization::Standard(_) => {
                Err(Error::InvalidOperation("Cannot set sponsor on a standard authorization".to_string()))
            }
        }
    }

    /// The flag byte this authorization serializes with.
    #[must_use]
    #[inline]
    pub fn auth_type(&self) -> AuthType {
        match self {
            Authorization::Standard(_) => AuthType::Standard,
            Authorization::Sponsored(..) => AuthType::Sponsored,
        }
    }

    /// The origin's spending condition.
    #[must_use]
    pub fn origin(&self) -> &SpendingCondition {
        match self {
            Authorization::Standard(origin) | Authorization::Sponsored(origin, _) => origin,
        }
    }

    /// The origin's spending condition, mutably.
    pub fn origin_mut(&mut self) -> &mut SpendingCondition {
        match self {
            Authorization::Standard(origin) | Authorization::Sponsored(origin, _) => origin,
        }
    }

    /// The sponsor's spending condition, if any.
    #[must_use]
    pub fn sponsor(&self) -> Option<&SpendingCondition> {
        match self {
            Authorization::Standard(_) => None,
            Authorization::Sponsored(_, sponsor) => Some(sponsor),
        }
    }

    /// The sponsor's spending condition, mutably, if any.
    pub fn sponsor_mut(&mut self) -> Option<&mut SpendingCondition> {
        match self {
            Authorization::Standard(_) => None,
            Authorization::Sponsored(_, sponsor) => Some(sponsor),
        }
    }

    /// Clears every condition, see [`SpendingCondition::clear`].
    pub fn clear(&mut self) {
        match self {
            Authorization::Standard(origin) => origin.clear(),
            Authorization::Sponsored(origin, sponsor) => {
                origin.clear();
                sponsor.clear();
            }
        }
    }

    /// The authorization as it is hashed to produce the initial sighash.
    ///
    /// The origin is cleared and a sponsor condition is replaced with
    /// [`SpendingCondition::new_initial_sighash`], so the origin can sign before
    /// the sponsor is known.
    pub fn into_initial_sighash_auth(self) -> Authorization {
        match self {
            Authorization::Standard(mut origin) => {
                origin.clear();
                Authorization::Standard(origin)
            }
            Authorization::Sponsored(mut origin, _) => {
                origin.clear();
                Authorization::Sponsored(origin, SpendingCondition::new_initial_sighash())
            }
        }
    }

    /// Verifies the origin and returns the sighash it finished on.
    pub fn verify_origin(&self, initial_sighash: &SigHash) -> Result<SigHash> {
        self.origin().verify(initial_sighash, AuthType::Standard)
    }

    /// Verifies the whole authorization: the origin from `initial_sighash`, then the
    /// sponsor from where the origin finished.
    pub fn verify(&self, initial_sighash: &SigHash) -> Result<()> {
        let origin_sighash = self.verify_origin(initial_sighash)?;
        if let Authorization::Sponsored(_, sponsor) = self {
            sponsor.verify(&origin_sighash, AuthType::Sponsored)?;
        }
        debug!("{:?} authorization verified", self.auth_type());
        Ok(())
    }

    /// Serializes into a new buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut v = Vec::new();
        self.write(&mut v)?;
        Ok(v)
    }

    /// Deserializes from `bytes`, which must hold exactly one authorization.
    pub fn from_bytes(bytes: &[u8]) -> Result<Authorization> {
        let mut cursor = Cursor::new(bytes);
        let auth = Authorization::read(&mut cursor)?;
        if cursor.position() != bytes.len() as u64 {
            return Err(Error::BadData(format!(
                "{} trailing bytes after authorization",
                bytes.len() as u64 - cursor.position()
            )));
        }
        Ok(auth)
    }
}

impl Serializable<Authorization> for Authorization {
    fn read(reader: &mut dyn Read) -> Result<Authorization> {
        let type_id = reader.read_u8()?;
        match AuthType::from_u8(type_id) {
            Some(AuthType::Standard) => Ok(Authorization::Standard(SpendingCondition::read(reader)?)),
            Some(AuthType::Sponsored) => {
                let origin = SpendingCondition::read(reader)?;
                let sponsor = SpendingCondition::read(reader)?;
                Ok(Authorization::Sponsored(origin, sponsor))
            }
            None => {
                debug!("rejecting unknown authorization type {:#04x}", type_id);
                Err(Error::UnknownAuthType(type_id))
            }
        }
    }

    fn write(&self, writer: &mut dyn Write) -> io::Result<()> {
        writer.write_u8(self.auth_type().to_u8())?;
        match self {
            Authorization::Standard(origin) => origin.write(writer),
            Authorization::Sponsored(origin, sponsor) => {
                origin.write(writer)?;
                sponsor.write(writer)
            }
        }
    }
}
