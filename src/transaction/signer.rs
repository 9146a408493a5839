//! Drives signing of an authorization in order: origin keys first, then sponsor keys.
//!
//! # Examples
//!
//! ```
//! use txauth::keys::{PrivateKey, SigningKey};
//! use txauth::transaction::{Authorization, SigningSession};
//! use txauth::util::SigHash;
//!
//! let origin = PrivateKey::from_hex("edf9aee84d9b7abc145504dde6726c64f369d37ee34ded868fabd876c26570bc01")?;
//! let sponsor = PrivateKey::from_hex("2a584d899fed1d24e26b524f202763c8ab30260167429f157f1c119f550fa6af01")?;
//! let mut auth = Authorization::from_p2pkh(origin.public_key())?
//!     .into_sponsored(Authorization::from_p2pkh(sponsor.public_key())?)?;
//!
//! // The caller hashes the transaction with `into_initial_sighash_auth()` applied.
//! let initial_sighash = SigHash([0x5a; 32]);
//! let mut session = SigningSession::new(&mut auth, initial_sighash);
//! session.sign_origin(&origin)?;
//! session.sign_sponsor(&sponsor)?;
//! assert!(session.is_complete());
//!
//! auth.verify(&initial_sighash)?;
//! # Ok::<(), txauth::util::Error>(())
//! ```

use super::auth::Authorization;
use super::sighash::AuthType;
use crate::keys::SigningKey;
use crate::util::{Error, Result, SigHash};
use log::debug;

/// Guards applied by a [`SigningSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Reject a signature once a condition holds all it needs
    pub check_oversign: bool,
    /// Reject origin signatures once sponsor signing has started
    pub check_overlap: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        SessionOptions { check_oversign: true, check_overlap: true }
    }
}

/// Signing state for one authorization.
///
/// Holds the authorization mutably for its lifetime and the current sighash,
/// which each signature advances.
#[derive(Debug)]
pub struct SigningSession<'a> {
    auth: &'a mut Authorization,
    sighash: SigHash,
    origin_done: bool,
    check_oversign: bool,
    check_overlap: bool,
}

impl<'a> SigningSession<'a> {
    /// Starts a session from the transaction's initial sighash with default guards.
    pub fn new(auth: &'a mut Authorization, initial_sighash: SigHash) -> SigningSession<'a> {
        SigningSession::with_options(auth, initial_sighash, SessionOptions::default())
    }

    /// Starts a session with explicit guards.
    pub fn with_options(
        auth: &'a mut Authorization,
        initial_sighash: SigHash,
        options: SessionOptions,
    ) -> SigningSession<'a> {
        SigningSession {
            auth,
            sighash: initial_sighash,
            origin_done: false,
            check_oversign: options.check_oversign,
            check_overlap: options.check_overlap,
        }
    }

    /// Adds the next origin signature.
    ///
    /// # Errors
    /// `Error::Overlap` after sponsor signing started, `Error::Oversign` once the
    /// origin threshold is met, or whatever the condition reports for this key.
    pub fn sign_origin(&mut self, key: &dyn SigningKey) -> Result<()> {
        if self.check_overlap && self.origin_done {
            return Err(Error::Overlap);
        }
        let origin = self.auth.origin_mut();
        if self.check_oversign && origin.num_signatures() >= origin.signatures_required() {
            return Err(Error::Oversign);
        }
        let next_sighash = origin.sign_next(&self.sighash, AuthType::Standard, key)?;
        debug!(
            "origin {} signed {}/{}, sighash {}",
            origin.signer(),
            origin.num_signatures(),
            origin.signatures_required(),
            next_sighash
        );
        self.sighash = next_sighash;
        Ok(())
    }

    /// Adds the next sponsor signature, chaining from the origin's last sighash.
    ///
    /// # Errors
    /// `Error::InvalidOperation` on a standard authorization, `Error::NotReady`
    /// while the origin is short of signatures, `Error::Oversign` once the sponsor
    /// threshold is met.
    pub fn sign_sponsor(&mut self, key: &dyn SigningKey) -> Result<()> {
        let (origin, sponsor) = match &mut *self.auth {
            Authorization::Sponsored(origin, sponsor) => (origin, sponsor),
            Authorization::Standard(_) => {
                return Err(Error::InvalidOperation("Standard authorization has no sponsor".to_string()));
            }
        };
        if !origin.is_fully_signed() {
            return Err(Error::NotReady);
        }
        if self.check_oversign && sponsor.num_signatures() >= sponsor.signatures_required() {
            return Err(Error::Oversign);
        }
        let next_sighash = sponsor.sign_next(&self.sighash, AuthType::Sponsored, key)?;
        debug!(
            "sponsor {} signed {}/{}, sighash {}",
            sponsor.signer(),
            sponsor.num_signatures(),
            sponsor.signatures_required(),
            next_sighash
        );
        self.sighash = next_sighash;
        self.origin_done = true;
        Ok(())
    }

    /// Closes origin signing without a sponsor signature.
    #[inline]
    pub fn mark_origin_done(&mut self) {
        self.origin_done = true;
    }

    /// Whether origin signing is closed.
    #[must_use]
    #[inline]
    pub fn origin_done(&self) -> bool {
        self.origin_done
    }

    /// The sighash the next signature will start from.
    #[must_use]
    #[inline]
    pub fn sighash(&self) -> SigHash {
        self.sighash
    }

    /// Whether every condition holds all the signatures it needs.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.auth.origin().is_fully_signed() && self.auth.sponsor().is_none_or(|s| s.is_fully_signed())
    }

    /// The authorization being signed.
    #[must_use]
    #[inline]
    pub fn authorization(&self) -> &Authorization {
        self.auth
    }
}
