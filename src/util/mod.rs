//! Miscellaneous helpers: hashes, errors and the wire codec trait.

pub mod hash160;
mod result;
mod serdes;
mod sighash;

pub use self::hash160::{Hash160, hash160};
pub use self::result::{Error, Result};
pub use self::serdes::Serializable;
pub use self::sighash::{SIGHASH_SIZE, SigHash, hash32};
