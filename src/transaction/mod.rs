//! Transaction authorization: spending conditions, the sighash chain that binds
//! their signatures together, and the session that signs them in order.
//!
//! The surrounding transaction (payload, post-conditions) is not modeled here.
//! The caller hashes it with [`Authorization::into_initial_sighash_auth`] applied
//! and hands the result to a [`SigningSession`] or to [`Authorization::verify`].

mod auth;
mod condition;
pub mod sighash;
mod signer;

pub use self::auth::Authorization;
pub use self::condition::{
    AuthField, FIELD_PUBLIC_KEY_COMPRESSED, FIELD_PUBLIC_KEY_UNCOMPRESSED, FIELD_SIGNATURE_COMPRESSED,
    FIELD_SIGNATURE_UNCOMPRESSED, MAX_AUTH_FIELDS, MultisigHashMode, MultisigSpendingCondition,
    SinglesigHashMode, SinglesigSpendingCondition, SpendingCondition,
};
pub use self::sighash::{AuthType, next_signature, next_verification, postsign, presign};
pub use self::signer::{SessionOptions, SigningSession};
