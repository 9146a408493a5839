#![deny(missing_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/*! # txauth

Authorization for account-based blockchain transactions: single and multi-signature
spending conditions, standard and sponsored authorizations, the chained sighash
that binds every signature to the ones before it, and the canonical big-endian
wire format a validating node reads.

## Usage
```
use txauth::keys::{PrivateKey, SigningKey};
use txauth::network::Network;
use txauth::transaction::{Authorization, SigningSession};
use txauth::util::hash32;

let key = PrivateKey::from_hex("edf9aee84d9b7abc145504dde6726c64f369d37ee34ded868fabd876c26570bc01")?;
let mut auth = Authorization::from_p2pkh(key.public_key())?;
auth.origin_mut().set_tx_fee(180);

let initial_sighash = hash32(b"serialized transaction");
SigningSession::new(&mut auth, initial_sighash).sign_origin(&key)?;
auth.verify(&initial_sighash)?;
assert_eq!(auth.origin().address(Network::Mainnet).version, 22);
# Ok::<(), txauth::util::Error>(())
```

## Security
- Signing is deterministic (RFC6979). Private keys never appear in `Debug` output.
- Decoding is bounded: multi-signature conditions carry at most
  `transaction::MAX_AUTH_FIELDS` fields.
*/

pub mod address;
pub mod keys;
pub mod network;
pub mod transaction;
pub mod util;
