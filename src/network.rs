//! Network selection for address version bytes.

/// Mainnet version byte for single-signature addresses.
pub const MAINNET_SINGLESIG_VERSION: u8 = 22;
/// Mainnet version byte for multi-signature (and P2SH-wrapped segwit) addresses.
pub const MAINNET_MULTISIG_VERSION: u8 = 20;
/// Testnet version byte for single-signature addresses.
pub const TESTNET_SINGLESIG_VERSION: u8 = 26;
/// Testnet version byte for multi-signature (and P2SH-wrapped segwit) addresses.
pub const TESTNET_MULTISIG_VERSION: u8 = 21;

/// Network type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    /// Production network
    Mainnet,
    /// Public test network
    Testnet,
}

impl Network {
    /// Address version byte for a spending condition on this network.
    #[must_use]
    #[inline]
    pub fn address_version(self, singlesig: bool) -> u8 {
        match (self, singlesig) {
            (Network::Mainnet, true) => MAINNET_SINGLESIG_VERSION,
            (Network::Mainnet, false) => MAINNET_MULTISIG_VERSION,
            (Network::Testnet, true) => TESTNET_SINGLESIG_VERSION,
            (Network::Testnet, false) => TESTNET_MULTISIG_VERSION,
        }
    }
}
