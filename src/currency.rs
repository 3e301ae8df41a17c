//! Currency capability layer
//!
//! Each supported currency knows how to generate a private value, validate
//! one, and derive the matching public address. The rest of the crate treats
//! private values as opaque strings; only this module knows what a valid
//! Bitcoin key or BIP39 mnemonic looks like.

use std::sync::LazyLock;

use bip39::{Language, Mnemonic};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::scheme::EncryptionScheme;

const RAW_KEY_HEX_LEN: usize = 64;
const MNEMONIC_ENTROPY_LEN: usize = 16;

/// A supported currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurrencyId {
    Bitcoin,
    BitcoinCash,
    Ethereum,
    Monero,
    /// A bare BIP39 seed phrase, usable with any wallet that accepts one.
    /// Carries no public address of its own.
    Bip39,
}

impl CurrencyId {
    /// Short ticker symbol, the stable identifier in serialized records
    #[must_use]
    pub fn ticker(&self) -> &'static str {
        match self {
            CurrencyId::Bitcoin => "BTC",
            CurrencyId::BitcoinCash => "BCH",
            CurrencyId::Ethereum => "ETH",
            CurrencyId::Monero => "XMR",
            CurrencyId::Bip39 => "BIP39",
        }
    }

    /// Human-readable display name used in text exports
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            CurrencyId::Bitcoin => "Bitcoin",
            CurrencyId::BitcoinCash => "Bitcoin Cash",
            CurrencyId::Ethereum => "Ethereum",
            CurrencyId::Monero => "Monero",
            CurrencyId::Bip39 => "BIP39",
        }
    }

    /// Label printed above the private value in text exports
    #[must_use]
    pub fn private_label(&self) -> &'static str {
        match self {
            CurrencyId::Bitcoin | CurrencyId::BitcoinCash | CurrencyId::Ethereum => "Private Key",
            CurrencyId::Monero => "Private Spend Key",
            CurrencyId::Bip39 => "Mnemonic",
        }
    }

    /// Whether the currency has a public address counterpart at all
    ///
    /// A BIP39 seed phrase maps to addresses only through a derivation path
    /// chosen by the consuming wallet, so it has none here.
    #[must_use]
    pub fn has_public_address(&self) -> bool {
        !matches!(self, CurrencyId::Bip39)
    }

    /// Encryption schemes this currency's private values may use
    #[must_use]
    pub fn supported_schemes(&self) -> &'static [EncryptionScheme] {
        &EncryptionScheme::ALL
    }

    /// Relative cost of rendering this currency in an export
    #[must_use]
    pub fn render_weight(&self) -> u64 {
        match self {
            CurrencyId::Monero => 2,
            _ => 1,
        }
    }

    /// Generates a fresh random private value
    ///
    /// # Errors
    /// Returns an error if the system entropy source fails
    pub fn generate(&self) -> Result<Zeroizing<String>> {
        match self {
            CurrencyId::Bip39 => {
                let mut entropy = Zeroizing::new([0u8; MNEMONIC_ENTROPY_LEN]);
                fill_random(entropy.as_mut())?;
                let mnemonic = Mnemonic::from_entropy_in(Language::English, entropy.as_ref())
                    .map_err(|e| Error::state(format!("mnemonic generation failed: {e}")))?;
                Ok(Zeroizing::new(mnemonic.to_string()))
            }
            _ => {
                let mut raw = Zeroizing::new([0u8; RAW_KEY_HEX_LEN / 2]);
                fill_random(raw.as_mut())?;
                Ok(Zeroizing::new(hex::encode(raw.as_ref())))
            }
        }
    }

    /// Checks that a string is a well-formed plaintext private value for
    /// this currency
    ///
    /// # Errors
    /// Returns [`Error::MalformedInput`] describing what was expected
    pub fn validate_private(&self, value: &str) -> Result<()> {
        match self {
            CurrencyId::Bip39 => {
                Mnemonic::parse_in(Language::English, value).map_err(|e| {
                    Error::malformed(format!("not a valid BIP39 mnemonic: {e}"))
                })?;
                Ok(())
            }
            _ => {
                let hex_ok = value.len() == RAW_KEY_HEX_LEN
                    && value.chars().all(|c| c.is_ascii_hexdigit());
                if hex_ok {
                    Ok(())
                } else {
                    Err(Error::malformed(format!(
                        "{} private keys are {RAW_KEY_HEX_LEN} hex characters",
                        self.name()
                    )))
                }
            }
        }
    }

    /// Derives the public address for a plaintext private value
    ///
    /// Returns `None` for currencies without a public address concept.
    ///
    /// # Errors
    /// Returns an error if the private value is not well formed
    pub fn derive_address(&self, private: &str) -> Result<Option<String>> {
        self.validate_private(private)?;
        let (prefix, hex_len) = match self {
            CurrencyId::Bitcoin => ("1", 32),
            CurrencyId::BitcoinCash => ("q", 32),
            CurrencyId::Ethereum => ("0x", 40),
            CurrencyId::Monero => ("4", 64),
            CurrencyId::Bip39 => return Ok(None),
        };
        let mut hasher = Sha256::new();
        hasher.update(self.ticker().as_bytes());
        hasher.update(private.as_bytes());
        let digest = hex::encode(hasher.finalize());
        Ok(Some(format!("{prefix}{}", &digest[..hex_len])))
    }
}

fn fill_random(buf: &mut [u8]) -> Result<()> {
    getrandom::getrandom(buf).map_err(|e| Error::state(format!("failed to gather entropy: {e}")))
}

/// The set of currencies parsers and lookups operate over
#[derive(Debug, Clone)]
pub struct Registry {
    currencies: Vec<CurrencyId>,
}

static STANDARD: LazyLock<Registry> = LazyLock::new(|| {
    Registry::new(vec![
        CurrencyId::Bitcoin,
        CurrencyId::BitcoinCash,
        CurrencyId::Ethereum,
        CurrencyId::Monero,
        CurrencyId::Bip39,
    ])
});

impl Registry {
    #[must_use]
    pub fn new(currencies: Vec<CurrencyId>) -> Self {
        Self { currencies }
    }

    /// The built-in registry holding every supported currency
    #[must_use]
    pub fn standard() -> &'static Registry {
        &STANDARD
    }

    #[must_use]
    pub fn currencies(&self) -> &[CurrencyId] {
        &self.currencies
    }

    /// Looks a currency up by ticker symbol, case-insensitively
    ///
    /// # Errors
    /// Returns [`Error::MalformedInput`] if no registered currency matches
    pub fn by_ticker(&self, ticker: &str) -> Result<CurrencyId> {
        self.currencies
            .iter()
            .copied()
            .find(|c| c.ticker().eq_ignore_ascii_case(ticker))
            .ok_or_else(|| Error::malformed(format!("no currency for ticker '{ticker}'")))
    }
}
