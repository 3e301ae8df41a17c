//! Error taxonomy for the keypair/piece lifecycle engine
//!
//! Every failure the library surfaces is one of these variants. Callers rely
//! on the classification: [`Error::MalformedInput`] is expected control flow
//! for the format parsing cascade, while the remaining variants are terminal
//! for the operation that raised them.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Operation is not valid for the current encrypt/split state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Scheme-specific decryption failed its integrity check. Covers both a
    /// wrong passphrase and undetectably corrupted ciphertext, which AES-GCM
    /// cannot tell apart.
    #[error("incorrect passphrase")]
    IncorrectPassphrase,

    /// Decrypted private value derives an address that disagrees with the
    /// previously recorded one. Signals corruption or the wrong key.
    #[error("derived address does not match recorded address on keypair {index} ({ticker})")]
    AddressMismatch { index: usize, ticker: &'static str },

    /// Operation requires a private value the keypair does not have.
    #[error("keypair has no private key")]
    NoPrivateKey,

    /// Too few shares were submitted to recover the secret.
    #[error("need {missing} more {} to recover private keys", if *.missing == 1 { "piece" } else { "pieces" })]
    InsufficientShares { missing: usize },

    /// Submitted shares do not belong to the same original secret.
    #[error("pieces are not compatible: {0}")]
    IncompatibleParts(String),

    /// Input could not be interpreted by a codec or parser.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Any access after `destroy()`.
    #[error("piece is destroyed")]
    Destroyed,
}

impl Error {
    /// Builds an `InvalidState` from anything displayable.
    pub(crate) fn state(msg: impl Into<String>) -> Self {
        Error::InvalidState(msg.into())
    }

    /// Builds a `MalformedInput` from anything displayable.
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedInput(msg.into())
    }
}
