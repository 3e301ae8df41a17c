//! Cold storage keypair lifecycle engine
//!
//! Generates cryptocurrency keypairs, encrypts their private values with a
//! passphrase, splits them into N-of-M secret shares, and renders the
//! result in three lossless formats built for printing and later recovery,
//! including a forgiving free-text parser for keys that come back from
//! paper by OCR or hand.
//!
//! The core flow:
//!
//! ```rust
//! use keypiece::domain::{ShareCount, SplitConfig, Threshold};
//! use keypiece::{CurrencyId, Piece};
//!
//! # fn main() -> keypiece::Result<()> {
//! let piece = Piece::generate(&[CurrencyId::Bitcoin, CurrencyId::Ethereum])?;
//!
//! let config = SplitConfig::new(Threshold::new(2)?, ShareCount::new(3)?)?;
//! let shares = piece.split(config)?;
//!
//! // any two shares recover the original
//! let recovered = Piece::combine(&shares[..2])?;
//! assert!(recovered.equals(&piece)?);
//! # Ok(())
//! # }
//! ```

pub mod currency;
pub mod domain;
pub mod error;
pub mod format;
pub mod keypair;
pub mod piece;
pub mod scheme;
pub mod share_codec;
pub mod task;

#[cfg(feature = "cli")]
pub mod cli;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use currency::{CurrencyId, Registry};
pub use error::{Error, Result};
pub use keypair::{Keypair, PublicAddress};
pub use piece::{ENCRYPTION_WORKERS, PIECE_VERSION, Piece};
pub use scheme::EncryptionScheme;
pub use task::CancelHandle;
