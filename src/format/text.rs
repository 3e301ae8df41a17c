//! Human-readable text export
//!
//! The format meant for printing and offline storage: one block per
//! keypair, each headed by a numbered divider with the currency name,
//! followed by labeled sections for the public address and the private
//! value. The private label carries the lifecycle state in parentheses so
//! a reader knows what they are holding:
//!
//! ```text
//! ===== #1 Bitcoin =====
//!
//! Public Address:
//! 1f8a...
//!
//! Private Key (unencrypted):
//! a91b...
//! ```
//!
//! Parsing is delegated to the free-text recovery engine, which tolerates
//! far messier input than this exporter produces.

use std::fmt::Write;

use crate::currency::Registry;
use crate::error::{Error, Result};
use crate::keypair::PublicAddress;
use crate::piece::Piece;

use super::recover;

/// The marker printed in place of an address for currencies without one
pub(crate) const NOT_APPLICABLE: &str = "Not applicable";

/// Renders a piece as printable text blocks
///
/// # Errors
/// Returns [`Error::Destroyed`] for destroyed pieces
pub fn encode(piece: &Piece) -> Result<String> {
    let mut out = String::new();
    for (i, kp) in piece.keypairs()?.iter().enumerate() {
        let _ = writeln!(out, "===== #{} {} =====\n", i + 1, kp.currency().name());

        match kp.public_address() {
            PublicAddress::Unknown => {}
            PublicAddress::NotApplicable => {
                let _ = writeln!(out, "Public Address:\n{NOT_APPLICABLE}\n");
            }
            PublicAddress::Address(address) => {
                let _ = writeln!(out, "Public Address:\n{address}\n");
            }
        }

        if let Some(private) = kp.private_value() {
            let state = if kp.is_split() {
                "split"
            } else if kp.is_encrypted() == Some(true) {
                "encrypted"
            } else {
                "unencrypted"
            };
            let _ = writeln!(
                out,
                "{} ({state}):\n{}\n",
                kp.currency().private_label(),
                &*private
            );
        }
    }
    while out.ends_with('\n') {
        out.pop();
    }
    out.push('\n');
    Ok(out)
}

/// Parses printable text back into a piece
///
/// # Errors
/// Returns [`Error::MalformedInput`] when no coherent piece can be read
pub fn decode(input: &str, registry: &Registry) -> Result<Piece> {
    if input.trim().is_empty() {
        return Err(Error::malformed("empty input"));
    }
    recover::parse_free_text(input, registry)
}
