//! Piece serialization formats and the universal import cascade
//!
//! Three lossless exports: a structured JSON record, a delimited table for
//! spreadsheets, and printable text blocks. [`parse`] accepts any of them
//! by trying the strictest reader first and falling through on "this is
//! not my format" errors only; a reader that recognizes its format but
//! finds real problems inside aborts the cascade with that finding.

use crate::currency::{CurrencyId, Registry};
use crate::error::{Error, Result};
use crate::keypair::Keypair;
use crate::piece::Piece;

pub mod json;
pub mod recover;
pub mod table;
pub mod text;

/// Parses a piece from any supported representation
///
/// # Errors
/// Returns [`Error::MalformedInput`] when no reader recognizes the input;
/// authoritative findings like [`Error::AddressMismatch`] pass through
pub fn parse(input: &str, registry: &Registry) -> Result<Piece> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::malformed("empty input"));
    }

    for decode in [json::decode, table::decode, text::decode] {
        match decode(trimmed, registry) {
            Ok(piece) => return Ok(piece),
            Err(Error::MalformedInput(_)) => {}
            Err(other) => return Err(other),
        }
    }
    Err(Error::malformed(
        "input is not a piece record, table, or recognizable text",
    ))
}

/// Parses a piece from bare private values, one per line, all of one
/// known currency
///
/// # Errors
/// Returns [`Error::MalformedInput`] if any line fits no private value
/// state for the currency
pub fn parse_keys(input: &str, currency: CurrencyId) -> Result<Piece> {
    let keypairs = input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| Keypair::from_parts(currency, Some(line), None))
        .collect::<Result<Vec<_>>>()
        .map_err(|e| Error::malformed(format!("cannot parse private keys: {e}")))?;
    if keypairs.is_empty() {
        return Err(Error::malformed("no private keys in input"));
    }
    Piece::new(keypairs).map_err(|e| Error::malformed(format!("keys do not form a piece: {e}")))
}
