//! Delimited table export
//!
//! A four-column CSV aimed at spreadsheet import. The tri-state public
//! address survives through two sentinels: an empty cell means unknown and
//! the literal string `"null"` means the currency has no address concept.
//! Share and encryption metadata ride inside the self-describing private
//! values, so no extra columns are needed for a lossless round trip.

use csv::{ReaderBuilder, WriterBuilder};

use crate::currency::Registry;
use crate::domain::ShareIndex;
use crate::error::{Error, Result};
use crate::keypair::{Keypair, PublicAddress};
use crate::piece::Piece;

const HEADER: [&str; 4] = ["TICKER", "PRIVATE_VALUE", "PUBLIC_ADDRESS", "SHARE_INDEX"];

/// The sentinel for a currency without a public address concept
const NO_ADDRESS: &str = "null";

/// Serializes a piece to its delimited table
///
/// # Errors
/// Returns [`Error::Destroyed`] for destroyed pieces
pub fn encode(piece: &Piece) -> Result<String> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer
        .write_record(HEADER)
        .map_err(|e| Error::state(format!("table serialization failed: {e}")))?;

    for kp in piece.keypairs()? {
        let private = kp.private_value().map_or_else(String::new, |v| v.to_string());
        let public = match kp.public_address() {
            PublicAddress::Unknown => String::new(),
            PublicAddress::NotApplicable => NO_ADDRESS.to_string(),
            PublicAddress::Address(a) => a.clone(),
        };
        let index = kp.share_index().map_or_else(String::new, |i| i.to_string());
        writer
            .write_record([
                kp.currency().ticker(),
                private.as_str(),
                public.as_str(),
                index.as_str(),
            ])
            .map_err(|e| Error::state(format!("table serialization failed: {e}")))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::state(format!("table serialization failed: {e}")))?;
    String::from_utf8(bytes).map_err(|e| Error::state(format!("table is not utf-8: {e}")))
}

/// Deserializes a piece from its delimited table
///
/// # Errors
/// Returns [`Error::MalformedInput`] for anything that is not a table with
/// the expected header and coherent rows
pub fn decode(input: &str, registry: &Registry) -> Result<Piece> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input.as_bytes());
    let headers = reader
        .headers()
        .map_err(|e| Error::malformed(format!("unreadable table header: {e}")))?;
    if headers.iter().ne(HEADER) {
        return Err(Error::malformed("unrecognized table header"));
    }

    let mut keypairs = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let row = row.map_err(|e| Error::malformed(format!("row {i}: {e}")))?;
        if row.len() != HEADER.len() {
            return Err(Error::malformed(format!(
                "row {i} has {} columns, expected {}",
                row.len(),
                HEADER.len()
            )));
        }
        let keypair = decode_row(&row, registry).map_err(|e| match e {
            Error::AddressMismatch { ticker, .. } => Error::AddressMismatch { index: i, ticker },
            other => Error::malformed(format!("row {i}: {other}")),
        })?;
        keypairs.push(keypair);
    }
    if keypairs.is_empty() {
        return Err(Error::malformed("table contains no keypair rows"));
    }

    Piece::new(keypairs).map_err(|e| Error::malformed(format!("table is not a coherent piece: {e}")))
}

fn decode_row(row: &csv::StringRecord, registry: &Registry) -> Result<Keypair> {
    let currency = registry.by_ticker(&row[0])?;
    let private = match &row[1] {
        "" => None,
        value => Some(value),
    };
    let public = match &row[2] {
        "" => None,
        NO_ADDRESS => Some(None),
        value => Some(Some(value)),
    };
    let mut keypair = Keypair::from_parts(currency, private, public)?;

    if !row[3].is_empty() {
        let declared: u8 = row[3]
            .parse()
            .map_err(|_| Error::malformed("SHARE_INDEX is not a number"))?;
        let declared = ShareIndex::new(declared)
            .map_err(|_| Error::malformed("SHARE_INDEX outside 1..=254"))?;
        match keypair.share_index() {
            Some(embedded) if embedded != declared => {
                return Err(Error::malformed(
                    "SHARE_INDEX disagrees with the encoded share",
                ));
            }
            Some(_) => {}
            None => keypair.set_share_index(declared).map_err(|_| {
                Error::malformed("SHARE_INDEX given for a keypair that is not split")
            })?,
        }
    }
    Ok(keypair)
}
