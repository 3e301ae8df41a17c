//! WASM bindings
//!
//! JavaScript-friendly wrappers over the piece lifecycle. Pieces cross the
//! boundary as their JSON record strings; every fallible call maps its
//! error onto a `JsValue` message.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::currency::Registry;
use crate::domain::{ShareCount, SplitConfig, Threshold};
use crate::format;
use crate::piece::Piece;
use crate::scheme::EncryptionScheme;

/// Initialize panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Use wee_alloc as the global allocator for smaller WASM binary size
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

fn err_js(context: &str, e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{context}: {e}"))
}

fn parse_piece(piece_json: &str) -> Result<Piece, JsValue> {
    format::parse(piece_json, Registry::standard()).map_err(|e| err_js("Invalid piece", e))
}

fn piece_json(piece: &Piece) -> Result<String, JsValue> {
    format::json::encode(piece).map_err(|e| err_js("Serialization failed", e))
}

/// Result of a split operation
#[derive(Serialize)]
pub struct SplitResult {
    /// The share pieces as JSON records, one per piece
    pub pieces: Vec<String>,
    /// Number of pieces generated
    pub share_count: u8,
    /// Threshold required to reconstruct
    pub threshold: u8,
}

/// Generate a new piece with one keypair per ticker
///
/// Returns the piece as a JSON record string.
#[wasm_bindgen]
pub fn wasm_generate(tickers: Vec<String>) -> Result<String, JsValue> {
    let registry = Registry::standard();
    let currencies = tickers
        .iter()
        .map(|t| registry.by_ticker(t))
        .collect::<crate::Result<Vec<_>>>()
        .map_err(|e| err_js("Invalid ticker", e))?;
    let piece = Piece::generate(&currencies).map_err(|e| err_js("Generation failed", e))?;
    piece_json(&piece)
}

/// Split a piece into Shamir Secret Share pieces
///
/// # Arguments
/// * `piece_json` - The piece to split, in any supported format
/// * `shares` - Total number of pieces to create (2-254)
/// * `threshold` - Minimum number of pieces needed to reconstruct
///
/// # Returns
/// A `SplitResult` object with the share pieces and metadata
#[wasm_bindgen]
pub fn wasm_split(piece_json: &str, shares: u8, threshold: u8) -> Result<JsValue, JsValue> {
    let threshold_obj =
        Threshold::new(threshold).map_err(|e| err_js("Invalid threshold", e))?;
    let share_count = ShareCount::new(shares).map_err(|e| err_js("Invalid share count", e))?;
    let config = SplitConfig::new(threshold_obj, share_count)
        .map_err(|e| err_js("Invalid configuration", e))?;

    let piece = parse_piece(piece_json)?;
    let split = piece.split(config).map_err(|e| err_js("Split failed", e))?;
    let pieces = split
        .iter()
        .map(|p| format::json::encode(p))
        .collect::<crate::Result<Vec<_>>>()
        .map_err(|e| err_js("Serialization failed", e))?;

    let result = SplitResult {
        pieces,
        share_count: shares,
        threshold,
    };
    serde_wasm_bindgen::to_value(&result).map_err(|e| err_js("Serialization failed", e))
}

/// Combine share pieces to reconstruct the original piece
#[wasm_bindgen]
pub fn wasm_combine(pieces: Vec<String>) -> Result<String, JsValue> {
    let parsed = pieces
        .iter()
        .map(|p| parse_piece(p))
        .collect::<Result<Vec<_>, JsValue>>()?;
    let recovered = Piece::combine(&parsed).map_err(|e| err_js("Combine failed", e))?;
    piece_json(&recovered)
}

/// Encrypt every private key of a piece with one scheme and passphrase
///
/// `scheme` is a scheme identifier, `aes-gcm-pbkdf2` or `aes-gcm-scrypt`.
#[wasm_bindgen]
pub fn wasm_encrypt(piece_json: &str, passphrase: &str, scheme: &str) -> Result<String, JsValue> {
    let scheme = EncryptionScheme::from_id(scheme).map_err(|e| err_js("Invalid scheme", e))?;
    let mut piece = parse_piece(piece_json)?;
    let count = piece
        .keypairs()
        .map_err(|e| err_js("Invalid piece", e))?
        .len();
    piece
        .encrypt(passphrase, &vec![scheme; count], None)
        .map_err(|e| err_js("Encryption failed", e))?;
    piece_json(&piece)
}

/// Decrypt every private key of a piece with one passphrase
#[wasm_bindgen]
pub fn wasm_decrypt(piece_json: &str, passphrase: &str) -> Result<String, JsValue> {
    let mut piece = parse_piece(piece_json)?;
    piece
        .decrypt(passphrase, None)
        .map_err(|e| err_js("Decryption failed", e))?;
    piece_json(&piece)
}

/// Parse a piece from arbitrary text (JSON record, table, or pasted prose)
///
/// Returns the normalized JSON record string.
#[wasm_bindgen]
pub fn wasm_parse(text: &str) -> Result<String, JsValue> {
    let piece = parse_piece(text)?;
    piece_json(&piece)
}

/// Render a piece in another format: `json`, `csv`, or `txt`
#[wasm_bindgen]
pub fn wasm_convert(piece_json_input: &str, to: &str) -> Result<String, JsValue> {
    let piece = parse_piece(piece_json_input)?;
    let rendered = match to {
        "json" => format::json::encode(&piece),
        "csv" => format::table::encode(&piece),
        "txt" => format::text::encode(&piece),
        other => return Err(JsValue::from_str(&format!("Unknown format '{other}'"))),
    };
    rendered.map_err(|e| err_js("Serialization failed", e))
}
