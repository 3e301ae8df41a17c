//! Structured piece records in JSON
//!
//! The canonical lossless format. Tri-state public addresses map onto JSON
//! field presence: an omitted `publicAddress` means unknown, an explicit
//! `null` means the currency has no address concept, and a string is a
//! concrete address. Private values are self-describing, but the redundant
//! metadata fields are still emitted for human inspection and cross-checked
//! on decode.

use serde::{Deserialize, Deserializer, Serialize};

use crate::currency::Registry;
use crate::domain::ShareIndex;
use crate::error::{Error, Result};
use crate::keypair::{Keypair, PublicAddress};
use crate::piece::Piece;

#[derive(Debug, Serialize, Deserialize)]
struct PieceRecord {
    version: String,
    #[serde(
        rename = "pieceNumber",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    piece_number: Option<u8>,
    keypairs: Vec<KeypairRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct KeypairRecord {
    ticker: String,
    #[serde(
        rename = "privateValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    private_value: Option<String>,
    #[serde(
        rename = "publicAddress",
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    public_address: Option<Option<String>>,
    #[serde(
        rename = "shareIndex",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    share_index: Option<u8>,
    #[serde(rename = "minShares", default, skip_serializing_if = "Option::is_none")]
    min_shares: Option<u8>,
    #[serde(
        rename = "encryptionScheme",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    encryption_scheme: Option<String>,
}

/// Distinguishes an absent field (`None`) from an explicit JSON `null`
/// (`Some(None)`) during deserialization
fn double_option<'de, D>(deserializer: D) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Serializes a piece to its JSON record
///
/// # Errors
/// Returns [`Error::Destroyed`] for destroyed pieces
pub fn encode(piece: &Piece) -> Result<String> {
    let keypairs = piece
        .keypairs()?
        .iter()
        .map(|kp| KeypairRecord {
            ticker: kp.currency().ticker().to_string(),
            private_value: kp.private_value().map(|v| v.to_string()),
            public_address: match kp.public_address() {
                PublicAddress::Unknown => None,
                PublicAddress::NotApplicable => Some(None),
                PublicAddress::Address(a) => Some(Some(a.clone())),
            },
            share_index: kp.share_index().map(|i| *i),
            min_shares: kp.min_shares().map(|t| *t),
            encryption_scheme: kp.encryption_scheme().map(|s| s.id().to_string()),
        })
        .collect();

    let record = PieceRecord {
        version: piece.version()?.to_string(),
        piece_number: piece.piece_number()?.map(|i| *i),
        keypairs,
    };
    serde_json::to_string_pretty(&record)
        .map_err(|e| Error::state(format!("piece serialization failed: {e}")))
}

/// Deserializes a piece from its JSON record
///
/// # Errors
/// Returns [`Error::MalformedInput`] for anything that is not a valid
/// record, including metadata fields that contradict the self-describing
/// private values they annotate
pub fn decode(input: &str, registry: &Registry) -> Result<Piece> {
    let record: PieceRecord = serde_json::from_str(input)
        .map_err(|e| Error::malformed(format!("not a structured piece record: {e}")))?;
    if record.keypairs.is_empty() {
        return Err(Error::malformed("piece record contains no keypairs"));
    }

    let mut keypairs = Vec::with_capacity(record.keypairs.len());
    for (i, kr) in record.keypairs.iter().enumerate() {
        let keypair = decode_keypair(kr, registry).map_err(|e| match e {
            // a contradicting address in an otherwise valid record is a
            // real finding, not a sign this input is some other format
            Error::AddressMismatch { ticker, .. } => Error::AddressMismatch { index: i, ticker },
            other => Error::malformed(format!("keypair {i}: {other}")),
        })?;
        keypairs.push(keypair);
    }

    let mut piece = Piece::with_version(keypairs, record.version)
        .map_err(|e| Error::malformed(format!("record is not a coherent piece: {e}")))?;
    if let Some(number) = record.piece_number {
        let number = ShareIndex::new(number)
            .map_err(|_| Error::malformed("pieceNumber outside 1..=254"))?;
        piece
            .set_piece_number(number)
            .map_err(|e| Error::malformed(format!("pieceNumber: {e}")))?;
    }
    Ok(piece)
}

fn decode_keypair(kr: &KeypairRecord, registry: &Registry) -> Result<Keypair> {
    let currency = registry.by_ticker(&kr.ticker)?;
    let public = kr.public_address.as_ref().map(|o| o.as_deref());
    let mut keypair = Keypair::from_parts(currency, kr.private_value.as_deref(), public)?;

    // declared metadata must agree with what the value itself encodes
    if let Some(declared) = kr.share_index {
        let declared = ShareIndex::new(declared)
            .map_err(|_| Error::malformed("shareIndex outside 1..=254"))?;
        match keypair.share_index() {
            Some(embedded) if embedded != declared => {
                return Err(Error::malformed(
                    "shareIndex disagrees with the encoded share",
                ));
            }
            Some(_) => {}
            None => keypair.set_share_index(declared).map_err(|_| {
                Error::malformed("shareIndex given for a keypair that is not split")
            })?,
        }
    }
    if let Some(declared) = kr.min_shares
        && keypair.min_shares().map(|t| *t) != Some(declared)
    {
        return Err(Error::malformed(
            "minShares disagrees with the encoded share",
        ));
    }
    if let Some(declared) = &kr.encryption_scheme
        && keypair.encryption_scheme().map(|s| s.id()) != Some(declared.as_str())
    {
        return Err(Error::malformed(
            "encryptionScheme disagrees with the ciphertext",
        ));
    }
    Ok(keypair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::CurrencyId;
    use crate::domain::{ShareCount, SplitConfig, Threshold};
    use crate::scheme::EncryptionScheme;

    fn registry() -> &'static Registry {
        Registry::standard()
    }

    #[test]
    fn test_round_trip_plaintext() {
        let piece = Piece::generate(&[CurrencyId::Bitcoin, CurrencyId::Bip39]).unwrap();
        let json = encode(&piece).unwrap();
        let back = decode(&json, registry()).unwrap();
        assert!(piece.equals(&back).unwrap());
    }

    #[test]
    fn test_round_trip_encrypted() {
        let mut piece = Piece::generate(&[CurrencyId::Ethereum]).unwrap();
        piece
            .encrypt("pw", &[EncryptionScheme::AesGcmScrypt], None)
            .unwrap();
        let json = encode(&piece).unwrap();
        assert!(json.contains("\"encryptionScheme\": \"aes-gcm-scrypt\""));

        let back = decode(&json, registry()).unwrap();
        assert!(piece.equals(&back).unwrap());
        assert_eq!(back.is_encrypted().unwrap(), Some(true));
    }

    #[test]
    fn test_round_trip_split() {
        let piece = Piece::generate(&[CurrencyId::Bitcoin]).unwrap();
        let config = SplitConfig::new(
            Threshold::new(2).unwrap(),
            ShareCount::new(3).unwrap(),
        )
        .unwrap();
        let shares = piece.split(config).unwrap();

        let json = encode(&shares[1]).unwrap();
        assert!(json.contains("\"pieceNumber\": 2"));
        let back = decode(&json, registry()).unwrap();
        assert!(shares[1].equals(&back).unwrap());
        assert_eq!(back.piece_number().unwrap().map(|i| *i), Some(2));
    }

    #[test]
    fn test_tri_state_public_address() {
        let mut piece = Piece::generate(&[CurrencyId::Bitcoin, CurrencyId::Bip39]).unwrap();
        piece.remove_private_values().unwrap();
        let json = encode(&piece).unwrap();

        // BTC keeps its address, BIP39 records an explicit null
        assert!(json.contains("\"publicAddress\": \"1"));
        assert!(json.contains("\"publicAddress\": null"));

        let back = decode(&json, registry()).unwrap();
        assert!(piece.equals(&back).unwrap());
    }

    #[test]
    fn test_rejects_contradicting_metadata() {
        let piece = Piece::generate(&[CurrencyId::Bitcoin]).unwrap();
        let config = SplitConfig::new(
            Threshold::new(2).unwrap(),
            ShareCount::new(3).unwrap(),
        )
        .unwrap();
        let shares = piece.split(config).unwrap();
        let json = encode(&shares[0]).unwrap();

        let lying = json.replace("\"shareIndex\": 1", "\"shareIndex\": 9");
        assert!(matches!(
            decode(&lying, registry()).unwrap_err(),
            Error::MalformedInput(_)
        ));

        let lying = json.replace("\"minShares\": 2", "\"minShares\": 3");
        assert!(matches!(
            decode(&lying, registry()).unwrap_err(),
            Error::MalformedInput(_)
        ));
    }

    #[test]
    fn test_rejects_unknown_ticker_and_garbage() {
        assert!(decode("not json at all", registry()).is_err());
        assert!(decode("{}", registry()).is_err());

        let record = r#"{"version":"1.0","keypairs":[{"ticker":"DOGE"}]}"#;
        assert!(matches!(
            decode(record, registry()).unwrap_err(),
            Error::MalformedInput(_)
        ));
    }
}
