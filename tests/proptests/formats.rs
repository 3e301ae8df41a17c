//! Property tests for the serialization formats

use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;

use keypiece::{CurrencyId, EncryptionScheme, Piece, Registry, format};

/// A random piece in a random lifecycle state
#[derive(Clone, Debug)]
struct AnyPiece {
    currencies: Vec<CurrencyId>,
    state: PieceState,
}

#[derive(Clone, Copy, Debug)]
enum PieceState {
    Plaintext,
    Encrypted,
    PublicOnly,
    Split,
}

impl Arbitrary for AnyPiece {
    fn arbitrary(g: &mut Gen) -> Self {
        let all = [
            CurrencyId::Bitcoin,
            CurrencyId::BitcoinCash,
            CurrencyId::Ethereum,
            CurrencyId::Monero,
            CurrencyId::Bip39,
        ];
        let count = 1 + usize::arbitrary(g) % 4;
        let currencies = (0..count)
            .map(|_| *g.choose(&all).unwrap_or(&CurrencyId::Bitcoin))
            .collect();
        let state = *g
            .choose(&[
                PieceState::Plaintext,
                PieceState::Encrypted,
                PieceState::PublicOnly,
                PieceState::Split,
            ])
            .unwrap_or(&PieceState::Plaintext);
        AnyPiece { currencies, state }
    }
}

impl AnyPiece {
    fn build(&self) -> Piece {
        let mut piece = Piece::generate(&self.currencies).unwrap();
        match self.state {
            PieceState::Plaintext => piece,
            PieceState::Encrypted => {
                let schemes = vec![EncryptionScheme::AesGcmPbkdf2; self.currencies.len()];
                piece.encrypt("pw", &schemes, None).unwrap();
                piece
            }
            PieceState::PublicOnly => {
                piece.remove_private_values().unwrap();
                piece
            }
            PieceState::Split => {
                use keypiece::domain::{ShareCount, SplitConfig, Threshold};
                let config = SplitConfig::new(
                    Threshold::new(2).unwrap(),
                    ShareCount::new(3).unwrap(),
                )
                .unwrap();
                piece.split(config).unwrap().remove(0)
            }
        }
    }
}

/// Every piece state survives every format, and the universal cascade
/// lands on the same piece as the dedicated reader
#[quickcheck]
fn prop_formats_are_lossless(any: AnyPiece) -> bool {
    let registry = Registry::standard();
    let piece = any.build();

    for encoded in [
        format::json::encode(&piece).unwrap(),
        format::table::encode(&piece).unwrap(),
        format::text::encode(&piece).unwrap(),
    ] {
        let Ok(reparsed) = format::parse(&encoded, registry) else {
            return false;
        };
        if !piece.equals(&reparsed).unwrap() {
            return false;
        }
    }
    true
}

/// The cascade classifies its own formats unambiguously: a table export
/// never parses as text with different content, and vice versa
#[quickcheck]
fn prop_cascade_is_deterministic(any: AnyPiece) -> bool {
    let registry = Registry::standard();
    let piece = any.build();

    let json = format::json::encode(&piece).unwrap();
    let direct = format::json::decode(&json, registry).unwrap();
    let cascaded = format::parse(&json, registry).unwrap();
    direct.equals(&cascaded).unwrap()
}
