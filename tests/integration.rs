//! End-to-end lifecycle tests
//!
//! Each test walks a complete user story: generate keypairs, protect them
//! with a passphrase or by splitting, export for printing, and recover the
//! keys later from whatever survived.

use std::sync::Mutex;

use keypiece::domain::{ShareCount, SplitConfig, Threshold};
use keypiece::{CurrencyId, EncryptionScheme, Error, Piece, Registry, format};

fn registry() -> &'static Registry {
    Registry::standard()
}

fn split_config(threshold: u8, count: u8) -> SplitConfig {
    SplitConfig::new(
        Threshold::new(threshold).unwrap(),
        ShareCount::new(count).unwrap(),
    )
    .unwrap()
}

const ALL_CURRENCIES: [CurrencyId; 5] = [
    CurrencyId::Bitcoin,
    CurrencyId::BitcoinCash,
    CurrencyId::Ethereum,
    CurrencyId::Monero,
    CurrencyId::Bip39,
];

#[test]
fn test_passphrase_lifecycle_through_print_and_back() {
    // generate, encrypt, export to every format, reimport, decrypt
    let mut piece = Piece::generate(&ALL_CURRENCIES).unwrap();
    let original = piece.copy().unwrap();

    let schemes = vec![EncryptionScheme::AesGcmPbkdf2; ALL_CURRENCIES.len()];
    piece.encrypt("correct horse", &schemes, None).unwrap();

    for exported in [
        format::json::encode(&piece).unwrap(),
        format::table::encode(&piece).unwrap(),
        format::text::encode(&piece).unwrap(),
    ] {
        let mut reimported = format::parse(&exported, registry()).unwrap();
        assert_eq!(reimported.is_encrypted().unwrap(), Some(true));

        reimported.decrypt("correct horse", None).unwrap();
        assert!(reimported.equals(&original).unwrap());
    }
}

#[test]
fn test_split_lifecycle_any_threshold_subset_recovers() {
    let piece = Piece::generate(&[CurrencyId::Bitcoin, CurrencyId::Bip39]).unwrap();
    let shares = piece.split(split_config(3, 5)).unwrap();
    assert_eq!(shares.len(), 5);

    // print two of the five as text, keep one as a table, lose the rest
    let survivors = [
        format::text::encode(&shares[0]).unwrap(),
        format::table::encode(&shares[2]).unwrap(),
        format::text::encode(&shares[4]).unwrap(),
    ];
    let reparsed: Vec<Piece> = survivors
        .iter()
        .map(|s| format::parse(s, registry()).unwrap())
        .collect();

    let recovered = Piece::combine(&reparsed).unwrap();
    assert!(recovered.equals(&piece).unwrap());
}

#[test]
fn test_free_text_recovery_of_printed_piece_with_prose_around_it() {
    let piece = Piece::generate(&[CurrencyId::BitcoinCash, CurrencyId::Bip39]).unwrap();
    let printed = format::text::encode(&piece).unwrap();
    let with_prose = format!(
        "Dear executor,\n\nthe keys below were printed in 2024, treat them carefully.\n\n\
         {printed}\n\nstored in the safe deposit box\n"
    );

    let recovered = format::parse(&with_prose, registry()).unwrap();
    assert!(recovered.equals(&piece).unwrap());
}

#[test]
fn test_wrong_passphrase_never_partially_decrypts() {
    let mut piece = Piece::generate(&ALL_CURRENCIES).unwrap();
    let schemes = vec![EncryptionScheme::AesGcmPbkdf2; ALL_CURRENCIES.len()];
    piece.encrypt("right", &schemes, None).unwrap();
    let encrypted_snapshot = piece.copy().unwrap();

    let err = piece.decrypt("wrong", None).unwrap_err();
    assert!(matches!(err, Error::IncorrectPassphrase));
    // nothing was mutated, retry succeeds
    assert!(piece.equals(&encrypted_snapshot).unwrap());
    piece.decrypt("right", None).unwrap();
}

#[test]
fn test_combining_shares_of_different_splits_fails() {
    let a = Piece::generate(&[CurrencyId::Bitcoin]).unwrap();
    let b = Piece::generate(&[CurrencyId::Bitcoin]).unwrap();
    let mut shares_a = a.split(split_config(2, 3)).unwrap();
    let shares_b = b.split(split_config(2, 3)).unwrap();

    // same threshold, same shape, but unrelated secrets: piece numbers
    // collide or the reconstruction produces garbage
    let mixed = vec![
        shares_a.remove(0),
        shares_b.into_iter().nth(1).unwrap(),
    ];
    let err = Piece::combine(&mixed).unwrap_err();
    assert!(matches!(err, Error::IncompatibleParts(_)));
}

#[test]
fn test_insufficient_shares_reports_exact_deficit_at_piece_level() {
    let piece = Piece::generate(&[CurrencyId::Ethereum]).unwrap();
    let shares = piece.split(split_config(4, 6)).unwrap();

    for kept in 1..4 {
        let err = Piece::combine(&shares[..kept]).unwrap_err();
        match err {
            Error::InsufficientShares { missing } => assert_eq!(missing, 4 - kept),
            other => panic!("expected InsufficientShares, got {other:?}"),
        }
    }
}

#[test]
fn test_progress_spans_zero_to_one_across_mixed_schemes() {
    let mut piece = Piece::generate(&ALL_CURRENCIES).unwrap();
    let original = piece.copy().unwrap();
    let schemes = vec![
        EncryptionScheme::AesGcmScrypt,
        EncryptionScheme::AesGcmPbkdf2,
        EncryptionScheme::AesGcmScrypt,
        EncryptionScheme::AesGcmPbkdf2,
        EncryptionScheme::AesGcmPbkdf2,
    ];

    let seen: Mutex<Vec<f64>> = Mutex::new(Vec::new());
    let sink = |f: f64| seen.lock().unwrap().push(f);
    piece.encrypt("pw", &schemes, Some(&sink)).unwrap();

    let encrypt_seen = std::mem::take(&mut *seen.lock().unwrap());
    assert_eq!(encrypt_seen.first().copied(), Some(0.0));
    assert_eq!(encrypt_seen.last().copied(), Some(1.0));
    for pair in encrypt_seen.windows(2) {
        assert!(pair[1] >= pair[0], "progress regressed: {pair:?}");
    }

    piece.decrypt("pw", Some(&sink)).unwrap();
    assert!(piece.equals(&original).unwrap());
    let decrypt_seen = seen.into_inner().unwrap();
    assert_eq!(decrypt_seen.first().copied(), Some(0.0));
    assert_eq!(decrypt_seen.last().copied(), Some(1.0));
    for pair in decrypt_seen.windows(2) {
        assert!(pair[1] >= pair[0], "progress regressed: {pair:?}");
    }
}

#[test]
fn test_destroyed_piece_is_unusable_and_destroy_cancels() {
    let mut piece = Piece::generate(&[CurrencyId::Bitcoin]).unwrap();
    let handle = piece.cancel_handle();
    piece.destroy().unwrap();

    assert!(piece.is_destroyed());
    assert!(handle.is_cancelled());
    assert!(matches!(piece.keypairs().unwrap_err(), Error::Destroyed));
    assert!(matches!(
        piece.split(split_config(2, 3)).unwrap_err(),
        Error::Destroyed
    ));
    assert!(matches!(
        format::json::encode(&piece).unwrap_err(),
        Error::Destroyed
    ));
}

#[test]
fn test_public_only_piece_round_trips_but_cannot_encrypt_or_split() {
    let mut piece = Piece::generate(&ALL_CURRENCIES).unwrap();
    piece.remove_private_values().unwrap();
    assert_eq!(piece.is_encrypted().unwrap(), None);

    let json = format::json::encode(&piece).unwrap();
    let back = format::parse(&json, registry()).unwrap();
    assert!(piece.equals(&back).unwrap());

    let schemes = vec![EncryptionScheme::AesGcmPbkdf2; ALL_CURRENCIES.len()];
    assert!(matches!(
        piece.encrypt("pw", &schemes, None).unwrap_err(),
        Error::NoPrivateKey
    ));
    assert!(matches!(
        piece.split(split_config(2, 3)).unwrap_err(),
        Error::NoPrivateKey
    ));
}

#[test]
fn test_parse_keys_then_full_lifecycle() {
    // keys pasted one per line, no structure at all
    let a = Piece::generate(&[CurrencyId::Ethereum]).unwrap();
    let b = Piece::generate(&[CurrencyId::Ethereum]).unwrap();
    let input = format!(
        "{}\n{}\n",
        &*a.keypairs().unwrap()[0].private_value().unwrap(),
        &*b.keypairs().unwrap()[0].private_value().unwrap(),
    );

    let mut piece = format::parse_keys(&input, CurrencyId::Ethereum).unwrap();
    assert_eq!(piece.keypairs().unwrap().len(), 2);
    // addresses were derived during import
    for kp in piece.keypairs().unwrap() {
        assert!(kp.public_address().address().is_some());
    }

    let schemes = vec![EncryptionScheme::AesGcmScrypt; 2];
    piece.encrypt("pw", &schemes, None).unwrap();
    piece.decrypt("pw", None).unwrap();
    assert_eq!(piece.is_encrypted().unwrap(), Some(false));
}

#[test]
fn test_share_pieces_can_be_renumbered_only_when_unnumbered() {
    let piece = Piece::generate(&[CurrencyId::Bitcoin]).unwrap();
    let mut shares = piece.split(split_config(2, 3)).unwrap();

    // split assigns numbers, re-assigning the same number is a no-op
    let one = shares[0].piece_number().unwrap().unwrap();
    shares[0].set_piece_number(one).unwrap();
    // a different number is rejected
    let nine = keypiece::domain::ShareIndex::new(9).unwrap();
    let err = shares[0].set_piece_number(nine).unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));
}

#[test]
fn test_encrypted_piece_cannot_be_split_and_split_cannot_be_encrypted() {
    let mut piece = Piece::generate(&[CurrencyId::Bitcoin]).unwrap();
    let shares = piece.split(split_config(2, 3)).unwrap();
    let mut share = shares.into_iter().next().unwrap();
    assert!(matches!(
        share
            .encrypt("pw", &[EncryptionScheme::AesGcmPbkdf2], None)
            .unwrap_err(),
        Error::InvalidState(_)
    ));

    piece
        .encrypt("pw", &[EncryptionScheme::AesGcmPbkdf2], None)
        .unwrap();
    assert!(matches!(
        piece.split(split_config(2, 3)).unwrap_err(),
        Error::InvalidState(_)
    ));
}
