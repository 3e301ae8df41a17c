//! Property tests for split/combine workflows

use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;

use keypiece::domain::{ShareCount, SplitConfig, Threshold};
use keypiece::{CurrencyId, Error, Keypair, Piece};

/// Wrapper generating valid (threshold, share count) pairs small enough
/// to exercise quickly
#[derive(Clone, Debug)]
struct SmallConfig {
    threshold: u8,
    share_count: u8,
}

impl Arbitrary for SmallConfig {
    fn arbitrary(g: &mut Gen) -> Self {
        let threshold = 2 + u8::arbitrary(g) % 4; // 2..=5
        let extra = u8::arbitrary(g) % 4; // 0..=3
        SmallConfig {
            threshold,
            share_count: threshold + extra,
        }
    }
}

impl SmallConfig {
    fn build(&self) -> SplitConfig {
        SplitConfig::new(
            Threshold::new(self.threshold).unwrap(),
            ShareCount::new(self.share_count).unwrap(),
        )
        .unwrap()
    }
}

/// Wrapper for a random supported currency
#[derive(Clone, Debug)]
struct AnyCurrency(CurrencyId);

impl Arbitrary for AnyCurrency {
    fn arbitrary(g: &mut Gen) -> Self {
        let all = [
            CurrencyId::Bitcoin,
            CurrencyId::BitcoinCash,
            CurrencyId::Ethereum,
            CurrencyId::Monero,
            CurrencyId::Bip39,
        ];
        AnyCurrency(*g.choose(&all).unwrap_or(&CurrencyId::Bitcoin))
    }
}

/// Any subset of exactly `threshold` shares recovers the original keypair
#[quickcheck]
fn prop_threshold_subset_recovers(currency: AnyCurrency, config: SmallConfig, seed: u64) -> bool {
    let keypair = Keypair::generate(currency.0).unwrap();
    let original = keypair.private_value().unwrap();
    let shares = keypair.split(config.build()).unwrap();

    // rotate through a pseudo-random contiguous window of the shares
    let take = usize::from(config.threshold);
    let offset = (seed as usize) % shares.len();
    let selected: Vec<&Keypair> = shares
        .iter()
        .cycle()
        .skip(offset)
        .take(take)
        .collect();

    let recovered = Keypair::combine(&selected).unwrap();
    *recovered.private_value().unwrap() == *original
}

/// Fewer than `threshold` shares always fails with the exact deficit
#[quickcheck]
fn prop_below_threshold_reports_deficit(config: SmallConfig, kept: u8) -> bool {
    let keypair = Keypair::generate(CurrencyId::Bitcoin).unwrap();
    let shares = keypair.split(config.build()).unwrap();

    let kept = 1 + usize::from(kept) % usize::from(config.threshold - 1);
    let selected: Vec<&Keypair> = shares.iter().take(kept).collect();

    match Keypair::combine(&selected) {
        Err(Error::InsufficientShares { missing }) => {
            missing == usize::from(config.threshold) - kept
        }
        _ => false,
    }
}

/// Piece-level splits keep every keypair recoverable together
#[quickcheck]
fn prop_piece_split_round_trip(config: SmallConfig) -> bool {
    let piece = Piece::generate(&[CurrencyId::Ethereum, CurrencyId::Bip39]).unwrap();
    let shares = piece.split(config.build()).unwrap();

    let take = usize::from(config.threshold);
    let recovered = Piece::combine(&shares[..take]).unwrap();
    recovered.equals(&piece).unwrap()
}

/// Shares of independently split secrets never silently combine
#[quickcheck]
fn prop_foreign_shares_never_combine(config: SmallConfig) -> bool {
    let a = Keypair::generate(CurrencyId::Bitcoin).unwrap();
    let b = Keypair::generate(CurrencyId::Bitcoin).unwrap();
    let shares_a = a.split(config.build()).unwrap();
    let shares_b = b.split(config.build()).unwrap();

    let take = usize::from(config.threshold);
    let mut selected: Vec<&Keypair> = shares_a.iter().take(take - 1).collect();
    selected.push(&shares_b[take - 1]);

    match Keypair::combine(&selected) {
        // mixed shares must be rejected...
        Err(Error::IncompatibleParts(_)) => true,
        Err(_) => false,
        // ...and can never quietly reproduce either original
        Ok(combined) => {
            let value = combined.private_value().unwrap();
            *value != *a.private_value().unwrap() && *value != *b.private_value().unwrap()
        }
    }
}
