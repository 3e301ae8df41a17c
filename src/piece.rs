//! Pieces: homogeneous bundles of keypairs with batch operations
//!
//! A [`Piece`] is what actually gets printed, encrypted, split, and
//! recovered. All keypairs in a piece agree on their lifecycle state, so
//! piece-level operations are total: encrypting a piece encrypts every
//! keypair or fails as a unit.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
#[cfg(not(target_arch = "wasm32"))]
use std::thread;

use crate::currency::CurrencyId;
use crate::domain::{ShareIndex, SplitConfig};
use crate::error::{Error, Result};
use crate::keypair::Keypair;
use crate::scheme::EncryptionScheme;
use crate::task::{CancelHandle, ProgressFn, ProgressMeter};

/// Format version stamped into structured piece records
pub const PIECE_VERSION: &str = "1.0";

/// Upper bound on threads used for batch encryption and decryption
pub const ENCRYPTION_WORKERS: usize = 4;

/// A bundle of keypairs in a uniform lifecycle state
#[derive(Debug)]
pub struct Piece {
    keypairs: Vec<Keypair>,
    version: String,
    destroyed: bool,
    cancel: CancelHandle,
}

fn lock<'a, T>(mutex: &'a Mutex<T>) -> std::sync::MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Rewrites a keypair-level error with its position in the batch
fn at_keypair(index: usize, ticker: &'static str, err: Error) -> Error {
    match err {
        Error::AddressMismatch { .. } => Error::AddressMismatch { index, ticker },
        Error::InvalidState(msg) => {
            Error::InvalidState(format!("keypair {index} ({ticker}): {msg}"))
        }
        Error::MalformedInput(msg) => {
            Error::MalformedInput(format!("keypair {index} ({ticker}): {msg}"))
        }
        Error::IncompatibleParts(msg) => {
            Error::IncompatibleParts(format!("keypair {index} ({ticker}): {msg}"))
        }
        other => other,
    }
}

impl Piece {
    /// Builds a piece from keypairs, validating their homogeneity
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] if the keypairs disagree on
    /// encryption, split state, threshold, or share index
    pub fn new(keypairs: Vec<Keypair>) -> Result<Self> {
        Self::with_version(keypairs, PIECE_VERSION.to_string())
    }

    pub(crate) fn with_version(keypairs: Vec<Keypair>, version: String) -> Result<Self> {
        let first = keypairs
            .first()
            .ok_or_else(|| Error::state("a piece needs at least one keypair"))?;

        let encrypted = first.is_encrypted();
        let split = first.is_split();
        let min_shares = first.min_shares();
        let share_index = first.share_index();
        for (i, kp) in keypairs.iter().enumerate().skip(1) {
            if kp.is_encrypted() != encrypted {
                return Err(Error::state(format!(
                    "keypair {i} breaks the piece's uniform encryption state"
                )));
            }
            if kp.is_split() != split {
                return Err(Error::state(format!(
                    "keypair {i} breaks the piece's uniform split state"
                )));
            }
            if kp.min_shares() != min_shares {
                return Err(Error::state(format!(
                    "keypair {i} disagrees on the minimum share count"
                )));
            }
            if kp.share_index() != share_index {
                return Err(Error::state(format!(
                    "keypair {i} disagrees on the piece's share index"
                )));
            }
        }

        Ok(Self {
            keypairs,
            version,
            destroyed: false,
            cancel: CancelHandle::new(),
        })
    }

    /// Generates a piece with one fresh keypair per requested currency
    ///
    /// # Errors
    /// Returns an error if no currencies are given or generation fails
    pub fn generate(currencies: &[CurrencyId]) -> Result<Self> {
        if currencies.is_empty() {
            return Err(Error::state("at least one currency is required"));
        }
        let keypairs = currencies
            .iter()
            .map(|&currency| Keypair::generate(currency))
            .collect::<Result<Vec<_>>>()?;
        Self::new(keypairs)
    }

    fn guard(&self) -> Result<()> {
        if self.destroyed {
            Err(Error::Destroyed)
        } else {
            Ok(())
        }
    }

    /// The keypairs in this piece
    ///
    /// # Errors
    /// Returns [`Error::Destroyed`] after [`Piece::destroy`]
    pub fn keypairs(&self) -> Result<&[Keypair]> {
        self.guard()?;
        Ok(&self.keypairs)
    }

    /// Format version of the piece
    ///
    /// # Errors
    /// Returns [`Error::Destroyed`] after [`Piece::destroy`]
    pub fn version(&self) -> Result<&str> {
        self.guard()?;
        Ok(&self.version)
    }

    /// Whether the piece's private values are encrypted; `None` when the
    /// piece carries no private values
    ///
    /// # Errors
    /// Returns [`Error::Destroyed`] after [`Piece::destroy`]
    pub fn is_encrypted(&self) -> Result<Option<bool>> {
        self.guard()?;
        Ok(self.keypairs.first().and_then(Keypair::is_encrypted))
    }

    /// Whether the piece holds secret shares rather than whole values
    ///
    /// # Errors
    /// Returns [`Error::Destroyed`] after [`Piece::destroy`]
    pub fn is_split(&self) -> Result<bool> {
        self.guard()?;
        Ok(self.keypairs.first().is_some_and(Keypair::is_split))
    }

    /// Reconstruction threshold when split
    ///
    /// # Errors
    /// Returns [`Error::Destroyed`] after [`Piece::destroy`]
    pub fn min_shares(&self) -> Result<Option<crate::domain::Threshold>> {
        self.guard()?;
        Ok(self.keypairs.first().and_then(Keypair::min_shares))
    }

    /// The piece's 1-based number among its sibling shares
    ///
    /// # Errors
    /// Returns [`Error::Destroyed`] after [`Piece::destroy`]
    pub fn piece_number(&self) -> Result<Option<ShareIndex>> {
        self.guard()?;
        Ok(self.keypairs.first().and_then(Keypair::share_index))
    }

    /// Numbers every share in the piece
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] if the piece is not split or already
    /// numbered differently
    pub fn set_piece_number(&mut self, number: ShareIndex) -> Result<()> {
        self.guard()?;
        for (i, kp) in self.keypairs.iter_mut().enumerate() {
            kp.set_share_index(number)
                .map_err(|e| at_keypair(i, kp.currency().ticker(), e))?;
        }
        Ok(())
    }

    /// Deep copy with a fresh cancellation handle
    ///
    /// # Errors
    /// Returns [`Error::Destroyed`] after [`Piece::destroy`]
    pub fn copy(&self) -> Result<Self> {
        self.guard()?;
        Ok(Self {
            keypairs: self.keypairs.clone(),
            version: self.version.clone(),
            destroyed: false,
            cancel: CancelHandle::new(),
        })
    }

    /// Structural equality of two live pieces
    ///
    /// # Errors
    /// Returns [`Error::Destroyed`] if either piece was destroyed
    pub fn equals(&self, other: &Piece) -> Result<bool> {
        self.guard()?;
        other.guard()?;
        Ok(self.version == other.version && self.keypairs == other.keypairs)
    }

    /// A handle that cancels this piece's in-flight batch operations
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Irreversibly wipes all key material and poisons the piece
    ///
    /// Any in-flight batch operation observes the cancellation flag and
    /// stops at its next keypair boundary. Every subsequent accessor
    /// returns [`Error::Destroyed`].
    ///
    /// # Errors
    /// Returns [`Error::Destroyed`] if already destroyed
    pub fn destroy(&mut self) -> Result<()> {
        self.guard()?;
        self.cancel.cancel();
        for kp in &mut self.keypairs {
            kp.wipe();
        }
        self.keypairs.clear();
        self.destroyed = true;
        Ok(())
    }

    /// Strips the private values, keeping a public-addresses-only piece
    ///
    /// # Errors
    /// Returns [`Error::Destroyed`] after [`Piece::destroy`], or
    /// [`Error::InvalidState`] if a keypair would be left empty
    pub fn remove_private_values(&mut self) -> Result<()> {
        self.guard()?;
        for (i, kp) in self.keypairs.iter_mut().enumerate() {
            kp.remove_private_value()
                .map_err(|e| at_keypair(i, kp.currency().ticker(), e))?;
        }
        Ok(())
    }

    /// Strips the public addresses, keeping the private values
    ///
    /// # Errors
    /// Returns [`Error::Destroyed`] after [`Piece::destroy`], or
    /// [`Error::InvalidState`] if a keypair would be left empty
    pub fn remove_public_addresses(&mut self) -> Result<()> {
        self.guard()?;
        for (i, kp) in self.keypairs.iter_mut().enumerate() {
            kp.remove_public_address()
                .map_err(|e| at_keypair(i, kp.currency().ticker(), e))?;
        }
        Ok(())
    }

    /// Encrypts every keypair's private value, one scheme per keypair
    ///
    /// Work is spread over at most [`ENCRYPTION_WORKERS`] threads. Progress
    /// is aggregated by scheme cost weight and reported monotonically, with
    /// 0.0 first and 1.0 only after the whole batch committed. A keypair is
    /// the unit of cancellation: destroying the piece concurrently stops the
    /// batch at the next boundary with [`Error::Destroyed`].
    ///
    /// # Errors
    /// Returns [`Error::NoPrivateKey`] for a piece without private values,
    /// [`Error::InvalidState`] when already encrypted or split, and the
    /// first keypair-level failure otherwise
    pub fn encrypt(
        &mut self,
        passphrase: &str,
        schemes: &[EncryptionScheme],
        progress: Option<&ProgressFn<'_>>,
    ) -> Result<()> {
        self.guard()?;
        if passphrase.is_empty() {
            return Err(Error::state("passphrase must not be empty"));
        }
        if schemes.len() != self.keypairs.len() {
            return Err(Error::state(format!(
                "expected {} schemes, one per keypair, got {}",
                self.keypairs.len(),
                schemes.len()
            )));
        }
        match self.is_encrypted()? {
            Some(false) => {}
            Some(true) => return Err(Error::state("piece is already encrypted")),
            None => return Err(Error::NoPrivateKey),
        }
        if self.is_split()? {
            return Err(Error::state("cannot encrypt a split piece"));
        }

        let jobs: Vec<BatchJob<'_, EncryptionScheme>> = self
            .keypairs
            .iter_mut()
            .enumerate()
            .zip(schemes.iter())
            .map(|((index, keypair), &scheme)| BatchJob {
                index,
                keypair,
                weight: scheme.encrypt_weight(),
                payload: scheme,
            })
            .collect();

        run_batch(&self.cancel, progress, jobs, |kp, scheme, on_step| {
            kp.encrypt(scheme, passphrase, on_step)
        })?;

        // every keypair moved, the piece must be uniform again
        match self.is_encrypted()? {
            Some(true) => Ok(()),
            _ => Err(Error::state("piece did not encrypt uniformly")),
        }
    }

    /// Decrypts every keypair's private value with one passphrase
    ///
    /// The mirror of [`Piece::encrypt`]: weighted aggregated progress over a
    /// bounded worker pool, keypair-boundary cancellation, and an all-or-
    /// first-error result.
    ///
    /// # Errors
    /// Returns [`Error::IncorrectPassphrase`] on authentication failure,
    /// [`Error::AddressMismatch`] naming the offending keypair when a
    /// recovered key contradicts its recorded address, and
    /// [`Error::InvalidState`] when the piece is not encrypted
    pub fn decrypt(&mut self, passphrase: &str, progress: Option<&ProgressFn<'_>>) -> Result<()> {
        self.guard()?;
        match self.is_encrypted()? {
            Some(true) => {}
            Some(false) => return Err(Error::state("piece is not encrypted")),
            None => return Err(Error::NoPrivateKey),
        }

        let jobs: Vec<BatchJob<'_, ()>> = self
            .keypairs
            .iter_mut()
            .enumerate()
            .map(|(index, keypair)| {
                let weight = keypair
                    .encryption_scheme()
                    .map_or(1, |scheme| scheme.decrypt_weight());
                BatchJob {
                    index,
                    keypair,
                    weight,
                    payload: (),
                }
            })
            .collect();

        run_batch(&self.cancel, progress, jobs, |kp, (), on_step| {
            kp.decrypt(passphrase, on_step)
        })?;

        match self.is_encrypted()? {
            Some(false) => Ok(()),
            _ => Err(Error::state("piece did not decrypt uniformly")),
        }
    }

    /// Splits the piece into `share_count` sibling pieces of which any
    /// `threshold` recombine into the original
    ///
    /// The resulting pieces are numbered 1..=count and every keypair's
    /// share carries the threshold in its encoding.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] for encrypted or already-split
    /// pieces and [`Error::NoPrivateKey`] for public-only pieces
    pub fn split(&self, config: SplitConfig) -> Result<Vec<Piece>> {
        self.guard()?;
        if self.is_split()? {
            return Err(Error::state("piece is already split"));
        }
        match self.is_encrypted()? {
            Some(false) => {}
            Some(true) => return Err(Error::state("decrypt the piece before splitting")),
            None => return Err(Error::NoPrivateKey),
        }

        let count = usize::from(*config.share_count());
        let mut buckets: Vec<Vec<Keypair>> = vec![Vec::with_capacity(self.keypairs.len()); count];
        for (i, kp) in self.keypairs.iter().enumerate() {
            let shares = kp
                .split(config)
                .map_err(|e| at_keypair(i, kp.currency().ticker(), e))?;
            for (bucket, share) in buckets.iter_mut().zip(shares) {
                bucket.push(share);
            }
        }
        buckets.into_iter().map(Piece::new).collect()
    }

    /// Reconstructs the original piece from enough sibling share pieces
    ///
    /// # Errors
    /// Returns [`Error::InsufficientShares`] naming the exact deficit,
    /// [`Error::IncompatibleParts`] when the pieces disagree on threshold,
    /// shape, or carry duplicate piece numbers, and [`Error::InvalidState`]
    /// when a given piece is not split
    pub fn combine(pieces: &[Piece]) -> Result<Piece> {
        let first = pieces
            .first()
            .ok_or_else(|| Error::state("no pieces provided"))?;
        first.guard()?;
        let min_shares = first
            .min_shares()?
            .ok_or_else(|| Error::state("pieces are not split"))?;
        let keypair_count = first.keypairs.len();

        let mut seen_numbers = Vec::new();
        for piece in pieces {
            piece.guard()?;
            if !piece.is_split()? {
                return Err(Error::state("pieces are not split"));
            }
            if piece.min_shares()? != Some(min_shares) {
                return Err(Error::IncompatibleParts(
                    "pieces disagree on the minimum share count".to_string(),
                ));
            }
            if piece.keypairs.len() != keypair_count {
                return Err(Error::IncompatibleParts(
                    "pieces contain different numbers of keypairs".to_string(),
                ));
            }
            if let Some(number) = piece.piece_number()? {
                if seen_numbers.contains(&number) {
                    return Err(Error::IncompatibleParts(format!(
                        "piece number {number} appears more than once"
                    )));
                }
                seen_numbers.push(number);
            }
        }

        if pieces.len() < usize::from(*min_shares) {
            return Err(Error::InsufficientShares {
                missing: usize::from(*min_shares) - pieces.len(),
            });
        }

        let keypairs = (0..keypair_count)
            .map(|i| {
                let parts: Vec<&Keypair> = pieces.iter().map(|p| &p.keypairs[i]).collect();
                Keypair::combine(&parts)
                    .map_err(|e| at_keypair(i, parts[0].currency().ticker(), e))
            })
            .collect::<Result<Vec<_>>>()?;
        Piece::new(keypairs)
    }
}

/// One unit of batch work: a keypair, its cost weight, and a payload the
/// work closure consumes
struct BatchJob<'a, P> {
    index: usize,
    keypair: &'a mut Keypair,
    weight: u64,
    payload: P,
}

/// Runs per-keypair jobs over a bounded worker pool with weighted progress
///
/// Jobs are drained from a shared queue; the first failure wins and later
/// jobs are skipped. The keypair is the unit of cancellation: the flag is
/// observed between jobs, and a set flag silences further emissions.
/// Aggregated completed weight must equal the batch total on success.
fn run_batch<P, F>(
    cancel: &CancelHandle,
    progress: Option<&ProgressFn<'_>>,
    jobs: Vec<BatchJob<'_, P>>,
    work: F,
) -> Result<()>
where
    P: Send,
    F: Fn(&mut Keypair, P, &mut dyn FnMut(f64)) -> Result<()> + Send + Sync,
{
    let meter = ProgressMeter::new(progress);
    meter.emit(0.0);

    let total_weight: u64 = jobs.iter().map(|job| job.weight).sum();
    let total = total_weight.max(1) as f64;
    #[cfg(not(target_arch = "wasm32"))]
    let worker_count = ENCRYPTION_WORKERS.min(jobs.len()).max(1);
    let queue: Mutex<VecDeque<BatchJob<'_, P>>> = Mutex::new(jobs.into());
    let done_weight = AtomicU64::new(0);
    let failure: Mutex<Option<(usize, &'static str, Error)>> = Mutex::new(None);

    let run_worker = || {
        loop {
            if cancel.is_cancelled() || lock(&failure).is_some() {
                break;
            }
            let Some(job) = lock(&queue).pop_front() else {
                break;
            };
            let ticker = job.keypair.currency().ticker();
            let weight = job.weight as f64;
            let mut on_step = |fraction: f64| {
                if !cancel.is_cancelled() {
                    let base = done_weight.load(Ordering::SeqCst) as f64;
                    meter.emit((base + weight * fraction.clamp(0.0, 1.0)) / total);
                }
            };
            match work(job.keypair, job.payload, &mut on_step) {
                Ok(()) => {
                    let base = done_weight.fetch_add(job.weight, Ordering::SeqCst);
                    if !cancel.is_cancelled() {
                        meter.emit((base + job.weight) as f64 / total);
                    }
                }
                Err(e) => {
                    let mut slot = lock(&failure);
                    if slot.is_none() {
                        *slot = Some((job.index, ticker, e));
                    }
                }
            }
        }
    };

    // no threads on wasm, drain the queue inline there
    #[cfg(target_arch = "wasm32")]
    run_worker();
    #[cfg(not(target_arch = "wasm32"))]
    thread::scope(|scope| {
        for _ in 0..worker_count {
            scope.spawn(&run_worker);
        }
    });

    if cancel.is_cancelled() {
        return Err(Error::Destroyed);
    }
    if let Some((index, ticker, err)) = lock(&failure).take() {
        return Err(at_keypair(index, ticker, err));
    }
    if done_weight.load(Ordering::SeqCst) != total_weight {
        return Err(Error::state("batch weight accounting mismatch"));
    }
    meter.emit(1.0);
    Ok(())
}
