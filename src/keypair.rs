//! The keypair state machine
//!
//! A [`Keypair`] holds one currency's public address alongside its private
//! value, which is always in exactly one of four states: absent, plaintext,
//! encrypted, or a secret share. Every transition validates the source state
//! first, so a caller can never double-encrypt, split ciphertext, or decrypt
//! something that was never encrypted.

use blahaj::{Share, Sharks};
use zeroize::Zeroizing;

use crate::currency::CurrencyId;
use crate::domain::{ShareIndex, SplitConfig, Threshold};
use crate::error::{Error, Result};
use crate::scheme::{self, EncryptionScheme};
use crate::share_codec;

/// Tri-state public address
///
/// `Unknown` (the address exists but is not recorded here) is distinct from
/// `NotApplicable` (the currency has no address concept at all); collapsing
/// the two would make public-only exports ambiguous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicAddress {
    Unknown,
    NotApplicable,
    Address(String),
}

impl PublicAddress {
    /// The address string, when one is recorded
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        match self {
            PublicAddress::Address(a) => Some(a),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
enum PrivateState {
    Absent,
    Plaintext(Zeroizing<String>),
    Encrypted {
        ciphertext: String,
        scheme: EncryptionScheme,
    },
    Share {
        data: Zeroizing<Vec<u8>>,
        index: Option<ShareIndex>,
        min_shares: Threshold,
    },
}

impl PartialEq for PrivateState {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PrivateState::Absent, PrivateState::Absent) => true,
            (PrivateState::Plaintext(a), PrivateState::Plaintext(b)) => a.as_str() == b.as_str(),
            (
                PrivateState::Encrypted {
                    ciphertext: a,
                    scheme: sa,
                },
                PrivateState::Encrypted {
                    ciphertext: b,
                    scheme: sb,
                },
            ) => a == b && sa == sb,
            (
                PrivateState::Share {
                    data: a,
                    index: ia,
                    min_shares: ma,
                },
                PrivateState::Share {
                    data: b,
                    index: ib,
                    min_shares: mb,
                },
            ) => a.as_slice() == b.as_slice() && ia == ib && ma == mb,
            _ => false,
        }
    }
}

/// One currency's keypair within a piece
#[derive(Debug, Clone, PartialEq)]
pub struct Keypair {
    currency: CurrencyId,
    public: PublicAddress,
    private: PrivateState,
}

impl Keypair {
    /// Generates a fresh keypair with a random plaintext private value and
    /// its derived public address
    ///
    /// # Errors
    /// Returns an error if the system entropy source fails
    pub fn generate(currency: CurrencyId) -> Result<Self> {
        let private = currency.generate()?;
        let public = match currency.derive_address(&private)? {
            Some(address) => PublicAddress::Address(address),
            None => PublicAddress::NotApplicable,
        };
        Ok(Self {
            currency,
            public,
            private: PrivateState::Plaintext(private),
        })
    }

    /// Builds a keypair from imported parts
    ///
    /// The private value string is classified by inspection: a scheme-tagged
    /// ciphertext, an encoded share, or a plaintext value validated by the
    /// currency. For the public address, `None` means "not recorded",
    /// `Some(None)` means the explicit no-address marker, and `Some(Some(_))`
    /// is a concrete address.
    ///
    /// # Errors
    /// Returns [`Error::MalformedInput`] for values that fit no state,
    /// and [`Error::AddressMismatch`] when a supplied address contradicts
    /// the one derived from a plaintext private value
    pub fn from_parts(
        currency: CurrencyId,
        private: Option<&str>,
        public: Option<Option<&str>>,
    ) -> Result<Self> {
        if private.is_none() && public.is_none() {
            return Err(Error::malformed(
                "a keypair needs a private value or a public address",
            ));
        }

        let private_state = match private {
            None => PrivateState::Absent,
            Some(value) if scheme::is_ciphertext(value) => {
                let scheme = scheme::scheme_of(value)
                    .ok_or_else(|| Error::malformed("unrecognized ciphertext tag"))?;
                PrivateState::Encrypted {
                    ciphertext: value.to_string(),
                    scheme,
                }
            }
            Some(value) if share_codec::is_share(value) => {
                let (min_shares, index, data) = share_codec::decode_share(value)?;
                PrivateState::Share {
                    data,
                    index,
                    min_shares,
                }
            }
            Some(value) => {
                currency.validate_private(value)?;
                PrivateState::Plaintext(Zeroizing::new(value.to_string()))
            }
        };

        let public_state = if currency.has_public_address() {
            match (&private_state, public) {
                (PrivateState::Plaintext(plaintext), given) => {
                    let derived = currency.derive_address(plaintext)?.ok_or_else(|| {
                        Error::state("currency reported no derivable address")
                    })?;
                    if let Some(Some(address)) = given
                        && address != derived
                    {
                        return Err(Error::AddressMismatch {
                            index: 0,
                            ticker: currency.ticker(),
                        });
                    }
                    PublicAddress::Address(derived)
                }
                (_, Some(Some(address))) => PublicAddress::Address(address.to_string()),
                (_, Some(None)) => {
                    return Err(Error::malformed(format!(
                        "{} has public addresses, the no-address marker is invalid here",
                        currency.ticker()
                    )));
                }
                (_, None) => PublicAddress::Unknown,
            }
        } else {
            if let Some(Some(_)) = public {
                return Err(Error::malformed(format!(
                    "{} has no public address concept but one was supplied",
                    currency.ticker()
                )));
            }
            PublicAddress::NotApplicable
        };

        Ok(Self {
            currency,
            public: public_state,
            private: private_state,
        })
    }

    #[must_use]
    pub fn currency(&self) -> CurrencyId {
        self.currency
    }

    #[must_use]
    pub fn public_address(&self) -> &PublicAddress {
        &self.public
    }

    /// The private value in its serialized string form, if present
    #[must_use]
    pub fn private_value(&self) -> Option<Zeroizing<String>> {
        match &self.private {
            PrivateState::Absent => None,
            PrivateState::Plaintext(value) => Some(value.clone()),
            PrivateState::Encrypted { ciphertext, .. } => {
                Some(Zeroizing::new(ciphertext.clone()))
            }
            PrivateState::Share {
                data,
                index,
                min_shares,
            } => {
                let encoded = share_codec::encode_share(data, *min_shares, *index);
                // length was bounded when the share was created
                debug_assert!(encoded.is_ok(), "share data outgrew its length field");
                encoded.ok().map(Zeroizing::new)
            }
        }
    }

    #[must_use]
    pub fn has_private_value(&self) -> bool {
        !matches!(self.private, PrivateState::Absent)
    }

    /// Whether the private value is encrypted; `None` when there is no
    /// private value to ask about
    #[must_use]
    pub fn is_encrypted(&self) -> Option<bool> {
        match &self.private {
            PrivateState::Absent => None,
            PrivateState::Encrypted { .. } => Some(true),
            PrivateState::Plaintext(_) | PrivateState::Share { .. } => Some(false),
        }
    }

    #[must_use]
    pub fn encryption_scheme(&self) -> Option<EncryptionScheme> {
        match &self.private {
            PrivateState::Encrypted { scheme, .. } => Some(*scheme),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_split(&self) -> bool {
        matches!(self.private, PrivateState::Share { .. })
    }

    #[must_use]
    pub fn share_index(&self) -> Option<ShareIndex> {
        match &self.private {
            PrivateState::Share { index, .. } => *index,
            _ => None,
        }
    }

    #[must_use]
    pub fn min_shares(&self) -> Option<Threshold> {
        match &self.private {
            PrivateState::Share { min_shares, .. } => Some(*min_shares),
            _ => None,
        }
    }

    /// Assigns the share index of an unnumbered share
    ///
    /// Assigning the index a share already carries is a no-op; assigning a
    /// different one is rejected, indices are immutable once set.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] if the keypair is not split or
    /// already carries a different index
    pub fn set_share_index(&mut self, index: ShareIndex) -> Result<()> {
        match &mut self.private {
            PrivateState::Share { index: slot, .. } => match slot {
                None => {
                    *slot = Some(index);
                    Ok(())
                }
                Some(current) if *current == index => Ok(()),
                Some(_) => Err(Error::state("share index is already assigned")),
            },
            _ => Err(Error::state(
                "cannot assign a share index to a keypair that is not split",
            )),
        }
    }

    /// Encrypts the plaintext private value in place
    ///
    /// The public address is derived and cached before the plaintext is
    /// replaced, so encrypting never loses the address.
    ///
    /// # Errors
    /// Returns [`Error::NoPrivateKey`] when there is nothing to encrypt and
    /// [`Error::InvalidState`] when the value is already encrypted or split
    pub fn encrypt(
        &mut self,
        scheme: EncryptionScheme,
        passphrase: &str,
        progress: &mut dyn FnMut(f64),
    ) -> Result<()> {
        if passphrase.is_empty() {
            return Err(Error::state("passphrase must not be empty"));
        }
        if !self.currency.supported_schemes().contains(&scheme) {
            return Err(Error::state(format!(
                "{} does not support the {scheme} scheme",
                self.currency.ticker()
            )));
        }
        let plaintext = match &self.private {
            PrivateState::Plaintext(value) => value.clone(),
            PrivateState::Absent => return Err(Error::NoPrivateKey),
            PrivateState::Encrypted { .. } => {
                return Err(Error::state("keypair is already encrypted"));
            }
            PrivateState::Share { .. } => {
                return Err(Error::state("cannot encrypt a split keypair"));
            }
        };

        progress(0.0);
        if self.currency.has_public_address() && self.public == PublicAddress::Unknown {
            if let Some(address) = self.currency.derive_address(&plaintext)? {
                self.public = PublicAddress::Address(address);
            }
        }

        let ciphertext = scheme::encrypt(scheme, &plaintext, passphrase, progress)?;
        self.private = PrivateState::Encrypted { ciphertext, scheme };
        progress(1.0);
        Ok(())
    }

    /// Decrypts the encrypted private value in place
    ///
    /// The recovered plaintext must validate for the currency and its
    /// derived address must match any recorded one; a decryption that
    /// produces an invalid value is reported as a wrong passphrase.
    ///
    /// # Errors
    /// Returns [`Error::IncorrectPassphrase`] for authentication failures,
    /// [`Error::AddressMismatch`] when the recovered key contradicts the
    /// recorded address, and [`Error::InvalidState`] when not encrypted
    pub fn decrypt(&mut self, passphrase: &str, progress: &mut dyn FnMut(f64)) -> Result<()> {
        let ciphertext = match &self.private {
            PrivateState::Encrypted { ciphertext, .. } => ciphertext.clone(),
            PrivateState::Absent => return Err(Error::NoPrivateKey),
            _ => return Err(Error::state("keypair is not encrypted")),
        };

        progress(0.0);
        let plaintext = scheme::decrypt(&ciphertext, passphrase, progress)?;
        self.currency
            .validate_private(&plaintext)
            .map_err(|_| Error::IncorrectPassphrase)?;

        if let Some(derived) = self.currency.derive_address(&plaintext)? {
            if let PublicAddress::Address(recorded) = &self.public
                && *recorded != derived
            {
                return Err(Error::AddressMismatch {
                    index: 0,
                    ticker: self.currency.ticker(),
                });
            }
            self.public = PublicAddress::Address(derived);
        }

        self.private = PrivateState::Plaintext(plaintext);
        progress(1.0);
        Ok(())
    }

    /// Splits the plaintext private value into `share_count` shares of which
    /// any `threshold` reconstruct it
    ///
    /// Each resulting keypair carries the same public address, its 1-based
    /// share index, and the threshold baked into its share encoding.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] when the value is encrypted or
    /// already split, and [`Error::NoPrivateKey`] when absent
    pub fn split(&self, config: SplitConfig) -> Result<Vec<Keypair>> {
        let plaintext = match &self.private {
            PrivateState::Plaintext(value) => value,
            PrivateState::Absent => return Err(Error::NoPrivateKey),
            PrivateState::Encrypted { .. } => {
                return Err(Error::state("decrypt the keypair before splitting"));
            }
            PrivateState::Share { .. } => {
                return Err(Error::state("keypair is already split"));
            }
        };
        if plaintext.len() > usize::from(u16::MAX) - 1 {
            return Err(Error::state("private value too large to split"));
        }

        let sharks = Sharks(*config.threshold());
        let dealer = sharks.dealer(plaintext.as_bytes());

        dealer
            .take(usize::from(*config.share_count()))
            .enumerate()
            .map(|(k, share)| {
                let number = u8::try_from(k + 1)
                    .map_err(|_| Error::state("share count overflowed one byte"))?;
                Ok(Keypair {
                    currency: self.currency,
                    public: self.public.clone(),
                    private: PrivateState::Share {
                        data: Zeroizing::new(Vec::from(&share)),
                        index: Some(ShareIndex::new(number)?),
                        min_shares: config.threshold(),
                    },
                })
            })
            .collect()
    }

    /// Reconstructs a plaintext keypair from enough compatible shares
    ///
    /// # Errors
    /// Returns [`Error::InsufficientShares`] naming the exact deficit when
    /// too few distinct shares are given, and [`Error::IncompatibleParts`]
    /// when the shares disagree on currency, threshold, or address, carry
    /// duplicate indices, or reconstruct garbage
    pub fn combine(parts: &[&Keypair]) -> Result<Keypair> {
        let first = parts
            .first()
            .ok_or_else(|| Error::state("no shares provided"))?;
        let currency = first.currency;
        let min_shares = first
            .min_shares()
            .ok_or_else(|| Error::state("keypair is not split"))?;

        let mut shares = Vec::with_capacity(parts.len());
        let mut seen_indices = Vec::new();
        for part in parts {
            if part.currency != currency {
                return Err(Error::IncompatibleParts(
                    "shares come from different currencies".to_string(),
                ));
            }
            let (data, index, part_min) = match &part.private {
                PrivateState::Share {
                    data,
                    index,
                    min_shares,
                } => (data, index, *min_shares),
                _ => return Err(Error::state("keypair is not split")),
            };
            if part_min != min_shares {
                return Err(Error::IncompatibleParts(
                    "shares disagree on the minimum share count".to_string(),
                ));
            }
            if let Some(index) = index {
                if seen_indices.contains(index) {
                    return Err(Error::IncompatibleParts(format!(
                        "share index {index} appears more than once"
                    )));
                }
                seen_indices.push(*index);
            }
            if part.public != first.public {
                return Err(Error::IncompatibleParts(
                    "shares record different public addresses".to_string(),
                ));
            }
            let share = Share::try_from(data.as_slice())
                .map_err(|e| Error::IncompatibleParts(format!("unusable share data: {e:?}")))?;
            shares.push(share);
        }

        if parts.len() < usize::from(*min_shares) {
            return Err(Error::InsufficientShares {
                missing: usize::from(*min_shares) - parts.len(),
            });
        }

        let sharks = Sharks(*min_shares);
        let secret = sharks
            .recover(&shares)
            .map_err(|e| Error::IncompatibleParts(format!("share reconstruction failed: {e:?}")))?;
        let plaintext = Zeroizing::new(String::from_utf8(secret).map_err(|_| {
            Error::IncompatibleParts("shares do not reconstruct a private value".to_string())
        })?);
        currency.validate_private(&plaintext).map_err(|_| {
            Error::IncompatibleParts(format!(
                "reconstructed value is not a valid {} private value",
                currency.ticker()
            ))
        })?;

        let public = match currency.derive_address(&plaintext)? {
            Some(derived) => {
                if let PublicAddress::Address(recorded) = &first.public
                    && *recorded != derived
                {
                    return Err(Error::IncompatibleParts(
                        "reconstructed key does not match the recorded address".to_string(),
                    ));
                }
                PublicAddress::Address(derived)
            }
            None => PublicAddress::NotApplicable,
        };

        Ok(Keypair {
            currency,
            public,
            private: PrivateState::Plaintext(plaintext),
        })
    }

    /// Deep copy, also available through `Clone`
    #[must_use]
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Forgets the private value, keeping the public address
    ///
    /// # Errors
    /// Returns an error if removing it would leave the keypair empty
    pub fn remove_private_value(&mut self) -> Result<()> {
        if self.public.address().is_none() && self.public != PublicAddress::NotApplicable {
            return Err(Error::state(
                "removing the private value would leave the keypair empty",
            ));
        }
        self.private = PrivateState::Absent;
        Ok(())
    }

    /// Forgets the public address, keeping the private value
    ///
    /// # Errors
    /// Returns an error if removing it would leave the keypair empty
    pub fn remove_public_address(&mut self) -> Result<()> {
        if !self.has_private_value() {
            return Err(Error::state(
                "removing the public address would leave the keypair empty",
            ));
        }
        if self.public != PublicAddress::NotApplicable {
            self.public = PublicAddress::Unknown;
        }
        Ok(())
    }

    /// Drops all key material; the zeroizing buffers wipe on drop
    pub(crate) fn wipe(&mut self) {
        self.private = PrivateState::Absent;
        self.public = PublicAddress::Unknown;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ShareCount;

    fn no_progress() -> impl FnMut(f64) {
        |_| {}
    }

    fn config(threshold: u8, count: u8) -> SplitConfig {
        SplitConfig::new(
            Threshold::new(threshold).unwrap(),
            ShareCount::new(count).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_generate_produces_plaintext_with_address() {
        let kp = Keypair::generate(CurrencyId::Bitcoin).unwrap();
        assert_eq!(kp.is_encrypted(), Some(false));
        assert!(!kp.is_split());
        assert!(kp.public_address().address().unwrap().starts_with('1'));
    }

    #[test]
    fn test_encrypt_then_decrypt_restores_value() {
        let mut kp = Keypair::generate(CurrencyId::Ethereum).unwrap();
        let original = kp.private_value().unwrap();
        let address = kp.public_address().clone();

        kp.encrypt(EncryptionScheme::AesGcmPbkdf2, "pw", &mut no_progress())
            .unwrap();
        assert_eq!(kp.is_encrypted(), Some(true));
        assert_eq!(kp.encryption_scheme(), Some(EncryptionScheme::AesGcmPbkdf2));
        assert_eq!(*kp.public_address(), address);

        kp.decrypt("pw", &mut no_progress()).unwrap();
        assert_eq!(kp.is_encrypted(), Some(false));
        assert_eq!(&*kp.private_value().unwrap(), &*original);
    }

    #[test]
    fn test_double_encrypt_rejected() {
        let mut kp = Keypair::generate(CurrencyId::Bitcoin).unwrap();
        kp.encrypt(EncryptionScheme::AesGcmPbkdf2, "pw", &mut no_progress())
            .unwrap();
        let err = kp
            .encrypt(EncryptionScheme::AesGcmPbkdf2, "pw", &mut no_progress())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[test]
    fn test_decrypt_wrong_passphrase() {
        let mut kp = Keypair::generate(CurrencyId::Bitcoin).unwrap();
        kp.encrypt(EncryptionScheme::AesGcmPbkdf2, "right", &mut no_progress())
            .unwrap();
        let err = kp.decrypt("wrong", &mut no_progress()).unwrap_err();
        assert!(matches!(err, Error::IncorrectPassphrase));
        // state unchanged, the right passphrase still works
        kp.decrypt("right", &mut no_progress()).unwrap();
    }

    #[test]
    fn test_split_and_combine_round_trip() {
        let kp = Keypair::generate(CurrencyId::Monero).unwrap();
        let original = kp.private_value().unwrap();

        let shares = kp.split(config(2, 3)).unwrap();
        assert_eq!(shares.len(), 3);
        for (k, share) in shares.iter().enumerate() {
            assert!(share.is_split());
            assert_eq!(share.share_index().map(|i| *i), Some(k as u8 + 1));
            assert_eq!(share.min_shares().map(|t| *t), Some(2));
        }

        let recovered = Keypair::combine(&[&shares[0], &shares[2]]).unwrap();
        assert_eq!(&*recovered.private_value().unwrap(), &*original);
        assert_eq!(recovered.public_address(), kp.public_address());
    }

    #[test]
    fn test_combine_reports_exact_deficit() {
        let kp = Keypair::generate(CurrencyId::Bitcoin).unwrap();
        let shares = kp.split(config(3, 5)).unwrap();

        let err = Keypair::combine(&[&shares[0]]).unwrap_err();
        assert!(matches!(err, Error::InsufficientShares { missing: 2 }));

        let err = Keypair::combine(&[&shares[0], &shares[1]]).unwrap_err();
        assert!(matches!(err, Error::InsufficientShares { missing: 1 }));
    }

    #[test]
    fn test_combine_rejects_duplicate_indices() {
        let kp = Keypair::generate(CurrencyId::Bitcoin).unwrap();
        let shares = kp.split(config(2, 3)).unwrap();
        let err = Keypair::combine(&[&shares[1], &shares[1]]).unwrap_err();
        assert!(matches!(err, Error::IncompatibleParts(_)));
    }

    #[test]
    fn test_combine_rejects_mixed_splits() {
        let a = Keypair::generate(CurrencyId::Bitcoin).unwrap();
        let b = Keypair::generate(CurrencyId::Bitcoin).unwrap();
        let sa = a.split(config(2, 3)).unwrap();
        let sb = b.split(config(3, 4)).unwrap();
        let err = Keypair::combine(&[&sa[0], &sb[0]]).unwrap_err();
        assert!(matches!(err, Error::IncompatibleParts(_)));
    }

    #[test]
    fn test_split_requires_plaintext() {
        let mut kp = Keypair::generate(CurrencyId::Bitcoin).unwrap();
        kp.encrypt(EncryptionScheme::AesGcmPbkdf2, "pw", &mut no_progress())
            .unwrap();
        let err = kp.split(config(2, 3)).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[test]
    fn test_from_parts_classifies_states() {
        let plain = Keypair::generate(CurrencyId::Bitcoin).unwrap();
        let value = plain.private_value().unwrap();

        let imported = Keypair::from_parts(CurrencyId::Bitcoin, Some(&value), None).unwrap();
        assert_eq!(imported.is_encrypted(), Some(false));
        assert_eq!(imported.public_address(), plain.public_address());

        let mut encrypted = plain.clone();
        encrypted
            .encrypt(EncryptionScheme::AesGcmScrypt, "pw", &mut no_progress())
            .unwrap();
        let ct = encrypted.private_value().unwrap();
        let imported = Keypair::from_parts(CurrencyId::Bitcoin, Some(&ct), None).unwrap();
        assert_eq!(imported.is_encrypted(), Some(true));
        assert_eq!(imported.encryption_scheme(), Some(EncryptionScheme::AesGcmScrypt));

        let shares = plain.split(config(2, 3)).unwrap();
        let encoded = shares[1].private_value().unwrap();
        let imported = Keypair::from_parts(CurrencyId::Bitcoin, Some(&encoded), None).unwrap();
        assert!(imported.is_split());
        assert_eq!(imported.share_index(), shares[1].share_index());
    }

    #[test]
    fn test_from_parts_public_only() {
        let kp =
            Keypair::from_parts(CurrencyId::Bitcoin, None, Some(Some("1deadbeef"))).unwrap();
        assert!(!kp.has_private_value());
        assert_eq!(kp.is_encrypted(), None);
        assert_eq!(kp.public_address().address(), Some("1deadbeef"));
    }

    #[test]
    fn test_from_parts_rejects_empty() {
        assert!(Keypair::from_parts(CurrencyId::Bitcoin, None, None).is_err());
    }

    #[test]
    fn test_from_parts_rejects_contradicting_address() {
        let kp = Keypair::generate(CurrencyId::Bitcoin).unwrap();
        let value = kp.private_value().unwrap();
        let err = Keypair::from_parts(CurrencyId::Bitcoin, Some(&value), Some(Some("1wrong")))
            .unwrap_err();
        assert!(matches!(err, Error::AddressMismatch { .. }));
    }

    #[test]
    fn test_set_share_index_exactly_once() {
        let kp = Keypair::generate(CurrencyId::Bitcoin).unwrap();
        let shares = kp.split(config(2, 3)).unwrap();

        // strip the index by re-encoding the raw share without one
        let (min, _, data) =
            share_codec::decode_share(&shares[0].private_value().unwrap()).unwrap();
        let unnumbered = share_codec::encode_share(&data, min, None).unwrap();
        let mut kp = Keypair::from_parts(CurrencyId::Bitcoin, Some(&unnumbered), None).unwrap();
        assert_eq!(kp.share_index(), None);

        let five = ShareIndex::new(5).unwrap();
        kp.set_share_index(five).unwrap();
        assert_eq!(kp.share_index(), Some(five));
        // idempotent for the same value, immutable otherwise
        kp.set_share_index(five).unwrap();
        assert!(kp.set_share_index(ShareIndex::new(6).unwrap()).is_err());
    }

    #[test]
    fn test_bip39_keypair_not_applicable_address() {
        let kp = Keypair::generate(CurrencyId::Bip39).unwrap();
        assert_eq!(*kp.public_address(), PublicAddress::NotApplicable);

        let value = kp.private_value().unwrap();
        let err =
            Keypair::from_parts(CurrencyId::Bip39, Some(&value), Some(Some("addr"))).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
    }

    #[test]
    fn test_remove_parts() {
        let mut kp = Keypair::generate(CurrencyId::Bitcoin).unwrap();
        kp.remove_private_value().unwrap();
        assert!(!kp.has_private_value());
        assert!(kp.public_address().address().is_some());
        // now empty removal is rejected
        assert!(kp.remove_public_address().is_err());
    }
}
