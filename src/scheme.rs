//! Passphrase encryption schemes for private values
//!
//! Two schemes are supported: AES-256-GCM keyed by PBKDF2-HMAC-SHA256 (the
//! fast default) and AES-256-GCM keyed by scrypt (the memory-hard option for
//! passphrases that must survive offline guessing). Ciphertext strings are
//! self-describing so every serialization format round-trips without a
//! side channel:
//!
//! ```text
//! <scheme tag> "." hex(salt[16] || nonce[12] || ciphertext+tag)
//! ```
//!
//! Each scheme declares relative cost weights used to aggregate progress
//! across a batch of heterogeneous encryptions.

use aes_gcm::{
    Aes256Gcm,
    aead::{Aead, KeyInit},
};
use pbkdf2::pbkdf2_hmac;
use scrypt::Params;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{Error, Result};

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const GCM_TAG_LEN: usize = 16;

const PBKDF2_ROUNDS: u32 = 10_000;
const SCRYPT_LOG_N: u8 = 14;
const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;

/// A named passphrase encryption scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncryptionScheme {
    /// AES-256-GCM with a PBKDF2-HMAC-SHA256 derived key
    AesGcmPbkdf2,
    /// AES-256-GCM with an scrypt derived key (memory-hard)
    AesGcmScrypt,
}

impl EncryptionScheme {
    /// Every supported scheme
    pub const ALL: [EncryptionScheme; 2] =
        [EncryptionScheme::AesGcmPbkdf2, EncryptionScheme::AesGcmScrypt];

    /// Stable identifier used in structured records and on the CLI
    #[must_use]
    pub fn id(&self) -> &'static str {
        match self {
            EncryptionScheme::AesGcmPbkdf2 => "aes-gcm-pbkdf2",
            EncryptionScheme::AesGcmScrypt => "aes-gcm-scrypt",
        }
    }

    /// Short tag prefixed to ciphertext strings
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            EncryptionScheme::AesGcmPbkdf2 => "agp1",
            EncryptionScheme::AesGcmScrypt => "ags1",
        }
    }

    /// Looks a scheme up by its stable identifier
    ///
    /// # Errors
    /// Returns an error if the identifier names no known scheme
    pub fn from_id(id: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|scheme| scheme.id() == id)
            .ok_or_else(|| Error::malformed(format!("unknown encryption scheme '{id}'")))
    }

    /// Relative cost of encrypting one private value with this scheme
    #[must_use]
    pub fn encrypt_weight(&self) -> u64 {
        match self {
            EncryptionScheme::AesGcmPbkdf2 => 10,
            EncryptionScheme::AesGcmScrypt => 50,
        }
    }

    /// Relative cost of decrypting one private value with this scheme
    #[must_use]
    pub fn decrypt_weight(&self) -> u64 {
        match self {
            EncryptionScheme::AesGcmPbkdf2 => 10,
            EncryptionScheme::AesGcmScrypt => 50,
        }
    }
}

impl std::fmt::Display for EncryptionScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Returns the scheme a ciphertext string was produced with, if any
#[must_use]
pub fn scheme_of(value: &str) -> Option<EncryptionScheme> {
    EncryptionScheme::ALL
        .into_iter()
        .find(|scheme| value.starts_with(scheme.tag()) && value[scheme.tag().len()..].starts_with('.'))
}

/// Whether a private value string is a ciphertext produced by [`encrypt`]
#[must_use]
pub fn is_ciphertext(value: &str) -> bool {
    scheme_of(value).is_some()
}

/// Derives a 256-bit key from the passphrase using the scheme's KDF
fn derive_key(
    scheme: EncryptionScheme,
    passphrase: &str,
    salt: &[u8],
) -> Result<Zeroizing<[u8; 32]>> {
    let mut key = Zeroizing::new([0u8; 32]);
    match scheme {
        EncryptionScheme::AesGcmPbkdf2 => {
            pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, PBKDF2_ROUNDS, key.as_mut());
        }
        EncryptionScheme::AesGcmScrypt => {
            let params = Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, 32)
                .map_err(|e| Error::state(format!("scrypt parameters rejected: {e}")))?;
            scrypt::scrypt(passphrase.as_bytes(), salt, &params, key.as_mut())
                .map_err(|e| Error::state(format!("scrypt key derivation failed: {e}")))?;
        }
    }
    Ok(key)
}

/// Encrypts a plaintext private value under the given scheme and passphrase
///
/// The progress callback receives a fraction in [0, 1]; key derivation
/// dominates the cost, so one intermediate emission follows it.
///
/// # Errors
/// Returns an error if key derivation or the cipher fails
pub fn encrypt(
    scheme: EncryptionScheme,
    plaintext: &str,
    passphrase: &str,
    progress: &mut dyn FnMut(f64),
) -> Result<String> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    getrandom::getrandom(&mut salt)
        .and_then(|()| getrandom::getrandom(&mut nonce))
        .map_err(|e| Error::state(format!("failed to gather entropy: {e}")))?;

    let key = derive_key(scheme, passphrase, &salt)?;
    progress(0.8);

    let cipher = Aes256Gcm::new_from_slice(key.as_ref())
        .map_err(|e| Error::state(format!("cipher setup failed: {e}")))?;
    let ciphertext = cipher
        .encrypt(&nonce.into(), plaintext.as_bytes())
        .map_err(|e| Error::state(format!("encryption failed: {e:?}")))?;

    let mut framed = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    framed.extend_from_slice(&salt);
    framed.extend_from_slice(&nonce);
    framed.extend_from_slice(&ciphertext);

    Ok(format!("{}.{}", scheme.tag(), hex::encode(framed)))
}

/// Decrypts a ciphertext string produced by [`encrypt`]
///
/// # Errors
/// Returns [`Error::MalformedInput`] if the string is not a well-formed
/// ciphertext, and [`Error::IncorrectPassphrase`] if GCM authentication
/// fails. A wrong passphrase and corrupted ciphertext are indistinguishable
/// under AES-GCM, so both collapse to the passphrase error.
pub fn decrypt(
    value: &str,
    passphrase: &str,
    progress: &mut dyn FnMut(f64),
) -> Result<Zeroizing<String>> {
    let scheme =
        scheme_of(value).ok_or_else(|| Error::malformed("not a recognized ciphertext"))?;
    let framed = hex::decode(&value[scheme.tag().len() + 1..])
        .map_err(|e| Error::malformed(format!("ciphertext is not valid hex: {e}")))?;
    if framed.len() < SALT_LEN + NONCE_LEN + GCM_TAG_LEN {
        return Err(Error::malformed("ciphertext is too short"));
    }

    let (salt, rest) = framed.split_at(SALT_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);
    let nonce_array: [u8; NONCE_LEN] = nonce
        .try_into()
        .map_err(|_| Error::malformed("invalid nonce length"))?;

    let key = derive_key(scheme, passphrase, salt)?;
    progress(0.8);

    let cipher = Aes256Gcm::new_from_slice(key.as_ref())
        .map_err(|e| Error::state(format!("cipher setup failed: {e}")))?;
    let plaintext = Zeroizing::new(
        cipher
            .decrypt(&nonce_array.into(), ciphertext)
            .map_err(|_| Error::IncorrectPassphrase)?,
    );

    let text = std::str::from_utf8(&plaintext)
        .map_err(|_| Error::malformed("ciphertext did not decrypt to text"))?;
    Ok(Zeroizing::new(text.to_string()))
}
