//! Threshold newtype for threshold secret sharing

use crate::error::{Error, Result};

/// Threshold for secret sharing (2..=254)
///
/// Invariant: 2 <= threshold <= 254 (enforced at construction).
/// A threshold of 1 provides no security benefit since any single share can
/// recover the entire secret; 255 is reserved by the GF256 field arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Threshold(u8);

impl Threshold {
    /// Minimum valid threshold
    pub const MIN: u8 = 2;

    /// Maximum valid threshold (254)
    pub const MAX: u8 = 254;

    /// Creates a new threshold
    ///
    /// # Errors
    /// Returns an error if the value is below 2 or is 255
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keypiece::domain::Threshold;
    ///
    /// let threshold = Threshold::new(3).unwrap();
    /// assert_eq!(*threshold, 3);
    ///
    /// // Invalid: threshold must be at least 2
    /// assert!(Threshold::new(1).is_err());
    /// assert!(Threshold::new(0).is_err());
    /// assert!(Threshold::new(255).is_err());
    /// ```
    pub fn new(value: u8) -> Result<Self> {
        if value < Self::MIN {
            return Err(Error::state(format!(
                "threshold must be at least {} (got {value})",
                Self::MIN
            )));
        }
        if value > Self::MAX {
            return Err(Error::state(format!(
                "threshold maximum is {} due to GF256 limitations",
                Self::MAX
            )));
        }
        Ok(Self(value))
    }
}

impl std::ops::Deref for Threshold {
    type Target = u8;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
