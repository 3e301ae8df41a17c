//! `ShareCount` newtype for threshold secret sharing

use crate::error::{Error, Result};

/// Number of shares to create when splitting a piece (2..=254)
///
/// Splitting into a single share is pointless (it would be a copy), and the
/// maximum is 254 so a share index always fits the one-byte slot of the
/// share encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ShareCount(u8);

/// Hard ceiling on the number of shares a piece can be split into
pub const MAX_SHARES: u8 = 254;

impl ShareCount {
    /// Minimum valid share count
    pub const MIN: u8 = 2;

    /// Maximum valid share count (254)
    pub const MAX: u8 = MAX_SHARES;

    /// Creates a new share count
    ///
    /// # Errors
    /// Returns an error if the count is below 2 or above 254
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keypiece::domain::ShareCount;
    ///
    /// let count = ShareCount::new(5).unwrap();
    /// assert_eq!(*count, 5);
    ///
    /// let max_count = ShareCount::new(ShareCount::MAX).unwrap();
    /// assert_eq!(*max_count, 254);
    ///
    /// // Invalid: 0, 1 and 255 are not allowed
    /// assert!(ShareCount::new(0).is_err());
    /// assert!(ShareCount::new(1).is_err());
    /// assert!(ShareCount::new(255).is_err());
    /// ```
    pub fn new(value: u8) -> Result<Self> {
        if value < Self::MIN {
            return Err(Error::state(format!(
                "share count must be at least {} (got {value})",
                Self::MIN
            )));
        }
        if value > Self::MAX {
            return Err(Error::state(format!(
                "share count maximum is {} to keep share indices one byte wide",
                Self::MAX
            )));
        }
        Ok(Self(value))
    }
}

impl std::ops::Deref for ShareCount {
    type Target = u8;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
