//! `ShareIndex` newtype for threshold secret sharing

use crate::error::{Error, Result};

/// Share index, the 1-based piece number of one share (1..=254)
///
/// Printed pieces are numbered from 1; index 0 is the "not yet assigned"
/// sentinel in the share wire encoding and index 255 is reserved by the
/// GF256 field arithmetic, so neither is constructible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShareIndex(u8);

impl ShareIndex {
    /// Minimum valid share index (pieces are numbered from 1)
    pub const MIN: u8 = 1;

    /// Maximum valid share index (254)
    pub const MAX: u8 = 254;

    /// Creates a new share index
    ///
    /// # Errors
    /// Returns an error if the index is 0 or 255
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keypiece::domain::ShareIndex;
    ///
    /// let index = ShareIndex::new(1).unwrap();
    /// assert_eq!(*index, 1);
    ///
    /// let max_index = ShareIndex::new(ShareIndex::MAX).unwrap();
    /// assert_eq!(*max_index, 254);
    ///
    /// // Invalid: 0 is the unassigned sentinel, 255 is reserved
    /// assert!(ShareIndex::new(0).is_err());
    /// assert!(ShareIndex::new(255).is_err());
    /// ```
    pub fn new(value: u8) -> Result<Self> {
        if value < Self::MIN {
            return Err(Error::state("share index 0 is reserved for unassigned shares"));
        }
        if value > Self::MAX {
            return Err(Error::state("share index 255 is reserved for GF256 operations"));
        }
        Ok(Self(value))
    }
}

impl std::ops::Deref for ShareIndex {
    type Target = u8;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ShareIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
