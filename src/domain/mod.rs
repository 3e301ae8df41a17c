//! Domain types for threshold secret sharing
//!
//! Validated newtypes and configuration for splitting pieces:
//! - [`Threshold`] - Minimum shares required for reconstruction (2..=254)
//! - [`ShareIndex`] - 1-based piece number of a share (1..=254)
//! - [`ShareCount`] - Total number of shares to create (2..=254)
//! - [`SplitConfig`] - Validated threshold and share count pair

mod config;
mod share_count;
mod share_index;
mod threshold;

pub use config::SplitConfig;
pub use share_count::{MAX_SHARES, ShareCount};
pub use share_index::ShareIndex;
pub use threshold::Threshold;
