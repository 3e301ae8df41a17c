//! Wire encoding for secret shares
//!
//! A share travels as a version-tagged hex string so it can sit in any of
//! the serialization formats without extra columns:
//!
//! ```text
//! "split1" "." hex(min_shares[1] || index[1] || len[2 BE] || data || crc32(data)[4 BE])
//! ```
//!
//! `min_shares` is the reconstruction threshold, `index` is the 1-based
//! piece number (0 when not yet assigned), and the CRC32 checksum catches
//! transcription errors before a corrupted share poisons reconstruction.

use crc::{CRC_32_ISO_HDLC, Crc};
use zeroize::Zeroizing;

use crate::domain::{ShareIndex, Threshold};
use crate::error::{Error, Result};

/// Version word prefixed to every encoded share
pub const VERSION_TAG: &str = "split1";

const HEADER_LEN: usize = 4;
const CRC_LEN: usize = 4;

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Whether a private value string is an encoded share
#[must_use]
pub fn is_share(value: &str) -> bool {
    value
        .strip_prefix(VERSION_TAG)
        .is_some_and(|rest| rest.starts_with('.'))
}

/// Encodes raw share data with its threshold and optional index
///
/// # Errors
/// Returns an error if the share data exceeds the two-byte length field
pub fn encode_share(data: &[u8], min_shares: Threshold, index: Option<ShareIndex>) -> Result<String> {
    let len = u16::try_from(data.len())
        .map_err(|_| Error::state("share data too large to encode"))?;

    let mut payload = Zeroizing::new(Vec::with_capacity(HEADER_LEN + data.len() + CRC_LEN));
    payload.push(*min_shares);
    payload.push(index.map_or(0, |i| *i));
    payload.extend_from_slice(&len.to_be_bytes());
    payload.extend_from_slice(data);
    payload.extend_from_slice(&CRC32.checksum(data).to_be_bytes());

    Ok(format!("{VERSION_TAG}.{}", hex::encode(&payload)))
}

/// Decodes an encoded share back into its threshold, index and raw data
///
/// # Errors
/// Returns [`Error::MalformedInput`] if the string is not a well-formed
/// share or its checksum does not match
pub fn decode_share(value: &str) -> Result<(Threshold, Option<ShareIndex>, Zeroizing<Vec<u8>>)> {
    let hex_part = value
        .strip_prefix(VERSION_TAG)
        .and_then(|rest| rest.strip_prefix('.'))
        .ok_or_else(|| Error::malformed("not an encoded share"))?;

    let payload = Zeroizing::new(
        hex::decode(hex_part)
            .map_err(|e| Error::malformed(format!("share is not valid hex: {e}")))?,
    );
    if payload.len() < HEADER_LEN + CRC_LEN {
        return Err(Error::malformed("share is truncated"));
    }

    let min_shares = Threshold::new(payload[0])
        .map_err(|_| Error::malformed("share encodes an invalid threshold"))?;
    let index = match payload[1] {
        0 => None,
        n => Some(
            ShareIndex::new(n).map_err(|_| Error::malformed("share encodes an invalid index"))?,
        ),
    };

    let len = usize::from(u16::from_be_bytes([payload[2], payload[3]]));
    if payload.len() != HEADER_LEN + len + CRC_LEN {
        return Err(Error::malformed("share length field does not match payload"));
    }

    let data = &payload[HEADER_LEN..HEADER_LEN + len];
    let expected = u32::from_be_bytes([
        payload[HEADER_LEN + len],
        payload[HEADER_LEN + len + 1],
        payload[HEADER_LEN + len + 2],
        payload[HEADER_LEN + len + 3],
    ]);
    if CRC32.checksum(data) != expected {
        return Err(Error::malformed(
            "share checksum mismatch, the share was corrupted in transit",
        ));
    }

    Ok((min_shares, index, Zeroizing::new(data.to_vec())))
}
