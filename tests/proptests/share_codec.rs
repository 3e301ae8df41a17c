//! Property tests for the share wire encoding

use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;

use keypiece::domain::{ShareIndex, Threshold};
use keypiece::share_codec;

/// Wrapper for arbitrary byte vectors
#[derive(Clone, Debug)]
struct ByteVec(Vec<u8>);

impl Arbitrary for ByteVec {
    fn arbitrary(g: &mut Gen) -> Self {
        ByteVec(Vec::arbitrary(g))
    }
}

/// Share data must be exactly preserved through an encode/decode cycle,
/// along with its threshold and index metadata
#[quickcheck]
fn prop_share_round_trip(data: ByteVec, threshold: u8, index: u8) -> bool {
    let ByteVec(bytes) = data;

    let Ok(threshold) = Threshold::new(threshold) else {
        return true; // skip invalid thresholds
    };
    let index = ShareIndex::new(index).ok();

    let Ok(encoded) = share_codec::encode_share(&bytes, threshold, index) else {
        return bytes.len() > usize::from(u16::MAX);
    };
    if !share_codec::is_share(&encoded) {
        return false;
    }

    let Ok((parsed_threshold, parsed_index, parsed_data)) = share_codec::decode_share(&encoded)
    else {
        return false;
    };
    parsed_threshold == threshold && parsed_index == index && *parsed_data == bytes
}

/// Any single corrupted hex digit must be caught by the checksum or the
/// structural validation, never silently accepted with different data
#[quickcheck]
fn prop_single_digit_corruption_never_silently_accepted(data: ByteVec, position: usize) -> bool {
    let ByteVec(bytes) = data;
    if bytes.is_empty() || bytes.len() > 1024 {
        return true;
    }
    let threshold = Threshold::new(2).unwrap();
    let encoded = share_codec::encode_share(&bytes, threshold, None).unwrap();

    let hex_start = "split1.".len();
    let pos = hex_start + position % (encoded.len() - hex_start);
    let mut chars: Vec<char> = encoded.chars().collect();
    chars[pos] = if chars[pos] == '0' { '1' } else { '0' };
    let corrupted: String = chars.into_iter().collect();
    if corrupted == encoded {
        return true; // corruption was a no-op
    }

    match share_codec::decode_share(&corrupted) {
        Err(_) => true,
        // a flip in the index or threshold byte still decodes, but the
        // data itself must be intact
        Ok((_, _, parsed)) => *parsed == bytes,
    }
}

/// Strings without the version tag are never accepted
#[quickcheck]
fn prop_untagged_strings_rejected(s: String) -> bool {
    if s.starts_with("split1.") {
        return true;
    }
    !share_codec::is_share(&s) && share_codec::decode_share(&s).is_err()
}
