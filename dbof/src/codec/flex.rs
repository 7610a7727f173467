//! The flex-length integer encoding used by DBOF-1 for
//! string lengths and container sizes.
use snafu::ensure;

use crate::stream::{Reads, Writes};

use super::{CodecError, OverlongFlexLengthSnafu};

/// Writes `value` as a flex-length: a count byte `N`,
/// then the value's `N` low bytes, little-endian.
///
/// `N` is the smallest byte count that fits the value;
/// zero still spends one byte on the wire.
pub(crate) fn write_flex(sink: &mut (impl Writes + ?Sized), value: u64) -> Result<(), CodecError> {
    let count = min_bytes(value);
    sink.write_all(&[count])?;
    sink.write_all(&value.to_le_bytes()[..count as usize])?;
    Ok(())
}

/// Reads a flex-length from `source`.
///
/// Any count up to 8 is accepted, canonical or not;
/// counts above 8 are a protocol error.
pub(crate) fn read_flex(source: &mut (impl Reads + ?Sized)) -> Result<u64, CodecError> {
    let mut count = [0u8; 1];
    source.read_exact(&mut count)?;
    let count = count[0];
    ensure!(count <= 8, OverlongFlexLengthSnafu { count });

    let mut bytes = [0u8; 8];
    source.read_exact(&mut bytes[..count as usize])?;
    Ok(u64::from_le_bytes(bytes))
}

/// The smallest number of bytes that can carry `value`
/// without loss, between 1 and 8.
fn min_bytes(value: u64) -> u8 {
    let bits = 64 - value.leading_zeros();
    core::cmp::max(1, (bits + 7) / 8) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: u64) -> alloc::vec::Vec<u8> {
        let mut bytes = alloc::vec![];
        write_flex(&mut bytes, value).unwrap();
        bytes
    }

    #[test]
    fn encodes_minimal_widths() {
        assert_eq!(alloc::vec![1, 0], encode(0));
        assert_eq!(alloc::vec![1, 2], encode(2));
        assert_eq!(alloc::vec![1, 0xFF], encode(0xFF));
        assert_eq!(alloc::vec![2, 0x00, 0x01], encode(0x100));
        assert_eq!(alloc::vec![3, 0xFF, 0xFF, 0xFF], encode(0xFF_FFFF));
        assert_eq!(8, encode(u64::MAX)[0]);
    }

    #[test]
    fn round_trips_boundaries() {
        // Each width boundary, on both sides.
        let mut cases = alloc::vec![0u64, 1];
        for width in 1..8u32 {
            let edge = 1u64 << (8 * width);
            cases.push(edge - 1);
            cases.push(edge);
        }
        cases.push(u64::MAX);

        for value in cases {
            let bytes = encode(value);
            assert_eq!(value, read_flex(&mut bytes.as_slice()).unwrap());
        }
    }

    #[test]
    fn accepts_non_canonical_widths() {
        // The value 1, padded out to eight bytes.
        let bytes = [8u8, 1, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(1, read_flex(&mut bytes.as_slice()).unwrap());

        // A zero-byte length decodes as zero.
        let bytes = [0u8];
        assert_eq!(0, read_flex(&mut bytes.as_slice()).unwrap());
    }

    #[test]
    fn rejects_overlong_widths() {
        let bytes = [9u8, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        let result = read_flex(&mut bytes.as_slice());
        assert!(matches!(
            result,
            Err(CodecError::OverlongFlexLength { count: 9, .. })
        ));
    }
}
