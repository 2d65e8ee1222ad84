//! Fixed-width bit codec
//!
//! Integers, size headers, and raw bytes are turned into sequences of single
//! bits (one `u8` holding 0 or 1 per position, most significant bit first)
//! before they are spread over carrier samples, and reassembled on the way
//! out.
//!
//! Signed values use standard two's complement at the requested width, so an
//! 8-bit field encodes a byte identically whether it is read as `i8` or `u8`.

use crate::error::{CryptoError, CryptoResult};

/// Widest integer the codec accepts.
pub const MAX_WIDTH: usize = 64;

/// Ordered sequence of 0/1 values, most significant bit first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BitSequence {
    bits: Vec<u8>,
}

impl BitSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bits: Vec::with_capacity(capacity),
        }
    }

    /// Wrap already-extracted bits, rejecting anything other than 0 or 1.
    pub fn from_bits(bits: Vec<u8>) -> CryptoResult<Self> {
        if let Some(pos) = bits.iter().position(|&b| b > 1) {
            return Err(CryptoError::Encoding(format!(
                "bit {pos} has value {} (expected 0 or 1)",
                bits[pos]
            )));
        }
        Ok(Self { bits })
    }

    /// Expand bytes into 8 bits each, MSB first.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut seq = Self::with_capacity(bytes.len() * 8);
        for &byte in bytes {
            seq.push_uint(u64::from(byte), 8);
        }
        seq
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bits
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.bits
    }

    pub fn push(&mut self, bit: bool) {
        self.bits.push(u8::from(bit));
    }

    pub fn append(&mut self, other: &BitSequence) {
        self.bits.extend_from_slice(&other.bits);
    }

    /// Copy out `len` bits starting at `start`.
    pub fn slice(&self, start: usize, len: usize) -> CryptoResult<BitSequence> {
        let end = start
            .checked_add(len)
            .filter(|&end| end <= self.bits.len())
            .ok_or_else(|| {
                CryptoError::Encoding(format!(
                    "bit range {start}..{start}+{len} out of bounds (have {} bits)",
                    self.bits.len()
                ))
            })?;
        Ok(Self {
            bits: self.bits[start..end].to_vec(),
        })
    }

    /// Collapse back into bytes. The length must be a multiple of 8.
    pub fn to_bytes(&self) -> CryptoResult<Vec<u8>> {
        if self.bits.len() % 8 != 0 {
            return Err(CryptoError::Encoding(format!(
                "{} bits is not a whole number of bytes",
                self.bits.len()
            )));
        }
        Ok(self.bits.chunks(8).map(fold_bits).map(|b| b as u8).collect())
    }

    /// Pack into bytes, zero-padding the final byte if needed.
    pub fn to_packed_bytes(&self) -> Vec<u8> {
        self.bits
            .chunks(8)
            .map(|chunk| (fold_bits(chunk) << (8 - chunk.len())) as u8)
            .collect()
    }

    fn push_uint(&mut self, raw: u64, width: usize) {
        for i in (0..width).rev() {
            self.bits.push(((raw >> i) & 1) as u8);
        }
    }
}

fn fold_bits(bits: &[u8]) -> u64 {
    bits.iter().fold(0u64, |acc, &b| (acc << 1) | u64::from(b))
}

fn check_width(width: usize) -> CryptoResult<()> {
    if width == 0 || width > MAX_WIDTH {
        return Err(CryptoError::Encoding(format!(
            "bit width {width} outside 1..={MAX_WIDTH}"
        )));
    }
    Ok(())
}

/// Encode `value` into exactly `width` bits.
///
/// Unsigned: plain big-endian binary, `value` must be in `0..2^width`.
/// Signed: two's complement, `value` must be in `-2^(width-1)..2^(width-1)`;
/// the first bit is 1 exactly when `value` is negative.
pub fn encode_bits(value: i64, width: usize, signed: bool) -> CryptoResult<BitSequence> {
    check_width(width)?;

    let fits = if signed {
        width == MAX_WIDTH || {
            let half = 1i64 << (width - 1);
            (-half..half).contains(&value)
        }
    } else {
        value >= 0 && (width >= 63 || value < (1i64 << width))
    };
    if !fits {
        return Err(CryptoError::Encoding(format!(
            "{value} does not fit in {width} {} bits",
            if signed { "signed" } else { "unsigned" }
        )));
    }

    let mut seq = BitSequence::with_capacity(width);
    seq.push_uint(value as u64, width);
    Ok(seq)
}

/// Decode a sequence produced by [`encode_bits`]; the width is the sequence
/// length.
pub fn decode_bits(bits: &BitSequence, signed: bool) -> CryptoResult<i64> {
    let width = bits.len();
    check_width(width)?;

    let raw = fold_bits(bits.as_slice());
    let negative = bits.as_slice()[0] == 1;

    if signed {
        if width == MAX_WIDTH || !negative {
            Ok(raw as i64)
        } else {
            Ok((i128::from(raw) - (1i128 << width)) as i64)
        }
    } else if width == MAX_WIDTH && negative {
        Err(CryptoError::Encoding(
            "64-bit unsigned value exceeds i64::MAX".into(),
        ))
    } else {
        Ok(raw as i64)
    }
}

/// Encode a size field as 32 unsigned bits.
pub fn encode_u32(value: u32) -> BitSequence {
    let mut seq = BitSequence::with_capacity(32);
    seq.push_uint(u64::from(value), 32);
    seq
}

/// Decode exactly 32 unsigned bits.
pub fn decode_u32(bits: &BitSequence) -> CryptoResult<u32> {
    if bits.len() != 32 {
        return Err(CryptoError::Encoding(format!(
            "expected 32 bits, got {}",
            bits.len()
        )));
    }
    Ok(fold_bits(bits.as_slice()) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn seq(bits: &[u8]) -> BitSequence {
        BitSequence::from_bits(bits.to_vec()).unwrap()
    }

    #[test]
    fn test_unsigned_msb_first() {
        let bits = encode_bits(5, 8, false).unwrap();
        assert_eq!(bits.as_slice(), &[0, 0, 0, 0, 0, 1, 0, 1]);
        assert_eq!(decode_bits(&bits, false).unwrap(), 5);
    }

    #[test]
    fn test_signed_negative_sets_first_bit() {
        let minus_one = encode_bits(-1, 8, true).unwrap();
        assert_eq!(minus_one.as_slice(), &[1; 8]);

        let minus_two = encode_bits(-2, 8, true).unwrap();
        assert_eq!(minus_two.as_slice(), &[1, 1, 1, 1, 1, 1, 1, 0]);

        let min = encode_bits(-128, 8, true).unwrap();
        assert_eq!(min.as_slice(), &[1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(decode_bits(&min, true).unwrap(), -128);
    }

    #[test]
    fn test_signed_byte_matches_unsigned_byte() {
        for byte in 0u8..=255 {
            let signed = encode_bits(i64::from(byte as i8), 8, true).unwrap();
            let unsigned = encode_bits(i64::from(byte), 8, false).unwrap();
            assert_eq!(signed, unsigned, "byte {byte:#04x}");
        }
    }

    #[test]
    fn test_signed_wider_than_byte() {
        let bits = encode_bits(-300, 16, true).unwrap();
        assert_eq!(bits.as_slice()[0], 1);
        assert_eq!(decode_bits(&bits, true).unwrap(), -300);
        assert_eq!(
            decode_bits(&bits, false).unwrap(),
            i64::from((-300i16) as u16)
        );
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(matches!(encode_bits(256, 8, false), Err(CryptoError::Encoding(_))));
        assert!(matches!(encode_bits(-1, 8, false), Err(CryptoError::Encoding(_))));
        assert!(matches!(encode_bits(128, 8, true), Err(CryptoError::Encoding(_))));
        assert!(matches!(encode_bits(-129, 8, true), Err(CryptoError::Encoding(_))));
        assert!(encode_bits(255, 8, false).is_ok());
        assert!(encode_bits(127, 8, true).is_ok());
    }

    #[test]
    fn test_width_bounds() {
        assert!(matches!(encode_bits(0, 0, false), Err(CryptoError::Encoding(_))));
        assert!(matches!(encode_bits(0, 65, true), Err(CryptoError::Encoding(_))));
        assert!(matches!(
            decode_bits(&BitSequence::new(), false),
            Err(CryptoError::Encoding(_))
        ));
        assert!(matches!(
            decode_bits(&BitSequence::from_bits(vec![0; 65]).unwrap(), false),
            Err(CryptoError::Encoding(_))
        ));
    }

    #[test]
    fn test_full_width_extremes() {
        let max = encode_bits(i64::MAX, 64, false).unwrap();
        assert_eq!(decode_bits(&max, false).unwrap(), i64::MAX);

        let min = encode_bits(i64::MIN, 64, true).unwrap();
        assert_eq!(decode_bits(&min, true).unwrap(), i64::MIN);

        // All ones is -1 signed but overflows i64 unsigned
        let ones = seq(&[1; 64]);
        assert_eq!(decode_bits(&ones, true).unwrap(), -1);
        assert!(matches!(decode_bits(&ones, false), Err(CryptoError::Encoding(_))));
    }

    #[test]
    fn test_single_bit() {
        assert_eq!(decode_bits(&seq(&[1]), false).unwrap(), 1);
        assert_eq!(decode_bits(&seq(&[1]), true).unwrap(), -1);
        assert_eq!(encode_bits(-1, 1, true).unwrap(), seq(&[1]));
        assert!(encode_bits(1, 1, true).is_err());
    }

    #[test]
    fn test_from_bits_rejects_non_binary() {
        let err = BitSequence::from_bits(vec![0, 1, 2, 1]).unwrap_err();
        assert!(matches!(err, CryptoError::Encoding(_)));
    }

    #[test]
    fn test_u32_helpers() {
        let bits = encode_u32(0xDEAD_BEEF);
        assert_eq!(bits.len(), 32);
        assert_eq!(bits, encode_bits(0xDEAD_BEEF, 32, false).unwrap());
        assert_eq!(decode_u32(&bits).unwrap(), 0xDEAD_BEEF);
        assert!(decode_u32(&encode_bits(1, 31, false).unwrap()).is_err());
    }

    #[test]
    fn test_bytes_roundtrip() {
        let bytes = [0x00, 0x80, 0xA5, 0xFF];
        let bits = BitSequence::from_bytes(&bytes);
        assert_eq!(bits.len(), 32);
        assert_eq!(&bits.as_slice()[8..16], &[1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(bits.to_bytes().unwrap(), bytes);
        assert_eq!(bits.to_packed_bytes(), bytes);
    }

    #[test]
    fn test_to_bytes_requires_whole_bytes() {
        let bits = seq(&[1, 0, 1]);
        assert!(matches!(bits.to_bytes(), Err(CryptoError::Encoding(_))));
        assert_eq!(bits.to_packed_bytes(), vec![0b1010_0000]);
    }

    #[test]
    fn test_slice_and_append() {
        let mut bits = encode_u32(7);
        bits.append(&BitSequence::from_bytes(&[0xF0]));
        bits.push(true);
        assert_eq!(bits.len(), 41);

        assert_eq!(decode_u32(&bits.slice(0, 32).unwrap()).unwrap(), 7);
        assert_eq!(bits.slice(32, 8).unwrap().to_bytes().unwrap(), vec![0xF0]);
        assert!(bits.slice(40, 2).is_err());
        assert!(bits.slice(usize::MAX, 2).is_err());
    }

    fn unsigned_case() -> impl Strategy<Value = (usize, i64)> {
        (1usize..=MAX_WIDTH).prop_flat_map(|width| {
            let max = if width >= 63 { i64::MAX } else { (1i64 << width) - 1 };
            (Just(width), 0..=max)
        })
    }

    fn signed_case() -> impl Strategy<Value = (usize, i64)> {
        (1usize..=MAX_WIDTH).prop_flat_map(|width| {
            let (min, max) = if width == MAX_WIDTH {
                (i64::MIN, i64::MAX)
            } else {
                let half = 1i64 << (width - 1);
                (-half, half - 1)
            };
            (Just(width), min..=max)
        })
    }

    proptest! {
        #[test]
        fn unsigned_roundtrip((width, value) in unsigned_case()) {
            let bits = encode_bits(value, width, false).unwrap();
            prop_assert_eq!(bits.len(), width);
            prop_assert_eq!(decode_bits(&bits, false).unwrap(), value);
        }

        #[test]
        fn signed_roundtrip((width, value) in signed_case()) {
            let bits = encode_bits(value, width, true).unwrap();
            prop_assert_eq!(bits.len(), width);
            prop_assert_eq!(bits.as_slice()[0] == 1, value < 0, "sign bit must track sign");
            prop_assert_eq!(decode_bits(&bits, true).unwrap(), value);
        }

        #[test]
        fn bytes_roundtrip(data in proptest::collection::vec(any::<u8>(), 0..=512)) {
            let bits = BitSequence::from_bytes(&data);
            prop_assert_eq!(bits.len(), data.len() * 8);
            prop_assert_eq!(bits.to_bytes().unwrap(), data);
        }
    }
}
