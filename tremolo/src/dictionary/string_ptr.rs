use crate::errors::{Result, TremoloError};

const BASE_OFFSET: u32 = 27;
const MAX_SIMPLE_LENGTH: u32 = 19;
const MAX_LENGTH_BITS: u32 = 12;
const OFFSET_MASK: u32 = 0x07ff_ffff;
const LENGTH_MASK: u32 = 0x07ff_0000;

/// Packed pointer to a string in the string region.
///
/// Both fields count UTF-16 code units. The upper 5 bits hold the length for
/// strings up to 19 units. Longer strings borrow `k` further bits from the
/// offset field to extend the length, and their offset must then be aligned
/// to `1 << (k - 1)` units, since the borrowed low bits of the offset are
/// implicitly zero.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Default, Hash)]
pub struct StringPtr {
    length: u32,
    offset: u32,
}

impl StringPtr {
    /// The maximum encodable length.
    pub const MAX_LENGTH: usize = (1 << MAX_LENGTH_BITS) - 1 + MAX_SIMPLE_LENGTH as usize;

    /// The maximum encodable offset (exclusive).
    pub const MAX_OFFSET: u32 = 1 << BASE_OFFSET;

    /// Creates a new pointer.
    ///
    /// # Errors
    ///
    /// [`TremoloError`] is returned when the pair cannot be encoded.
    pub fn new(length: u32, offset: u32) -> Result<Self> {
        if length as usize > Self::MAX_LENGTH {
            return Err(TremoloError::capacity_exceeded(
                "string length",
                format!("{length} exceeds {}", Self::MAX_LENGTH),
            ));
        }
        if offset >= Self::MAX_OFFSET {
            return Err(TremoloError::capacity_exceeded(
                "string offset",
                format!("{offset} exceeds {}", Self::MAX_OFFSET),
            ));
        }
        if !Self::is_valid(offset, length) {
            return Err(TremoloError::invalid_argument(
                "offset",
                format!("{offset} is not aligned for a string of length {length}"),
            ));
        }
        Ok(Self { length, offset })
    }

    #[inline(always)]
    pub const fn length(&self) -> u32 {
        self.length
    }

    #[inline(always)]
    pub const fn offset(&self) -> u32 {
        self.offset
    }

    /// Number of length-extension bits needed for `length`.
    pub const fn required_alignment(length: u32) -> u32 {
        if length <= MAX_SIMPLE_LENGTH {
            0
        } else {
            32 - (length - MAX_SIMPLE_LENGTH).leading_zeros()
        }
    }

    /// Checks that a string of `length` may start at `offset`.
    pub const fn is_valid(offset: u32, length: u32) -> bool {
        let alignment = Self::required_alignment(length);
        if alignment == 0 {
            return true;
        }
        let step = 1 << (alignment - 1);
        offset & (step - 1) == 0
    }

    pub const fn encode(&self) -> u32 {
        let add_bits = Self::required_alignment(self.length);
        let simple = if self.length < MAX_SIMPLE_LENGTH {
            self.length
        } else {
            MAX_SIMPLE_LENGTH
        };
        let base_part = (add_bits + simple) << BASE_OFFSET;
        let remaining = self.length - simple;
        let implicit = (1 << MAX_LENGTH_BITS) >> (MAX_LENGTH_BITS + 1 - add_bits);
        let length_part = if add_bits == 0 {
            0
        } else {
            (remaining ^ implicit) << (16 + MAX_LENGTH_BITS - add_bits)
        };
        let offset_part = self.offset >> add_bits.saturating_sub(1);
        base_part | length_part | offset_part
    }

    pub const fn decode(ptr: u32) -> Self {
        let base = ptr >> BASE_OFFSET;
        let add_bits = base.saturating_sub(MAX_SIMPLE_LENGTH);
        let (non_fixed, implicit) = if add_bits == 0 {
            (0, 0)
        } else {
            (
                (ptr & LENGTH_MASK) >> (16 + MAX_LENGTH_BITS - add_bits),
                (1 << MAX_LENGTH_BITS) >> (MAX_LENGTH_BITS + 1 - add_bits),
            )
        };
        let length = base - add_bits + (non_fixed | implicit);
        let fixed_shift = add_bits.saturating_sub(1);
        let offset = (ptr & (OFFSET_MASK >> fixed_shift)) << fixed_shift;
        Self { length, offset }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_is_valid() {
        assert!(StringPtr::is_valid(0, 21));
        assert!(!StringPtr::is_valid(1, 21));
        assert!(StringPtr::is_valid(2, 21));
        assert!(!StringPtr::is_valid(1, 23));
        assert!(!StringPtr::is_valid(2, 23));
        assert!(StringPtr::is_valid(4, 23));
        assert!(StringPtr::is_valid(1, 20));
        assert!(StringPtr::is_valid(7, 19));
    }

    #[test]
    fn test_required_alignment() {
        assert_eq!(StringPtr::required_alignment(19), 0);
        assert_eq!(StringPtr::required_alignment(20), 1);
        assert_eq!(StringPtr::required_alignment(22), 2);
        assert_eq!(StringPtr::required_alignment(4114), 12);
    }

    #[test]
    fn test_encode_simple() {
        assert_eq!(StringPtr::new(1, 0).unwrap().encode(), 0x0800_0000);
        assert_eq!(StringPtr::new(0, 5).unwrap().encode(), 5);
    }

    #[test]
    fn test_decode_max_length() {
        let ptr = StringPtr::decode(0xffff_0000);
        assert_eq!(ptr.length() as usize, StringPtr::MAX_LENGTH);
        assert_eq!(ptr.offset(), 0);
    }

    #[test]
    fn test_new_invalid() {
        assert!(StringPtr::new(21, 1).is_err());
        assert!(StringPtr::new(StringPtr::MAX_LENGTH as u32 + 1, 0).is_err());
        assert!(StringPtr::new(1, StringPtr::MAX_OFFSET).is_err());
    }

    proptest! {
        #[test]
        fn prop_roundtrip(length in 0..=StringPtr::MAX_LENGTH as u32, offset in 0..StringPtr::MAX_OFFSET) {
            let alignment = StringPtr::required_alignment(length);
            let offset = if alignment == 0 {
                offset
            } else {
                offset & !((1 << (alignment - 1)) - 1)
            };
            let ptr = StringPtr::new(length, offset).unwrap();
            prop_assert_eq!(StringPtr::decode(ptr.encode()), ptr);
        }
    }
}
