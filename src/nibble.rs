//! The 4-bit value domain.
//!
//! Every architectural value in the machine (accumulator, opcode field,
//! operand field) is a [`Nibble`]: an unsigned integer in `0..=15`.
//! Arithmetic wraps modulo 16.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 4-bit unsigned value.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Nibble(u8);

impl Nibble {
    /// Zero.
    pub const ZERO: Self = Self(0);
    /// Largest representable value (15).
    pub const MAX: Self = Self(0xF);
    /// Bit mask of the four live bits.
    pub const MASK: u8 = 0x0F;

    /// Create from the low four bits of `value`; higher bits are discarded.
    #[inline]
    pub const fn new(value: u8) -> Self {
        Self(value & Self::MASK)
    }

    /// Create from `value`, rejecting anything above 15.
    pub fn checked(value: u8) -> Option<Self> {
        (value <= Self::MASK).then_some(Self(value))
    }

    /// The raw value, always in `0..=15`.
    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Test a single bit (0 = least significant).
    #[inline]
    pub const fn bit(self, n: u8) -> bool {
        n < 4 && (self.0 >> n) & 1 == 1
    }

    /// Add modulo 16, returning `(sum, carry_out)`.
    pub const fn carrying_add(self, rhs: Self) -> (Self, bool) {
        let wide = self.0 + rhs.0;
        (Self::new(wide), wide > Self::MASK)
    }

    /// Subtract modulo 16, returning `(difference, borrow_out)`.
    pub const fn borrowing_sub(self, rhs: Self) -> (Self, bool) {
        (Self::new(self.0.wrapping_sub(rhs.0)), self.0 < rhs.0)
    }

    /// Shift left by one, returning `(shifted, bit shifted out)`.
    pub const fn shl1(self) -> (Self, bool) {
        (Self::new(self.0 << 1), self.bit(3))
    }

    /// Shift right by one, returning `(shifted, bit shifted out)`.
    pub const fn shr1(self) -> (Self, bool) {
        (Self(self.0 >> 1), self.bit(0))
    }
}

impl From<Nibble> for u8 {
    fn from(n: Nibble) -> u8 {
        n.0
    }
}

impl TryFrom<u8> for Nibble {
    type Error = NibbleRangeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::checked(value).ok_or(NibbleRangeError(value))
    }
}

impl std::ops::BitAnd for Nibble {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl std::ops::BitOr for Nibble {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitXor for Nibble {
    type Output = Self;
    fn bitxor(self, rhs: Self) -> Self {
        Self(self.0 ^ rhs.0)
    }
}

impl fmt::Debug for Nibble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06b} ({})", self.0, self.0)
    }
}

impl fmt::Display for Nibble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Binary for Nibble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Binary::fmt(&self.0, f)
    }
}

/// A value outside `0..=15` was offered where a nibble was required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("value {0} does not fit in 4 bits")]
pub struct NibbleRangeError(pub u8);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_masks_high_bits() {
        assert_eq!(Nibble::new(0x1F).get(), 0xF);
        assert_eq!(Nibble::new(0x30).get(), 0);
    }

    #[test]
    fn test_checked_range() {
        assert_eq!(Nibble::checked(15), Some(Nibble::MAX));
        assert_eq!(Nibble::checked(16), None);
        assert_eq!(Nibble::try_from(16u8), Err(NibbleRangeError(16)));
    }

    #[test]
    fn test_carrying_add_wraps() {
        let (sum, carry) = Nibble::new(15).carrying_add(Nibble::new(1));
        assert_eq!(sum, Nibble::ZERO);
        assert!(carry);

        let (sum, carry) = Nibble::new(5).carrying_add(Nibble::new(3));
        assert_eq!(sum.get(), 8);
        assert!(!carry);
    }

    #[test]
    fn test_borrowing_sub_wraps() {
        let (diff, borrow) = Nibble::new(2).borrowing_sub(Nibble::new(3));
        assert_eq!(diff.get(), 15);
        assert!(borrow);

        let (diff, borrow) = Nibble::new(8).borrowing_sub(Nibble::new(2));
        assert_eq!(diff.get(), 6);
        assert!(!borrow);
    }

    #[test]
    fn test_shifts_report_lost_bit() {
        assert_eq!(Nibble::new(8).shl1(), (Nibble::ZERO, true));
        assert_eq!(Nibble::new(0b0101).shl1(), (Nibble::new(0b1010), false));
        assert_eq!(Nibble::new(0b1010).shr1(), (Nibble::new(0b0101), false));
        assert_eq!(Nibble::new(0b0011).shr1(), (Nibble::new(0b0001), true));
    }

    #[test]
    fn test_serde_rejects_wide_values() {
        assert_eq!(serde_json::to_string(&Nibble::new(9)).unwrap(), "9");
        assert!(serde_json::from_str::<Nibble>("16").is_err());
    }
}
