//! 6809 condition code register (CC) bits.

/// Entire flag - set when the full register set was stacked.
pub const E: u8 = 0x80;

/// Fast interrupt mask - when set, FIRQ is ignored.
pub const F: u8 = 0x40;

/// Half carry - carry from bit 3 on 8-bit additions.
pub const H: u8 = 0x20;

/// Interrupt mask - when set, IRQ is ignored.
pub const I: u8 = 0x10;

/// Negative - bit 7 (or bit 15) of the result.
pub const N: u8 = 0x08;

/// Zero - result is zero.
pub const Z: u8 = 0x04;

/// Overflow - signed result does not fit.
pub const V: u8 = 0x02;

/// Carry - carry out of bit 7 (or bit 15), borrow on subtraction.
pub const C: u8 = 0x01;

/// Set or clear `flag` in `cc` based on `condition`.
#[inline]
pub fn set(cc: &mut u8, flag: u8, condition: bool) {
    if condition {
        *cc |= flag;
    } else {
        *cc &= !flag;
    }
}

/// True if `flag` is set in `cc`.
#[inline]
#[must_use]
pub const fn is_set(cc: u8, flag: u8) -> bool {
    cc & flag != 0
}
