//! ALU operations for the 6809.
//!
//! Each function returns its result and updates the affected bits of the
//! condition code register in place. Bits an operation does not touch are
//! left alone.

use crate::flags::{self, C, H, N, V, Z};

/// Carry out of bit 7 given both operands and the 8-bit result.
#[inline]
fn carry7(i0: u8, i1: u8, r: u8) -> bool {
    (((i0 | i1) & !r) | (i0 & i1)) & 0x80 != 0
}

/// Signed overflow: operands share a sign that the result does not.
#[inline]
fn overflow7(i0: u8, i1: u8, r: u8) -> bool {
    (!(i0 ^ i1) & (i0 ^ r)) & 0x80 != 0
}

#[inline]
fn nz8(cc: &mut u8, r: u8) {
    flags::set(cc, N, r & 0x80 != 0);
    flags::set(cc, Z, r == 0);
}

#[inline]
fn nz16(cc: &mut u8, r: u16) {
    flags::set(cc, N, r & 0x8000 != 0);
    flags::set(cc, Z, r == 0);
}

/// Core adder shared by the add, subtract and negate forms.
fn adder(cc: &mut u8, i0: u8, i1: u8, carry_in: bool) -> u8 {
    let r = i0.wrapping_add(i1).wrapping_add(u8::from(carry_in));
    flags::set(cc, H, carry7(i0 << 4, i1 << 4, r << 4));
    nz8(cc, r);
    flags::set(cc, V, overflow7(i0, i1, r));
    flags::set(cc, C, carry7(i0, i1, r));
    r
}

/// ADD: `a + b`.
pub fn add8(cc: &mut u8, a: u8, b: u8) -> u8 {
    adder(cc, a, b, false)
}

/// ADC: `a + b + C`.
pub fn adc8(cc: &mut u8, a: u8, b: u8) -> u8 {
    let carry = flags::is_set(*cc, C);
    adder(cc, a, b, carry)
}

/// SUB and CMP: `a - b`. C is set on borrow.
pub fn sub8(cc: &mut u8, a: u8, b: u8) -> u8 {
    let r = adder(cc, a, !b, true);
    *cc ^= C;
    r
}

/// SBC: `a - b - C`.
pub fn sbc8(cc: &mut u8, a: u8, b: u8) -> u8 {
    let borrow = flags::is_set(*cc, C);
    let r = adder(cc, a, !b, !borrow);
    *cc ^= C;
    r
}

/// NEG: two's complement negate.
pub fn neg(cc: &mut u8, value: u8) -> u8 {
    sub8(cc, 0, value)
}

/// COM: one's complement. V cleared, C set.
pub fn com(cc: &mut u8, value: u8) -> u8 {
    let r = !value;
    nz8(cc, r);
    flags::set(cc, V, false);
    flags::set(cc, C, true);
    r
}

/// LSR: logical shift right, bit 0 into C.
pub fn lsr(cc: &mut u8, value: u8) -> u8 {
    let r = value >> 1;
    flags::set(cc, C, value & 0x01 != 0);
    nz8(cc, r);
    r
}

/// ROR: rotate right through carry.
pub fn ror(cc: &mut u8, value: u8) -> u8 {
    let carry_in = if flags::is_set(*cc, C) { 0x80 } else { 0 };
    let r = (value >> 1) | carry_in;
    flags::set(cc, C, value & 0x01 != 0);
    nz8(cc, r);
    r
}

/// ASR: arithmetic shift right, sign preserved.
pub fn asr(cc: &mut u8, value: u8) -> u8 {
    let r = (value >> 1) | (value & 0x80);
    flags::set(cc, C, value & 0x01 != 0);
    nz8(cc, r);
    r
}

/// ASL/LSL: shift left, computed as `value + value`.
pub fn asl(cc: &mut u8, value: u8) -> u8 {
    adder(cc, value, value, false)
}

/// ROL: rotate left through carry. H is not affected.
pub fn rol(cc: &mut u8, value: u8) -> u8 {
    let r = (value << 1) | u8::from(flags::is_set(*cc, C));
    nz8(cc, r);
    flags::set(cc, V, overflow7(value, value, r));
    flags::set(cc, C, value & 0x80 != 0);
    r
}

/// DEC: C is not affected.
pub fn dec(cc: &mut u8, value: u8) -> u8 {
    let r = value.wrapping_sub(1);
    nz8(cc, r);
    flags::set(cc, V, value == 0x80);
    r
}

/// INC: C is not affected.
pub fn inc(cc: &mut u8, value: u8) -> u8 {
    let r = value.wrapping_add(1);
    nz8(cc, r);
    flags::set(cc, V, value == 0x7F);
    r
}

/// TST and the flag side of loads/stores: N, Z from the value, V cleared.
pub fn tst8(cc: &mut u8, value: u8) -> u8 {
    nz8(cc, value);
    flags::set(cc, V, false);
    value
}

/// 16-bit loads/stores: N, Z from the value, V cleared.
pub fn tst16(cc: &mut u8, value: u16) -> u16 {
    nz16(cc, value);
    flags::set(cc, V, false);
    value
}

/// CLR: always zero.
pub fn clr(cc: &mut u8) -> u8 {
    flags::set(cc, N, false);
    flags::set(cc, Z, true);
    flags::set(cc, V, false);
    flags::set(cc, C, false);
    0
}

pub fn and(cc: &mut u8, a: u8, b: u8) -> u8 {
    tst8(cc, a & b)
}

pub fn or(cc: &mut u8, a: u8, b: u8) -> u8 {
    tst8(cc, a | b)
}

pub fn eor(cc: &mut u8, a: u8, b: u8) -> u8 {
    tst8(cc, a ^ b)
}

/// ADDD: 16-bit add. V and C come from the high byte carry chain.
pub fn add16(cc: &mut u8, a: u16, b: u16) -> u16 {
    let (r, carry) = a.overflowing_add(b);
    nz16(cc, r);
    flags::set(cc, V, overflow7((a >> 8) as u8, (b >> 8) as u8, (r >> 8) as u8));
    flags::set(cc, C, carry);
    r
}

/// SUBD and the 16-bit compares.
pub fn sub16(cc: &mut u8, a: u16, b: u16) -> u16 {
    let (r, borrow) = a.overflowing_sub(b);
    nz16(cc, r);
    flags::set(
        cc,
        V,
        overflow7((a >> 8) as u8, !(b >> 8) as u8, (r >> 8) as u8),
    );
    flags::set(cc, C, borrow);
    r
}

/// MUL: unsigned `a * b`. C mirrors bit 7 of the low byte.
pub fn mul(cc: &mut u8, a: u8, b: u8) -> u16 {
    let r = u16::from(a) * u16::from(b);
    flags::set(cc, Z, r == 0);
    flags::set(cc, C, r & 0x80 != 0);
    r
}

/// DAA: decimal-adjust A after a BCD addition.
pub fn daa(cc: &mut u8, a: u8) -> u8 {
    let lsn = a & 0x0F;
    let msn = a & 0xF0;
    let mut correction = 0u8;

    if lsn > 0x09 || flags::is_set(*cc, H) {
        correction |= 0x06;
    }
    if (msn > 0x80 && lsn > 0x09) || msn > 0x90 || flags::is_set(*cc, C) {
        correction |= 0x60;
    }

    let r = a.wrapping_add(correction);
    nz8(cc, r);
    flags::set(cc, V, false);
    // Carry is sticky: a set C is never cleared by the adjustment.
    if carry7(a, correction, r) {
        *cc |= C;
    }
    r
}
