//! 6809 register set.

use crate::flags::{F, I};

/// 6809 registers.
///
/// A and B pair up as the 16-bit accumulator D (A is the high byte).
/// S is the hardware stack used by interrupts and subroutine calls; U is
/// the user stack, only touched by PSHU/PULU and indexed addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    pub b: u8,
    pub x: u16,
    pub y: u16,
    /// User stack pointer.
    pub u: u16,
    /// Hardware stack pointer.
    pub s: u16,
    pub pc: u16,
    /// Direct page register (high byte of direct addresses).
    pub dp: u8,
    /// Condition codes.
    pub cc: u8,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    /// Registers in their reset state: everything zero, IRQ and FIRQ masked.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            a: 0,
            b: 0,
            x: 0,
            y: 0,
            u: 0,
            s: 0,
            pc: 0,
            dp: 0,
            cc: I | F,
        }
    }

    /// The D accumulator (A:B).
    #[must_use]
    pub const fn d(&self) -> u16 {
        (self.a as u16) << 8 | self.b as u16
    }

    pub fn set_d(&mut self, value: u16) {
        self.a = (value >> 8) as u8;
        self.b = value as u8;
    }

    /// Read a register by id, zero-extending the 8-bit ones.
    #[must_use]
    pub const fn get(&self, id: RegisterId) -> u16 {
        match id {
            RegisterId::Pc => self.pc,
            RegisterId::X => self.x,
            RegisterId::Y => self.y,
            RegisterId::A => self.a as u16,
            RegisterId::B => self.b as u16,
            RegisterId::S => self.s,
            RegisterId::U => self.u,
            RegisterId::Dp => self.dp as u16,
            RegisterId::Cc => self.cc as u16,
            RegisterId::D => self.d(),
        }
    }
}

/// Register selector for diagnostic reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterId {
    Pc,
    X,
    Y,
    A,
    B,
    /// Hardware stack pointer.
    S,
    /// User stack pointer.
    U,
    Dp,
    Cc,
    D,
}

impl RegisterId {
    /// Map a host register code to an id.
    ///
    /// Codes follow the host debug view ordering: PC, X, Y, A, B, hardware
    /// stack, user stack, DP, CC.
    #[must_use]
    pub const fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => Self::Pc,
            1 => Self::X,
            2 => Self::Y,
            3 => Self::A,
            4 => Self::B,
            5 => Self::S,
            6 => Self::U,
            7 => Self::Dp,
            8 => Self::Cc,
            _ => return None,
        })
    }
}
