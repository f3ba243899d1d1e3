//! Motorola 6809 CPU emulator.
//!
//! Each call to `step()` executes one instruction (plus any interrupt entry
//! that precedes it) and returns the number of clock cycles it took. The
//! machine replays those cycles on its peripherals afterwards, so bus
//! accesses within an instruction are not individually timed.

pub mod alu;
mod cpu;
pub mod flags;
mod registers;

pub use cpu::{M6809, WaitState};
pub use registers::{RegisterId, Registers};
