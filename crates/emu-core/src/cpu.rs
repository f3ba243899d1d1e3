//! CPU core trait.

use crate::Bus;

/// A CPU core.
///
/// CPUs execute instructions and access memory through a bus. The bus is
/// passed in, not owned, so the machine can step its other components
/// between instructions. Each `step` runs exactly one instruction (or one
/// interrupt entry) and reports the clock cycles it consumed, which the
/// machine then replays on its peripherals.
///
/// CPUs expose their internal state for observation and debugging.
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// Execute one instruction.
    ///
    /// `irq` and `firq` are the levels of the maskable interrupt lines at
    /// the instruction boundary (true = asserted). Returns the number of
    /// clock cycles consumed.
    fn step<B: Bus>(&mut self, bus: &mut B, irq: bool, firq: bool) -> u32;

    /// Returns the current program counter.
    ///
    /// Returns `u32` to support all CPU address widths. Narrower CPUs
    /// zero-extend.
    fn pc(&self) -> u32;

    /// Returns a snapshot of all registers for inspection.
    fn registers(&self) -> Self::Registers;

    /// Returns true if the CPU is waiting for an interrupt.
    fn is_waiting(&self) -> bool;

    /// Reset the CPU to its initial state and fetch the reset vector.
    fn reset<B: Bus>(&mut self, bus: &mut B);
}
