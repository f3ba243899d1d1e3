//! Core traits and types for cycle-synchronised emulation.
//!
//! Every component advances in lockstep with the CPU clock. The CPU runs
//! one instruction at a time and reports how many cycles it consumed; the
//! machine then steps its peripherals that many times.

mod bus;
mod clock;
mod cpu;
mod observable;
mod ticks;

pub use bus::{Bus, SimpleBus};
pub use clock::MasterClock;
pub use cpu::Cpu;
pub use observable::{Observable, Value};
pub use ticks::Ticks;
