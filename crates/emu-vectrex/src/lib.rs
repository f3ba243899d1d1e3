//! Cycle-accurate GCE Vectrex emulator.
//!
//! The master clock ticks at CPU cycle rate (1.5 MHz). After every CPU
//! instruction the VIA and the analog beam hardware are stepped once per
//! elapsed cycle. A host frame is 20 ms (30,000 cycles); the draw list is
//! rasterised every 50,000 cycles, matching 30 Hz phosphor decay.

pub mod analog;
pub mod audio;
mod bus;
#[cfg(feature = "native")]
pub mod capture;
pub mod config;
pub mod display;
pub mod input;
mod memory;
pub mod rom;
pub mod session;
pub mod vectors;
mod vectrex;

pub use audio::{AudioStream, AudioTap};
pub use bus::{PSG_PORT_A, VectrexBus};
pub use config::VectrexConfig;
pub use display::{Display, InitError, Line};
pub use input::{InputQueue, InputState, VectrexKey};
pub use memory::VectrexMemory;
pub use rom::LoadError;
pub use session::{CpuView, DebugCommand, Host, Session};
pub use vectors::{Segment, SegmentLists};
pub use vectrex::Vectrex;
