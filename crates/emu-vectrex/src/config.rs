//! Vectrex configuration: ROM images and audio rate.

/// System ROM size (mapped at $E000-$FFFF).
pub const ROM_SIZE: usize = 0x2000;

/// Cartridge window size (mapped at $0000-$7FFF).
pub const CARTRIDGE_SIZE: usize = 0x8000;

/// CPU clock (1.5 MHz).
pub const CPU_FREQUENCY: u64 = 1_500_000;

/// Phosphor decay rate: the display is redrawn this many times a second.
pub const PHOSPHOR_DECAY_HZ: u64 = 30;

/// Host frame period in milliseconds.
pub const FRAME_MILLIS: u64 = 20;

/// Default audio sample rate.
pub const DEFAULT_SAMPLE_RATE: u32 = 22_050;

/// Configuration for constructing a Vectrex instance.
#[derive(Debug, Clone)]
pub struct VectrexConfig {
    /// System ROM (8,192 bytes). Shorter images are zero-filled.
    pub rom: Vec<u8>,
    /// Cartridge image (up to 32,768 bytes). `None` leaves the slot empty.
    pub cartridge: Option<Vec<u8>>,
    /// Audio output rate in Hz.
    pub sample_rate: u32,
}

impl VectrexConfig {
    /// Configuration with the given system ROM, no cartridge and the
    /// default sample rate.
    #[must_use]
    pub fn new(rom: Vec<u8>) -> Self {
        Self {
            rom,
            cartridge: None,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }

    /// Audio samples produced per host frame.
    #[must_use]
    pub fn samples_per_frame(&self) -> usize {
        (u64::from(self.sample_rate) * FRAME_MILLIS / 1000) as usize
    }
}
