//! ROM and cartridge image loading.
//!
//! The system ROM must be exactly 8 KiB. Cartridges are up to 32 KiB;
//! shorter images are zero-padded, longer ones are cut at 32 KiB.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use crate::config::{CARTRIDGE_SIZE, ROM_SIZE};

/// Failure to load a ROM or cartridge image.
#[derive(Debug)]
pub enum LoadError {
    /// The file could not be opened or read.
    Io(io::Error),
    /// The image is shorter than the required size.
    Truncated { expected: usize, actual: usize },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Truncated { expected, actual } => write!(
                f,
                "image truncated: {actual} bytes (expected {expected})"
            ),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Truncated { .. } => None,
        }
    }
}

impl From<io::Error> for LoadError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Validate a system ROM image.
pub fn rom_from_bytes(data: &[u8]) -> Result<Vec<u8>, LoadError> {
    if data.len() < ROM_SIZE {
        return Err(LoadError::Truncated {
            expected: ROM_SIZE,
            actual: data.len(),
        });
    }
    if data.len() > ROM_SIZE {
        log::warn!(
            "system ROM is {} bytes, using the first {ROM_SIZE}",
            data.len()
        );
    }
    Ok(data[..ROM_SIZE].to_vec())
}

/// Normalise a cartridge image to exactly 32 KiB.
#[must_use]
pub fn cartridge_from_bytes(data: &[u8]) -> Vec<u8> {
    if data.len() > CARTRIDGE_SIZE {
        log::warn!(
            "cartridge is {} bytes, truncating to {CARTRIDGE_SIZE}",
            data.len()
        );
    }
    let mut image = vec![0; CARTRIDGE_SIZE];
    let len = data.len().min(CARTRIDGE_SIZE);
    image[..len].copy_from_slice(&data[..len]);
    image
}

/// Read and validate a system ROM file.
pub fn load_rom(path: &Path) -> Result<Vec<u8>, LoadError> {
    let data = fs::read(path)?;
    rom_from_bytes(&data)
}

/// Read a cartridge file, padded or truncated to 32 KiB.
pub fn load_cartridge(path: &Path) -> Result<Vec<u8>, LoadError> {
    let data = fs::read(path)?;
    Ok(cartridge_from_bytes(&data))
}
