// Read-only ROM image shared by every layer sampler.
// Loaded once at startup; samplers borrow it for the whole run.

use std::fs;
use std::path::Path;

use crate::error::Error;

/// One LoROM/HiROM bank. Anything smaller can't be a cartridge dump.
pub const BANK_SIZE: usize = 0x8000;
/// Header some copier devices prepend to the dump.
pub const COPIER_HEADER_SIZE: usize = 512;

pub struct RomImage {
    bytes: Vec<u8>,
}

impl RomImage {
    /// Read the file and strip a copier header if one is present.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let data = fs::read(path).map_err(|e| Error::RomLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_bytes(data).map_err(|reason| Error::RomLoad { path: path.to_path_buf(), reason })
    }

    /// Build from raw bytes (already read from somewhere).
    pub fn from_bytes(mut data: Vec<u8>) -> Result<Self, String> {
        if data.len() % BANK_SIZE == COPIER_HEADER_SIZE {
            data.drain(..COPIER_HEADER_SIZE);
        }
        if data.len() < BANK_SIZE {
            return Err(format!("{} bytes is smaller than one {BANK_SIZE:#x}-byte bank", data.len()));
        }
        Ok(Self { bytes: data })
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// `len` bytes starting at `offset`, or None if that runs past the end.
    pub fn slice(&self, offset: usize, len: usize) -> Option<&[u8]> {
        let end = offset.checked_add(len)?;
        self.bytes.get(offset..end)
    }
}
