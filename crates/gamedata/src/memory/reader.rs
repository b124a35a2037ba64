use crate::error::{Error, Result};

/// Read-only view of memory that resolved addresses point into.
pub trait ReadMemory {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>>;

    fn read_i32(&self, address: u64) -> Result<i32> {
        let bytes = self.read_bytes(address, 4)?;
        Ok(i32::from_le_bytes(to_array(address, bytes)?))
    }

    fn read_u32(&self, address: u64) -> Result<u32> {
        let bytes = self.read_bytes(address, 4)?;
        Ok(u32::from_le_bytes(to_array(address, bytes)?))
    }

    fn read_u64(&self, address: u64) -> Result<u64> {
        let bytes = self.read_bytes(address, 8)?;
        Ok(u64::from_le_bytes(to_array(address, bytes)?))
    }

    /// Read a pointer of `width` bytes (4 or 8), zero-extended.
    fn read_pointer(&self, address: u64, width: usize) -> Result<u64> {
        match width {
            8 => self.read_u64(address),
            4 => self.read_u32(address).map(u64::from),
            _ => Err(Error::MemoryReadFailed {
                address,
                message: format!("unsupported pointer width {}", width),
            }),
        }
    }
}

fn to_array<const N: usize>(address: u64, bytes: Vec<u8>) -> Result<[u8; N]> {
    let len = bytes.len();
    bytes.try_into().map_err(|_| Error::MemoryReadFailed {
        address,
        message: format!("short read: expected {} bytes, got {}", N, len),
    })
}
