use crate::error::{Error, Result};

use super::ReadMemory;

/// Reads memory of the current process through raw pointers.
///
/// This is the view a host running inside the target process hands to the
/// resolver, where resolved addresses are live pointers into loaded modules.
#[derive(Debug)]
pub struct ProcessMemory {
    _private: (),
}

impl ProcessMemory {
    /// # Safety
    ///
    /// Every range later passed to [`ReadMemory::read_bytes`] must be mapped and
    /// readable for the lifetime of this value. The resolver only reads at
    /// addresses derived from the configured actions, so the document must be
    /// trusted to describe the loaded modules.
    pub unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl ReadMemory for ProcessMemory {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        if address == 0 {
            return Err(Error::MemoryReadFailed {
                address,
                message: "null pointer".to_string(),
            });
        }

        let source = usize::try_from(address).map_err(|_| Error::MemoryReadFailed {
            address,
            message: "address exceeds the pointer width".to_string(),
        })? as *const u8;

        let mut buffer = vec![0u8; size];
        // SAFETY: the constructor's contract guarantees `source..source + size`
        // is readable, and `buffer` is a fresh allocation of `size` bytes.
        unsafe {
            std::ptr::copy_nonoverlapping(source, buffer.as_mut_ptr(), size);
        }
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_local_memory() {
        let data: [u32; 2] = [0xDEAD_BEEF, 0x0BAD_F00D];
        let memory = unsafe { ProcessMemory::new() };
        let address = data.as_ptr() as u64;

        assert_eq!(memory.read_u32(address).unwrap(), 0xDEAD_BEEF);
        assert_eq!(memory.read_u32(address + 4).unwrap(), 0x0BAD_F00D);
    }

    #[test]
    fn test_null_is_rejected() {
        let memory = unsafe { ProcessMemory::new() };
        assert!(memory.read_bytes(0, 4).is_err());
    }
}
