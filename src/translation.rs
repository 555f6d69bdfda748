use crate::error::{Result, SimError};

/// A process-relative address split into page number and offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualAddress {
    pub raw: u64,
    pub page: usize,
    pub offset: usize,
}

impl VirtualAddress {
    /// Decompose a raw address for the given page size
    pub fn from_raw(raw: u64, page_size: usize) -> Self {
        let page_size = page_size as u64;
        VirtualAddress {
            raw,
            page: (raw / page_size) as usize,
            offset: (raw % page_size) as usize,
        }
    }

    /// Like `from_raw`, but for untrusted signed input
    pub fn new(raw: i64, page_size: usize) -> Result<Self> {
        if raw < 0 {
            return Err(SimError::InvalidAddress(raw));
        }
        Ok(Self::from_raw(raw as u64, page_size))
    }
}

impl std::fmt::Display for VirtualAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:04X} (p={}, w={})", self.raw, self.page, self.offset)
    }
}

/// Page number holding `address`; negative addresses are rejected
pub fn address_to_page_number(address: i64, page_size: usize) -> Result<usize> {
    VirtualAddress::new(address, page_size).map(|va| va.page)
}
