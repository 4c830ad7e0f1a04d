//! The shared packet buffer: one fixed-capacity byte region, one in-flight
//! exchange at a time.

/// Maximum Ethernet frame the bridge carries (1500 byte MTU + header).
pub const PKT_BUF_SIZE: usize = 1514;

pub struct PktBuf {
    data: Vec<u8>,
    len: usize,
}

impl PktBuf {
    pub fn new() -> Self {
        Self::with_capacity(PKT_BUF_SIZE)
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            data: vec![0; cap],
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Mark `len` bytes as valid. Callers check against `capacity()` first;
    /// the engine rejects oversized requests before any transfer.
    pub fn set_len(&mut self, len: usize) {
        assert!(len <= self.data.len(), "packet length exceeds buffer");
        self.len = len;
    }

    /// The valid region (current packet).
    pub fn filled(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// The whole capacity, for filling or receiving into.
    pub fn storage_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl Default for PktBuf {
    fn default() -> Self {
        Self::new()
    }
}
