use super::constants::*;

/// Byte-stepped copy into the object table, triggered by a write to 0xFF46.
#[derive(Debug, Clone, Default)]
pub struct OamDma {
    source: u16,
    delay: u8,
    next: Option<u8>, // Index of the next byte to copy while a transfer runs
}

impl OamDma {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a transfer from `high << 8`. Re-triggering restarts it.
    pub fn start(&mut self, high: u8) {
        self.source = (high as u16) << 8;
        self.delay = OAM_DMA_DELAY_DOTS;
        self.next = None;
    }

    /// True once the arm delay has elapsed and bytes are being copied.
    #[inline]
    pub fn is_transferring(&self) -> bool {
        self.next.is_some()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.delay > 0 || self.next.is_some()
    }

    /// Advances one dot. Returns the source address and object table offset of the
    /// byte to copy on this dot, if any.
    pub fn step(&mut self) -> Option<(u16, usize)> {
        if self.delay > 0 {
            self.delay -= 1;
            if self.delay == 0 {
                self.next = Some(0);
            }
            return None;
        }

        let index = self.next?;
        self.next = if index + 1 < OAM_DMA_LENGTH { Some(index + 1) } else { None };
        Some((self.source.wrapping_add(index as u16), index as usize))
    }
}

/// Source, destination and pending length shared by general-purpose and
/// horizontal-blank transfers.
#[derive(Debug, Clone, Default)]
pub struct Hdma {
    source: u16,
    destination: u16, // Offset into the mapped tile memory bank
    remaining: u8,    // Blocks still to copy during HBlank; 0 when idle
}

/// One 16-byte block to copy, as resolved when the block starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmaBlock {
    pub source: u16,
    pub destination: u16,
}

impl Hdma {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_source_high(&mut self, value: u8) {
        self.source = (self.source & 0x00FF) | ((value as u16) << 8);
    }

    pub fn write_source_low(&mut self, value: u8) {
        self.source = (self.source & 0xFF00) | value as u16;
    }

    pub fn write_destination_high(&mut self, value: u8) {
        self.destination = (self.destination & 0x00FF) | ((value as u16) << 8);
    }

    pub fn write_destination_low(&mut self, value: u8) {
        self.destination = (self.destination & 0xFF00) | value as u16;
    }

    #[inline]
    fn aligned_source(&self) -> u16 {
        self.source & 0xFFF0
    }

    #[inline]
    fn aligned_destination(&self) -> u16 {
        self.destination & 0x1FF0
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }

    /// HDMA5 as read from the bus: 0xFF when idle, otherwise remaining blocks - 1
    /// with bit 7 clear.
    pub fn control(&self) -> u8 {
        if self.remaining == 0 {
            0xFF
        } else {
            (self.remaining - 1) & HDMA_LENGTH_MASK
        }
    }

    /// Handles a write to HDMA5. Returns the number of bytes the caller must copy
    /// right away (general-purpose mode), or 0 when an HBlank transfer was armed.
    pub fn start(&mut self, value: u8) -> u16 {
        let blocks = (value & HDMA_LENGTH_MASK) as u16 + 1;
        if value & HDMA_MODE_HBLANK != 0 {
            self.remaining = blocks as u8;
            0
        } else {
            self.remaining = 0;
            blocks * HDMA_BLOCK_SIZE
        }
    }

    /// Start of the current block; advances both addresses by `len` bytes.
    pub fn take(&mut self, len: u16) -> DmaBlock {
        let block = DmaBlock {
            source: self.aligned_source(),
            destination: self.aligned_destination(),
        };
        self.source = self.aligned_source().wrapping_add(len);
        self.destination = self.aligned_destination().wrapping_add(len);
        block
    }

    /// Claims the next HBlank block, if one is pending.
    pub fn next_block(&mut self) -> Option<DmaBlock> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.take(HDMA_BLOCK_SIZE))
    }
}
