use super::constants::*;
use super::registers::TileAttributes;

/// 160x144 packed RGBA (0xRRGGBBAA) pixels.
pub type FrameBuffer = [u32; FRAME_BUFFER_SIZE];

/// Two swappable 8KB tile/attribute banks.
///
/// The bus only sees the mapped bank; the pixel fetcher always reads tile
/// indices from bank 0 and attributes from bank 1.
#[derive(Clone)]
pub struct Vram {
    banks: Box<[[u8; VRAM_BANK_SIZE]; VRAM_BANK_COUNT]>,
    mapped: usize,
}

impl Vram {
    pub fn new() -> Self {
        Vram {
            banks: Box::new([[0; VRAM_BANK_SIZE]; VRAM_BANK_COUNT]),
            mapped: 0,
        }
    }

    pub fn clear(&mut self) {
        for bank in self.banks.iter_mut() {
            bank.fill(0);
        }
        self.mapped = 0;
    }

    #[inline]
    pub fn mapped_bank(&self) -> usize {
        self.mapped
    }

    pub fn select_bank(&mut self, value: u8) {
        self.mapped = (value & 1) as usize;
    }

    /// Internal read from an explicit bank. Offsets wrap within the bank.
    #[inline]
    pub fn read(&self, bank: usize, offset: u16) -> u8 {
        self.banks[bank & 1][offset as usize & (VRAM_BANK_SIZE - 1)]
    }

    #[inline]
    pub fn read_mapped(&self, offset: u16) -> u8 {
        self.read(self.mapped, offset)
    }

    /// Writes into the mapped bank. Returns `false` (and drops the byte) when the
    /// offset falls outside the bank.
    pub fn write_mapped(&mut self, offset: u16, value: u8) -> bool {
        match self.banks[self.mapped].get_mut(offset as usize) {
            Some(byte) => {
                *byte = value;
                true
            }
            None => false,
        }
    }

    pub fn bank(&self, bank: usize) -> &[u8; VRAM_BANK_SIZE] {
        &self.banks[bank & 1]
    }
}

/// One decoded object table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectEntry {
    pub y: u8, // Screen Y + 16
    pub x: u8, // Screen X + 8
    pub tile: u8,
    pub attributes: TileAttributes,
}

/// The 40-entry object attribute table.
#[derive(Clone)]
pub struct Oam {
    bytes: Box<[u8; OBJECT_COUNT * OBJECT_SIZE_BYTES]>,
}

impl Oam {
    pub fn new() -> Self {
        Oam {
            bytes: Box::new([0; OBJECT_COUNT * OBJECT_SIZE_BYTES]),
        }
    }

    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }

    #[inline]
    pub fn read(&self, offset: usize) -> u8 {
        self.bytes[offset % self.bytes.len()]
    }

    #[inline]
    pub fn write(&mut self, offset: usize, value: u8) {
        let len = self.bytes.len();
        self.bytes[offset % len] = value;
    }

    pub fn object(&self, index: usize) -> ObjectEntry {
        let base = (index % OBJECT_COUNT) * OBJECT_SIZE_BYTES;
        ObjectEntry {
            y: self.bytes[base],
            x: self.bytes[base + 1],
            tile: self.bytes[base + 2],
            attributes: TileAttributes::from_bits_retain(self.bytes[base + 3]),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..]
    }
}

/// 64 bytes of colour RAM with its auto-incrementing index register.
#[derive(Debug, Clone)]
pub struct PaletteRam {
    data: [u8; CRAM_SIZE],
    index: u8, // Bit 7 auto-increment, bits 0-5 byte offset
}

impl PaletteRam {
    pub fn new() -> Self {
        PaletteRam {
            data: [0; CRAM_SIZE],
            index: 0,
        }
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
        self.index = 0;
    }

    /// Index register as read from the bus; bit 6 is unused and reads 1.
    pub fn read_index(&self) -> u8 {
        self.index | 0x40
    }

    pub fn write_index(&mut self, value: u8) {
        self.index = value & (PALETTE_AUTO_INCREMENT | PALETTE_INDEX_MASK);
    }

    #[inline]
    fn offset(&self) -> usize {
        (self.index & PALETTE_INDEX_MASK) as usize
    }

    pub fn read_data(&self) -> u8 {
        self.data[self.offset()]
    }

    /// Stores `value` at the current offset when `accepted`, then steps the index
    /// if auto-increment is set, whether or not the byte was stored.
    pub fn write_data(&mut self, value: u8, accepted: bool) {
        if accepted {
            let offset = self.offset();
            self.data[offset] = value;
        }
        if self.index & PALETTE_AUTO_INCREMENT != 0 {
            let next = (self.index.wrapping_add(1)) & PALETTE_INDEX_MASK;
            self.index = PALETTE_AUTO_INCREMENT | next;
        }
    }

    /// Raw little-endian RGB555 value of `color` (0-3) in `palette` (0-7).
    #[inline]
    pub fn color(&self, palette: u8, color: u8) -> u16 {
        let offset = ((palette & 0x07) as usize * 4 + (color & 0x03) as usize) * 2;
        u16::from_le_bytes([self.data[offset], self.data[offset + 1]])
    }

    pub fn as_bytes(&self) -> &[u8; CRAM_SIZE] {
        &self.data
    }
}

impl Default for PaletteRam {
    fn default() -> Self {
        Self::new()
    }
}
