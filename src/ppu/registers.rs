use bitflags::bitflags;

use super::constants::*;

bitflags! {
    /// LCD Control (0xFF40).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Lcdc: u8 {
        const DISPLAY_ENABLE   = 1 << 7;
        const WINDOW_MAP_AREA  = 1 << 6; // 0=9800-9BFF, 1=9C00-9FFF
        const WINDOW_ENABLE    = 1 << 5;
        const TILE_DATA_AREA   = 1 << 4; // 0=8800-97FF (signed), 1=8000-8FFF
        const BG_MAP_AREA      = 1 << 3; // 0=9800-9BFF, 1=9C00-9FFF
        const OBJ_SIZE         = 1 << 2; // 0=8x8, 1=8x16
        const OBJ_ENABLE       = 1 << 1;
        const BG_WINDOW_ENABLE = 1 << 0; // Direct: BG/window on; extended: master priority
    }
}

bitflags! {
    /// Writable interrupt-source bits of LCD Status (0xFF41) plus the coincidence flag.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StatSources: u8 {
        const LYC_INTERRUPT    = 1 << 6;
        const OAM_INTERRUPT    = 1 << 5;
        const VBLANK_INTERRUPT = 1 << 4;
        const HBLANK_INTERRUPT = 1 << 3;
        const COINCIDENCE      = 1 << 2;
    }
}

bitflags! {
    /// Attribute byte shared by object table entries and bank-1 tile map entries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TileAttributes: u8 {
        const BG_PRIORITY = 1 << 7;
        const Y_FLIP      = 1 << 6;
        const X_FLIP      = 1 << 5;
        const DMG_PALETTE = 1 << 4; // Objects only: 0=OBP0, 1=OBP1
        const BANK        = 1 << 3;
        const PALETTE     = 0b0000_0111;
    }
}

impl TileAttributes {
    /// Extended-mode palette number (0-7).
    #[inline]
    pub fn palette(self) -> u8 {
        self.bits() & Self::PALETTE.bits()
    }

    /// Tile memory bank holding the tile data, only honoured in extended mode.
    #[inline]
    pub fn bank(self) -> usize {
        usize::from(self.contains(Self::BANK))
    }
}

/// Byte-sized PPU registers. Palette index/data pairs live with their CRAM in
/// `memory::PaletteRam`; DMA address registers live in `dma::Hdma`.
#[derive(Debug, Clone)]
pub struct Registers {
    pub lcdc: Lcdc,
    pub stat: StatSources, // Only the interrupt-source bits are stored
    pub scy: u8,
    pub scx: u8,
    pub lyc: u8,
    pub dma: u8, // Last value written to the OAM DMA register
    pub bgp: u8,
    pub obp0: u8,
    pub obp1: u8,
    pub wy: u8,
    pub wx: u8,
    pub graphics_mode: u8,
    pub opri: u8,
}

impl Registers {
    pub fn new() -> Self {
        Registers {
            lcdc: Lcdc::from_bits_retain(LCDC_DEFAULT),
            stat: StatSources::from_bits_truncate(STAT_DEFAULT & STAT_WRITABLE_MASK),
            scy: 0,
            scx: 0,
            lyc: 0,
            dma: DMA_DEFAULT,
            bgp: BGP_DEFAULT,
            obp0: OBP_DEFAULT,
            obp1: OBP_DEFAULT,
            wy: 0,
            wx: 0,
            graphics_mode: 0,
            opri: 0,
        }
    }

    /// Composes the STAT value seen on the bus.
    pub fn read_stat(&self, mode_bits: u8, coincidence: bool) -> u8 {
        let mut value = STAT_UNUSED_BIT | (self.stat.bits() & STAT_WRITABLE_MASK) | (mode_bits & 0b11);
        if coincidence {
            value |= StatSources::COINCIDENCE.bits();
        }
        value
    }

    /// Stores only the interrupt-enable bits; mode and coincidence are read-only.
    pub fn write_stat(&mut self, value: u8) {
        self.stat = StatSources::from_bits_truncate(value & STAT_WRITABLE_MASK);
    }

    #[inline]
    pub fn display_enabled(&self) -> bool {
        self.lcdc.contains(Lcdc::DISPLAY_ENABLE)
    }

    /// True when extended (colour) graphics are selected.
    #[inline]
    pub fn extended(&self) -> bool {
        self.graphics_mode != 0
    }

    /// Objects are ordered by X either in direct mode or when OPRI asks for it.
    #[inline]
    pub fn priority_by_x(&self) -> bool {
        !self.extended() || self.opri != 0
    }

    #[inline]
    pub fn object_height(&self) -> u8 {
        if self.lcdc.contains(Lcdc::OBJ_SIZE) { 16 } else { 8 }
    }

    #[inline]
    pub fn bg_map_base(&self) -> u16 {
        if self.lcdc.contains(Lcdc::BG_MAP_AREA) { TILE_MAP_1 } else { TILE_MAP_0 }
    }

    #[inline]
    pub fn window_map_base(&self) -> u16 {
        if self.lcdc.contains(Lcdc::WINDOW_MAP_AREA) { TILE_MAP_1 } else { TILE_MAP_0 }
    }

    /// Offset of a background/window tile row within a bank.
    ///
    /// With `TILE_DATA_AREA` clear the index is signed: 0-127 address the block at
    /// $9000, 128-255 the block at $8800 shared with object tiles.
    pub fn bg_tile_row_address(&self, tile_index: u8, row: u8) -> u16 {
        let tile_base = if self.lcdc.contains(Lcdc::TILE_DATA_AREA) {
            TILE_BLOCK_UNSIGNED + tile_index as u16 * BYTES_PER_TILE
        } else if tile_index < 128 {
            TILE_BLOCK_SIGNED_HIGH + tile_index as u16 * BYTES_PER_TILE
        } else {
            TILE_BLOCK_SHARED + (tile_index - 128) as u16 * BYTES_PER_TILE
        };
        tile_base + row as u16 * 2
    }

    /// Whether the window rectangle covers any part of `line`.
    pub fn window_visible_on(&self, line: u8) -> bool {
        if !self.lcdc.contains(Lcdc::WINDOW_ENABLE) {
            return false;
        }
        // In direct mode the window shares the BG enable bit.
        if !self.extended() && !self.lcdc.contains(Lcdc::BG_WINDOW_ENABLE) {
            return false;
        }
        self.wx <= WINDOW_X_MAX && (self.wy as usize) < GB_HEIGHT && line >= self.wy
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}
