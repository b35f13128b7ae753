// src/ppu/constants.rs

#![allow(dead_code)] // Allow unused constants for definition completeness

// --- Screen Dimensions ---
pub const GB_WIDTH: usize = 160;
pub const GB_HEIGHT: usize = 144;
pub const FRAME_BUFFER_SIZE: usize = GB_WIDTH * GB_HEIGHT;

// --- Tile Debug View Constants ---
pub const TILES_PER_ROW_DEBUG: usize = 16;
pub const NUM_TILES_TO_SHOW: usize = 384; // 256 tiles in $8000-$8FFF, 128 in $9000-$97FF
const TILE_DEBUG_TILE_HEIGHT: usize = NUM_TILES_TO_SHOW / TILES_PER_ROW_DEBUG;
pub const TILE_DEBUG_WIDTH: usize = TILES_PER_ROW_DEBUG * 8;
pub const TILE_DEBUG_HEIGHT: usize = TILE_DEBUG_TILE_HEIGHT * 8;
pub const TILE_DEBUG_BUFFER_SIZE: usize = TILE_DEBUG_WIDTH * TILE_DEBUG_HEIGHT;

// --- PPU Timing Constants (in dots) ---
pub const DOTS_PER_SCANLINE: u16 = 456;
pub const SCANLINES_PER_FRAME: u8 = 154; // 144 visible + 10 VBlank
pub const VBLANK_LINES: u8 = SCANLINES_PER_FRAME - GB_HEIGHT as u8;
pub const DOTS_PER_FRAME: u32 = DOTS_PER_SCANLINE as u32 * SCANLINES_PER_FRAME as u32; // 70224

pub const MODE2_OAM_SCAN_DOTS: u16 = 80;
pub const MODE3_MIN_DOTS: u16 = 172;
pub const MODE3_MAX_DOTS: u16 = 289;

/// Stall applied the first time an object's row is fetched on a scanline.
pub const OBJECT_FETCH_PENALTY_DOTS: u8 = 6;

// --- Pixel Pipeline ---
pub const FIFO_CAPACITY: usize = 32;
/// The shifter only outputs while the FIFO holds more than this many pixels,
/// and the fetcher only pushes while it holds at most this many.
pub const FIFO_LOW_WATER: usize = 8;
pub const OBJECTS_PER_PIXEL: usize = 3;

// --- Object Table ---
pub const OBJECT_COUNT: usize = 40;
pub const OBJECT_SIZE_BYTES: usize = 4;
pub const MAX_OBJECTS_PER_LINE: usize = 10;
pub const OBJECT_Y_BIAS: i16 = 16;
pub const OBJECT_X_BIAS: i16 = 8;

// --- Window ---
pub const WINDOW_X_BIAS: u8 = 7;
pub const WINDOW_X_MAX: u8 = 166;

// --- Tile/Attribute Memory Layout (offsets into a bank) ---
pub const VRAM_BANK_SIZE: usize = 0x2000;
pub const VRAM_BANK_COUNT: usize = 2;
pub const TILE_BLOCK_UNSIGNED: u16 = 0x0000; // $8000
pub const TILE_BLOCK_SIGNED_HIGH: u16 = 0x1000; // $9000, indices 0-127 in signed mode
pub const TILE_BLOCK_SHARED: u16 = 0x0800; // $8800, indices 128-255 in signed mode
pub const TILE_MAP_0: u16 = 0x1800; // $9800
pub const TILE_MAP_1: u16 = 0x1C00; // $9C00
pub const BYTES_PER_TILE: u16 = 16;

// --- Palette RAM ---
pub const CRAM_SIZE: usize = 64; // 8 palettes * 4 colors * 2 bytes
pub const PALETTE_INDEX_MASK: u8 = 0x3F;
pub const PALETTE_AUTO_INCREMENT: u8 = 0x80;

// --- DMA ---
pub const OAM_DMA_DELAY_DOTS: u8 = 2;
pub const OAM_DMA_LENGTH: u8 = 160;
pub const HDMA_BLOCK_SIZE: u16 = 16;
pub const HDMA_MODE_HBLANK: u8 = 0x80;
pub const HDMA_LENGTH_MASK: u8 = 0x7F;

// --- Power-on Register Values ---
pub const LCDC_DEFAULT: u8 = 0x91;
pub const STAT_DEFAULT: u8 = 0x80; // No sources enabled; mode/coincidence bits are computed
pub const BGP_DEFAULT: u8 = 0xFC;
pub const OBP_DEFAULT: u8 = 0xFF;
pub const DMA_DEFAULT: u8 = 0xFF;

// --- STAT Write Mask ---
pub const STAT_WRITABLE_MASK: u8 = 0b0111_1000;
pub const STAT_UNUSED_BIT: u8 = 0b1000_0000;
