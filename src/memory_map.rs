// src/memory_map.rs

#![allow(dead_code)] // Allow unused constants for definition completeness

// --- Memory Regions ---
pub const ROM_START: u16 = 0x0000;
pub const ROM_END: u16 = 0x7FFF;
pub const ROM_SIZE: usize = (ROM_END - ROM_START) as usize + 1; // 32 KiB, banks 0 and 1

pub const VRAM_START: u16 = 0x8000;
pub const VRAM_END: u16 = 0x9FFF;
pub const VRAM_SIZE: usize = (VRAM_END - VRAM_START) as usize + 1; // 8 KiB per bank

pub const EXT_RAM_START: u16 = 0xA000;
pub const EXT_RAM_END: u16 = 0xBFFF;
pub const EXT_RAM_SIZE: usize = (EXT_RAM_END - EXT_RAM_START) as usize + 1; // 8 KiB

pub const WRAM_START: u16 = 0xC000;
pub const WRAM_END: u16 = 0xDFFF;
pub const WRAM_SIZE: usize = (WRAM_END - WRAM_START) as usize + 1; // 8 KiB

pub const ECHO_RAM_START: u16 = 0xE000;
pub const ECHO_RAM_END: u16 = 0xFDFF;

pub const OAM_START: u16 = 0xFE00;
pub const OAM_END: u16 = 0xFE9F;
pub const OAM_SIZE: usize = (OAM_END - OAM_START) as usize + 1; // 160 bytes, 40 objects

pub const NOT_USABLE_START: u16 = 0xFEA0;
pub const NOT_USABLE_END: u16 = 0xFEFF;

pub const IO_REGISTERS_START: u16 = 0xFF00;
pub const IO_REGISTERS_END: u16 = 0xFF7F;
pub const IO_REGISTERS_SIZE: usize = (IO_REGISTERS_END - IO_REGISTERS_START) as usize + 1;

pub const HRAM_START: u16 = 0xFF80;
pub const HRAM_END: u16 = 0xFFFE;
pub const HRAM_SIZE: usize = (HRAM_END - HRAM_START) as usize + 1; // 127 bytes

pub const INTERRUPT_ENABLE_REGISTER: u16 = 0xFFFF;

// --- Interrupt Flag Register ---
pub const IF_ADDR: u16 = 0xFF0F;

// --- LCD Registers ---
pub const LCDC_ADDR: u16 = 0xFF40; // LCD Control (R/W)
pub const STAT_ADDR: u16 = 0xFF41; // LCD Status (R/W, bits 0-2 read-only)
pub const SCY_ADDR: u16 = 0xFF42; // Scroll Y (R/W)
pub const SCX_ADDR: u16 = 0xFF43; // Scroll X (R/W)
pub const LY_ADDR: u16 = 0xFF44; // Current scanline (R)
pub const LYC_ADDR: u16 = 0xFF45; // LY Compare (R/W)
pub const DMA_ADDR: u16 = 0xFF46; // OAM DMA source high byte (W triggers)
pub const BGP_ADDR: u16 = 0xFF47; // BG palette, direct mode (R/W)
pub const OBP0_ADDR: u16 = 0xFF48; // Object palette 0, direct mode (R/W)
pub const OBP1_ADDR: u16 = 0xFF49; // Object palette 1, direct mode (R/W)
pub const WY_ADDR: u16 = 0xFF4A; // Window Y position (R/W)
pub const WX_ADDR: u16 = 0xFF4B; // Window X position plus 7 (R/W)
pub const GRAPHICS_MODE_ADDR: u16 = 0xFF4C; // 0 = direct, nonzero = extended (R/W)
pub const VBK_ADDR: u16 = 0xFF4F; // VRAM bank select (R/W)

// --- Extended-Mode DMA Registers ---
pub const HDMA1_ADDR: u16 = 0xFF51; // Source high (W)
pub const HDMA2_ADDR: u16 = 0xFF52; // Source low (W)
pub const HDMA3_ADDR: u16 = 0xFF53; // Destination high (W)
pub const HDMA4_ADDR: u16 = 0xFF54; // Destination low (W)
pub const HDMA5_ADDR: u16 = 0xFF55; // Length/mode/start (R/W)

// --- Extended-Mode Palette Registers ---
pub const BCPS_ADDR: u16 = 0xFF68; // BG palette index (R/W)
pub const BCPD_ADDR: u16 = 0xFF69; // BG palette data (R/W)
pub const OCPS_ADDR: u16 = 0xFF6A; // Object palette index (R/W)
pub const OCPD_ADDR: u16 = 0xFF6B; // Object palette data (R/W)
pub const OPRI_ADDR: u16 = 0xFF6C; // Object priority mode (R/W)

// --- Interrupt Bits (for IF Register 0xFF0F and IE Register 0xFFFF) ---
pub const VBLANK_INTERRUPT_BIT: u8 = 0; // V-Blank Interrupt
pub const LCD_STAT_INTERRUPT_BIT: u8 = 1; // LCD STAT Interrupt
