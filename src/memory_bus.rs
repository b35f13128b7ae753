use std::fmt;

use log::{info, warn};

use crate::memory_map::*;
use crate::ppu::{FrameBuffer, Interrupt, Ppu, PpuHost};

/// Everything in the address space that is not the PPU.
///
/// ## Simplifications:
/// - No MBC (Memory Bank Controller) logic. Assumes a fixed 32KB ROM map
///   and 8KB of external RAM.
/// - No CGB WRAM bank switching.
/// - Non-PPU I/O registers are simple memory locations; writes have no side effects.
/// - "Not Usable" memory and the object table read 0xFF from this side.
#[derive(Clone)]
pub struct HostMemory {
    rom: Box<[u8; ROM_SIZE]>,                   // 0000-7FFF (Cartridge ROM)
    external_ram: Box<[u8; EXT_RAM_SIZE]>,      // A000-BFFF (Cartridge RAM)
    wram: Box<[u8; WRAM_SIZE]>,                 // C000-DFFF (Work RAM)
    io_registers: Box<[u8; IO_REGISTERS_SIZE]>, // FF00-FF7F, minus the PPU's registers
    hram: Box<[u8; HRAM_SIZE]>,                 // FF80-FFFE (High RAM)
    interrupt_enable: u8,                       // FFFF
    frames: u64,
}

impl HostMemory {
    pub fn new() -> Self {
        HostMemory {
            rom: Box::new([0; ROM_SIZE]),
            external_ram: Box::new([0; EXT_RAM_SIZE]),
            wram: Box::new([0; WRAM_SIZE]),
            io_registers: Box::new([0; IO_REGISTERS_SIZE]),
            hram: Box::new([0; HRAM_SIZE]),
            interrupt_enable: 0,
            frames: 0,
        }
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            ROM_START..=ROM_END => self.rom[(addr - ROM_START) as usize],
            EXT_RAM_START..=EXT_RAM_END => self.external_ram[(addr - EXT_RAM_START) as usize],
            WRAM_START..=WRAM_END => self.wram[(addr - WRAM_START) as usize],
            // Echo RAM (Mirror of C000-DDFF)
            ECHO_RAM_START..=ECHO_RAM_END => self.read(addr - 0x2000),
            IO_REGISTERS_START..=IO_REGISTERS_END => self.io_registers[(addr - IO_REGISTERS_START) as usize],
            HRAM_START..=HRAM_END => self.hram[(addr - HRAM_START) as usize],
            INTERRUPT_ENABLE_REGISTER => self.interrupt_enable,
            // VRAM, OAM and the unusable gap belong to the PPU or nobody.
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            ROM_START..=ROM_END => {} // Writes to ROM are ignored
            EXT_RAM_START..=EXT_RAM_END => self.external_ram[(addr - EXT_RAM_START) as usize] = value,
            WRAM_START..=WRAM_END => self.wram[(addr - WRAM_START) as usize] = value,
            ECHO_RAM_START..=ECHO_RAM_END => self.write(addr - 0x2000, value),
            IO_REGISTERS_START..=IO_REGISTERS_END => {
                self.io_registers[(addr - IO_REGISTERS_START) as usize] = value
            }
            HRAM_START..=HRAM_END => self.hram[(addr - HRAM_START) as usize] = value,
            INTERRUPT_ENABLE_REGISTER => self.interrupt_enable = value,
            _ => {}
        }
    }

    /// Number of frames delivered by the PPU so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Default for HostMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl PpuHost for HostMemory {
    fn read_byte(&self, addr: u16) -> u8 {
        self.read(addr)
    }

    fn request_interrupt(&mut self, interrupt: Interrupt) {
        let offset = (IF_ADDR - IO_REGISTERS_START) as usize;
        self.io_registers[offset] |= 1 << interrupt.bit();
    }

    fn frame_rendered(&mut self, _frame: &FrameBuffer) {
        self.frames += 1;
    }
}

/// True for addresses served by the PPU's own bus surface.
fn is_ppu_address(addr: u16) -> bool {
    matches!(
        addr,
        VRAM_START..=VRAM_END
            | OAM_START..=OAM_END
            | LCDC_ADDR..=GRAPHICS_MODE_ADDR
            | VBK_ADDR
            | HDMA1_ADDR..=HDMA5_ADDR
            | BCPS_ADDR..=OPRI_ADDR
    )
}

/// Represents the Game Boy's memory map, with the PPU owning its slice of it.
pub struct MemoryBus {
    pub ppu: Ppu,
    host: HostMemory,
}

impl MemoryBus {
    /// Creates a new `MemoryBus` instance with all RAM initialized to zero.
    /// ROM is initialized to zero until loaded.
    pub fn new() -> Self {
        MemoryBus {
            ppu: Ppu::new(),
            host: HostMemory::new(),
        }
    }

    /// Loads the first 32KB (banks 0 and 1) of a ROM image.
    pub fn load_rom(&mut self, rom_data: &[u8]) -> Result<(), String> {
        if rom_data.len() < ROM_SIZE {
            return Err(format!(
                "ROM is too small: {} bytes, minimum is {} bytes",
                rom_data.len(),
                ROM_SIZE
            ));
        }
        self.host.rom.copy_from_slice(&rom_data[..ROM_SIZE]);
        info!("Loaded ROM: {} bytes (using first 32KB)", rom_data.len());
        Ok(())
    }

    /// Reads a byte from the specified memory address.
    pub fn read_byte(&self, addr: u16) -> u8 {
        if !is_ppu_address(addr) {
            return self.host.read(addr);
        }
        self.ppu.read_byte(addr).unwrap_or_else(|e| {
            warn!("{}", e);
            0xFF
        })
    }

    /// Writes a byte to the specified memory address.
    pub fn write_byte(&mut self, addr: u16, value: u8) {
        if !is_ppu_address(addr) {
            self.host.write(addr, value);
            return;
        }
        if let Err(e) = self.ppu.write_byte(addr, value, &self.host) {
            warn!("{}", e);
        }
    }

    /// Advances the PPU one dot, then the OAM DMA engine.
    pub fn tick(&mut self) {
        self.ppu.tick(&mut self.host);
        self.ppu.tick_oam_dma(&mut self.host);
    }

    pub fn step(&mut self, dots: u32) {
        for _ in 0..dots {
            self.tick();
        }
    }

    /// Runs until the PPU delivers its next frame.
    pub fn run_frame(&mut self) {
        let target = self.host.frames + 1;
        while self.host.frames < target {
            self.tick();
        }
    }

    pub fn frames(&self) -> u64 {
        self.host.frames()
    }

    pub fn interrupt_flags(&self) -> u8 {
        self.host.read(IF_ADDR)
    }

    pub fn host(&self) -> &HostMemory {
        &self.host
    }
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

// Implement Debug for easier printing/logging
impl fmt::Debug for MemoryBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBus")
            .field("rom (size)", &self.host.rom.len())
            .field("external_ram (size)", &self.host.external_ram.len())
            .field("wram (size)", &self.host.wram.len())
            .field("hram (size)", &self.host.hram.len())
            .field("interrupt_enable", &self.host.interrupt_enable)
            .field("frames", &self.host.frames)
            .field("ppu_mode", &self.ppu.mode())
            .field("ly", &self.ppu.scanline())
            .finish()
    }
}
