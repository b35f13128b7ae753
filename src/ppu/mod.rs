use log::{debug, trace, warn};

use crate::memory_map;

mod constants;
mod debug;
mod dma;
mod fetcher;
mod memory;
mod oam_scan;
mod palette;
mod registers;
mod state;
#[cfg(test)]
mod test_harness;

// Re-export public constants and types
pub use constants::{
    DOTS_PER_FRAME, DOTS_PER_SCANLINE, GB_HEIGHT, GB_WIDTH, TILE_DEBUG_HEIGHT, TILE_DEBUG_WIDTH,
};
pub use debug::TileDebugBuffer;
pub use memory::{FrameBuffer, ObjectEntry};
pub use palette::{rgb555_to_rgba, DMG_SHADES};
pub use registers::{Lcdc, Registers, StatSources, TileAttributes};
pub use state::PpuMode;

use constants::*;
use dma::{DmaBlock, Hdma, OamDma};
use fetcher::{PipelineContext, PixelPipeline};
use memory::{Oam, PaletteRam, Vram};
use oam_scan::LineObjects;
use state::PpuState;

/// Result type for bus accesses; the error names the offending address.
pub type PpuResult<T> = Result<T, String>;

/// Interrupt kinds the PPU can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    VBlank,
    LcdStat,
}

impl Interrupt {
    /// Bit position in the IF/IE registers.
    pub fn bit(self) -> u8 {
        match self {
            Interrupt::VBlank => memory_map::VBLANK_INTERRUPT_BIT,
            Interrupt::LcdStat => memory_map::LCD_STAT_INTERRUPT_BIT,
        }
    }
}

/// Services the PPU needs from the system around it.
pub trait PpuHost {
    /// Reads a DMA source byte from outside tile memory.
    fn read_byte(&self, addr: u16) -> u8;

    fn request_interrupt(&mut self, interrupt: Interrupt);

    /// Called once per frame on VBlank entry, and every 70224 dots while the
    /// display is off.
    fn frame_rendered(&mut self, _frame: &FrameBuffer) {}
}

/// Represents the Picture Processing Unit (PPU) of the Game Boy.
pub struct Ppu {
    registers: Registers,
    state: PpuState,
    vram: Vram,
    oam: Oam,
    bg_palettes: PaletteRam,
    obj_palettes: PaletteRam,
    line_objects: LineObjects,
    pipeline: PixelPipeline,
    oam_dma: OamDma,
    hdma: Hdma,
    frame_buffer: Box<FrameBuffer>,           // Use Box for heap allocation
    tile_debug_buffer: Box<TileDebugBuffer>, // Use Box for heap allocation
}

impl Ppu {
    pub fn new() -> Self {
        Ppu {
            registers: Registers::new(),
            state: PpuState::new(),
            vram: Vram::new(),
            oam: Oam::new(),
            bg_palettes: PaletteRam::new(),
            obj_palettes: PaletteRam::new(),
            line_objects: LineObjects::new(),
            pipeline: PixelPipeline::new(),
            oam_dma: OamDma::new(),
            hdma: Hdma::new(),
            frame_buffer: Box::new([DMG_SHADES[0]; FRAME_BUFFER_SIZE]),
            tile_debug_buffer: Box::new([DMG_SHADES[0]; TILE_DEBUG_BUFFER_SIZE]),
        }
    }

    /// Restores power-on state without reallocating any buffers.
    pub fn reset(&mut self) {
        self.registers = Registers::new();
        self.state = PpuState::new();
        self.vram.clear();
        self.oam.clear();
        self.bg_palettes.clear();
        self.obj_palettes.clear();
        self.line_objects.clear();
        self.pipeline = PixelPipeline::new();
        self.oam_dma = OamDma::new();
        self.hdma = Hdma::new();
        self.frame_buffer.fill(DMG_SHADES[0]);
        self.tile_debug_buffer.fill(DMG_SHADES[0]);
    }

    // --- Inspection ---

    /// Get a reference to the current screen frame buffer.
    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.frame_buffer
    }

    /// Get a reference to the tile debug view buffer.
    pub fn tile_debug_buffer(&self) -> &TileDebugBuffer {
        &self.tile_debug_buffer
    }

    /// Redraws the tile debug view from `bank`. Call this at most once per frame.
    pub fn update_tile_debug_buffer(&mut self, bank: usize) {
        debug::render_tile_sheet(&mut self.tile_debug_buffer, &self.vram, bank);
    }

    #[inline]
    pub fn mode(&self) -> PpuMode {
        self.state.mode
    }

    #[inline]
    pub fn scanline(&self) -> u8 {
        self.state.scanline
    }

    #[inline]
    pub fn line_dot(&self) -> u16 {
        self.state.line_dot
    }

    /// Dots taken by the most recent PixelTransfer phase.
    #[inline]
    pub fn last_transfer_dots(&self) -> u16 {
        self.state.last_transfer_dots
    }

    #[inline]
    pub fn window_line(&self) -> u8 {
        self.state.window_line
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn object(&self, index: usize) -> ObjectEntry {
        self.oam.object(index)
    }

    pub fn oam(&self) -> &[u8] {
        self.oam.as_bytes()
    }

    pub fn vram_bank(&self, bank: usize) -> &[u8] {
        self.vram.bank(bank)
    }

    pub fn bg_palette_ram(&self) -> &[u8] {
        self.bg_palettes.as_bytes()
    }

    pub fn obj_palette_ram(&self) -> &[u8] {
        self.obj_palettes.as_bytes()
    }

    pub fn oam_dma_active(&self) -> bool {
        self.oam_dma.is_active()
    }

    pub fn hdma_active(&self) -> bool {
        self.hdma.is_active()
    }

    // --- Timing ---

    /// Advances the display by one dot.
    pub fn tick(&mut self, host: &mut dyn PpuHost) {
        self.state.hblank_entered = false;
        self.state.mode_entered = false;

        if !self.registers.display_enabled() {
            // Keep the host's frame pacing while nothing is drawn.
            self.state.disabled_dots += 1;
            if self.state.disabled_dots >= DOTS_PER_FRAME {
                self.state.disabled_dots = 0;
                host.frame_rendered(&self.frame_buffer);
            }
            return;
        }

        match self.state.mode {
            PpuMode::ObjectScan => self.tick_object_scan(),
            PpuMode::PixelTransfer => self.tick_pixel_transfer(),
            PpuMode::HorizontalBlank => self.tick_hblank(host),
            PpuMode::VerticalBlank => self.tick_vblank(),
        }

        self.state.lyc_eq_ly = self.state.scanline == self.registers.lyc;
        self.check_stat_interrupt(host);

        if self.state.hblank_entered {
            self.step_hdma(host);
        }
    }

    /// Advances the OAM DMA engine by one dot. Runs whether or not the display is on.
    pub fn tick_oam_dma(&mut self, host: &mut dyn PpuHost) {
        if let Some((source, offset)) = self.oam_dma.step() {
            let value = self.dma_read(host, source);
            self.oam.write(offset, value);
            if offset + 1 == OAM_DMA_LENGTH as usize {
                trace!("OAM DMA from {:#06X} complete", source & 0xFF00);
            }
        }
    }

    fn set_mode(&mut self, mode: PpuMode) {
        trace!("Line {} dot {}: {:?} -> {:?}", self.state.scanline, self.state.line_dot, self.state.mode, mode);
        self.state.mode = mode;
        self.state.mode_entered = true;
    }

    fn tick_object_scan(&mut self) {
        if self.state.line_dot == 0 {
            self.line_objects.clear();
        }
        // One table entry every two dots.
        if self.state.line_dot % 2 == 0 {
            let index = (self.state.line_dot / 2) as usize;
            let height = self.registers.object_height();
            self.line_objects.scan_entry(&self.oam, index, self.state.scanline, height);
        }

        self.state.line_dot += 1;
        if self.state.line_dot == MODE2_OAM_SCAN_DOTS {
            self.line_objects.resolve_order(self.registers.priority_by_x());
            self.set_mode(PpuMode::PixelTransfer);
            let ctx = PipelineContext {
                registers: &self.registers,
                vram: &self.vram,
                oam: &self.oam,
                bg_palettes: &self.bg_palettes,
                obj_palettes: &self.obj_palettes,
                objects: &mut self.line_objects,
                line: self.state.scanline,
                window_line: self.state.window_line,
            };
            self.pipeline.start_line(&ctx);
        }
    }

    fn tick_pixel_transfer(&mut self) {
        let mut ctx = PipelineContext {
            registers: &self.registers,
            vram: &self.vram,
            oam: &self.oam,
            bg_palettes: &self.bg_palettes,
            obj_palettes: &self.obj_palettes,
            objects: &mut self.line_objects,
            line: self.state.scanline,
            window_line: self.state.window_line,
        };
        let done = self.pipeline.step(&mut ctx, &mut self.frame_buffer);
        self.state.line_dot += 1;

        if !done && self.state.line_dot < DOTS_PER_SCANLINE - 1 {
            return;
        }
        if !done {
            warn!(
                "Pixel transfer on line {} overran the scanline; forcing HBlank",
                self.state.scanline
            );
        }

        self.state.last_transfer_dots = self.pipeline.dots();
        if self.pipeline.window_engaged() {
            self.state.window_line = self.state.window_line.wrapping_add(1);
        }
        self.set_mode(PpuMode::HorizontalBlank);
        self.state.hblank_entered = true;
    }

    fn tick_hblank(&mut self, host: &mut dyn PpuHost) {
        self.state.line_dot += 1;
        if self.state.line_dot < DOTS_PER_SCANLINE {
            return;
        }

        self.state.line_dot = 0;
        self.state.scanline += 1;
        if self.state.scanline as usize == GB_HEIGHT {
            self.set_mode(PpuMode::VerticalBlank);
            host.request_interrupt(Interrupt::VBlank);
            host.frame_rendered(&self.frame_buffer);
        } else {
            self.set_mode(PpuMode::ObjectScan);
        }
    }

    fn tick_vblank(&mut self) {
        self.state.line_dot += 1;
        if self.state.line_dot < DOTS_PER_SCANLINE {
            return;
        }

        self.state.line_dot = 0;
        self.state.scanline += 1;
        if self.state.scanline == SCANLINES_PER_FRAME {
            self.state.scanline = 0;
            self.state.window_line = 0;
            self.set_mode(PpuMode::ObjectScan);
        }
    }

    /// Requests a STAT interrupt on every entry into a mode whose source is
    /// enabled, and on the rising edge of the coincidence source.
    fn check_stat_interrupt(&mut self, host: &mut dyn PpuHost) {
        let sources = self.registers.stat;

        let mode_source = match self.state.mode {
            PpuMode::HorizontalBlank => StatSources::HBLANK_INTERRUPT,
            PpuMode::VerticalBlank => StatSources::VBLANK_INTERRUPT,
            PpuMode::ObjectScan => StatSources::OAM_INTERRUPT,
            PpuMode::PixelTransfer => StatSources::empty(),
        };
        let mode_request = self.state.mode_entered && sources.intersects(mode_source);

        let coincidence_high = sources.contains(StatSources::LYC_INTERRUPT) && self.state.lyc_eq_ly;
        let coincidence_request = coincidence_high && !self.state.stat_interrupt_line;
        self.state.stat_interrupt_line = coincidence_high;

        if mode_request || coincidence_request {
            host.request_interrupt(Interrupt::LcdStat);
        }
    }

    // --- DMA ---

    /// Source reads for all DMA engines. Tile memory is read directly from the
    /// mapped bank; everything else comes from the host.
    fn dma_read(&self, host: &dyn PpuHost, addr: u16) -> u8 {
        match addr {
            memory_map::VRAM_START..=memory_map::VRAM_END => self.vram.read_mapped(addr - memory_map::VRAM_START),
            _ => host.read_byte(addr),
        }
    }

    fn copy_block(&mut self, host: &dyn PpuHost, block: DmaBlock, len: u16) {
        for i in 0..len {
            let value = self.dma_read(host, block.source.wrapping_add(i));
            // Bytes past the end of the bank are dropped.
            self.vram.write_mapped(block.destination + i, value);
        }
    }

    fn step_hdma(&mut self, host: &dyn PpuHost) {
        if let Some(block) = self.hdma.next_block() {
            trace!(
                "HDMA block {:#06X} -> {:#06X} on line {}",
                block.source,
                memory_map::VRAM_START + block.destination,
                self.state.scanline
            );
            self.copy_block(host, block, HDMA_BLOCK_SIZE);
        }
    }

    fn start_hdma(&mut self, host: &dyn PpuHost, value: u8) {
        let len = self.hdma.start(value);
        if len == 0 {
            debug!("HDMA armed for {} blocks", (value & HDMA_LENGTH_MASK) as u16 + 1);
            return;
        }
        let block = self.hdma.take(len);
        debug!(
            "GDMA {:#06X} -> {:#06X}, {} bytes",
            block.source,
            memory_map::VRAM_START + block.destination,
            len
        );
        self.copy_block(host, block, len);
    }

    // --- Bus Access ---

    fn vram_blocked(&self) -> bool {
        self.registers.display_enabled() && self.state.mode == PpuMode::PixelTransfer
    }

    fn oam_blocked(&self) -> bool {
        self.oam_dma.is_transferring()
            || (self.registers.display_enabled()
                && matches!(self.state.mode, PpuMode::ObjectScan | PpuMode::PixelTransfer))
    }

    fn palette_blocked(&self) -> bool {
        self.vram_blocked()
    }

    /// Reads a byte from tile memory, the object table or a PPU register.
    /// Blocked reads return 0xFF.
    pub fn read_byte(&self, addr: u16) -> PpuResult<u8> {
        let value = match addr {
            memory_map::VRAM_START..=memory_map::VRAM_END => {
                if self.vram_blocked() {
                    0xFF
                } else {
                    self.vram.read_mapped(addr - memory_map::VRAM_START)
                }
            }
            memory_map::OAM_START..=memory_map::OAM_END => {
                if self.oam_blocked() {
                    0xFF
                } else {
                    self.oam.read((addr - memory_map::OAM_START) as usize)
                }
            }
            memory_map::LCDC_ADDR => self.registers.lcdc.bits(),
            memory_map::STAT_ADDR => self.registers.read_stat(self.state.mode.bits(), self.state.lyc_eq_ly),
            memory_map::SCY_ADDR => self.registers.scy,
            memory_map::SCX_ADDR => self.registers.scx,
            memory_map::LY_ADDR => self.state.scanline,
            memory_map::LYC_ADDR => self.registers.lyc,
            memory_map::DMA_ADDR => self.registers.dma,
            memory_map::BGP_ADDR => self.registers.bgp,
            memory_map::OBP0_ADDR => self.registers.obp0,
            memory_map::OBP1_ADDR => self.registers.obp1,
            memory_map::WY_ADDR => self.registers.wy,
            memory_map::WX_ADDR => self.registers.wx,
            memory_map::GRAPHICS_MODE_ADDR => self.registers.graphics_mode,
            memory_map::VBK_ADDR => 0xFE | self.vram.mapped_bank() as u8,
            memory_map::HDMA1_ADDR..=memory_map::HDMA4_ADDR => 0xFF,
            memory_map::HDMA5_ADDR => self.hdma.control(),
            memory_map::BCPS_ADDR => self.bg_palettes.read_index(),
            memory_map::BCPD_ADDR => {
                if self.palette_blocked() { 0xFF } else { self.bg_palettes.read_data() }
            }
            memory_map::OCPS_ADDR => self.obj_palettes.read_index(),
            memory_map::OCPD_ADDR => {
                if self.palette_blocked() { 0xFF } else { self.obj_palettes.read_data() }
            }
            memory_map::OPRI_ADDR => 0xFE | self.registers.opri,
            _ => return Err(format!("PPU read from unmapped address {:#06X}", addr)),
        };
        Ok(value)
    }

    /// Writes a byte to tile memory, the object table or a PPU register. Blocked
    /// writes are dropped. `host` supplies the source bytes of a general-purpose DMA.
    pub fn write_byte(&mut self, addr: u16, value: u8, host: &dyn PpuHost) -> PpuResult<()> {
        match addr {
            memory_map::VRAM_START..=memory_map::VRAM_END => {
                if !self.vram_blocked() {
                    self.vram.write_mapped(addr - memory_map::VRAM_START, value);
                }
            }
            memory_map::OAM_START..=memory_map::OAM_END => {
                if !self.oam_blocked() {
                    self.oam.write((addr - memory_map::OAM_START) as usize, value);
                }
            }
            memory_map::LCDC_ADDR => self.write_lcdc(value),
            memory_map::STAT_ADDR => self.registers.write_stat(value),
            memory_map::SCY_ADDR => self.registers.scy = value,
            memory_map::SCX_ADDR => self.registers.scx = value,
            memory_map::LY_ADDR => {} // Read-only
            memory_map::LYC_ADDR => self.registers.lyc = value,
            memory_map::DMA_ADDR => {
                debug!("OAM DMA from {:#06X}", (value as u16) << 8);
                self.registers.dma = value;
                self.oam_dma.start(value);
            }
            memory_map::BGP_ADDR => self.registers.bgp = value,
            memory_map::OBP0_ADDR => self.registers.obp0 = value,
            memory_map::OBP1_ADDR => self.registers.obp1 = value,
            memory_map::WY_ADDR => self.registers.wy = value,
            memory_map::WX_ADDR => self.registers.wx = value,
            memory_map::GRAPHICS_MODE_ADDR => self.registers.graphics_mode = value,
            memory_map::VBK_ADDR => self.vram.select_bank(value),
            memory_map::HDMA1_ADDR => self.hdma.write_source_high(value),
            memory_map::HDMA2_ADDR => self.hdma.write_source_low(value),
            memory_map::HDMA3_ADDR => self.hdma.write_destination_high(value),
            memory_map::HDMA4_ADDR => self.hdma.write_destination_low(value),
            memory_map::HDMA5_ADDR => self.start_hdma(host, value),
            memory_map::BCPS_ADDR => self.bg_palettes.write_index(value),
            memory_map::BCPD_ADDR => {
                let accepted = !self.palette_blocked();
                self.bg_palettes.write_data(value, accepted);
            }
            memory_map::OCPS_ADDR => self.obj_palettes.write_index(value),
            memory_map::OCPD_ADDR => {
                let accepted = !self.palette_blocked();
                self.obj_palettes.write_data(value, accepted);
            }
            memory_map::OPRI_ADDR => self.registers.opri = value & 1,
            _ => return Err(format!("PPU write to unmapped address {:#06X}", addr)),
        }
        Ok(())
    }

    fn write_lcdc(&mut self, value: u8) {
        let was_on = self.registers.display_enabled();
        let mut lcdc = Lcdc::from_bits_retain(value);

        if was_on && !lcdc.contains(Lcdc::DISPLAY_ENABLE) && self.state.mode != PpuMode::VerticalBlank {
            debug!(
                "Ignoring display disable on line {} in {:?}",
                self.state.scanline, self.state.mode
            );
            lcdc.insert(Lcdc::DISPLAY_ENABLE);
        }
        self.registers.lcdc = lcdc;

        match (was_on, lcdc.contains(Lcdc::DISPLAY_ENABLE)) {
            (true, false) => {
                debug!("Display off");
                self.state.reset_for_display_off();
            }
            (false, true) => {
                debug!("Display on");
                self.state.reset_for_display_on();
                self.line_objects.clear();
            }
            _ => {}
        }
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::test_harness::{run_frames, run_ticks, run_until_mode, MockHost};
    use super::*;

    fn place_object(ppu: &mut Ppu, index: usize, y: u8, x: u8, tile: u8) {
        ppu.oam.write(index * 4, y);
        ppu.oam.write(index * 4 + 1, x);
        ppu.oam.write(index * 4 + 2, tile);
        ppu.oam.write(index * 4 + 3, 0);
    }

    /// Runs line 0 to HBlank and returns how long PixelTransfer took.
    fn transfer_dots_for_line_0(ppu: &mut Ppu, host: &mut MockHost) -> u16 {
        run_until_mode(ppu, host, PpuMode::HorizontalBlank);
        assert_eq!(ppu.scanline(), 0);
        ppu.last_transfer_dots()
    }

    #[test]
    fn frame_is_70224_ticks() {
        let mut ppu = Ppu::new();
        let mut host = MockHost::new();

        let first = run_frames(&mut ppu, &mut host, 1);
        assert_eq!(first, GB_HEIGHT * DOTS_PER_SCANLINE as usize);
        assert_eq!(ppu.mode(), PpuMode::VerticalBlank);
        assert_eq!(ppu.scanline(), 144);

        let second = run_frames(&mut ppu, &mut host, 1);
        assert_eq!(second, DOTS_PER_FRAME as usize);
        assert_eq!(host.count(Interrupt::VBlank), 2);
    }

    #[test]
    fn modes_follow_line_order() {
        let mut ppu = Ppu::new();
        let mut host = MockHost::new();

        assert_eq!(ppu.mode(), PpuMode::ObjectScan);
        assert_eq!(run_until_mode(&mut ppu, &mut host, PpuMode::PixelTransfer), 80);
        let transfer = run_until_mode(&mut ppu, &mut host, PpuMode::HorizontalBlank);
        assert_eq!(transfer as u16, ppu.last_transfer_dots());
        let hblank = run_until_mode(&mut ppu, &mut host, PpuMode::ObjectScan);
        assert_eq!(80 + transfer + hblank, DOTS_PER_SCANLINE as usize);
        assert_eq!(ppu.scanline(), 1);
        assert_eq!(ppu.line_dot(), 0);
    }

    #[test]
    fn vblank_wraps_to_line_zero() {
        let mut ppu = Ppu::new();
        let mut host = MockHost::new();
        run_frames(&mut ppu, &mut host, 1);
        let ticks = run_until_mode(&mut ppu, &mut host, PpuMode::ObjectScan);
        assert_eq!(ticks, VBLANK_LINES as usize * DOTS_PER_SCANLINE as usize);
        assert_eq!(ppu.scanline(), 0);
        assert_eq!(ppu.read_byte(memory_map::LY_ADDR), Ok(0));
    }

    #[test]
    fn transfer_length_is_bounded_and_grows_with_objects() {
        let mut previous = 0;
        for count in 0..=MAX_OBJECTS_PER_LINE {
            let mut ppu = Ppu::new();
            let mut host = MockHost::new();
            ppu.registers.lcdc.insert(Lcdc::OBJ_ENABLE);
            for i in 0..count {
                place_object(&mut ppu, i, 16, 8 + 15 * i as u8, 0);
            }

            let dots = transfer_dots_for_line_0(&mut ppu, &mut host);
            assert!((MODE3_MIN_DOTS..=MODE3_MAX_DOTS).contains(&dots), "{count} objects: {dots}");
            assert!(dots >= previous, "{count} objects: {dots} < {previous}");
            previous = dots;
        }
    }

    #[test]
    fn worst_case_transfer_stays_under_limit() {
        let mut ppu = Ppu::new();
        let mut host = MockHost::new();
        ppu.registers.lcdc.insert(Lcdc::OBJ_ENABLE | Lcdc::WINDOW_ENABLE);
        ppu.registers.scx = 7;
        ppu.registers.wx = 7 + 83;
        for i in 0..MAX_OBJECTS_PER_LINE {
            place_object(&mut ppu, i, 16, 167 - i as u8, 0);
        }

        let dots = transfer_dots_for_line_0(&mut ppu, &mut host);
        assert!((MODE3_MIN_DOTS..=MODE3_MAX_DOTS).contains(&dots), "{dots}");
        assert_eq!(ppu.window_line(), 1);
    }

    #[test]
    fn oam_dma_takes_162_ticks() {
        let mut ppu = Ppu::new();
        let mut host = MockHost::new();
        for i in 0..OAM_DMA_LENGTH as u16 {
            ppu.vram.write_mapped(i, i as u8 + 1);
        }

        ppu.write_byte(memory_map::DMA_ADDR, 0x80, &host).unwrap();
        for _ in 0..161 {
            ppu.tick_oam_dma(&mut host);
        }
        assert!(ppu.oam_dma_active());
        assert_eq!(ppu.oam.read(158), 159);
        assert_eq!(ppu.oam.read(159), 0);

        ppu.tick_oam_dma(&mut host);
        assert!(!ppu.oam_dma_active());
        for i in 0..OAM_DMA_LENGTH as usize {
            assert_eq!(ppu.oam.read(i), i as u8 + 1);
        }
        assert_eq!(ppu.read_byte(memory_map::DMA_ADDR), Ok(0x80));
    }

    #[test]
    fn oam_dma_reads_host_memory_and_blocks_bus() {
        let mut ppu = Ppu::new();
        let mut host = MockHost::new();
        host.write(0xC000, &[0x42; 160]);
        run_until_mode(&mut ppu, &mut host, PpuMode::HorizontalBlank);

        ppu.write_byte(memory_map::DMA_ADDR, 0xC0, &host).unwrap();
        run_ticks(&mut ppu, &mut host, 3);
        assert_eq!(ppu.read_byte(memory_map::OAM_START), Ok(0xFF));
        ppu.write_byte(memory_map::OAM_START + 100, 0x99, &host).unwrap();

        run_ticks(&mut ppu, &mut host, 159);
        assert!(!ppu.oam_dma_active());
        assert_eq!(ppu.object(25).y, 0x42);
    }

    #[test]
    fn gdma_copies_synchronously() {
        let mut ppu = Ppu::new();
        let host = {
            let mut host = MockHost::new();
            let pattern: Vec<u8> = (1..=48).collect();
            host.write(0xD000, &pattern);
            host
        };

        ppu.write_byte(memory_map::HDMA1_ADDR, 0xD0, &host).unwrap();
        ppu.write_byte(memory_map::HDMA2_ADDR, 0x00, &host).unwrap();
        ppu.write_byte(memory_map::HDMA3_ADDR, 0x81, &host).unwrap();
        ppu.write_byte(memory_map::HDMA4_ADDR, 0x00, &host).unwrap();
        ppu.write_byte(memory_map::HDMA5_ADDR, 0x01, &host).unwrap();

        let bank = ppu.vram_bank(0);
        assert_eq!(&bank[0x100..0x120], &(1..=32).collect::<Vec<u8>>()[..]);
        assert_eq!(bank[0x120], 0);
        assert_eq!(ppu.read_byte(memory_map::HDMA5_ADDR), Ok(0xFF));
        assert_eq!(ppu.read_byte(memory_map::HDMA1_ADDR), Ok(0xFF));
    }

    #[test]
    fn gdma_past_bank_end_is_dropped() {
        let mut ppu = Ppu::new();
        let mut host = MockHost::new();
        host.write(0xC000, &[0xAB; 32]);
        ppu.write_byte(memory_map::HDMA1_ADDR, 0xC0, &host).unwrap();
        ppu.write_byte(memory_map::HDMA3_ADDR, 0x9F, &host).unwrap();
        ppu.write_byte(memory_map::HDMA4_ADDR, 0xF0, &host).unwrap();
        ppu.write_byte(memory_map::HDMA5_ADDR, 0x01, &host).unwrap();

        assert!(ppu.vram_bank(0)[0x1FF0..].iter().all(|&b| b == 0xAB));
        assert_eq!(ppu.vram_bank(0)[0], 0);
    }

    #[test]
    fn hdma_copies_one_block_per_hblank() {
        let mut ppu = Ppu::new();
        let mut host = MockHost::new();
        host.write(0xC000, &[0x5A; 48]);
        ppu.write_byte(memory_map::HDMA1_ADDR, 0xC0, &host).unwrap();
        ppu.write_byte(memory_map::HDMA3_ADDR, 0x80, &host).unwrap();
        ppu.write_byte(memory_map::HDMA5_ADDR, 0x81, &host).unwrap();
        assert_eq!(ppu.read_byte(memory_map::HDMA5_ADDR), Ok(0x01));

        let copied = |ppu: &Ppu| ppu.vram_bank(0)[..48].iter().filter(|&&b| b == 0x5A).count();
        run_until_mode(&mut ppu, &mut host, PpuMode::PixelTransfer);
        assert_eq!(copied(&ppu), 0);

        run_until_mode(&mut ppu, &mut host, PpuMode::HorizontalBlank);
        assert_eq!(copied(&ppu), 16);
        assert_eq!(ppu.read_byte(memory_map::HDMA5_ADDR), Ok(0x00));

        run_until_mode(&mut ppu, &mut host, PpuMode::ObjectScan);
        run_until_mode(&mut ppu, &mut host, PpuMode::HorizontalBlank);
        assert_eq!(copied(&ppu), 32);
        assert_eq!(ppu.read_byte(memory_map::HDMA5_ADDR), Ok(0xFF));

        run_until_mode(&mut ppu, &mut host, PpuMode::ObjectScan);
        run_until_mode(&mut ppu, &mut host, PpuMode::HorizontalBlank);
        assert_eq!(copied(&ppu), 32);
    }

    #[test]
    fn hdma_waits_while_display_is_off() {
        let mut ppu = Ppu::new();
        let mut host = MockHost::new();
        host.write(0xC000, &[0x5A; 16]);
        run_until_mode(&mut ppu, &mut host, PpuMode::VerticalBlank);
        ppu.write_byte(memory_map::LCDC_ADDR, 0x11, &host).unwrap();

        ppu.write_byte(memory_map::HDMA1_ADDR, 0xC0, &host).unwrap();
        ppu.write_byte(memory_map::HDMA3_ADDR, 0x80, &host).unwrap();
        ppu.write_byte(memory_map::HDMA5_ADDR, 0x80, &host).unwrap();
        run_ticks(&mut ppu, &mut host, 2 * DOTS_PER_SCANLINE as usize);
        assert!(ppu.vram_bank(0)[..16].iter().all(|&b| b == 0));
        assert!(ppu.hdma_active());
        assert_eq!(ppu.read_byte(memory_map::HDMA5_ADDR), Ok(0x00));
    }

    #[test]
    fn palette_round_trip_all_offsets() {
        let mut ppu = Ppu::new();
        let host = MockHost::new();
        for (index_reg, data_reg) in [
            (memory_map::BCPS_ADDR, memory_map::BCPD_ADDR),
            (memory_map::OCPS_ADDR, memory_map::OCPD_ADDR),
        ] {
            for offset in (0..CRAM_SIZE as u8).step_by(2) {
                let (lo, hi) = (offset ^ 0x5A, offset.wrapping_mul(3));
                ppu.write_byte(index_reg, PALETTE_AUTO_INCREMENT | offset, &host).unwrap();
                ppu.write_byte(data_reg, lo, &host).unwrap();
                ppu.write_byte(data_reg, hi, &host).unwrap();

                ppu.write_byte(index_reg, offset, &host).unwrap();
                assert_eq!(ppu.read_byte(data_reg), Ok(lo));
                ppu.write_byte(index_reg, offset + 1, &host).unwrap();
                assert_eq!(ppu.read_byte(data_reg), Ok(hi));
            }
        }
        assert_ne!(ppu.bg_palette_ram(), &[0u8; CRAM_SIZE][..]);
    }

    #[test]
    fn palette_writes_rejected_during_transfer_still_increment() {
        let mut ppu = Ppu::new();
        let mut host = MockHost::new();
        run_until_mode(&mut ppu, &mut host, PpuMode::PixelTransfer);

        ppu.write_byte(memory_map::BCPS_ADDR, 0x80 | 0x3F, &host).unwrap();
        ppu.write_byte(memory_map::BCPD_ADDR, 0x12, &host).unwrap();
        assert_eq!(ppu.read_byte(memory_map::BCPS_ADDR), Ok(0x80 | 0x40));
        assert_eq!(ppu.read_byte(memory_map::BCPD_ADDR), Ok(0xFF));
        assert_eq!(ppu.bg_palette_ram()[0x3F], 0);
    }

    #[test]
    fn coincidence_interrupt_fires_once_per_edge() {
        let mut ppu = Ppu::new();
        let mut host = MockHost::new();
        ppu.write_byte(memory_map::LYC_ADDR, 2, &host).unwrap();
        ppu.write_byte(memory_map::STAT_ADDR, StatSources::LYC_INTERRUPT.bits(), &host).unwrap();

        run_ticks(&mut ppu, &mut host, DOTS_PER_FRAME as usize);
        assert_eq!(host.count(Interrupt::LcdStat), 1);

        run_ticks(&mut ppu, &mut host, DOTS_PER_FRAME as usize);
        assert_eq!(host.count(Interrupt::LcdStat), 2);
    }

    #[test]
    fn coincidence_flag_tracks_lyc_writes() {
        let mut ppu = Ppu::new();
        let mut host = MockHost::new();
        run_ticks(&mut ppu, &mut host, 3 * DOTS_PER_SCANLINE as usize + 10);
        assert_eq!(ppu.scanline(), 3);

        ppu.write_byte(memory_map::LYC_ADDR, 3, &host).unwrap();
        run_ticks(&mut ppu, &mut host, 1);
        let stat = ppu.read_byte(memory_map::STAT_ADDR).unwrap();
        assert_ne!(stat & StatSources::COINCIDENCE.bits(), 0);
        assert_eq!(host.count(Interrupt::LcdStat), 0); // Source not enabled
    }

    #[test]
    fn mode_interrupt_sources() {
        let mut ppu = Ppu::new();
        let mut host = MockHost::new();
        ppu.write_byte(memory_map::LYC_ADDR, 200, &host).unwrap();
        ppu.write_byte(memory_map::STAT_ADDR, StatSources::HBLANK_INTERRUPT.bits(), &host).unwrap();
        run_frames(&mut ppu, &mut host, 1);
        assert_eq!(host.count(Interrupt::LcdStat), GB_HEIGHT);
    }

    #[test]
    fn each_mode_entry_requests_its_interrupt() {
        let mut ppu = Ppu::new();
        let mut host = MockHost::new();
        ppu.write_byte(memory_map::LYC_ADDR, 200, &host).unwrap();
        let sources = StatSources::HBLANK_INTERRUPT | StatSources::OAM_INTERRUPT | StatSources::VBLANK_INTERRUPT;
        ppu.write_byte(memory_map::STAT_ADDR, sources.bits(), &host).unwrap();
        run_until_mode(&mut ppu, &mut host, PpuMode::VerticalBlank);
        host.interrupts.clear();

        // VBlank entry to VBlank entry: 144 ObjectScan, 144 HBlank and one VBlank entry.
        run_frames(&mut ppu, &mut host, 1);
        assert_eq!(host.count(Interrupt::LcdStat), 2 * GB_HEIGHT + 1);
    }

    #[test]
    fn mode_interrupt_fires_while_coincidence_holds() {
        let mut ppu = Ppu::new();
        let mut host = MockHost::new();
        run_ticks(&mut ppu, &mut host, 3 * DOTS_PER_SCANLINE as usize + 10);
        ppu.write_byte(memory_map::LYC_ADDR, 3, &host).unwrap();
        let sources = StatSources::LYC_INTERRUPT | StatSources::HBLANK_INTERRUPT;
        ppu.write_byte(memory_map::STAT_ADDR, sources.bits(), &host).unwrap();

        run_ticks(&mut ppu, &mut host, 1);
        assert_eq!(host.count(Interrupt::LcdStat), 1); // Coincidence edge
        run_until_mode(&mut ppu, &mut host, PpuMode::HorizontalBlank);
        assert_eq!(ppu.scanline(), 3);
        assert_eq!(host.count(Interrupt::LcdStat), 2); // HBlank entry on the same line
    }

    #[test]
    fn display_disable_only_in_vblank() {
        let mut ppu = Ppu::new();
        let mut host = MockHost::new();
        run_ticks(&mut ppu, &mut host, 10);

        ppu.write_byte(memory_map::LCDC_ADDR, 0x13, &host).unwrap();
        assert_eq!(ppu.read_byte(memory_map::LCDC_ADDR), Ok(0x93));

        run_until_mode(&mut ppu, &mut host, PpuMode::VerticalBlank);
        ppu.write_byte(memory_map::LCDC_ADDR, 0x11, &host).unwrap();
        assert_eq!(ppu.read_byte(memory_map::LCDC_ADDR), Ok(0x11));
        assert_eq!(ppu.read_byte(memory_map::LY_ADDR), Ok(0));
        assert_eq!(ppu.read_byte(memory_map::STAT_ADDR).map(|s| s & 0b11), Ok(0));
    }

    #[test]
    fn display_off_still_paces_frames() {
        let mut ppu = Ppu::new();
        let mut host = MockHost::new();
        run_frames(&mut ppu, &mut host, 1);
        ppu.write_byte(memory_map::LCDC_ADDR, 0x11, &host).unwrap();
        let interrupts = host.interrupts.len();

        assert_eq!(run_frames(&mut ppu, &mut host, 1), DOTS_PER_FRAME as usize);
        assert_eq!(host.interrupts.len(), interrupts);
        // Everything is accessible while the display is off.
        ppu.write_byte(memory_map::VRAM_START, 0x77, &host).unwrap();
        assert_eq!(ppu.read_byte(memory_map::VRAM_START), Ok(0x77));

        ppu.write_byte(memory_map::LCDC_ADDR, 0x91, &host).unwrap();
        assert_eq!(ppu.mode(), PpuMode::ObjectScan);
        assert_eq!(ppu.line_dot(), 0);
    }

    #[test]
    fn bus_blocking_by_mode() {
        let mut ppu = Ppu::new();
        let mut host = MockHost::new();
        ppu.write_byte(memory_map::VRAM_START, 0x11, &host).unwrap();
        assert_eq!(ppu.read_byte(memory_map::OAM_START), Ok(0xFF)); // ObjectScan

        run_until_mode(&mut ppu, &mut host, PpuMode::PixelTransfer);
        assert_eq!(ppu.read_byte(memory_map::VRAM_START), Ok(0xFF));
        ppu.write_byte(memory_map::VRAM_START, 0x22, &host).unwrap();
        assert_eq!(ppu.read_byte(memory_map::OAM_START), Ok(0xFF));

        run_until_mode(&mut ppu, &mut host, PpuMode::HorizontalBlank);
        assert_eq!(ppu.read_byte(memory_map::VRAM_START), Ok(0x11));
        ppu.write_byte(memory_map::OAM_START, 0x33, &host).unwrap();
        assert_eq!(ppu.read_byte(memory_map::OAM_START), Ok(0x33));
    }

    #[test]
    fn vram_bank_register() {
        let mut ppu = Ppu::new();
        let host = MockHost::new();
        assert_eq!(ppu.read_byte(memory_map::VBK_ADDR), Ok(0xFE));
        ppu.write_byte(memory_map::VBK_ADDR, 0x01, &host).unwrap();
        assert_eq!(ppu.read_byte(memory_map::VBK_ADDR), Ok(0xFF));
        ppu.write_byte(memory_map::VRAM_START + 5, 0xCD, &host).unwrap();
        assert_eq!(ppu.vram_bank(1)[5], 0xCD);
        assert_eq!(ppu.vram_bank(0)[5], 0x00);
    }

    #[test]
    fn unmapped_addresses_fail() {
        let mut ppu = Ppu::new();
        let host = MockHost::new();
        assert!(ppu.read_byte(0xC000).is_err());
        assert!(ppu.write_byte(0xFF00, 0, &host).is_err());
        assert!(ppu.write_byte(memory_map::LY_ADDR, 9, &host).is_ok());
        ppu.write_byte(memory_map::OPRI_ADDR, 0x03, &host).unwrap();
        assert_eq!(ppu.read_byte(memory_map::OPRI_ADDR), Ok(0xFF));
        assert_eq!(ppu.read_byte(memory_map::LY_ADDR), Ok(0));
    }

    #[test]
    fn window_uses_its_own_line_counter() {
        let mut ppu = Ppu::new();
        let mut host = MockHost::new();
        // Window map row 0 uses tile 1 (solid colour 3); row 1 stays on tile 0.
        for offset in 16..32 {
            ppu.vram.write_mapped(offset, 0xFF);
        }
        for column in 0..32 {
            ppu.vram.write_mapped(TILE_MAP_1 + column, 1);
        }
        ppu.registers.lcdc.insert(Lcdc::WINDOW_ENABLE | Lcdc::WINDOW_MAP_AREA);
        ppu.registers.wy = 10;
        ppu.registers.wx = 7;

        run_frames(&mut ppu, &mut host, 1);
        let frame = ppu.frame_buffer();
        let black = DMG_SHADES[3];
        assert_ne!(frame[9 * GB_WIDTH], black);
        assert_eq!(frame[10 * GB_WIDTH], black);
        assert_eq!(frame[17 * GB_WIDTH + 100], black);
        assert_ne!(frame[18 * GB_WIDTH], black);
        assert_eq!(ppu.window_line(), (GB_HEIGHT - 10) as u8);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut ppu = Ppu::new();
        let mut host = MockHost::new();
        ppu.write_byte(memory_map::BGP_ADDR, 0x00, &host).unwrap();
        ppu.write_byte(memory_map::VBK_ADDR, 1, &host).unwrap();
        ppu.write_byte(memory_map::BCPS_ADDR, 0x85, &host).unwrap();
        run_frames(&mut ppu, &mut host, 1);

        ppu.reset();
        assert_eq!(ppu.read_byte(memory_map::LCDC_ADDR), Ok(0x91));
        assert_eq!(ppu.read_byte(memory_map::BGP_ADDR), Ok(0xFC));
        assert_eq!(ppu.read_byte(memory_map::OBP0_ADDR), Ok(0xFF));
        assert_eq!(ppu.read_byte(memory_map::DMA_ADDR), Ok(0xFF));
        assert_eq!(ppu.read_byte(memory_map::VBK_ADDR), Ok(0xFE));
        assert_eq!(ppu.read_byte(memory_map::BCPS_ADDR), Ok(0x40));
        assert_eq!(ppu.read_byte(memory_map::STAT_ADDR), Ok(0x82));
        assert!(ppu.frame_buffer().iter().all(|&c| c == DMG_SHADES[0]));
        assert_eq!(ppu.mode(), PpuMode::ObjectScan);
    }

    #[test]
    fn frame_rendered_receives_drawn_pixels() {
        let mut ppu = Ppu::new();
        let mut host = MockHost::new();
        ppu.vram.write_mapped(16, 0xFF); // Tile 1 colour 1
        ppu.vram.write_mapped(TILE_MAP_0, 1);
        ppu.registers.bgp = 0xE4;

        run_frames(&mut ppu, &mut host, 1);
        let frame = host.last_frame.as_ref().map(|f| f[0]);
        assert_eq!(frame, Some(DMG_SHADES[1]));
        assert_eq!(ppu.frame_buffer()[8], DMG_SHADES[0]);
    }

    #[test]
    fn tile_debug_view_updates_on_request() {
        let mut ppu = Ppu::new();
        ppu.vram.write_mapped(0, 0x80);
        assert_eq!(ppu.tile_debug_buffer()[0], DMG_SHADES[0]);
        ppu.update_tile_debug_buffer(0);
        assert_eq!(ppu.tile_debug_buffer()[0], DMG_SHADES[1]);
    }
}
