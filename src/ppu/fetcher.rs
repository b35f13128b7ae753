//! Pixel fetcher, pixel FIFO and output shifter used during PixelTransfer.
//!
//! The fetcher walks the scanline in 8-pixel columns through five steps
//! (tile number, data low, data high, sleep, push). Every step except the push
//! runs on even dots only; the push is retried each dot until the FIFO has room.
//! The FIFO holds fully composited RGBA colours, so objects are mixed in when a
//! column is pushed rather than when it is shifted out.

use super::constants::*;
use super::memory::{FrameBuffer, Oam, PaletteRam, Vram};
use super::oam_scan::LineObjects;
use super::palette;
use super::registers::{Lcdc, Registers, TileAttributes};

/// Everything the pipeline reads while drawing one dot.
pub(super) struct PipelineContext<'a> {
    pub registers: &'a Registers,
    pub vram: &'a Vram,
    pub oam: &'a Oam,
    pub bg_palettes: &'a PaletteRam,
    pub obj_palettes: &'a PaletteRam,
    pub objects: &'a mut LineObjects,
    pub line: u8,
    pub window_line: u8,
}

/// Fixed-capacity ring buffer of resolved colours.
#[derive(Debug, Clone)]
pub struct PixelFifo {
    pixels: [u32; FIFO_CAPACITY],
    head: usize,
    len: usize,
}

impl PixelFifo {
    pub fn new() -> Self {
        PixelFifo {
            pixels: [0; FIFO_CAPACITY],
            head: 0,
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Enqueues a full tile row. Refuses (returning `false`) while more than
    /// eight pixels are still queued.
    pub fn push_row(&mut self, row: &[u32; 8]) -> bool {
        if self.len > FIFO_LOW_WATER {
            return false;
        }
        for &color in row {
            let tail = (self.head + self.len) % FIFO_CAPACITY;
            self.pixels[tail] = color;
            self.len += 1;
        }
        true
    }

    pub fn pop(&mut self) -> Option<u32> {
        if self.len == 0 {
            return None;
        }
        let color = self.pixels[self.head];
        self.head = (self.head + 1) % FIFO_CAPACITY;
        self.len -= 1;
        Some(color)
    }
}

impl Default for PixelFifo {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStep {
    TileNumber,
    TileDataLow,
    TileDataHigh,
    Sleep,
    PushPixels,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchLayer {
    Background,
    Window,
}

/// Tile row of one object overlapping the column in flight.
#[derive(Debug, Clone, Copy, Default)]
struct ObjectSlot {
    x: u8,
    row_address: u16,
    bank: usize,
    attributes: TileAttributes,
    low: u8,
    high: u8,
}

impl ObjectSlot {
    /// Colour index this object contributes at screen column `px`, if it covers it.
    fn pixel_at(&self, px: i16) -> Option<u8> {
        let left = self.x as i16 - OBJECT_X_BIAS;
        if px < left || px >= left + 8 {
            return None;
        }
        let column = (px - left) as u8;
        let bit = if self.attributes.contains(TileAttributes::X_FLIP) { column } else { 7 - column };
        Some(palette::color_index(self.low, self.high, bit))
    }
}

#[derive(Debug, Clone)]
pub struct Fetcher {
    step: FetchStep,
    layer: FetchLayer,
    column: u8,    // Tile column within the active layer's map
    cursor_x: i16, // Screen X of the next column to fetch
    column_x: i16, // Screen X of the column in flight
    tile_index: u8,
    attributes: TileAttributes,
    tile_row: u8,
    data_low: u8,
    data_high: u8,
    objects: [ObjectSlot; MAX_OBJECTS_PER_LINE],
    object_count: usize,
}

impl Fetcher {
    pub fn new() -> Self {
        Fetcher {
            step: FetchStep::TileNumber,
            layer: FetchLayer::Background,
            column: 0,
            cursor_x: 0,
            column_x: 0,
            tile_index: 0,
            attributes: TileAttributes::empty(),
            tile_row: 0,
            data_low: 0,
            data_high: 0,
            objects: [ObjectSlot::default(); MAX_OBJECTS_PER_LINE],
            object_count: 0,
        }
    }

    /// Restarts fetching `layer` at tile column 0, placing its first pixel at `screen_x`.
    pub fn restart(&mut self, layer: FetchLayer, screen_x: i16) {
        self.step = FetchStep::TileNumber;
        self.layer = layer;
        self.column = 0;
        self.cursor_x = screen_x;
        self.column_x = screen_x;
        self.object_count = 0;
    }

    #[inline]
    pub fn step(&self) -> FetchStep {
        self.step
    }

    /// Runs one non-push step. Returns the number of stall dots incurred by
    /// fetching objects for the first time on this line.
    fn advance(&mut self, ctx: &mut PipelineContext) -> u8 {
        match self.step {
            FetchStep::TileNumber => {
                let penalty = self.fetch_tile_number(ctx);
                self.step = FetchStep::TileDataLow;
                penalty
            }
            FetchStep::TileDataLow => {
                let address = ctx.registers.bg_tile_row_address(self.tile_index, self.tile_row);
                self.data_low = ctx.vram.read(self.attributes.bank(), address);
                for slot in &mut self.objects[..self.object_count] {
                    slot.low = ctx.vram.read(slot.bank, slot.row_address);
                }
                self.step = FetchStep::TileDataHigh;
                0
            }
            FetchStep::TileDataHigh => {
                let address = ctx.registers.bg_tile_row_address(self.tile_index, self.tile_row) + 1;
                self.data_high = ctx.vram.read(self.attributes.bank(), address);
                for slot in &mut self.objects[..self.object_count] {
                    slot.high = ctx.vram.read(slot.bank, slot.row_address + 1);
                }
                self.step = FetchStep::Sleep;
                0
            }
            FetchStep::Sleep => {
                self.step = FetchStep::PushPixels;
                0
            }
            FetchStep::PushPixels => 0,
        }
    }

    fn fetch_tile_number(&mut self, ctx: &mut PipelineContext) -> u8 {
        let regs = ctx.registers;
        let (map_base, map_x, pixel_y) = match self.layer {
            FetchLayer::Background => (
                regs.bg_map_base(),
                (regs.scx / 8).wrapping_add(self.column) & 31,
                ctx.line.wrapping_add(regs.scy),
            ),
            FetchLayer::Window => (regs.window_map_base(), self.column & 31, ctx.window_line),
        };
        let map_offset = map_base + (pixel_y as u16 / 8) * 32 + map_x as u16;

        // Indices always come from bank 0, attributes from bank 1.
        self.tile_index = ctx.vram.read(0, map_offset);
        self.attributes = if regs.extended() {
            TileAttributes::from_bits_retain(ctx.vram.read(1, map_offset))
        } else {
            TileAttributes::empty()
        };
        let fine_y = pixel_y % 8;
        self.tile_row = if self.attributes.contains(TileAttributes::Y_FLIP) { 7 - fine_y } else { fine_y };

        self.column_x = self.cursor_x;
        self.cursor_x += 8;
        self.column = self.column.wrapping_add(1);

        self.select_objects(ctx)
    }

    /// Collects every line object overlapping the column, in resolved priority
    /// order. The per-pixel limit is applied when the column is pushed.
    fn select_objects(&mut self, ctx: &mut PipelineContext) -> u8 {
        self.object_count = 0;
        let regs = ctx.registers;
        if ctx.objects.is_empty() || !regs.lcdc.contains(Lcdc::OBJ_ENABLE) {
            return 0;
        }

        let height = regs.object_height();
        let left = self.column_x;
        let right = left + 8;
        let mut penalty = 0;

        for slot in 0..ctx.objects.len() {
            let selected = ctx.objects.get(slot);
            let object_left = selected.x as i16 - OBJECT_X_BIAS;
            if object_left >= right || object_left + 8 <= left {
                continue;
            }

            let entry = ctx.oam.object(selected.index as usize);
            // Masked in case OBJ_SIZE shrank after the scan.
            let mut row = (ctx.line as i16 + OBJECT_Y_BIAS - selected.y as i16) as u8 & (height - 1);
            if entry.attributes.contains(TileAttributes::Y_FLIP) {
                row = height - 1 - row;
            }
            let tile = if height == 16 { entry.tile & 0xFE } else { entry.tile };
            let bank = if regs.extended() { entry.attributes.bank() } else { 0 };

            self.objects[self.object_count] = ObjectSlot {
                x: selected.x,
                row_address: TILE_BLOCK_UNSIGNED + tile as u16 * BYTES_PER_TILE + row as u16 * 2,
                bank,
                attributes: entry.attributes,
                low: 0,
                high: 0,
            };
            self.object_count += 1;

            if ctx.objects.mark_fetched(slot) {
                penalty += OBJECT_FETCH_PENALTY_DOTS;
            }
        }
        penalty
    }

    /// Composites the fetched column into the FIFO. Does nothing while the FIFO
    /// still holds more than eight pixels.
    fn push_pixels(&mut self, ctx: &PipelineContext, fifo: &mut PixelFifo) -> bool {
        if fifo.len() > FIFO_LOW_WATER {
            return false;
        }

        let regs = ctx.registers;
        let extended = regs.extended();
        let bg_enabled = regs.lcdc.contains(Lcdc::BG_WINDOW_ENABLE);
        let bg_x_flip = self.attributes.contains(TileAttributes::X_FLIP);
        let mut row = [0u32; 8];

        for (i, out) in row.iter_mut().enumerate() {
            let bit = if bg_x_flip { i as u8 } else { 7 - i as u8 };
            let bg_index = if extended || bg_enabled {
                palette::color_index(self.data_low, self.data_high, bit)
            } else {
                0
            };

            *out = if extended {
                palette::cgb_color(ctx.bg_palettes, self.attributes.palette(), bg_index)
            } else if bg_enabled {
                palette::dmg_color(regs.bgp, bg_index)
            } else {
                palette::DMG_SHADES[0]
            };

            let px = self.column_x + i as i16;
            // Only the first three objects covering this pixel are considered.
            let hit = self.objects[..self.object_count]
                .iter()
                .filter_map(|slot| slot.pixel_at(px).map(|index| (slot, index)))
                .take(OBJECTS_PER_PIXEL)
                .find(|&(_, index)| index != 0);

            if let Some((slot, index)) = hit {
                if self.object_wins(extended, bg_enabled, bg_index, slot.attributes) {
                    *out = if extended {
                        palette::cgb_color(ctx.obj_palettes, slot.attributes.palette(), index)
                    } else {
                        let palette_reg = if slot.attributes.contains(TileAttributes::DMG_PALETTE) {
                            regs.obp1
                        } else {
                            regs.obp0
                        };
                        palette::dmg_color(palette_reg, index)
                    };
                }
            }
        }

        let pushed = fifo.push_row(&row);
        debug_assert!(pushed);
        self.step = FetchStep::TileNumber;
        true
    }

    /// An opaque object pixel shows unless background priority suppresses it.
    fn object_wins(&self, extended: bool, bg_enabled: bool, bg_index: u8, object: TileAttributes) -> bool {
        if bg_index == 0 || !bg_enabled {
            return true;
        }
        if extended && self.attributes.contains(TileAttributes::BG_PRIORITY) {
            return false;
        }
        !object.contains(TileAttributes::BG_PRIORITY)
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetcher, FIFO and shifter state for one PixelTransfer phase.
#[derive(Debug, Clone)]
pub struct PixelPipeline {
    fetcher: Fetcher,
    fifo: PixelFifo,
    lx: u8,      // Next screen column to write
    discard: u8, // Pixels still to drop for fine scrolling
    dot: u16,    // Dots since PixelTransfer began
    stall: u8,
    window_start: Option<i16>,
    window_engaged: bool,
}

impl PixelPipeline {
    pub fn new() -> Self {
        PixelPipeline {
            fetcher: Fetcher::new(),
            fifo: PixelFifo::new(),
            lx: 0,
            discard: 0,
            dot: 0,
            stall: 0,
            window_start: None,
            window_engaged: false,
        }
    }

    /// Resets the transient state at the start of PixelTransfer.
    pub(super) fn start_line(&mut self, ctx: &PipelineContext) {
        let regs = ctx.registers;
        self.fifo.clear();
        self.lx = 0;
        self.dot = 0;
        self.stall = 0;
        self.window_engaged = false;
        self.window_start = if regs.window_visible_on(ctx.line) {
            Some(regs.wx as i16 - WINDOW_X_BIAS as i16)
        } else {
            None
        };

        match self.window_start {
            // Window already covers column 0: the pixels left of the screen are dropped.
            Some(start) if start <= 0 => {
                self.window_engaged = true;
                self.discard = (-start) as u8;
                self.fetcher.restart(FetchLayer::Window, start);
            }
            _ => {
                let fine_x = regs.scx % 8;
                self.discard = fine_x;
                self.fetcher.restart(FetchLayer::Background, -(fine_x as i16));
            }
        }
    }

    /// Advances the pipeline by one dot. Returns `true` once all 160 pixels of
    /// the line have been written.
    pub(super) fn step(&mut self, ctx: &mut PipelineContext, frame: &mut FrameBuffer) -> bool {
        if self.stall > 0 {
            self.stall -= 1;
            self.dot += 1;
            return false;
        }

        if let Some(start) = self.window_start {
            if !self.window_engaged && self.discard == 0 && self.lx as i16 == start {
                log::trace!("Window engaged at x={} on line {}", self.lx, ctx.line);
                self.window_engaged = true;
                self.fifo.clear();
                self.fetcher.restart(FetchLayer::Window, start);
            }
        }

        if self.fetcher.step() == FetchStep::PushPixels {
            self.fetcher.push_pixels(ctx, &mut self.fifo);
        } else if self.dot % 2 == 0 {
            self.stall += self.fetcher.advance(ctx);
        }

        if self.fifo.len() > FIFO_LOW_WATER {
            if let Some(color) = self.fifo.pop() {
                if self.discard > 0 {
                    self.discard -= 1;
                } else {
                    frame[ctx.line as usize * GB_WIDTH + self.lx as usize] = color;
                    self.lx += 1;
                }
            }
        }

        self.dot += 1;
        self.lx as usize == GB_WIDTH
    }

    /// Whether the window layer was drawn on the current line.
    #[inline]
    pub fn window_engaged(&self) -> bool {
        self.window_engaged
    }

    /// Dots spent in PixelTransfer so far on this line.
    #[inline]
    pub fn dots(&self) -> u16 {
        self.dot
    }
}

impl Default for PixelPipeline {
    fn default() -> Self {
        Self::new()
    }
}
