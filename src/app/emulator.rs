use gbppu::memory_bus::MemoryBus;
use gbppu::memory_map;
use gbppu::ppu::{Lcdc, PpuMode};
use log::{debug, info};
use std::fs;
use std::path::Path;

const VRAM_BANK_BYTES: usize = 0x2000;
const OAM_BYTES: usize = 160;
const CRAM_BYTES: usize = 64;

/// Pieces of a VRAM snapshot: one or two tile memory banks, then optionally the
/// object table, then optionally both palette RAMs.
struct Snapshot<'a> {
    banks: Vec<&'a [u8]>,
    oam: Option<&'a [u8]>,
    bg_cram: Option<&'a [u8]>,
    obj_cram: Option<&'a [u8]>,
}

impl<'a> Snapshot<'a> {
    fn parse(data: &'a [u8]) -> Result<Self, String> {
        let bank_count = [2usize, 1]
            .into_iter()
            .find(|&banks| {
                match data.len().checked_sub(banks * VRAM_BANK_BYTES) {
                    Some(rest) => rest == 0 || rest == OAM_BYTES || rest == OAM_BYTES + 2 * CRAM_BYTES,
                    None => false,
                }
            })
            .ok_or_else(|| format!("Unrecognised snapshot size: {} bytes", data.len()))?;

        let (vram, rest) = data.split_at(bank_count * VRAM_BANK_BYTES);
        let banks = vram.chunks(VRAM_BANK_BYTES).collect();
        let (oam, rest) = if rest.len() >= OAM_BYTES {
            let (oam, rest) = rest.split_at(OAM_BYTES);
            (Some(oam), rest)
        } else {
            (None, rest)
        };
        let (bg_cram, obj_cram) = if rest.len() == 2 * CRAM_BYTES {
            let (bg, obj) = rest.split_at(CRAM_BYTES);
            (Some(bg), Some(obj))
        } else {
            (None, None)
        };

        Ok(Snapshot {
            banks,
            oam,
            bg_cram,
            obj_cram,
        })
    }
}

/// Drives a `MemoryBus` loaded from a snapshot, one frame at a time.
pub struct Emulator {
    pub memory_bus: MemoryBus,
    pub debug_bank: usize,
}

impl Emulator {
    pub fn new(snapshot_path: &Path, extended: bool) -> Result<Self, String> {
        let data = fs::read(snapshot_path)
            .map_err(|e| format!("Failed to read snapshot '{}': {}", snapshot_path.display(), e))?;
        let snapshot = Snapshot::parse(&data)?;

        let mut memory_bus = MemoryBus::new();
        Self::load_snapshot(&mut memory_bus, &snapshot, extended);
        info!(
            "Loaded {} ({} bank(s), oam: {}, palettes: {})",
            snapshot_path.display(),
            snapshot.banks.len(),
            snapshot.oam.is_some(),
            snapshot.bg_cram.is_some()
        );

        Ok(Emulator {
            memory_bus,
            debug_bank: 0,
        })
    }

    /// Writes the snapshot through the bus with the display off, so no mode
    /// arbitration gets in the way.
    fn load_snapshot(bus: &mut MemoryBus, snapshot: &Snapshot, extended: bool) {
        while bus.ppu.mode() != PpuMode::VerticalBlank {
            bus.tick();
        }
        let lcdc = bus.read_byte(memory_map::LCDC_ADDR);
        bus.write_byte(memory_map::LCDC_ADDR, lcdc & !Lcdc::DISPLAY_ENABLE.bits());
        debug!("Display off for snapshot load");

        for (bank, data) in snapshot.banks.iter().enumerate() {
            bus.write_byte(memory_map::VBK_ADDR, bank as u8);
            for (i, &byte) in data.iter().enumerate() {
                bus.write_byte(memory_map::VRAM_START + i as u16, byte);
            }
        }
        bus.write_byte(memory_map::VBK_ADDR, 0);

        if let Some(oam) = snapshot.oam {
            for (i, &byte) in oam.iter().enumerate() {
                bus.write_byte(memory_map::OAM_START + i as u16, byte);
            }
        }

        let palettes = [
            (memory_map::BCPS_ADDR, memory_map::BCPD_ADDR, snapshot.bg_cram),
            (memory_map::OCPS_ADDR, memory_map::OCPD_ADDR, snapshot.obj_cram),
        ];
        for (index_reg, data_reg, cram) in palettes {
            if let Some(cram) = cram {
                bus.write_byte(index_reg, 0x80); // Start at 0 with auto-increment
                for &byte in cram {
                    bus.write_byte(data_reg, byte);
                }
            }
        }

        bus.write_byte(memory_map::GRAPHICS_MODE_ADDR, u8::from(extended));
        let lcdc = lcdc | (Lcdc::DISPLAY_ENABLE | Lcdc::OBJ_ENABLE).bits();
        bus.write_byte(memory_map::LCDC_ADDR, lcdc);
    }

    pub fn toggle_graphics_mode(&mut self) {
        let mode = self.memory_bus.read_byte(memory_map::GRAPHICS_MODE_ADDR);
        let next = u8::from(mode == 0);
        self.memory_bus.write_byte(memory_map::GRAPHICS_MODE_ADDR, next);
        info!("Graphics mode: {}", if next == 0 { "direct" } else { "extended" });
    }

    pub fn toggle_debug_bank(&mut self) {
        self.debug_bank ^= 1;
        info!("Tile sheet bank: {}", self.debug_bank);
    }

    /// Adds `dx`/`dy` to SCX/SCY, wrapping.
    pub fn scroll(&mut self, dx: i8, dy: i8) {
        let scx = self.memory_bus.read_byte(memory_map::SCX_ADDR);
        let scy = self.memory_bus.read_byte(memory_map::SCY_ADDR);
        self.memory_bus.write_byte(memory_map::SCX_ADDR, scx.wrapping_add_signed(dx));
        self.memory_bus.write_byte(memory_map::SCY_ADDR, scy.wrapping_add_signed(dy));
    }

    /// Runs the PPU until it delivers a frame, then refreshes the tile sheet.
    pub fn run_frame(&mut self) {
        self.memory_bus.run_frame();
        self.memory_bus.ppu.update_tile_debug_buffer(self.debug_bank);
    }
}
