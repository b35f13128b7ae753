use super::constants::*;
use super::memory::Vram;
use super::palette::DMG_SHADES;

pub type TileDebugBuffer = [u32; TILE_DEBUG_BUFFER_SIZE];

/// Renders the 384 tiles of one tile memory bank ($8000-$97FF) into a 16-tile-wide
/// sheet, using the fixed grey ramp instead of any palette register.
pub(super) fn render_tile_sheet(buffer: &mut TileDebugBuffer, vram: &Vram, bank: usize) {
    for tile_idx in 0..NUM_TILES_TO_SHOW {
        let tile_offset = TILE_BLOCK_UNSIGNED + (tile_idx as u16) * BYTES_PER_TILE;

        // Where this tile goes in the sheet
        let base_pixel_x = (tile_idx % TILES_PER_ROW_DEBUG) * 8;
        let base_pixel_y = (tile_idx / TILES_PER_ROW_DEBUG) * 8;

        for y_in_tile in 0..8u16 {
            let low = vram.read(bank, tile_offset + y_in_tile * 2);
            let high = vram.read(bank, tile_offset + y_in_tile * 2 + 1);
            let row_start = (base_pixel_y + y_in_tile as usize) * TILE_DEBUG_WIDTH + base_pixel_x;

            for x_in_tile in 0..8u8 {
                let index = super::palette::color_index(low, high, 7 - x_in_tile);
                buffer[row_start + x_in_tile as usize] = DMG_SHADES[index as usize];
            }
        }
    }
}
