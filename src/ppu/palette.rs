use lazy_static::lazy_static;

use super::memory::PaletteRam;

/// Direct-mode shades as packed RGBA: white, light grey, dark grey, black.
pub const DMG_SHADES: [u32; 4] = [0xFFFF_FFFF, 0xAAAA_AAFF, 0x5555_55FF, 0x0000_00FF];

lazy_static! {
    /// Every RGB555 value expanded to packed RGBA, indexed by the raw 15-bit colour.
    static ref RGB555_TO_RGBA: Vec<u32> = (0..0x8000u16).map(expand_rgb555).collect();
}

fn expand_rgb555(raw: u16) -> u32 {
    // 5-bit channel to 8 bits, replicating the top bits into the bottom.
    let expand = |c: u16| -> u32 {
        let c = (c & 0x1F) as u32;
        (c << 3) | (c >> 2)
    };
    let r = expand(raw);
    let g = expand(raw >> 5);
    let b = expand(raw >> 10);
    (r << 24) | (g << 16) | (b << 8) | 0xFF
}

/// Packed RGBA for a raw little-endian RGB555 colour; bit 15 is ignored.
#[inline]
pub fn rgb555_to_rgba(raw: u16) -> u32 {
    RGB555_TO_RGBA[(raw & 0x7FFF) as usize]
}

/// Extracts the 2-bit shade selected by `index` from a direct-mode palette register.
#[inline(always)]
pub fn shade_from_palette(index: u8, palette_reg: u8) -> u8 {
    (palette_reg >> ((index & 0b11) * 2)) & 0b11
}

/// Direct mode: colour index through BGP/OBP0/OBP1 to a grey shade.
#[inline]
pub fn dmg_color(palette_reg: u8, index: u8) -> u32 {
    DMG_SHADES[shade_from_palette(index, palette_reg) as usize]
}

/// Extended mode: colour index and 3-bit palette number through CRAM.
#[inline]
pub fn cgb_color(cram: &PaletteRam, palette: u8, index: u8) -> u32 {
    rgb555_to_rgba(cram.color(palette, index))
}

/// Combines one pixel's bit-plane bits; `bit` 7 is the leftmost pixel.
#[inline(always)]
pub fn color_index(low: u8, high: u8, bit: u8) -> u8 {
    (((high >> bit) & 1) << 1) | ((low >> bit) & 1)
}
