use log::error;
use sdl2::pixels::PixelFormatEnum;
use sdl2::rect::Rect;
use sdl2::render::{Canvas, TextureCreator};
use sdl2::video::{Window, WindowContext};

use crate::constants;
use gbppu::ppu::{FrameBuffer, TileDebugBuffer};

/// Uploads a packed 0xRRGGBBAA buffer into a streaming texture and copies it,
/// scaled, to `target`.
fn blit_rgba(
    canvas: &mut Canvas<Window>,
    texture_creator: &TextureCreator<WindowContext>,
    pixels: &[u32],
    width: usize,
    height: usize,
    target: Rect,
) -> Result<(), String> {
    let mut texture = texture_creator
        .create_texture_streaming(PixelFormatEnum::RGBA8888, width as u32, height as u32)
        .map_err(|e| e.to_string())?;

    texture.with_lock(None, |buffer: &mut [u8], pitch: usize| {
        for y in 0..height {
            for x in 0..width {
                // RGBA8888 is a packed format, so native byte order matches 0xRRGGBBAA.
                let offset = y * pitch + x * 4;
                buffer[offset..offset + 4].copy_from_slice(&pixels[y * width + x].to_ne_bytes());
            }
        }
    })?;

    canvas.copy(&texture, None, Some(target))
}

/// Draws the screen.
pub fn draw_gb_screen(
    canvas: &mut Canvas<Window>,
    texture_creator: &TextureCreator<WindowContext>,
    frame_buffer: &FrameBuffer,
    target_x: i32,
    target_y: i32,
    scale: u32,
) {
    let target = Rect::new(
        target_x,
        target_y,
        constants::GB_WIDTH as u32 * scale,
        constants::GB_HEIGHT as u32 * scale,
    );
    if let Err(e) = blit_rgba(
        canvas,
        texture_creator,
        frame_buffer,
        constants::GB_WIDTH,
        constants::GB_HEIGHT,
        target,
    ) {
        error!("Failed to draw screen: {}", e);
    }
}

/// Draws the tile sheet debug view.
pub fn draw_tile_sheet(
    canvas: &mut Canvas<Window>,
    texture_creator: &TextureCreator<WindowContext>,
    tile_buffer: &TileDebugBuffer,
    target_x: i32,
    target_y: i32,
) {
    let target = Rect::new(target_x, target_y, constants::TILE_VIEW_WIDTH, constants::TILE_VIEW_HEIGHT);
    if let Err(e) = blit_rgba(
        canvas,
        texture_creator,
        tile_buffer,
        constants::TILE_DEBUG_WIDTH,
        constants::TILE_DEBUG_HEIGHT,
        target,
    ) {
        error!("Failed to draw tile sheet: {}", e);
    }
}
