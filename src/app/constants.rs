use sdl2::pixels::Color;
use std::time::Duration;

pub use gbppu::ppu::{GB_HEIGHT, GB_WIDTH, TILE_DEBUG_HEIGHT, TILE_DEBUG_WIDTH};

// --- Timing ---
pub const TARGET_FPS: u32 = 60;
pub const TARGET_FRAME_DURATION: Duration = Duration::from_nanos(1_000_000_000u64 / TARGET_FPS as u64);

// --- Screen & Scaling ---
pub const DEFAULT_SCALE_FACTOR: u32 = 3; // How much to scale the screen by default
pub const MAX_SCALE_FACTOR: u32 = 8;

// --- Tile Sheet View ---
pub const TILE_VIEW_SCALE_FACTOR: u32 = 2;
pub const TILE_VIEW_WIDTH: u32 = TILE_DEBUG_WIDTH as u32 * TILE_VIEW_SCALE_FACTOR;
pub const TILE_VIEW_HEIGHT: u32 = TILE_DEBUG_HEIGHT as u32 * TILE_VIEW_SCALE_FACTOR;

// --- General UI ---
pub const PADDING: u32 = 10; // Padding between panes
pub const BACKGROUND_COLOR: Color = Color::RGB(20, 20, 20);

// --- Scrolling ---
pub const SCROLL_STEP: u8 = 1;

/// Window size for the screen at `scale` beside the tile sheet pane.
pub fn calculate_window_dims(scale: u32) -> (u32, u32) {
    let screen_width = GB_WIDTH as u32 * scale;
    let screen_height = GB_HEIGHT as u32 * scale;

    let total_window_width = screen_width + PADDING + TILE_VIEW_WIDTH;
    let total_window_height = std::cmp::max(screen_height, TILE_VIEW_HEIGHT);
    (total_window_width, total_window_height)
}
