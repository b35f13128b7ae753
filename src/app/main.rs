use clap::Parser;
use log::{LevelFilter, info};
use simple_logger::SimpleLogger;
use std::path::PathBuf;
use std::{thread, time::{Duration, Instant}};

// Declare modules located within the src/app/ directory
mod constants;
mod drawing;
mod emulator;
mod input;
mod sdl_setup;

use emulator::Emulator;

#[derive(Parser, Debug)]
struct Args {
    /// VRAM snapshot: 8KB or 16KB of tile memory, then optionally 160 bytes of
    /// object table and 128 bytes of palette RAM
    snapshot: PathBuf,

    /// Start in extended (colour) graphics mode
    #[arg(long)]
    extended: bool,

    /// Screen scale factor
    #[arg(long, default_value_t = constants::DEFAULT_SCALE_FACTOR)]
    scale: u32,

    /// Enable debug-level logging (DMA triggers, display on/off)
    #[arg(long)]
    debug: bool,

    /// Enable trace-level logging (highest verbosity, incl. every mode change)
    #[arg(long)]
    trace: bool,
}

fn main() -> Result<(), String> {
    let args = Args::parse();

    let level = if args.trace {
        LevelFilter::Trace
    } else if args.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    SimpleLogger::new()
        .with_level(LevelFilter::Off)
        .with_module_level(module_path!(), level)
        .with_module_level("gbppu", level)
        .init()
        .map_err(|e| e.to_string())?;

    let scale = args.scale.clamp(1, constants::MAX_SCALE_FACTOR);
    let snapshot_name = args.snapshot.file_name().unwrap_or_default().to_string_lossy();
    let window_title = format!("gbppu - {}", snapshot_name);

    let mut sdl_context = sdl_setup::init_sdl(&window_title, scale)?;
    let mut emulator = Emulator::new(&args.snapshot, args.extended)?;

    let screen_x = 0;
    let screen_y = 0;
    let tile_view_x = (constants::GB_WIDTH as u32 * scale + constants::PADDING) as i32;
    let tile_view_y = 0;

    info!("Starting main loop...");
    'main_loop: loop {
        let frame_start_time = Instant::now();

        // --- 1. Handle Input ---
        if input::handle_input(&mut sdl_context.event_pump, &mut emulator) {
            break 'main_loop;
        }

        // --- 2. Render One Frame ---
        emulator.run_frame();

        // --- 3. Drawing ---
        sdl_context.canvas.set_draw_color(constants::BACKGROUND_COLOR);
        sdl_context.canvas.clear();

        drawing::draw_gb_screen(
            &mut sdl_context.canvas,
            &sdl_context.texture_creator,
            emulator.memory_bus.ppu.frame_buffer(),
            screen_x,
            screen_y,
            scale,
        );
        drawing::draw_tile_sheet(
            &mut sdl_context.canvas,
            &sdl_context.texture_creator,
            emulator.memory_bus.ppu.tile_debug_buffer(),
            tile_view_x,
            tile_view_y,
        );

        sdl_context.canvas.present();

        // --- 4. Frame Timing ---
        let elapsed_time = frame_start_time.elapsed();
        if elapsed_time < constants::TARGET_FRAME_DURATION {
            let sleep_duration = constants::TARGET_FRAME_DURATION.saturating_sub(elapsed_time);
            if sleep_duration > Duration::from_millis(1) {
                thread::sleep(sleep_duration.saturating_sub(Duration::from_millis(1)));
            }
            while Instant::now() < frame_start_time + constants::TARGET_FRAME_DURATION {
                thread::yield_now();
            }
        }
    }

    info!("Viewer stopped after {} frames.", emulator.memory_bus.frames());
    Ok(())
}
