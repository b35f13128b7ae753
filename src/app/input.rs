use crate::constants::SCROLL_STEP;
use crate::emulator::Emulator;
use log::info;
use sdl2::EventPump;
use sdl2::event::Event;
use sdl2::keyboard::Keycode;

/// Polls SDL events and applies them to the emulator.
/// Returns `true` if the quit event was received, `false` otherwise.
pub fn handle_input(event_pump: &mut EventPump, emulator: &mut Emulator) -> bool {
    let step = SCROLL_STEP as i8;
    for event in event_pump.poll_iter() {
        match event {
            Event::Quit { .. }
            | Event::KeyDown {
                keycode: Some(Keycode::Escape),
                ..
            } => {
                info!("Exit requested.");
                return true; // Signal quit
            }
            Event::KeyDown {
                keycode: Some(key), ..
            } => match key {
                Keycode::Left => emulator.scroll(-step, 0),
                Keycode::Right => emulator.scroll(step, 0),
                Keycode::Up => emulator.scroll(0, -step),
                Keycode::Down => emulator.scroll(0, step),
                Keycode::G => emulator.toggle_graphics_mode(),
                Keycode::B => emulator.toggle_debug_bank(),
                _ => {}
            },
            _ => {} // Ignore other events
        }
    }
    false // Continue running
}
