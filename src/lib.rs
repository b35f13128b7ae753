//! Dot-accurate Game Boy / Game Boy Color pixel-processing unit.
//!
//! The [`ppu::Ppu`] is advanced one 4MHz dot at a time by a host that implements
//! [`ppu::PpuHost`]. [`memory_bus::MemoryBus`] is a ready-made host that owns a PPU and
//! the rest of a 16-bit address space.

pub mod memory_bus;
pub mod memory_map;
pub mod ppu;
