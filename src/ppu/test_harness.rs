// Deterministic host used by the PPU tests: a flat 64KB memory for DMA sources,
// an interrupt log and a frame counter.

use super::{FrameBuffer, Interrupt, Ppu, PpuHost, PpuMode};

pub struct MockHost {
    pub memory: Box<[u8; 0x10000]>,
    pub interrupts: Vec<Interrupt>,
    pub frames: usize,
    pub last_frame: Option<Box<FrameBuffer>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            memory: Box::new([0; 0x10000]),
            interrupts: Vec::new(),
            frames: 0,
            last_frame: None,
        }
    }

    pub fn write(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }

    pub fn count(&self, kind: Interrupt) -> usize {
        self.interrupts.iter().filter(|&&i| i == kind).count()
    }
}

impl PpuHost for MockHost {
    fn read_byte(&self, addr: u16) -> u8 {
        self.memory[addr as usize]
    }

    fn request_interrupt(&mut self, interrupt: Interrupt) {
        self.interrupts.push(interrupt);
    }

    fn frame_rendered(&mut self, frame: &FrameBuffer) {
        self.frames += 1;
        self.last_frame = Some(Box::new(*frame));
    }
}

/// Ticks the display and OAM DMA engines together, `n` times.
pub fn run_ticks(ppu: &mut Ppu, host: &mut MockHost, n: usize) {
    for _ in 0..n {
        ppu.tick(host);
        ppu.tick_oam_dma(host);
    }
}

/// Ticks until the PPU reports `mode`, returning the number of ticks taken.
pub fn run_until_mode(ppu: &mut Ppu, host: &mut MockHost, mode: PpuMode) -> usize {
    let mut ticks = 0;
    while ppu.mode() != mode {
        run_ticks(ppu, host, 1);
        ticks += 1;
        assert!(ticks <= 2 * 70224, "never reached {mode:?}");
    }
    ticks
}

/// Ticks until `frames` more frames have been delivered to the host.
pub fn run_frames(ppu: &mut Ppu, host: &mut MockHost, frames: usize) -> usize {
    let target = host.frames + frames;
    let mut ticks = 0;
    while host.frames < target {
        run_ticks(ppu, host, 1);
        ticks += 1;
    }
    ticks
}
