/// Display modes, numbered as they appear in STAT bits 0-1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PpuMode {
    HorizontalBlank = 0,
    VerticalBlank = 1,
    ObjectScan = 2,
    PixelTransfer = 3,
}

impl PpuMode {
    #[inline]
    pub fn bits(self) -> u8 {
        self as u8
    }
}

/// Holds the internal timing state of the PPU.
#[derive(Debug, Clone)]
pub struct PpuState {
    pub(super) mode: PpuMode,
    pub(super) line_dot: u16, // Dot within the current scanline (0-455)
    pub(super) scanline: u8, // LY, 0-153
    pub(super) lyc_eq_ly: bool,
    pub(super) stat_interrupt_line: bool, // Level of the coincidence source, for edge detection
    pub(super) mode_entered: bool, // Set for the tick on which the mode changed
    pub(super) window_line: u8, // Incremented only on lines where the window was drawn
    pub(super) hblank_entered: bool, // Set for the tick on which HBlank began
    pub(super) disabled_dots: u32, // Frame pacing while the display is off
    pub(super) last_transfer_dots: u16, // Length of the most recent PixelTransfer
}

impl PpuState {
    pub fn new() -> Self {
        PpuState {
            mode: PpuMode::ObjectScan,
            line_dot: 0,
            scanline: 0,
            lyc_eq_ly: false,
            stat_interrupt_line: false,
            mode_entered: false,
            window_line: 0,
            hblank_entered: false,
            disabled_dots: 0,
            last_transfer_dots: 0,
        }
    }

    /// LY reads 0 and STAT reports mode 0 while the display is off.
    pub(super) fn reset_for_display_off(&mut self) {
        self.mode = PpuMode::HorizontalBlank;
        self.line_dot = 0;
        self.scanline = 0;
        self.lyc_eq_ly = false;
        self.stat_interrupt_line = false;
        self.mode_entered = false;
        self.window_line = 0;
        self.hblank_entered = false;
        self.disabled_dots = 0;
    }

    /// Turning the display on restarts the frame at line 0, dot 0.
    pub(super) fn reset_for_display_on(&mut self) {
        *self = PpuState::new();
    }
}

impl Default for PpuState {
    fn default() -> Self {
        Self::new()
    }
}
