pub mod store;
pub mod trace;
pub mod video;

use crate::debug::DebugView;

use common::isa::NUM_REGS;

use thiserror::Error;

// Conditions originating outside the emulated machine. These surface to the
// calling shell as plain errors; they are never converted into CPU faults.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("program '{0}' not found")]
    ProgramNotFound(String),

    #[error("disk image holds no boot sector")]
    NoBootSector,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// Display backend driven by the video interrupt service. The controller
// forwards calls verbatim and renders nothing itself; a backend owns all of
// its render state, including the cursor.
pub trait VideoPeripheral: Send {
    fn set_mode(&mut self, mode: u8);
    fn put_char(&mut self, ch: u8, attr: u8);
    fn set_cursor(&mut self, x: u8, y: u8);
    fn cursor(&self) -> (u8, u8);
    fn set_cursor_shape(&mut self, start: u8, end: u8);
    fn cursor_shape(&self) -> (u8, u8);
    fn select_page(&mut self, page: u8);
    fn draw_pixel(&mut self, x: u16, y: u16, color: u8);
    fn set_palette_entry(&mut self, index: u16, r: u8, g: u8, b: u8);
    fn load_font(&mut self, name: &str, data: &[u8], width: u8, height: u8);
    fn create_gradient(&mut self, width: u16, height: u16, from: (u8, u8, u8), to: (u8, u8, u8));
}

// Source of program binaries for the DOS load-and-execute service and the
// shell's run command.
pub trait ProgramStore: Send {
    fn read_program(&self, name: &str) -> Result<Vec<u8>, HostError>;
}

// Per-instruction observer. The execute loop calls this only when a sink is
// installed; with none installed tracing costs nothing.
pub trait TraceSink: Send {
    fn record(&mut self, ip: u16, opcode: u8, regs: &[u16; NUM_REGS]);
}

// Called when execution reaches a breakpoint in debug mode. The loop is
// suspended until the handler returns.
pub trait DebugHandler: Send {
    fn on_breakpoint(&mut self, view: &DebugView);
}
