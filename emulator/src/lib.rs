pub mod alloc;
pub mod debug;
pub mod interrupt;
pub mod io;
pub mod machine;
pub mod mem;
pub mod state;

pub use alloc::Allocator;
pub use io::{DebugHandler, HostError, ProgramStore, TraceSink, VideoPeripheral};
pub use machine::{ExecRet, Machine};
pub use mem::{Fault, Memory};
pub use state::{Flags, MachineState};
