use crate::io::TraceSink;

use common::isa::{NUM_REGS, Reg};

use log::trace;

// Trace sink that forwards each executed instruction to the log facade.
#[derive(Default)]
pub struct LogTrace;

impl TraceSink for LogTrace {
    fn record(&mut self, ip: u16, opcode: u8, regs: &[u16; NUM_REGS]) {
        trace!(
            "ip {ip:04X} op {opcode:02X} ax={:04X} bx={:04X} cx={:04X} dx={:04X} sp={:04X}",
            regs[Reg::AX as usize],
            regs[Reg::BX as usize],
            regs[Reg::CX as usize],
            regs[Reg::DX as usize],
            regs[Reg::SP as usize],
        );
    }
}
