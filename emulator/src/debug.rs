use std::fmt::Write;

use crate::state::MachineState;

use common::decoder::disasm_one;
use common::isa::Reg;

// Read-only snapshot handed to a DebugHandler at a breakpoint.
pub struct DebugView {
    pub registers: String,
    pub disassembly: Vec<String>,
}

pub fn register_dump(state: &MachineState) -> String {
    let r = |reg| state.reg_read(reg);
    let mut out = String::new();
    writeln!(out, "ax: {:04X}  bx: {:04X}  cx: {:04X}  dx: {:04X}",
        r(Reg::AX), r(Reg::BX), r(Reg::CX), r(Reg::DX)).unwrap();
    writeln!(out, "si: {:04X}  di: {:04X}  bp: {:04X}  sp: {:04X}",
        r(Reg::SI), r(Reg::DI), r(Reg::BP), r(Reg::SP)).unwrap();
    writeln!(out, "cs: {:04X}  ds: {:04X}  es: {:04X}  ss: {:04X}",
        r(Reg::CS), r(Reg::DS), r(Reg::ES), r(Reg::SS)).unwrap();
    writeln!(out, "ip: {:04X}  flags: {:08b}",
        state.ip(), state.flags.to_raw()).unwrap();
    out
}

// Linear disassembly of `count` instructions starting at `addr`.
pub fn disassemble(state: &MachineState, addr: u16, count: usize) -> Vec<String> {
    let mut lines = Vec::with_capacity(count);
    let mut at = addr as u32;
    for _ in 0..count {
        let mut window = Vec::new();
        for offset in 0..4 {
            match state.mem.read_byte(at + offset) {
                Ok(byte) => window.push(byte),
                Err(_) => break,
            }
        }
        if window.is_empty() {
            break;
        }
        let (text, len) = disasm_one(&window);
        lines.push(format!("{at:04X}: {text}"));
        at += len as u32;
    }
    lines
}

// Hex dump of a memory range, sixteen bytes per row.
pub fn dump_range(state: &MachineState, start: u32, len: u32) -> String {
    let mut out = String::new();
    let mut row = start;
    while row < start + len {
        write!(out, "{row:05X}:").unwrap();
        for addr in row..(row + 16).min(start + len) {
            match state.mem.read_byte(addr) {
                Ok(byte) => write!(out, " {byte:02X}").unwrap(),
                Err(_) => break,
            }
        }
        out.push('\n');
        row += 16;
    }
    out
}
