use std::sync::{Arc, Mutex};

use crate::alloc::Allocator;
use crate::debug::{self, DebugView};
use crate::io::video::NullVideo;
use crate::io::{DebugHandler, HostError, ProgramStore, TraceSink, VideoPeripheral};
use crate::mem::Fault;
use crate::state::MachineState;

use common::constants::{BOOT_LOAD_ADDR, DISK_VECTOR, SECTOR_SIZE};
use common::decoder::{Opcode, decode};
use common::isa::Reg;
use common::misc::physical;

use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecRet {
    Ok,
    Halt,
}

// One execution session: the fetch-decode-execute loop plus everything it
// owns. All mutable machine state lives here; there are no module-level
// singletons.
pub struct Machine {
    pub(crate) state: MachineState,
    pub(crate) alloc: Allocator,
    pub(crate) video: Arc<Mutex<dyn VideoPeripheral>>,
    pub(crate) store: Option<Box<dyn ProgramStore>>,
    debug_handler: Option<Box<dyn DebugHandler>>,
    trace_sink: Option<Box<dyn TraceSink>>,
}

impl Machine {
    pub fn new() -> Machine {
        Machine {
            state: MachineState::new(),
            alloc: Allocator::new(),
            video: Arc::new(Mutex::new(NullVideo::default())),
            store: None,
            debug_handler: None,
            trace_sink: None,
        }
    }

    pub fn set_video(&mut self, video: impl VideoPeripheral + 'static) {
        self.set_video_handler(Arc::new(Mutex::new(video)));
    }

    pub fn set_video_handler(&mut self, video: Arc<Mutex<dyn VideoPeripheral>>) {
        self.video = video;
    }

    pub fn set_program_store(&mut self, store: impl ProgramStore + 'static) {
        self.store = Some(Box::new(store));
    }

    pub fn set_trace_sink(&mut self, sink: impl TraceSink + 'static) {
        self.trace_sink = Some(Box::new(sink));
    }

    pub fn set_debug_handler(&mut self, handler: impl DebugHandler + 'static) {
        self.debug_handler = Some(Box::new(handler));
    }

    pub fn set_vector(&mut self, n: u8, handler: u16) {
        self.state.ivt_write(n, handler);
    }

    pub fn set_breakpoint(&mut self, addr: u16) {
        self.state.breakpoints.insert(addr);
        self.state.debug_mode = true;
    }

    pub fn get_state(&self) -> &MachineState {
        &self.state
    }

    pub fn get_state_mut(&mut self) -> &mut MachineState {
        &mut self.state
    }

    pub fn reg_read(&self, reg: Reg) -> u16 {
        self.state.reg_read(reg)
    }

    pub fn reg_write(&mut self, reg: Reg, val: u16) {
        self.state.reg_write(reg, val);
    }

    ///////////////////////////////////////////////////////////////////////////
    // Loading

    // Program binaries land verbatim at address zero; execution begins there.
    pub fn load_program(&mut self, data: &[u8]) -> Result<(), Fault> {
        self.load_bytes_at(0, data)?;
        self.state.set_ip(0);
        Ok(())
    }

    pub(crate) fn load_bytes_at(&mut self, start: u32, data: &[u8]) -> Result<(), Fault> {
        for (i, byte) in data.iter().enumerate() {
            self.state.mem.write_byte(start + i as u32, *byte)?;
        }
        self.state.mem.set_occupied(start, start + data.len() as u32, true);
        Ok(())
    }

    // Slice a raw image into 512-byte sectors; the map is read-only afterwards.
    pub fn load_disk_image(&mut self, data: &[u8]) {
        for (index, chunk) in data.chunks(SECTOR_SIZE).enumerate() {
            let mut sector = [0u8; SECTOR_SIZE];
            sector[..chunk.len()].copy_from_slice(chunk);
            self.state.disk_insert(index as u16, sector);
        }
    }

    // Pull sector 0 in through the disk service and start executing it.
    pub fn boot_from_disk(&mut self) -> Result<(), HostError> {
        self.state.reg_write(Reg::CX, 0);
        self.state.reg_write(Reg::ES, 0);
        self.state.reg_write(Reg::BX, BOOT_LOAD_ADDR);
        self.interrupt(DISK_VECTOR);
        if self.state.reg_read(Reg::AX) != 0 {
            return Err(HostError::NoBootSector);
        }
        self.state.set_ip(BOOT_LOAD_ADDR);
        Ok(())
    }

    ///////////////////////////////////////////////////////////////////////////
    // The loop

    // Run until a halt or until a service clears the run flag.
    pub fn run(&mut self) {
        self.state.set_running(true);
        while self.state.running() {
            if self.step() == ExecRet::Halt {
                break;
            }
        }
        self.state.set_running(false);
    }

    pub fn run_at(&mut self, ip: u16) {
        self.state.set_ip(ip);
        self.run();
    }

    // Continue after halt.
    pub fn cont(&mut self) {
        self.run();
    }

    // Execute exactly one instruction, reporting its address.
    pub fn single_step(&mut self) -> (u16, ExecRet) {
        let ip = self.state.ip();
        (ip, self.step())
    }

    pub fn step(&mut self) -> ExecRet {
        self.state.inc_ins();
        let ip = self.state.ip();

        if self.state.debug_mode && self.state.breakpoints.contains(&ip) {
            self.debug_pause(ip);
        }

        match self.exec_ins(ip) {
            Ok(ret) => ret,
            Err(fault) => {
                self.fault(fault);
                ExecRet::Ok
            }
        }
    }

    fn exec_ins(&mut self, ins_start: u16) -> Result<ExecRet, Fault> {
        let mut byte = self.fetch_byte()?;
        let mut op = decode(byte);
        let mut rep = false;
        while op == Opcode::Rep {
            rep = true;
            byte = self.fetch_byte()?;
            op = decode(byte);
        }

        if let Some(sink) = self.trace_sink.as_mut() {
            sink.record(ins_start, byte, self.state.regs());
        }
        debug!("ip {ins_start:04X}: {op:?}");

        self.exec(op, ins_start, rep)
    }

    // Every fault inside the loop becomes a synchronous interrupt dispatch,
    // never a host-level crash.
    pub(crate) fn fault(&mut self, fault: Fault) {
        debug!("fault: {fault}");
        self.interrupt(fault.vector());
    }

    fn debug_pause(&mut self, ip: u16) {
        if let Some(mut handler) = self.debug_handler.take() {
            let view = DebugView {
                registers: debug::register_dump(&self.state),
                disassembly: debug::disassemble(&self.state, ip, 5),
            };
            handler.on_breakpoint(&view);
            self.debug_handler = Some(handler);
        }
    }

    ///////////////////////////////////////////////////////////////////////////
    // Operand fetch

    fn fetch_byte(&mut self) -> Result<u8, Fault> {
        let ip = self.state.ip();
        let byte = self.state.mem.read_byte(ip as u32)?;
        self.state.set_ip(ip.wrapping_add(1));
        Ok(byte)
    }

    // Immediates and jump targets are encoded high byte first...
    fn fetch_word(&mut self) -> Result<u16, Fault> {
        let upper = self.fetch_byte()? as u16;
        let lower = self.fetch_byte()? as u16;
        Ok((upper << 8) | lower)
    }

    // ...except the 0xB8 accumulator load, which is low byte first.
    fn fetch_word_le(&mut self) -> Result<u16, Fault> {
        let lower = self.fetch_byte()? as u16;
        let upper = self.fetch_byte()? as u16;
        Ok((upper << 8) | lower)
    }

    fn fetch_reg(&mut self) -> Result<Reg, Fault> {
        Ok(Reg::general(self.fetch_byte()?))
    }

    ///////////////////////////////////////////////////////////////////////////
    // Stack

    pub fn push_word(&mut self, val: u16) -> Result<(), Fault> {
        let sp = self.state.reg_read(Reg::SP).wrapping_sub(2);
        self.state.mem.write_word(sp as u32, val)?;
        self.state.reg_write(Reg::SP, sp);
        Ok(())
    }

    pub fn pop_word(&mut self) -> Result<u16, Fault> {
        let sp = self.state.reg_read(Reg::SP);
        let val = self.state.mem.read_word(sp as u32)?;
        self.state.reg_write(Reg::SP, sp.wrapping_add(2));
        Ok(val)
    }

    ///////////////////////////////////////////////////////////////////////////
    // Execute

    fn do_arith(&mut self, op: fn(i64, i64, i64) -> i64, write: bool) -> Result<(), Fault> {
        let dst = self.fetch_reg()?;
        let src = self.fetch_reg()?;
        let a = self.state.reg_read(dst) as i64;
        let b = self.state.reg_read(src) as i64;
        let carry = self.state.flags.get_carry() as i64;
        let raw = op(a, b, carry);
        if write {
            self.state.reg_write(dst, raw as u16);
        }
        self.state.flags.update_arithmetic(raw);
        Ok(())
    }

    fn do_logic(&mut self, op: fn(u16, u16) -> u16, write: bool) -> Result<(), Fault> {
        let dst = self.fetch_reg()?;
        let src = self.fetch_reg()?;
        let res = op(self.state.reg_read(dst), self.state.reg_read(src));
        if write {
            self.state.reg_write(dst, res);
        }
        self.state.flags.update_logic(res);
        Ok(())
    }

    fn do_jump(&mut self, taken: bool) -> Result<(), Fault> {
        let target = self.fetch_word()?;
        if taken {
            self.state.set_ip(target);
        }
        Ok(())
    }

    fn do_rotate(&mut self, left: bool) -> Result<(), Fault> {
        let reg = self.fetch_reg()?;
        let count = self.fetch_byte()?;
        let mut value = self.state.reg_read(reg);
        let mut last = false;
        for _ in 0..count {
            let bit = if left { (value >> 15) & 1 } else { value & 1 };
            value = if left {
                (value << 1) | bit
            } else {
                (value >> 1) | (bit << 15)
            };
            last = bit != 0;
        }
        self.state.reg_write(reg, value);
        self.state.flags.update_shift(value, last, count);
        Ok(())
    }

    fn string_delta(&self) -> u16 {
        if self.state.flags.get_direction() { 0xFFFF } else { 1 }
    }

    fn advance_string_reg(&mut self, reg: Reg) {
        let delta = self.string_delta();
        let val = self.state.reg_read(reg).wrapping_add(delta);
        self.state.reg_write(reg, val);
    }

    // The string family honors an optional repeat prefix: up to CX
    // iterations, CX decremented each time, with the compare variants
    // terminating early on their zero-flag condition.
    fn do_string(&mut self, op: Opcode, rep: bool) -> Result<(), Fault> {
        let count = if rep { self.state.reg_read(Reg::CX) } else { 1 };
        for _ in 0..count {
            let stop = match op {
                Opcode::Movsb => {
                    let src = physical(self.state.reg_read(Reg::DS), self.state.reg_read(Reg::SI));
                    let dst = physical(self.state.reg_read(Reg::ES), self.state.reg_read(Reg::DI));
                    let byte = self.state.mem.read_byte(src)?;
                    self.state.mem.write_byte(dst, byte)?;
                    self.advance_string_reg(Reg::SI);
                    self.advance_string_reg(Reg::DI);
                    false
                }
                Opcode::Cmpsb => {
                    let src = physical(self.state.reg_read(Reg::DS), self.state.reg_read(Reg::SI));
                    let dst = physical(self.state.reg_read(Reg::ES), self.state.reg_read(Reg::DI));
                    let res = self.state.mem.read_byte(src)? as i64
                        - self.state.mem.read_byte(dst)? as i64;
                    self.state.flags.update_arithmetic(res);
                    self.advance_string_reg(Reg::SI);
                    self.advance_string_reg(Reg::DI);
                    res != 0
                }
                Opcode::Scasb => {
                    let addr = physical(self.state.reg_read(Reg::ES), self.state.reg_read(Reg::DI));
                    let res = (self.state.reg_read(Reg::AX) & 0xFF) as i64
                        - self.state.mem.read_byte(addr)? as i64;
                    self.state.flags.update_arithmetic(res);
                    self.advance_string_reg(Reg::DI);
                    res == 0
                }
                _ => unreachable!(),
            };

            if rep {
                let cx = self.state.reg_read(Reg::CX).wrapping_sub(1);
                self.state.reg_write(Reg::CX, cx);
                if cx == 0 || stop {
                    break;
                }
            }
        }
        Ok(())
    }

    fn exec(&mut self, op: Opcode, ins_start: u16, rep: bool) -> Result<ExecRet, Fault> {
        use Opcode::*;
        match op {
            MovImm => {
                let reg = self.fetch_reg()?;
                let imm = self.fetch_word()?;
                self.state.reg_write(reg, imm);
            }
            MovAxImm => {
                let imm = self.fetch_word_le()?;
                self.state.reg_write(Reg::AX, imm);
            }

            Add => self.do_arith(|a, b, _| a + b, true)?,
            Sub => self.do_arith(|a, b, _| a - b, true)?,
            Adc => self.do_arith(|a, b, c| a + b + c, true)?,
            Sbb => self.do_arith(|a, b, c| a - b - c, true)?,
            Cmp => self.do_arith(|a, b, _| a - b, false)?,

            And => self.do_logic(|a, b| a & b, true)?,
            Or => self.do_logic(|a, b| a | b, true)?,
            Xor => self.do_logic(|a, b| a ^ b, true)?,
            Test => self.do_logic(|a, b| a & b, false)?,
            Not => {
                let reg = self.fetch_reg()?;
                let res = !self.state.reg_read(reg);
                self.state.reg_write(reg, res);
                self.state.flags.update_logic(res);
            }

            Inc | Dec => {
                let reg = self.fetch_reg()?;
                let val = self.state.reg_read(reg);
                let res = if op == Inc {
                    val.wrapping_add(1)
                } else {
                    val.wrapping_sub(1)
                };
                self.state.reg_write(reg, res);
                self.state.flags.update_arithmetic(res as i64);
            }

            Shl => {
                let reg = self.fetch_reg()?;
                let count = self.fetch_byte()?;
                let value = self.state.reg_read(reg);
                let result = if count >= 16 { 0 } else { value << count };
                let last = match count {
                    0 => false,
                    c if c <= 16 => (value >> (16 - c as u16)) & 1 != 0,
                    _ => false,
                };
                self.state.reg_write(reg, result);
                self.state.flags.update_shift(result, last, count);
            }
            Rol => self.do_rotate(true)?,
            Ror => self.do_rotate(false)?,

            Mul => {
                let reg = self.fetch_reg()?;
                let raw = self.state.reg_read(Reg::AX) as u32 * self.state.reg_read(reg) as u32;
                self.state.reg_write(Reg::DX, (raw >> 16) as u16);
                self.state.reg_write(Reg::AX, raw as u16);
                self.state.flags.update_arithmetic(raw as i64);
            }
            Div => {
                let reg = self.fetch_reg()?;
                let divisor = self.state.reg_read(reg) as u32;
                if divisor == 0 {
                    return Err(Fault::DivideByZero);
                }
                let dividend = ((self.state.reg_read(Reg::DX) as u32) << 16)
                    | self.state.reg_read(Reg::AX) as u32;
                self.state.reg_write(Reg::AX, (dividend / divisor) as u16);
                self.state.reg_write(Reg::DX, (dividend % divisor) as u16);
            }

            Jmp => self.do_jump(true)?,
            Jz => self.do_jump(self.state.flags.get_zero())?,
            Jnz => self.do_jump(!self.state.flags.get_zero())?,
            Jc => self.do_jump(self.state.flags.get_carry())?,
            Jnc => self.do_jump(!self.state.flags.get_carry())?,
            Jg => {
                let flags = &self.state.flags;
                let taken = !flags.get_zero() && flags.get_sign() == flags.get_overflow();
                self.do_jump(taken)?;
            }
            JmpShort => {
                let rel = self.fetch_byte()? as i8;
                self.state.set_ip(ins_start.wrapping_add(rel as u16));
            }
            Loop => {
                let reg = self.fetch_reg()?;
                let rel = self.fetch_byte()? as i8;
                let val = self.state.reg_read(reg).wrapping_sub(1);
                self.state.reg_write(reg, val);
                if val != 0 {
                    self.state.set_ip(ins_start.wrapping_add(rel as u16));
                }
            }

            Call => {
                let target = self.fetch_word()?;
                self.push_word(self.state.ip())?;
                self.state.set_ip(target);
            }
            Ret => {
                let ip = self.pop_word()?;
                self.state.set_ip(ip);
            }

            Push(reg) => self.push_word(self.state.reg_read(reg))?,
            Pop(reg) => {
                let val = self.pop_word()?;
                self.state.reg_write(reg, val);
            }
            PushFlags => self.push_word(self.state.flags.to_raw() as u16)?,
            PopFlags => {
                let raw = self.pop_word()?;
                self.state.flags = crate::state::Flags::from_raw(raw as u8);
            }
            Pusha => {
                let sp = self.state.reg_read(Reg::SP);
                for reg in [Reg::AX, Reg::CX, Reg::DX, Reg::BX] {
                    self.push_word(self.state.reg_read(reg))?;
                }
                self.push_word(sp)?;
                for reg in [Reg::BP, Reg::SI, Reg::DI] {
                    self.push_word(self.state.reg_read(reg))?;
                }
            }
            Popa => {
                for reg in [Reg::DI, Reg::SI, Reg::BP] {
                    let val = self.pop_word()?;
                    self.state.reg_write(reg, val);
                }
                self.pop_word()?; // Pushed SP is discarded
                for reg in [Reg::BX, Reg::DX, Reg::CX, Reg::AX] {
                    let val = self.pop_word()?;
                    self.state.reg_write(reg, val);
                }
            }

            StoreAx => {
                let addr = self.state.reg_read(Reg::BX) as u32;
                self.state.mem.write_word(addr, self.state.reg_read(Reg::AX))?;
            }
            LoadAx => {
                let addr = self.state.reg_read(Reg::BX) as u32;
                let val = self.state.mem.read_word(addr)?;
                self.state.reg_write(Reg::AX, val);
            }
            Lea => {
                let reg = self.fetch_reg()?;
                let addr = self.fetch_word()?;
                self.state.reg_write(reg, addr);
            }
            Lodsb => {
                let addr = physical(self.state.reg_read(Reg::DS), self.state.reg_read(Reg::SI));
                let val = self.state.mem.read_byte(addr)?;
                self.state.reg_write(Reg::AX, val as u16);
                self.advance_string_reg(Reg::SI);
            }
            Stosb => {
                let addr = physical(self.state.reg_read(Reg::ES), self.state.reg_read(Reg::DI));
                self.state.mem.write_byte(addr, self.state.reg_read(Reg::AX) as u8)?;
                self.advance_string_reg(Reg::DI);
            }
            Movsb | Cmpsb | Scasb => self.do_string(op, rep)?,

            Clc => self.state.flags.set_carry(false),
            Stc => self.state.flags.set_carry(true),
            Cld => self.state.flags.set_direction(false),
            Std => self.state.flags.set_direction(true),
            IntFlag => {
                let val = self.fetch_byte()?;
                self.state.flags.set_interrupt_enable(val == 0x01);
            }

            In => {
                let port = self.fetch_byte()? as u16;
                let val = self.state.port_read(port);
                self.state.reg_write(Reg::AX, val);
            }
            Out => {
                let port = self.fetch_byte()? as u16;
                let val = self.state.reg_read(Reg::AX) & 0xFF;
                self.state.port_write(port, val);
            }

            Int => {
                let n = self.fetch_byte()?;
                self.interrupt(n as u16);
            }

            Halt => return Ok(ExecRet::Halt),
            Rep => {} // Bare prefix with nothing to modify
            Db(_) => {}
        }

        Ok(ExecRet::Ok)
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}
