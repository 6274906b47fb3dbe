use std::collections::{BTreeMap, HashSet, VecDeque};

use crate::mem::Memory;

use common::constants::{IVT_LEN, KEYBOARD_STATUS_PORT, NUM_PORTS, SECTOR_SIZE};
use common::isa::{NUM_REGS, Reg};

use log::trace;

#[derive(Default, Debug)]
pub struct Flags(u8);

impl Flags {
    pub const ZERO_SHIFT: u8 = 0;
    pub const SIGN_SHIFT: u8 = 1;
    pub const CARRY_SHIFT: u8 = 2;
    pub const OVERFLOW_SHIFT: u8 = 3;
    const INT_ENABLE_SHIFT: u8 = 4;
    const DIRECTION_SHIFT: u8 = 5;

    pub const Z: u8 = 1 << Self::ZERO_SHIFT;
    pub const S: u8 = 1 << Self::SIGN_SHIFT;
    pub const C: u8 = 1 << Self::CARRY_SHIFT;
    pub const O: u8 = 1 << Self::OVERFLOW_SHIFT;

    pub fn new() -> Flags {
        Default::default()
    }

    pub fn from_raw(raw: u8) -> Flags {
        Flags(raw)
    }

    pub fn to_raw(&self) -> u8 {
        self.0
    }

    fn get(&self, shift: u8) -> bool {
        (self.0 >> shift) & 0x1 != 0
    }

    fn set(&mut self, shift: u8, val: bool) {
        self.0 &= !(1u8 << shift);
        self.0 |= (val as u8) << shift;
    }

    pub fn get_zero(&self) -> bool {
        self.get(Self::ZERO_SHIFT)
    }

    pub fn set_zero(&mut self, val: bool) {
        self.set(Self::ZERO_SHIFT, val);
    }

    pub fn get_sign(&self) -> bool {
        self.get(Self::SIGN_SHIFT)
    }

    pub fn set_sign(&mut self, val: bool) {
        self.set(Self::SIGN_SHIFT, val);
    }

    pub fn get_carry(&self) -> bool {
        self.get(Self::CARRY_SHIFT)
    }

    pub fn set_carry(&mut self, val: bool) {
        self.set(Self::CARRY_SHIFT, val);
    }

    pub fn get_overflow(&self) -> bool {
        self.get(Self::OVERFLOW_SHIFT)
    }

    pub fn set_overflow(&mut self, val: bool) {
        self.set(Self::OVERFLOW_SHIFT, val);
    }

    pub fn get_interrupt_enable(&self) -> bool {
        self.get(Self::INT_ENABLE_SHIFT)
    }

    pub fn set_interrupt_enable(&mut self, val: bool) {
        self.set(Self::INT_ENABLE_SHIFT, val);
    }

    pub fn get_direction(&self) -> bool {
        self.get(Self::DIRECTION_SHIFT)
    }

    pub fn set_direction(&mut self, val: bool) {
        self.set(Self::DIRECTION_SHIFT, val);
    }

    ///////////////////////////////////////////////////////////////////////////
    // The three canonical update procedures. Every flag-affecting opcode
    // handler goes through exactly one of these; the arithmetic bits are
    // recomputed wholesale, never patched. Interrupt-enable and direction
    // are untouched.

    pub fn update_arithmetic(&mut self, raw: i64) {
        let value = raw as u16;
        self.set_zero(value == 0);
        self.set_sign(value & 0x8000 != 0);
        self.set_carry(!(0..=0xFFFF).contains(&raw));
        self.set_overflow(!(-32768..=32767).contains(&raw));
    }

    pub fn update_logic(&mut self, value: u16) {
        self.set_zero(value == 0);
        self.set_sign(value & 0x8000 != 0);
        self.set_carry(false);
        self.set_overflow(false);
    }

    pub fn update_shift(&mut self, value: u16, last_bit: bool, count: u8) {
        self.set_zero(value == 0);
        self.set_sign(value & 0x8000 != 0);
        self.set_carry(count > 0 && last_bit);
        self.set_overflow(false);
    }
}

// All mutable machine state, separate from the execute loop so the debug
// surface and interrupt services can borrow it whole.
pub struct MachineState {
    num_ins: usize,
    regs: [u16; NUM_REGS],
    pub flags: Flags,
    pub mem: Memory,
    ivt: [u16; IVT_LEN],
    ports: Vec<u16>,
    disk: BTreeMap<u16, [u8; SECTOR_SIZE]>,
    keys: VecDeque<u8>,
    pub breakpoints: HashSet<u16>,
    pub debug_mode: bool,
    running: bool,
}

impl MachineState {
    pub fn new() -> Self {
        let mut state = MachineState {
            num_ins: 0,
            regs: [0; NUM_REGS],
            flags: Flags::new(),
            mem: Memory::new(),
            ivt: [0; IVT_LEN],
            ports: vec![0; NUM_PORTS],
            disk: BTreeMap::new(),
            keys: VecDeque::new(),
            breakpoints: HashSet::new(),
            debug_mode: false,
            running: false,
        };
        state.reg_write(Reg::SP, 0xFFFF);
        state
    }

    pub fn inc_ins(&mut self) {
        self.num_ins += 1;
    }

    pub fn num_ins(&self) -> usize {
        self.num_ins
    }

    pub fn reg_read(&self, reg: Reg) -> u16 {
        self.regs[reg as usize]
    }

    pub fn reg_write(&mut self, reg: Reg, val: u16) {
        trace!("reg: writing {val:#06x} to {reg}");
        self.regs[reg as usize] = val;
    }

    pub fn regs(&self) -> &[u16; NUM_REGS] {
        &self.regs
    }

    pub fn ip(&self) -> u16 {
        self.reg_read(Reg::IP)
    }

    pub fn set_ip(&mut self, ip: u16) {
        self.reg_write(Reg::IP, ip);
    }

    pub fn ivt_read(&self, n: u16) -> u16 {
        self.ivt[n as usize % IVT_LEN]
    }

    pub fn ivt_write(&mut self, n: u8, handler: u16) {
        self.ivt[n as usize] = handler;
    }

    pub fn port_read(&self, port: u16) -> u16 {
        self.ports[port as usize]
    }

    pub fn port_write(&mut self, port: u16, val: u16) {
        self.ports[port as usize] = val;
    }

    pub fn disk_insert(&mut self, index: u16, sector: [u8; SECTOR_SIZE]) {
        self.disk.insert(index, sector);
    }

    pub fn disk_sector(&self, index: u16) -> Option<&[u8; SECTOR_SIZE]> {
        self.disk.get(&index)
    }

    // The status port mirrors the most recent key so polling via `in` works
    // without the interrupt service.
    pub fn push_key(&mut self, key: u8) {
        self.keys.push_back(key);
        self.port_write(KEYBOARD_STATUS_PORT, key as u16);
    }

    pub fn pop_key(&mut self) -> Option<u8> {
        self.keys.pop_front()
    }

    pub fn peek_key(&self) -> Option<u8> {
        self.keys.front().copied()
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn set_running(&mut self, val: bool) {
        self.running = val;
    }
}

impl Default for MachineState {
    fn default() -> Self {
        Self::new()
    }
}
