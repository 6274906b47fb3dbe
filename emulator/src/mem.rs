use common::constants::{FAULT_VECTOR, IVT_SHADOW_END, MEM_SIZE, MEMORY_FAULT_VECTOR};

use log::trace;
use thiserror::Error;

// Conditions raised inside the emulated machine. The execute loop converts
// every one of these into a synchronous interrupt dispatch, so a guest can
// install its own fault handlers; none of them are host-level errors.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    #[error("memory access out of bounds: 0x{0:05X}")]
    OutOfBounds(u32),

    #[error("free of corrupt allocation near 0x{0:05X}")]
    CorruptAllocation(u32),

    #[error("division by zero")]
    DivideByZero,
}

impl Fault {
    pub fn vector(&self) -> u16 {
        match self {
            Fault::CorruptAllocation(_) => MEMORY_FAULT_VECTOR,
            _ => FAULT_VECTOR,
        }
    }
}

// The flat 1 MiB byte array plus the parallel occupancy map. Every byte
// marked occupied belongs to the IVT shadow, a loaded program, or a live
// allocator block.
pub struct Memory {
    bytes: Vec<u8>,
    occupied: Vec<bool>,
}

impl Memory {
    pub fn new() -> Memory {
        let mut mem = Memory {
            bytes: vec![0; MEM_SIZE],
            occupied: vec![false; MEM_SIZE],
        };
        mem.set_occupied(0, IVT_SHADOW_END, true);
        mem
    }

    pub fn read_byte(&self, addr: u32) -> Result<u8, Fault> {
        self.bytes
            .get(addr as usize)
            .copied()
            .ok_or(Fault::OutOfBounds(addr))
    }

    pub fn write_byte(&mut self, addr: u32, val: u8) -> Result<(), Fault> {
        trace!("mem: writing {val:#04x} to 0x{addr:05X}");
        let Some(slot) = self.bytes.get_mut(addr as usize) else {
            return Err(Fault::OutOfBounds(addr));
        };
        *slot = val;
        Ok(())
    }

    // Words are stored high byte first, matching the stack layout.
    pub fn read_word(&self, addr: u32) -> Result<u16, Fault> {
        let upper = self.read_byte(addr)? as u16;
        let lower = self.read_byte(addr + 1)? as u16;
        Ok((upper << 8) | lower)
    }

    pub fn write_word(&mut self, addr: u32, val: u16) -> Result<(), Fault> {
        self.write_byte(addr, (val >> 8) as u8)?;
        self.write_byte(addr + 1, val as u8)
    }

    pub fn is_occupied(&self, addr: u32) -> bool {
        self.occupied.get(addr as usize).copied().unwrap_or(true)
    }

    // End exclusive, clamped to the address space.
    pub fn set_occupied(&mut self, start: u32, end: u32, val: bool) {
        let start = (start as usize).min(MEM_SIZE);
        let end = (end as usize).min(MEM_SIZE);
        self.occupied[start..end].fill(val);
    }

    pub fn occupied_bytes(&self) -> usize {
        self.occupied.iter().filter(|b| **b).count()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}
