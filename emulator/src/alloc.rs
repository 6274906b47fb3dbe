use crate::mem::{Fault, Memory};

use common::constants::{ALLOC_FAILED, MCB_HEADER_LEN, MCB_SIGNATURE};
use common::misc::ToU16P;

use log::debug;

// First-fit block allocator over the occupancy map. Block headers (MCBs)
// live in-band: bytes 0-1 hold the little-endian payload size, byte 2 the
// signature marking a valid block. The search walks 16-byte-aligned strides
// starting at the cursor left by the previous allocation.
pub struct Allocator {
    cursor: u32,
}

impl Allocator {
    // Allocations are handed back through a 16-bit register, so the arena
    // is confined to the low 64 KiB of the address space.
    const ARENA_END: u32 = 1 << 16;

    pub fn new() -> Allocator {
        Allocator { cursor: 0 }
    }

    // Returns the payload address (just past the header), or ALLOC_FAILED
    // when no region fits. A zero-size request still consumes a header-only
    // block.
    pub fn allocate(&mut self, mem: &mut Memory, size: u16) -> u16 {
        let span = size as u32 + MCB_HEADER_LEN as u32;
        let mut mcb = self.cursor;
        while mcb + span <= Self::ARENA_END {
            let payload = mcb + MCB_HEADER_LEN as u32;
            // A header-only block in the last stride would put the payload
            // address past what a 16-bit register can carry.
            if payload >= Self::ARENA_END {
                break;
            }
            if Self::span_free(mem, mcb, span) {
                self.write_mcb(mem, mcb, size);
                mem.set_occupied(mcb, mcb + span, true);
                self.cursor = mcb;
                debug!("alloc: {size} bytes at 0x{payload:04X}");
                return payload.to_u16p();
            }
            mcb += MCB_HEADER_LEN as u32;
        }
        debug!("alloc: no region fits {size} bytes");
        ALLOC_FAILED
    }

    pub fn free(&mut self, mem: &mut Memory, ptr: u16) -> Result<(), Fault> {
        let Some(mcb) = (ptr as u32).checked_sub(MCB_HEADER_LEN as u32) else {
            return Err(Fault::CorruptAllocation(ptr as u32));
        };
        if mem.read_byte(mcb + 2)? != MCB_SIGNATURE {
            return Err(Fault::CorruptAllocation(mcb));
        }
        let size =
            mem.read_byte(mcb)? as u32 | ((mem.read_byte(mcb + 1)? as u32) << 8);
        mem.set_occupied(mcb, mcb + MCB_HEADER_LEN as u32 + size, false);
        // Pull the cursor back so the freed range is searched again.
        if mcb < self.cursor {
            self.cursor = mcb;
        }
        debug!("free: {size} bytes at 0x{ptr:04X}");
        Ok(())
    }

    fn span_free(mem: &Memory, start: u32, span: u32) -> bool {
        (start..start + span).all(|addr| !mem.is_occupied(addr))
    }

    fn write_mcb(&self, mem: &mut Memory, mcb: u32, size: u16) {
        // In range by construction; the search never leaves the arena.
        mem.write_byte(mcb, size as u8).unwrap();
        mem.write_byte(mcb + 1, (size >> 8) as u8).unwrap();
        mem.write_byte(mcb + 2, MCB_SIGNATURE).unwrap();
    }
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new()
    }
}
