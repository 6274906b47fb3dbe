// Interrupt controller and the built-in BIOS/DOS services.
//
// Every dispatch follows the same protocol: run the fixed service for the
// vector (if any), push FLAGS then the return IP, and jump through the
// vector table. A guest handler therefore always runs after the built-in
// service, and an uninstalled vector reads as zero.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::io::HostError;
use crate::machine::Machine;

use common::constants::{
    DEFAULT_ATTR, DISK_VECTOR, DOS_VECTOR, FAULT_VECTOR, IVT_LEN, KEYBOARD_VECTOR, RTC_VECTOR,
    SECTOR_SIZE, VIDEO_VECTOR,
};
use common::isa::Reg;
use common::misc::physical;

use log::{debug, warn};

impl Machine {
    pub fn interrupt(&mut self, n: u16) {
        let n = if n >= IVT_LEN as u16 {
            debug!("interrupt {n:#06x} out of range");
            FAULT_VECTOR
        } else {
            n
        };

        match n {
            VIDEO_VECTOR => self.int_video(),
            DISK_VECTOR => self.int_disk(),
            KEYBOARD_VECTOR => self.int_keyboard(),
            RTC_VECTOR => self.int_rtc(),
            DOS_VECTOR => self.int_dos(),
            _ => {}
        }

        let flags = self.state.flags.to_raw() as u16;
        let ip = self.state.ip();
        if self.push_word(flags).is_err() || self.push_word(ip).is_err() {
            warn!("interrupt {n:#04x}: could not save return state");
        }
        self.state.set_ip(self.state.ivt_read(n));
    }

    ///////////////////////////////////////////////////////////////////////////
    // Video (0x10)

    fn int_video(&mut self) {
        let ax = self.state.reg_read(Reg::AX);
        let (ah, al) = ((ax >> 8) as u8, ax as u8);
        let bx = self.state.reg_read(Reg::BX);
        let cx = self.state.reg_read(Reg::CX);
        let dx = self.state.reg_read(Reg::DX);

        let video = Arc::clone(&self.video);
        let mut video = video.lock().unwrap();

        match ah {
            0x00 => video.set_mode(al),
            0x01 => video.set_cursor_shape((cx >> 8) as u8, cx as u8),
            0x02 => video.set_cursor(dx as u8, (dx >> 8) as u8),
            0x03 => {
                let (start, end) = video.cursor_shape();
                let (x, y) = video.cursor();
                self.state.reg_write(Reg::CX, ((start as u16) << 8) | end as u16);
                self.state.reg_write(Reg::DX, ((y as u16) << 8) | x as u16);
            }
            0x05 => video.select_page(al),
            0x09 => {
                for _ in 0..cx {
                    video.put_char(al, bx as u8);
                }
            }
            0x0C => video.draw_pixel(cx, dx, al),
            0x0E => video.put_char(al, DEFAULT_ATTR),
            0x10 => {
                let si = self.state.reg_read(Reg::SI);
                let di = self.state.reg_read(Reg::DI);
                match al {
                    0x00 => video.set_palette_entry(bx, (cx >> 8) as u8, cx as u8, (dx >> 8) as u8),
                    0x01 => {
                        let ds = self.state.reg_read(Reg::DS);
                        let es = self.state.reg_read(Reg::ES);
                        let name = self.read_asciiz(physical(ds, si));
                        let data = self.read_block(physical(es, di), dx as usize);
                        video.load_font(&name, &data, cx as u8, (cx >> 8) as u8);
                    }
                    0x02 => video.create_gradient(
                        cx,
                        dx,
                        ((si >> 8) as u8, si as u8, (di >> 8) as u8),
                        (di as u8, (bx >> 8) as u8, bx as u8),
                    ),
                    other => debug!("video: unhandled palette function {other:#04x}"),
                }
            }
            other => debug!("video: unhandled function {other:#04x}"),
        }
    }

    ///////////////////////////////////////////////////////////////////////////
    // Disk (0x13)

    // Read the sector indexed by CX into ES:BX. AX reports zero on success,
    // one when the sector does not exist.
    fn int_disk(&mut self) {
        let index = self.state.reg_read(Reg::CX);
        let dest = physical(self.state.reg_read(Reg::ES), self.state.reg_read(Reg::BX));
        match self.state.disk_sector(index).copied() {
            Some(sector) => {
                for (i, byte) in sector.iter().enumerate() {
                    if self.state.mem.write_byte(dest + i as u32, *byte).is_err() {
                        break;
                    }
                }
                self.state.mem.set_occupied(dest, dest + SECTOR_SIZE as u32, true);
                self.state.reg_write(Reg::AX, 0);
            }
            None => {
                debug!("disk: no sector {index}");
                self.state.reg_write(Reg::AX, 1);
            }
        }
    }

    ///////////////////////////////////////////////////////////////////////////
    // Keyboard (0x16)

    fn int_keyboard(&mut self) {
        let ah = (self.state.reg_read(Reg::AX) >> 8) as u8;
        match ah {
            // Blocking read degrades to zero when the buffer is empty.
            0x00 => {
                let key = self.state.pop_key().unwrap_or(0);
                self.state.reg_write(Reg::AX, key as u16);
            }
            // Poll: zero flag set when no key is waiting.
            0x01 => match self.state.peek_key() {
                Some(key) => {
                    self.state.flags.set_zero(false);
                    self.state.reg_write(Reg::AX, key as u16);
                }
                None => self.state.flags.set_zero(true),
            },
            other => debug!("keyboard: unhandled function {other:#04x}"),
        }
    }

    ///////////////////////////////////////////////////////////////////////////
    // Real-time clock (0x1A)

    fn int_rtc(&mut self) {
        let al = self.state.reg_read(Reg::AX) as u8;
        if al == 0x00 {
            let secs = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs();
            self.state.reg_write(Reg::CX, ((secs / 3600) % 24) as u16);
            self.state.reg_write(Reg::DX, ((secs / 60) % 60) as u16);
        }
    }

    ///////////////////////////////////////////////////////////////////////////
    // DOS services (0x21)

    fn int_dos(&mut self) {
        let ah = (self.state.reg_read(Reg::AX) >> 8) as u8;
        match ah {
            // Terminate: the run loop observes the cleared flag and exits.
            0x4C => self.state.set_running(false),

            // Load and execute the program named by the string at DS:DX.
            0x4B => {
                let addr =
                    physical(self.state.reg_read(Reg::DS), self.state.reg_read(Reg::DX));
                let name = self.read_asciiz(addr);
                let program = match &self.store {
                    Some(store) => store.read_program(&name),
                    None => Err(HostError::ProgramNotFound(name.clone())),
                };
                match program {
                    Ok(bytes) => {
                        if self.load_bytes_at(0, &bytes).is_err() {
                            self.state.reg_write(Reg::AX, 0xFFFF);
                        }
                    }
                    Err(err) => {
                        warn!("exec '{name}': {err}");
                        self.state.reg_write(Reg::AX, 0xFFFF);
                    }
                }
            }

            // Allocate BX bytes; the payload address (or the failure
            // sentinel) comes back in AX.
            0x48 => {
                let size = self.state.reg_read(Reg::BX);
                let ptr = self.alloc.allocate(&mut self.state.mem, size);
                self.state.reg_write(Reg::AX, ptr);
            }

            // Free the block whose payload address is in ES.
            0x49 => {
                let ptr = self.state.reg_read(Reg::ES);
                if let Err(fault) = self.alloc.free(&mut self.state.mem, ptr) {
                    self.fault(fault);
                }
            }

            other => debug!("dos: unhandled function {other:#04x}"),
        }
    }

    ///////////////////////////////////////////////////////////////////////////

    // Zero-terminated string out of guest memory; stops at the terminator or
    // the end of the address space.
    pub(crate) fn read_asciiz(&self, mut addr: u32) -> String {
        let mut out = String::new();
        while let Ok(byte) = self.state.mem.read_byte(addr) {
            if byte == 0 {
                break;
            }
            out.push(byte as char);
            addr += 1;
        }
        out
    }

    fn read_block(&self, addr: u32, len: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(len);
        for offset in 0..len as u32 {
            match self.state.mem.read_byte(addr + offset) {
                Ok(byte) => out.push(byte),
                Err(_) => break,
            }
        }
        out
    }
}
