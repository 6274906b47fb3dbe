
use std::fmt;

use num_derive::{FromPrimitive, ToPrimitive};

#[derive(Debug, Clone, Copy, FromPrimitive, ToPrimitive, PartialEq, Eq, Hash)]
pub enum Reg {
    AX = 0,
    BX,
    CX,
    DX,
    SI,
    DI,
    BP,
    SP,
    CS,
    DS,
    ES,
    SS,
    IP,
}

pub const NUM_REGS: usize = 13;

impl Reg {
    // ALU operand bytes name one of the four general registers. Only the
    // low two bits are significant.
    pub fn general(code: u8) -> Reg {
        match code & 0x3 {
            0 => Reg::AX,
            1 => Reg::BX,
            2 => Reg::CX,
            _ => Reg::DX,
        }
    }

    // Encoding order of the push/pop register family (0x50..=0x57).
    pub fn push_order(index: u8) -> Reg {
        match index & 0x7 {
            0 => Reg::AX,
            1 => Reg::CX,
            2 => Reg::DX,
            3 => Reg::BX,
            4 => Reg::SP,
            5 => Reg::BP,
            6 => Reg::SI,
            _ => Reg::DI,
        }
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}
