
// Real-mode segment:offset to physical address.
pub fn physical(seg: u16, off: u16) -> u32 {
    ((seg as u32) << 4) + off as u32
}

////////////////////////////////////////////////////////////////////////////////

// A panicking version.
pub trait ToU16P {
    fn to_u16p(self) -> u16;
}

impl ToU16P for usize {
    fn to_u16p(self) -> u16 {
        assert!(self <= u16::MAX as Self);
        self as u16
    }
}

impl ToU16P for u32 {
    fn to_u16p(self) -> u16 {
        assert!(self <= u16::MAX as Self);
        self as u16
    }
}
