
pub const MEM_SIZE: usize = 1 << 20; // 1 MiB, addresses [0, 2^20)
pub const IVT_LEN: usize = 256;
pub const IVT_SHADOW_END: u32 = 0x400; // Exclusive; reserved at reset

pub const MCB_HEADER_LEN: u16 = 16;
pub const MCB_SIGNATURE: u8 = 0x4D;
pub const ALLOC_FAILED: u16 = 0xFFFF;

pub const SECTOR_SIZE: usize = 512;
pub const NUM_PORTS: usize = 1 << 16;
pub const KEYBOARD_STATUS_PORT: u16 = 0x60;

pub const FAULT_VECTOR: u16 = 0x00;
pub const MEMORY_FAULT_VECTOR: u16 = 0x0D;
pub const VIDEO_VECTOR: u16 = 0x10;
pub const DISK_VECTOR: u16 = 0x13;
pub const KEYBOARD_VECTOR: u16 = 0x16;
pub const RTC_VECTOR: u16 = 0x1A;
pub const DOS_VECTOR: u16 = 0x21;

pub const DEFAULT_ATTR: u8 = 0x07; // Light grey on black

pub const BOOT_LOAD_ADDR: u16 = 0x7C00;
