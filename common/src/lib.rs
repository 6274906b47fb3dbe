pub mod constants;
pub mod decoder;
pub mod isa;
pub mod misc;
