use crate::io::VideoPeripheral;

use log::debug;

// Headless backend installed by default so the machine runs without a
// display attached.
#[derive(Default)]
pub struct NullVideo {
    cursor: (u8, u8),
    cursor_shape: (u8, u8),
}

impl VideoPeripheral for NullVideo {
    fn set_mode(&mut self, mode: u8) {
        debug!("video: set mode {mode:#04x}");
    }

    fn put_char(&mut self, _ch: u8, _attr: u8) {}

    fn set_cursor(&mut self, x: u8, y: u8) {
        self.cursor = (x, y);
    }

    fn cursor(&self) -> (u8, u8) {
        self.cursor
    }

    fn set_cursor_shape(&mut self, start: u8, end: u8) {
        self.cursor_shape = (start, end);
    }

    fn cursor_shape(&self) -> (u8, u8) {
        self.cursor_shape
    }

    fn select_page(&mut self, _page: u8) {}

    fn draw_pixel(&mut self, _x: u16, _y: u16, _color: u8) {}

    fn set_palette_entry(&mut self, _index: u16, _r: u8, _g: u8, _b: u8) {}

    fn load_font(&mut self, name: &str, data: &[u8], width: u8, height: u8) {
        debug!("video: font '{name}' {width}x{height}, {} bytes", data.len());
    }

    fn create_gradient(
        &mut self,
        _width: u16,
        _height: u16,
        _from: (u8, u8, u8),
        _to: (u8, u8, u8),
    ) {
    }
}
