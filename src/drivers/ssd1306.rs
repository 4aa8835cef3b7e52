//! SSD1306 128×64 monochrome OLED over I²C.
//!
//! Drawing happens into a RAM framebuffer through `embedded-graphics`;
//! [`Ssd1306::flush`] ships the whole buffer in horizontal addressing mode.
//!
//! Framebuffer layout matches controller GDDRAM: 8 pages of 128 columns,
//! one byte per column per page, bit 0 = top row of the page.

use core::convert::Infallible;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::{DrawTarget, OriginDimensions, Pixel, Size};
use embedded_hal::i2c::{Error as _, I2c};
use log::warn;

use crate::error::{Error, Result};

pub const WIDTH: usize = 128;
pub const HEIGHT: usize = 64;
const PAGES: usize = HEIGHT / 8;
const BUFFER_LEN: usize = WIDTH * PAGES;

/// Control byte: following bytes are commands.
const CONTROL_CMD: u8 = 0x00;
/// Control byte: following bytes are display data.
const CONTROL_DATA: u8 = 0x40;

/// Data bytes per I²C write during flush.
const FLUSH_CHUNK: usize = 32;

/// Power-up sequence for a 128×64 panel with internal charge pump.
/// Segment remap + reverse COM scan put row 0 at the top for modules with
/// the connector above the glass.
const INIT_SEQUENCE: &[u8] = &[
    0xAE, // display off
    0xD5, 0x80, // clock divide
    0xA8, 0x3F, // multiplex 64
    0xD3, 0x00, // display offset
    0x40, // start line 0
    0x8D, 0x14, // charge pump on
    0x20, 0x00, // horizontal addressing
    0xA1, // segment remap
    0xC8, // COM scan descending
    0xDA, 0x12, // COM pins
    0x81, 0xCF, // contrast
    0xD9, 0xF1, // pre-charge
    0xDB, 0x40, // VCOMH deselect
    0xA4, // resume from RAM
    0xA6, // normal (not inverted)
    0x2E, // scrolling off
    0xAF, // display on
];

pub struct Ssd1306<I> {
    i2c: I,
    address: u8,
    buffer: [u8; BUFFER_LEN],
}

impl<I: I2c> Ssd1306<I> {
    pub fn new(i2c: I, address: u8) -> Self {
        Self {
            i2c,
            address,
            buffer: [0; BUFFER_LEN],
        }
    }

    /// Configure the controller and blank the panel.
    pub fn init(&mut self) -> Result<()> {
        self.command(INIT_SEQUENCE)?;
        self.clear();
        self.flush()
    }

    /// Zero the framebuffer.  Takes effect on the next flush.
    pub fn clear(&mut self) {
        self.buffer.fill(0);
    }

    /// Write the framebuffer to the panel.
    pub fn flush(&mut self) -> Result<()> {
        self.command(&[0x21, 0, (WIDTH - 1) as u8, 0x22, 0, (PAGES - 1) as u8])?;

        let mut packet = [0u8; FLUSH_CHUNK + 1];
        packet[0] = CONTROL_DATA;
        for chunk in self.buffer.chunks(FLUSH_CHUNK) {
            packet[1..=chunk.len()].copy_from_slice(chunk);
            self.i2c
                .write(self.address, &packet[..=chunk.len()])
                .map_err(|e| {
                    warn!("OLED: data write failed ({:?})", e.kind());
                    Error::Display
                })?;
        }
        Ok(())
    }

    pub fn buffer(&self) -> &[u8; BUFFER_LEN] {
        &self.buffer
    }

    pub fn release(self) -> I {
        self.i2c
    }

    fn command(&mut self, cmds: &[u8]) -> Result<()> {
        let mut packet = [0u8; 32];
        for chunk in cmds.chunks(packet.len() - 1) {
            packet[0] = CONTROL_CMD;
            packet[1..=chunk.len()].copy_from_slice(chunk);
            self.i2c
                .write(self.address, &packet[..=chunk.len()])
                .map_err(|e| {
                    warn!("OLED: command write failed ({:?})", e.kind());
                    Error::Display
                })?;
        }
        Ok(())
    }

    fn set_pixel(&mut self, x: usize, y: usize, on: bool) {
        let idx = (y / 8) * WIDTH + x;
        let mask = 1u8 << (y % 8);
        if on {
            self.buffer[idx] |= mask;
        } else {
            self.buffer[idx] &= !mask;
        }
    }
}

impl<I> OriginDimensions for Ssd1306<I> {
    fn size(&self) -> Size {
        Size::new(WIDTH as u32, HEIGHT as u32)
    }
}

impl<I: I2c> DrawTarget for Ssd1306<I> {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<It>(&mut self, pixels: It) -> core::result::Result<(), Self::Error>
    where
        It: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            let (Ok(x), Ok(y)) = (usize::try_from(coord.x), usize::try_from(coord.y)) else {
                continue;
            };
            if x < WIDTH && y < HEIGHT {
                self.set_pixel(x, y, color.is_on());
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> core::result::Result<(), Self::Error> {
        self.buffer.fill(if color.is_on() { 0xFF } else { 0x00 });
        Ok(())
    }
}
