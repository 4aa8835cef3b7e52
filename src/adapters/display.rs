//! OLED status display.
//!
//! Lays the four status rows out on the SSD1306 at y = 0/16/32/48 and only
//! pushes a new frame over I²C when the rows actually change.  The loop
//! renders every tick; at 10 ms per tick an unconditional flush would keep
//! the bus busy most of the time.

use embedded_graphics::mono_font::ascii::FONT_8X13;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::Point;
use embedded_graphics::text::{Baseline, Text};
use embedded_graphics::Drawable;
use embedded_hal::i2c::I2c;
use log::warn;

use crate::app::ports::DisplayPort;
use crate::app::state::{StatusLine, STATUS_ROWS};
use crate::drivers::ssd1306::Ssd1306;
use crate::error::Result;

/// Vertical pitch of a status row, in pixels.
const ROW_PITCH: i32 = 16;

pub struct OledStatusDisplay<I> {
    oled: Ssd1306<I>,
    /// Rows currently on the panel; `None` after a notice or a failed flush.
    shown: Option<[StatusLine; STATUS_ROWS]>,
    flushes: u32,
}

impl<I: I2c> OledStatusDisplay<I> {
    /// Wrap an SSD1306 and initialise it.
    pub fn new(mut oled: Ssd1306<I>) -> Result<Self> {
        oled.init()?;
        Ok(Self {
            oled,
            shown: None,
            flushes: 0,
        })
    }

    /// Frames pushed to the panel so far.
    pub fn flushes(&self) -> u32 {
        self.flushes
    }

    pub fn panel(&self) -> &Ssd1306<I> {
        &self.oled
    }

    fn draw_rows<'a>(&mut self, rows: impl IntoIterator<Item = (i32, &'a str)>) -> Result<()> {
        let style = MonoTextStyle::new(&FONT_8X13, BinaryColor::On);
        self.oled.clear();
        for (y, text) in rows {
            let _ = Text::with_baseline(text, Point::new(0, y), style, Baseline::Top).draw(&mut self.oled);
        }
        self.oled.flush()?;
        self.flushes += 1;
        Ok(())
    }
}

impl<I: I2c> DisplayPort for OledStatusDisplay<I> {
    fn render(&mut self, lines: &[StatusLine; STATUS_ROWS]) {
        if self.shown.as_ref() == Some(lines) {
            return;
        }
        let rows = lines.iter().enumerate().map(|(i, l)| (i as i32 * ROW_PITCH, l.as_str()));
        match self.draw_rows(rows) {
            Ok(()) => self.shown = Some(lines.clone()),
            Err(e) => {
                warn!("OLED: {}", e);
                self.shown = None;
            }
        }
    }

    fn notice(&mut self, text: &str) {
        self.shown = None;
        if let Err(e) = self.draw_rows([(ROW_PITCH, text)]) {
            warn!("OLED: {}", e);
        }
    }
}
