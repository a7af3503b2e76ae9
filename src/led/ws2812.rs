//! WS2812 strip driven through SPI MOSI.
//!
//! At ~3.2 MHz each data bit becomes four SPI bits (`1000` for 0, `1110` for
//! 1), so one SPI byte carries two data bits and one LED takes 12 bytes.

use crate::animation::Rgb;
use crate::error::AppError;
use crate::led::{PixelSink, scale_color};

#[cfg(target_os = "linux")]
use crate::led::DEFAULT_BRIGHTNESS;
#[cfg(target_os = "linux")]
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};

pub const DEFAULT_SPI_CLOCK_HZ: u32 = 3_200_000;
pub const BYTES_PER_LED: usize = 12;
/// Low time after the data that latches the frame (>50 µs at 3.2 MHz).
pub const RESET_BYTES: usize = 40;

const BIT_PAIRS: [u8; 4] = [0b1000_1000, 0b1000_1110, 0b1110_1000, 0b1110_1110];

/// Encode a full frame in GRB order, brightness applied, reset tail included.
pub fn encode_frame(pixels: &[Rgb], brightness: u8, out: &mut Vec<u8>) {
    out.clear();
    out.reserve(pixels.len() * BYTES_PER_LED + RESET_BYTES);
    for pixel in pixels {
        let scaled = scale_color(*pixel, brightness);
        for channel in [scaled.g, scaled.r, scaled.b] {
            for shift in [6, 4, 2, 0] {
                out.push(BIT_PAIRS[usize::from((channel >> shift) & 0b11)]);
            }
        }
    }
    out.resize(out.len() + RESET_BYTES, 0);
}

#[cfg(target_os = "linux")]
pub struct Ws2812Spi {
    spi: Spi,
    pixels: Vec<Rgb>,
    brightness: u8,
    buffer: Vec<u8>,
}

#[cfg(target_os = "linux")]
impl Ws2812Spi {
    pub fn new(pixel_count: usize, clock_hz: u32) -> Result<Self, AppError> {
        let spi = Spi::new(Bus::Spi0, SlaveSelect::Ss0, clock_hz, Mode::Mode0)
            .map_err(|err| AppError::Spi(err.to_string()))?;
        Ok(Self {
            spi,
            pixels: vec![Rgb::default(); pixel_count],
            brightness: DEFAULT_BRIGHTNESS,
            buffer: Vec::with_capacity(pixel_count * BYTES_PER_LED + RESET_BYTES),
        })
    }
}

#[cfg(target_os = "linux")]
impl PixelSink for Ws2812Spi {
    fn set_pixel(&mut self, index: usize, color: Rgb) -> Result<(), AppError> {
        let count = self.pixels.len();
        let pixel = self
            .pixels
            .get_mut(index)
            .ok_or_else(|| AppError::Led(format!("pixel {index} out of range ({count})")))?;
        *pixel = color;
        Ok(())
    }

    fn set_brightness(&mut self, brightness: u8) -> Result<(), AppError> {
        self.brightness = brightness;
        Ok(())
    }

    fn show(&mut self) -> Result<(), AppError> {
        encode_frame(&self.pixels, self.brightness, &mut self.buffer);
        let written = self
            .spi
            .write(&self.buffer)
            .map_err(|err| AppError::Spi(err.to_string()))?;
        if written != self.buffer.len() {
            return Err(AppError::Spi(format!(
                "short write: {written} of {} bytes",
                self.buffer.len()
            )));
        }
        Ok(())
    }
}

/// Placeholder so non-Linux builds can still name the driver.
#[cfg(not(target_os = "linux"))]
pub struct Ws2812Spi;

#[cfg(not(target_os = "linux"))]
impl Ws2812Spi {
    pub fn new(_pixel_count: usize, _clock_hz: u32) -> Result<Self, AppError> {
        Err(AppError::Spi(
            "WS2812 over SPI requires Linux/Raspberry Pi".to_string(),
        ))
    }
}

#[cfg(not(target_os = "linux"))]
impl PixelSink for Ws2812Spi {
    fn set_pixel(&mut self, _index: usize, _color: Rgb) -> Result<(), AppError> {
        Ok(())
    }

    fn set_brightness(&mut self, _brightness: u8) -> Result<(), AppError> {
        Ok(())
    }

    fn show(&mut self) -> Result<(), AppError> {
        Ok(())
    }
}
