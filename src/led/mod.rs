use crate::animation::Rgb;
use crate::error::AppError;
use tracing::{debug, trace};

pub mod mock;
pub mod ws2812;

pub const DEFAULT_PIXEL_COUNT: usize = 64;
pub const DEFAULT_BRIGHTNESS: u8 = 100;

/// Addressable LED strip. Writes are buffered until `show`.
pub trait PixelSink {
    fn set_pixel(&mut self, index: usize, color: Rgb) -> Result<(), AppError>;
    fn set_brightness(&mut self, brightness: u8) -> Result<(), AppError>;
    fn show(&mut self) -> Result<(), AppError>;
}

impl PixelSink for Box<dyn PixelSink + Send> {
    fn set_pixel(&mut self, index: usize, color: Rgb) -> Result<(), AppError> {
        (**self).set_pixel(index, color)
    }

    fn set_brightness(&mut self, brightness: u8) -> Result<(), AppError> {
        (**self).set_brightness(brightness)
    }

    fn show(&mut self) -> Result<(), AppError> {
        (**self).show()
    }
}

/// Scale a channel the way WS2812 libraries apply global brightness.
pub fn scale_channel(value: u8, brightness: u8) -> u8 {
    ((u16::from(value) * (u16::from(brightness) + 1)) >> 8) as u8
}

pub fn scale_color(color: Rgb, brightness: u8) -> Rgb {
    Rgb {
        r: scale_channel(color.r, brightness),
        g: scale_channel(color.g, brightness),
        b: scale_channel(color.b, brightness),
    }
}

/// Strip stand-in that only logs flushed frames.
#[derive(Debug)]
pub struct LogSink {
    pixels: Vec<Rgb>,
    brightness: u8,
    frames: u64,
}

impl LogSink {
    pub fn new(pixel_count: usize) -> Self {
        Self {
            pixels: vec![Rgb::default(); pixel_count],
            brightness: DEFAULT_BRIGHTNESS,
            frames: 0,
        }
    }
}

impl PixelSink for LogSink {
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
        if brightness != self.brightness {
            debug!(brightness, "LED brightness changed");
        }
        self.brightness = brightness;
        Ok(())
    }

    fn show(&mut self) -> Result<(), AppError> {
        self.frames += 1;
        trace!(
            frame = self.frames,
            first = format_args!("#{:06x}", self.pixels.first().map_or(0, |p| p.to_u24())),
            brightness = self.brightness,
            "LED frame"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_brightness_is_lossless() {
        assert_eq!(scale_channel(200, 255), 200);
        assert_eq!(scale_channel(255, 255), 255);
    }

    #[test]
    fn zero_brightness_is_dark() {
        assert_eq!(scale_color(Rgb::new(255, 128, 1), 0), Rgb::new(0, 0, 0));
    }

    #[test]
    fn brightness_scales_proportionally() {
        assert_eq!(scale_channel(255, 127), 127);
        assert_eq!(scale_channel(100, 100), 39);
    }

    #[test]
    fn log_sink_rejects_out_of_range_pixel() {
        let mut sink = LogSink::new(2);

        assert!(sink.set_pixel(1, Rgb::new(1, 2, 3)).is_ok());
        let err = sink.set_pixel(2, Rgb::new(1, 2, 3)).unwrap_err();

        assert_eq!(err.to_string(), "led error: pixel 2 out of range (2)");
        assert!(sink.show().is_ok());
    }
}
