use crate::animation::Rgb;
use crate::error::AppError;
use crate::led::{DEFAULT_BRIGHTNESS, PixelSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkOp {
    SetPixel { index: usize, color: Rgb },
    SetBrightness(u8),
    Show,
}

/// Records every call so tests can assert on the exact LED traffic.
#[derive(Debug)]
pub struct RecordingSink {
    ops: Vec<SinkOp>,
    pixels: Vec<Rgb>,
    brightness: u8,
    fail_show: bool,
}

impl RecordingSink {
    pub fn new(pixel_count: usize) -> Self {
        Self {
            ops: Vec::new(),
            pixels: vec![Rgb::default(); pixel_count],
            brightness: DEFAULT_BRIGHTNESS,
            fail_show: false,
        }
    }

    pub fn failing_show(pixel_count: usize) -> Self {
        Self {
            fail_show: true,
            ..Self::new(pixel_count)
        }
    }

    pub fn ops(&self) -> &[SinkOp] {
        &self.ops
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn pixel_writes(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, SinkOp::SetPixel { .. }))
            .count()
    }

    pub fn shows(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, SinkOp::Show))
            .count()
    }
}

impl PixelSink for RecordingSink {
    fn set_pixel(&mut self, index: usize, color: Rgb) -> Result<(), AppError> {
        let pixel = self
            .pixels
            .get_mut(index)
            .ok_or_else(|| AppError::Led(format!("mock pixel {index} out of range")))?;
        *pixel = color;
        self.ops.push(SinkOp::SetPixel { index, color });
        Ok(())
    }

    fn set_brightness(&mut self, brightness: u8) -> Result<(), AppError> {
        self.brightness = brightness;
        self.ops.push(SinkOp::SetBrightness(brightness));
        Ok(())
    }

    fn show(&mut self) -> Result<(), AppError> {
        if self.fail_show {
            return Err(AppError::Led("mock show failed".to_string()));
        }
        self.ops.push(SinkOp::Show);
        Ok(())
    }
}
