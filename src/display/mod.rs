use crate::error::AppError;
use tracing::info;

pub mod mock;
pub mod status;

pub use status::render_status;

pub const STANDBY_BANNER: &str = "PLEASE STAND BY...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSize {
    Small,
    Large,
}

/// One screenful of status text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusFrame {
    pub size: TextSize,
    pub lines: Vec<String>,
}

impl StatusFrame {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

pub trait TextDisplay: Send {
    fn show_banner(&mut self, text: &str) -> Result<(), AppError>;
    fn show_status(&mut self, frame: &StatusFrame) -> Result<(), AppError>;
}

/// Display stand-in that writes each screen to the log.
#[derive(Debug, Default)]
pub struct LogDisplay;

impl TextDisplay for LogDisplay {
    fn show_banner(&mut self, text: &str) -> Result<(), AppError> {
        info!(text, "Display banner");
        Ok(())
    }

    fn show_status(&mut self, frame: &StatusFrame) -> Result<(), AppError> {
        info!(size = ?frame.size, "Display status\n{}", frame.text());
        Ok(())
    }
}
