use crate::display::{StatusFrame, TextDisplay};
use crate::error::AppError;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Banner(String),
    Status(StatusFrame),
}

/// Keeps every screen it was asked to show; clones share the same history.
#[derive(Debug, Clone, Default)]
pub struct RecordingDisplay {
    screens: Arc<Mutex<Vec<Screen>>>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn screens(&self) -> Vec<Screen> {
        self.screens
            .lock()
            .map(|screens| screens.clone())
            .unwrap_or_default()
    }

    pub fn last_status(&self) -> Option<StatusFrame> {
        self.screens().into_iter().rev().find_map(|screen| match screen {
            Screen::Status(frame) => Some(frame),
            Screen::Banner(_) => None,
        })
    }

    fn push(&self, screen: Screen) -> Result<(), AppError> {
        self.screens
            .lock()
            .map_err(|_| AppError::Display("mock display lock poisoned".to_string()))?
            .push(screen);
        Ok(())
    }
}

impl TextDisplay for RecordingDisplay {
    fn show_banner(&mut self, text: &str) -> Result<(), AppError> {
        self.push(Screen::Banner(text.to_string()))
    }

    fn show_status(&mut self, frame: &StatusFrame) -> Result<(), AppError> {
        self.push(Screen::Status(frame.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::TextSize;

    #[test]
    fn clones_share_history() {
        let display = RecordingDisplay::new();
        let mut handle = display.clone();

        handle.show_banner("hello").expect("banner");
        handle
            .show_status(&StatusFrame {
                size: TextSize::Large,
                lines: vec!["a".to_string()],
            })
            .expect("status");

        assert_eq!(display.screens().len(), 2);
        assert_eq!(
            display.last_status().map(|frame| frame.size),
            Some(TextSize::Large)
        );
    }
}
