pub mod animation;
pub mod api;
pub mod clock;
pub mod config;
pub mod display;
pub mod error;
pub mod led;
pub mod link;
pub mod response;
pub mod signal;
pub mod state;
pub mod tick;
