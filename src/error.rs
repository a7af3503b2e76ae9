use crate::response::DecodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("led error: {0}")]
    Led(String),
    #[error("display error: {0}")]
    Display(String),
    #[error("spi error: {0}")]
    Spi(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("payload of {len} bytes exceeds the {max} byte event limit")]
    PayloadTooLarge { len: usize, max: usize },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("inbound queue closed")]
    InboundClosed,
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("state lock poisoned")]
    StateLock,
}
