//! Outbound route requests and the transports that carry them.

use crate::clock::LocalTime;
use crate::error::AppError;
use serde::Serialize;

pub mod http;
pub mod loopback;
pub mod planner;
pub mod scheduler;

pub use scheduler::RequestScheduler;

/// Largest event payload the cloud side accepts.
pub const MAX_EVENT_DATA_LEN: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteRequest {
    pub coordinates: String,
    #[serde(rename = "h")]
    pub hour: u8,
    #[serde(rename = "m")]
    pub minute: u8,
    #[serde(rename = "s")]
    pub second: u8,
    #[serde(rename = "yr")]
    pub year: i32,
    #[serde(rename = "mo")]
    pub month: u8,
    #[serde(rename = "d")]
    pub weekday: u8,
    #[serde(rename = "tz")]
    pub tz_offset_hours: i8,
}

impl RouteRequest {
    pub fn new(coordinates: impl Into<String>, now: &LocalTime) -> Self {
        Self {
            coordinates: coordinates.into(),
            hour: now.hour,
            minute: now.minute,
            second: now.second,
            year: now.year,
            month: now.month,
            weekday: now.weekday,
            tz_offset_hours: now.tz_offset_hours,
        }
    }

    /// Serialize as JSON, refusing payloads over [`MAX_EVENT_DATA_LEN`].
    pub fn to_payload(&self) -> Result<String, AppError> {
        let payload = serde_json::to_string(self)?;
        if payload.len() > MAX_EVENT_DATA_LEN {
            return Err(AppError::PayloadTooLarge {
                len: payload.len(),
                max: MAX_EVENT_DATA_LEN,
            });
        }
        Ok(payload)
    }
}

/// Fire-and-forget publisher for route requests.
///
/// `publish` must not block on the network; responses come back through the
/// inbound queue.
pub trait Transport: Send {
    fn is_connected(&self) -> bool;
    fn publish(&mut self, request: &RouteRequest) -> Result<(), AppError>;
}

impl Transport for Box<dyn Transport> {
    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn publish(&mut self, request: &RouteRequest) -> Result<(), AppError> {
        (**self).publish(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{FixedClock, WallClock};
    use serde_json::json;

    #[test]
    fn payload_uses_short_wire_keys() -> Result<(), Box<dyn std::error::Error>> {
        let mut now = FixedClock::at(15, 8).now();
        now.second = 26;
        now.weekday = 1;
        let request = RouteRequest::new("34.1808,-118.3089:33.9416,-118.4085", &now);

        let value: serde_json::Value = serde_json::from_str(&request.to_payload()?)?;

        assert_eq!(
            value,
            json!({
                "coordinates": "34.1808,-118.3089:33.9416,-118.4085",
                "h": 15,
                "m": 8,
                "s": 26,
                "yr": 2024,
                "mo": 5,
                "d": 1,
                "tz": -7
            })
        );
        Ok(())
    }

    #[test]
    fn oversized_payload_is_an_error() {
        let now = FixedClock::at(8, 0).now();
        let request = RouteRequest::new("9".repeat(MAX_EVENT_DATA_LEN), &now);

        let err = request.to_payload().unwrap_err();

        assert!(matches!(
            err,
            AppError::PayloadTooLarge {
                max: MAX_EVENT_DATA_LEN,
                ..
            }
        ));
    }
}
