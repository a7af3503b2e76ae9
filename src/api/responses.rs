use crate::signal::Urgency;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct StatusSuccessResponse {
    pub urgency: Urgency,
    pub urgency_code: u8,
    pub minutes_to_leave: i32,
    pub arrival_hour: i32,
    pub arrival_minute: i32,
    pub target_hour: i32,
    pub target_minute: i32,
    pub route_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub travel_time_seconds: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traffic_delay_seconds: Option<i32>,
    pub pixel_brightness: u8,
    pub logic_call_interval_ms: u32,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct StatusErrorResponse {
    pub error_code: StatusErrorCode,
    pub error_message: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusErrorCode {
    NoData,
    InternalError,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct IngestAcceptedResponse {
    pub accepted_bytes: usize,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct IngestErrorResponse {
    pub error_code: IngestErrorCode,
    pub error_message: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IngestErrorCode {
    QueueFull,
    QueueClosed,
    InternalError,
}
