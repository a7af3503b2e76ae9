//! Inbound route-response payloads.
//!
//! Every key is optional and unknown keys are ignored. Integer fields accept
//! numbers or numeric strings since webhook templates often quote values.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResponseUpdate {
    #[serde(rename = "travelTimeInSeconds", default, deserialize_with = "lenient_int")]
    pub travel_time_secs: Option<i64>,
    #[serde(rename = "trafficDelayInSeconds", default, deserialize_with = "lenient_int")]
    pub traffic_delay_secs: Option<i64>,
    #[serde(rename = "routeDescription", default)]
    pub route_description: Option<String>,
    #[serde(rename = "pixelBrightness", default, deserialize_with = "lenient_int")]
    pub pixel_brightness: Option<i64>,
    #[serde(rename = "logicCallInterval", default, deserialize_with = "lenient_int")]
    pub logic_call_interval_ms: Option<i64>,
    #[serde(rename = "targetHour", default, deserialize_with = "lenient_int")]
    pub target_hour: Option<i64>,
    #[serde(rename = "targetMinute", default, deserialize_with = "lenient_int")]
    pub target_minute: Option<i64>,
}

impl ResponseUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("empty payload")]
    Empty,
    #[error("payload is not valid json: {0}")]
    Json(#[source] serde_json::Error),
    #[error("payload is not a json object")]
    NotAnObject,
    #[error("invalid field: {0}")]
    Field(#[source] serde_json::Error),
}

pub fn decode_response(payload: &str) -> Result<ResponseUpdate, DecodeError> {
    if payload.trim().is_empty() {
        return Err(DecodeError::Empty);
    }
    let value: Value = serde_json::from_str(payload).map_err(DecodeError::Json)?;
    if !value.is_object() {
        return Err(DecodeError::NotAnObject);
    }
    serde_json::from_value(value).map_err(DecodeError::Field)
}

fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().and_then(truncate_float))
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("integer out of range: {number}"))),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(truncate_float))
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("not a number: {text:?}")))
        }
        other => Err(de::Error::custom(format!("expected integer, found {other}"))),
    }
}

fn truncate_float(value: f64) -> Option<i64> {
    // `as` saturates, so only non-finite input is rejected.
    value.is_finite().then(|| value.trunc() as i64)
}
