use crate::api::ApiState;
use crate::api::responses::{
    IngestAcceptedResponse, IngestErrorCode, IngestErrorResponse, StatusErrorCode,
    StatusErrorResponse, StatusSuccessResponse,
};
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, warn};

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug)]
enum TimestampError {
    Format(time::error::Format),
}

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampError::Format(err) => write!(f, "timestamp format error: {err}"),
        }
    }
}

pub enum StatusResponse {
    Success(Box<StatusSuccessResponse>),
    Error {
        status: StatusCode,
        body: StatusErrorResponse,
    },
}

impl IntoResponse for StatusResponse {
    fn into_response(self) -> Response {
        match self {
            StatusResponse::Success(body) => (StatusCode::OK, Json(*body)).into_response(),
            StatusResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub async fn get_status(State(api): State<ApiState>) -> impl IntoResponse {
    build_status_response(api.state, SystemTime::now())
}

pub enum IngestResponse {
    Accepted(IngestAcceptedResponse),
    Error {
        status: StatusCode,
        body: IngestErrorResponse,
    },
}

impl IntoResponse for IngestResponse {
    fn into_response(self) -> Response {
        match self {
            IngestResponse::Accepted(body) => (StatusCode::ACCEPTED, Json(body)).into_response(),
            IngestResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

/// Webhook entry point for route responses. Decoding happens on the
/// response task, so any body is accepted while the queue has room.
pub async fn post_response(State(api): State<ApiState>, body: String) -> impl IntoResponse {
    build_ingest_response(&api.inbound, body, SystemTime::now())
}

fn build_status_response(state: Arc<RwLock<AppState>>, now: SystemTime) -> StatusResponse {
    let guard = match state.read() {
        Ok(guard) => guard,
        Err(_) => {
            return status_internal_error("state lock poisoned while reading status");
        }
    };

    let (Some(derived), Some(updated_at)) = (guard.derived().copied(), guard.updated_at()) else {
        drop(guard);
        return no_data_response(now);
    };

    let schedule = *guard.schedule();
    let telemetry = guard.telemetry().clone();
    let config = *guard.config();
    let urgency = guard.urgency();
    drop(guard);

    let timestamp = match format_timestamp(updated_at) {
        Ok(formatted) => formatted,
        Err(_err) => return status_internal_error("timestamp formatting failure"),
    };

    StatusResponse::Success(Box::new(StatusSuccessResponse {
        urgency,
        urgency_code: urgency.code(),
        minutes_to_leave: derived.minutes_to_leave,
        arrival_hour: derived.arrival_hour,
        arrival_minute: derived.arrival_minute,
        target_hour: schedule.hour_code(),
        target_minute: schedule.minute(),
        route_description: telemetry.route_description,
        travel_time_seconds: telemetry.travel_time_secs,
        traffic_delay_seconds: telemetry.traffic_delay_secs,
        pixel_brightness: config.pixel_brightness,
        logic_call_interval_ms: config.logic_call_interval_ms,
        timestamp,
    }))
}

fn no_data_response(timestamp: SystemTime) -> StatusResponse {
    match format_timestamp(timestamp) {
        Ok(formatted) => StatusResponse::Error {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: StatusErrorResponse {
                error_code: StatusErrorCode::NoData,
                error_message: "No route response received yet".to_string(),
                timestamp: formatted,
            },
        },
        Err(_err) => status_internal_error("timestamp formatting failure"),
    }
}

fn status_internal_error(message: &str) -> StatusResponse {
    error!(
        message = message,
        "Internal error while handling /api/status"
    );
    StatusResponse::Error {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: StatusErrorResponse {
            error_code: StatusErrorCode::InternalError,
            error_message: INTERNAL_ERROR_MESSAGE.to_string(),
            timestamp: fallback_timestamp(),
        },
    }
}

fn build_ingest_response(
    inbound: &mpsc::Sender<String>,
    body: String,
    now: SystemTime,
) -> IngestResponse {
    let timestamp = match format_timestamp(now) {
        Ok(formatted) => formatted,
        Err(_err) => {
            error!("Timestamp formatting failure while handling /api/response");
            return IngestResponse::Error {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: IngestErrorResponse {
                    error_code: IngestErrorCode::InternalError,
                    error_message: INTERNAL_ERROR_MESSAGE.to_string(),
                    timestamp: fallback_timestamp(),
                },
            };
        }
    };

    let accepted_bytes = body.len();
    match inbound.try_send(body) {
        Ok(()) => {
            debug!(bytes = accepted_bytes, "Route response queued");
            IngestResponse::Accepted(IngestAcceptedResponse {
                accepted_bytes,
                timestamp,
            })
        }
        Err(TrySendError::Full(_)) => {
            warn!("Inbound queue full, rejecting route response");
            IngestResponse::Error {
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: IngestErrorResponse {
                    error_code: IngestErrorCode::QueueFull,
                    error_message: "Response queue is full".to_string(),
                    timestamp,
                },
            }
        }
        Err(TrySendError::Closed(_)) => {
            warn!("Inbound queue closed, rejecting route response");
            IngestResponse::Error {
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: IngestErrorResponse {
                    error_code: IngestErrorCode::QueueClosed,
                    error_message: "Response task is not running".to_string(),
                    timestamp,
                },
            }
        }
    }
}

fn format_timestamp(timestamp: SystemTime) -> Result<String, TimestampError> {
    let datetime = OffsetDateTime::from(timestamp);
    datetime.format(&Rfc3339).map_err(TimestampError::Format)
}

fn fallback_timestamp() -> String {
    format_timestamp(SystemTime::now()).unwrap_or_else(|err| {
        error!(error = %err, "Failed to format internal error timestamp");
        "1970-01-01T00:00:00Z".to_string()
    })
}
