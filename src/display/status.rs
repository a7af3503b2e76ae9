//! Status screen layouts.

use crate::clock::LocalTime;
use crate::display::{StatusFrame, TextSize};
use crate::signal::{DerivedSchedule, TargetSchedule, Telemetry};

/// Lay out the status screen for the current schedule mode.
///
/// Returns `None` for an unrecognized schedule code; the display keeps its
/// previous contents in that case.
pub fn render_status(
    now: &LocalTime,
    schedule: &TargetSchedule,
    telemetry: &Telemetry,
    derived: &DerivedSchedule,
) -> Option<StatusFrame> {
    let clock = clock_text(i32::from(now.hour), i32::from(now.minute));
    let eta = clock_text(derived.arrival_hour, derived.arrival_minute);

    let lines = match *schedule {
        TargetSchedule::OpenArrival { .. } => vec![
            format!("Time Now: {clock}"),
            telemetry.route_description.clone(),
            format!("Travel time: {}", duration_text(telemetry.travel_time_secs)),
            format!("Traffic: {}", duration_text(telemetry.traffic_delay_secs)),
            format!("Current ETA: {eta}"),
            "Arrive anytime...".to_string(),
        ],
        TargetSchedule::Nighttime { .. } => {
            return Some(StatusFrame {
                size: TextSize::Large,
                lines: vec![String::new(), format!(" {clock} "), " Nighttime".to_string()],
            });
        }
        TargetSchedule::At { hour, minute } => vec![
            format!("Time Now: {clock}"),
            telemetry.route_description.clone(),
            format!("Leave in: {}m", derived.minutes_to_leave),
            format!("Travel time: {}", duration_text(telemetry.travel_time_secs)),
            format!("Traffic: {}", duration_text(telemetry.traffic_delay_secs)),
            format!("Current ETA: {eta}"),
            format!("Target TA: {}", clock_text(hour, minute)),
        ],
        TargetSchedule::Unrecognized { .. } => return None,
    };

    Some(StatusFrame {
        size: TextSize::Small,
        lines,
    })
}

fn clock_text(hour: i32, minute: i32) -> String {
    format!("{hour:02}:{minute:02}")
}

fn duration_text(seconds: Option<i32>) -> String {
    match seconds {
        Some(seconds) => format!("{}m {}s", seconds / 60, seconds % 60),
        None => "--m --s".to_string(),
    }
}
