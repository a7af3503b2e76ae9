//! Departure urgency classification.
//!
//! The rules form a priority cascade: the traffic rule sets a tentative level,
//! the departure-window rule may then override it. Integer division truncates
//! toward zero, matching the service's whole-minute arithmetic.

use crate::signal::{DerivedSchedule, TargetSchedule, Telemetry, Urgency};

/// Placeholder used in arithmetic while no telemetry has been received.
pub const UNKNOWN_SECONDS: i32 = -999;

/// Leave at least this many minutes ahead and the indicator stays ambient.
pub const AMBIENT_HORIZON_MINUTES: i32 = 60;
/// Departure window, in minutes before the latest departure time.
pub const DEPART_WINDOW_MINUTES: i32 = 15;
/// Delay (whole minutes) separating light from heavy traffic.
pub const HEAVY_DELAY_MINUTES: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub urgency: Urgency,
    pub derived: DerivedSchedule,
}

/// Classify the commute at `now_minutes` (minutes since local midnight).
///
/// `previous` is the urgency currently displayed; a delay of exactly
/// [`HEAVY_DELAY_MINUTES`] keeps it as the tentative level.
pub fn classify(
    now_minutes: i32,
    schedule: &TargetSchedule,
    telemetry: &Telemetry,
    previous: Urgency,
) -> Classification {
    let travel_secs = telemetry.travel_time_secs.unwrap_or(UNKNOWN_SECONDS);
    let delay_secs = telemetry.traffic_delay_secs.unwrap_or(UNKNOWN_SECONDS);
    let travel_minutes = travel_secs / 60;

    let minutes_to_leave = schedule
        .arrive_by_minutes()
        .wrapping_sub(now_minutes)
        .wrapping_sub(travel_minutes);

    let arrival_minutes = now_minutes.wrapping_add(travel_minutes);
    let derived = DerivedSchedule {
        minutes_to_leave,
        arrival_hour: (arrival_minutes / 60) % 24,
        arrival_minute: arrival_minutes % 60,
    };

    let urgency = match schedule {
        TargetSchedule::Nighttime { .. } => Urgency::Ambient,
        _ => urgency_for(minutes_to_leave, delay_secs / 60, schedule, previous),
    };

    Classification { urgency, derived }
}

fn urgency_for(
    minutes_to_leave: i32,
    delay_minutes: i32,
    schedule: &TargetSchedule,
    previous: Urgency,
) -> Urgency {
    if minutes_to_leave >= AMBIENT_HORIZON_MINUTES {
        return Urgency::Ambient;
    }

    let mut urgency = previous;
    if delay_minutes < HEAVY_DELAY_MINUTES {
        urgency = Urgency::LowTraffic;
    } else if delay_minutes > HEAVY_DELAY_MINUTES {
        urgency = Urgency::HeavyTraffic;
    }

    if minutes_to_leave <= DEPART_WINDOW_MINUTES {
        urgency = if minutes_to_leave > 0 {
            Urgency::DepartNow
        } else if matches!(schedule, TargetSchedule::OpenArrival { .. }) {
            Urgency::Ambient
        } else {
            Urgency::Late
        };
    }

    urgency
}
