//! Commute signal model: urgency levels, target schedule and telemetry.

use serde::Serialize;

pub mod classifier;

pub use classifier::{Classification, classify};

/// Wire code for "arrive any time".
pub const OPEN_ARRIVAL_HOUR: i32 = -1;
/// Wire code for the nighttime routine.
pub const NIGHTTIME_HOUR: i32 = -2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    #[default]
    Ambient,
    LowTraffic,
    HeavyTraffic,
    DepartNow,
    Late,
}

impl Urgency {
    pub fn code(self) -> u8 {
        match self {
            Urgency::Ambient => 0,
            Urgency::LowTraffic => 1,
            Urgency::HeavyTraffic => 2,
            Urgency::DepartNow => 3,
            Urgency::Late => 4,
        }
    }
}

/// Target arrival, decoded from the `targetHour`/`targetMinute` wire pair.
///
/// Every variant keeps its minute so `arrive_by_minutes` matches the wire
/// arithmetic even in the sentinel modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSchedule {
    OpenArrival { minute: i32 },
    Nighttime { minute: i32 },
    At { hour: i32, minute: i32 },
    Unrecognized { hour: i32, minute: i32 },
}

impl TargetSchedule {
    pub fn from_wire(hour: i32, minute: i32) -> Self {
        match hour {
            OPEN_ARRIVAL_HOUR => TargetSchedule::OpenArrival { minute },
            NIGHTTIME_HOUR => TargetSchedule::Nighttime { minute },
            hour if hour >= 0 => TargetSchedule::At { hour, minute },
            hour => TargetSchedule::Unrecognized { hour, minute },
        }
    }

    pub fn hour_code(&self) -> i32 {
        match *self {
            TargetSchedule::OpenArrival { .. } => OPEN_ARRIVAL_HOUR,
            TargetSchedule::Nighttime { .. } => NIGHTTIME_HOUR,
            TargetSchedule::At { hour, .. } | TargetSchedule::Unrecognized { hour, .. } => hour,
        }
    }

    pub fn minute(&self) -> i32 {
        match *self {
            TargetSchedule::OpenArrival { minute }
            | TargetSchedule::Nighttime { minute }
            | TargetSchedule::At { minute, .. }
            | TargetSchedule::Unrecognized { minute, .. } => minute,
        }
    }

    pub fn with_hour(self, hour: i32) -> Self {
        Self::from_wire(hour, self.minute())
    }

    pub fn with_minute(self, minute: i32) -> Self {
        Self::from_wire(self.hour_code(), minute)
    }

    pub fn arrive_by_minutes(&self) -> i32 {
        // Wrapping, so any hour code a response carries is safe to classify.
        self.hour_code().wrapping_mul(60).wrapping_add(self.minute())
    }
}

/// Route timing reported by the traffic service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Telemetry {
    pub travel_time_secs: Option<i32>,
    pub traffic_delay_secs: Option<i32>,
    pub route_description: String,
}

impl Telemetry {
    pub fn awaiting(route_description: impl Into<String>) -> Self {
        Self {
            travel_time_secs: None,
            traffic_delay_secs: None,
            route_description: route_description.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DerivedSchedule {
    pub minutes_to_leave: i32,
    pub arrival_hour: i32,
    pub arrival_minute: i32,
}
