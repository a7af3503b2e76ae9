use crate::signal::{Classification, DerivedSchedule, TargetSchedule, Telemetry, Urgency};
use std::time::SystemTime;
use tokio::sync::watch;

pub const DEFAULT_LOGIC_CALL_INTERVAL_MS: u32 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub pixel_brightness: u8,
    pub logic_call_interval_ms: u32,
}

/// What the tick loop needs from the response side, published as one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalSnapshot {
    pub urgency: Urgency,
    pub pixel_brightness: u8,
    pub logic_call_interval_ms: u32,
}

#[derive(Debug)]
pub struct AppState {
    schedule: TargetSchedule,
    telemetry: Telemetry,
    config: EngineConfig,
    urgency: Urgency,
    derived: Option<DerivedSchedule>,
    updated_at: Option<SystemTime>,
    signal_tx: watch::Sender<SignalSnapshot>,
}

impl AppState {
    pub fn new(schedule: TargetSchedule, telemetry: Telemetry, config: EngineConfig) -> Self {
        let (signal_tx, _signal_rx) = watch::channel(SignalSnapshot {
            urgency: Urgency::Ambient,
            pixel_brightness: config.pixel_brightness,
            logic_call_interval_ms: config.logic_call_interval_ms,
        });
        Self {
            schedule,
            telemetry,
            config,
            urgency: Urgency::Ambient,
            derived: None,
            updated_at: None,
            signal_tx,
        }
    }

    pub fn schedule(&self) -> &TargetSchedule {
        &self.schedule
    }

    pub fn set_schedule(&mut self, schedule: TargetSchedule) {
        self.schedule = schedule;
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    pub fn telemetry_mut(&mut self) -> &mut Telemetry {
        &mut self.telemetry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut EngineConfig {
        &mut self.config
    }

    pub fn urgency(&self) -> Urgency {
        self.urgency
    }

    pub fn derived(&self) -> Option<&DerivedSchedule> {
        self.derived.as_ref()
    }

    pub fn updated_at(&self) -> Option<SystemTime> {
        self.updated_at
    }

    pub fn signal(&self) -> SignalSnapshot {
        *self.signal_tx.borrow()
    }

    pub fn subscribe_signal(&self) -> watch::Receiver<SignalSnapshot> {
        self.signal_tx.subscribe()
    }

    /// Store a classification and publish the new snapshot to subscribers.
    pub fn record_classification(&mut self, classification: Classification, at: SystemTime) {
        self.urgency = classification.urgency;
        self.derived = Some(classification.derived);
        self.updated_at = Some(at);
        self.signal_tx.send_replace(SignalSnapshot {
            urgency: self.urgency,
            pixel_brightness: self.config.pixel_brightness,
            logic_call_interval_ms: self.config.logic_call_interval_ms,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn state() -> AppState {
        AppState::new(
            TargetSchedule::At {
                hour: 10,
                minute: 0,
            },
            Telemetry::awaiting("Burbank to LAX"),
            EngineConfig {
                pixel_brightness: 100,
                logic_call_interval_ms: DEFAULT_LOGIC_CALL_INTERVAL_MS,
            },
        )
    }

    #[test]
    fn starts_ambient_without_derived_schedule() {
        let state = state();

        assert_eq!(state.urgency(), Urgency::Ambient);
        assert!(state.derived().is_none());
        assert!(state.updated_at().is_none());
        assert_eq!(state.signal().pixel_brightness, 100);
    }

    #[test]
    fn record_classification_updates_state_and_watch() {
        let mut state = state();
        let receiver = state.subscribe_signal();
        state.config_mut().pixel_brightness = 255;
        let classification = Classification {
            urgency: Urgency::DepartNow,
            derived: DerivedSchedule {
                minutes_to_leave: 5,
                arrival_hour: 9,
                arrival_minute: 55,
            },
        };
        let at = UNIX_EPOCH + Duration::from_secs(60);

        state.record_classification(classification, at);

        assert_eq!(state.urgency(), Urgency::DepartNow);
        assert_eq!(state.derived(), Some(&classification.derived));
        assert_eq!(state.updated_at(), Some(at));
        assert_eq!(
            *receiver.borrow(),
            SignalSnapshot {
                urgency: Urgency::DepartNow,
                pixel_brightness: 255,
                logic_call_interval_ms: DEFAULT_LOGIC_CALL_INTERVAL_MS,
            }
        );
    }

    #[test]
    fn record_without_subscribers_still_updates_snapshot() {
        let mut state = state();
        let classification = Classification {
            urgency: Urgency::Late,
            derived: DerivedSchedule {
                minutes_to_leave: -4,
                arrival_hour: 10,
                arrival_minute: 4,
            },
        };

        state.record_classification(classification, UNIX_EPOCH);

        assert_eq!(state.signal().urgency, Urgency::Late);
    }
}
