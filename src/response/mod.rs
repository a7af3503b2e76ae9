use crate::clock::{LocalTime, WallClock};
use crate::display::{TextDisplay, render_status};
use crate::error::AppError;
use crate::signal::{Classification, classify};
use crate::state::AppState;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub mod decode;

pub use decode::{DecodeError, ResponseUpdate, decode_response};

/// Inbound payloads waiting for the response task.
pub const INBOUND_QUEUE_DEPTH: usize = 16;

/// Decode `payload`, fold it into the shared state, reclassify and redraw.
///
/// A payload that fails to decode leaves the state untouched.
pub fn handle_response(
    state: &Arc<RwLock<AppState>>,
    payload: &str,
    now: &LocalTime,
    display: &mut dyn TextDisplay,
) -> Result<Classification, AppError> {
    let update = decode_response(payload)?;
    if update.is_empty() {
        debug!("Response carried no recognized keys");
    }

    let (classification, frame) = {
        let mut guard = state.write().map_err(|_| AppError::StateLock)?;
        apply_update(&mut guard, &update);

        let classification = classify(
            now.minutes_since_midnight(),
            guard.schedule(),
            guard.telemetry(),
            guard.urgency(),
        );
        guard.record_classification(classification, SystemTime::now());

        let frame = render_status(
            now,
            guard.schedule(),
            guard.telemetry(),
            &classification.derived,
        );
        (classification, frame)
    };

    info!(
        urgency = ?classification.urgency,
        minutes_to_leave = classification.derived.minutes_to_leave,
        "Route response applied"
    );

    match frame {
        Some(frame) => display.show_status(&frame)?,
        None => warn!("Unrecognized target schedule, display left unchanged"),
    }

    Ok(classification)
}

/// Copy the present fields of `update` into `state`, clamping to field ranges.
pub fn apply_update(state: &mut AppState, update: &ResponseUpdate) {
    let telemetry = state.telemetry_mut();
    if let Some(seconds) = update.travel_time_secs {
        telemetry.travel_time_secs = Some(saturate_i32(seconds));
    }
    if let Some(seconds) = update.traffic_delay_secs {
        telemetry.traffic_delay_secs = Some(saturate_i32(seconds));
    }
    if let Some(description) = &update.route_description {
        telemetry.route_description = description.clone();
    }

    let config = state.config_mut();
    if let Some(brightness) = update.pixel_brightness {
        let clamped = brightness.clamp(0, i64::from(u8::MAX));
        if clamped != brightness {
            warn!(brightness, "pixelBrightness outside 0-255, clamped");
        }
        config.pixel_brightness = clamped as u8;
    }
    if let Some(interval) = update.logic_call_interval_ms {
        let clamped = interval.clamp(0, i64::from(u32::MAX));
        if clamped != interval {
            warn!(interval, "logicCallInterval outside u32 range, clamped");
        }
        config.logic_call_interval_ms = clamped as u32;
    }

    let mut schedule = *state.schedule();
    if let Some(hour) = update.target_hour {
        schedule = schedule.with_hour(saturate_i32(hour));
    }
    if let Some(minute) = update.target_minute {
        schedule = schedule.with_minute(saturate_i32(minute));
    }
    state.set_schedule(schedule);
}

fn saturate_i32(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Drain inbound payloads until every sender is dropped.
pub async fn run_response_task<C, D>(
    mut inbound: mpsc::Receiver<String>,
    state: Arc<RwLock<AppState>>,
    clock: C,
    mut display: D,
) where
    C: WallClock,
    D: TextDisplay,
{
    while let Some(payload) = inbound.recv().await {
        debug!(bytes = payload.len(), "Route response received");
        let now = clock.now();
        match handle_response(&state, &payload, &now, &mut display) {
            Ok(_) => {}
            Err(AppError::Decode(err)) => {
                warn!(error = %err, payload = %payload, "Discarding malformed route response");
            }
            Err(err) => warn!(error = %err, "Route response handling failed"),
        }
    }
    info!("Inbound queue closed, response task stopping");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::display::mock::RecordingDisplay;
    use crate::signal::{TargetSchedule, Telemetry, Urgency};
    use crate::state::EngineConfig;

    fn shared_state() -> Arc<RwLock<AppState>> {
        Arc::new(RwLock::new(AppState::new(
            TargetSchedule::At {
                hour: 10,
                minute: 0,
            },
            Telemetry::awaiting("Burbank to LAX"),
            EngineConfig {
                pixel_brightness: 100,
                logic_call_interval_ms: 60_000,
            },
        )))
    }

    #[test]
    fn full_response_classifies_and_renders() -> Result<(), Box<dyn std::error::Error>> {
        let state = shared_state();
        let mut display = RecordingDisplay::new();
        let now = FixedClock::at(9, 50).now();

        let classification = handle_response(
            &state,
            r#"{"travelTimeInSeconds":300,"trafficDelayInSeconds":120,"targetHour":10,"targetMinute":0}"#,
            &now,
            &mut display,
        )?;

        assert_eq!(classification.urgency, Urgency::DepartNow);
        assert_eq!(classification.derived.minutes_to_leave, 5);
        let frame = display.last_status().ok_or("no status rendered")?;
        assert!(frame.text().contains("Leave in: 5m"));

        let guard = state.read().map_err(|_| AppError::StateLock)?;
        assert_eq!(guard.urgency(), Urgency::DepartNow);
        assert_eq!(guard.signal().urgency, Urgency::DepartNow);
        Ok(())
    }

    #[test]
    fn malformed_payload_changes_nothing() -> Result<(), Box<dyn std::error::Error>> {
        let state = shared_state();
        let mut display = RecordingDisplay::new();
        let now = FixedClock::at(9, 0).now();

        let result = handle_response(&state, "{\"targetHour\":", &now, &mut display);

        assert!(matches!(result, Err(AppError::Decode(_))));
        assert!(display.screens().is_empty());
        let guard = state.read().map_err(|_| AppError::StateLock)?;
        assert!(guard.derived().is_none());
        assert_eq!(
            *guard.schedule(),
            TargetSchedule::At {
                hour: 10,
                minute: 0
            }
        );
        Ok(())
    }

    #[test]
    fn brightness_only_payload_rerenders_with_stored_values()
    -> Result<(), Box<dyn std::error::Error>> {
        let state = shared_state();
        let mut display = RecordingDisplay::new();
        let now = FixedClock::at(9, 0).now();
        handle_response(
            &state,
            r#"{"travelTimeInSeconds":300,"trafficDelayInSeconds":900,"routeDescription":"Downtown"}"#,
            &now,
            &mut display,
        )?;

        let classification =
            handle_response(&state, r#"{"pixelBrightness":40}"#, &now, &mut display)?;

        assert_eq!(classification.urgency, Urgency::HeavyTraffic);
        assert_eq!(display.screens().len(), 2);
        let guard = state.read().map_err(|_| AppError::StateLock)?;
        assert_eq!(guard.config().pixel_brightness, 40);
        assert_eq!(guard.telemetry().travel_time_secs, Some(300));
        assert_eq!(guard.telemetry().route_description, "Downtown");
        assert_eq!(guard.signal().pixel_brightness, 40);
        Ok(())
    }

    #[test]
    fn out_of_range_values_are_clamped() -> Result<(), Box<dyn std::error::Error>> {
        let state = shared_state();
        let mut guard = state.write().map_err(|_| AppError::StateLock)?;
        let update = ResponseUpdate {
            pixel_brightness: Some(400),
            logic_call_interval_ms: Some(-5),
            travel_time_secs: Some(i64::MAX),
            ..ResponseUpdate::default()
        };

        apply_update(&mut guard, &update);

        assert_eq!(guard.config().pixel_brightness, 255);
        assert_eq!(guard.config().logic_call_interval_ms, 0);
        assert_eq!(guard.telemetry().travel_time_secs, Some(i32::MAX));
        Ok(())
    }

    #[test]
    fn target_minute_alone_keeps_hour() -> Result<(), Box<dyn std::error::Error>> {
        let state = shared_state();
        let mut guard = state.write().map_err(|_| AppError::StateLock)?;
        let update = ResponseUpdate {
            target_minute: Some(45),
            ..ResponseUpdate::default()
        };

        apply_update(&mut guard, &update);

        assert_eq!(
            *guard.schedule(),
            TargetSchedule::At {
                hour: 10,
                minute: 45
            }
        );
        Ok(())
    }

    #[test]
    fn unrecognized_schedule_skips_display() -> Result<(), Box<dyn std::error::Error>> {
        let state = shared_state();
        let mut display = RecordingDisplay::new();
        let now = FixedClock::at(9, 0).now();

        handle_response(&state, r#"{"targetHour":-9}"#, &now, &mut display)?;

        assert!(display.screens().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn huge_target_hour_does_not_stop_later_responses() -> Result<(), Box<dyn std::error::Error>> {
        let state = shared_state();
        let display = RecordingDisplay::new();
        let (tx, rx) = mpsc::channel(INBOUND_QUEUE_DEPTH);

        tx.send(r#"{"targetHour":40000000}"#.to_string()).await?;
        tx.send(
            r#"{"targetHour":10,"targetMinute":0,"travelTimeInSeconds":300,"trafficDelayInSeconds":120}"#
                .to_string(),
        )
        .await?;
        drop(tx);
        let task = tokio::spawn(run_response_task(
            rx,
            Arc::clone(&state),
            FixedClock::at(9, 50),
            display.clone(),
        ));
        task.await?;

        assert!(!state.is_poisoned());
        assert_eq!(display.screens().len(), 2);
        let guard = state.read().map_err(|_| AppError::StateLock)?;
        assert_eq!(
            *guard.schedule(),
            TargetSchedule::At {
                hour: 10,
                minute: 0
            }
        );
        assert_eq!(guard.urgency(), Urgency::DepartNow);
        assert_eq!(guard.derived().map(|d| d.minutes_to_leave), Some(5));
        Ok(())
    }

    #[tokio::test]
    async fn response_task_drains_queue() -> Result<(), Box<dyn std::error::Error>> {
        let state = shared_state();
        let display = RecordingDisplay::new();
        let (tx, rx) = mpsc::channel(INBOUND_QUEUE_DEPTH);

        tx.send("garbage".to_string()).await?;
        tx.send(r#"{"targetHour":-2}"#.to_string()).await?;
        drop(tx);
        run_response_task(rx, Arc::clone(&state), FixedClock::at(23, 0), display.clone()).await;

        assert_eq!(display.screens().len(), 1);
        let guard = state.read().map_err(|_| AppError::StateLock)?;
        assert_eq!(guard.urgency(), Urgency::Ambient);
        assert_eq!(
            *guard.schedule(),
            TargetSchedule::Nighttime { minute: 0 }
        );
        Ok(())
    }
}
