//! Weekly destination planner.
//!
//! Picks the target arrival time, route label and LED brightness for a given
//! weekday and hour. Rules are applied in order and a later match overrides
//! the fields an earlier one set, so specific rules go after general ones.

use crate::state::DEFAULT_LOGIC_CALL_INTERVAL_MS;
use serde::{Deserialize, Serialize};

/// Hardware parameters in the same wire shape as a route response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareParameters {
    pub pixel_brightness: u8,
    pub logic_call_interval: u32,
    pub route_description: String,
    pub target_hour: i32,
    pub target_minute: i32,
}

impl Default for HardwareParameters {
    fn default() -> Self {
        Self {
            pixel_brightness: 100,
            logic_call_interval: DEFAULT_LOGIC_CALL_INTERVAL_MS,
            route_description: "LAX".to_string(),
            target_hour: 13,
            target_minute: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlanRule {
    /// Weekdays (1 = Sunday .. 7 = Saturday); empty matches every day.
    #[serde(default)]
    pub days: Vec<u8>,
    pub start_hour: u8,
    /// Exclusive.
    pub end_hour: u8,
    pub route_description: Option<String>,
    pub target_hour: Option<i32>,
    pub target_minute: Option<i32>,
    pub pixel_brightness: Option<u8>,
}

impl PlanRule {
    fn matches(&self, weekday: u8, hour: u8) -> bool {
        (self.days.is_empty() || self.days.contains(&weekday))
            && (self.start_hour..self.end_hour).contains(&hour)
    }

    fn overlay(&self, params: &mut HardwareParameters) {
        if let Some(description) = &self.route_description {
            params.route_description = description.clone();
        }
        if let Some(hour) = self.target_hour {
            params.target_hour = hour;
        }
        if let Some(minute) = self.target_minute {
            params.target_minute = minute;
        }
        if let Some(brightness) = self.pixel_brightness {
            params.pixel_brightness = brightness;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePlanner {
    defaults: HardwareParameters,
    rules: Vec<PlanRule>,
}

impl RoutePlanner {
    pub fn new(defaults: HardwareParameters, rules: Vec<PlanRule>) -> Self {
        Self { defaults, rules }
    }

    pub fn rules(&self) -> &[PlanRule] {
        &self.rules
    }

    pub fn plan(&self, weekday: u8, hour: u8) -> HardwareParameters {
        let mut params = self.defaults.clone();
        for rule in self.rules.iter().filter(|rule| rule.matches(weekday, hour)) {
            rule.overlay(&mut params);
        }
        params
    }
}

impl Default for RoutePlanner {
    fn default() -> Self {
        Self::new(HardwareParameters::default(), default_rules())
    }
}

fn rule(
    days: &[u8],
    hours: (u8, u8),
    description: &str,
    target: (i32, i32),
    brightness: Option<u8>,
) -> PlanRule {
    PlanRule {
        days: days.to_vec(),
        start_hour: hours.0,
        end_hour: hours.1,
        route_description: Some(description.to_string()),
        target_hour: Some(target.0),
        target_minute: Some(target.1),
        pixel_brightness: brightness,
    }
}

pub fn default_rules() -> Vec<PlanRule> {
    const SUNDAY: u8 = 1;
    const FRIDAY: u8 = 6;
    const SATURDAY: u8 = 7;
    const WEEKDAYS: [u8; 5] = [2, 3, 4, 5, 6];

    vec![
        rule(&[], (22, 24), "Nighttime", (-2, 0), Some(100)),
        rule(&WEEKDAYS, (5, 11), "Downtown Los Angeles", (10, 30), Some(255)),
        rule(&WEEKDAYS, (11, 22), "Santa Monica Beach", (-1, 0), None),
        rule(&[FRIDAY], (18, 22), "Hollywood", (22, 0), Some(150)),
        rule(&[SATURDAY], (5, 7), "Disneyland", (7, 30), None),
        rule(&[SATURDAY], (8, 22), "Griffith Observatory", (-1, -1), None),
        rule(&[SUNDAY], (5, 10), "Getty Center", (10, 0), None),
        rule(&[SUNDAY], (10, 22), "Venice Beach", (-1, -1), None),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekday_morning_is_downtown_commute() {
        let params = RoutePlanner::default().plan(3, 8);

        assert_eq!(params.route_description, "Downtown Los Angeles");
        assert_eq!((params.target_hour, params.target_minute), (10, 30));
        assert_eq!(params.pixel_brightness, 255);
        assert_eq!(params.logic_call_interval, 60_000);
    }

    #[test]
    fn weekday_afternoon_has_open_arrival() {
        let params = RoutePlanner::default().plan(2, 15);

        assert_eq!(params.route_description, "Santa Monica Beach");
        assert_eq!(params.target_hour, -1);
        assert_eq!(params.pixel_brightness, 100);
    }

    #[test]
    fn friday_evening_overrides_weekday_rule() {
        let params = RoutePlanner::default().plan(6, 19);

        assert_eq!(params.route_description, "Hollywood");
        assert_eq!((params.target_hour, params.target_minute), (22, 0));
        assert_eq!(params.pixel_brightness, 150);
    }

    #[test]
    fn late_evening_is_nighttime_every_day() {
        for weekday in 1..=7 {
            let params = RoutePlanner::default().plan(weekday, 23);
            assert_eq!(params.target_hour, -2);
            assert_eq!(params.route_description, "Nighttime");
        }
    }

    #[test]
    fn weekend_activities() {
        let planner = RoutePlanner::default();

        assert_eq!(planner.plan(7, 6).route_description, "Disneyland");
        assert_eq!(planner.plan(7, 12).target_minute, -1);
        assert_eq!(planner.plan(1, 9).route_description, "Getty Center");
        assert_eq!(planner.plan(1, 16).route_description, "Venice Beach");
    }

    #[test]
    fn unmatched_hours_fall_back_to_defaults() {
        let params = RoutePlanner::default().plan(7, 3);

        assert_eq!(params, HardwareParameters::default());
    }

    #[test]
    fn serializes_with_response_keys() -> Result<(), Box<dyn std::error::Error>> {
        let value = serde_json::to_value(HardwareParameters::default())?;

        assert_eq!(
            value,
            serde_json::json!({
                "pixelBrightness": 100,
                "logicCallInterval": 60000,
                "routeDescription": "LAX",
                "targetHour": 13,
                "targetMinute": 20
            })
        );
        Ok(())
    }
}
