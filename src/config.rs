use crate::animation::{DEFAULT_FRAME_INTERVAL_MS, Palette};
use crate::led::ws2812::DEFAULT_SPI_CLOCK_HZ;
use crate::led::{DEFAULT_BRIGHTNESS, DEFAULT_PIXEL_COUNT};
use crate::link::http::{DEFAULT_PROBE_INTERVAL, DEFAULT_TIMEOUT};
use crate::link::planner::{HardwareParameters, PlanRule, RoutePlanner, default_rules};
use crate::signal::TargetSchedule;
use crate::state::DEFAULT_LOGIC_CALL_INTERVAL_MS;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
pub const DEFAULT_SERVER_PORT: u16 = 8080;
pub const DEFAULT_ROUTE_COORDINATES: &str = "34.1808,-118.3089:33.9416,-118.4085";
pub const DEFAULT_ROUTE_DESCRIPTION: &str = "Burbank to LAX";
pub const DEFAULT_TIMEZONE_OFFSET_HOURS: i8 = -7;
pub const DEFAULT_WARMUP_MS: u32 = 2_000;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 10;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: AppSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub route: Option<RouteSection>,
    #[serde(default)]
    pub schedule: Option<ScheduleSection>,
    #[serde(default)]
    pub clock: Option<ClockSection>,
    #[serde(default)]
    pub animation: Option<AnimationSection>,
    #[serde(default)]
    pub scheduler: Option<SchedulerSection>,
    #[serde(default)]
    pub transport: Option<TransportSection>,
    #[serde(default)]
    pub led: Option<LedSection>,
    #[serde(default)]
    pub server: Option<ServerSection>,
    #[serde(default)]
    pub planner: Option<PlannerSection>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RouteSection {
    /// `lat,lon:lat,lon` waypoints sent with every request.
    pub coordinates: Option<String>,
    /// Shown on the display until a response names the route.
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleSection {
    /// -1 for open arrival, -2 for nighttime, otherwise an hour of day.
    pub target_hour: i32,
    #[serde(default)]
    pub target_minute: i32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClockSection {
    pub timezone_offset_hours: Option<i8>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnimationSection {
    pub pixel_count: Option<usize>,
    pub frame_interval_ms: Option<u32>,
    pub brightness: Option<u8>,
    pub palette: Option<Palette>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerSection {
    pub logic_call_interval_ms: Option<u32>,
    /// Delay before the first request after startup.
    pub warmup_ms: Option<u32>,
    pub tick_interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Http,
    #[default]
    Loopback,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TransportSection {
    #[serde(default)]
    pub mode: TransportMode,
    pub endpoint: Option<String>,
    pub timeout_ms: Option<u64>,
    pub probe_interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LedDriver {
    #[default]
    Log,
    Ws2812,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LedSection {
    #[serde(default)]
    pub driver: LedDriver,
    pub spi_clock_hz: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSection {
    /// Port to listen on (default: 8080)
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlannerSection {
    /// Replaces the built-in weekly table when present.
    pub rules: Option<Vec<PlanRule>>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

pub fn load_default() -> Result<Config, ConfigError> {
    load_from_path(DEFAULT_CONFIG_PATH)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pixel_count() == 0 {
            return Err(ConfigError::Invalid(
                "animation.pixel_count must be at least 1".to_string(),
            ));
        }
        self.palette().validate().map_err(ConfigError::Invalid)?;
        if !(-12..=14).contains(&self.timezone_offset_hours()) {
            return Err(ConfigError::Invalid(format!(
                "clock.timezone_offset_hours {} outside -12..=14",
                self.timezone_offset_hours()
            )));
        }
        if self.transport_mode() == TransportMode::Http && self.transport_endpoint().is_none() {
            return Err(ConfigError::Invalid(
                "transport.endpoint is required for http mode".to_string(),
            ));
        }
        Ok(())
    }

    pub fn log_level(&self) -> tracing::Level {
        self.logging
            .level
            .parse()
            .unwrap_or(tracing::Level::INFO)
    }

    pub fn route_coordinates(&self) -> &str {
        self.route
            .as_ref()
            .and_then(|r| r.coordinates.as_deref())
            .unwrap_or(DEFAULT_ROUTE_COORDINATES)
    }

    pub fn route_description(&self) -> &str {
        self.route
            .as_ref()
            .and_then(|r| r.description.as_deref())
            .unwrap_or(DEFAULT_ROUTE_DESCRIPTION)
    }

    /// Target before the first response arrives (default: 10:00).
    pub fn initial_schedule(&self) -> TargetSchedule {
        match &self.schedule {
            Some(section) => TargetSchedule::from_wire(section.target_hour, section.target_minute),
            None => TargetSchedule::At {
                hour: 10,
                minute: 0,
            },
        }
    }

    pub fn timezone_offset_hours(&self) -> i8 {
        self.clock
            .as_ref()
            .and_then(|c| c.timezone_offset_hours)
            .unwrap_or(DEFAULT_TIMEZONE_OFFSET_HOURS)
    }

    pub fn pixel_count(&self) -> usize {
        self.animation
            .as_ref()
            .and_then(|a| a.pixel_count)
            .unwrap_or(DEFAULT_PIXEL_COUNT)
    }

    pub fn frame_interval_ms(&self) -> u32 {
        self.animation
            .as_ref()
            .and_then(|a| a.frame_interval_ms)
            .unwrap_or(DEFAULT_FRAME_INTERVAL_MS)
    }

    pub fn brightness(&self) -> u8 {
        self.animation
            .as_ref()
            .and_then(|a| a.brightness)
            .unwrap_or(DEFAULT_BRIGHTNESS)
    }

    pub fn palette(&self) -> Palette {
        self.animation
            .as_ref()
            .and_then(|a| a.palette)
            .unwrap_or_default()
    }

    pub fn logic_call_interval_ms(&self) -> u32 {
        self.scheduler
            .as_ref()
            .and_then(|s| s.logic_call_interval_ms)
            .unwrap_or(DEFAULT_LOGIC_CALL_INTERVAL_MS)
    }

    pub fn warmup_ms(&self) -> u32 {
        self.scheduler
            .as_ref()
            .and_then(|s| s.warmup_ms)
            .unwrap_or(DEFAULT_WARMUP_MS)
    }

    /// Period of the cooperative tick loop (default: 10 ms)
    pub fn tick_interval(&self) -> Duration {
        let ms = self
            .scheduler
            .as_ref()
            .and_then(|s| s.tick_interval_ms)
            .unwrap_or(DEFAULT_TICK_INTERVAL_MS);
        Duration::from_millis(ms.max(1))
    }

    pub fn transport_mode(&self) -> TransportMode {
        self.transport.as_ref().map(|t| t.mode).unwrap_or_default()
    }

    pub fn transport_endpoint(&self) -> Option<&str> {
        self.transport
            .as_ref()
            .and_then(|t| t.endpoint.as_deref())
            .filter(|endpoint| !endpoint.trim().is_empty())
    }

    pub fn transport_timeout(&self) -> Duration {
        self.transport
            .as_ref()
            .and_then(|t| t.timeout_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn probe_interval(&self) -> Duration {
        self.transport
            .as_ref()
            .and_then(|t| t.probe_interval_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_PROBE_INTERVAL)
    }

    pub fn led_driver(&self) -> LedDriver {
        self.led.as_ref().map(|l| l.driver).unwrap_or_default()
    }

    pub fn spi_clock_hz(&self) -> u32 {
        self.led
            .as_ref()
            .and_then(|l| l.spi_clock_hz)
            .unwrap_or(DEFAULT_SPI_CLOCK_HZ)
    }

    /// Returns the server port (default: 8080)
    pub fn server_port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_SERVER_PORT)
    }

    pub fn planner(&self) -> RoutePlanner {
        let rules = self
            .planner
            .as_ref()
            .and_then(|p| p.rules.clone())
            .unwrap_or_else(default_rules);
        let defaults = HardwareParameters {
            pixel_brightness: self.brightness(),
            logic_call_interval: self.logic_call_interval_ms(),
            ..HardwareParameters::default()
        };
        RoutePlanner::new(defaults, rules)
    }
}
