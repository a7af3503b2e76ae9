use crate::signal::Urgency;
use rand::Rng;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "[u8; 3]")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Unpack a `0xRRGGBB` value; bits above 24 are ignored.
    pub const fn from_u24(value: u32) -> Self {
        Self {
            r: (value >> 16) as u8,
            g: (value >> 8) as u8,
            b: value as u8,
        }
    }

    pub const fn to_u24(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::from_u24(rng.random_range(0..=0x00FF_FFFF))
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

/// Axis-aligned box in RGB space; each channel is sampled independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ColorRange {
    pub min: Rgb,
    pub max: Rgb,
}

impl ColorRange {
    pub const fn new(min: Rgb, max: Rgb) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, color: Rgb) -> bool {
        (self.min.r..=self.max.r).contains(&color.r)
            && (self.min.g..=self.max.g).contains(&color.g)
            && (self.min.b..=self.max.b).contains(&color.b)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Rgb {
        Rgb {
            r: rng.random_range(self.min.r..=self.max.r),
            g: rng.random_range(self.min.g..=self.max.g),
            b: rng.random_range(self.min.b..=self.max.b),
        }
    }

    fn is_ordered(&self) -> bool {
        self.min.r <= self.max.r && self.min.g <= self.max.g && self.min.b <= self.max.b
    }

    fn overlaps(&self, other: &ColorRange) -> bool {
        let axis = |a_min: u8, a_max: u8, b_min: u8, b_max: u8| a_min <= b_max && b_min <= a_max;
        axis(self.min.r, self.max.r, other.min.r, other.max.r)
            && axis(self.min.g, self.max.g, other.min.g, other.max.g)
            && axis(self.min.b, self.max.b, other.min.b, other.max.b)
    }
}

/// Flash colors for the non-ambient urgency levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Palette {
    pub low_traffic: ColorRange,
    pub heavy_traffic: ColorRange,
    pub depart_now: ColorRange,
    pub late: ColorRange,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            // green
            low_traffic: ColorRange::new(Rgb::new(0, 160, 0), Rgb::new(40, 255, 60)),
            // red
            heavy_traffic: ColorRange::new(Rgb::new(170, 0, 0), Rgb::new(255, 40, 30)),
            // orange
            depart_now: ColorRange::new(Rgb::new(230, 110, 0), Rgb::new(255, 165, 20)),
            // blue
            late: ColorRange::new(Rgb::new(0, 0, 160), Rgb::new(40, 60, 255)),
        }
    }
}

impl Palette {
    /// The flash range for `urgency`; ambient has none.
    pub fn range_for(&self, urgency: Urgency) -> Option<&ColorRange> {
        match urgency {
            Urgency::Ambient => None,
            Urgency::LowTraffic => Some(&self.low_traffic),
            Urgency::HeavyTraffic => Some(&self.heavy_traffic),
            Urgency::DepartNow => Some(&self.depart_now),
            Urgency::Late => Some(&self.late),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let named = [
            ("low_traffic", &self.low_traffic),
            ("heavy_traffic", &self.heavy_traffic),
            ("depart_now", &self.depart_now),
            ("late", &self.late),
        ];

        for (name, range) in named {
            if !range.is_ordered() {
                return Err(format!("palette.{name}: min exceeds max on some channel"));
            }
        }

        for (i, (name, range)) in named.iter().enumerate() {
            for (other_name, other) in &named[i + 1..] {
                if range.overlaps(other) {
                    return Err(format!("palette.{name} overlaps palette.{other_name}"));
                }
            }
        }

        Ok(())
    }
}
