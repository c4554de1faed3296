use std::{fmt, ops, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::MediaError;

/// An RGB colour with components saturated into `0..=255`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

pub const BLACK: Color = Color::from_rgb((0, 0, 0));
pub const WHITE: Color = Color::from_rgb((255, 255, 255));
pub const BLUE: Color = Color::from_rgb((0, 0, 255));
pub const RED: Color = Color::from_rgb((255, 0, 0));
pub const GREEN: Color = Color::from_rgb((0, 255, 0));
pub const GRAY: Color = Color::from_rgb((128, 128, 128));
pub const DARK_GRAY: Color = Color::from_rgb((64, 64, 64));
pub const LIGHT_GRAY: Color = Color::from_rgb((192, 192, 192));
pub const YELLOW: Color = Color::from_rgb((255, 255, 0));
pub const ORANGE: Color = Color::from_rgb((255, 200, 0));
pub const PINK: Color = Color::from_rgb((255, 175, 175));
pub const MAGENTA: Color = Color::from_rgb((255, 0, 255));
pub const CYAN: Color = Color::from_rgb((0, 255, 255));

/// Named colours accepted by [`Color::from_str`].
pub const PALETTE: [(&str, Color); 13] = [
    ("black", BLACK),
    ("white", WHITE),
    ("blue", BLUE),
    ("red", RED),
    ("green", GREEN),
    ("gray", GRAY),
    ("darkgray", DARK_GRAY),
    ("lightgray", LIGHT_GRAY),
    ("yellow", YELLOW),
    ("orange", ORANGE),
    ("pink", PINK),
    ("magenta", MAGENTA),
    ("cyan", CYAN),
];

const DARKEN_FACTOR: f64 = 0.7;

fn saturate(component: i32) -> u8 {
    component.clamp(0, 255) as u8
}

impl Color {
    /// Builds a colour, clamping each component into `0..=255`.
    pub fn new(red: i32, green: i32, blue: i32) -> Self {
        Self {
            red: saturate(red),
            green: saturate(green),
            blue: saturate(blue),
        }
    }

    pub const fn from_rgb((red, green, blue): (u8, u8, u8)) -> Self {
        Self { red, green, blue }
    }

    /// Gray with all three components at `level`.
    pub fn gray(level: i32) -> Self {
        Self::new(level, level, level)
    }

    pub fn rgb(&self) -> (u8, u8, u8) {
        (self.red, self.green, self.blue)
    }

    /// Euclidean distance between the two colours in RGB space.
    pub fn distance(&self, other: &Color) -> f64 {
        let dr = self.red as f64 - other.red as f64;
        let dg = self.green as f64 - other.green as f64;
        let db = self.blue as f64 - other.blue as f64;
        (dr * dr + dg * dg + db * db).sqrt()
    }

    pub fn darker(&self) -> Self {
        let scale = |c: u8| (c as f64 * DARKEN_FACTOR) as i32;
        Self::new(scale(self.red), scale(self.green), scale(self.blue))
    }

    pub fn lighter(&self) -> Self {
        let scale = |c: u8| (c as f64 / DARKEN_FACTOR) as i32;
        Self::new(scale(self.red), scale(self.green), scale(self.blue))
    }

    /// Same as [`Color::lighter`].
    pub fn brighter(&self) -> Self {
        self.lighter()
    }

    /// Weighted luminance, used for grayscale conversion.
    pub fn luminance(&self) -> u8 {
        let value = 0.299 * self.red as f64 + 0.587 * self.green as f64 + 0.114 * self.blue as f64;
        value.round().clamp(0.0, 255.0) as u8
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from(rgb: (u8, u8, u8)) -> Self {
        Self::from_rgb(rgb)
    }
}

impl ops::Add for Color {
    type Output = Color;

    fn add(self, other: Color) -> Color {
        Color::new(
            self.red as i32 + other.red as i32,
            self.green as i32 + other.green as i32,
            self.blue as i32 + other.blue as i32,
        )
    }
}

impl ops::Sub for Color {
    type Output = Color;

    fn sub(self, other: Color) -> Color {
        Color::new(
            self.red as i32 - other.red as i32,
            self.green as i32 - other.green as i32,
            self.blue as i32 - other.blue as i32,
        )
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "color r={} g={} b={}", self.red, self.green, self.blue)
    }
}

impl FromStr for Color {
    type Err = MediaError;

    /// Accepts a palette name (`"pink"`, `"darkGray"`) or `#rrggbb`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(hex) = trimmed.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return Err(MediaError::invalid(format!("`{s}` is not a #rrggbb colour")));
            }
            let component = |range: ops::Range<usize>| {
                u8::from_str_radix(&hex[range], 16)
                    .map_err(|_| MediaError::invalid(format!("`{s}` is not a #rrggbb colour")))
            };
            return Ok(Color::from_rgb((component(0..2)?, component(2..4)?, component(4..6)?)));
        }

        let wanted = trimmed.to_ascii_lowercase().replace(['_', ' ', '-'], "");
        PALETTE
            .iter()
            .find(|(name, _)| *name == wanted)
            .map(|(_, color)| *color)
            .ok_or_else(|| MediaError::invalid(format!("unknown colour `{s}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_components_on_construction() {
        assert_eq!(Color::new(-5, 300, 128), Color::from_rgb((0, 255, 128)));
        assert_eq!(Color::gray(999), WHITE);
    }

    #[test]
    fn darker_and_lighter_match_scaling_rules() {
        assert_eq!(Color::new(100, 200, 10).darker(), Color::new(70, 140, 7));
        assert_eq!(Color::new(70, 200, 0).lighter(), Color::new(100, 255, 0));
        assert_eq!(PINK.brighter(), PINK.lighter());
    }

    #[test]
    fn arithmetic_saturates() {
        assert_eq!(Color::new(200, 10, 0) + Color::new(100, 10, 0), Color::new(255, 20, 0));
        assert_eq!(Color::new(10, 10, 10) - Color::new(20, 5, 10), Color::new(0, 5, 0));
    }

    #[test]
    fn measures_distance() {
        assert_eq!(BLACK.distance(&BLACK), 0.0);
        assert!((BLACK.distance(&Color::new(3, 4, 0)) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn parses_names_and_hex() {
        assert_eq!("darkGray".parse::<Color>().unwrap(), DARK_GRAY);
        assert_eq!("#ff8000".parse::<Color>().unwrap(), Color::new(255, 128, 0));
        assert!("#ff80".parse::<Color>().is_err());
        let err = "chartreuse".parse::<Color>().unwrap_err();
        assert!(format!("{err}").contains("chartreuse"));
    }

    #[test]
    fn renders_like_a_pixel_readout() {
        assert_eq!(ORANGE.to_string(), "color r=255 g=200 b=0");
    }
}
