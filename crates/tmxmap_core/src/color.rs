use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An sRGB color as written by Tiled: `#RRGGBB` or `#AARRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl Color {
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: 0xff,
        }
    }

    /// Components scaled to `0.0..=1.0`, in RGBA order.
    pub fn to_f32_array(self) -> [f32; 4] {
        [self.red, self.green, self.blue, self.alpha].map(|c| f32::from(c) / 255.0)
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return Err(format!("'{s}' is not a hex color"));
        }
        let channel = |index: usize| {
            u8::from_str_radix(&hex[index..index + 2], 16)
                .map_err(|_| format!("'{s}' is not a hex color"))
        };
        match hex.len() {
            6 => Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Ok(Color {
                alpha: channel(0)?,
                red: channel(2)?,
                green: channel(4)?,
                blue: channel(6)?,
            }),
            _ => Err(format!("'{s}' is not a #RRGGBB or #AARRGGBB color")),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02x}{:02x}{:02x}{:02x}",
            self.alpha, self.red, self.green, self.blue
        )
    }
}
