// fitbatch/src/core/color.rs
use super::{ResizeError, Result};
use image::Rgba;
use std::fmt;
use std::str::FromStr;

/// Canvas fill color, written as `#rgb`, `#rrggbb` or `#rrggbbaa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Background(pub Rgba<u8>);

impl Background {
    pub const BLACK: Background = Background(Rgba([0, 0, 0, 255]));
    pub const WHITE: Background = Background(Rgba([255, 255, 255, 255]));

    pub fn rgba(self) -> Rgba<u8> {
        self.0
    }
}

impl Default for Background {
    fn default() -> Self {
        Self::BLACK
    }
}

impl FromStr for Background {
    type Err = ResizeError;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        let invalid = || ResizeError::InvalidParameter(format!("Invalid background color: {}", s));

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());

        match hex.len() {
            3 => {
                let mut rgb = [0u8; 3];
                for (i, c) in hex.chars().enumerate() {
                    let v = c.to_digit(16).ok_or_else(invalid)? as u8;
                    rgb[i] = v * 17;
                }
                Ok(Background(Rgba([rgb[0], rgb[1], rgb[2], 255])))
            }
            6 => Ok(Background(Rgba([channel(0)?, channel(2)?, channel(4)?, 255]))),
            8 => Ok(Background(Rgba([
                channel(0)?,
                channel(2)?,
                channel(4)?,
                channel(6)?,
            ]))),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Background {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0 .0;
        if a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", r, g, b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", r, g, b, a)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_forms() {
        assert_eq!("#000000".parse::<Background>().unwrap(), Background::BLACK);
        assert_eq!("fff".parse::<Background>().unwrap(), Background::WHITE);
        assert_eq!(
            "#11223380".parse::<Background>().unwrap().rgba(),
            Rgba([0x11, 0x22, 0x33, 0x80])
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!("#12".parse::<Background>().is_err());
        assert!("#gg0000".parse::<Background>().is_err());
        assert!("#é0000".parse::<Background>().is_err());
    }

    #[test]
    fn display_round_trips_opaque_colors() {
        let color: Background = "#1a2b3c".parse().unwrap();
        assert_eq!(color.to_string(), "#1a2b3c");
    }
}
