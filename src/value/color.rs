//! Sass color values.

use std::fmt;

use once_cell::unsync::OnceCell;

use crate::value::number::format_double;

/// An RGBA color.
///
/// The HSL representation is computed on first use and cached; equality
/// looks only at the channels.  `original` preserves the text the color was
/// written as (`red`, `#abc`) so it can round-trip through serialization and
/// so the evaluator can warn when a *named* color ends up inside
/// interpolation.
#[derive(Debug, Clone)]
pub struct SassColor {
    red: u8,
    green: u8,
    blue: u8,
    alpha: f64,
    hsl: OnceCell<(f64, f64, f64)>,
    original: Option<String>,
}

impl SassColor {
    pub fn rgba(red: u8, green: u8, blue: u8, alpha: f64) -> SassColor {
        SassColor {
            red,
            green,
            blue,
            alpha: alpha.clamp(0.0, 1.0),
            hsl: OnceCell::new(),
            original: None,
        }
    }

    pub fn rgb(red: u8, green: u8, blue: u8) -> SassColor {
        SassColor::rgba(red, green, blue, 1.0)
    }

    pub fn with_original(mut self, original: impl Into<String>) -> SassColor {
        self.original = Some(original.into());
        self
    }

    /// Looks a color keyword up through cssparser's keyword table.
    pub fn from_name(name: &str) -> Option<SassColor> {
        match cssparser::parse_color_keyword(name) {
            Ok(cssparser::Color::RGBA(rgba)) => Some(
                SassColor::rgba(rgba.red, rgba.green, rgba.blue, rgba.alpha_f32() as f64)
                    .with_original(name),
            ),
            _ => None,
        }
    }

    pub fn red(&self) -> u8 {
        self.red
    }

    pub fn green(&self) -> u8 {
        self.green
    }

    pub fn blue(&self) -> u8 {
        self.blue
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// The keyword this color was written as, if it was written as one.
    pub fn name(&self) -> Option<&str> {
        self.original
            .as_deref()
            .filter(|o| o.chars().all(|c| c.is_ascii_alphabetic()))
    }

    pub fn hue(&self) -> f64 {
        self.hsl_values().0
    }

    pub fn saturation(&self) -> f64 {
        self.hsl_values().1
    }

    pub fn lightness(&self) -> f64 {
        self.hsl_values().2
    }

    fn hsl_values(&self) -> (f64, f64, f64) {
        *self.hsl.get_or_init(|| {
            let r = f64::from(self.red) / 255.0;
            let g = f64::from(self.green) / 255.0;
            let b = f64::from(self.blue) / 255.0;

            let max = r.max(g).max(b);
            let min = r.min(g).min(b);
            let delta = max - min;

            let lightness = (max + min) / 2.0;

            if delta == 0.0 {
                return (0.0, 0.0, lightness * 100.0);
            }

            let saturation = if lightness < 0.5 {
                delta / (max + min)
            } else {
                delta / (2.0 - max - min)
            };

            let hue = if max == r {
                60.0 * (g - b) / delta
            } else if max == g {
                120.0 + 60.0 * (b - r) / delta
            } else {
                240.0 + 60.0 * (r - g) / delta
            };

            (hue.rem_euclid(360.0), saturation * 100.0, lightness * 100.0)
        })
    }

    pub fn from_hsl(hue: f64, saturation: f64, lightness: f64, alpha: f64) -> SassColor {
        let h = hue.rem_euclid(360.0) / 360.0;
        let s = (saturation / 100.0).clamp(0.0, 1.0);
        let l = (lightness / 100.0).clamp(0.0, 1.0);

        let channel = |m1: f64, m2: f64, mut h: f64| -> f64 {
            if h < 0.0 {
                h += 1.0;
            }
            if h > 1.0 {
                h -= 1.0;
            }
            if h * 6.0 < 1.0 {
                m1 + (m2 - m1) * h * 6.0
            } else if h * 2.0 < 1.0 {
                m2
            } else if h * 3.0 < 2.0 {
                m1 + (m2 - m1) * (2.0 / 3.0 - h) * 6.0
            } else {
                m1
            }
        };

        let m2 = if l <= 0.5 { l * (s + 1.0) } else { l + s - l * s };
        let m1 = l * 2.0 - m2;

        SassColor::rgba(
            (channel(m1, m2, h + 1.0 / 3.0) * 255.0).round() as u8,
            (channel(m1, m2, h) * 255.0).round() as u8,
            (channel(m1, m2, h - 1.0 / 3.0) * 255.0).round() as u8,
            alpha,
        )
    }
}

impl PartialEq for SassColor {
    fn eq(&self, other: &SassColor) -> bool {
        self.red == other.red
            && self.green == other.green
            && self.blue == other.blue
            && self.alpha == other.alpha
    }
}

impl fmt::Display for SassColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(original) = &self.original {
            return write!(f, "{}", original);
        }

        if self.alpha >= 1.0 {
            write!(
                f,
                "#{:02x}{:02x}{:02x}",
                self.red, self.green, self.blue
            )
        } else {
            write!(
                f,
                "rgba({}, {}, {}, {})",
                self.red,
                self.green,
                self.blue,
                format_double(self.alpha)
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_lookup() {
        let red = SassColor::from_name("red").unwrap();
        assert_eq!(red, SassColor::rgb(255, 0, 0));
        assert_eq!(red.name(), Some("red"));
        assert!(SassColor::from_name("notacolor").is_none());
    }

    #[test]
    fn equality_ignores_original_format() {
        let named = SassColor::from_name("red").unwrap();
        let hex = SassColor::rgb(255, 0, 0);
        assert_eq!(named, hex);
    }

    #[test]
    fn hsl_round_trip() {
        let c = SassColor::rgb(255, 0, 0);
        assert_eq!(c.hue(), 0.0);
        assert_eq!(c.saturation(), 100.0);
        assert_eq!(c.lightness(), 50.0);

        let back = SassColor::from_hsl(0.0, 100.0, 50.0, 1.0);
        assert_eq!(back, c);
    }

    #[test]
    fn serializes_original_then_hex_then_rgba() {
        assert_eq!(SassColor::from_name("red").unwrap().to_string(), "red");
        assert_eq!(SassColor::rgb(255, 0, 0).to_string(), "#ff0000");
        assert_eq!(
            SassColor::rgba(255, 0, 0, 0.5).to_string(),
            "rgba(255, 0, 0, 0.5)"
        );
    }
}
