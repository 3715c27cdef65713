use super::FieldManager;
use itertools::Itertools;
use std::fmt;
use tracing::debug;

const SATURATION: f64 = 0.6;
const VALUE: f64 = 0.9;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// `hue` in degrees, `saturation` and `value` in `[0, 1]`.
    pub fn from_hsv(hue: f64, saturation: f64, value: f64) -> Self {
        let hue = hue.rem_euclid(360.0);
        let c = value * saturation;
        let x = c * (1.0 - ((hue / 60.0) % 2.0 - 1.0).abs());
        let m = value - c;
        let (r, g, b) = match hue {
            h if h < 60.0 => (c, x, 0.0),
            h if h < 120.0 => (x, c, 0.0),
            h if h < 180.0 => (0.0, c, x),
            h if h < 240.0 => (0.0, x, c),
            h if h < 300.0 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Rgb {
            r: channel(r),
            g: channel(g),
            b: channel(b),
        }
    }

    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// `text` wrapped in ANSI truecolor escapes.
    pub fn paint(&self, text: &str) -> String {
        format!("\x1b[38;2;{};{};{}m{}\x1b[0m", self.r, self.g, self.b, text)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hex())
    }
}

/// Drops groups seen fewer than `min_occurrence` times and, with
/// `only_varying`, groups whose examples never change. Survivors keep at
/// most `min_occurrence` examples.
pub fn filter(fields: FieldManager, min_occurrence: usize, only_varying: bool) -> FieldManager {
    let total = fields.len();
    let filtered: FieldManager = fields
        .into_iter()
        .filter(|f| f.count >= min_occurrence)
        .filter(|f| {
            !only_varying || f.examples.len() < 2 || !f.example_values().all_equal()
        })
        .map(|mut f| {
            f.examples.truncate(min_occurrence);
            f
        })
        .collect();

    debug!("Kept {} of {} groups", filtered.len(), total);
    filtered
}

/// Colors groups so that structurally close ones get close hues.
pub fn colorize(fields: &mut FieldManager) {
    let mut distance = 0.0;
    for i in 0..fields.len() {
        if i > 0 {
            distance += fields[i - 1].path.distance(&fields[i].path) as f64;
        }
        fields[i].distance = distance;
    }

    let max = fields.iter().map(|f| f.distance).fold(0.0, f64::max);
    for field in fields.iter_mut() {
        let normalized = if max > 0.0 {
            field.distance / (1.2 * max)
        } else {
            0.0
        };
        field.color = Rgb::from_hsv(normalized * 360.0, SATURATION, VALUE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autoconfig::{Example, FieldCandidate, Node, Path};
    use pretty_assertions::assert_eq;

    fn group(tag: &str, values: &[&str]) -> FieldCandidate {
        FieldCandidate {
            path: Path(vec![Node::new("body"), Node::new(tag)]),
            count: values.len(),
            examples: values
                .iter()
                .enumerate()
                .map(|(index, v)| Example {
                    value: v.to_string(),
                    index,
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_filter_min_occurrence_and_truncate() {
        let fm = FieldManager::from(vec![
            group("a", &["1", "2", "3"]),
            group("b", &["1"]),
            group("c", &["x", "x"]),
        ]);

        let filtered = filter(fm, 2, false);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].examples.len(), 2);
        assert_eq!(filtered[0].count, 3);
        assert!(filtered.iter().all(|f| f.examples.len() <= f.count));
    }

    #[test]
    fn test_filter_only_varying() {
        let fm = FieldManager::from(vec![
            group("a", &["1", "2"]),
            group("c", &["Read more", "Read more", "Read more"]),
        ]);

        let filtered = filter(fm, 2, true);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].path.to_string(), "body > a");
    }

    #[test]
    fn test_colorize_distances() {
        let mut fm = FieldManager::from(vec![
            group("a", &["1"]),
            group("b", &["1"]),
            group("abc", &["1"]),
        ]);
        colorize(&mut fm);

        let distances: Vec<f64> = fm.iter().map(|f| f.distance).collect();
        assert_eq!(distances, vec![0.0, 1.0, 3.0]);
        assert_eq!(fm[0].color, Rgb::from_hsv(0.0, SATURATION, VALUE));
        assert_ne!(fm[0].color, fm[2].color);
    }

    #[test]
    fn test_colorize_identical_paths() {
        let mut fm = FieldManager::from(vec![group("a", &["1"]), group("a", &["2"])]);
        colorize(&mut fm);
        assert_eq!(fm[0].color, fm[1].color);
    }

    #[test]
    fn test_rgb_from_hsv() {
        assert_eq!(Rgb::from_hsv(0.0, 1.0, 1.0), Rgb { r: 255, g: 0, b: 0 });
        assert_eq!(Rgb::from_hsv(120.0, 1.0, 1.0), Rgb { r: 0, g: 255, b: 0 });
        assert_eq!(Rgb::from_hsv(240.0, 1.0, 1.0).hex(), "#0000ff");
        assert_eq!(Rgb::from_hsv(0.0, 0.0, 1.0).hex(), "#ffffff");
    }
}
