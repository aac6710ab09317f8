use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Mix, Srgb};

use crate::data::model::ContactClass;
use crate::data::structure::PairOrigin;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

fn to_color32(rgb: Srgb) -> Color32 {
    Color32::from_rgb(
        (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

/// Generates `n` visually distinct colours using evenly spaced hues. One per
/// sample when several profiles share a skyline.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            to_color32(Hsl::new(hue, 0.75, 0.55).into_color())
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Per-nucleotide colours
// ---------------------------------------------------------------------------

/// Standard SHAPE colouring: grey for no data, black below 0.4, orange
/// below 0.85, red above.
pub fn reactivity_color(reactivity: Option<f64>) -> Color32 {
    match reactivity {
        None => Color32::from_gray(160),
        Some(r) if r.is_nan() => Color32::from_gray(160),
        Some(r) if r < 0.4 => Color32::BLACK,
        Some(r) if r < 0.85 => Color32::from_rgb(0xf4, 0x9b, 0x1f),
        Some(_) => Color32::from_rgb(0xd6, 0x27, 0x28),
    }
}

pub fn nucleotide_color(nucleotide: char) -> Color32 {
    match nucleotide.to_ascii_uppercase() {
        'A' => Color32::from_rgb(0xf8, 0x97, 0x31),
        'U' | 'T' => Color32::from_rgb(0xa5, 0x2a, 0x2a),
        'G' => Color32::from_rgb(0x60, 0x60, 0x60),
        'C' => Color32::from_rgb(0x5f, 0x9e, 0xa0),
        _ => Color32::GRAY,
    }
}

// ---------------------------------------------------------------------------
// Link colours
// ---------------------------------------------------------------------------

pub fn origin_color(origin: Option<PairOrigin>) -> Color32 {
    match origin {
        None => Color32::from_gray(90),
        Some(PairOrigin::Shared) => Color32::from_rgb(0x2c, 0xa0, 0x2c),
        Some(PairOrigin::OnlyThis) => Color32::from_rgb(0x1f, 0x77, 0xb4),
        Some(PairOrigin::OnlyOther) => Color32::from_rgb(0xd6, 0x27, 0x28),
    }
}

pub fn class_color(class: ContactClass) -> Color32 {
    match class {
        ContactClass::BasePair => Color32::from_rgb(0x2c, 0xa0, 0x2c),
        ContactClass::Paired => Color32::from_rgb(0x1f, 0x77, 0xb4),
        ContactClass::Mixed => Color32::from_rgb(0x94, 0x67, 0xbd),
        ContactClass::Unpaired => Color32::from_rgb(0xff, 0x7f, 0x0e),
    }
}

/// Maps a statistic range onto a light-to-dark gradient between two hues.
#[derive(Debug, Clone, Copy)]
pub struct StatisticGradient {
    pub min: f64,
    pub max: f64,
    low: Hsl,
    high: Hsl,
}

impl StatisticGradient {
    pub fn new(min: f64, max: f64) -> Self {
        StatisticGradient {
            min,
            max,
            low: Hsl::new(50.0, 0.9, 0.85),
            high: Hsl::new(0.0, 0.85, 0.35),
        }
    }

    /// Gradient spanning every finite value, or `[0, 1]` when there is none.
    pub fn spanning(values: impl IntoIterator<Item = f64>) -> Self {
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if min > max {
            StatisticGradient::new(0.0, 1.0)
        } else {
            StatisticGradient::new(min, max)
        }
    }

    /// Same range with the ends swapped, so small values get the dark hue.
    pub fn reversed(self) -> Self {
        StatisticGradient {
            low: self.high,
            high: self.low,
            ..self
        }
    }

    pub fn color_for(&self, value: f64) -> Color32 {
        let t = if self.max > self.min {
            ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
        } else {
            1.0
        };
        to_color32(self.low.mix(self.high, t as f32).into_color())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reactivity_classes() {
        assert_eq!(reactivity_color(None), Color32::from_gray(160));
        assert_eq!(reactivity_color(Some(f64::NAN)), Color32::from_gray(160));
        assert_eq!(reactivity_color(Some(0.1)), Color32::BLACK);
        assert_eq!(reactivity_color(Some(0.5)), Color32::from_rgb(0xf4, 0x9b, 0x1f));
        assert_eq!(reactivity_color(Some(2.0)), Color32::from_rgb(0xd6, 0x27, 0x28));
    }

    #[test]
    fn test_palette_is_distinct() {
        let palette = generate_palette(4);
        assert_eq!(palette.len(), 4);
        assert_ne!(palette[0], palette[1]);
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn test_gradient_endpoints() {
        let gradient = StatisticGradient::spanning([10.0, f64::NAN, 50.0]);
        assert_eq!(gradient.min, 10.0);
        assert_eq!(gradient.max, 50.0);
        assert_eq!(gradient.color_for(0.0), gradient.color_for(10.0));
        assert_eq!(gradient.color_for(99.0), gradient.color_for(50.0));
        assert_ne!(gradient.color_for(10.0), gradient.color_for(50.0));
        assert_eq!(StatisticGradient::spanning([]).max, 1.0);
    }

    #[test]
    fn test_reversed_gradient_swaps_ends() {
        let gradient = StatisticGradient::new(5.0, 30.0);
        let reversed = gradient.reversed();
        assert_eq!(reversed.color_for(5.0), gradient.color_for(30.0));
        assert_eq!(reversed.color_for(30.0), gradient.color_for(5.0));
    }

    #[test]
    fn test_class_colors_are_distinct() {
        let classes = [
            ContactClass::BasePair,
            ContactClass::Paired,
            ContactClass::Mixed,
            ContactClass::Unpaired,
        ];
        for (k, a) in classes.iter().enumerate() {
            for b in &classes[k + 1..] {
                assert_ne!(class_color(*a), class_color(*b));
            }
        }
    }
}
