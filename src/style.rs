use crate::catalog::{DemographicSet, Level};
use crate::filters::FilterOption;
use crate::state::SelectionState;

/// 24-bit color
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Color from a 0xRRGGBB literal
pub const fn hex(v: u32) -> Rgb {
    Rgb((v >> 16) as u8, (v >> 8) as u8, v as u8)
}

impl Rgb {
    #[cfg(test)]
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }

    /// `self` painted over `background` at the given opacity
    pub fn over(self, background: Rgb, opacity: f64) -> Rgb {
        let a = opacity.clamp(0.0, 1.0);
        let mix = |fg: u8, bg: u8| (fg as f64 * a + bg as f64 * (1.0 - a)).round() as u8;
        Rgb(mix(self.0, background.0), mix(self.1, background.1), mix(self.2, background.2))
    }

    /// Relative luminance in [0, 1], for picking readable label text
    pub fn luminance(self) -> f64 {
        (0.2126 * self.0 as f64 + 0.7152 * self.1 as f64 + 0.0722 * self.2 as f64) / 255.0
    }
}

impl From<Rgb> for ratatui::style::Color {
    fn from(c: Rgb) -> Self {
        ratatui::style::Color::Rgb(c.0, c.1, c.2)
    }
}

pub const SELECTED_STROKE: Rgb = hex(0xFF4500);
pub const DEFAULT_STROKE: Rgb = hex(0x555555);
pub const SELECTED_FILL: Rgb = hex(0xFFD700);
pub const DEFAULT_FILL: Rgb = hex(0x3388FF);
pub const NO_DATA_FILL: Rgb = hex(0xBDBDBD);

pub const BASE_OPACITY: f64 = 0.2;
pub const FILTER_OPACITY: f64 = 0.7;

/// How a zone without a value for the active indicator is shaded
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MissingValuePolicy {
    /// Dedicated gray "no data" fill
    #[default]
    NoData,
    /// Treat the value as 0, landing in the lowest bucket
    AsZero,
}

/// Visual style of one zone polygon
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoneStyle {
    pub stroke_color: Rgb,
    pub stroke_weight: u8,
    pub fill_color: Rgb,
    pub fill_opacity: f64,
}

/// Style of a zone given the loaded demographics, active filter and selection
pub fn resolve_style(
    zone_id: u32,
    level: Level,
    demographics: Option<&DemographicSet>,
    filter: Option<&FilterOption>,
    selection: &SelectionState,
    policy: MissingValuePolicy,
) -> ZoneStyle {
    let selected = selection.is_selected(level, zone_id);
    let (stroke_color, stroke_weight) = if selected {
        (SELECTED_STROKE, 3)
    } else {
        (DEFAULT_STROKE, 1)
    };

    let Some(filter) = filter else {
        return ZoneStyle {
            stroke_color,
            stroke_weight,
            fill_color: if selected { SELECTED_FILL } else { DEFAULT_FILL },
            fill_opacity: BASE_OPACITY,
        };
    };

    let value = demographics
        .and_then(|set| set.get(level, zone_id))
        .and_then(|record| filter.value_of(record));

    let fill_color = if selected {
        SELECTED_FILL
    } else {
        match (value, policy) {
            (Some(v), _) => filter.color_for(v),
            (None, MissingValuePolicy::AsZero) => filter.color_for(0.0),
            (None, MissingValuePolicy::NoData) => NO_DATA_FILL,
        }
    };

    ZoneStyle {
        stroke_color,
        stroke_weight,
        fill_color,
        fill_opacity: FILTER_OPACITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DemographicRecord;
    use crate::filters::FilterRegistry;

    fn demographics() -> DemographicSet {
        DemographicSet::new(
            2023,
            vec![
                DemographicRecord {
                    region: Some(1),
                    total_population: Some(350_000.0),
                    ..Default::default()
                },
                DemographicRecord {
                    region: Some(2),
                    total_population: Some(15_000.0),
                    ..Default::default()
                },
            ],
        )
    }

    #[test]
    fn test_no_filter_styles() {
        let mut selection = SelectionState::new();
        selection.click_zone(Level::Region, 1);

        let selected = resolve_style(1, Level::Region, None, None, &selection, MissingValuePolicy::NoData);
        assert_eq!(selected.stroke_color.to_hex(), "#FF4500");
        assert_eq!(selected.stroke_weight, 3);
        assert_eq!(selected.fill_color.to_hex(), "#FFD700");
        assert_eq!(selected.fill_opacity, 0.2);

        let other = resolve_style(2, Level::Region, None, None, &selection, MissingValuePolicy::NoData);
        assert_eq!(other.stroke_color.to_hex(), "#555555");
        assert_eq!(other.stroke_weight, 1);
        assert_eq!(other.fill_color.to_hex(), "#3388FF");
        assert_eq!(other.fill_opacity, 0.2);
    }

    #[test]
    fn test_filter_uses_ramp_color() {
        let set = demographics();
        let filter = FilterRegistry::builtin().find("total-population");
        let selection = SelectionState::new();
        let style = resolve_style(1, Level::Region, Some(&set), filter, &selection, MissingValuePolicy::NoData);
        assert_eq!(style.fill_color, hex(0xBD0026));
        assert_eq!(style.fill_opacity, 0.7);
        assert_eq!(style.stroke_weight, 1);
    }

    #[test]
    fn test_selected_fill_wins_over_every_bucket() {
        let set = demographics();
        let registry = FilterRegistry::builtin();
        let mut selection = SelectionState::new();
        selection.click_zone(Level::Region, 2);
        for filter in registry.options() {
            for policy in [MissingValuePolicy::NoData, MissingValuePolicy::AsZero] {
                let style = resolve_style(2, Level::Region, Some(&set), Some(filter), &selection, policy);
                assert_eq!(style.fill_color, SELECTED_FILL, "{}", filter.id);
                assert_eq!(style.stroke_color, SELECTED_STROKE);
            }
        }
    }

    #[test]
    fn test_selection_is_level_scoped() {
        let mut selection = SelectionState::new();
        selection.click_zone(Level::Commune, 1);
        // Region 1 shares the numeric id but is not selected
        let style = resolve_style(1, Level::Region, None, None, &selection, MissingValuePolicy::NoData);
        assert_eq!(style.fill_color, DEFAULT_FILL);
    }

    #[test]
    fn test_missing_value_as_zero_matches_lowest_bucket() {
        // A zone with no record cannot be told apart from a genuinely small one
        let set = demographics();
        let filter = FilterRegistry::builtin().find("total-population");
        let selection = SelectionState::new();
        let missing = resolve_style(99, Level::Region, Some(&set), filter, &selection, MissingValuePolicy::AsZero);
        let small = resolve_style(2, Level::Region, Some(&set), filter, &selection, MissingValuePolicy::AsZero);
        assert_eq!(missing.fill_color, small.fill_color);
        assert_eq!(missing.fill_color, hex(0xFED976));
    }

    #[test]
    fn test_missing_value_no_data_fill() {
        let set = demographics();
        let filter = FilterRegistry::builtin().find("male-percentage");
        let selection = SelectionState::new();
        let style = resolve_style(1, Level::Region, Some(&set), filter, &selection, MissingValuePolicy::NoData);
        assert_eq!(style.fill_color, NO_DATA_FILL);
        assert_eq!(style.fill_opacity, 0.7);
    }

    #[test]
    fn test_blend_over_background() {
        let black = Rgb(0, 0, 0);
        assert_eq!(hex(0xFFFFFF).over(black, 0.2), Rgb(51, 51, 51));
        assert_eq!(SELECTED_FILL.over(black, 1.0), SELECTED_FILL);
    }
}
