use crate::catalog::{DemographicRecord, Indicator, ValueKind};
use crate::style::{hex, Rgb};

/// A selectable map indicator with its color ramp.
/// `thresholds[i]` is the inclusive upper bound of bucket `i`.
#[derive(Debug, PartialEq)]
pub struct FilterOption {
    pub id: &'static str,
    pub label: &'static str,
    pub indicator: Indicator,
    pub kind: ValueKind,
    pub ramp: &'static [Rgb],
    pub thresholds: &'static [f64],
}

impl FilterOption {
    /// Smallest `i` with `value <= thresholds[i]`, else the last bucket
    pub fn bucket_index(&self, value: f64) -> usize {
        self.thresholds
            .iter()
            .position(|&t| value <= t)
            .unwrap_or(self.ramp.len().saturating_sub(1))
    }

    pub fn color_for(&self, value: f64) -> Rgb {
        let idx = self.bucket_index(value);
        self.ramp
            .get(idx)
            .or(self.ramp.last())
            .copied()
            .unwrap_or(crate::style::DEFAULT_FILL)
    }

    pub fn value_of(&self, record: &DemographicRecord) -> Option<f64> {
        record.get(self.indicator)
    }

    pub fn format(&self, value: f64) -> String {
        format_value(Some(value), self.kind)
    }
}

/// A titled group of indicators
pub struct FilterCategory {
    pub id: &'static str,
    pub title: &'static str,
    pub options: &'static [FilterOption],
}

/// Display an indicator value: percentages with one decimal, counts grouped by thousands
pub fn format_value(value: Option<f64>, kind: ValueKind) -> String {
    match (value, kind) {
        (None, _) => "N/A".to_string(),
        (Some(v), ValueKind::Percentage) => format!("{v:.1}%"),
        (Some(v), ValueKind::Count) => group_thousands(v.round() as i64),
    }
}

fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(ch);
    }
    out
}

pub static CATEGORIES: &[FilterCategory] = &[
    FilterCategory {
        id: "population",
        title: "Population",
        options: &[
            FilterOption {
                id: "total-population",
                label: "Population totale",
                indicator: Indicator::TotalPopulation,
                kind: ValueKind::Count,
                ramp: &[hex(0xFED976), hex(0xFD8D3C), hex(0xFC4E2A), hex(0xE31A1C), hex(0xBD0026), hex(0x800026)],
                thresholds: &[20000.0, 50000.0, 100000.0, 200000.0, 500000.0, 1000000.0],
            },
            FilterOption {
                id: "population-10-plus",
                label: "Population 10 ans +",
                indicator: Indicator::Population10Plus,
                kind: ValueKind::Count,
                ramp: &[hex(0xE5F5E0), hex(0xA1D99B), hex(0x41AB5D), hex(0x238B45), hex(0x006D2C), hex(0x00441B)],
                thresholds: &[10000.0, 25000.0, 50000.0, 100000.0, 250000.0, 500000.0],
            },
        ],
    },
    FilterCategory {
        id: "gender-distribution",
        title: "Répartition par sexe",
        options: &[
            FilterOption {
                id: "male-percentage",
                label: "% Hommes",
                indicator: Indicator::MalePercentage,
                kind: ValueKind::Percentage,
                ramp: &[hex(0xF7FBFF), hex(0xC6DBEF), hex(0x6BAED6), hex(0x3182BD), hex(0x08519C), hex(0x08306B)],
                thresholds: &[40.0, 45.0, 48.0, 52.0, 55.0, 60.0],
            },
            FilterOption {
                id: "female-percentage",
                label: "% Femmes",
                indicator: Indicator::FemalePercentage,
                kind: ValueKind::Percentage,
                ramp: &[hex(0xFFF5F0), hex(0xFCAE91), hex(0xFB6A4A), hex(0xDE2D26), hex(0xA50F15), hex(0x67000D)],
                thresholds: &[40.0, 45.0, 48.0, 52.0, 55.0, 60.0],
            },
        ],
    },
    FilterCategory {
        id: "marital-status",
        title: "État matrimonial",
        options: &[
            FilterOption {
                id: "single-rate",
                label: "% Célibataires",
                indicator: Indicator::SingleRate,
                kind: ValueKind::Percentage,
                ramp: &[hex(0xF7FCF5), hex(0xBAE4B3), hex(0x74C476), hex(0x31A354), hex(0x006D2C), hex(0x00441B)],
                thresholds: &[20.0, 30.0, 40.0, 50.0, 60.0, 70.0],
            },
            FilterOption {
                id: "married-rate",
                label: "% Mariés",
                indicator: Indicator::MarriedRate,
                kind: ValueKind::Percentage,
                ramp: &[hex(0xF7F4F9), hex(0xD4B9DA), hex(0x998EC3), hex(0x8073AC), hex(0x6A51A3), hex(0x4A1486)],
                thresholds: &[20.0, 30.0, 40.0, 50.0, 60.0, 70.0],
            },
            FilterOption {
                id: "divorced-rate",
                label: "% Divorcés",
                indicator: Indicator::DivorcedRate,
                kind: ValueKind::Percentage,
                ramp: &[hex(0xFEEDDE), hex(0xFDBE85), hex(0xFD8D3C), hex(0xE6550D), hex(0xA63603), hex(0x7F2704)],
                thresholds: &[1.0, 2.0, 3.0, 5.0, 7.0, 10.0],
            },
            FilterOption {
                id: "widowed-rate",
                label: "% Veufs",
                indicator: Indicator::WidowedRate,
                kind: ValueKind::Percentage,
                ramp: &[hex(0xF1EEF6), hex(0xBDC9E1), hex(0x74A9CF), hex(0x2B8CBE), hex(0x045A8D), hex(0x023858)],
                thresholds: &[1.0, 2.0, 3.0, 5.0, 7.0, 10.0],
            },
        ],
    },
    FilterCategory {
        id: "education",
        title: "Éducation",
        options: &[
            FilterOption {
                id: "school-enrollment",
                label: "Taux de scolarisation",
                indicator: Indicator::SchoolEnrollmentRate,
                kind: ValueKind::Percentage,
                ramp: &[hex(0xF0F9E8), hex(0xBAE4BC), hex(0x7BCCC4), hex(0x43A2CA), hex(0x0868AC), hex(0x084081)],
                thresholds: &[20.0, 40.0, 60.0, 70.0, 80.0, 90.0],
            },
            FilterOption {
                id: "illiteracy-10-plus",
                label: "Taux d'analphabétisme (10 ans +)",
                indicator: Indicator::IlliteracyRate10Plus,
                kind: ValueKind::Percentage,
                ramp: &[hex(0xFEEBE2), hex(0xFBB4B9), hex(0xF768A1), hex(0xC51B8A), hex(0x7A0177), hex(0x49006A)],
                thresholds: &[10.0, 20.0, 30.0, 40.0, 50.0, 60.0],
            },
            FilterOption {
                id: "illiteracy-15-plus",
                label: "Taux d'analphabétisme (15 ans +)",
                indicator: Indicator::IlliteracyRate15Plus,
                kind: ValueKind::Percentage,
                ramp: &[hex(0xFEE6CE), hex(0xFDAE6B), hex(0xFD8D3C), hex(0xE6550D), hex(0xA63603), hex(0x7F2704)],
                thresholds: &[10.0, 20.0, 30.0, 40.0, 50.0, 60.0],
            },
        ],
    },
];

/// Flat, ordered view over the built-in categories
pub struct FilterRegistry {
    categories: &'static [FilterCategory],
}

impl FilterRegistry {
    pub fn builtin() -> Self {
        Self { categories: CATEGORIES }
    }

    pub fn categories(&self) -> &'static [FilterCategory] {
        self.categories
    }

    pub fn options(&self) -> impl Iterator<Item = &'static FilterOption> {
        self.categories.iter().flat_map(|c| c.options.iter())
    }

    /// Category an option belongs to
    pub fn category_of(&self, option: &FilterOption) -> Option<&'static FilterCategory> {
        self.categories()
            .iter()
            .find(|c| c.options.iter().any(|o| o.id == option.id))
    }

    pub fn find(&self, id: &str) -> Option<&'static FilterOption> {
        self.options().find(|o| o.id == id)
    }

    /// Option after `current` in registry order, wrapping; the first when none is active
    pub fn next(&self, current: Option<&FilterOption>) -> Option<&'static FilterOption> {
        let options: Vec<_> = self.options().collect();
        let pos = current.and_then(|c| options.iter().position(|o| o.id == c.id));
        match pos {
            Some(i) => options.get((i + 1) % options.len()).copied(),
            None => options.first().copied(),
        }
    }

    /// Option before `current`, wrapping; the last when none is active
    pub fn previous(&self, current: Option<&FilterOption>) -> Option<&'static FilterOption> {
        let options: Vec<_> = self.options().collect();
        let pos = current.and_then(|c| options.iter().position(|o| o.id == c.id));
        match pos {
            Some(0) | None => options.last().copied(),
            Some(i) => options.get(i - 1).copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_tables_are_well_formed() {
        let registry = FilterRegistry::builtin();
        assert_eq!(registry.options().count(), 11);
        for option in registry.options() {
            assert_eq!(option.ramp.len(), option.thresholds.len(), "{}", option.id);
            assert!(
                option.thresholds.windows(2).all(|w| w[0] < w[1]),
                "{} thresholds not strictly ascending",
                option.id
            );
            assert_eq!(option.kind, option.indicator.kind(), "{}", option.id);
        }
    }

    #[test]
    fn test_bucket_index_boundaries() {
        let option = FilterRegistry::builtin().find("total-population").unwrap();
        assert_eq!(option.bucket_index(0.0), 0);
        assert_eq!(option.bucket_index(20000.0), 0);
        assert_eq!(option.bucket_index(20000.5), 1);
        assert_eq!(option.bucket_index(1000000.0), 5);
        // Beyond every threshold falls into the last ramp color
        assert_eq!(option.bucket_index(5_000_000.0), 5);
        assert_eq!(option.color_for(5_000_000.0), hex(0x800026));
        assert_eq!(option.color_for(30000.0), hex(0xFD8D3C));
    }

    #[test]
    fn test_bucket_index_is_monotonic() {
        for option in FilterRegistry::builtin().options() {
            let top = option.thresholds.last().copied().unwrap_or(0.0) * 1.5;
            let mut prev = 0;
            let mut v = -1.0;
            while v <= top {
                let idx = option.bucket_index(v);
                assert!(idx >= prev, "{} not monotonic at {}", option.id, v);
                assert!(idx < option.ramp.len());
                prev = idx;
                v += top / 997.0;
            }
        }
    }

    #[test]
    fn test_cycling_wraps() {
        let registry = FilterRegistry::builtin();
        let first = registry.next(None).unwrap();
        assert_eq!(first.id, "total-population");
        assert_eq!(registry.category_of(first).map(|c| c.id), Some("population"));
        let last = registry.previous(None).unwrap();
        assert_eq!(last.id, "illiteracy-15-plus");
        assert_eq!(registry.next(Some(last)).unwrap().id, "total-population");
        assert_eq!(registry.previous(Some(first)).unwrap().id, "illiteracy-15-plus");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(Some(1234567.0), ValueKind::Count), "1 234 567");
        assert_eq!(format_value(Some(999.0), ValueKind::Count), "999");
        assert_eq!(format_value(Some(48.26), ValueKind::Percentage), "48.3%");
        assert_eq!(format_value(None, ValueKind::Percentage), "N/A");
    }
}
