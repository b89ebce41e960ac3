use std::time::{Duration, Instant};

use crate::api::Endpoint;
use crate::catalog::{DemographicRecord, DemographicSet, Indicator, Level, ValueKind, Zone, ZoneCatalog};
use crate::filters::format_value;
use crate::state::SelectionState;

/// How long a success notice stays on screen
pub const SUCCESS_TTL: Duration = Duration::from_millis(3000);

const GENERAL: &[Indicator] = &[
    Indicator::TotalPopulation,
    Indicator::MalePercentage,
    Indicator::FemalePercentage,
    Indicator::UrbanPercentage,
    Indicator::RuralPercentage,
    Indicator::Population10Plus,
    Indicator::Population15Plus,
];

const MARITAL: &[Indicator] = &[
    Indicator::SingleRate,
    Indicator::MarriedRate,
    Indicator::DivorcedRate,
    Indicator::WidowedRate,
];

const EDUCATION: &[Indicator] = &[
    Indicator::SchoolEnrollmentRate,
    Indicator::IlliteracyRate10Plus,
    Indicator::IlliteracyRate15Plus,
];

#[derive(Clone, Debug, PartialEq)]
pub struct DetailRow {
    pub label: &'static str,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DetailSection {
    pub title: &'static str,
    pub rows: Vec<DetailRow>,
}

/// Demographic record of the selected zone laid out for display
#[derive(Clone, Debug, PartialEq)]
pub struct DetailPanel {
    pub title: String,
    pub subtitle: String,
    pub sections: Vec<DetailSection>,
}

fn indicator_section(title: &'static str, indicators: &[Indicator], record: &DemographicRecord) -> DetailSection {
    DetailSection {
        title,
        rows: indicators
            .iter()
            .map(|&ind| DetailRow {
                label: ind.label(),
                value: format_value(record.get(ind), ind.kind()),
            })
            .collect(),
    }
}

impl DetailPanel {
    pub fn build(zone: &Zone, record: &DemographicRecord, year: i32) -> Self {
        // The breakdown table is always shown, with N/A when the record has none
        let breakdown = record.education.clone().unwrap_or_default();
        let sections = vec![
            indicator_section("Indicateurs généraux", GENERAL, record),
            indicator_section("État matrimonial", MARITAL, record),
            indicator_section("Éducation", EDUCATION, record),
            DetailSection {
                title: "Niveau d'instruction",
                rows: breakdown
                    .rows()
                    .into_iter()
                    .map(|(label, value)| DetailRow {
                        label,
                        value: format_value(value.filter(|v| v.is_finite()), ValueKind::Percentage),
                    })
                    .collect(),
            },
        ];
        Self {
            title: zone.name.clone(),
            subtitle: format!("{} · RGPH {}", zone.level.label(), year),
            sections,
        }
    }

    /// Panel for the current selection, if its zone has a record for the loaded year
    pub fn for_selection(
        selection: &SelectionState,
        catalog: &ZoneCatalog,
        demographics: Option<&DemographicSet>,
    ) -> Option<Self> {
        let (level, zone_id) = selection.selection()?;
        let set = demographics?;
        let zone = catalog.get(level, zone_id)?;
        let record = set.get(level, zone_id)?;
        Some(Self::build(zone, record, set.year()))
    }
}

/// What a spreadsheet export covers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportScope {
    All,
    Zone { level: Level, zone_id: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExportTarget {
    pub scope: ExportScope,
    pub year: i32,
}

impl ExportTarget {
    pub fn all(year: i32) -> Self {
        Self {
            scope: ExportScope::All,
            year,
        }
    }

    pub fn zone(level: Level, zone_id: u32, year: i32) -> Self {
        Self {
            scope: ExportScope::Zone { level, zone_id },
            year,
        }
    }

    pub fn file_name(&self) -> String {
        match self.scope {
            ExportScope::All => format!("donnees_mauritanie_{}.xlsx", self.year),
            ExportScope::Zone { level, zone_id } => {
                format!("{}_data_{}_{}.xlsx", level.as_str(), zone_id, self.year)
            }
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        match self.scope {
            ExportScope::All => Endpoint::ExportAll { year: self.year },
            ExportScope::Zone { level, zone_id } => Endpoint::ExportZone {
                level,
                zone_id,
                year: self.year,
            },
        }
    }
}

/// Zone export target; None (export disabled) unless a zone is selected,
/// a year is loaded and the zone has a record for it
pub fn zone_export_target(selection: &SelectionState, demographics: Option<&DemographicSet>) -> Option<ExportTarget> {
    let (level, zone_id) = selection.selection()?;
    let set = demographics?;
    set.get(level, zone_id)?;
    Some(ExportTarget::zone(level, zone_id, set.year()))
}

#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
    /// Transient, dismissed automatically
    Success { message: String, shown_at: Instant },
    /// Blocking until the user dismisses it
    Error { message: String },
}

/// The single notification slot shown above the map
#[derive(Debug, Default)]
pub struct Notifications {
    current: Option<Notice>,
}

impl Notifications {
    pub fn current(&self) -> Option<&Notice> {
        self.current.as_ref()
    }

    pub fn is_blocking(&self) -> bool {
        matches!(self.current, Some(Notice::Error { .. }))
    }

    /// A pending error is never hidden by a success
    pub fn success(&mut self, message: impl Into<String>, now: Instant) {
        if !self.is_blocking() {
            self.current = Some(Notice::Success {
                message: message.into(),
                shown_at: now,
            });
        }
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.current = Some(Notice::Error { message: message.into() });
    }

    /// Expire a success notice once it has been shown long enough
    pub fn tick(&mut self, now: Instant) {
        if let Some(Notice::Success { shown_at, .. }) = &self.current {
            if now.duration_since(*shown_at) >= SUCCESS_TTL {
                self.current = None;
            }
        }
    }

    /// Returns true when something was dismissed
    pub fn dismiss(&mut self) -> bool {
        self.current.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::{rect_zone, sample_catalog};
    use crate::catalog::EducationBreakdown;

    fn record() -> DemographicRecord {
        DemographicRecord {
            region: Some(1),
            total_population: Some(430_668.0),
            male_percentage: Some(48.7),
            single_rate: Some(41.04),
            ..Default::default()
        }
    }

    #[test]
    fn test_panel_sections() {
        let zone = rect_zone(Level::Region, 1, "Hodh Ech Chargui", (0.0, 0.0), (1.0, 1.0));
        let panel = DetailPanel::build(&zone, &record(), 2023);
        assert_eq!(panel.title, "Hodh Ech Chargui");
        assert_eq!(panel.subtitle, "Région · RGPH 2023");
        let titles: Vec<_> = panel.sections.iter().map(|s| s.title).collect();
        assert_eq!(
            titles,
            vec!["Indicateurs généraux", "État matrimonial", "Éducation", "Niveau d'instruction"]
        );
        assert_eq!(panel.sections[0].rows[0].value, "430 668");
        assert_eq!(panel.sections[0].rows[1].value, "48.7%");
        assert_eq!(panel.sections[0].rows[2].value, "N/A");
        assert_eq!(panel.sections[1].rows[0].value, "41.0%");
    }

    #[test]
    fn test_education_breakdown_always_present() {
        let zone = rect_zone(Level::Commune, 5, "Aïoun", (0.0, 0.0), (1.0, 1.0));
        let panel = DetailPanel::build(&zone, &DemographicRecord::default(), 2013);
        let breakdown = &panel.sections[3];
        assert_eq!(breakdown.rows.len(), 6);
        assert!(breakdown.rows.iter().all(|r| r.value == "N/A"));

        let with_breakdown = DemographicRecord {
            education: Some(EducationBreakdown {
                primary: Some(31.5),
                ..Default::default()
            }),
            ..Default::default()
        };
        let panel = DetailPanel::build(&zone, &with_breakdown, 2013);
        assert_eq!(panel.sections[3].rows[2], DetailRow { label: "Primaire", value: "31.5%".into() });
    }

    #[test]
    fn test_panel_requires_record() {
        let catalog = sample_catalog();
        let set = DemographicSet::new(2023, vec![record()]);
        let mut selection = SelectionState::new();
        assert!(DetailPanel::for_selection(&selection, &catalog, Some(&set)).is_none());
        selection.click_zone(Level::Region, 2);
        assert!(DetailPanel::for_selection(&selection, &catalog, Some(&set)).is_none());
        selection.click_zone(Level::Region, 1);
        assert!(DetailPanel::for_selection(&selection, &catalog, None).is_none());
        let panel = DetailPanel::for_selection(&selection, &catalog, Some(&set)).unwrap();
        assert_eq!(panel.title, "Hodh Ech Chargui");
    }

    #[test]
    fn test_export_disabled_without_record() {
        let set = DemographicSet::new(2023, vec![record()]);
        let mut selection = SelectionState::new();
        assert!(zone_export_target(&selection, Some(&set)).is_none());
        selection.click_zone(Level::Commune, 1);
        assert!(zone_export_target(&selection, Some(&set)).is_none());
        selection.click_zone(Level::Region, 1);
        assert!(zone_export_target(&selection, None).is_none());
        let target = zone_export_target(&selection, Some(&set)).unwrap();
        assert_eq!(target, ExportTarget::zone(Level::Region, 1, 2023));
    }

    #[test]
    fn test_export_file_names_and_endpoints() {
        assert_eq!(ExportTarget::all(2023).file_name(), "donnees_mauritanie_2023.xlsx");
        assert_eq!(ExportTarget::all(2023).endpoint(), Endpoint::ExportAll { year: 2023 });
        let zone = ExportTarget::zone(Level::Commune, 42, 2013);
        assert_eq!(zone.file_name(), "commune_data_42_2013.xlsx");
        assert_eq!(zone.endpoint().path(), "/api/export-zone-data/42/commune/?year=2013");
    }

    #[test]
    fn test_success_notice_expires() {
        let start = Instant::now();
        let mut notes = Notifications::default();
        notes.success("ok", start);
        notes.tick(start + Duration::from_millis(2999));
        assert!(notes.current().is_some());
        assert!(!notes.is_blocking());
        notes.tick(start + Duration::from_millis(3000));
        assert!(notes.current().is_none());
    }

    #[test]
    fn test_error_notice_blocks_until_dismissed() {
        let start = Instant::now();
        let mut notes = Notifications::default();
        notes.error("export failed");
        notes.success("ok", start);
        notes.tick(start + Duration::from_secs(60));
        assert!(notes.is_blocking());
        assert!(notes.dismiss());
        assert!(!notes.dismiss());
    }
}
