use crate::catalog::{DemographicRecord, DemographicSet, Indicator, Level, ValueKind, ZoneCatalog};
use crate::filters::format_value;

/// Which region rows the key figures aggregate
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RegionFilter {
    #[default]
    All,
    Region(u32),
}

impl RegionFilter {
    pub fn label(self, catalog: &ZoneCatalog) -> String {
        match self {
            RegionFilter::All => "Toutes les régions".to_string(),
            RegionFilter::Region(id) => region_name(catalog, id),
        }
    }

    /// "All" followed by every region, in catalog order, wrapping
    pub fn next(self, catalog: &ZoneCatalog) -> Self {
        let ids: Vec<u32> = catalog.zones(Level::Region).iter().map(|z| z.id).collect();
        match self {
            RegionFilter::All => ids.first().map_or(RegionFilter::All, |&id| RegionFilter::Region(id)),
            RegionFilter::Region(id) => match ids.iter().position(|&i| i == id) {
                Some(pos) if pos + 1 < ids.len() => RegionFilter::Region(ids[pos + 1]),
                _ => RegionFilter::All,
            },
        }
    }

    pub fn previous(self, catalog: &ZoneCatalog) -> Self {
        let ids: Vec<u32> = catalog.zones(Level::Region).iter().map(|z| z.id).collect();
        match self {
            RegionFilter::All => ids.last().map_or(RegionFilter::All, |&id| RegionFilter::Region(id)),
            RegionFilter::Region(id) => match ids.iter().position(|&i| i == id) {
                Some(pos) if pos > 0 => RegionFilter::Region(ids[pos - 1]),
                _ => RegionFilter::All,
            },
        }
    }
}

fn region_name(catalog: &ZoneCatalog, id: u32) -> String {
    catalog
        .get(Level::Region, id)
        .map(|z| z.name.clone())
        .unwrap_or_else(|| format!("Région {id}"))
}

/// One headline figure card
#[derive(Clone, Debug, PartialEq)]
pub struct KeyStat {
    pub title: &'static str,
    pub value: String,
    pub description: &'static str,
    /// Percentage shown as a gauge
    pub progress: Option<f64>,
}

fn rows(set: &DemographicSet, filter: RegionFilter) -> Vec<&DemographicRecord> {
    set.at_level(Level::Region)
        .filter(|(id, _)| match filter {
            RegionFilter::All => true,
            RegionFilter::Region(wanted) => *id == wanted,
        })
        .map(|(_, record)| record)
        .collect()
}

/// Mean over the selected region rows; a missing value counts as 0
pub fn mean(set: &DemographicSet, filter: RegionFilter, indicator: Indicator) -> f64 {
    let rows = rows(set, filter);
    if rows.is_empty() {
        return 0.0;
    }
    rows.iter().map(|r| r.get(indicator).unwrap_or(0.0)).sum::<f64>() / rows.len() as f64
}

/// Population of all regions, or of the one selected region
pub fn population(set: &DemographicSet, filter: RegionFilter) -> f64 {
    rows(set, filter)
        .iter()
        .map(|r| r.get(Indicator::TotalPopulation).unwrap_or(0.0))
        .sum()
}

pub fn key_stats(set: &DemographicSet, filter: RegionFilter) -> Vec<KeyStat> {
    let male = mean(set, filter, Indicator::MalePercentage);
    let female = mean(set, filter, Indicator::FemalePercentage);
    let enrollment = mean(set, filter, Indicator::SchoolEnrollmentRate);
    let illiteracy = mean(set, filter, Indicator::IlliteracyRate15Plus);
    vec![
        KeyStat {
            title: "Population totale",
            value: format_value(Some(population(set, filter)), ValueKind::Count),
            description: "Population totale de la zone sélectionnée",
            progress: None,
        },
        KeyStat {
            title: "Ratio hommes/femmes",
            value: format!("{male:.1}% hommes / {female:.1}% femmes"),
            description: "Répartition par sexe de la population",
            progress: None,
        },
        KeyStat {
            title: "Taux de scolarisation",
            value: format!("{enrollment:.1}%"),
            description: "Taux de scolarisation des enfants en âge d'être scolarisés",
            progress: Some(enrollment),
        },
        KeyStat {
            title: "Taux d'analphabétisme",
            value: format!("{illiteracy:.1}%"),
            description: "Taux d'analphabétisme chez les personnes de 15 ans et plus",
            progress: Some(illiteracy),
        },
    ]
}

/// Population per region for the bar chart, ordered by region id
pub fn region_chart(set: &DemographicSet, catalog: &ZoneCatalog) -> Vec<(String, u64)> {
    let mut bars: Vec<(u32, u64)> = set
        .at_level(Level::Region)
        .map(|(id, record)| {
            let pop = record.get(Indicator::TotalPopulation).unwrap_or(0.0).max(0.0).round() as u64;
            (id, pop)
        })
        .collect();
    bars.sort_unstable_by_key(|&(id, _)| id);
    bars.into_iter()
        .map(|(id, pop)| (region_name(catalog, id), pop))
        .collect()
}

/// State of the key statistics page
#[derive(Debug, Default)]
pub struct StatsPage {
    pub region: RegionFilter,
}

impl StatsPage {
    pub fn next_region(&mut self, catalog: &ZoneCatalog) {
        self.region = self.region.next(catalog);
    }

    pub fn previous_region(&mut self, catalog: &ZoneCatalog) {
        self.region = self.region.previous(catalog);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::sample_catalog;

    fn set() -> DemographicSet {
        DemographicSet::new(
            2023,
            vec![
                DemographicRecord {
                    region: Some(2),
                    total_population: Some(400_000.0),
                    male_percentage: Some(48.0),
                    female_percentage: Some(52.0),
                    school_enrollment_rate: Some(60.0),
                    ..Default::default()
                },
                DemographicRecord {
                    region: Some(1),
                    total_population: Some(100_000.0),
                    male_percentage: Some(50.0),
                    female_percentage: Some(50.0),
                    ..Default::default()
                },
                DemographicRecord {
                    region: Some(1),
                    department: Some(10),
                    total_population: Some(7_000_000.0),
                    ..Default::default()
                },
            ],
        )
    }

    #[test]
    fn test_population_sums_region_rows_only() {
        let set = set();
        assert_eq!(population(&set, RegionFilter::All), 500_000.0);
        assert_eq!(population(&set, RegionFilter::Region(1)), 100_000.0);
        assert_eq!(population(&set, RegionFilter::Region(9)), 0.0);
    }

    #[test]
    fn test_mean_counts_missing_as_zero() {
        let set = set();
        assert_eq!(mean(&set, RegionFilter::All, Indicator::MalePercentage), 49.0);
        assert_eq!(mean(&set, RegionFilter::All, Indicator::SchoolEnrollmentRate), 30.0);
        assert_eq!(mean(&set, RegionFilter::Region(9), Indicator::SchoolEnrollmentRate), 0.0);
    }

    #[test]
    fn test_key_stats_cards() {
        let stats = key_stats(&set(), RegionFilter::All);
        assert_eq!(stats.len(), 4);
        assert_eq!(stats[0].value, "500 000");
        assert_eq!(stats[1].value, "49.0% hommes / 51.0% femmes");
        assert_eq!(stats[2].value, "30.0%");
        assert_eq!(stats[2].progress, Some(30.0));
        assert_eq!(stats[3].value, "0.0%");
    }

    #[test]
    fn test_region_chart_named_and_ordered() {
        let bars = region_chart(&set(), &sample_catalog());
        assert_eq!(
            bars,
            vec![("Hodh Ech Chargui".to_string(), 100_000), ("Trarza".to_string(), 400_000)]
        );
    }

    #[test]
    fn test_region_filter_cycles() {
        let catalog = sample_catalog();
        let mut page = StatsPage::default();
        page.next_region(&catalog);
        assert_eq!(page.region, RegionFilter::Region(1));
        page.next_region(&catalog);
        assert_eq!(page.region, RegionFilter::Region(2));
        page.next_region(&catalog);
        assert_eq!(page.region, RegionFilter::All);
        page.previous_region(&catalog);
        assert_eq!(page.region, RegionFilter::Region(2));
        assert_eq!(page.region.label(&catalog), "Trarza");
        assert_eq!(RegionFilter::All.label(&catalog), "Toutes les régions");
    }
}
