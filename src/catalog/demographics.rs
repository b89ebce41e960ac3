use std::collections::HashMap;

use serde::{Deserialize, Deserializer};

use super::Level;

/// Whether an indicator is a head count or a percentage
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Count,
    Percentage,
}

/// Census indicators carried by a demographic record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Indicator {
    TotalPopulation,
    MalePercentage,
    FemalePercentage,
    UrbanPercentage,
    RuralPercentage,
    Population10Plus,
    SingleRate,
    MarriedRate,
    DivorcedRate,
    WidowedRate,
    SchoolEnrollmentRate,
    IlliteracyRate10Plus,
    Population15Plus,
    IlliteracyRate15Plus,
}

impl Indicator {
    /// Field name used by the census API
    pub fn field_name(self) -> &'static str {
        match self {
            Indicator::TotalPopulation => "total_population",
            Indicator::MalePercentage => "male_percentage",
            Indicator::FemalePercentage => "female_percentage",
            Indicator::UrbanPercentage => "urban_percentage",
            Indicator::RuralPercentage => "rural_percentage",
            Indicator::Population10Plus => "population_10_plus",
            Indicator::SingleRate => "single_rate",
            Indicator::MarriedRate => "married_rate",
            Indicator::DivorcedRate => "divorced_rate",
            Indicator::WidowedRate => "widowed_rate",
            Indicator::SchoolEnrollmentRate => "school_enrollment_rate",
            Indicator::IlliteracyRate10Plus => "illiteracy_rate_10_plus",
            Indicator::Population15Plus => "population_15_plus",
            Indicator::IlliteracyRate15Plus => "illiteracy_rate_15_plus",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Indicator::TotalPopulation => "Population totale",
            Indicator::MalePercentage => "% Hommes",
            Indicator::FemalePercentage => "% Femmes",
            Indicator::UrbanPercentage => "% Urbain",
            Indicator::RuralPercentage => "% Rural",
            Indicator::Population10Plus => "Population 10 ans +",
            Indicator::SingleRate => "% Célibataires",
            Indicator::MarriedRate => "% Mariés",
            Indicator::DivorcedRate => "% Divorcés",
            Indicator::WidowedRate => "% Veufs",
            Indicator::SchoolEnrollmentRate => "Taux de scolarisation",
            Indicator::IlliteracyRate10Plus => "Analphabétisme (10 ans +)",
            Indicator::Population15Plus => "Population 15 ans +",
            Indicator::IlliteracyRate15Plus => "Analphabétisme (15 ans +)",
        }
    }

    pub fn kind(self) -> ValueKind {
        match self {
            Indicator::TotalPopulation | Indicator::Population10Plus | Indicator::Population15Plus => {
                ValueKind::Count
            }
            _ => ValueKind::Percentage,
        }
    }
}

/// Share of the population by highest education level reached
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct EducationBreakdown {
    #[serde(default, deserialize_with = "lenient_number")]
    pub no_education: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub preschool: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub primary: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub middle_school: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub high_school: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub university: Option<f64>,
}

impl EducationBreakdown {
    pub fn rows(&self) -> [(&'static str, Option<f64>); 6] {
        [
            ("Aucun niveau", self.no_education),
            ("Crèche/maternelle", self.preschool),
            ("Primaire", self.primary),
            ("Collège", self.middle_school),
            ("Lycée", self.high_school),
            ("Université", self.university),
        ]
    }
}

/// One census row for a zone. Exactly one of the zone keys identifies it;
/// the most specific non-null key decides its level.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct DemographicRecord {
    #[serde(default)]
    pub country: Option<u32>,
    #[serde(default)]
    pub region: Option<u32>,
    #[serde(default)]
    pub department: Option<u32>,
    #[serde(default)]
    pub commune: Option<u32>,

    #[serde(default, deserialize_with = "lenient_number")]
    pub total_population: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub male_percentage: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub female_percentage: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub urban_percentage: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub rural_percentage: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub population_10_plus: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub single_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub married_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub divorced_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub widowed_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub school_enrollment_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub illiteracy_rate_10_plus: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub population_15_plus: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub illiteracy_rate_15_plus: Option<f64>,

    #[serde(default, rename = "education_level")]
    pub education: Option<EducationBreakdown>,
}

impl DemographicRecord {
    /// Typed accessor for an indicator value
    pub fn get(&self, indicator: Indicator) -> Option<f64> {
        let value = match indicator {
            Indicator::TotalPopulation => self.total_population,
            Indicator::MalePercentage => self.male_percentage,
            Indicator::FemalePercentage => self.female_percentage,
            Indicator::UrbanPercentage => self.urban_percentage,
            Indicator::RuralPercentage => self.rural_percentage,
            Indicator::Population10Plus => self.population_10_plus,
            Indicator::SingleRate => self.single_rate,
            Indicator::MarriedRate => self.married_rate,
            Indicator::DivorcedRate => self.divorced_rate,
            Indicator::WidowedRate => self.widowed_rate,
            Indicator::SchoolEnrollmentRate => self.school_enrollment_rate,
            Indicator::IlliteracyRate10Plus => self.illiteracy_rate_10_plus,
            Indicator::Population15Plus => self.population_15_plus,
            Indicator::IlliteracyRate15Plus => self.illiteracy_rate_15_plus,
        };
        value.filter(|v| v.is_finite())
    }

    /// Zone this record describes, or None for a national row
    pub fn zone_key(&self) -> Option<(Level, u32)> {
        if let Some(id) = self.commune {
            Some((Level::Commune, id))
        } else if let Some(id) = self.department {
            Some((Level::Department, id))
        } else {
            self.region.map(|id| (Level::Region, id))
        }
    }
}

/// Demographic records for one census year, indexed by zone
#[derive(Clone, Debug, Default)]
pub struct DemographicSet {
    year: i32,
    by_zone: HashMap<(Level, u32), DemographicRecord>,
    national: Option<DemographicRecord>,
}

impl DemographicSet {
    pub fn new(year: i32, records: Vec<DemographicRecord>) -> Self {
        let mut by_zone = HashMap::with_capacity(records.len());
        let mut national = None;
        for record in records {
            match record.zone_key() {
                // First record wins when the API returns duplicates
                Some(key) => {
                    by_zone.entry(key).or_insert(record);
                }
                None if record.country.is_some() && national.is_none() => national = Some(record),
                None => {}
            }
        }
        Self { year, by_zone, national }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn get(&self, level: Level, zone_id: u32) -> Option<&DemographicRecord> {
        self.by_zone.get(&(level, zone_id))
    }

    pub fn national(&self) -> Option<&DemographicRecord> {
        self.national.as_ref()
    }

    /// Records at one level, in no particular order
    pub fn at_level(&self, level: Level) -> impl Iterator<Item = (u32, &DemographicRecord)> {
        self.by_zone
            .iter()
            .filter(move |((l, _), _)| *l == level)
            .map(|((_, id), record)| (*id, record))
    }

    pub fn len(&self) -> usize {
        self.by_zone.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_zone.is_empty() && self.national.is_none()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

/// Decimal columns arrive as JSON strings ("45.20") or numbers; blanks are absent
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<NumberOrText>::deserialize(deserializer)? {
        Some(NumberOrText::Number(v)) => Some(v),
        Some(NumberOrText::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}
