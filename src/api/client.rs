use std::sync::Arc;

use geojson::{GeoJson, Geometry, JsonValue, Value};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::api::source::{DataSource, Endpoint};
use crate::catalog::{Boundary, DemographicRecord, DemographicSet, Level, Zone};
use crate::error::{ApiError, Result};

/// Zone row as served by the API. Only the name/code columns of the
/// row's own level are filled.
#[derive(Deserialize)]
struct ZoneDto {
    id: u32,
    #[serde(default)]
    adm1_en: Option<String>,
    #[serde(default)]
    adm1_pcode: Option<String>,
    #[serde(default)]
    adm2_en: Option<String>,
    #[serde(default)]
    adm2_pcode: Option<String>,
    #[serde(default)]
    adm3_en: Option<String>,
    #[serde(default)]
    adm3_pcode: Option<String>,
    #[serde(default)]
    region: Option<u32>,
    #[serde(default)]
    department: Option<u32>,
    #[serde(default)]
    geo_json: Option<JsonValue>,
}

impl ZoneDto {
    fn into_zone(self, level: Level) -> Zone {
        let (name, code, parent_id) = match level {
            Level::Region => (self.adm1_en, self.adm1_pcode, None),
            Level::Department => (self.adm2_en, self.adm2_pcode, self.region),
            Level::Commune => (self.adm3_en, self.adm3_pcode, self.department),
        };
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("{} {}", level.label(), self.id));
        let boundary = match self.geo_json.map(parse_geometry) {
            Some(Ok(boundary)) => boundary,
            Some(Err(e)) => {
                warn!(level = level.as_str(), zone_id = self.id, error = %e, "unreadable geo_json");
                Boundary::empty()
            }
            None => Boundary::empty(),
        };
        if boundary.is_empty() {
            debug!(level = level.as_str(), zone_id = self.id, "zone has no geometry");
        }
        Zone {
            id: self.id,
            name,
            code,
            level,
            parent_id,
            boundary,
        }
    }
}

/// Accepts a geometry, a feature or a feature collection, inline or as a JSON string
fn parse_geometry(value: JsonValue) -> std::result::Result<Boundary, geojson::Error> {
    let geojson = match value {
        JsonValue::String(text) => text.parse::<GeoJson>()?,
        other => GeoJson::from_json_value(other)?,
    };
    let geometries: Vec<Geometry> = match geojson {
        GeoJson::Geometry(g) => vec![g],
        GeoJson::Feature(f) => f.geometry.into_iter().collect(),
        GeoJson::FeatureCollection(fc) => fc.features.into_iter().filter_map(|f| f.geometry).collect(),
    };
    Ok(Boundary::from_geometry(&Geometry::new(Value::GeometryCollection(geometries))))
}

/// Typed access to the census API on top of a raw byte source
#[derive(Clone)]
pub struct Api {
    source: Arc<dyn DataSource>,
}

impl Api {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self { source }
    }

    fn decode<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> Result<T> {
        let mut bytes = self.source.fetch(endpoint)?;
        simd_json::serde::from_slice(&mut bytes).map_err(|source| ApiError::Decode {
            url: self.source.describe(endpoint),
            source,
        })
    }

    pub fn zones(&self, level: Level) -> Result<Vec<Zone>> {
        let endpoint = match level {
            Level::Region => Endpoint::Regions,
            Level::Department => Endpoint::Departments,
            Level::Commune => Endpoint::Communes,
        };
        let rows: Vec<ZoneDto> = self.decode(&endpoint)?;
        Ok(rows.into_iter().map(|row| row.into_zone(level)).collect())
    }

    /// Available census years, ascending and unique
    pub fn census_years(&self) -> Result<Vec<i32>> {
        let mut years: Vec<i32> = self.decode(&Endpoint::CensusYears)?;
        years.sort_unstable();
        years.dedup();
        Ok(years)
    }

    pub fn demographics(&self, year: i32) -> Result<DemographicSet> {
        let records: Vec<DemographicRecord> = self.decode(&Endpoint::Demographics { year })?;
        Ok(DemographicSet::new(year, records))
    }

    /// Spreadsheet bytes for an export request
    pub fn export(&self, endpoint: &Endpoint) -> Result<Vec<u8>> {
        self.source.fetch(endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeSource;

    const REGIONS: &str = r#"[
        {"id": 1, "adm0_en": "Mauritania", "adm1_en": "Hodh Ech Chargui", "adm1_pcode": "MR01",
         "country": 1,
         "geo_json": {"type": "Polygon", "coordinates": [[[-12, 16], [-8, 16], [-8, 20], [-12, 20], [-12, 16]]]}},
        {"id": 2, "adm1_en": "  ", "geo_json": null}
    ]"#;

    #[test]
    fn test_regions_decode() {
        let api = Api::new(Arc::new(FakeSource::new().with(Endpoint::Regions, REGIONS)));
        let zones = api.zones(Level::Region).unwrap();
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].name, "Hodh Ech Chargui");
        assert_eq!(zones[0].code.as_deref(), Some("MR01"));
        assert!(zones[0].boundary.contains(-10.0, 18.0));
        assert_eq!(zones[1].name, "Région 2");
        assert!(zones[1].boundary.is_empty());
    }

    #[test]
    fn test_communes_keep_parent_and_string_geometry() {
        let communes = r#"[{"id": 70, "adm3_en": "Bou-Gadoum", "adm3_pcode": "MR010101", "department": 7,
            "geo_json": "{\"type\": \"Feature\", \"properties\": {}, \"geometry\": {\"type\": \"MultiPolygon\", \"coordinates\": [[[[0, 0], [1, 0], [1, 1], [0, 0]]]]}}"}]"#;
        let api = Api::new(Arc::new(FakeSource::new().with(Endpoint::Communes, communes)));
        let zones = api.zones(Level::Commune).unwrap();
        assert_eq!(zones[0].parent_id, Some(7));
        assert_eq!(zones[0].level, Level::Commune);
        assert!(zones[0].boundary.contains(0.7, 0.2));
    }

    #[test]
    fn test_census_years_sorted() {
        let api = Api::new(Arc::new(FakeSource::new().with(Endpoint::CensusYears, "[2023, 2013, 2023]")));
        assert_eq!(api.census_years().unwrap(), vec![2013, 2023]);
    }

    #[test]
    fn test_decode_error_names_source() {
        let api = Api::new(Arc::new(FakeSource::new().with(Endpoint::CensusYears, "{not json")));
        match api.census_years() {
            Err(ApiError::Decode { url, .. }) => assert_eq!(url, "fake:/api/census-years/"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_demographics_indexed_by_level() {
        let body = r#"[{"census": 1, "country": 1, "total_population": "4927532"},
                       {"census": 1, "region": 1, "total_population": 430668}]"#;
        let api = Api::new(Arc::new(
            FakeSource::new().with(Endpoint::Demographics { year: 2023 }, body),
        ));
        let set = api.demographics(2023).unwrap();
        assert_eq!(set.year(), 2023);
        assert_eq!(set.get(Level::Region, 1).unwrap().total_population, Some(430668.0));
        assert_eq!(set.national().unwrap().total_population, Some(4927532.0));
    }
}
