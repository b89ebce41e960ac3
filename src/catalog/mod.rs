mod boundary;
mod demographics;

pub use boundary::{Boundary, Bounds};
pub use demographics::{DemographicRecord, DemographicSet, Indicator, ValueKind};

#[cfg(test)]
pub use boundary::Polygon;
#[cfg(test)]
pub use demographics::EducationBreakdown;

use std::collections::HashMap;

/// Administrative granularity, coarsest first
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    Region,
    Department,
    Commune,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Region, Level::Department, Level::Commune];

    /// Zone type as used in export URLs
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Region => "region",
            Level::Department => "department",
            Level::Commune => "commune",
        }
    }

    /// Display name
    pub fn label(self) -> &'static str {
        match self {
            Level::Region => "Région",
            Level::Department => "Moughataa",
            Level::Commune => "Commune",
        }
    }
}

/// An administrative area at one level
#[derive(Clone, Debug)]
pub struct Zone {
    pub id: u32,
    pub name: String,
    pub code: Option<String>,
    pub level: Level,
    pub parent_id: Option<u32>,
    pub boundary: Boundary,
}

impl Zone {
    /// Level that `parent_id` refers to
    pub fn parent_level(&self) -> Option<Level> {
        match self.level {
            Level::Region => None,
            Level::Department => Some(Level::Region),
            Level::Commune => Some(Level::Department),
        }
    }
}

/// All zones loaded for the session, one list per level
#[derive(Debug, Default)]
pub struct ZoneCatalog {
    regions: Vec<Zone>,
    departments: Vec<Zone>,
    communes: Vec<Zone>,
    index: HashMap<(Level, u32), usize>,
}

impl ZoneCatalog {
    pub fn new(regions: Vec<Zone>, departments: Vec<Zone>, communes: Vec<Zone>) -> Self {
        let mut index = HashMap::new();
        for (level, zones) in [
            (Level::Region, &regions),
            (Level::Department, &departments),
            (Level::Commune, &communes),
        ] {
            for (idx, zone) in zones.iter().enumerate() {
                // Ids are unique within a level; keep the first on conflict
                index.entry((level, zone.id)).or_insert(idx);
            }
        }
        Self {
            regions,
            departments,
            communes,
            index,
        }
    }

    pub fn zones(&self, level: Level) -> &[Zone] {
        match level {
            Level::Region => &self.regions,
            Level::Department => &self.departments,
            Level::Commune => &self.communes,
        }
    }

    pub fn get(&self, level: Level, id: u32) -> Option<&Zone> {
        self.index.get(&(level, id)).map(|&idx| &self.zones(level)[idx])
    }

    /// Every zone, regions first
    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.regions.iter().chain(&self.departments).chain(&self.communes)
    }

    pub fn len(&self) -> usize {
        self.regions.len() + self.departments.len() + self.communes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use glam::DVec2;

    /// Axis-aligned rectangular zone
    pub fn rect_zone(level: Level, id: u32, name: &str, min: (f64, f64), max: (f64, f64)) -> Zone {
        let exterior = vec![
            DVec2::new(min.0, min.1),
            DVec2::new(max.0, min.1),
            DVec2::new(max.0, max.1),
            DVec2::new(min.0, max.1),
            DVec2::new(min.0, min.1),
        ];
        Zone {
            id,
            name: name.to_string(),
            code: None,
            level,
            parent_id: None,
            boundary: Boundary::from_polygons(vec![Polygon {
                exterior,
                holes: Vec::new(),
            }]),
        }
    }

    /// Small catalog: two regions side by side, one department and one commune
    /// nested in the eastern region. Region 1 and commune 1 share an id.
    pub fn sample_catalog() -> ZoneCatalog {
        ZoneCatalog::new(
            vec![
                rect_zone(Level::Region, 1, "Hodh Ech Chargui", (-12.0, 16.0), (-8.0, 20.0)),
                rect_zone(Level::Region, 2, "Trarza", (-16.0, 16.0), (-12.0, 20.0)),
            ],
            vec![rect_zone(Level::Department, 10, "Néma", (-11.0, 16.0), (-9.0, 18.0))],
            vec![rect_zone(Level::Commune, 1, "Bou-Gadoum", (-10.5, 16.5), (-9.5, 17.5))],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::sample_catalog;
    use super::*;

    #[test]
    fn test_levels_are_numbered_independently() {
        let catalog = sample_catalog();
        assert_eq!(catalog.get(Level::Region, 1).unwrap().name, "Hodh Ech Chargui");
        assert_eq!(catalog.get(Level::Commune, 1).unwrap().name, "Bou-Gadoum");
        assert!(catalog.get(Level::Department, 1).is_none());
        assert_eq!(catalog.len(), 4);
    }

    #[test]
    fn test_iter_regions_first() {
        let catalog = sample_catalog();
        let levels: Vec<Level> = catalog.iter().map(|z| z.level).collect();
        assert_eq!(levels, vec![Level::Region, Level::Region, Level::Department, Level::Commune]);
    }
}
