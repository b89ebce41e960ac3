use geojson::{Geometry, Value};
use glam::DVec2;

use crate::map::point_in_ring;

/// Geographic bounding box in degrees
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: DVec2,
    pub max: DVec2,
}

impl Bounds {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min: DVec2::new(min_lon, min_lat),
            max: DVec2::new(max_lon, max_lat),
        }
    }

    /// Box that contains nothing; extending it with a point yields that point
    fn empty() -> Self {
        Self {
            min: DVec2::splat(f64::INFINITY),
            max: DVec2::splat(f64::NEG_INFINITY),
        }
    }

    fn extend(&mut self, p: DVec2) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }
}

/// One polygon: exterior ring plus holes, lon/lat vertices
#[derive(Clone, Debug, Default)]
pub struct Polygon {
    pub exterior: Vec<DVec2>,
    pub holes: Vec<Vec<DVec2>>,
}

impl Polygon {
    fn contains(&self, p: DVec2) -> bool {
        point_in_ring(&self.exterior, p) && !self.holes.iter().any(|hole| point_in_ring(hole, p))
    }
}

/// Polygon or multipolygon boundary of an administrative zone
#[derive(Clone, Debug)]
pub struct Boundary {
    polygons: Vec<Polygon>,
    bounds: Bounds,
}

impl Boundary {
    pub fn from_polygons(polygons: Vec<Polygon>) -> Self {
        let mut bounds = Bounds::empty();
        for polygon in &polygons {
            for &p in &polygon.exterior {
                bounds.extend(p);
            }
        }
        Self { polygons, bounds }
    }

    /// Build from a GeoJSON geometry. Non-areal members are ignored.
    pub fn from_geometry(geometry: &Geometry) -> Self {
        let mut polygons = Vec::new();
        collect_polygons(&geometry.value, &mut polygons);
        Self::from_polygons(polygons)
    }

    pub fn empty() -> Self {
        Self::from_polygons(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds.is_valid().then_some(self.bounds)
    }

    /// Label anchor: center of the bounding box
    pub fn label_point(&self) -> Option<DVec2> {
        self.bounds().map(|b| b.center())
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let p = DVec2::new(lon, lat);
        self.bounds.contains(p) && self.polygons.iter().any(|poly| poly.contains(p))
    }

    /// Every ring (exterior and holes) for outline drawing
    pub fn rings(&self) -> impl Iterator<Item = &[DVec2]> {
        self.polygons.iter().flat_map(|poly| {
            std::iter::once(poly.exterior.as_slice()).chain(poly.holes.iter().map(Vec::as_slice))
        })
    }
}

fn ring_from(coords: &[Vec<f64>]) -> Vec<DVec2> {
    coords
        .iter()
        .filter(|c| c.len() >= 2)
        .map(|c| DVec2::new(c[0], c[1]))
        .collect()
}

fn polygon_from(rings: &[Vec<Vec<f64>>]) -> Option<Polygon> {
    let (exterior, holes) = rings.split_first()?;
    let exterior = ring_from(exterior);
    if exterior.len() < 3 {
        return None;
    }
    Some(Polygon {
        exterior,
        holes: holes.iter().map(|h| ring_from(h)).filter(|h| h.len() >= 3).collect(),
    })
}

fn collect_polygons(value: &Value, out: &mut Vec<Polygon>) {
    match value {
        Value::Polygon(rings) => out.extend(polygon_from(rings)),
        Value::MultiPolygon(polygons) => {
            out.extend(polygons.iter().filter_map(|rings| polygon_from(rings)));
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_polygons(&g.value, out);
            }
        }
        _ => {}
    }
}
