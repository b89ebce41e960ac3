use std::collections::HashMap;

use rayon::prelude::*;

use crate::braille::BrailleCanvas;
use crate::catalog::{DemographicSet, Level, Zone, ZoneCatalog};
use crate::filters::format_value;
use crate::map::geometry::{draw_line, draw_thick_line};
use crate::map::projection::Viewport;
use crate::map::spatial::ZoneGrid;
use crate::state::SelectionState;
use crate::style::{resolve_style, MissingValuePolicy, Rgb, ZoneStyle, DEFAULT_STROKE};

const BACKGROUND: Rgb = Rgb(0, 0, 0);

/// Everything that decides how the zones look in one frame
pub struct Scene<'a> {
    pub catalog: &'a ZoneCatalog,
    pub demographics: Option<&'a DemographicSet>,
    pub selection: &'a SelectionState,
    pub policy: MissingValuePolicy,
    pub show_names: bool,
}

impl Scene<'_> {
    fn style(&self, zone: &Zone) -> ZoneStyle {
        resolve_style(
            zone.id,
            zone.level,
            self.demographics,
            self.selection.active_filter(),
            self.selection,
            self.policy,
        )
    }
}

/// Text placed over the map at a character cell
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub col: u16,
    pub row: u16,
    pub text: String,
    pub level: Level,
    pub zone_id: u32,
    pub selected: bool,
}

impl Label {
    pub fn covers(&self, col: u16, row: u16) -> bool {
        row == self.row && col >= self.col && (col as usize) < self.col as usize + self.text.chars().count()
    }
}

/// Topmost label under a character cell
pub fn label_at(labels: &[Label], col: u16, row: u16) -> Option<&Label> {
    labels.iter().rev().find(|label| label.covers(col, row))
}

/// One rendered frame of the map area
pub struct MapFrame {
    pub canvas: BrailleCanvas,
    /// Blended background color per character cell, row-major
    pub fills: Vec<Option<Rgb>>,
    pub labels: Vec<Label>,
}

impl MapFrame {
    pub fn fill(&self, col: usize, row: usize) -> Option<Rgb> {
        if col >= self.canvas.width() {
            return None;
        }
        self.fills.get(row * self.canvas.width() + col).copied().flatten()
    }
}

/// Zone renderer with one spatial index per level
#[derive(Default)]
pub struct MapRenderer {
    grids: [ZoneGrid; 3],
}

fn slot(level: Level) -> usize {
    match level {
        Level::Region => 0,
        Level::Department => 1,
        Level::Commune => 2,
    }
}

impl MapRenderer {
    pub fn build(catalog: &ZoneCatalog) -> Self {
        Self {
            grids: Level::ALL.map(|level| ZoneGrid::build(catalog.zones(level))),
        }
    }

    /// Zone of `level` containing the point, holes respected
    pub fn zone_at<'a>(&self, catalog: &'a ZoneCatalog, level: Level, lon: f64, lat: f64) -> Option<&'a Zone> {
        let zones = catalog.zones(level);
        self.grids[slot(level)]
            .query_point(lon, lat)
            .iter()
            .filter_map(|&idx| zones.get(idx))
            .find(|zone| zone.boundary.contains(lon, lat))
    }

    /// Zones of `level` whose bounding box intersects the viewport
    fn visible<'a>(&self, catalog: &'a ZoneCatalog, level: Level, viewport: &Viewport) -> Vec<&'a Zone> {
        let view = viewport.visible_bounds();
        let zones = catalog.zones(level);
        self.grids[slot(level)]
            .query_bounds(&view)
            .into_iter()
            .filter_map(|idx| zones.get(idx))
            .filter(|zone| zone.boundary.bounds().is_some_and(|b| b.intersects(&view)))
            .collect()
    }

    /// Render fills, outlines and labels for the viewport
    pub fn render(&self, scene: &Scene, viewport: &Viewport) -> MapFrame {
        let cols = viewport.width / 2;
        let rows = viewport.height / 4;
        let active = scene.selection.active_level();
        let zones = scene.catalog.zones(active);

        let styles: HashMap<usize, ZoneStyle> = self.grids[slot(active)]
            .query_bounds(&viewport.visible_bounds())
            .into_iter()
            .filter_map(|idx| zones.get(idx).map(|zone| (idx, scene.style(zone))))
            .collect();

        let mut fills = vec![None; cols * rows];
        let grid = &self.grids[slot(active)];
        if cols > 0 {
            fills.par_chunks_mut(cols).enumerate().for_each(|(row, out)| {
                for (col, cell) in out.iter_mut().enumerate() {
                    let (lon, lat) = viewport.unproject_f(col as f64 * 2.0 + 1.0, row as f64 * 4.0 + 2.0);
                    *cell = grid
                        .query_point(lon, lat)
                        .iter()
                        .find(|&&idx| zones.get(idx).is_some_and(|z| z.boundary.contains(lon, lat)))
                        .and_then(|idx| styles.get(idx))
                        .map(|style| style.fill_color.over(BACKGROUND, style.fill_opacity));
                }
            });
        }

        let mut canvas = BrailleCanvas::new(cols, rows);
        if active != Level::Region {
            for zone in self.visible(scene.catalog, Level::Region, viewport) {
                draw_outline(&mut canvas, zone, viewport, DEFAULT_STROKE, false);
            }
        }
        let mut selected = None;
        for zone in self.visible(scene.catalog, active, viewport) {
            let style = scene.style(zone);
            if style.stroke_weight >= 3 {
                selected = Some((zone, style));
                continue;
            }
            draw_outline(&mut canvas, zone, viewport, style.stroke_color, false);
        }
        // Selected outline last so it stays on top
        if let Some((zone, style)) = selected {
            draw_outline(&mut canvas, zone, viewport, style.stroke_color, true);
        }

        let labels = self.collect_labels(scene, viewport);
        MapFrame { canvas, fills, labels }
    }

    /// Label candidates for every visible level, placed without overlap.
    /// The selected zone's label is placed first, then coarser levels.
    pub fn collect_labels(&self, scene: &Scene, viewport: &Viewport) -> Vec<Label> {
        let visibility = scene.selection.label_visibility();
        let filter = scene.selection.active_filter();
        let cols = (viewport.width / 2) as i32;
        let rows = (viewport.height / 4) as i32;

        let mut candidates = Vec::new();
        for level in Level::ALL {
            if !visibility.shows(level) {
                continue;
            }
            for zone in self.visible(scene.catalog, level, viewport) {
                let value = filter.and_then(|f| {
                    scene
                        .demographics
                        .and_then(|set| set.get(level, zone.id))
                        .and_then(|record| f.value_of(record))
                        .map(|v| format_value(Some(v), f.kind))
                });
                let text = match (scene.show_names, value) {
                    (true, Some(v)) => format!("{} {}", zone.name, v),
                    (true, None) => zone.name.clone(),
                    (false, Some(v)) => v,
                    (false, None) => continue,
                };
                let Some(anchor) = zone.boundary.label_point() else {
                    continue;
                };
                candidates.push((scene.selection.is_selected(level, zone.id), level, zone.id, anchor, text));
            }
        }
        candidates.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        let mut occupied: HashMap<i32, Vec<(i32, i32)>> = HashMap::new();
        let mut labels = Vec::new();
        for (selected, level, zone_id, anchor, text) in candidates {
            let (px, py) = viewport.project(anchor.x, anchor.y);
            let len = text.chars().count() as i32;
            let row = py.div_euclid(4);
            let start = (px.div_euclid(2) - len / 2).max(0);
            let end = start + len;
            if row < 0 || row >= rows || start >= cols || end > cols {
                continue;
            }
            let spans = occupied.entry(row).or_default();
            if spans.iter().any(|&(s, e)| start <= e && s <= end) {
                continue;
            }
            spans.push((start, end));
            labels.push(Label {
                col: start as u16,
                row: row as u16,
                text,
                level,
                zone_id,
                selected,
            });
        }
        labels
    }
}

/// Draw every ring of a zone, each edge clipped to the viewport
fn draw_outline(canvas: &mut BrailleCanvas, zone: &Zone, viewport: &Viewport, color: Rgb, thick: bool) {
    for ring in zone.boundary.rings() {
        let mut prev: Option<(i32, i32)> = None;
        for p in ring {
            let (px, py) = viewport.project(p.x, p.y);
            if let Some((a, b)) = prev.and_then(|prev| viewport.clip_line(prev, (px, py))) {
                if thick {
                    draw_thick_line(canvas, a.0, a.1, b.0, b.1, color);
                } else {
                    draw_line(canvas, a.0, a.1, b.0, b.1, color);
                }
            }
            prev = Some((px, py));
        }
    }
}
