use crate::catalog::{Bounds, Level, Zone};
use crate::filters::FilterOption;

/// Zoom the map opens at
pub const INITIAL_ZOOM: f64 = 6.0;

/// Upper zoom bound when fitting the map to a searched zone
pub const FIT_MAX_ZOOM: f64 = 10.0;

/// Zoom that represents each level when it is picked explicitly
pub fn level_zoom(level: Level) -> f64 {
    match level {
        Level::Region => 6.0,
        Level::Department => 8.0,
        Level::Commune => 10.0,
    }
}

/// Camera change requested by a state transition
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ViewCommand {
    SetZoom(f64),
    FitBounds { bounds: Bounds, max_zoom: f64 },
}

/// Which label layers are drawn. Each flag is computed independently, so
/// more than one level can be labelled at once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LabelVisibility {
    pub region: bool,
    pub department: bool,
    pub commune: bool,
}

impl LabelVisibility {
    pub fn compute(active: Level, zoom: f64) -> Self {
        Self {
            region: active == Level::Region || zoom < 7.0,
            department: active == Level::Department || (7.0..9.0).contains(&zoom),
            commune: active == Level::Commune || zoom >= 9.0,
        }
    }

    pub fn shows(&self, level: Level) -> bool {
        match level {
            Level::Region => self.region,
            Level::Department => self.department,
            Level::Commune => self.commune,
        }
    }
}

/// Active granularity, selection, filter, zoom and year of the map view
#[derive(Clone, Debug)]
pub struct SelectionState {
    active_level: Level,
    selected_zone: Option<u32>,
    active_filter: Option<&'static FilterOption>,
    current_zoom: f64,
    selected_year: Option<i32>,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionState {
    pub fn new() -> Self {
        Self {
            active_level: Level::Region,
            selected_zone: None,
            active_filter: None,
            current_zoom: INITIAL_ZOOM,
            selected_year: None,
        }
    }

    pub fn active_level(&self) -> Level {
        self.active_level
    }

    pub fn selected_zone(&self) -> Option<u32> {
        self.selected_zone
    }

    /// Selected zone together with its level
    pub fn selection(&self) -> Option<(Level, u32)> {
        self.selected_zone.map(|id| (self.active_level, id))
    }

    pub fn active_filter(&self) -> Option<&'static FilterOption> {
        self.active_filter
    }

    pub fn current_zoom(&self) -> f64 {
        self.current_zoom
    }

    pub fn selected_year(&self) -> Option<i32> {
        self.selected_year
    }

    pub fn is_selected(&self, level: Level, zone_id: u32) -> bool {
        self.active_level == level && self.selected_zone == Some(zone_id)
    }

    /// Toolbar level pick: drop the selection and jump to the level's zoom
    pub fn select_level(&mut self, level: Level) -> ViewCommand {
        self.active_level = level;
        self.selected_zone = None;
        ViewCommand::SetZoom(level_zoom(level))
    }

    /// Click on a zone or its label. The camera does not move.
    pub fn click_zone(&mut self, level: Level, zone_id: u32) {
        self.active_level = level;
        self.selected_zone = Some(zone_id);
    }

    /// Search pick: select like a click, then fit the camera to the zone
    pub fn select_from_search(&mut self, zone: &Zone) -> Option<ViewCommand> {
        self.click_zone(zone.level, zone.id);
        zone.boundary.bounds().map(|bounds| ViewCommand::FitBounds {
            bounds,
            max_zoom: FIT_MAX_ZOOM,
        })
    }

    /// User pan/zoom. Level and selection are left alone.
    pub fn zoom_changed(&mut self, zoom: f64) {
        self.current_zoom = zoom;
    }

    pub fn set_filter(&mut self, filter: Option<&'static FilterOption>) {
        self.active_filter = filter;
    }

    /// Returns true when the year actually changed
    pub fn set_year(&mut self, year: i32) -> bool {
        let changed = self.selected_year != Some(year);
        self.selected_year = Some(year);
        changed
    }

    /// Undo a year pick whose figures never arrived
    pub fn revert_year(&mut self, loaded: Option<i32>) {
        self.selected_year = loaded;
    }

    pub fn label_visibility(&self) -> LabelVisibility {
        LabelVisibility::compute(self.active_level, self.current_zoom)
    }
}
