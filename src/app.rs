use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Instant;

use ratatui::layout::Rect;
use tracing::{debug, info, warn};

use crate::api::{Request, Response};
use crate::catalog::{DemographicSet, Level, ZoneCatalog};
use crate::config::Config;
use crate::detail::{zone_export_target, DetailPanel, ExportTarget, Notifications};
use crate::filters::{FilterOption, FilterRegistry};
use crate::map::{label_at, MapRenderer, Scene, Viewport};
use crate::search::{SearchBox, SearchIndex};
use crate::state::{SelectionState, ViewCommand};
use crate::stats::StatsPage;
use crate::style::MissingValuePolicy;
use crate::ui;

/// Log lines kept for the log pane
const LOG_CAPACITY: usize = 500;

/// Top-level screen
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Page {
    Map,
    Stats,
    Concepts,
}

/// Application state
pub struct App {
    pub viewport: Viewport,
    pub renderer: MapRenderer,
    pub catalog: ZoneCatalog,
    pub selection: SelectionState,
    pub filters: FilterRegistry,
    pub demographics: Option<DemographicSet>,
    /// Census years offered by the backend, ascending
    pub years: Vec<i32>,
    pub search_index: SearchIndex,
    pub search: SearchBox,
    pub notifications: Notifications,
    pub stats: StatsPage,
    pub page: Page,
    pub detail_open: bool,
    pub show_names: bool,
    pub show_logs: bool,
    pub logs: VecDeque<String>,
    pub policy: MissingValuePolicy,
    /// True until the zone catalog has arrived
    pub loading: bool,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Terminal size the layout is computed for
    screen: Rect,
    dragged: bool,
    /// Bumped on every demographics request; older responses are stale
    generation: u64,
    initial_year: Option<i32>,
    export_dir: PathBuf,
    outbox: Vec<Request>,
}

impl App {
    pub fn new(config: &Config, screen: Rect) -> Self {
        let mut app = Self {
            viewport: Viewport::initial(0, 0),
            renderer: MapRenderer::default(),
            catalog: ZoneCatalog::default(),
            selection: SelectionState::new(),
            filters: FilterRegistry::builtin(),
            demographics: None,
            years: Vec::new(),
            search_index: SearchIndex::default(),
            search: SearchBox::default(),
            notifications: Notifications::default(),
            stats: StatsPage::default(),
            page: Page::Map,
            detail_open: false,
            show_names: true,
            show_logs: false,
            logs: VecDeque::new(),
            policy: config.missing_values,
            loading: true,
            should_quit: false,
            last_mouse: None,
            screen,
            dragged: false,
            generation: 0,
            initial_year: config.initial_year,
            export_dir: config.export_dir.clone(),
            outbox: vec![Request::LoadCatalog],
        };
        app.sync_viewport();
        app
    }

    /// Requests queued for the fetch worker since the last call
    pub fn take_requests(&mut self) -> Vec<Request> {
        std::mem::take(&mut self.outbox)
    }

    /// Inputs for rendering the map
    pub fn scene(&self) -> Scene<'_> {
        Scene {
            catalog: &self.catalog,
            demographics: self.demographics.as_ref(),
            selection: &self.selection,
            policy: self.policy,
            show_names: self.show_names,
        }
    }

    pub fn areas(&self) -> ui::Areas {
        ui::layout(self.screen, self.detail_open, self.show_logs)
    }

    /// Detail panel content while the panel is open
    pub fn detail_panel(&self) -> Option<DetailPanel> {
        if !self.detail_open {
            return None;
        }
        DetailPanel::for_selection(&self.selection, &self.catalog, self.demographics.as_ref())
    }

    /// Zone export target, None while the export action is disabled
    pub fn zone_export(&self) -> Option<ExportTarget> {
        zone_export_target(&self.selection, self.demographics.as_ref())
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        self.screen = Rect::new(0, 0, width, height);
        self.sync_viewport();
    }

    /// Braille gives 2x4 resolution per character
    fn sync_viewport(&mut self) {
        let inner = self.areas().map_inner;
        self.viewport.resize(inner.width as usize * 2, inner.height as usize * 4);
    }

    // ---- worker responses ----

    pub fn apply_response(&mut self, response: Response, now: Instant) {
        match response {
            Response::Catalog { catalog, years } => {
                self.renderer = MapRenderer::build(&catalog);
                self.search_index = SearchIndex::build(&catalog);
                self.catalog = catalog;
                self.years = years;
                self.loading = false;
                if self.catalog.is_empty() {
                    warn!("no zones loaded, the map stays empty");
                } else {
                    info!(zones = self.catalog.len(), searchable = self.search_index.len(), "map ready");
                }

                let year = match self.initial_year {
                    Some(y) if self.years.is_empty() || self.years.contains(&y) => Some(y),
                    Some(y) => {
                        warn!(year = y, "requested census year not offered, using the latest");
                        self.years.last().copied()
                    }
                    None => self.years.last().copied(),
                };
                if let Some(year) = year {
                    self.set_year(year);
                }
            }
            Response::Demographics {
                year,
                generation,
                result,
            } => {
                if generation != self.generation {
                    debug!(year, generation, current = self.generation, "dropping stale demographics");
                    return;
                }
                match result {
                    Ok(set) => {
                        if set.is_empty() {
                            warn!(year, "census year has no demographic records");
                        }
                        self.demographics = Some(set);
                        self.refresh_detail();
                    }
                    // Previous year's figures stay on screen and the year follows them
                    Err(e) => {
                        let loaded = self.demographics.as_ref().map(|set| set.year());
                        warn!(year, ?loaded, error = %e, "keeping previous demographics");
                        self.selection.revert_year(loaded);
                    }
                }
            }
            Response::Exported { path } => {
                debug!(path = %path.display(), "export finished");
                self.notifications.success("Le fichier a été téléchargé avec succès !", now);
            }
            Response::ExportFailed { message } => self.notifications.error(message),
        }
    }

    pub fn tick(&mut self, now: Instant) {
        self.notifications.tick(now);
    }

    pub fn push_log(&mut self, line: String) {
        if self.logs.len() == LOG_CAPACITY {
            self.logs.pop_front();
        }
        self.logs.push_back(line);
    }

    // ---- selection ----

    pub fn select_level(&mut self, level: Level) {
        let command = self.selection.select_level(level);
        self.detail_open = false;
        self.apply_view(command);
    }

    fn apply_view(&mut self, command: ViewCommand) {
        match command {
            ViewCommand::SetZoom(zoom) => self.viewport.set_zoom(zoom),
            ViewCommand::FitBounds { bounds, max_zoom } => self.viewport.fit_bounds(&bounds, max_zoom),
        }
        self.selection.zoom_changed(self.viewport.zoom);
    }

    /// Zone or label click; the panel opens only when the zone has data
    pub fn click_zone(&mut self, level: Level, zone_id: u32) {
        self.selection.click_zone(level, zone_id);
        info!(level = level.as_str(), zone_id, "zone selected");
        self.open_detail();
    }

    fn open_detail(&mut self) {
        self.detail_open = true;
        self.refresh_detail();
    }

    /// Close the panel if the selection lost its record
    fn refresh_detail(&mut self) {
        if self.detail_open && self.detail_panel().is_none() {
            self.detail_open = false;
        }
        self.sync_viewport();
    }

    pub fn close_detail(&mut self) {
        self.detail_open = false;
        self.sync_viewport();
    }

    /// Click at a terminal cell: labels win over the polygons beneath them
    pub fn click_at(&mut self, col: u16, row: u16) {
        let Some((x, y)) = self.map_cell(col, row) else {
            return;
        };
        let labels = self.renderer.collect_labels(&self.scene(), &self.viewport);
        if let Some(label) = label_at(&labels, x, y) {
            let (level, zone_id) = (label.level, label.zone_id);
            self.click_zone(level, zone_id);
            return;
        }

        let (lon, lat) = self
            .viewport
            .unproject_f(x as f64 * 2.0 + 1.0, y as f64 * 4.0 + 2.0);
        let level = self.selection.active_level();
        let hit = self.renderer.zone_at(&self.catalog, level, lon, lat).map(|z| z.id);
        if let Some(zone_id) = hit {
            self.click_zone(level, zone_id);
        }
    }

    /// Terminal cell to a cell of the map canvas
    fn map_cell(&self, col: u16, row: u16) -> Option<(u16, u16)> {
        let inner = self.areas().map_inner;
        let inside = col >= inner.x && col < inner.x + inner.width && row >= inner.y && row < inner.y + inner.height;
        inside.then(|| (col - inner.x, row - inner.y))
    }

    // ---- search ----

    pub fn open_search(&mut self) {
        self.search.open();
    }

    pub fn search_input(&mut self, ch: char) {
        self.search.push_char(ch, &self.search_index);
    }

    pub fn search_backspace(&mut self) {
        self.search.backspace(&self.search_index);
    }

    /// Select the highlighted result and fit the map to it
    pub fn accept_search(&mut self) {
        let Some(hit) = self.search.accept() else {
            return;
        };
        let Some(zone) = self.catalog.get(hit.level, hit.id) else {
            return;
        };
        let command = self.selection.select_from_search(zone);
        info!(level = hit.level.as_str(), zone_id = hit.id, name = %hit.name, "search pick");
        if let Some(command) = command {
            self.apply_view(command);
        }
        self.page = Page::Map;
        self.open_detail();
    }

    // ---- filters and years ----

    pub fn next_filter(&mut self) {
        let next = self.filters.next(self.selection.active_filter());
        self.set_filter(next);
    }

    pub fn previous_filter(&mut self) {
        let previous = self.filters.previous(self.selection.active_filter());
        self.set_filter(previous);
    }

    pub fn clear_filter(&mut self) {
        self.set_filter(None);
    }

    fn set_filter(&mut self, filter: Option<&'static FilterOption>) {
        match filter {
            Some(f) => info!(
                category = self.filters.category_of(f).map_or("", |c| c.id),
                indicator = f.indicator.field_name(),
                "indicator shown"
            ),
            None => info!("indicator cleared"),
        }
        self.selection.set_filter(filter);
    }

    /// Pick a census year and ask for its figures
    pub fn set_year(&mut self, year: i32) {
        if self.selection.set_year(year) {
            self.generation += 1;
            info!(year, generation = self.generation, "loading demographics");
            self.outbox.push(Request::LoadDemographics {
                year,
                generation: self.generation,
            });
        }
    }

    pub fn next_year(&mut self) {
        self.step_year(1);
    }

    pub fn previous_year(&mut self) {
        self.step_year(-1);
    }

    fn step_year(&mut self, step: isize) {
        if self.years.is_empty() {
            return;
        }
        let len = self.years.len() as isize;
        let pos = self
            .selection
            .selected_year()
            .and_then(|y| self.years.iter().position(|&v| v == y))
            .map_or(len - 1, |p| p as isize);
        let year = self.years[(pos + step).rem_euclid(len) as usize];
        self.set_year(year);
    }

    // ---- exports ----

    pub fn export_zone(&mut self) {
        match self.zone_export() {
            Some(target) => self.queue_export(target),
            None => debug!("zone export unavailable for the current selection"),
        }
    }

    pub fn export_all(&mut self) {
        match self.selection.selected_year() {
            Some(year) => self.queue_export(ExportTarget::all(year)),
            None => debug!("no census year selected, export skipped"),
        }
    }

    fn queue_export(&mut self, target: ExportTarget) {
        info!(file = %target.file_name(), "export requested");
        self.outbox.push(Request::Export {
            target,
            dir: self.export_dir.clone(),
        });
    }

    // ---- toggles ----

    pub fn toggle_names(&mut self) {
        self.show_names = !self.show_names;
    }

    pub fn toggle_logs(&mut self) {
        self.show_logs = !self.show_logs;
        self.sync_viewport();
    }

    /// Map, key statistics, concepts, then back to the map
    pub fn toggle_page(&mut self) {
        self.page = match self.page {
            Page::Map => Page::Stats,
            Page::Stats => Page::Concepts,
            Page::Concepts => Page::Map,
        };
    }

    /// Esc: the error modal first, then the search box, then the panel
    pub fn escape(&mut self) {
        if self.notifications.is_blocking() {
            self.notifications.dismiss();
        } else if self.search.is_active() {
            self.search.close();
        } else if self.detail_open {
            self.close_detail();
        }
    }

    // ---- camera ----

    /// Pan the map
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
        self.selection.zoom_changed(self.viewport.zoom);
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
        self.selection.zoom_changed(self.viewport.zoom);
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        if let Some((x, y)) = self.map_cell(col, row) {
            self.viewport.zoom_in_at(x as i32 * 2, y as i32 * 4);
            self.selection.zoom_changed(self.viewport.zoom);
        }
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        if let Some((x, y)) = self.map_cell(col, row) {
            self.viewport.zoom_out_at(x as i32 * 2, y as i32 * 4);
            self.selection.zoom_changed(self.viewport.zoom);
        }
    }

    pub fn begin_drag(&mut self, col: u16, row: u16) {
        self.last_mouse = Some((col, row));
        self.dragged = false;
    }

    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - x as i32;
            let dy = last_y as i32 - y as i32;
            // One cell of mouse travel moves the map one cell
            self.pan(dx * 2, dy * 4);
            self.dragged |= dx != 0 || dy != 0;
        }
        self.last_mouse = Some((x, y));
    }

    /// Mouse release; a press without movement counts as a click
    pub fn end_drag(&mut self, col: u16, row: u16) {
        let clicked = self.last_mouse.is_some() && !self.dragged;
        self.last_mouse = None;
        self.dragged = false;
        if clicked && self.page == Page::Map {
            self.click_at(col, row);
        }
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Current center coordinates as a string
    pub fn center_coords(&self) -> String {
        format!(
            "{:.2}°{}, {:.2}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }
}
