use std::f64::consts::PI;

use glam::DVec2;

use crate::catalog::Bounds;
use crate::state::INITIAL_ZOOM;

pub const MIN_ZOOM: f64 = 5.0;
pub const MAX_ZOOM: f64 = 13.0;

/// Braille pixels per world width at zoom 0
const TILE_SIZE: f64 = 128.0;

/// Center of the initial view
const INITIAL_CENTER: (f64, f64) = (-10.5, 20.5);

/// The camera center never leaves this box
pub fn country_bounds() -> Bounds {
    Bounds::new(-17.5, 14.5, -4.5, 27.5)
}

/// Longitude to normalized Web Mercator x in [0, 1]
fn mercator_x(lon: f64) -> f64 {
    (lon + 180.0) / 360.0
}

/// Latitude to normalized Web Mercator y in [0, 1], north up
fn mercator_y(lat: f64) -> f64 {
    let lat_rad = lat * PI / 180.0;
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0
}

fn inverse_mercator(x: f64, y: f64) -> (f64, f64) {
    let lon = x * 360.0 - 180.0;
    let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
    (lon, lat_rad * 180.0 / PI)
}

/// Viewport representing the visible map area and zoom level
#[derive(Clone, Debug)]
pub struct Viewport {
    /// Center longitude
    pub center_lon: f64,
    /// Center latitude
    pub center_lat: f64,
    /// Slippy-map zoom level, integer steps between MIN_ZOOM and MAX_ZOOM
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        let mut vp = Self {
            center_lon,
            center_lat,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            width,
            height,
        };
        vp.clamp_center();
        vp
    }

    /// Whole country at the opening zoom
    pub fn initial(width: usize, height: usize) -> Self {
        Self::new(INITIAL_CENTER.0, INITIAL_CENTER.1, INITIAL_ZOOM, width, height)
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
    }

    /// Pixels per normalized world unit
    fn scale(&self) -> f64 {
        TILE_SIZE * 2f64.powf(self.zoom)
    }

    fn center_mercator(&self) -> DVec2 {
        DVec2::new(mercator_x(self.center_lon), mercator_y(self.center_lat))
    }

    fn set_center_mercator(&mut self, m: DVec2) {
        let (lon, lat) = inverse_mercator(m.x, m.y);
        self.center_lon = lon;
        self.center_lat = lat;
        self.clamp_center();
    }

    fn clamp_center(&mut self) {
        let b = country_bounds();
        self.center_lon = self.center_lon.clamp(b.min.x, b.max.x);
        self.center_lat = self.center_lat.clamp(b.min.y, b.max.y);
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let scale = self.scale();
        let center = self.center_mercator() + DVec2::new(dx as f64 / scale, dy as f64 / scale);
        self.set_center_mercator(center);
    }

    /// Zoom in one level
    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + 1.0);
    }

    /// Zoom out one level
    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - 1.0);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, -1.0);
    }

    /// Zoom by `delta` levels keeping the point under the cursor fixed
    fn zoom_at(&mut self, px: i32, py: i32, delta: f64) {
        // Get the geographic coordinates under the mouse
        let (lon, lat) = self.unproject(px, py);

        self.set_zoom(self.zoom + delta);

        // Calculate where that point would now project to
        let (new_px, new_py) = self.project(lon, lat);

        // Pan to bring it back under the mouse
        self.pan(new_px - px, new_py - py);
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.round().clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Center on `bounds` at the largest whole zoom that shows all of it,
    /// but no closer than `max_zoom`
    pub fn fit_bounds(&mut self, bounds: &Bounds, max_zoom: f64) {
        let min = DVec2::new(mercator_x(bounds.min.x), mercator_y(bounds.max.y));
        let max = DVec2::new(mercator_x(bounds.max.x), mercator_y(bounds.min.y));
        let span = (max - min).max(DVec2::splat(f64::EPSILON));

        let fit_x = (self.width.max(1) as f64 / (span.x * TILE_SIZE)).log2();
        let fit_y = (self.height.max(1) as f64 / (span.y * TILE_SIZE)).log2();
        let zoom = fit_x.min(fit_y).floor().min(max_zoom);

        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        self.set_center_mercator((min + max) * 0.5);
    }

    /// Unproject pixel coordinates back to geographic coordinates (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        self.unproject_f(px as f64, py as f64)
    }

    /// Unproject fractional pixel coordinates
    pub fn unproject_f(&self, px: f64, py: f64) -> (f64, f64) {
        let scale = self.scale();
        let center = self.center_mercator();
        let x = (px - self.width as f64 / 2.0) / scale + center.x;
        let y = (py - self.height as f64 / 2.0) / scale + center.y;
        inverse_mercator(x, y)
    }

    /// Project a geographic coordinate (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let scale = self.scale();
        let center = self.center_mercator();
        let px = ((mercator_x(lon) - center.x) * scale + self.width as f64 / 2.0).floor() as i32;
        let py = ((mercator_y(lat) - center.y) * scale + self.height as f64 / 2.0).floor() as i32;
        (px, py)
    }

    /// Geographic extent currently on screen
    pub fn visible_bounds(&self) -> Bounds {
        let (west, north) = self.unproject(0, 0);
        let (east, south) = self.unproject(self.width as i32, self.height as i32);
        Bounds::new(west, south, east, north)
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }

    /// Clip a pixel segment to the canvas plus a one pixel margin (Liang-Barsky).
    /// Returns None when no part of it is on screen.
    pub fn clip_line(&self, p1: (i32, i32), p2: (i32, i32)) -> Option<((i32, i32), (i32, i32))> {
        if !self.line_might_be_visible(p1, p2) {
            return None;
        }
        let (x0, y0) = (p1.0 as f64, p1.1 as f64);
        let (dx, dy) = ((p2.0 - p1.0) as f64, (p2.1 - p1.1) as f64);
        let (min_x, max_x) = (-1.0, self.width as f64);
        let (min_y, max_y) = (-1.0, self.height as f64);

        let mut t0 = 0.0_f64;
        let mut t1 = 1.0_f64;
        for (p, q) in [(-dx, x0 - min_x), (dx, max_x - x0), (-dy, y0 - min_y), (dy, max_y - y0)] {
            if p == 0.0 {
                // Parallel to this edge and outside it
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let t = q / p;
            if p < 0.0 {
                t0 = t0.max(t);
            } else {
                t1 = t1.min(t);
            }
            if t0 > t1 {
                return None;
            }
        }

        let at = |t: f64| ((x0 + t * dx).round() as i32, (y0 + t * dy).round() as i32);
        Some((at(t0), at(t1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_center() {
        let vp = Viewport::new(-10.0, 20.0, 6.0, 100, 100);
        let (x, y) = vp.project(-10.0, 20.0);
        assert_eq!(x, 50);
        assert_eq!(y, 50);
    }

    #[test]
    fn test_unproject_roundtrip_near_center() {
        let vp = Viewport::initial(200, 120);
        let (px, py) = vp.project(-12.0, 18.0);
        let (lon, lat) = vp.unproject(px, py);
        // One pixel at zoom 6 is well under a tenth of a degree
        assert!((lon + 12.0).abs() < 0.1);
        assert!((lat - 18.0).abs() < 0.1);
    }

    #[test]
    fn test_initial_view() {
        let vp = Viewport::initial(100, 100);
        assert_eq!(vp.zoom, 6.0);
        assert_eq!(vp.center_lon, -10.5);
        assert_eq!(vp.center_lat, 20.5);
    }

    #[test]
    fn test_pan_moves_and_clamps() {
        let mut vp = Viewport::initial(100, 100);
        vp.pan(10, 0);
        assert!(vp.center_lon > -10.5);
        vp.pan(0, -10);
        assert!(vp.center_lat > 20.5);

        for _ in 0..1000 {
            vp.pan(500, -500);
        }
        assert_eq!(vp.center_lon, -4.5);
        assert_eq!(vp.center_lat, 27.5);
    }

    #[test]
    fn test_zoom_steps_are_clamped() {
        let mut vp = Viewport::initial(100, 100);
        for _ in 0..20 {
            vp.zoom_in();
        }
        assert_eq!(vp.zoom, MAX_ZOOM);
        for _ in 0..20 {
            vp.zoom_out();
        }
        assert_eq!(vp.zoom, MIN_ZOOM);
        vp.set_zoom(7.4);
        assert_eq!(vp.zoom, 7.0);
    }

    #[test]
    fn test_zoom_at_keeps_cursor_point() {
        let mut vp = Viewport::initial(400, 400);
        let (lon, lat) = vp.unproject(250, 180);
        vp.zoom_in_at(250, 180);
        assert_eq!(vp.zoom, 7.0);
        let (px, py) = vp.project(lon, lat);
        assert!((px - 250).abs() <= 1);
        assert!((py - 180).abs() <= 1);
    }

    #[test]
    fn test_clip_line_keeps_on_screen_part() {
        let vp = Viewport::new(-10.0, 20.0, 6.0, 100, 80);
        // Vertical segment far longer than the canvas
        let (a, b) = vp.clip_line((50, -5000), (50, 5000)).unwrap();
        assert_eq!(a, (50, -1));
        assert_eq!(b, (50, 80));
        // Fully inside stays untouched
        assert_eq!(vp.clip_line((10, 10), (20, 30)), Some(((10, 10), (20, 30))));
        // Off to the side
        assert!(vp.clip_line((-50, -5000), (-50, 5000)).is_none());
        // Diagonal passing outside the top-left corner
        assert!(vp.clip_line((-10, 5), (5, -10)).is_none());
    }

    #[test]
    fn test_fit_bounds_small_zone_hits_max_zoom() {
        let mut vp = Viewport::initial(200, 200);
        vp.fit_bounds(&Bounds::new(-16.0, 18.0, -15.99, 18.01), 10.0);
        assert_eq!(vp.zoom, 10.0);
        assert!((vp.center_lon + 15.995).abs() < 1e-6);
    }

    #[test]
    fn test_fit_bounds_contains_zone() {
        let mut vp = Viewport::initial(200, 160);
        let bounds = Bounds::new(-12.0, 16.0, -8.0, 20.0);
        vp.fit_bounds(&bounds, 10.0);
        assert!(vp.zoom < 10.0);
        let (x0, y0) = vp.project(bounds.min.x, bounds.max.y);
        let (x1, y1) = vp.project(bounds.max.x, bounds.min.y);
        assert!(x0 >= 0 && y0 >= 0);
        assert!(x1 <= 200 && y1 <= 160);
    }
}
