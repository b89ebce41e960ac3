mod geometry;
mod projection;
mod renderer;
mod spatial;

pub use geometry::point_in_ring;
pub use projection::Viewport;
pub use renderer::{label_at, MapFrame, MapRenderer, Scene};
