use glam::DVec2;

use crate::braille::BrailleCanvas;
use crate::style::Rgb;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgb) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y, color);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Draw a thicker line (selected zone outline)
pub fn draw_thick_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgb) {
    draw_line(canvas, x0, y0, x1, y1, color);
    draw_line(canvas, x0 + 1, y0, x1 + 1, y1, color);
    draw_line(canvas, x0, y0 + 1, x1, y1 + 1, color);
}

/// Even-odd ray casting test. The ring may or may not repeat its first vertex.
pub fn point_in_ring(ring: &[DVec2], p: DVec2) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgb = Rgb(255, 255, 255);

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line(&mut canvas, 0, 0, 9, 0, WHITE);
        // Top dot row of every char is set
        assert_eq!(canvas.to_string(), "⠉⠉⠉⠉⠉");
    }

    #[test]
    fn test_vertical_line() {
        let mut canvas = BrailleCanvas::new(1, 2);
        draw_line(&mut canvas, 0, 0, 0, 7, WHITE);
        assert_eq!(canvas.to_string(), "⡇\n⡇");
    }

    #[test]
    fn test_thick_line_covers_neighbour_column() {
        let mut canvas = BrailleCanvas::new(1, 1);
        draw_thick_line(&mut canvas, 0, 0, 0, 2, WHITE);
        // Columns 0 and 1, rows 0..=3
        assert_eq!(canvas.to_string(), "⣿");
    }

    #[test]
    fn test_point_in_ring() {
        let square = [
            DVec2::new(0.0, 0.0),
            DVec2::new(4.0, 0.0),
            DVec2::new(4.0, 4.0),
            DVec2::new(0.0, 4.0),
        ];
        assert!(point_in_ring(&square, DVec2::new(2.0, 2.0)));
        assert!(!point_in_ring(&square, DVec2::new(5.0, 2.0)));
        assert!(!point_in_ring(&square, DVec2::new(2.0, -0.5)));
        assert!(!point_in_ring(&square[..2], DVec2::new(1.0, 0.0)));
    }

    #[test]
    fn test_point_in_concave_ring() {
        // U shape open at the top
        let ring = [
            DVec2::new(0.0, 0.0),
            DVec2::new(3.0, 0.0),
            DVec2::new(3.0, 3.0),
            DVec2::new(2.0, 3.0),
            DVec2::new(2.0, 1.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(1.0, 3.0),
            DVec2::new(0.0, 3.0),
            DVec2::new(0.0, 0.0),
        ];
        assert!(point_in_ring(&ring, DVec2::new(0.5, 2.5)));
        assert!(!point_in_ring(&ring, DVec2::new(1.5, 2.5)));
        assert!(point_in_ring(&ring, DVec2::new(1.5, 0.5)));
    }
}
