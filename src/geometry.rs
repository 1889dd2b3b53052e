//! Pure hit-testing primitives shared by selection and shape dispatch.

use pixmark_scene::Point;

/// Point-in-rectangle test, edges inclusive.
pub fn point_in_rect(px: f64, py: f64, x: f64, y: f64, w: f64, h: f64) -> bool {
    px >= x && px <= x + w && py >= y && py <= y + h
}

/// Point-in-polygon test using ray casting (odd crossing count).
///
/// The closing edge between the last and first vertex is implicit. Fewer
/// than three vertices never contain anything.
pub fn point_in_polygon(px: f64, py: f64, vertices: &[Point]) -> bool {
    if vertices.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let (vi, vj) = (vertices[i], vertices[j]);
        if ((vi.y > py) != (vj.y > py)) && (px < (vj.x - vi.x) * (py - vi.y) / (vj.y - vi.y) + vi.x)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Euclidean distance from a point to the closed segment `a`-`b`.
///
/// The projection parameter is clamped to `[0, 1]`; a zero-length segment
/// degenerates to point distance.
pub fn distance_to_segment(px: f64, py: f64, ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    let dx = bx - ax;
    let dy = by - ay;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return (px - ax).hypot(py - ay);
    }
    let t = (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0);
    (px - (ax + t * dx)).hypot(py - (ay + t * dy))
}

/// True when the point is strictly closer than `threshold` to any
/// consecutive segment of the polyline. Fewer than two points never match.
pub fn near_polyline(px: f64, py: f64, points: &[Point], threshold: f64) -> bool {
    points
        .windows(2)
        .any(|seg| distance_to_segment(px, py, seg[0].x, seg[0].y, seg[1].x, seg[1].y) < threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ]
    }

    #[test]
    fn test_point_in_rect_inclusive_edges() {
        assert!(point_in_rect(5.0, 5.0, 0.0, 0.0, 10.0, 10.0));
        assert!(point_in_rect(0.0, 0.0, 0.0, 0.0, 10.0, 10.0));
        assert!(point_in_rect(10.0, 10.0, 0.0, 0.0, 10.0, 10.0));
        assert!(!point_in_rect(10.001, 5.0, 0.0, 0.0, 10.0, 10.0));
        assert!(!point_in_rect(-0.001, 5.0, 0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn test_unit_square_polygon() {
        let square = unit_square();
        assert!(point_in_polygon(0.5, 0.5, &square));
        assert!(!point_in_polygon(1.5, 0.5, &square));
        assert!(!point_in_polygon(0.5, -0.5, &square));
    }

    #[test]
    fn test_degenerate_polygons_contain_nothing() {
        assert!(!point_in_polygon(0.0, 0.0, &[]));
        assert!(!point_in_polygon(
            0.0,
            0.0,
            &[Point::new(0.0, 0.0), Point::new(1.0, 1.0)]
        ));
    }

    #[test]
    fn test_concave_polygon() {
        // L-shape; the notch is outside
        let l_shape = vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 2.0),
            Point::new(2.0, 2.0),
            Point::new(2.0, 4.0),
            Point::new(0.0, 4.0),
        ];
        assert!(point_in_polygon(1.0, 3.0, &l_shape));
        assert!(point_in_polygon(3.0, 1.0, &l_shape));
        assert!(!point_in_polygon(3.0, 3.0, &l_shape));
    }

    #[test]
    fn test_distance_to_segment_above_midpoint() {
        let d = distance_to_segment(5.0, 5.0, 0.0, 0.0, 10.0, 0.0);
        assert_eq!(d, 5.0);
    }

    #[test]
    fn test_distance_to_segment_clamps_to_endpoint() {
        let d = distance_to_segment(-3.0, 0.0, 0.0, 0.0, 10.0, 0.0);
        assert_eq!(d, 3.0);
        let d = distance_to_segment(13.0, 4.0, 0.0, 0.0, 10.0, 0.0);
        assert_eq!(d, 5.0);
    }

    #[test]
    fn test_distance_to_degenerate_segment() {
        let d = distance_to_segment(3.0, 4.0, 0.0, 0.0, 0.0, 0.0);
        assert_eq!(d, 5.0);
    }

    #[test]
    fn test_near_polyline() {
        let path = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ];
        assert!(near_polyline(5.0, 3.0, &path, 10.0));
        assert!(near_polyline(12.0, 5.0, &path, 2.5));
        assert!(!near_polyline(5.0, 30.0, &path, 10.0));
        assert!(!near_polyline(0.0, 0.0, &[Point::new(0.0, 0.0)], 10.0));
    }

    #[test]
    fn test_near_polyline_threshold_is_exclusive() {
        // Distance exactly equal to the threshold is a miss
        let path = vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)];
        assert!(!near_polyline(50.0, 10.0, &path, 10.0));
        assert!(near_polyline(50.0, 9.999, &path, 10.0));
    }
}
