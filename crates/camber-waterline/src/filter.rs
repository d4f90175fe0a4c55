//! Collinear-run filtering of CL point sequences.
//!
//! Waterline loops and line paths contain long runs of nearly collinear
//! CL points; the filter drops every point that deviates less than a
//! tolerance from the segment between its kept neighbors.

use camber_geom::Point3;

/// Distance from `p` to the segment `a`-`b`.
fn deviation(p: &Point3, a: &Point3, b: &Point3) -> f64 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 == 0.0 {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    let proj = a + ab * t;
    (p - proj).norm()
}

/// Filter an open polyline; the endpoints are always kept.
pub fn filter_polyline(points: &[Point3], tolerance: f64) -> Vec<Point3> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let mut out: Vec<Point3> = vec![points[0]];
    for k in 1..points.len() - 1 {
        let anchor = *out.last().expect("anchor point");
        if deviation(&points[k], &anchor, &points[k + 1]) > tolerance {
            out.push(points[k]);
        }
    }
    out.push(points[points.len() - 1]);
    out
}

/// Filter a closed loop (the closing edge from last back to first is
/// implied). At least a triangle is kept when the input had one.
pub fn filter_loop(points: &[Point3], tolerance: f64) -> Vec<Point3> {
    if points.len() <= 3 {
        return points.to_vec();
    }
    let n = points.len();
    let mut keep = vec![true; n];
    let mut kept = n;
    // repeated passes until stable; each pass tests every surviving
    // point against its surviving neighbors
    loop {
        let mut removed_any = false;
        for k in 0..n {
            if !keep[k] || kept <= 3 {
                continue;
            }
            let prev = (0..n)
                .map(|d| (k + n - 1 - d) % n)
                .find(|&j| keep[j])
                .expect("kept predecessor");
            let next = (0..n)
                .map(|d| (k + 1 + d) % n)
                .find(|&j| keep[j])
                .expect("kept successor");
            if prev == k || next == k {
                continue;
            }
            if deviation(&points[k], &points[prev], &points[next]) <= tolerance {
                keep[k] = false;
                kept -= 1;
                removed_any = true;
            }
        }
        if !removed_any {
            break;
        }
    }
    points
        .iter()
        .zip(&keep)
        .filter_map(|(p, &k)| k.then_some(*p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polyline_removes_collinear_run() {
        let pts: Vec<Point3> = (0..=10).map(|k| Point3::new(k as f64, 0.0, 0.0)).collect();
        let out = filter_polyline(&pts, 1e-6);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], pts[0]);
        assert_eq!(out[1], pts[10]);
    }

    #[test]
    fn test_polyline_keeps_corners() {
        let pts = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(5.0, 0.0, 0.0),
            Point3::new(5.0, 5.0, 0.0),
            Point3::new(0.0, 5.0, 0.0),
        ];
        let out = filter_polyline(&pts, 1e-6);
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_polyline_tolerance_smooths_jitter() {
        let pts = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.001, 0.0),
            Point3::new(2.0, -0.001, 0.0),
            Point3::new(3.0, 0.0, 0.0),
        ];
        assert_eq!(filter_polyline(&pts, 0.01).len(), 2);
        assert_eq!(filter_polyline(&pts, 1e-6).len(), 4);
    }

    #[test]
    fn test_loop_filter_square_with_edge_midpoints() {
        let pts = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.5, 0.0, 0.0),
            Point3::new(5.0, 0.0, 0.0),
            Point3::new(5.0, 5.0, 0.0),
            Point3::new(2.5, 5.0, 0.0),
            Point3::new(0.0, 5.0, 0.0),
        ];
        let out = filter_loop(&pts, 1e-6);
        assert_eq!(out.len(), 4);
        // corners survive
        assert!(out.contains(&Point3::new(0.0, 0.0, 0.0)));
        assert!(out.contains(&Point3::new(5.0, 0.0, 0.0)));
        assert!(out.contains(&Point3::new(5.0, 5.0, 0.0)));
        assert!(out.contains(&Point3::new(0.0, 5.0, 0.0)));
    }

    #[test]
    fn test_loop_filter_never_collapses_below_triangle() {
        // all points on one line; a degenerate loop still keeps 3
        let pts: Vec<Point3> = (0..6).map(|k| Point3::new(k as f64, 0.0, 0.0)).collect();
        let out = filter_loop(&pts, 0.1);
        assert_eq!(out.len(), 3);
    }
}
