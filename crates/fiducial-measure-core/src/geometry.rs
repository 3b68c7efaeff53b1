//! Minimum-area oriented rectangle and minimal enclosing circle of a convex
//! hull.
//!
//! Hulls come from `imageproc::geometry::convex_hull` over contour pixels
//! (see [`crate::Contour`]). imageproc's own `min_area_rect` snaps corners to
//! the integer grid and has no enclosing circle, so both fits live here and
//! accumulate in `f64`.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

const CIRCLE_EPS: f64 = 1e-7;

#[inline]
fn to_f64(p: &Point2<f32>) -> Point2<f64> {
    Point2::new(p.x as f64, p.y as f64)
}

#[inline]
fn to_f32(p: Point2<f64>) -> Point2<f32> {
    Point2::new(p.x as f32, p.y as f32)
}

/// Oriented rectangle: `width` runs along `angle_deg`, `height` perpendicular.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotatedRect {
    pub center: Point2<f32>,
    pub width: f32,
    pub height: f32,
    /// Direction of the `width` side in degrees, normalized to `[0, 90)`.
    pub angle_deg: f32,
}

impl RotatedRect {
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Box corners, walking around the rectangle starting from the
    /// `(-width/2, -height/2)` corner in the rectangle's own frame.
    pub fn corners(&self) -> [Point2<f32>; 4] {
        let (s, c) = (self.angle_deg as f64).to_radians().sin_cos();
        let u = Vector2::new(c, s) * (0.5 * self.width as f64);
        let v = Vector2::new(-s, c) * (0.5 * self.height as f64);
        let o = to_f64(&self.center);
        [o - u - v, o + u - v, o + u + v, o - u + v].map(to_f32)
    }
}

/// Minimum-area enclosing rectangle via rotating calipers.
///
/// `hull` must list the vertices of a convex polygon in order (either
/// winding). Returns `None` for an empty hull; a two-point hull yields a
/// zero-height rectangle.
pub fn min_area_rect(hull: &[Point2<f32>]) -> Option<RotatedRect> {
    let hull: Vec<Point2<f64>> = hull.iter().map(to_f64).collect();
    match hull.len() {
        0 => return None,
        1 => {
            return Some(RotatedRect {
                center: to_f32(hull[0]),
                width: 0.0,
                height: 0.0,
                angle_deg: 0.0,
            })
        }
        _ => {}
    }

    let n = hull.len();
    let mut best: Option<(f64, Vector2<f64>, f64, f64, f64, f64)> = None;
    for i in 0..n {
        let edge = hull[(i + 1) % n] - hull[i];
        let len = edge.norm();
        if len <= f64::EPSILON {
            continue;
        }
        let u = edge / len;
        let v = Vector2::new(-u.y, u.x);

        let (mut min_u, mut max_u) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_v, mut max_v) = (f64::INFINITY, f64::NEG_INFINITY);
        for p in &hull {
            let d = p.coords;
            let pu = d.dot(&u);
            let pv = d.dot(&v);
            min_u = min_u.min(pu);
            max_u = max_u.max(pu);
            min_v = min_v.min(pv);
            max_v = max_v.max(pv);
        }
        let area = (max_u - min_u) * (max_v - min_v);
        if best.map(|b| area < b.0).unwrap_or(true) {
            best = Some((area, u, min_u, max_u, min_v, max_v));
        }
    }

    let (_, u, min_u, max_u, min_v, max_v) = best?;
    let v = Vector2::new(-u.y, u.x);
    let center = u * (0.5 * (min_u + max_u)) + v * (0.5 * (min_v + max_v));
    let mut width = max_u - min_u;
    let mut height = max_v - min_v;

    let mut angle = u.y.atan2(u.x).to_degrees();
    while angle < 0.0 {
        angle += 180.0;
    }
    while angle >= 180.0 {
        angle -= 180.0;
    }
    if angle >= 90.0 {
        angle -= 90.0;
        std::mem::swap(&mut width, &mut height);
    }

    Some(RotatedRect {
        center: Point2::new(center.x as f32, center.y as f32),
        width: width as f32,
        height: height as f32,
        angle_deg: angle as f32,
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point2<f32>,
    pub radius: f32,
}

#[derive(Clone, Copy)]
struct CircleF64 {
    c: Point2<f64>,
    r: f64,
}

impl CircleF64 {
    fn contains(&self, p: Point2<f64>) -> bool {
        (p - self.c).norm() <= self.r + CIRCLE_EPS * self.r.max(1.0)
    }

    fn from_two(a: Point2<f64>, b: Point2<f64>) -> Self {
        let c = Point2::from((a.coords + b.coords) * 0.5);
        Self {
            c,
            r: (a - c).norm(),
        }
    }

    fn from_three(a: Point2<f64>, b: Point2<f64>, p: Point2<f64>) -> Self {
        let d = 2.0 * (a.x * (b.y - p.y) + b.x * (p.y - a.y) + p.x * (a.y - b.y));
        if d.abs() < 1e-12 {
            // Collinear: the widest pair spans the set.
            return [Self::from_two(a, b), Self::from_two(a, p), Self::from_two(b, p)]
                .into_iter()
                .fold(Self::from_two(a, b), |acc, c| if c.r > acc.r { c } else { acc });
        }
        let a2 = a.coords.norm_squared();
        let b2 = b.coords.norm_squared();
        let p2 = p.coords.norm_squared();
        let ux = (a2 * (b.y - p.y) + b2 * (p.y - a.y) + p2 * (a.y - b.y)) / d;
        let uy = (a2 * (p.x - b.x) + b2 * (a.x - p.x) + p2 * (b.x - a.x)) / d;
        let c = Point2::new(ux, uy);
        Self {
            c,
            r: (a - c).norm(),
        }
    }
}

/// Smallest circle containing every point (incremental Welzl).
///
/// Any point set works; passing the hull keeps the cubic worst case small.
/// Returns `None` for an empty point set.
pub fn min_enclosing_circle(points: &[Point2<f32>]) -> Option<Circle> {
    let pts: Vec<Point2<f64>> = points.iter().map(to_f64).collect();
    let first = *pts.first()?;

    let mut circle = CircleF64 { c: first, r: 0.0 };
    for i in 1..pts.len() {
        if circle.contains(pts[i]) {
            continue;
        }
        circle = CircleF64 { c: pts[i], r: 0.0 };
        for j in 0..i {
            if circle.contains(pts[j]) {
                continue;
            }
            circle = CircleF64::from_two(pts[i], pts[j]);
            for k in 0..j {
                if !circle.contains(pts[k]) {
                    circle = CircleF64::from_three(pts[i], pts[j], pts[k]);
                }
            }
        }
    }

    Some(Circle {
        center: to_f32(circle.c),
        radius: circle.r as f32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rect_points(x0: f32, y0: f32, w: f32, h: f32) -> Vec<Point2<f32>> {
        vec![
            Point2::new(x0, y0),
            Point2::new(x0 + w, y0),
            Point2::new(x0 + w, y0 + h),
            Point2::new(x0, y0 + h),
        ]
    }

    fn ring(cx: f32, cy: f32, r: f32, n: usize) -> Vec<Point2<f32>> {
        (0..n)
            .map(|k| {
                let t = std::f32::consts::TAU * k as f32 / n as f32;
                Point2::new(cx + r * t.cos(), cy + r * t.sin())
            })
            .collect()
    }

    #[test]
    fn min_area_rect_axis_aligned() {
        let pts = rect_points(20.0, 30.0, 200.0, 100.0);
        let r = min_area_rect(&pts).unwrap();
        assert_relative_eq!(r.width, 200.0, epsilon = 1e-3);
        assert_relative_eq!(r.height, 100.0, epsilon = 1e-3);
        assert_relative_eq!(r.center.x, 120.0, epsilon = 1e-3);
        assert_relative_eq!(r.center.y, 80.0, epsilon = 1e-3);
        assert_relative_eq!(r.angle_deg, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn min_area_rect_rotated_square_diamond() {
        // Diamond: a 45-degree square with diagonal 100.
        let pts = vec![
            Point2::new(50.0, 0.0),
            Point2::new(100.0, 50.0),
            Point2::new(50.0, 100.0),
            Point2::new(0.0, 50.0),
        ];
        let r = min_area_rect(&pts).unwrap();
        let side = 100.0 / 2f32.sqrt();
        assert_relative_eq!(r.width, side, epsilon = 1e-3);
        assert_relative_eq!(r.height, side, epsilon = 1e-3);
        assert_relative_eq!(r.angle_deg, 45.0, epsilon = 1e-3);
        let corners = r.corners();
        for c in corners {
            assert!(pts.iter().any(|p| (p - c).norm() < 1e-2));
        }
    }

    #[test]
    fn min_area_rect_follows_rotation() {
        let (s, c) = 30f32.to_radians().sin_cos();
        let pts: Vec<Point2<f32>> = [(-100.0, -50.0), (100.0, -50.0), (100.0, 50.0), (-100.0, 50.0)]
            .into_iter()
            .map(|(x, y)| Point2::new(300.0 + c * x - s * y, 200.0 + s * x + c * y))
            .collect();
        let r = min_area_rect(&pts).unwrap();
        assert_relative_eq!(r.width, 200.0, epsilon = 1e-2);
        assert_relative_eq!(r.height, 100.0, epsilon = 1e-2);
        assert_relative_eq!(r.angle_deg, 30.0, epsilon = 1e-3);
        assert_relative_eq!(r.center.x, 300.0, epsilon = 1e-2);
    }

    #[test]
    fn min_area_rect_empty_and_single() {
        assert!(min_area_rect(&[]).is_none());
        let r = min_area_rect(&[Point2::new(3.0, 4.0)]).unwrap();
        assert_eq!(r.width, 0.0);
        assert_eq!(r.center, Point2::new(3.0, 4.0));
    }

    #[test]
    fn enclosing_circle_of_ring() {
        let pts = ring(100.0, 120.0, 50.0, 72);
        let c = min_enclosing_circle(&pts).unwrap();
        assert_relative_eq!(c.radius, 50.0, epsilon = 1e-3);
        assert_relative_eq!(c.center.x, 100.0, epsilon = 1e-3);
        assert_relative_eq!(c.center.y, 120.0, epsilon = 1e-3);
    }

    #[test]
    fn enclosing_circle_collinear_points() {
        let pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(5.0, 0.0),
            Point2::new(10.0, 0.0),
        ];
        let c = min_enclosing_circle(&pts).unwrap();
        assert_relative_eq!(c.radius, 5.0, epsilon = 1e-4);
        assert_relative_eq!(c.center.x, 5.0, epsilon = 1e-4);
    }

    #[test]
    fn enclosing_circle_contains_every_point() {
        let pts = vec![
            Point2::new(3.0, 7.0),
            Point2::new(-4.0, 2.0),
            Point2::new(9.0, -1.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 12.0),
            Point2::new(6.0, 6.0),
        ];
        let c = min_enclosing_circle(&pts).unwrap();
        for p in &pts {
            assert!((p - c.center).norm() <= c.radius + 1e-3);
        }
    }
}
