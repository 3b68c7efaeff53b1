use imageproc::geometry::{arc_length, contour_area, convex_hull};
use imageproc::point::Point;
use nalgebra::Point2;

/// Outer border of one connected foreground region, in image pixels.
///
/// Area, closed perimeter and convex hull are computed once at construction;
/// area and perimeter are in pixel units (px² and px).
#[derive(Clone, Debug, PartialEq)]
pub struct Contour {
    points: Vec<Point<i32>>,
    hull: Vec<Point2<f32>>,
    area: f64,
    perimeter: f64,
}

impl Contour {
    /// Build from border pixels in tracing order.
    pub fn new(points: Vec<Point<i32>>) -> Self {
        let area = contour_area(&points);
        let perimeter = arc_length(&points, true);

        // Traced borders revisit pixels on one-pixel-wide spurs.
        let mut unique = points.clone();
        unique.sort_by_key(|p| (p.y, p.x));
        unique.dedup();
        let hull = convex_hull(unique)
            .into_iter()
            .map(|p| Point2::new(p.x as f32, p.y as f32))
            .collect();

        Self {
            points,
            hull,
            area,
            perimeter,
        }
    }

    pub fn points(&self) -> &[Point<i32>] {
        &self.points
    }

    /// Convex hull vertices in order, without repeated or collinear points.
    pub fn hull(&self) -> &[Point2<f32>] {
        &self.hull
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn perimeter(&self) -> f64 {
        self.perimeter
    }

    /// `4π·area / perimeter²`: 1.0 for a perfect circle, lower for elongated
    /// or ragged shapes. `None` when the perimeter is zero.
    pub fn circularity(&self) -> Option<f64> {
        if self.perimeter <= 0.0 {
            return None;
        }
        Some(4.0 * std::f64::consts::PI * self.area / (self.perimeter * self.perimeter))
    }
}
