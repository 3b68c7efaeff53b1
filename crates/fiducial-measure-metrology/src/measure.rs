//! Contour geometry to physical units.

use std::f64::consts::PI;

use fiducial_measure_core::{min_area_rect, min_enclosing_circle, Contour, ScaleRatio};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::MeasurementError;

/// Oriented bounding box of one object.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoxMeasurement {
    /// Box center in image pixels.
    pub center: Point2<f32>,
    /// Physical size along `angle_deg`.
    pub width: f64,
    /// Physical size perpendicular to `angle_deg`.
    pub height: f64,
    /// Informational only; never used to correct the sizes.
    pub angle_deg: f32,
    pub width_px: f32,
    pub height_px: f32,
    /// Box corners in image pixels.
    pub corners: [Point2<f32>; 4],
}

impl BoxMeasurement {
    /// Scale the physical sizes by `factor` (pixel fields are untouched).
    pub fn corrected(mut self, factor: f64) -> Self {
        self.width *= factor;
        self.height *= factor;
        self
    }
}

/// Minimal enclosing circle of one roughly round object.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CircleMeasurement {
    /// Circle center in image pixels.
    pub center: Point2<f32>,
    pub radius_px: f32,
    pub diameter: f64,
    /// `π · diameter`, what a tape around the object would read.
    pub circumference: f64,
    /// `π · (diameter / 2)²`.
    pub cross_section_area: f64,
}

impl CircleMeasurement {
    fn from_diameter(center: Point2<f32>, radius_px: f32, diameter: f64) -> Self {
        let r = 0.5 * diameter;
        Self {
            center,
            radius_px,
            diameter,
            circumference: PI * diameter,
            cross_section_area: PI * r * r,
        }
    }

    /// Scale the physical sizes by `factor`; the area scales with `factor²`.
    pub fn corrected(self, factor: f64) -> Self {
        Self::from_diameter(self.center, self.radius_px, self.diameter * factor)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Measurement {
    Box(BoxMeasurement),
    Circle(CircleMeasurement),
}

impl Measurement {
    pub fn center(&self) -> Point2<f32> {
        match self {
            Measurement::Box(b) => b.center,
            Measurement::Circle(c) => c.center,
        }
    }

    pub fn corrected(self, factor: f64) -> Self {
        match self {
            Measurement::Box(b) => Measurement::Box(b.corrected(factor)),
            Measurement::Circle(c) => Measurement::Circle(c.corrected(factor)),
        }
    }
}

/// How a contour is turned into a measurement.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryMeasurer {
    /// Minimum-area oriented rectangle: width and height.
    #[default]
    OrientedBox,
    /// Minimal enclosing circle: diameter.
    EnclosingCircle,
}

impl GeometryMeasurer {
    pub fn measure(
        &self,
        contour: &Contour,
        ratio: ScaleRatio,
    ) -> Result<Measurement, MeasurementError> {
        match self {
            GeometryMeasurer::OrientedBox => measure_box(contour, ratio).map(Measurement::Box),
            GeometryMeasurer::EnclosingCircle => {
                measure_circle(contour, ratio).map(Measurement::Circle)
            }
        }
    }
}

fn measure_box(contour: &Contour, ratio: ScaleRatio) -> Result<BoxMeasurement, MeasurementError> {
    const REQUIRED: usize = 3;
    let degenerate = MeasurementError::DegenerateContour {
        points: contour.len(),
        required: REQUIRED,
    };
    if contour.len() < REQUIRED {
        return Err(degenerate);
    }
    let rect = min_area_rect(contour.hull()).ok_or(degenerate)?;
    Ok(BoxMeasurement {
        center: rect.center,
        width: ratio.to_units(rect.width as f64).max(0.0),
        height: ratio.to_units(rect.height as f64).max(0.0),
        angle_deg: rect.angle_deg,
        width_px: rect.width,
        height_px: rect.height,
        corners: rect.corners(),
    })
}

fn measure_circle(
    contour: &Contour,
    ratio: ScaleRatio,
) -> Result<CircleMeasurement, MeasurementError> {
    let circle =
        min_enclosing_circle(contour.hull()).ok_or(MeasurementError::DegenerateContour {
            points: 0,
            required: 1,
        })?;
    let diameter = ratio.to_units(2.0 * circle.radius as f64).max(0.0);
    Ok(CircleMeasurement::from_diameter(
        circle.center,
        circle.radius,
        diameter,
    ))
}

/// Measure the straight span between two picked points as a diameter.
pub fn measure_span(p0: Point2<f32>, p1: Point2<f32>, ratio: ScaleRatio) -> CircleMeasurement {
    let span_px = (p1 - p0).norm();
    let center = Point2::from((p0.coords + p1.coords) * 0.5);
    CircleMeasurement::from_diameter(center, 0.5 * span_px, ratio.to_units(span_px as f64))
}
