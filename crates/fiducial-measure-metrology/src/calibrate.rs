//! Pixels-per-unit calibration from a marker's perimeter or a manual reference.

use fiducial_measure_core::{MarkerDetection, ScaleRatio};
use log::debug;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::CalibrationError;

/// Operator-supplied reference: `pixel_span` pixels measure `real_length` units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ManualCalibration {
    pub pixel_span: f64,
    pub real_length: f64,
}

impl ManualCalibration {
    pub fn new(pixel_span: f64, real_length: f64) -> Self {
        Self {
            pixel_span,
            real_length,
        }
    }

    /// `pixel_span / real_length`, refusing zero, negative or non-finite inputs.
    pub fn ratio(&self) -> Result<ScaleRatio, CalibrationError> {
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if !usable(self.pixel_span) || !usable(self.real_length) {
            return Err(CalibrationError::NoScaleAvailable);
        }
        ScaleRatio::new(self.pixel_span / self.real_length)
            .map_err(|_| CalibrationError::NoScaleAvailable)
    }
}

/// Which marker drives calibration when a frame holds several.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerSelection {
    /// The detector's first detection wins.
    #[default]
    First,
    /// Smallest marker id wins; detections without id rank last. Ties keep
    /// detector order.
    LowestId,
}

/// Pick the calibration marker among `detections`.
pub fn select_marker(
    detections: &[MarkerDetection],
    selection: MarkerSelection,
) -> Option<&MarkerDetection> {
    match selection {
        MarkerSelection::First => detections.first(),
        MarkerSelection::LowestId => detections
            .iter()
            .min_by_key(|d| d.id.map_or((1, 0), |id| (0, id))),
    }
}

/// `perimeter_px / known_real_perimeter` for one marker.
pub fn marker_perimeter_ratio(
    detection: &MarkerDetection,
    known_real_perimeter: f64,
) -> Result<ScaleRatio, CalibrationError> {
    if !known_real_perimeter.is_finite() || known_real_perimeter <= 0.0 {
        return Err(CalibrationError::InvalidReference {
            value: known_real_perimeter,
        });
    }
    let perimeter_px = detection.perimeter_px();
    if !perimeter_px.is_finite() || perimeter_px <= 0.0 {
        return Err(CalibrationError::DegenerateMarker { perimeter_px });
    }
    ScaleRatio::new(perimeter_px / known_real_perimeter)
        .map_err(|_| CalibrationError::DegenerateMarker { perimeter_px })
}

/// Resolve a scale ratio from a marker detection or, failing that, a manual
/// reference.
///
/// A present but degenerate marker is an error; it never falls through to the
/// manual reference.
pub fn calibrate(
    detection: Option<&MarkerDetection>,
    known_real_perimeter: f64,
    manual: Option<ManualCalibration>,
) -> Result<ScaleRatio, CalibrationError> {
    match (detection, manual) {
        (Some(marker), _) => marker_perimeter_ratio(marker, known_real_perimeter),
        (None, Some(manual)) => manual.ratio(),
        (None, None) => Err(CalibrationError::NoScaleAvailable),
    }
}

/// [`calibrate`] with the marker picked from a whole frame's detections.
/// Returns the ratio and the marker that produced it (`None` when the manual
/// reference was used).
pub fn calibrate_from_detections<'a>(
    detections: &'a [MarkerDetection],
    selection: MarkerSelection,
    known_real_perimeter: f64,
    manual: Option<ManualCalibration>,
) -> Result<(ScaleRatio, Option<&'a MarkerDetection>), CalibrationError> {
    let marker = select_marker(detections, selection);
    let ratio = calibrate(marker, known_real_perimeter, manual)?;
    Ok((ratio, marker))
}

/// Physical size of a detected marker: edge 0→1 (width) and 1→2 (height).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerSize {
    pub width: f64,
    pub height: f64,
}

pub fn marker_size(detection: &MarkerDetection, ratio: ScaleRatio) -> MarkerSize {
    let edges = detection.edge_lengths();
    MarkerSize {
        width: ratio.to_units(edges[0]),
        height: ratio.to_units(edges[1]),
    }
}

/// Calibrator bound to one physical marker size and selection policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleCalibrator {
    marker_side_length: f64,
    selection: MarkerSelection,
}

impl ScaleCalibrator {
    pub fn new(marker_side_length: f64, selection: MarkerSelection) -> Self {
        Self {
            marker_side_length,
            selection,
        }
    }

    pub fn marker_side_length(&self) -> f64 {
        self.marker_side_length
    }

    pub fn selection(&self) -> MarkerSelection {
        self.selection
    }

    /// Real perimeter of the square marker: four times its side.
    pub fn known_real_perimeter(&self) -> f64 {
        4.0 * self.marker_side_length
    }

    pub fn calibrate(
        &self,
        detection: Option<&MarkerDetection>,
        manual: Option<ManualCalibration>,
    ) -> Result<ScaleRatio, CalibrationError> {
        calibrate(detection, self.known_real_perimeter(), manual)
    }

    /// Calibrate from all detections of one frame.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, detections, manual), fields(markers = detections.len()))
    )]
    pub fn calibrate_frame<'a>(
        &self,
        detections: &'a [MarkerDetection],
        manual: Option<ManualCalibration>,
    ) -> Result<(ScaleRatio, Option<&'a MarkerDetection>), CalibrationError> {
        let (ratio, marker) = calibrate_from_detections(
            detections,
            self.selection,
            self.known_real_perimeter(),
            manual,
        )?;
        debug!(
            "calibrated {:.4} px/unit from {} ({} markers in frame)",
            ratio.px_per_unit(),
            if marker.is_some() { "marker" } else { "manual reference" },
            detections.len()
        );
        Ok((ratio, marker))
    }
}

impl Default for ScaleCalibrator {
    fn default() -> Self {
        Self::new(23.5, MarkerSelection::First)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point2;

    fn square(x0: f32, y0: f32, side: f32, id: Option<u32>) -> MarkerDetection {
        MarkerDetection::new(
            [
                Point2::new(x0, y0),
                Point2::new(x0 + side, y0),
                Point2::new(x0 + side, y0 + side),
                Point2::new(x0, y0 + side),
            ],
            id,
        )
    }

    #[test]
    fn square_marker_ratio() {
        let m = square(50.0, 50.0, 100.0, Some(0));
        let ratio = calibrate(Some(&m), 94.0, None).unwrap();
        assert_relative_eq!(ratio.px_per_unit(), 400.0 / 94.0, epsilon = 1e-12);
        assert_relative_eq!(ratio.px_per_unit(), 4.255, epsilon = 1e-3);
    }

    #[test]
    fn ratio_equals_edge_sum_over_perimeter_for_skewed_quad() {
        let m = MarkerDetection::new(
            [
                Point2::new(10.0, 12.0),
                Point2::new(95.0, 20.0),
                Point2::new(90.0, 101.0),
                Point2::new(5.0, 96.0),
            ],
            None,
        );
        let expected: f64 = m.edge_lengths().iter().sum::<f64>() / 94.0;
        let ratio = calibrate(Some(&m), 94.0, None).unwrap();
        assert!(ratio.px_per_unit() > 0.0);
        assert_relative_eq!(ratio.px_per_unit(), expected, epsilon = 1e-12);
    }

    #[test]
    fn collapsed_marker_is_degenerate() {
        let m = square(10.0, 10.0, 0.0, None);
        assert!(matches!(
            calibrate(Some(&m), 94.0, Some(ManualCalibration::new(100.0, 10.0))),
            Err(CalibrationError::DegenerateMarker { .. })
        ));
    }

    #[test]
    fn manual_reference_is_used_without_marker() {
        let ratio = calibrate(None, 94.0, Some(ManualCalibration::new(450.0, 50.0))).unwrap();
        assert_relative_eq!(ratio.px_per_unit(), 9.0);
    }

    #[test]
    fn zero_manual_reference_never_yields_inf_or_nan() {
        for manual in [
            ManualCalibration::new(100.0, 0.0),
            ManualCalibration::new(0.0, 10.0),
            ManualCalibration::new(f64::NAN, 10.0),
            ManualCalibration::new(100.0, -2.0),
        ] {
            assert_eq!(
                calibrate(None, 94.0, Some(manual)),
                Err(CalibrationError::NoScaleAvailable)
            );
        }
    }

    #[test]
    fn nothing_to_calibrate_from() {
        assert_eq!(
            calibrate(None, 94.0, None),
            Err(CalibrationError::NoScaleAvailable)
        );
    }

    #[test]
    fn zero_known_perimeter_is_rejected() {
        let m = square(0.0, 0.0, 10.0, None);
        assert_eq!(
            calibrate(Some(&m), 0.0, None),
            Err(CalibrationError::InvalidReference { value: 0.0 })
        );
    }

    #[test]
    fn first_detection_wins_by_default() {
        let markers = [
            square(0.0, 0.0, 100.0, Some(9)),
            square(200.0, 0.0, 50.0, Some(2)),
        ];
        let calibrator = ScaleCalibrator::default();
        let (ratio, used) = calibrator.calibrate_frame(&markers, None).unwrap();
        assert_eq!(used.and_then(|m| m.id), Some(9));
        assert_relative_eq!(ratio.px_per_unit(), 400.0 / 94.0, epsilon = 1e-12);
    }

    #[test]
    fn lowest_id_selection_is_opt_in() {
        let markers = [
            square(0.0, 0.0, 100.0, None),
            square(0.0, 0.0, 100.0, Some(9)),
            square(200.0, 0.0, 50.0, Some(2)),
        ];
        let picked = select_marker(&markers, MarkerSelection::LowestId).unwrap();
        assert_eq!(picked.id, Some(2));
        assert!(select_marker(&[], MarkerSelection::LowestId).is_none());
    }

    #[test]
    fn marker_size_in_units() {
        let m = square(0.0, 0.0, 94.0, None);
        let ratio = ScaleRatio::new(4.0).unwrap();
        let size = marker_size(&m, ratio);
        assert_relative_eq!(size.width, 23.5);
        assert_relative_eq!(size.height, 23.5);
    }
}
