//! Serializable pipeline results.

use fiducial_measure_core::{MarkerDetection, ScaleRatio};
use fiducial_measure_metrology::{CalibrationError, MarkerSize, Measurement, MeasurementError};
use fiducial_measure_segment::{SegmentMode, SegmentationError};
use serde::{Deserialize, Serialize, Serializer};

/// Where the scale ratio of a result came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScaleSource {
    Marker { id: Option<u32> },
    Manual,
    /// Configured fallback ratio; measurements are rough estimates.
    Approximate,
}

/// A contour that was segmented but could not be measured.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkippedContour {
    /// Position in the segmenter's output.
    pub index: usize,
    pub points: usize,
    pub reason: String,
}

impl SkippedContour {
    pub(crate) fn new(index: usize, points: usize, err: &MeasurementError) -> Self {
        Self {
            index,
            points,
            reason: err.to_string(),
        }
    }
}

/// Result of measuring one still image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StillReport {
    pub mode: SegmentMode,
    /// Size of the (possibly downscaled) frame that was measured.
    pub frame_width: u32,
    pub frame_height: u32,
    pub px_per_unit: ScaleRatio,
    pub scale_source: ScaleSource,
    /// Calibration marker, in measured-frame pixels.
    pub marker: Option<MarkerDetection>,
    pub marker_size: Option<MarkerSize>,
    pub measurements: Vec<Measurement>,
    pub skipped: Vec<SkippedContour>,
}

impl StillReport {
    pub fn is_approximate(&self) -> bool {
        self.scale_source == ScaleSource::Approximate
    }
}

/// Marker lock of a continuous capture session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CaptureState {
    /// No usable marker in the last frame; nothing is measured.
    #[default]
    AwaitingMarker,
    Calibrated {
        ratio: ScaleRatio,
        marker_id: Option<u32>,
    },
}

impl CaptureState {
    pub fn is_calibrated(&self) -> bool {
        matches!(self, CaptureState::Calibrated { .. })
    }

    pub fn ratio(&self) -> Option<ScaleRatio> {
        match self {
            CaptureState::AwaitingMarker => None,
            CaptureState::Calibrated { ratio, .. } => Some(*ratio),
        }
    }
}

/// Recoverable per-frame failure in a capture session.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FrameFailure {
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
    #[error(transparent)]
    Segmentation(#[from] SegmentationError),
}

/// Result of one frame of a capture session.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameReport {
    pub index: usize,
    /// Session state after this frame.
    pub state: CaptureState,
    pub marker: Option<MarkerDetection>,
    /// This frame's marker size in physical units.
    pub marker_size: Option<MarkerSize>,
    /// Moving average including this frame.
    pub smoothed_marker_size: Option<MarkerSize>,
    /// Factor already applied to `measurements`.
    pub correction_factor: Option<f64>,
    pub measurements: Vec<Measurement>,
    pub skipped: Vec<SkippedContour>,
    #[serde(serialize_with = "failure_message")]
    pub failure: Option<FrameFailure>,
}

impl FrameReport {
    pub(crate) fn new(index: usize) -> Self {
        Self {
            index,
            state: CaptureState::AwaitingMarker,
            marker: None,
            marker_size: None,
            smoothed_marker_size: None,
            correction_factor: None,
            measurements: Vec::new(),
            skipped: Vec::new(),
            failure: None,
        }
    }
}

fn failure_message<S: Serializer>(
    failure: &Option<FrameFailure>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match failure {
        Some(f) => serializer.serialize_some(&f.to_string()),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_serializes_with_tag() {
        let state = CaptureState::Calibrated {
            ratio: ScaleRatio::new(4.0).unwrap(),
            marker_id: Some(3),
        };
        let json = serde_json::to_value(state).unwrap();
        assert_eq!(json["state"], "calibrated");
        assert_eq!(json["ratio"], 4.0);
        assert_eq!(state.ratio().map(ScaleRatio::px_per_unit), Some(4.0));
        assert!(!CaptureState::default().is_calibrated());
    }

    #[test]
    fn failure_serializes_as_message() {
        let mut report = FrameReport::new(2);
        report.failure = Some(CalibrationError::NoScaleAvailable.into());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["state"]["state"], "awaiting_marker");
        assert!(json["failure"]
            .as_str()
            .unwrap()
            .contains("no marker detected"));
    }

    #[test]
    fn scale_source_tags() {
        let json = serde_json::to_value(ScaleSource::Marker { id: Some(7) }).unwrap();
        assert_eq!(json["kind"], "marker");
        assert_eq!(json["id"], 7);
        let back: ScaleSource = serde_json::from_str(r#"{"kind": "approximate"}"#).unwrap();
        assert_eq!(back, ScaleSource::Approximate);
    }
}
