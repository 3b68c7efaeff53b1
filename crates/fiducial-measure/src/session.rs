//! Continuous capture: per-frame calibration with smoothed marker size.

use std::ops::ControlFlow;

use fiducial_measure_core::MarkerDetection;
use fiducial_measure_metrology::{
    correction_factor, marker_size, select_marker, CalibrationError, GeometryMeasurer,
    MarkerSizeSmoother, ScaleCalibrator,
};
use fiducial_measure_segment::{BackgroundSegmenter, SegmentMode};
use image::RgbImage;
use log::{debug, info, warn};
use serde::Serialize;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::still::measurer_for;
use crate::{
    CaptureState, ConfigError, FrameFailure, FrameReport, FrameSource, MarkerDetector,
    MeasureConfig, SkippedContour, SourceError,
};

/// Owns everything that persists between frames of one capture.
///
/// Objects are measured with oriented boxes. Every calibrated frame pushes
/// its marker size into the smoother, and measurements are multiplied by
/// `marker_side_length / smoothed_marker_width`.
#[derive(Clone, Debug)]
pub struct CaptureSession {
    calibrator: ScaleCalibrator,
    segmenter: BackgroundSegmenter,
    measurer: GeometryMeasurer,
    smoother: MarkerSizeSmoother,
    state: CaptureState,
    frames_seen: usize,
}

impl CaptureSession {
    pub fn new(config: &MeasureConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            calibrator: config.calibrator(),
            segmenter: BackgroundSegmenter::new(SegmentMode::Object, config.segment.clone())?,
            measurer: measurer_for(SegmentMode::Object),
            smoother: MarkerSizeSmoother::new(config.smoothing_window_size),
            state: CaptureState::AwaitingMarker,
            frames_seen: 0,
        })
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn smoother(&self) -> &MarkerSizeSmoother {
        &self.smoother
    }

    pub fn frames_seen(&self) -> usize {
        self.frames_seen
    }

    /// Process one frame and advance the session.
    ///
    /// Never fails: calibration and segmentation problems end up in
    /// [`FrameReport::failure`] and the session keeps going.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(frame = self.frames_seen, markers = detections.len()))
    )]
    pub fn process_frame(
        &mut self,
        frame: &RgbImage,
        detections: &[MarkerDetection],
    ) -> FrameReport {
        let mut report = FrameReport::new(self.frames_seen);
        self.frames_seen += 1;

        let Some(marker) = select_marker(detections, self.calibrator.selection()) else {
            return self.lose_marker(report, CalibrationError::NoScaleAvailable);
        };
        let ratio = match self.calibrator.calibrate(Some(marker), None) {
            Ok(ratio) => ratio,
            Err(e) => return self.lose_marker(report, e),
        };

        if !self.state.is_calibrated() {
            info!(
                "frame {}: marker {:?} acquired, {:.4} px/unit",
                report.index,
                marker.id,
                ratio.px_per_unit()
            );
        }
        self.state = CaptureState::Calibrated {
            ratio,
            marker_id: marker.id,
        };
        report.state = self.state;
        report.marker = Some(marker.clone());

        let raw = marker_size(marker, ratio);
        let smoothed = self.smoother.push(raw);
        report.marker_size = Some(raw);
        report.smoothed_marker_size = Some(smoothed);
        report.correction_factor =
            correction_factor(self.calibrator.marker_side_length(), smoothed.width);
        let factor = report.correction_factor.unwrap_or_else(|| {
            warn!(
                "frame {}: no correction factor for smoothed width {}",
                report.index, smoothed.width
            );
            1.0
        });

        let contours = match self.segmenter.segment(frame) {
            Ok(contours) => contours,
            Err(e) => {
                warn!("frame {}: segmentation failed: {e}", report.index);
                report.failure = Some(FrameFailure::Segmentation(e));
                return report;
            }
        };
        for (index, contour) in contours.iter().enumerate() {
            match self.measurer.measure(contour, ratio) {
                Ok(m) => report.measurements.push(m.corrected(factor)),
                Err(e) => {
                    warn!("frame {}: skipping contour {index}: {e}", report.index);
                    report
                        .skipped
                        .push(SkippedContour::new(index, contour.len(), &e));
                }
            }
        }
        debug!(
            "frame {}: {} objects, correction {:.4}",
            report.index,
            report.measurements.len(),
            factor
        );
        report
    }

    fn lose_marker(&mut self, mut report: FrameReport, err: CalibrationError) -> FrameReport {
        match err {
            CalibrationError::NoScaleAvailable => debug!("frame {}: no marker", report.index),
            _ => warn!("frame {}: {err}", report.index),
        }
        if self.state.is_calibrated() {
            info!("frame {}: marker lost", report.index);
        }
        self.state = CaptureState::AwaitingMarker;
        report.state = self.state;
        report.failure = Some(FrameFailure::Calibration(err));
        report
    }
}

/// Totals of a finished [`run_session`] loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub frames: usize,
    pub calibrated_frames: usize,
    pub measurements: usize,
    /// The sink stopped the loop before the source ran dry.
    pub cancelled: bool,
}

/// Drive `session` over every frame of `source`.
///
/// Each frame is detected, processed and handed to `sink` together with its
/// report; returning [`ControlFlow::Break`] stops the loop. A frame the
/// source cannot produce ends the loop with an error.
pub fn run_session<S, D, F>(
    source: &mut S,
    detector: &mut D,
    session: &mut CaptureSession,
    mut sink: F,
) -> Result<SessionSummary, SourceError>
where
    S: FrameSource + ?Sized,
    D: MarkerDetector + ?Sized,
    F: FnMut(&RgbImage, &FrameReport) -> ControlFlow<()>,
{
    let mut summary = SessionSummary::default();
    while let Some(next) = source.next_frame() {
        let frame = next.inspect_err(|e| warn!("capture stopped: {e}"))?;
        let detections = detector.detect(&frame);
        let report = session.process_frame(&frame, &detections);

        summary.frames += 1;
        if report.state.is_calibrated() {
            summary.calibrated_frames += 1;
        }
        summary.measurements += report.measurements.len();

        if sink(&frame, &report).is_break() {
            info!("capture cancelled after {} frames", summary.frames);
            summary.cancelled = true;
            break;
        }
    }
    info!(
        "capture finished: {} frames, {} calibrated, {} measurements",
        summary.frames, summary.calibrated_frames, summary.measurements
    );
    Ok(summary)
}
