//! One-shot measurement of a still image.

use fiducial_measure_core::{MarkerDetection, ScaleRatio};
use fiducial_measure_metrology::{
    marker_size, CalibrationError, GeometryMeasurer, ManualCalibration,
};
use fiducial_measure_segment::{BackgroundSegmenter, SegmentMode};
use image::imageops::FilterType;
use image::RgbImage;
use log::{debug, info, warn};
use nalgebra::Point2;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{ConfigError, MeasureConfig, PipelineError, ScaleSource, SkippedContour, StillReport};

/// A frame ready for measurement, with the factor it was resized by.
#[derive(Clone, Debug)]
pub struct PreparedFrame {
    pub image: RgbImage,
    /// Measured-frame pixels per input pixel (`1.0` when untouched).
    pub scale: f64,
}

impl PreparedFrame {
    /// Map a detection from input pixels into measured-frame pixels.
    pub fn scale_detection(&self, detection: &MarkerDetection) -> MarkerDetection {
        let s = self.scale as f32;
        MarkerDetection::new(
            detection.corners.map(|p| Point2::new(p.x * s, p.y * s)),
            detection.id,
        )
    }

    pub fn scale_detections(&self, detections: &[MarkerDetection]) -> Vec<MarkerDetection> {
        detections.iter().map(|d| self.scale_detection(d)).collect()
    }

    /// Map a manual reference measured on the input image.
    pub fn scale_manual(&self, manual: ManualCalibration) -> ManualCalibration {
        ManualCalibration::new(manual.pixel_span * self.scale, manual.real_length)
    }
}

/// Downscale `frame` so neither side exceeds `max_dimension`, keeping the
/// aspect ratio. Smaller frames pass through unchanged.
pub fn prepare_frame(frame: RgbImage, max_dimension: Option<u32>) -> PreparedFrame {
    let (w, h) = frame.dimensions();
    let longest = w.max(h);
    let Some(max_dim) = max_dimension.filter(|&m| m > 0 && longest > m) else {
        return PreparedFrame {
            image: frame,
            scale: 1.0,
        };
    };
    let scale = max_dim as f64 / longest as f64;
    let new_w = ((w as f64 * scale) as u32).max(1);
    let new_h = ((h as f64 * scale) as u32).max(1);
    info!("resizing {w}x{h} -> {new_w}x{new_h} (scale {scale:.4})");
    PreparedFrame {
        image: image::imageops::resize(&frame, new_w, new_h, FilterType::Triangle),
        scale,
    }
}

pub(crate) fn measurer_for(mode: SegmentMode) -> GeometryMeasurer {
    match mode {
        SegmentMode::Object => GeometryMeasurer::OrientedBox,
        SegmentMode::Trunk => GeometryMeasurer::EnclosingCircle,
    }
}

/// Downscale `frame` per `config.max_dimension`, map `detections` and
/// `manual` from input pixels onto it, then [`measure_still`].
///
/// Returns the prepared frame alongside the report; the report describes
/// the prepared image, not the input.
pub fn measure_prepared(
    frame: RgbImage,
    detections: &[MarkerDetection],
    manual: Option<ManualCalibration>,
    mode: SegmentMode,
    config: &MeasureConfig,
) -> Result<(PreparedFrame, StillReport), PipelineError> {
    let prepared = prepare_frame(frame, config.max_dimension);
    let detections = prepared.scale_detections(detections);
    let manual = manual.map(|m| prepared.scale_manual(m));
    let report = measure_still(&prepared.image, &detections, manual, mode, config)?;
    Ok((prepared, report))
}

/// Measure every object in one still frame at its current resolution.
///
/// `config.max_dimension` is not applied here; use [`measure_prepared`] for
/// full-size photos. `detections` and `manual` are in `frame` pixels.
/// Calibration prefers the
/// selected marker, then the manual reference. In trunk mode a frame with
/// neither still gets measured with `config.approximate_px_per_unit`, and the
/// report says so.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(mode = ?mode, width = frame.width(), height = frame.height()))
)]
pub fn measure_still(
    frame: &RgbImage,
    detections: &[MarkerDetection],
    manual: Option<ManualCalibration>,
    mode: SegmentMode,
    config: &MeasureConfig,
) -> Result<StillReport, PipelineError> {
    config.validate()?;
    let segmenter = BackgroundSegmenter::new(mode, config.segment.clone())?;

    let (ratio, marker, scale_source) =
        match config.calibrator().calibrate_frame(detections, manual) {
            Ok((ratio, Some(m))) => (ratio, Some(m.clone()), ScaleSource::Marker { id: m.id }),
            Ok((ratio, None)) => (ratio, None, ScaleSource::Manual),
            Err(CalibrationError::NoScaleAvailable) if mode == SegmentMode::Trunk => {
                let ratio = ScaleRatio::new(config.approximate_px_per_unit).map_err(|e| {
                    ConfigError::Invalid {
                        name: "approximate_px_per_unit",
                        reason: e.to_string(),
                    }
                })?;
                warn!(
                    "no marker or manual reference, measuring with approximate scale {} px/unit",
                    ratio.px_per_unit()
                );
                (ratio, None, ScaleSource::Approximate)
            }
            Err(e) => {
                warn!("calibration failed: {e}");
                return Err(e.into());
            }
        };

    let contours = segmenter.segment(frame)?;
    let measurer = measurer_for(mode);
    let mut measurements = Vec::with_capacity(contours.len());
    let mut skipped = Vec::new();
    for (index, contour) in contours.iter().enumerate() {
        match measurer.measure(contour, ratio) {
            Ok(m) => measurements.push(m),
            Err(e) => {
                warn!("skipping contour {index}: {e}");
                skipped.push(SkippedContour::new(index, contour.len(), &e));
            }
        }
    }
    debug!("{} contours, {} skipped", contours.len(), skipped.len());
    info!(
        "measured {} {} at {:.4} px/unit ({:?})",
        measurements.len(),
        match mode {
            SegmentMode::Object => "objects",
            SegmentMode::Trunk => "trunks",
        },
        ratio.px_per_unit(),
        scale_source
    );

    Ok(StillReport {
        mode,
        frame_width: frame.width(),
        frame_height: frame.height(),
        px_per_unit: ratio,
        scale_source,
        marker_size: marker.as_ref().map(|m| marker_size(m, ratio)),
        marker,
        measurements,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use fiducial_measure_metrology::Measurement;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    #[test]
    fn large_frames_are_downscaled_with_aspect() {
        let prepared = prepare_frame(RgbImage::new(2400, 1200), Some(1200));
        assert_eq!(prepared.image.dimensions(), (1200, 600));
        assert_relative_eq!(prepared.scale, 0.5);

        let det = MarkerDetection::new(
            [
                Point2::new(100.0, 100.0),
                Point2::new(300.0, 100.0),
                Point2::new(300.0, 300.0),
                Point2::new(100.0, 300.0),
            ],
            Some(4),
        );
        let scaled = prepared.scale_detection(&det);
        assert_eq!(scaled.corners[2], Point2::new(150.0, 150.0));
        assert_eq!(scaled.id, Some(4));
        assert_relative_eq!(
            prepared
                .scale_manual(ManualCalibration::new(900.0, 100.0))
                .pixel_span,
            450.0
        );
    }

    #[test]
    fn small_frames_pass_through() {
        let prepared = prepare_frame(RgbImage::new(640, 480), Some(1200));
        assert_eq!(prepared.image.dimensions(), (640, 480));
        assert_eq!(prepared.scale, 1.0);
        let unbounded = prepare_frame(RgbImage::new(4000, 10), None);
        assert_eq!(unbounded.image.width(), 4000);
    }

    #[test]
    fn prepared_measurement_downscales_and_maps_the_reference() {
        let mut frame = RgbImage::from_pixel(2400, 1200, image::Rgb([232, 228, 225]));
        draw_filled_rect_mut(
            &mut frame,
            Rect::at(600, 400).of_size(401, 201),
            image::Rgb([30, 28, 35]),
        );
        let config = MeasureConfig {
            max_dimension: Some(1200),
            ..MeasureConfig::default()
        };

        let (prepared, report) = measure_prepared(
            frame,
            &[],
            Some(ManualCalibration::new(900.0, 100.0)),
            SegmentMode::Object,
            &config,
        )
        .unwrap();

        assert_relative_eq!(prepared.scale, 0.5);
        assert_eq!((report.frame_width, report.frame_height), (1200, 600));
        assert_relative_eq!(report.px_per_unit.px_per_unit(), 4.5, epsilon = 1e-9);
        assert_eq!(report.measurements.len(), 1);
        let Measurement::Box(b) = report.measurements[0] else {
            panic!("expected a box");
        };
        assert_relative_eq!(b.width, 400.0 / 9.0, max_relative = 0.03);
        assert_relative_eq!(b.height, 200.0 / 9.0, max_relative = 0.05);
    }

    #[test]
    fn object_mode_without_scale_is_terminal() {
        let frame = RgbImage::from_pixel(64, 64, image::Rgb([200, 200, 200]));
        let err = measure_still(
            &frame,
            &[],
            None,
            SegmentMode::Object,
            &MeasureConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Calibration(CalibrationError::NoScaleAvailable)
        ));
    }

    #[test]
    fn invalid_config_is_rejected_before_measuring() {
        let config = MeasureConfig {
            approximate_px_per_unit: 0.0,
            ..MeasureConfig::default()
        };
        let frame = RgbImage::new(8, 8);
        assert!(matches!(
            measure_still(&frame, &[], None, SegmentMode::Trunk, &config),
            Err(PipelineError::Config(_))
        ));
    }
}
