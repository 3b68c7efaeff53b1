//! Measure real-world sizes of objects photographed next to a fiducial
//! marker of known size.
//!
//! This crate provides:
//! - re-exports of the `fiducial-measure-*` building blocks
//! - the still-image pipeline ([`measure_still`]) and the continuous capture
//!   session ([`CaptureSession`], [`run_session`])
//! - frame sources, a replayable marker recording and overlay export
//!
//! ## Quickstart
//!
//! ```no_run
//! use fiducial_measure::{load_frame, measure_still, MarkerRecording, MeasureConfig, SegmentMode};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let frame = load_frame(Path::new("desk.jpg"))?;
//! let markers = MarkerRecording::from_json_file(Path::new("desk.markers.json"))?;
//! let report = measure_still(
//!     &frame,
//!     markers.frame(0),
//!     None,
//!     SegmentMode::Object,
//!     &MeasureConfig::default(),
//! )?;
//! println!("{} objects", report.measurements.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `fiducial_measure::core`: geometry, contours, marker detections, scale ratio, logging.
//! - `fiducial_measure::segment`: adaptive-threshold background segmentation.
//! - `fiducial_measure::metrology`: calibration, contour measurement, smoothing.

pub use fiducial_measure_core as core;
pub use fiducial_measure_metrology as metrology;
pub use fiducial_measure_segment as segment;

mod annotate;
mod config;
mod detector;
mod error;
mod report;
mod session;
mod source;
mod still;

pub use annotate::{annotate, annotate_frame, annotated_output_path, save_annotated};
pub use config::{ConfigError, MarkerParams, MeasureConfig};
pub use detector::{MarkerDetector, MarkerRecording, NoMarkers, RecordedDetector, RecordingError};
pub use error::PipelineError;
pub use report::{CaptureState, FrameFailure, FrameReport, ScaleSource, SkippedContour, StillReport};
pub use session::{run_session, CaptureSession, SessionSummary};
pub use source::{load_frame, FrameSource, ImageFileSource, ImageSequenceSource, SourceError};
pub use still::{measure_prepared, measure_still, prepare_frame, PreparedFrame};

pub use fiducial_measure_core::{MarkerDetection, ScaleRatio};
pub use fiducial_measure_metrology::{ManualCalibration, MarkerSelection, Measurement};
pub use fiducial_measure_segment::SegmentMode;
