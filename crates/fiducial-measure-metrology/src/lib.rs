//! Scale calibration, contour measurement and temporal smoothing.
//!
//! - [`ScaleCalibrator`] turns a detected marker (or an operator-supplied
//!   reference) into a pixels-per-unit [`ScaleRatio`].
//! - [`GeometryMeasurer`] converts a contour into physical width/height or
//!   diameter using that ratio.
//! - [`SmoothingWindow`] / [`MarkerSizeSmoother`] damp per-frame jitter in
//!   continuous capture.
//!
//! [`ScaleRatio`]: fiducial_measure_core::ScaleRatio

mod calibrate;
mod error;
mod measure;
mod smoothing;

pub use calibrate::{
    calibrate, calibrate_from_detections, marker_perimeter_ratio, marker_size, select_marker,
    ManualCalibration, MarkerSelection, MarkerSize, ScaleCalibrator,
};
pub use error::{CalibrationError, MeasurementError};
pub use measure::{measure_span, BoxMeasurement, CircleMeasurement, GeometryMeasurer, Measurement};
pub use smoothing::{correction_factor, MarkerSizeSmoother, SmoothingWindow, DEFAULT_WINDOW_SIZE};
