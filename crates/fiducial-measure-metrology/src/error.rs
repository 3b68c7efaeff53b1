/// Errors returned by scale calibration.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum CalibrationError {
    #[error("no marker detected and no usable manual reference")]
    NoScaleAvailable,
    #[error("degenerate marker (perimeter {perimeter_px} px)")]
    DegenerateMarker { perimeter_px: f64 },
    #[error("known marker perimeter must be positive and finite (got {value})")]
    InvalidReference { value: f64 },
}

/// Errors returned when measuring a single contour.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementError {
    #[error("degenerate contour ({points} points, need at least {required})")]
    DegenerateContour { points: usize, required: usize },
}
