//! Background segmentation for marker-scaled measurement.
//!
//! Objects are assumed to sit on a roughly homogeneous background. A local
//! (adaptive) threshold turns "darker than the neighbourhood" into foreground,
//! outer borders are traced into [`Contour`]s and filtered by area, and in
//! trunk mode additionally by circularity.
//!
//! [`Contour`]: fiducial_measure_core::Contour

mod error;
mod params;
mod segmenter;
mod threshold;

pub use error::SegmentationError;
pub use params::{ObjectSegmentParams, SegmentMode, SegmenterParams, TrunkSegmentParams};
pub use segmenter::{external_contours, BackgroundSegmenter};
pub use threshold::{adaptive_threshold_inv, gaussian_sigma_for_kernel, AdaptiveMethod};
