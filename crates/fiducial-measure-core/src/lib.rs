//! Core types and utilities for marker-scaled object measurement.
//!
//! Only point geometry lives here: no image buffers, no marker decoding and
//! no segmentation. Contour metrics lean on `imageproc::geometry`. The other `fiducial-measure-*` crates share these types.

mod contour;
mod geometry;
mod logger;
mod marker;
mod scale;

pub use contour::Contour;
pub use geometry::{min_area_rect, min_enclosing_circle, Circle, RotatedRect};
pub use imageproc::point::Point;
pub use marker::MarkerDetection;
pub use scale::{InvalidScaleRatio, ScaleRatio};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
