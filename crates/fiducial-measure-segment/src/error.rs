/// Errors returned by the background segmenter.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SegmentationError {
    #[error("invalid frame (width={width}, height={height})")]
    InvalidFrame { width: u32, height: u32 },
    #[error("invalid segmentation parameter {name}: {reason}")]
    InvalidParams { name: &'static str, reason: String },
}
