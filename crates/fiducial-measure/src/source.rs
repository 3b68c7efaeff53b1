//! Where frames come from.
//!
//! Live camera capture is outside this crate; anything that can hand over
//! RGB frames one at a time implements [`FrameSource`].

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageReader, RgbImage};
use log::debug;

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("failed to open image {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to list frames in {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A stream of frames. `None` ends the stream; an `Err` item is one bad
/// frame, not the end of the stream.
pub trait FrameSource {
    fn next_frame(&mut self) -> Option<Result<RgbImage, SourceError>>;
}

pub fn load_frame(path: &Path) -> Result<RgbImage, SourceError> {
    let reader = ImageReader::open(path).map_err(|source| SourceError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let img = reader.decode().map_err(|source| SourceError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(img.to_rgb8())
}

/// Single still image, yielded once.
#[derive(Clone, Debug)]
pub struct ImageFileSource {
    path: Option<PathBuf>,
}

impl ImageFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}

impl FrameSource for ImageFileSource {
    fn next_frame(&mut self) -> Option<Result<RgbImage, SourceError>> {
        self.path.take().map(|p| load_frame(&p))
    }
}

/// Ordered list of image files replayed as a capture.
#[derive(Clone, Debug, Default)]
pub struct ImageSequenceSource {
    paths: VecDeque<PathBuf>,
}

impl ImageSequenceSource {
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
        }
    }

    /// All image files directly inside `dir`, sorted by file name.
    pub fn from_dir(dir: &Path) -> Result<Self, SourceError> {
        let read_dir_err = |source| SourceError::ReadDir {
            path: dir.to_path_buf(),
            source,
        };
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(read_dir_err)? {
            let path = entry.map_err(read_dir_err)?.path();
            if path.is_file() && has_image_extension(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        debug!("found {} frames in {}", paths.len(), dir.display());
        Ok(Self::new(paths))
    }

    /// Frames not yet yielded.
    pub fn remaining(&self) -> usize {
        self.paths.len()
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Option<Result<RgbImage, SourceError>> {
        let path = self.paths.pop_front()?;
        Some(load_frame(&path))
    }
}

/// In-memory frames, mostly useful for tests and embedding.
impl FrameSource for VecDeque<RgbImage> {
    fn next_frame(&mut self) -> Option<Result<RgbImage, SourceError>> {
        self.pop_front().map(Ok)
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
}
