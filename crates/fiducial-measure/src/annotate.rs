//! Geometric overlays for exported frames.

use std::path::{Path, PathBuf};

use fiducial_measure_metrology::Measurement;
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_circle_mut,
    draw_hollow_polygon_mut, draw_line_segment_mut,
};
use imageproc::point::Point;
use imageproc::rect::Rect;
use nalgebra::Point2;

use crate::{FrameReport, PipelineError, StillReport};

const MARKER_COLOR: Rgb<u8> = Rgb([255, 0, 255]);
const OUTLINE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const CENTER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const DIAMETER_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const STATUS_OK: Rgb<u8> = Rgb([0, 200, 0]);
const STATUS_ROUGH: Rgb<u8> = Rgb([255, 140, 0]);
const STATUS_SIZE: u32 = 16;
const CENTER_RADIUS: i32 = 5;

/// Copy of `frame` with the marker, every measurement and a status square.
///
/// The status square (top-left) is green for a marker or manual scale and
/// orange for an approximate one.
pub fn annotate(frame: &RgbImage, report: &StillReport) -> RgbImage {
    let mut out = frame.clone();
    if let Some(marker) = &report.marker {
        draw_quad(&mut out, &marker.corners, MARKER_COLOR);
    }
    draw_measurements(&mut out, &report.measurements);
    draw_status(&mut out, !report.is_approximate());
    out
}

/// Same overlay for one frame of a capture session; the status square is
/// orange while the session awaits a marker.
pub fn annotate_frame(frame: &RgbImage, report: &FrameReport) -> RgbImage {
    let mut out = frame.clone();
    if let Some(marker) = &report.marker {
        draw_quad(&mut out, &marker.corners, MARKER_COLOR);
    }
    draw_measurements(&mut out, &report.measurements);
    draw_status(
        &mut out,
        report.state.is_calibrated() && report.failure.is_none(),
    );
    out
}

/// `<dir>/<prefix><file name>` next to `input`.
pub fn annotated_output_path(input: &Path, prefix: &str) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame.png".to_string());
    input.with_file_name(format!("{prefix}{name}"))
}

pub fn save_annotated(image: &RgbImage, path: &Path) -> Result<(), PipelineError> {
    image.save(path).map_err(|source| PipelineError::Export {
        path: path.to_path_buf(),
        source,
    })
}

fn draw_measurements(img: &mut RgbImage, measurements: &[Measurement]) {
    for m in measurements {
        match m {
            Measurement::Box(b) => draw_quad(img, &b.corners, OUTLINE_COLOR),
            Measurement::Circle(c) => {
                let (cx, cy) = (c.center.x, c.center.y);
                draw_hollow_circle_mut(
                    img,
                    (cx.round() as i32, cy.round() as i32),
                    c.radius_px.round() as i32,
                    OUTLINE_COLOR,
                );
                draw_line_segment_mut(
                    img,
                    (cx - c.radius_px, cy),
                    (cx + c.radius_px, cy),
                    DIAMETER_COLOR,
                );
            }
        }
        let center = m.center();
        draw_filled_circle_mut(
            img,
            (center.x.round() as i32, center.y.round() as i32),
            CENTER_RADIUS,
            CENTER_COLOR,
        );
    }
}

fn draw_quad(img: &mut RgbImage, corners: &[Point2<f32>; 4], color: Rgb<u8>) {
    let poly = corners.map(|p| Point::new(p.x, p.y));
    // imageproc rejects a path whose last point repeats the first; a quad
    // collapsed that way is at most a segment.
    if poly[0] == poly[3] {
        draw_line_segment_mut(img, (poly[0].x, poly[0].y), (poly[1].x, poly[1].y), color);
        return;
    }
    draw_hollow_polygon_mut(img, &poly, color);
}

fn draw_status(img: &mut RgbImage, reliable: bool) {
    let color = if reliable { STATUS_OK } else { STATUS_ROUGH };
    draw_filled_rect_mut(
        img,
        Rect::at(4, 4).of_size(STATUS_SIZE, STATUS_SIZE),
        color,
    );
}
