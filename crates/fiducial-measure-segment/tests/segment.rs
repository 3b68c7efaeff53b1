use fiducial_measure_segment::{BackgroundSegmenter, SegmentMode, SegmenterParams};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;

const BACKGROUND: Rgb<u8> = Rgb([232, 228, 225]);
const INK: Rgb<u8> = Rgb([30, 28, 35]);

fn objects_scene() -> RgbImage {
    let mut img = RgbImage::from_pixel(400, 300, BACKGROUND);
    draw_filled_rect_mut(&mut img, Rect::at(40, 30).of_size(120, 60), INK);
    draw_filled_rect_mut(&mut img, Rect::at(220, 160).of_size(90, 90), INK);
    // Speck well below the area threshold.
    draw_filled_rect_mut(&mut img, Rect::at(330, 40).of_size(12, 12), INK);
    img
}

fn trunks_scene() -> RgbImage {
    let mut img = RgbImage::from_pixel(500, 420, BACKGROUND);
    draw_filled_circle_mut(&mut img, (110, 110), 60, INK);
    draw_filled_circle_mut(&mut img, (340, 250), 80, INK);
    // Too small.
    draw_filled_circle_mut(&mut img, (400, 70), 25, INK);
    // Large but elongated.
    draw_filled_rect_mut(&mut img, Rect::at(30, 370).of_size(300, 25), INK);
    img
}

#[test]
fn object_mode_keeps_large_regions_in_extraction_order() {
    let seg = BackgroundSegmenter::objects();
    let contours = seg.segment(&objects_scene()).expect("segment");
    assert_eq!(contours.len(), 2);

    // Raster-order extraction: the upper rectangle is found first.
    let (a, b) = (&contours[0], &contours[1]);
    assert!((a.area() - 119.0 * 59.0).abs() < 1.0, "area {}", a.area());
    assert!((b.area() - 89.0 * 89.0).abs() < 1.0, "area {}", b.area());
}

#[test]
fn segmenting_twice_is_idempotent() {
    let img = objects_scene();
    let seg = BackgroundSegmenter::objects();
    let first = seg.segment(&img).expect("first");
    let second = seg.segment(&img).expect("second");
    assert_eq!(first, second);

    let trunk = BackgroundSegmenter::trunks();
    let img = trunks_scene();
    assert_eq!(trunk.segment(&img).unwrap(), trunk.segment(&img).unwrap());
}

#[test]
fn trunk_mode_filters_by_area_and_circularity_and_sorts_by_area() {
    let seg = BackgroundSegmenter::trunks();
    let contours = seg.segment(&trunks_scene()).expect("segment");
    let areas: Vec<f64> = contours.iter().map(|c| c.area()).collect();
    assert_eq!(contours.len(), 2, "areas: {areas:?}");

    assert!(contours[0].area() > contours[1].area());
    for c in &contours {
        assert!(c.circularity().unwrap() > 0.4);
        assert!(c.area() > 5000.0);
    }
    let big = std::f64::consts::PI * 80.0 * 80.0;
    assert!((contours[0].area() - big).abs() / big < 0.1);
}

#[test]
fn blank_frame_yields_no_contours() {
    let img = RgbImage::from_pixel(64, 48, BACKGROUND);
    for mode in [SegmentMode::Object, SegmentMode::Trunk] {
        let seg = BackgroundSegmenter::new(mode, SegmenterParams::default()).unwrap();
        assert!(seg.segment(&img).unwrap().is_empty());
    }
}

#[test]
fn mask_marks_dark_object_border() {
    let seg = BackgroundSegmenter::objects();
    let mask = seg.foreground_mask(&objects_scene()).unwrap();
    assert_eq!(mask.get_pixel(40, 60)[0], 255);
    assert_eq!(mask.get_pixel(20, 20)[0], 0);
}
