use laser_core::Pixel;
use laser_detect::{
    DetectionArea, DetectorSettings, Frame, LaserDetector, PixelLayout, Strategy,
};
use log::*;

const BACKGROUND: [u8; 3] = [40, 40, 40];
const DOT: [u8; 3] = [255, 60, 60];

/// Builds a BGRA buffer filled with `background`, with the given RGB pixels painted on top.
fn bgra(width: u32, height: u32, background: [u8; 3], paint: &[(u32, u32, [u8; 3])]) -> Vec<u8> {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for _ in 0..width * height {
        data.extend_from_slice(&[background[2], background[1], background[0], 255]);
    }
    for &(x, y, [r, g, b]) in paint {
        let start = ((y * width + x) * 4) as usize;
        data[start..start + 4].copy_from_slice(&[b, g, r, 255]);
    }
    data
}

fn detector(strategy: Strategy) -> LaserDetector {
    LaserDetector::new(DetectorSettings {
        area: DetectionArea::default(),
        strategy,
    })
}

#[test]
fn single_dot_is_found_by_both_strategies() {
    let _ = pretty_env_logger::try_init_timed();
    let data = bgra(64, 48, BACKGROUND, &[(37, 21, DOT)]);
    let frame = Frame::new(&data, 64, 48, PixelLayout::Bgra8).unwrap();
    for strategy in [Strategy::Fast, Strategy::Accurate] {
        info!("detecting with {:?}", strategy);
        let detector = detector(strategy);
        assert_eq!(detector.detect(&frame), Some(Pixel::new(37, 21)));
        // Detection is deterministic.
        assert_eq!(detector.detect(&frame), Some(Pixel::new(37, 21)));
    }
}

#[test]
fn no_red_means_no_marker() {
    let data = bgra(64, 48, [30, 200, 30], &[]);
    let frame = Frame::new(&data, 64, 48, PixelLayout::Bgra8).unwrap();
    for strategy in [Strategy::Fast, Strategy::Accurate] {
        let analysis = detector(strategy).analyze(&frame);
        assert!(analysis.mask.is_empty());
        assert_eq!(analysis.pixel, None);
    }
}

#[test]
fn dots_outside_the_region_are_ignored() {
    // The default region of a 64x48 frame is x in [16, 48), y in [12, 36).
    let data = bgra(64, 48, BACKGROUND, &[(2, 2, DOT), (60, 40, DOT)]);
    let frame = Frame::new(&data, 64, 48, PixelLayout::Bgra8).unwrap();
    assert_eq!(detector(Strategy::Accurate).detect(&frame), None);

    let everything = LaserDetector::new(DetectorSettings {
        area: DetectionArea::new(1.0, 1.0),
        strategy: Strategy::Fast,
    });
    let found = everything.detect(&frame).unwrap();
    assert!(found == Pixel::new(2, 2) || found == Pixel::new(60, 40));
}

#[test]
fn winner_is_among_multiple_candidates() {
    let paint = [
        (30, 20, [250, 90, 90]),
        (31, 20, [245, 100, 95]),
        (30, 21, DOT),
        (31, 21, [240, 110, 100]),
        (40, 30, [230, 80, 80]),
    ];
    let data = bgra(64, 48, BACKGROUND, &paint);
    let frame = Frame::new(&data, 64, 48, PixelLayout::Bgra8).unwrap();
    for strategy in [Strategy::Fast, Strategy::Accurate] {
        let analysis = detector(strategy).analyze(&frame);
        assert_eq!(analysis.mask.count(), paint.len());
        let pixel = analysis.pixel.unwrap();
        assert!(paint.iter().any(|&(x, y, _)| Pixel::new(x, y) == pixel));
        assert!(analysis
            .mask
            .is_set(pixel.x - analysis.roi.x, pixel.y - analysis.roi.y));
    }
}

#[test]
fn rgba_layout_matches_bgra() {
    let bgra_data = bgra(32, 32, BACKGROUND, &[(15, 17, DOT)]);
    let rgba_data: Vec<u8> = bgra_data
        .chunks_exact(4)
        .flat_map(|px| [px[2], px[1], px[0], px[3]])
        .collect();
    let bgra_frame = Frame::new(&bgra_data, 32, 32, PixelLayout::Bgra8).unwrap();
    let rgba_frame = Frame::new(&rgba_data, 32, 32, PixelLayout::Rgba8).unwrap();
    let detector = detector(Strategy::Accurate);
    assert_eq!(detector.detect(&bgra_frame), Some(Pixel::new(15, 17)));
    assert_eq!(detector.detect(&rgba_frame), detector.detect(&bgra_frame));
}

#[test]
fn large_frames_are_smoothed_before_segmentation() {
    // A lone dot on a large frame is blurred below the value band by pre-smoothing, so only the
    // accurate strategy loses it. A 3x3 dot survives smoothing at its center.
    let (width, height) = (1700, 8);
    let lone = bgra(width, height, BACKGROUND, &[(850, 4, DOT)]);
    let frame = Frame::new(&lone, width, height, PixelLayout::Bgra8).unwrap();
    assert_eq!(detector(Strategy::Fast).detect(&frame), Some(Pixel::new(850, 4)));
    assert_eq!(detector(Strategy::Accurate).detect(&frame), None);

    let blob: Vec<_> = (849..=851)
        .flat_map(|x| (3..=5).map(move |y| (x, y, DOT)))
        .collect();
    let data = bgra(width, height, BACKGROUND, &blob);
    let frame = Frame::new(&data, width, height, PixelLayout::Bgra8).unwrap();
    assert_eq!(detector(Strategy::Accurate).detect(&frame), Some(Pixel::new(850, 4)));
}
