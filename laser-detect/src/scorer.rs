use crate::image::{channel, laplacian, separable_filter, Aperture, LARGE_FRAME_WIDTH};
use crate::Mask;
use image::{GrayImage, ImageBuffer, Luma, Primitive, RgbImage};
use imageproc::map::red_channel;
use laser_core::Pixel;

/// Picks the most marker-like pixel among the set pixels of a mask.
pub trait PointScorer {
    /// Returns the winning pixel in the coordinates of `image`, or `None` when `mask` is empty.
    ///
    /// `hint_width` is the width of the uncropped frame and only selects kernel sizes.
    fn score(&self, image: &RgbImage, mask: &Mask, hint_width: u32) -> Option<Pixel>;
}

/// Row-major arg-max over masked pixels. Ties keep the earliest pixel.
pub fn masked_arg_max<T>(scores: &ImageBuffer<Luma<T>, Vec<T>>, mask: &Mask) -> Option<Pixel>
where
    T: Primitive,
{
    let mut best: Option<(Pixel, T)> = None;
    for (x, y, score) in scores.enumerate_pixels() {
        if !mask.is_set(x, y) {
            continue;
        }
        let score = score[0];
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((Pixel::new(x, y), score)),
        }
    }
    best.map(|(pixel, _)| pixel)
}

/// Local red contrast: the red channel minus its box blurred neighborhood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FastScorer;

impl FastScorer {
    /// Radius of the box filter (kernel size 11, or 15 on large frames).
    pub fn radius(hint_width: u32) -> u32 {
        if hint_width > LARGE_FRAME_WIDTH {
            7
        } else {
            5
        }
    }

    pub fn contrast(&self, image: &RgbImage, hint_width: u32) -> GrayImage {
        let red = red_channel(image);
        if red.width() == 0 || red.height() == 0 {
            return red;
        }
        let blurred = Self::box_mean(image, Self::radius(hint_width));
        GrayImage::from_fn(red.width(), red.height(), |x, y| {
            Luma([red[(x, y)][0].saturating_sub(blurred[(x, y)][0])])
        })
    }

    /// Mean of the red channel over a `(2 * radius + 1)` square, rounded to nearest.
    pub fn box_mean(image: &RgbImage, radius: u32) -> GrayImage {
        let side = 2 * radius as usize + 1;
        let ones = vec![1.0; side];
        // Window sums of u8 values stay exact in f32, and an odd area never divides to a tie.
        let sums = separable_filter(&channel(image, 0), &ones, &ones);
        let area = (side * side) as f32;
        GrayImage::from_fn(image.width(), image.height(), |x, y| {
            Luma([(sums[(x, y)][0] / area).round().clamp(0.0, 255.0) as u8])
        })
    }
}

impl PointScorer for FastScorer {
    fn score(&self, image: &RgbImage, mask: &Mask, hint_width: u32) -> Option<Pixel> {
        if mask.is_empty() {
            return None;
        }
        masked_arg_max(&self.contrast(image, hint_width), mask)
    }
}

/// Per-pixel scores of the accurate scorer.
pub type ScoreImage = ImageBuffer<Luma<i16>, Vec<i16>>;

/// Weighs brightness in red against the curvature of each channel.
///
/// A laser dot is a sharp red peak, so the red Laplacian is strongly negative there while the
/// other channels, flattened by the sensor saturating, contribute less.
///
/// Every intermediate is a signed 16-bit value and each step saturates, so strong peaks clip
/// at `i16::MAX` instead of outranking every other candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccurateScorer;

impl AccurateScorer {
    pub const RED_WEIGHT: i16 = 2;
    /// Subtracted.
    pub const RED_LAPLACIAN_WEIGHT: i16 = 3;

    /// `2 * red - 3 * lap(red) + lap(blue) + lap(green)` for every pixel, saturating per step.
    pub fn score_map(&self, image: &RgbImage, hint_width: u32) -> ScoreImage {
        let aperture = Aperture::for_frame_width(hint_width);
        let red = red_channel(image);
        let lap_red = laplacian(&channel(image, 0), aperture);
        let lap_green = laplacian(&channel(image, 1), aperture);
        let lap_blue = laplacian(&channel(image, 2), aperture);
        ScoreImage::from_fn(image.width(), image.height(), |x, y| {
            let px = (x, y);
            let score = Self::RED_WEIGHT
                .saturating_mul(i16::from(red[px][0]))
                .saturating_sub(Self::RED_LAPLACIAN_WEIGHT.saturating_mul(saturate(lap_red[px][0])))
                .saturating_add(saturate(lap_blue[px][0]))
                .saturating_add(saturate(lap_green[px][0]));
            Luma([score])
        })
    }
}

/// Rounds and clamps a filter response into `i16`.
fn saturate(value: f32) -> i16 {
    value.round().clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
}

impl PointScorer for AccurateScorer {
    fn score(&self, image: &RgbImage, mask: &Mask, hint_width: u32) -> Option<Pixel> {
        if mask.is_empty() {
            return None;
        }
        masked_arg_max(&self.score_map(image, hint_width), mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ChannelImage;
    use image::Rgb;

    const BACKGROUND: Rgb<u8> = Rgb([40, 40, 40]);
    const DOT: Rgb<u8> = Rgb([255, 60, 60]);

    fn dot_image() -> RgbImage {
        let mut image = RgbImage::from_pixel(5, 5, BACKGROUND);
        image[(2, 2)] = DOT;
        image
    }

    fn full_mask(width: u32, height: u32) -> Mask {
        Mask(GrayImage::from_pixel(width, height, Luma([255])))
    }

    #[test]
    fn accurate_weights_are_pinned() {
        let map = AccurateScorer.score_map(&dot_image(), 1280);
        // lap(red) = 4 * 2 * 40 - 8 * 255 = -1720, lap(green) = lap(blue) = 320 - 480 = -160.
        assert_eq!(map[(2, 2)][0], 2 * 255 + 3 * 1720 - 160 - 160);
        // The four diagonal neighbors see the dot through a corner weight of 2.
        assert_eq!(map[(1, 1)][0], 2 * 40 - 3 * (2 * 215) + 2 * 20 + 2 * 20);
    }

    fn blob(image: &mut RgbImage, cx: u32, cy: u32, color: Rgb<u8>) {
        for y in cy - 1..=cy + 1 {
            for x in cx - 1..=cx + 1 {
                image[(x, y)] = color;
            }
        }
    }

    #[test]
    fn accurate_score_saturates_at_sixteen_bits() {
        let mut image = RgbImage::new(40, 20);
        blob(&mut image, 10, 10, DOT);
        blob(&mut image, 30, 10, Rgb([230, 50, 50]));
        let map = AccurateScorer.score_map(&image, 1920);
        // 3 * lap(red) = 3 * -14280 clips before it is subtracted, then the sum clips again.
        assert_eq!(map[(10, 10)][0], 26047);
        assert_eq!(map[(30, 10)][0], 27167);
        let mask = full_mask(40, 20);
        assert_eq!(AccurateScorer.score(&image, &mask, 1920), Some(Pixel::new(30, 10)));
    }

    #[test]
    fn fast_kernel_grows_on_large_frames() {
        assert_eq!(FastScorer::radius(1280), 5);
        assert_eq!(FastScorer::radius(1600), 5);
        assert_eq!(FastScorer::radius(1601), 7);
        assert_eq!(FastScorer::radius(1920), 7);
    }

    #[test]
    fn fast_contrast_sees_a_ring_only_with_the_large_kernel() {
        let mut image = RgbImage::new(21, 21);
        image[(10, 10)] = Rgb([255, 0, 0]);
        // A square ring six pixels out: outside the 11x11 box, inside the 15x15 box.
        for i in 4..=16 {
            for (x, y) in [(i, 4), (i, 16), (4, i), (16, i)] {
                image[(x, y)] = Rgb([255, 0, 0]);
            }
        }
        // 255 / 121 rounds to 2.
        assert_eq!(FastScorer.contrast(&image, 1280)[(10, 10)][0], 253);
        // 49 * 255 / 225 = 55.53 rounds to 56.
        assert_eq!(FastScorer.contrast(&image, 1920)[(10, 10)][0], 199);
    }

    #[test]
    fn box_mean_rounds_to_nearest() {
        let mut image = RgbImage::new(3, 3);
        image[(1, 1)] = Rgb([5, 0, 0]);
        image[(0, 0)] = Rgb([1, 0, 0]);
        // (5 + 1) / 9 = 0.67 rounds up, where flooring would give 0.
        assert_eq!(FastScorer::box_mean(&image, 1)[(1, 1)][0], 1);
        // (5 + 4 * 1) / 9 = 1 at the replicated corner.
        assert_eq!(FastScorer::box_mean(&image, 1)[(0, 0)][0], 1);
    }

    #[test]
    fn fast_contrast_saturates_at_zero() {
        let contrast = FastScorer.contrast(&dot_image(), 1280);
        assert!(contrast[(2, 2)][0] > 200);
        assert_eq!(contrast[(0, 0)][0], 0);
        assert_eq!(contrast[(1, 2)][0], 0);
    }

    #[test]
    fn both_scorers_find_the_dot() {
        let image = dot_image();
        let mask = full_mask(5, 5);
        assert_eq!(FastScorer.score(&image, &mask, 1280), Some(Pixel::new(2, 2)));
        assert_eq!(AccurateScorer.score(&image, &mask, 1280), Some(Pixel::new(2, 2)));
        assert_eq!(AccurateScorer.score(&image, &mask, 1920), Some(Pixel::new(2, 2)));
    }

    #[test]
    fn empty_mask_yields_nothing() {
        let image = dot_image();
        let mask = Mask(GrayImage::new(5, 5));
        assert_eq!(FastScorer.score(&image, &mask, 1280), None);
        assert_eq!(AccurateScorer.score(&image, &mask, 1280), None);
    }

    #[test]
    fn arg_max_ignores_unmasked_and_keeps_first_tie() {
        let scores = ChannelImage::from_raw(3, 2, vec![9.0, 1.0, 5.0, 5.0, 2.0, 0.0]).unwrap();
        let mut mask = Mask(GrayImage::new(3, 2));
        mask[(1, 0)] = Luma([255]);
        mask[(2, 0)] = Luma([255]);
        mask[(0, 1)] = Luma([255]);
        assert_eq!(masked_arg_max(&scores, &mask), Some(Pixel::new(2, 0)));
    }

    #[test]
    fn winner_is_always_masked() {
        let mut image = RgbImage::from_pixel(9, 9, BACKGROUND);
        image[(2, 2)] = DOT;
        image[(6, 6)] = Rgb([250, 90, 90]);
        let mut mask = Mask(GrayImage::new(9, 9));
        mask[(6, 6)] = Luma([255]);
        assert_eq!(FastScorer.score(&image, &mask, 640), Some(Pixel::new(6, 6)));
        assert_eq!(AccurateScorer.score(&image, &mask, 640), Some(Pixel::new(6, 6)));
    }
}
