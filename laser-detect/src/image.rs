//! Separable filtering of single channel float images.
//!
//! Every filter here treats the image as if its border pixels were repeated indefinitely.

use image::{ImageBuffer, Luma, Rgb, RgbImage};
use imageproc::map::map_colors;

/// One color channel widened to `f32` so that derivatives can go negative.
pub type ChannelImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Frames wider than this get larger kernels and, for the accurate scorer, pre-smoothing.
pub const LARGE_FRAME_WIDTH: u32 = 1600;

/// Extracts channel `index` (0 = red, 1 = green, 2 = blue) of an RGB image.
pub fn channel(image: &RgbImage, index: usize) -> ChannelImage {
    map_colors(image, |px: Rgb<u8>| Luma([f32::from(px[index])]))
}

pub fn horizontal_filter(image: &ChannelImage, kernel: &[f32]) -> ChannelImage {
    debug_assert!(kernel.len() % 2 == 1);
    let half = kernel.len() / 2;
    let width = image.width() as usize;
    let height = image.height() as usize;
    if width == 0 || height == 0 {
        return ChannelImage::new(image.width(), image.height());
    }
    let mut output = vec![0.0; width * height];
    let mut scratch = vec![0f32; width + half * 2];
    for (row_in, row_out) in image
        .as_raw()
        .chunks_exact(width)
        .zip(output.chunks_exact_mut(width))
    {
        // Replicate the edge values into the padding.
        scratch[..half].fill(row_in[0]);
        scratch[half..half + width].copy_from_slice(row_in);
        scratch[half + width..].fill(row_in[width - 1]);
        for (window, out) in scratch.windows(kernel.len()).zip(row_out) {
            *out = window.iter().zip(kernel).map(|(a, k)| a * k).sum();
        }
    }
    ChannelImage::from_raw(image.width(), image.height(), output)
        .unwrap_or_else(|| ChannelImage::new(image.width(), image.height()))
}

pub fn vertical_filter(image: &ChannelImage, kernel: &[f32]) -> ChannelImage {
    debug_assert!(kernel.len() % 2 == 1);
    let half = kernel.len() / 2;
    let width = image.width() as usize;
    let height = image.height() as usize;
    if width == 0 || height == 0 {
        return ChannelImage::new(image.width(), image.height());
    }
    let input = image.as_raw();
    let mut output = vec![0.0; width * height];
    for (y, row_out) in output.chunks_exact_mut(width).enumerate() {
        for (i, &k) in kernel.iter().enumerate() {
            // Source row clamped into the image.
            let source = (y + i).saturating_sub(half).min(height - 1);
            let row_in = &input[source * width..(source + 1) * width];
            for (out, &value) in row_out.iter_mut().zip(row_in) {
                *out += k * value;
            }
        }
    }
    ChannelImage::from_raw(image.width(), image.height(), output)
        .unwrap_or_else(|| ChannelImage::new(image.width(), image.height()))
}

pub fn separable_filter(image: &ChannelImage, h_kernel: &[f32], v_kernel: &[f32]) -> ChannelImage {
    let h = horizontal_filter(image, h_kernel);
    vertical_filter(&h, v_kernel)
}

/// Aperture of the second derivative operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aperture {
    Three,
    Five,
}

impl Aperture {
    /// The aperture used for frames of the given (uncropped) width.
    pub fn for_frame_width(width: u32) -> Self {
        if width > LARGE_FRAME_WIDTH {
            Aperture::Five
        } else {
            Aperture::Three
        }
    }

    /// The second derivative and the smoothing kernel applied across it.
    fn kernels(self) -> (&'static [f32], &'static [f32]) {
        const D2_3: [f32; 3] = [1.0, -2.0, 1.0];
        const SMOOTH_3: [f32; 3] = [1.0, 2.0, 1.0];
        const D2_5: [f32; 5] = [1.0, 0.0, -2.0, 0.0, 1.0];
        const SMOOTH_5: [f32; 5] = [1.0, 4.0, 6.0, 4.0, 1.0];
        match self {
            Aperture::Three => (&D2_3, &SMOOTH_3),
            Aperture::Five => (&D2_5, &SMOOTH_5),
        }
    }
}

/// The sum of the second derivatives in X and Y, each smoothed across the other axis.
///
/// With [`Aperture::Three`] this is the 3x3 kernel
///
/// ```text
///  2  0  2
///  0 -8  0
///  2  0  2
/// ```
pub fn laplacian(image: &ChannelImage, aperture: Aperture) -> ChannelImage {
    let (derivative, smoothing) = aperture.kernels();
    let mut dxx = separable_filter(image, derivative, smoothing);
    let dyy = separable_filter(image, smoothing, derivative);
    for (a, b) in dxx.iter_mut().zip(dyy.iter()) {
        *a += b;
    }
    dxx
}

/// Applies a 3x3 Gaussian (`[1/4, 1/2, 1/4]` in both directions) to each channel.
pub fn smooth_rgb(image: &RgbImage) -> RgbImage {
    const KERNEL: [f32; 3] = [0.25, 0.5, 0.25];
    let channels: Vec<ChannelImage> = (0..3)
        .map(|index| separable_filter(&channel(image, index), &KERNEL, &KERNEL))
        .collect();
    let to_u8 = |v: f32| v.round().clamp(0.0, 255.0) as u8;
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        Rgb([
            to_u8(channels[0][(x, y)][0]),
            to_u8(channels[1][(x, y)][0]),
            to_u8(channels[2][(x, y)][0]),
        ])
    })
}
