//! Gaussian smoothing of the color source.
//!
//! Smoothing flattens texture inside a primitive so that the averaged
//! region colors read as clean flat tiles. The strength is expressed as an
//! odd kernel size (the user-facing "blur strength"), converted to a sigma
//! with the conventional size-to-sigma rule.
//!
//! [`imageproc::filter::gaussian_blur_f32`] is applied to each channel
//! separately and the channels are reassembled.

use image::GrayImage;

use crate::types::RgbImage;

/// Sigma of the Gaussian matching an odd kernel size.
///
/// Uses `0.3 * ((k - 1) * 0.5 - 1) + 0.8`, the rule image libraries use
/// when only a kernel size is given. Even sizes are bumped to the next odd
/// size first. Returns `None` for kernel size 1, which means no smoothing.
#[must_use]
pub fn kernel_sigma(kernel_size: u32) -> Option<f32> {
    let k = kernel_size | 1;
    if k <= 1 {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let k = k as f32;
    Some(0.3f32.mul_add((k - 1.0).mul_add(0.5, -1.0), 0.8))
}

/// Blur an RGB image with the Gaussian for `kernel_size`.
///
/// Kernel sizes 0 and 1 return the image unchanged.
#[must_use = "returns the blurred image"]
pub fn gaussian_blur_rgb(image: &RgbImage, kernel_size: u32) -> RgbImage {
    let Some(sigma) = kernel_sigma(kernel_size) else {
        return image.clone();
    };

    let (w, h) = (image.width(), image.height());
    if w == 0 || h == 0 {
        return image.clone();
    }

    let blurred: [GrayImage; 3] = std::array::from_fn(|c| {
        let channel = GrayImage::from_fn(w, h, |x, y| image::Luma([image.get_pixel(x, y).0[c]]));
        imageproc::filter::gaussian_blur_f32(&channel, sigma)
    });

    RgbImage::from_fn(w, h, |x, y| {
        image::Rgb([
            blurred[0].get_pixel(x, y).0[0],
            blurred[1].get_pixel(x, y).0[0],
            blurred[2].get_pixel(x, y).0[0],
        ])
    })
}
