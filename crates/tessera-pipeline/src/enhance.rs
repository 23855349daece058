//! Global saturation and brightness boost.
//!
//! Low-poly renderings read flatter than the source because every region
//! collapses to its mean color. Boosting saturation and value before
//! sampling compensates. The adjustment happens in HSV (via `palette`);
//! callers only ever see RGB buffers.

use palette::{FromColor, Hsv, Srgb};

use crate::types::RgbImage;

/// Saturation multiplier.
pub const SATURATION_GAIN: f32 = 1.3;

/// Value (brightness) multiplier.
pub const BRIGHTNESS_GAIN: f32 = 1.1;

/// Enhance a single RGB pixel.
#[must_use]
pub fn enhance_pixel(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb;
    let mut hsv: Hsv = Hsv::from_color(Srgb::new(r, g, b).into_format::<f32>());
    hsv.saturation = (hsv.saturation * SATURATION_GAIN).clamp(0.0, 1.0);
    hsv.value = (hsv.value * BRIGHTNESS_GAIN).clamp(0.0, 1.0);
    let rgb: Srgb = Srgb::from_color(hsv);
    let out: Srgb<u8> = rgb.into_format();
    [out.red, out.green, out.blue]
}

/// Return a copy of `image` with boosted saturation and brightness.
#[must_use = "returns the enhanced image"]
pub fn enhance_colors(image: &RgbImage) -> RgbImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        pixel.0 = enhance_pixel(pixel.0);
    }
    out
}
