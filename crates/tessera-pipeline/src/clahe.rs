//! Contrast-limited adaptive histogram equalization (CLAHE).
//!
//! Normalizes local contrast before edge detection so that the same
//! thresholds find comparable edges in dark and bright parts of a photo.
//!
//! The image is split into a grid of tiles. Each tile gets its own
//! equalization lookup table built from a clipped histogram (the clip
//! limit caps how much any single gray level can be stretched, which keeps
//! flat regions from amplifying noise). Every output pixel blends the
//! tables of the four nearest tile centers bilinearly, so no tile seams
//! show up in the result.

use image::{GrayImage, Luma};

/// Default tile grid (tiles per axis).
pub const DEFAULT_TILES: u32 = 8;

/// Default clip limit, relative to a perfectly flat histogram.
pub const DEFAULT_CLIP_LIMIT: f32 = 2.0;

const LEVELS: usize = 256;

/// Equalization lookup table for one tile.
type Lut = [u8; LEVELS];

/// Apply CLAHE with the default 8×8 grid and clip limit 2.0.
#[must_use = "returns the equalized image"]
pub fn clahe(image: &GrayImage) -> GrayImage {
    clahe_with(image, DEFAULT_TILES, DEFAULT_CLIP_LIMIT)
}

/// Apply CLAHE with an explicit tile grid and clip limit.
///
/// The grid shrinks on axes shorter than `tiles` pixels so every tile
/// holds at least one pixel. A non-positive `clip_limit` disables clipping
/// (plain adaptive equalization).
#[must_use = "returns the equalized image"]
pub fn clahe_with(image: &GrayImage, tiles: u32, clip_limit: f32) -> GrayImage {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return image.clone();
    }
    let tiles_x = tiles.clamp(1, w);
    let tiles_y = tiles.clamp(1, h);

    let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let (x0, x1) = tile_span(tx, tiles_x, w);
            let (y0, y1) = tile_span(ty, tiles_y, h);
            luts.push(tile_lut(image, x0..x1, y0..y1, clip_limit));
        }
    }

    let lut_at = |tx: u32, ty: u32| -> &Lut {
        let idx = (ty * tiles_x + tx) as usize;
        luts.get(idx).unwrap_or(&IDENTITY)
    };

    GrayImage::from_fn(w, h, |x, y| {
        let (tx0, tx1, ax) = neighbors(x, w, tiles_x);
        let (ty0, ty1, ay) = neighbors(y, h, tiles_y);
        let level = image.get_pixel(x, y).0[0] as usize;

        let top = f32::from(lut_at(tx0, ty0)[level]).mul_add(
            1.0 - ax,
            f32::from(lut_at(tx1, ty0)[level]) * ax,
        );
        let bottom = f32::from(lut_at(tx0, ty1)[level]).mul_add(
            1.0 - ax,
            f32::from(lut_at(tx1, ty1)[level]) * ax,
        );
        let value = top.mul_add(1.0 - ay, bottom * ay);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Luma([value.round().clamp(0.0, 255.0) as u8])
    })
}

const IDENTITY: Lut = {
    let mut lut = [0u8; LEVELS];
    let mut i = 0;
    while i < LEVELS {
        #[allow(clippy::cast_possible_truncation)]
        {
            lut[i] = i as u8;
        }
        i += 1;
    }
    lut
};

/// Pixel span `[start, end)` of tile `index` out of `count` along an axis
/// of `len` pixels.
fn tile_span(index: u32, count: u32, len: u32) -> (u32, u32) {
    let start = u64::from(index) * u64::from(len) / u64::from(count);
    let end = u64::from(index + 1) * u64::from(len) / u64::from(count);
    #[allow(clippy::cast_possible_truncation)]
    (start as u32, end as u32)
}

/// The two tiles whose centers bracket pixel `pos`, and the weight of the
/// second one.
fn neighbors(pos: u32, len: u32, count: u32) -> (u32, u32, f32) {
    #[allow(clippy::cast_precision_loss)]
    let t = (pos as f32 + 0.5) * count as f32 / len as f32 - 0.5;
    let last = count - 1;
    if t <= 0.0 {
        return (0, 0, 0.0);
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let lo = (t.floor() as u32).min(last);
    if lo >= last {
        return (last, last, 0.0);
    }
    #[allow(clippy::cast_precision_loss)]
    let weight = t - lo as f32;
    (lo, lo + 1, weight)
}

/// Build the clipped equalization table for one tile.
fn tile_lut(
    image: &GrayImage,
    xs: std::ops::Range<u32>,
    ys: std::ops::Range<u32>,
    clip_limit: f32,
) -> Lut {
    let mut histogram = [0u32; LEVELS];
    let mut area = 0u32;
    for y in ys {
        for x in xs.clone() {
            histogram[image.get_pixel(x, y).0[0] as usize] += 1;
            area += 1;
        }
    }
    if area == 0 {
        return IDENTITY;
    }

    if clip_limit > 0.0 {
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let limit = ((clip_limit * area as f32 / LEVELS as f32) as u32).max(1);
        clip_histogram(&mut histogram, limit);
    }

    let mut lut = [0u8; LEVELS];
    let mut cumulative = 0u64;
    let scale = 255.0 / f64::from(area);
    for (level, count) in histogram.iter().enumerate() {
        cumulative += u64::from(*count);
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        {
            lut[level] = (cumulative as f64 * scale).round().min(255.0) as u8;
        }
    }
    lut
}

/// Cap every bin at `limit` and spread the excess evenly over all bins.
///
/// The remainder that does not divide evenly goes one count at a time to
/// bins spaced evenly across the range. The total count is preserved.
fn clip_histogram(histogram: &mut [u32; LEVELS], limit: u32) {
    let mut excess = 0u32;
    for count in histogram.iter_mut() {
        if *count > limit {
            excess += *count - limit;
            *count = limit;
        }
    }
    if excess == 0 {
        return;
    }

    #[allow(clippy::cast_possible_truncation)]
    let levels = LEVELS as u32;
    let batch = excess / levels;
    let residual = excess % levels;
    for count in histogram.iter_mut() {
        *count += batch;
    }
    if residual > 0 {
        let step = (levels / residual).max(1) as usize;
        for count in histogram.iter_mut().step_by(step).take(residual as usize) {
            *count += 1;
        }
    }
}
