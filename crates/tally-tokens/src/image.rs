//! Inline image cost
//!
//! Images are billed as a flat base plus a per-tile rate. Before tiling, the image is
//! (virtually) resized in two stages: the long side is capped at 2048px, then the short side
//! is brought down to 768px. Each stage truncates to whole pixels and the second stage works
//! on the first stage's output.

use tally_core::ImageDetail;

const BASE_TOKENS: usize = 85;
const TILE_TOKENS: usize = 170;
const TILE_SIZE: u32 = 512;
const MAX_LONG_SIDE: u32 = 2048;
const MAX_SHORT_SIDE: u32 = 768;

/// Token cost of an image of `width` x `height` pixels.
pub fn tokens_for_image(width: u32, height: u32, detail: ImageDetail) -> usize {
    if detail == ImageDetail::Low {
        return BASE_TOKENS;
    }

    let (width, height) = fit_long_side(width, height);
    let (width, height) = fit_short_side(width, height);

    let tiles = width.div_ceil(TILE_SIZE) as usize * height.div_ceil(TILE_SIZE) as usize;
    tiles * TILE_TOKENS + BASE_TOKENS
}

fn fit_long_side(width: u32, height: u32) -> (u32, u32) {
    let long = width.max(height);
    if long > MAX_LONG_SIDE {
        scale(width, height, MAX_LONG_SIDE as f64 / long as f64)
    } else {
        (width, height)
    }
}

fn fit_short_side(width: u32, height: u32) -> (u32, u32) {
    let short = width.min(height);
    if short > MAX_SHORT_SIDE {
        scale(width, height, MAX_SHORT_SIDE as f64 / short as f64)
    } else {
        (width, height)
    }
}

fn scale(width: u32, height: u32, factor: f64) -> (u32, u32) {
    (
        (width as f64 * factor) as u32,
        (height as f64 * factor) as u32,
    )
}
