//! Bayer demosaic and color space reductions.
//!
//! The sensor delivers one channel per pixel in an RGGB mosaic:
//!
//! ```text
//!   R G R G ...
//!   G B G B ...
//! ```
//!
//! Reconstruction works per 2x2 cell: every pixel in a cell takes the
//! cell's red and blue samples directly and the average of its two green
//! samples. Width and height must therefore be even.

/// Demosaic a raw RGGB frame to packed RGB (3 bytes per pixel).
pub fn demosaic_rgb(raw: &[u8], width: usize, height: usize) -> Vec<u8> {
    debug_assert_eq!(raw.len(), width * height);
    debug_assert!(width % 2 == 0 && height % 2 == 0);

    let mut rgb = vec![0u8; width * height * 3];
    for cy in (0..height).step_by(2) {
        for cx in (0..width).step_by(2) {
            let r = raw[cy * width + cx];
            let g0 = raw[cy * width + cx + 1] as u16;
            let g1 = raw[(cy + 1) * width + cx] as u16;
            let b = raw[(cy + 1) * width + cx + 1];
            let g = ((g0 + g1) / 2) as u8;

            for dy in 0..2 {
                for dx in 0..2 {
                    let at = ((cy + dy) * width + cx + dx) * 3;
                    rgb[at] = r;
                    rgb[at + 1] = g;
                    rgb[at + 2] = b;
                }
            }
        }
    }
    rgb
}

/// Demosaic a raw RGGB frame to packed RGBA with opaque alpha.
pub fn demosaic_rgba(raw: &[u8], width: usize, height: usize) -> Vec<u8> {
    let rgb = demosaic_rgb(raw, width, height);
    let mut rgba = Vec::with_capacity(width * height * 4);
    for px in rgb.chunks_exact(3) {
        rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
    }
    rgba
}

/// Reduce packed RGB to 8-bit grayscale using BT.601 luma weights
/// (0.299 R + 0.587 G + 0.114 B), in fixed point.
pub fn rgb_to_gray(rgb: &[u8]) -> Vec<u8> {
    let mut gray = Vec::with_capacity(rgb.len() / 3);
    for px in rgb.chunks_exact(3) {
        let luma =
            (77 * px[0] as u32 + 150 * px[1] as u32 + 29 * px[2] as u32) >> 8;
        gray.push(luma as u8);
    }
    gray
}
