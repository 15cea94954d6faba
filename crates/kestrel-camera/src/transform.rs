//! Pixel-space transforms applied after demosaic: resize, rotate, white
//! balance. All buffers are packed interleaved rows, `channels` bytes per
//! pixel.

use crate::Rotation;

/// Letterbox geometry: the scaled image region inside the target.
struct Inner {
    x: usize,
    y: usize,
    w: usize,
    h: usize,
}

fn inner_region(
    src_w: usize,
    src_h: usize,
    dst_w: usize,
    dst_h: usize,
    preserve_aspect: bool,
) -> Inner {
    if !preserve_aspect {
        return Inner {
            x: 0,
            y: 0,
            w: dst_w,
            h: dst_h,
        };
    }
    let scale = (dst_w as f32 / src_w as f32).min(dst_h as f32 / src_h as f32);
    let w = ((src_w as f32 * scale).round() as usize).clamp(1, dst_w);
    let h = ((src_h as f32 * scale).round() as usize).clamp(1, dst_h);
    Inner {
        x: (dst_w - w) / 2,
        y: (dst_h - h) / 2,
        w,
        h,
    }
}

/// Nearest-neighbor resize. With `preserve_aspect` the scaled image is
/// centered and the remainder left black; otherwise it stretches to the
/// exact target dimensions.
pub fn resize_nearest(
    src: &[u8],
    src_w: usize,
    src_h: usize,
    dst_w: usize,
    dst_h: usize,
    channels: usize,
    preserve_aspect: bool,
) -> Vec<u8> {
    let mut dst = vec![0u8; dst_w * dst_h * channels];
    let inner = inner_region(src_w, src_h, dst_w, dst_h, preserve_aspect);

    for y in 0..inner.h {
        let sy = (y * src_h / inner.h).min(src_h - 1);
        for x in 0..inner.w {
            let sx = (x * src_w / inner.w).min(src_w - 1);
            let from = (sy * src_w + sx) * channels;
            let to = ((inner.y + y) * dst_w + inner.x + x) * channels;
            dst[to..to + channels].copy_from_slice(&src[from..from + channels]);
        }
    }
    dst
}

/// Bilinear resize with the same letterbox/stretch behavior as
/// [`resize_nearest`].
pub fn resize_bilinear(
    src: &[u8],
    src_w: usize,
    src_h: usize,
    dst_w: usize,
    dst_h: usize,
    channels: usize,
    preserve_aspect: bool,
) -> Vec<u8> {
    let mut dst = vec![0u8; dst_w * dst_h * channels];
    let inner = inner_region(src_w, src_h, dst_w, dst_h, preserve_aspect);

    for y in 0..inner.h {
        let fy = ((y as f32 + 0.5) * src_h as f32 / inner.h as f32 - 0.5)
            .clamp(0.0, (src_h - 1) as f32);
        let y0 = fy.floor() as usize;
        let y1 = (y0 + 1).min(src_h - 1);
        let wy = fy - y0 as f32;

        for x in 0..inner.w {
            let fx = ((x as f32 + 0.5) * src_w as f32 / inner.w as f32 - 0.5)
                .clamp(0.0, (src_w - 1) as f32);
            let x0 = fx.floor() as usize;
            let x1 = (x0 + 1).min(src_w - 1);
            let wx = fx - x0 as f32;

            let to = ((inner.y + y) * dst_w + inner.x + x) * channels;
            for c in 0..channels {
                let p00 = src[(y0 * src_w + x0) * channels + c] as f32;
                let p01 = src[(y0 * src_w + x1) * channels + c] as f32;
                let p10 = src[(y1 * src_w + x0) * channels + c] as f32;
                let p11 = src[(y1 * src_w + x1) * channels + c] as f32;
                let top = p00 + (p01 - p00) * wx;
                let bottom = p10 + (p11 - p10) * wx;
                dst[to + c] = (top + (bottom - top) * wy).round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    dst
}

/// Discrete clockwise rotation. Returns the rotated buffer and its
/// dimensions (90/270 swap width and height).
pub fn rotate(
    src: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    rotation: Rotation,
) -> (Vec<u8>, usize, usize) {
    if rotation == Rotation::R0 {
        return (src.to_vec(), width, height);
    }

    let (dst_w, dst_h) = match rotation {
        Rotation::R90 | Rotation::R270 => (height, width),
        _ => (width, height),
    };
    let mut dst = vec![0u8; src.len()];

    for y in 0..dst_h {
        for x in 0..dst_w {
            let (sx, sy) = match rotation {
                Rotation::R90 => (y, height - 1 - x),
                Rotation::R180 => (width - 1 - x, height - 1 - y),
                Rotation::R270 => (width - 1 - y, x),
                Rotation::R0 => unreachable!(),
            };
            let from = (sy * width + sx) * channels;
            let to = (y * dst_w + x) * channels;
            dst[to..to + channels].copy_from_slice(&src[from..from + channels]);
        }
    }
    (dst, dst_w, dst_h)
}

/// Gray-world auto white balance for RGB/RGBA buffers.
///
/// Scales each color channel by target_mean / channel_mean, where the
/// target is the average of the three channel means, clamping to the valid
/// range. Alpha is untouched.
pub fn auto_white_balance(data: &mut [u8], channels: usize) {
    debug_assert!(channels == 3 || channels == 4);
    let pixels = data.len() / channels;
    if pixels == 0 {
        return;
    }

    let mut sums = [0u64; 3];
    for px in data.chunks_exact(channels) {
        for c in 0..3 {
            sums[c] += px[c] as u64;
        }
    }
    let means = [
        sums[0] as f32 / pixels as f32,
        sums[1] as f32 / pixels as f32,
        sums[2] as f32 / pixels as f32,
    ];
    let target = (means[0] + means[1] + means[2]) / 3.0;

    let mut scales = [1.0f32; 3];
    for c in 0..3 {
        // A fully dark channel carries no balance information.
        if means[c] > f32::EPSILON {
            scales[c] = target / means[c];
        }
    }

    for px in data.chunks_exact_mut(channels) {
        for c in 0..3 {
            px[c] = (px[c] as f32 * scales[c]).round().clamp(0.0, 255.0) as u8;
        }
    }
}
