//! Per-pixel tonal adjustments and the small convolution kernels backing
//! the sharpen/blur slider.

use image::RgbaImage;

use crate::composition::TonalAdjustments;

/// Applies a pure RGB transform to every pixel, clamping back to u8.
/// Alpha is left untouched.
pub fn apply_pixel_transform<F>(img: &mut RgbaImage, f: F)
where
    F: Fn(f32, f32, f32) -> (f32, f32, f32),
{
    for px in img.pixels_mut() {
        let (r, g, b) = f(px[0] as f32, px[1] as f32, px[2] as f32);
        px[0] = r.round().clamp(0.0, 255.0) as u8;
        px[1] = g.round().clamp(0.0, 255.0) as u8;
        px[2] = b.round().clamp(0.0, 255.0) as u8;
    }
}

/// `amount` in [-1, 1]; adds `amount * 255` to each channel.
pub fn brightness(img: &mut RgbaImage, amount: f32) {
    let delta = amount * 255.0;
    apply_pixel_transform(img, |r, g, b| (r + delta, g + delta, b + delta));
}

/// `amount` in [-1, 1]; linear contrast about mid-gray.
pub fn contrast(img: &mut RgbaImage, amount: f32) {
    let c = amount.clamp(-1.0, 1.0) * 255.0;
    let factor = (259.0 * (c + 255.0)) / (255.0 * (259.0 - c));
    apply_pixel_transform(img, |r, g, b| {
        (
            factor * (r - 128.0) + 128.0,
            factor * (g - 128.0) + 128.0,
            factor * (b - 128.0) + 128.0,
        )
    });
}

/// Positive `amount` pushes channels away from the per-pixel maximum,
/// negative pulls them toward it (desaturation).
pub fn saturate(img: &mut RgbaImage, amount: f32) {
    apply_pixel_transform(img, |r, g, b| {
        let max = r.max(g).max(b);
        (
            r + (max - r) * -amount,
            g + (max - g) * -amount,
            b + (max - b) * -amount,
        )
    });
}

/// `gamma` > 0; 1.0 is identity.
pub fn gamma(img: &mut RgbaImage, gamma: f32) {
    let exp = 1.0 / gamma.max(0.01);
    apply_pixel_transform(img, |r, g, b| {
        (
            255.0 * (r / 255.0).powf(exp),
            255.0 * (g / 255.0).powf(exp),
            255.0 * (b / 255.0).powf(exp),
        )
    });
}

/// 4x5 color matrix in row-major order; the fifth column is an offset in
/// [0, 1] units and is scaled by 255.
pub fn color_matrix(img: &mut RgbaImage, m: &[f32; 20]) {
    for px in img.pixels_mut() {
        let (r, g, b, a) = (
            px[0] as f32,
            px[1] as f32,
            px[2] as f32,
            px[3] as f32,
        );
        let nr = m[0] * r + m[1] * g + m[2] * b + m[3] * a + m[4] * 255.0;
        let ng = m[5] * r + m[6] * g + m[7] * b + m[8] * a + m[9] * 255.0;
        let nb = m[10] * r + m[11] * g + m[12] * b + m[13] * a + m[14] * 255.0;
        let na = m[15] * r + m[16] * g + m[17] * b + m[18] * a + m[19] * 255.0;
        px[0] = nr.round().clamp(0.0, 255.0) as u8;
        px[1] = ng.round().clamp(0.0, 255.0) as u8;
        px[2] = nb.round().clamp(0.0, 255.0) as u8;
        px[3] = na.round().clamp(0.0, 255.0) as u8;
    }
}

const IDENTITY_KERNEL: [f32; 9] = [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0];
const SHARPEN_KERNEL: [f32; 9] = [0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0];
const BLUR_KERNEL: [f32; 9] = [
    1.0 / 9.0,
    1.0 / 9.0,
    1.0 / 9.0,
    1.0 / 9.0,
    1.0 / 9.0,
    1.0 / 9.0,
    1.0 / 9.0,
    1.0 / 9.0,
    1.0 / 9.0,
];

/// 3x3 convolution with edge clamping. Alpha passes through.
pub fn convolve3x3(img: &mut RgbaImage, kernel: &[f32; 9]) {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return;
    }
    let src = img.clone();
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0.0f32; 3];
            for ky in 0..3i64 {
                for kx in 0..3i64 {
                    let sx = (x as i64 + kx - 1).clamp(0, w as i64 - 1) as u32;
                    let sy = (y as i64 + ky - 1).clamp(0, h as i64 - 1) as u32;
                    let weight = kernel[(ky * 3 + kx) as usize];
                    let sp = src.get_pixel(sx, sy);
                    acc[0] += sp[0] as f32 * weight;
                    acc[1] += sp[1] as f32 * weight;
                    acc[2] += sp[2] as f32 * weight;
                }
            }
            let px = img.get_pixel_mut(x, y);
            px[0] = acc[0].round().clamp(0.0, 255.0) as u8;
            px[1] = acc[1].round().clamp(0.0, 255.0) as u8;
            px[2] = acc[2].round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Signed intensity in [-100, 100]: positive blends the sharpen kernel in,
/// negative the blur kernel, proportionally to the magnitude.
pub fn sharpen_blur(img: &mut RgbaImage, intensity: f32) {
    if intensity == 0.0 {
        return;
    }
    let target = if intensity > 0.0 {
        &SHARPEN_KERNEL
    } else {
        &BLUR_KERNEL
    };
    let blend = (intensity.abs() / 100.0).clamp(0.0, 1.0);
    let mut kernel = [0.0f32; 9];
    for i in 0..9 {
        kernel[i] = IDENTITY_KERNEL[i] * (1.0 - blend) + target[i] * blend;
    }
    convolve3x3(img, &kernel);
}

/// Repeated 3x3 box blur; `radius` passes of the kernel.
pub fn box_blur(img: &mut RgbaImage, radius: u32) {
    for _ in 0..radius {
        convolve3x3(img, &BLUR_KERNEL);
    }
}

/// Applies the full tonal chain in its fixed order:
/// brightness, contrast, saturation, gamma, sharpen/blur.
pub fn apply_tonal(img: &mut RgbaImage, tonal: &TonalAdjustments) {
    if tonal.brightness != 0.0 {
        brightness(img, tonal.brightness / 100.0);
    }
    if tonal.contrast != 0.0 {
        contrast(img, tonal.contrast / 100.0);
    }
    if tonal.saturation != 0.0 {
        saturate(img, tonal.saturation / 100.0);
    }
    if tonal.gamma != 0.0 {
        gamma(img, (1.0 + (tonal.gamma / 100.0) * 1.8).max(0.2));
    }
    if tonal.sharpen_blur != 0.0 {
        sharpen_blur(img, tonal.sharpen_blur);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| {
            Rgba([
                (x * 7 % 256) as u8,
                (y * 13 % 256) as u8,
                ((x + y) * 5 % 256) as u8,
                255,
            ])
        })
    }

    #[test]
    fn identity_tonal_leaves_pixels_alone() {
        let img = gradient(16, 16);
        let mut out = img.clone();
        apply_tonal(&mut out, &TonalAdjustments::default());
        assert_eq!(out, img);
    }

    #[test]
    fn brightness_raises_every_channel() {
        let mut img = gradient(8, 8);
        let before = img.get_pixel(3, 3)[0];
        brightness(&mut img, 0.2);
        assert!(img.get_pixel(3, 3)[0] > before);
    }

    #[test]
    fn zero_sharpen_blur_is_a_no_op() {
        let img = gradient(8, 8);
        let mut out = img.clone();
        sharpen_blur(&mut out, 0.0);
        assert_eq!(out, img);
    }

    #[test]
    fn identity_color_matrix_is_a_no_op() {
        let img = gradient(8, 8);
        let mut out = img.clone();
        let id = [
            1.0, 0.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0, 0.0,
        ];
        color_matrix(&mut out, &id);
        assert_eq!(out, img);
    }
}
