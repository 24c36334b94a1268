//! The filter preset table: each preset is a fixed, parametrized chain of
//! tonal adjustments and color matrices, scaled by a 0..=100 intensity.

use image::RgbaImage;

use crate::composition::FilterKind;

use super::adjust;

const IDENTITY_MATRIX: [f32; 20] = [
    1.0, 0.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 1.0, 0.0,
];

const SEPIA_MATRIX: [f32; 20] = [
    0.393, 0.769, 0.189, 0.0, 0.0, //
    0.349, 0.686, 0.168, 0.0, 0.0, //
    0.272, 0.534, 0.131, 0.0, 0.0, //
    0.0, 0.0, 0.0, 1.0, 0.0,
];

const VINTAGE_MATRIX: [f32; 20] = [
    0.62793, 0.32021, -0.03965, 0.0, 0.03784, //
    0.02578, 0.64411, 0.03259, 0.0, 0.03784, //
    0.04660, -0.08512, 0.52416, 0.0, 0.03784, //
    0.0, 0.0, 0.0, 1.0, 0.0,
];

/// Linear blend from the identity matrix toward `target` by `factor`.
fn blend_matrix(target: &[f32; 20], factor: f32) -> [f32; 20] {
    let mut out = [0.0f32; 20];
    for i in 0..20 {
        out[i] = IDENTITY_MATRIX[i] * (1.0 - factor) + target[i] * factor;
    }
    out
}

/// Applies one preset at the given intensity. Intensity 0 (and the `None`
/// preset) apply nothing, so clearing a filter restores the input exactly.
///
/// Matrix offsets and brightness amounts are in [0, 1] units scaled by 255
/// downstream; saturation and contrast take their signed unit ranges.
pub fn apply_filter(img: &mut RgbaImage, kind: FilterKind, intensity: f32) {
    let i = intensity.clamp(0.0, 100.0);
    if kind == FilterKind::None || i == 0.0 {
        return;
    }
    let f = i / 100.0;
    match kind {
        FilterKind::None => {}
        FilterKind::Grayscale => {
            let inv = 1.0 - f;
            adjust::color_matrix(
                img,
                &[
                    0.2126 + 0.7874 * inv,
                    0.7152 - 0.7152 * inv,
                    0.0722 - 0.0722 * inv,
                    0.0,
                    0.0,
                    0.2126 - 0.2126 * inv,
                    0.7152 + 0.2848 * inv,
                    0.0722 - 0.0722 * inv,
                    0.0,
                    0.0,
                    0.2126 - 0.2126 * inv,
                    0.7152 - 0.7152 * inv,
                    0.0722 + 0.9278 * inv,
                    0.0,
                    0.0,
                    0.0,
                    0.0,
                    0.0,
                    1.0,
                    0.0,
                ],
            );
        }
        FilterKind::Sepia => adjust::color_matrix(img, &blend_matrix(&SEPIA_MATRIX, f)),
        FilterKind::Vintage => adjust::color_matrix(img, &blend_matrix(&VINTAGE_MATRIX, f)),
        FilterKind::Vibrant => {
            adjust::saturate(img, i / 50.0);
            adjust::contrast(img, i / 200.0);
        }
        FilterKind::Cool => {
            adjust::color_matrix(
                img,
                &[
                    1.0, 0.0, 0.0, 0.0, 0.0, //
                    0.0, 1.0, 0.0, 0.0, 0.0, //
                    0.0, 0.0, 1.0, 0.0, i / 50.0, //
                    0.0, 0.0, 0.0, 1.0, 0.0,
                ],
            );
        }
        FilterKind::Warm => {
            adjust::color_matrix(
                img,
                &[
                    1.0, 0.0, 0.0, 0.0, i / 50.0, //
                    0.0, 1.0, 0.0, 0.0, i / 100.0, //
                    0.0, 0.0, 1.0, 0.0, -i / 100.0, //
                    0.0, 0.0, 0.0, 1.0, 0.0,
                ],
            );
        }
        FilterKind::Dramatic => {
            adjust::contrast(img, i / 50.0);
            adjust::brightness(img, -i / 200.0);
        }
        FilterKind::Dreamy => {
            adjust::box_blur(img, (f * 4.0).round() as u32);
            adjust::brightness(img, i / 200.0);
        }
        FilterKind::Summer => {
            adjust::color_matrix(
                img,
                &[
                    1.0, 0.0, 0.0, 0.0, i / 50.0, //
                    0.0, 1.0, 0.0, 0.0, i / 100.0, //
                    0.0, 0.0, 0.8, 0.0, i / 100.0, //
                    0.0, 0.0, 0.0, 1.0, 0.0,
                ],
            );
        }
        FilterKind::Winter => {
            adjust::color_matrix(
                img,
                &[
                    0.8, 0.0, 0.0, 0.0, 0.0, //
                    0.0, 0.9, 0.0, 0.0, 0.0, //
                    0.0, 0.0, 1.2, 0.0, i / 50.0, //
                    0.0, 0.0, 0.0, 1.0, 0.0,
                ],
            );
        }
        FilterKind::Polaroid => {
            adjust::saturate(img, -i / 200.0);
            adjust::brightness(img, i / 200.0);
            adjust::contrast(img, i / 200.0);
        }
        FilterKind::NeoNoir => {
            let mix = f * 0.3;
            adjust::color_matrix(
                img,
                &[
                    1.0 - mix,
                    mix,
                    mix,
                    0.0,
                    0.0,
                    mix,
                    1.0 - mix,
                    mix,
                    0.0,
                    0.0,
                    mix,
                    mix,
                    1.0 - mix,
                    0.0,
                    0.0,
                    0.0,
                    0.0,
                    0.0,
                    1.0,
                    0.0,
                ],
            );
            adjust::contrast(img, i / 50.0);
            adjust::brightness(img, -i / 150.0);
        }
        FilterKind::Cyberpunk => {
            adjust::color_matrix(
                img,
                &[
                    1.0, 0.0, 0.0, 0.0, i / 50.0, //
                    0.0, 0.8, 0.2, 0.0, -i / 100.0, //
                    0.0, 0.2, 0.8, 0.0, i / 50.0, //
                    0.0, 0.0, 0.0, 1.0, 0.0,
                ],
            );
            adjust::contrast(img, i / 100.0);
        }
        FilterKind::Pastel => {
            adjust::saturate(img, -i / 200.0);
            adjust::brightness(img, i / 150.0);
        }
        FilterKind::Hdr => {
            adjust::contrast(img, i / 50.0);
            adjust::saturate(img, i / 100.0);
        }
        FilterKind::TiltShift => {
            adjust::box_blur(img, (i / 150.0 * 4.0).round() as u32);
            adjust::contrast(img, i / 150.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn sample() -> RgbaImage {
        RgbaImage::from_fn(12, 12, |x, y| {
            Rgba([(x * 20) as u8, (y * 20) as u8, 128, 255])
        })
    }

    #[test]
    fn none_and_zero_intensity_apply_nothing() {
        let img = sample();
        let mut a = img.clone();
        apply_filter(&mut a, FilterKind::None, 80.0);
        assert_eq!(a, img);

        let mut b = img.clone();
        apply_filter(&mut b, FilterKind::Sepia, 0.0);
        assert_eq!(b, img);
    }

    #[test]
    fn every_preset_changes_pixels_at_full_intensity() {
        let img = sample();
        for kind in FilterKind::ALL {
            if kind == FilterKind::None {
                continue;
            }
            let mut out = img.clone();
            apply_filter(&mut out, kind, 100.0);
            assert_ne!(out, img, "{:?} left the image unchanged", kind);
        }
    }
}
