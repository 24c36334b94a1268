//! Pure raster transforms, always computed from the effect-free baseline.
//!
//! `render` never reads a previous output, so switching filters or effects
//! back and forth can never compound: the same (baseline, settings, seed)
//! always produces the same derived raster.

pub mod adjust;
pub mod effects;
pub mod filters;

pub use effects::HashStream;

use image::RgbaImage;

use crate::composition::{EffectSettings, FilterSettings, TonalAdjustments};

/// Recomputes the derived raster from the baseline.
///
/// Fixed order: tonal adjustments, then the filter preset chain, then the
/// single active pixel effect. The overlay texture is composited as a
/// separate surface object and is deliberately absent here.
pub fn render(
    baseline: &RgbaImage,
    tonal: &TonalAdjustments,
    filter: &FilterSettings,
    effect: &EffectSettings,
    seed: u32,
) -> RgbaImage {
    let mut out = baseline.clone();
    adjust::apply_tonal(&mut out, tonal);
    filters::apply_filter(&mut out, filter.kind, filter.intensity);
    if let Some(kind) = effect.active {
        effects::apply_effect(&mut out, kind, effect.intensity_of(kind), seed);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::{CompositionModel, EffectKind};
    use image::Rgba;

    fn baseline() -> RgbaImage {
        RgbaImage::from_fn(24, 24, |x, y| {
            Rgba([(x * 10) as u8, (y * 10) as u8, 90, 255])
        })
    }

    #[test]
    fn switching_filters_never_compounds() {
        let base = baseline();
        let mut model = CompositionModel::new();
        let tonal = *model.tonal();

        model.select_filter("sepia");
        let _ = render(&base, &tonal, model.filter(), model.effect(), 1);
        model.select_filter("vibrant");
        let _ = render(&base, &tonal, model.filter(), model.effect(), 1);
        model.select_filter("none");
        let cleared = render(&base, &tonal, model.filter(), model.effect(), 1);

        assert_eq!(cleared, base);
    }

    #[test]
    fn noise_effect_at_zero_intensity_is_a_no_op() {
        let base = baseline();
        let mut model = CompositionModel::new();
        model.select_effect("noise");
        model.set_effect_intensity(EffectKind::Noise, 0.0);
        let out = render(&base, model.tonal(), model.filter(), model.effect(), 9);
        assert_eq!(out, base);
    }

    #[test]
    fn render_is_deterministic_for_a_seed() {
        let base = baseline();
        let mut model = CompositionModel::new();
        model.set_brightness(10.0);
        model.select_filter("warm");
        model.select_effect("glitch");
        let a = render(&base, model.tonal(), model.filter(), model.effect(), 4);
        let b = render(&base, model.tonal(), model.filter(), model.effect(), 4);
        assert_eq!(a, b);
    }
}
