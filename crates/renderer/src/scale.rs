//! Continuous color scales with lightness correction.
//!
//! A [`ColorScale`] maps a value in `[min, max]` onto an ordered palette. The
//! palette's stops are spread evenly over the domain and neighbouring stops
//! are blended in the configured color space. With lightness correction the
//! position inside the palette is adjusted so that CIE L* varies linearly
//! between the first and last stop, which removes the bands a naive
//! multi-stop ramp produces.

use ntl_common::{BandStatistics, InterpolationMode, Rgba};
use raster::RasterDataset;
use tracing::debug;

use crate::colorspace::{interpolate, FloatRgba};
use crate::error::{RenderError, RenderResult};

/// Lightness tolerance of the correction search.
const LIGHTNESS_TOLERANCE: f64 = 1e-2;
const MAX_CORRECTION_STEPS: usize = 20;

/// Immutable value → color mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    palette: Vec<Rgba>,
    mode: InterpolationMode,
    min: f64,
    max: f64,
    correct_lightness: bool,
    l0: f64,
    l1: f64,
}

impl ColorScale {
    /// Build a lightness-corrected scale over `domain`.
    pub fn build(
        palette: &[Rgba],
        mode: InterpolationMode,
        domain: (f64, f64),
    ) -> RenderResult<Self> {
        if palette.is_empty() {
            return Err(RenderError::InvalidPalette("palette is empty".to_string()));
        }
        let (min, max) = domain;
        if !min.is_finite() || !max.is_finite() {
            return Err(RenderError::InvalidDomain { min, max });
        }

        let mut scale = Self {
            palette: palette.to_vec(),
            mode,
            min,
            max,
            correct_lightness: true,
            l0: 0.0,
            l1: 0.0,
        };
        scale.l0 = scale.raw_color(0.0).lightness();
        scale.l1 = scale.raw_color(1.0).lightness();
        Ok(scale)
    }

    /// The same scale without lightness correction.
    pub fn uncorrected(mut self) -> Self {
        self.correct_lightness = false;
        self
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    pub fn mode(&self) -> InterpolationMode {
        self.mode
    }

    pub fn palette(&self) -> &[Rgba] {
        &self.palette
    }

    /// Color of a value. Values outside the domain clamp to the end colors;
    /// NaN is fully transparent.
    pub fn color_at(&self, value: f64) -> Rgba {
        if value.is_nan() {
            return Rgba::transparent();
        }
        let t = self.position(value);
        let t = if self.correct_lightness {
            self.corrected_position(t)
        } else {
            t
        };
        self.raw_color(t).to_rgba()
    }

    /// Color of an optional value; missing values are fully transparent.
    pub fn map(&self, value: Option<f64>) -> Rgba {
        value.map_or(Rgba::transparent(), |v| self.color_at(v))
    }

    /// `n` colors evenly spaced over the domain, ends included.
    pub fn sample(&self, n: usize) -> Vec<Rgba> {
        match n {
            0 => Vec::new(),
            1 => vec![self.color_at(self.min)],
            _ => (0..n)
                .map(|i| {
                    let v = self.min + (i as f64 / (n - 1) as f64) * (self.max - self.min);
                    self.color_at(v)
                })
                .collect(),
        }
    }

    /// Normalized position of a value in 0..=1. A degenerate domain maps
    /// everything to 0.
    fn position(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span == 0.0 {
            return 0.0;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }

    /// Binary-search the palette position whose lightness matches the linear
    /// ramp between the end lightnesses.
    fn corrected_position(&self, t: f64) -> f64 {
        let ideal = self.l0 + (self.l1 - self.l0) * t;
        let descending = self.l0 > self.l1;

        let (mut lo, mut hi, mut t) = (0.0, 1.0, t);
        let mut diff = self.raw_color(t).lightness() - ideal;
        let mut steps = 0;
        while diff.abs() > LIGHTNESS_TOLERANCE && steps < MAX_CORRECTION_STEPS {
            if descending {
                diff = -diff;
            }
            if diff < 0.0 {
                lo = t;
                t += (hi - t) * 0.5;
            } else {
                hi = t;
                t += (lo - t) * 0.5;
            }
            diff = self.raw_color(t).lightness() - ideal;
            steps += 1;
        }
        t
    }

    /// Blend the two palette stops around position `t`.
    fn raw_color(&self, t: f64) -> FloatRgba {
        let n = self.palette.len();
        if n == 1 {
            return FloatRgba::from_rgba(self.palette[0]);
        }
        let scaled = t.clamp(0.0, 1.0) * (n - 1) as f64;
        let index = (scaled.floor() as usize).min(n - 2);
        let f = scaled - index as f64;
        interpolate(self.palette[index], self.palette[index + 1], f, self.mode)
    }
}

/// Pick the scale domain for a band.
///
/// The percentile statistics win when both are finite and ordered; otherwise
/// the band's observed min/max is used.
pub fn resolve_domain(
    stats: &BandStatistics,
    dataset: &RasterDataset,
    band: usize,
) -> RenderResult<(f64, f64)> {
    if let Some(range) = stats.range() {
        return Ok(range);
    }
    let observed = dataset.observed_range(band);
    debug!(
        p02 = stats.p02,
        p98 = stats.p98,
        observed = ?observed,
        "Band statistics unavailable, using observed range"
    );
    observed.ok_or(RenderError::NoFiniteValues { band })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bw() -> Vec<Rgba> {
        vec![Rgba::opaque(0, 0, 0), Rgba::opaque(255, 255, 255)]
    }

    #[test]
    fn test_nan_is_transparent() {
        let scale = ColorScale::build(&bw(), InterpolationMode::Lch, (0.0, 1.0)).unwrap();
        assert!(scale.color_at(f64::NAN).is_transparent());
        assert!(scale.map(None).is_transparent());
    }

    #[test]
    fn test_clamps_outside_domain() {
        let scale = ColorScale::build(&bw(), InterpolationMode::Rgb, (10.0, 20.0)).unwrap();
        assert_eq!(scale.color_at(-100.0), Rgba::opaque(0, 0, 0));
        assert_eq!(scale.color_at(1e9), Rgba::opaque(255, 255, 255));
    }

    #[test]
    fn test_degenerate_domain_uses_first_color() {
        let scale = ColorScale::build(&bw(), InterpolationMode::Lab, (3.0, 3.0)).unwrap();
        assert_eq!(scale.color_at(3.0), Rgba::opaque(0, 0, 0));
        assert_eq!(scale.color_at(4.0), Rgba::opaque(0, 0, 0));
    }

    #[test]
    fn test_rejects_bad_inputs() {
        assert!(ColorScale::build(&[], InterpolationMode::Lch, (0.0, 1.0)).is_err());
        assert!(matches!(
            ColorScale::build(&bw(), InterpolationMode::Lch, (f64::NAN, 1.0)),
            Err(RenderError::InvalidDomain { .. })
        ));
    }

    #[test]
    fn test_single_color_palette() {
        let scale =
            ColorScale::build(&[Rgba::opaque(9, 9, 9)], InterpolationMode::Lch, (0.0, 1.0)).unwrap();
        assert_eq!(scale.color_at(0.7), Rgba::opaque(9, 9, 9));
    }

    #[test]
    fn test_sample_counts() {
        let scale = ColorScale::build(&bw(), InterpolationMode::Rgb, (0.0, 1.0)).unwrap();
        assert!(scale.sample(0).is_empty());
        assert_eq!(scale.sample(1), vec![Rgba::opaque(0, 0, 0)]);
        let ten = scale.sample(10);
        assert_eq!(ten.len(), 10);
        assert_eq!(ten[9], Rgba::opaque(255, 255, 255));
    }

    #[test]
    fn test_lightness_correction_straightens_uneven_palette() {
        // Lightness jumps almost entirely in the first segment.
        let palette = vec![
            Rgba::opaque(0, 0, 0),
            Rgba::opaque(220, 220, 220),
            Rgba::opaque(255, 255, 255),
        ];
        let corrected = ColorScale::build(&palette, InterpolationMode::Lab, (0.0, 1.0)).unwrap();
        let raw = corrected.clone().uncorrected();

        let mid_l = |c: Rgba| FloatRgba::from_rgba(c).lightness();
        let ideal = 50.0;
        let corrected_err = (mid_l(corrected.color_at(0.5)) - ideal).abs();
        let raw_err = (mid_l(raw.color_at(0.5)) - ideal).abs();
        assert!(corrected_err < 1.0, "corrected error {}", corrected_err);
        assert!(raw_err > 20.0, "raw error {}", raw_err);
    }
}
