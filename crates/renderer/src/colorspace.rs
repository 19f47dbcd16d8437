//! sRGB ↔ CIE Lab ↔ LCh conversions and per-mode interpolation.
//!
//! Channels are kept as `f64` in 0..=255 while interpolating and only rounded
//! when a final [`Rgba`] is produced. Lab uses the D65 white point.

use ntl_common::{InterpolationMode, Rgba};

// D65 reference white
const XN: f64 = 0.950_470;
const YN: f64 = 1.0;
const ZN: f64 = 1.088_830;

const T0: f64 = 4.0 / 29.0;
const T1: f64 = 6.0 / 29.0;
const T2: f64 = 3.0 * T1 * T1;
const T3: f64 = T1 * T1 * T1;

/// Chroma below which a color is considered achromatic (hue undefined).
const ACHROMATIC: f64 = 1e-4;

/// Un-rounded sRGB color with alpha in 0..=1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatRgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl FloatRgba {
    pub fn from_rgba(c: Rgba) -> Self {
        Self {
            r: c.r as f64,
            g: c.g as f64,
            b: c.b as f64,
            a: c.a as f64 / 255.0,
        }
    }

    pub fn to_rgba(self) -> Rgba {
        let channel = |v: f64| v.round().clamp(0.0, 255.0) as u8;
        Rgba::new(
            channel(self.r),
            channel(self.g),
            channel(self.b),
            channel(self.a * 255.0),
        )
    }

    /// CIE L* of this color.
    pub fn lightness(&self) -> f64 {
        Lab::from_rgb(self).l
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

/// Polar Lab. `h` is in degrees and NaN for achromatic colors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lch {
    pub l: f64,
    pub c: f64,
    pub h: f64,
}

fn rgb_to_linear(v: f64) -> f64 {
    let v = v / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_rgb(v: f64) -> f64 {
    255.0
        * if v <= 0.003_130_8 {
            12.92 * v
        } else {
            1.055 * v.powf(1.0 / 2.4) - 0.055
        }
}

fn xyz_to_lab(t: f64) -> f64 {
    if t > T3 {
        t.cbrt()
    } else {
        t / T2 + T0
    }
}

fn lab_to_xyz(t: f64) -> f64 {
    if t > T1 {
        t * t * t
    } else {
        T2 * (t - T0)
    }
}

impl Lab {
    pub fn from_rgb(c: &FloatRgba) -> Self {
        let r = rgb_to_linear(c.r);
        let g = rgb_to_linear(c.g);
        let b = rgb_to_linear(c.b);

        let x = xyz_to_lab((0.412_456_4 * r + 0.357_576_1 * g + 0.180_437_5 * b) / XN);
        let y = xyz_to_lab((0.212_672_9 * r + 0.715_152_2 * g + 0.072_175_0 * b) / YN);
        let z = xyz_to_lab((0.019_333_9 * r + 0.119_192_0 * g + 0.950_304_1 * b) / ZN);

        Self {
            l: (116.0 * y - 16.0).max(0.0),
            a: 500.0 * (x - y),
            b: 200.0 * (y - z),
        }
    }

    /// Back to sRGB, clipped to the displayable gamut.
    pub fn to_rgb(self, alpha: f64) -> FloatRgba {
        let fy = (self.l + 16.0) / 116.0;
        let fx = fy + self.a / 500.0;
        let fz = fy - self.b / 200.0;

        let x = XN * lab_to_xyz(fx);
        let y = YN * lab_to_xyz(fy);
        let z = ZN * lab_to_xyz(fz);

        let clip = |v: f64| v.clamp(0.0, 255.0);
        FloatRgba {
            r: clip(linear_to_rgb(3.240_454_2 * x - 1.537_138_5 * y - 0.498_531_4 * z)),
            g: clip(linear_to_rgb(-0.969_266_0 * x + 1.876_010_8 * y + 0.041_556_0 * z)),
            b: clip(linear_to_rgb(0.055_643_4 * x - 0.204_025_9 * y + 1.057_225_2 * z)),
            a: alpha,
        }
    }

    pub fn to_lch(self) -> Lch {
        let c = (self.a * self.a + self.b * self.b).sqrt();
        let h = if c < ACHROMATIC {
            f64::NAN
        } else {
            (self.b.atan2(self.a).to_degrees() + 360.0) % 360.0
        };
        Lch { l: self.l, c, h }
    }
}

impl Lch {
    pub fn to_lab(self) -> Lab {
        let h = if self.h.is_nan() { 0.0 } else { self.h.to_radians() };
        Lab {
            l: self.l,
            a: h.cos() * self.c,
            b: h.sin() * self.c,
        }
    }
}

fn lerp(a: f64, b: f64, f: f64) -> f64 {
    a + f * (b - a)
}

/// Interpolate two colors at `f` (0..=1) in the given color space.
pub fn interpolate(c0: Rgba, c1: Rgba, f: f64, mode: InterpolationMode) -> FloatRgba {
    let p = FloatRgba::from_rgba(c0);
    let q = FloatRgba::from_rgba(c1);
    let alpha = lerp(p.a, q.a, f);

    match mode {
        InterpolationMode::Rgb => FloatRgba {
            r: lerp(p.r, q.r, f),
            g: lerp(p.g, q.g, f),
            b: lerp(p.b, q.b, f),
            a: alpha,
        },
        InterpolationMode::Lab => {
            let (l0, l1) = (Lab::from_rgb(&p), Lab::from_rgb(&q));
            Lab {
                l: lerp(l0.l, l1.l, f),
                a: lerp(l0.a, l1.a, f),
                b: lerp(l0.b, l1.b, f),
            }
            .to_rgb(alpha)
        }
        InterpolationMode::Lch => {
            let h0 = Lab::from_rgb(&p).to_lch();
            let h1 = Lab::from_rgb(&q).to_lch();
            Lch {
                l: lerp(h0.l, h1.l, f),
                c: lerp(h0.c, h1.c, f),
                h: interpolate_hue(h0.h, h1.h, f),
            }
            .to_lab()
            .to_rgb(alpha)
        }
    }
}

/// Interpolate hue along the shorter arc. An undefined hue takes the other one.
fn interpolate_hue(h0: f64, h1: f64, f: f64) -> f64 {
    match (h0.is_nan(), h1.is_nan()) {
        (true, true) => f64::NAN,
        (true, false) => h1,
        (false, true) => h0,
        (false, false) => {
            let mut dh = h1 - h0;
            if dh > 180.0 {
                dh -= 360.0;
            } else if dh < -180.0 {
                dh += 360.0;
            }
            (h0 + f * dh + 360.0) % 360.0
        }
    }
}
