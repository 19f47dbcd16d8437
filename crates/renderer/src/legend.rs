//! Legend descriptors and legend images.
//!
//! A [`LegendDescriptor`] is the presentational summary of a [`ColorScale`]:
//! title, unit, domain, three labelled ticks and ten gradient stops.
//! [`LegendRenderer`] turns one into a small RGBA image.

use std::path::Path;

use image::{Rgba as Pixel, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use ntl_common::Rgba;
use rusttype::{Font, Scale};
use serde::Serialize;
use tracing::debug;

use crate::error::{RenderError, RenderResult};
use crate::scale::ColorScale;

/// Number of colors sampled for the gradient bar.
pub const GRADIENT_STOPS: usize = 10;

pub const LEGEND_MIN_WIDTH: u32 = 200;
pub const GRADIENT_HEIGHT: u32 = 28;

const PADDING_X: u32 = 8;
const PADDING_Y: u32 = 4;
const FONT_SIZE: f32 = 13.0;
const TITLE_SIZE: f32 = 15.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendTick {
    pub value: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendDescriptor {
    pub title: String,
    pub unit: String,
    pub min: f64,
    pub max: f64,
    /// Labels at min, midpoint and max.
    pub ticks: Vec<LegendTick>,
    pub gradient: Vec<Rgba>,
}

impl LegendDescriptor {
    pub fn build(scale: &ColorScale, title: impl Into<String>, unit: impl Into<String>) -> Self {
        let (min, max) = scale.domain();
        let unit = unit.into();
        let ticks = [min, min + (max - min) / 2.0, max]
            .into_iter()
            .map(|value| LegendTick {
                value,
                label: format!("{}{}", format_value(value), unit),
            })
            .collect();

        Self {
            title: title.into(),
            unit,
            min,
            max,
            ticks,
            gradient: scale.sample(GRADIENT_STOPS),
        }
    }

    /// CSS `linear-gradient` for the gradient bar.
    pub fn gradient_css(&self) -> String {
        let stops: Vec<String> = self.gradient.iter().map(Rgba::to_css).collect();
        format!("linear-gradient(to right, {})", stops.join(", "))
    }
}

/// Format a tick value with precision adapted to its magnitude.
pub fn format_value(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude < 1e-6 {
        "0".to_string()
    } else if magnitude < 0.01 {
        format!("{:.2e}", value)
    } else if magnitude < 1.0 {
        format!("{:.2}", value)
    } else if magnitude < 10.0 {
        format!("{:.1}", value)
    } else {
        // Half-way values round up.
        format!("{}", (value + 0.5).floor())
    }
}

/// Draws legends as images. Text needs a TrueType font; without one only the
/// frame, gradient and tick marks are drawn.
pub struct LegendRenderer {
    font: Option<Font<'static>>,
}

impl LegendRenderer {
    pub fn without_font() -> Self {
        Self { font: None }
    }

    pub fn with_font_bytes(bytes: Vec<u8>) -> RenderResult<Self> {
        let font = Font::try_from_vec(bytes)
            .ok_or_else(|| RenderError::Font("not a TrueType font".to_string()))?;
        Ok(Self { font: Some(font) })
    }

    pub fn with_font_file(path: &Path) -> RenderResult<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| RenderError::Font(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "Loaded legend font");
        Self::with_font_bytes(bytes)
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn render(&self, legend: &LegendDescriptor) -> RgbaImage {
        let title_h = TITLE_SIZE.ceil() as u32 + 4;
        let label_h = FONT_SIZE.ceil() as u32 + 4;
        let width = LEGEND_MIN_WIDTH + 2 * PADDING_X;
        let height = PADDING_Y * 2 + title_h + GRADIENT_HEIGHT + label_h;

        let mut img = RgbaImage::from_pixel(width, height, Pixel([255, 255, 255, 255]));
        draw_hollow_rect_mut(
            &mut img,
            Rect::at(0, 0).of_size(width, height),
            Pixel([0, 0, 0, 102]),
        );

        let bar_y = (PADDING_Y + title_h) as i32;
        let bar_w = LEGEND_MIN_WIDTH;
        for x in 0..bar_w {
            let c = gradient_color(&legend.gradient, x as f64 / (bar_w - 1) as f64);
            draw_filled_rect_mut(
                &mut img,
                Rect::at((PADDING_X + x) as i32, bar_y).of_size(1, GRADIENT_HEIGHT),
                Pixel(c.to_array()),
            );
        }

        let label_y = bar_y + GRADIENT_HEIGHT as i32 + 2;
        let black = Pixel([0, 0, 0, 255]);
        for (i, tick) in legend.ticks.iter().enumerate() {
            let frac = i as f64 / (legend.ticks.len().max(2) - 1) as f64;
            let x = PADDING_X as i32 + (frac * (bar_w - 1) as f64) as i32;
            draw_filled_rect_mut(&mut img, Rect::at(x, label_y - 2).of_size(1, 3), black);

            if let Some(font) = &self.font {
                let scale = Scale::uniform(FONT_SIZE);
                let text_w = text_width(font, scale, &tick.label);
                // Left, centred and right aligned, like a space-between row.
                let tx = match i {
                    0 => PADDING_X as i32,
                    _ if i + 1 == legend.ticks.len() => {
                        (PADDING_X + bar_w) as i32 - text_w
                    }
                    _ => x - text_w / 2,
                };
                draw_text_mut(&mut img, black, tx, label_y + 1, scale, font, &tick.label);
            }
        }

        if let Some(font) = &self.font {
            draw_text_mut(
                &mut img,
                black,
                PADDING_X as i32,
                PADDING_Y as i32,
                Scale::uniform(TITLE_SIZE),
                font,
                &legend.title,
            );
        }
        img
    }
}

fn text_width(font: &Font<'_>, scale: Scale, text: &str) -> i32 {
    font.layout(text, scale, rusttype::point(0.0, 0.0))
        .filter_map(|g| g.pixel_bounding_box())
        .map(|bb| bb.max.x)
        .max()
        .unwrap_or(0)
}

/// Linear RGB blend between evenly spaced gradient stops, like a CSS gradient.
fn gradient_color(stops: &[Rgba], t: f64) -> Rgba {
    match stops.len() {
        0 => Rgba::transparent(),
        1 => stops[0],
        n => {
            let scaled = t.clamp(0.0, 1.0) * (n - 1) as f64;
            let i = (scaled.floor() as usize).min(n - 2);
            let f = scaled - i as f64;
            let (a, b) = (stops[i], stops[i + 1]);
            let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * f).round() as u8;
            Rgba::new(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b), mix(a.a, b.a))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ntl_common::InterpolationMode;

    #[test]
    fn test_format_value_precision() {
        assert_eq!(format_value(0.0), "0");
        assert_eq!(format_value(5e-7), "0");
        assert_eq!(format_value(0.001234), "1.23e-3");
        assert_eq!(format_value(0.5), "0.50");
        assert_eq!(format_value(3.14159), "3.1");
        assert_eq!(format_value(42.5), "43");
        assert_eq!(format_value(-42.5), "-42");
        assert_eq!(format_value(1234.4), "1234");
    }

    #[test]
    fn test_descriptor_ticks_and_gradient() {
        let scale = ColorScale::build(
            &[Rgba::opaque(0, 0, 0), Rgba::opaque(255, 255, 255)],
            InterpolationMode::Rgb,
            (0.0, 100.0),
        )
        .unwrap();
        let legend = LegendDescriptor::build(&scale, "Radiance", " nW");

        let labels: Vec<&str> = legend.ticks.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["0 nW", "50 nW", "100 nW"]);
        assert_eq!(legend.gradient.len(), GRADIENT_STOPS);
        assert_eq!(legend.gradient[0], Rgba::opaque(0, 0, 0));
        assert!(legend.gradient_css().starts_with("linear-gradient(to right, rgb(0,0,0)"));
    }

    #[test]
    fn test_gradient_color_ends() {
        let stops = [Rgba::opaque(0, 0, 0), Rgba::opaque(200, 100, 0)];
        assert_eq!(gradient_color(&stops, 0.0), stops[0]);
        assert_eq!(gradient_color(&stops, 1.0), stops[1]);
        assert_eq!(gradient_color(&stops, 0.5), Rgba::opaque(100, 50, 0));
    }

    #[test]
    fn test_render_without_font() {
        let scale = ColorScale::build(
            &[Rgba::opaque(255, 0, 0), Rgba::opaque(0, 0, 255)],
            InterpolationMode::Rgb,
            (1.0, 2.0),
        )
        .unwrap();
        let legend = LegendDescriptor::build(&scale, "t", "");
        let renderer = LegendRenderer::without_font();
        assert!(!renderer.has_font());

        let img = renderer.render(&legend);
        assert_eq!(img.width(), LEGEND_MIN_WIDTH + 2 * PADDING_X);
        let bar_y = PADDING_Y + TITLE_SIZE.ceil() as u32 + 4 + GRADIENT_HEIGHT / 2;
        assert_eq!(img.get_pixel(PADDING_X, bar_y).0, [255, 0, 0, 255]);
        assert_eq!(
            img.get_pixel(PADDING_X + LEGEND_MIN_WIDTH - 1, bar_y).0,
            [0, 0, 255, 255]
        );
    }

    #[test]
    fn test_rejects_garbage_font() {
        assert!(matches!(
            LegendRenderer::with_font_bytes(vec![1, 2, 3]),
            Err(RenderError::Font(_))
        ));
    }
}
