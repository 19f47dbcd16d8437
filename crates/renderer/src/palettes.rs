//! Named color palettes.
//!
//! A palette is an ordered list of colors spread evenly over a scale's domain.
//! Configuration refers to palettes by name or lists hex colors directly.

use ntl_common::Rgba;

use crate::error::RenderError;

/// CET-L8 (linear blue-magenta-yellow), sampled at 16 stops.
pub const CET_L8: [&str; 16] = [
    "#000c7d", "#1c0b8b", "#390a95", "#55099b", "#700d9d", "#88189a", "#9e2593", "#b13489",
    "#c2447d", "#d1556f", "#de6760", "#e97a4f", "#f28f3c", "#f8a52a", "#fbbd21", "#fad62f",
];

/// Matplotlib's viridis, sampled at 10 stops.
pub const VIRIDIS: [&str; 10] = [
    "#440154", "#482878", "#3e4989", "#31688e", "#26828e", "#1f9e89", "#35b779", "#6ece58",
    "#b5de2b", "#fde725",
];

pub const GREYS: [&str; 2] = ["#000000", "#ffffff"];

/// Names accepted by [`named_palette`].
pub const PALETTE_NAMES: [&str; 3] = ["cet_l8", "viridis", "greys"];

/// Look up a palette by (case-insensitive) name.
pub fn named_palette(name: &str) -> Option<Vec<Rgba>> {
    let hex: &[&str] = match name.to_lowercase().replace('-', "_").as_str() {
        "cet_l8" => &CET_L8,
        "viridis" => &VIRIDIS,
        "greys" | "grays" => &GREYS,
        _ => return None,
    };
    parse_hex_list(hex).ok()
}

/// Parse a list of hex colors.
pub fn parse_hex_list<S: AsRef<str>>(colors: &[S]) -> Result<Vec<Rgba>, RenderError> {
    colors
        .iter()
        .map(|c| {
            Rgba::from_hex(c.as_ref())
                .ok_or_else(|| RenderError::InvalidPalette(format!("not a hex color: {}", c.as_ref())))
        })
        .collect()
}

/// Resolve a palette spec: a palette name, or a comma-separated hex list.
pub fn resolve_palette(spec: &str) -> Result<Vec<Rgba>, RenderError> {
    if let Some(palette) = named_palette(spec) {
        return Ok(palette);
    }
    if spec.contains('#') {
        let parts: Vec<&str> = spec.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
        let palette = parse_hex_list(&parts)?;
        if !palette.is_empty() {
            return Ok(palette);
        }
    }
    Err(RenderError::InvalidPalette(format!(
        "unknown palette '{}' (expected one of {} or a hex list)",
        spec,
        PALETTE_NAMES.join(", ")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_palettes_parse() {
        for name in PALETTE_NAMES {
            let palette = named_palette(name).unwrap();
            assert!(palette.len() >= 2, "{} too short", name);
        }
        assert_eq!(named_palette("CET-L8").unwrap()[0], Rgba::opaque(0, 12, 125));
    }

    #[test]
    fn test_resolve_hex_list() {
        let palette = resolve_palette("#000000, #ff0000").unwrap();
        assert_eq!(palette, vec![Rgba::opaque(0, 0, 0), Rgba::opaque(255, 0, 0)]);
    }

    #[test]
    fn test_resolve_unknown() {
        assert!(matches!(
            resolve_palette("rainbow"),
            Err(RenderError::InvalidPalette(_))
        ));
        assert!(resolve_palette("#zzzzzz").is_err());
    }
}
