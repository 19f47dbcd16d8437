//! Synthetic raster data generators.
//!
//! These generators create predictable, verifiable patterns that can be used
//! across the test suite.

/// Creates a grid whose values increase linearly in row-major order from
/// `min` (first pixel) to `max` (last pixel).
///
/// # Example
///
/// ```
/// use test_utils::create_ramp_grid;
///
/// let grid = create_ramp_grid(10, 10, 5.0, 95.0);
/// assert_eq!(grid[0], 5.0);
/// assert_eq!(grid[99], 95.0);
/// ```
pub fn create_ramp_grid(width: usize, height: usize, min: f32, max: f32) -> Vec<f32> {
    let count = width * height;
    if count <= 1 {
        return vec![min; count];
    }
    let step = (max - min) / (count - 1) as f32;
    (0..count)
        .map(|i| if i == count - 1 { max } else { min + step * i as f32 })
        .collect()
}

/// Creates a night-light-like radiance grid: a bright "city" at the centre
/// falling off to a dark background.
///
/// Values range from `background` to `peak`.
pub fn create_city_lights_grid(width: usize, height: usize, background: f32, peak: f32) -> Vec<f32> {
    let cx = (width as f32 - 1.0) / 2.0;
    let cy = (height as f32 - 1.0) / 2.0;
    let radius = (cx.max(cy)).max(1.0);
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let d = ((col as f32 - cx).powi(2) + (row as f32 - cy).powi(2)).sqrt() / radius;
            let falloff = (-3.0 * d * d).exp();
            data.push(background + (peak - background) * falloff);
        }
    }
    data
}

/// Creates a grid filled with a single value.
pub fn create_constant_grid(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// Replace the samples at the given `(col, row)` positions with `value`.
///
/// Useful for planting no-data sentinels or NaN holes.
pub fn with_holes(mut data: Vec<f32>, width: usize, positions: &[(usize, usize)], value: f32) -> Vec<f32> {
    for &(col, row) in positions {
        if let Some(v) = data.get_mut(row * width + col) {
            *v = value;
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_grid_endpoints() {
        let grid = create_ramp_grid(4, 3, 5.0, 95.0);
        assert_eq!(grid.len(), 12);
        assert_eq!(grid[0], 5.0);
        assert_eq!(grid[11], 95.0);
        assert!(grid.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_city_lights_peak_at_centre() {
        let grid = create_city_lights_grid(5, 5, 0.5, 80.0);
        let centre = grid[12];
        assert!((centre - 80.0).abs() < 1e-4);
        assert!(grid[0] < centre);
        assert!(grid.iter().all(|v| *v >= 0.5));
    }

    #[test]
    fn test_with_holes() {
        let grid = with_holes(create_constant_grid(3, 3, 1.0), 3, &[(2, 1), (9, 9)], f32::NAN);
        assert!(grid[5].is_nan());
        assert_eq!(grid.iter().filter(|v| v.is_nan()).count(), 1);
    }
}
