//! HSV to RGB conversion (pure, stateless).

/// Convert an HSV color to RGB.
///
/// `h` is in degrees (wrapped into [0, 360)), `s` and `v` in [0, 1].
/// `v` is passed through unclamped: callers feeding extreme values get
/// extreme (but finite) channel values back, matching the demo's
/// unbounded-brightness behavior.
///
/// The saturation-zero path returns `(v, v, v)` without touching the hue.
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [f32; 3] {
    if s <= 0.0 {
        return [v, v, v];
    }

    let h = h.rem_euclid(360.0) / 60.0;
    let sector = h.floor();
    let f = h - sector;

    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    match sector as u32 {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn test_zero_saturation_is_grayscale() {
        // Saturation zero must return (v, v, v) regardless of hue
        for v in [0.0, 0.1, 0.5, 1.0, 3.7, 250.0] {
            for h in [0.0, 90.0, 217.0, 359.9] {
                assert_eq!(hsv_to_rgb(h, 0.0, v), [v, v, v]);
            }
        }
    }

    #[test]
    fn test_primary_hues() {
        assert!(close(hsv_to_rgb(0.0, 1.0, 1.0), [1.0, 0.0, 0.0]));
        assert!(close(hsv_to_rgb(120.0, 1.0, 1.0), [0.0, 1.0, 0.0]));
        assert!(close(hsv_to_rgb(240.0, 1.0, 1.0), [0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_hue_wraps() {
        assert!(close(hsv_to_rgb(360.0, 1.0, 1.0), hsv_to_rgb(0.0, 1.0, 1.0)));
        assert!(close(hsv_to_rgb(-120.0, 1.0, 1.0), hsv_to_rgb(240.0, 1.0, 1.0)));
    }

    #[test]
    fn test_value_passes_through_unclamped() {
        // Extreme values stay finite and proportional, never error
        let [r, g, b] = hsv_to_rgb(0.0, 0.0, 1000.0);
        assert_eq!((r, g, b), (1000.0, 1000.0, 1000.0));
    }
}
