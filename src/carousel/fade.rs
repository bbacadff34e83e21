/// Default tolerance, in pixels, before an edge counts as scrolled.
pub const DEFAULT_FADE_EPSILON: f64 = 2.0;

/// Which edge-fade cues should be shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FadeVisibility {
    /// Content is hidden past the left edge.
    pub show_left: bool,
    /// Content is hidden past the right edge.
    pub show_right: bool,
}

/// Derives the edge fades from the current offset and scroll range.
pub fn fade_visibility(offset: f64, max_offset: f64, epsilon: f64) -> FadeVisibility {
    if !max_offset.is_finite() || max_offset <= 0.0 || offset.is_nan() {
        return FadeVisibility::default();
    }
    let epsilon = if epsilon.is_finite() { epsilon.abs() } else { 0.0 };
    FadeVisibility {
        show_left: offset < -epsilon,
        show_right: offset > -max_offset + epsilon,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_fades_when_content_fits() {
        for offset in [0.0, -10.0, 25.0, -1e6] {
            assert_eq!(
                fade_visibility(offset, 0.0, DEFAULT_FADE_EPSILON),
                FadeVisibility::default()
            );
        }
    }

    #[test]
    fn test_start_shows_right_only() {
        let fade = fade_visibility(0.0, 900.0, DEFAULT_FADE_EPSILON);
        assert!(!fade.show_left);
        assert!(fade.show_right);
    }

    #[test]
    fn test_end_shows_left_only() {
        let fade = fade_visibility(-900.0, 900.0, DEFAULT_FADE_EPSILON);
        assert!(fade.show_left);
        assert!(!fade.show_right);
    }

    #[test]
    fn test_middle_shows_both() {
        let fade = fade_visibility(-450.0, 900.0, DEFAULT_FADE_EPSILON);
        assert!(fade.show_left && fade.show_right);
    }

    #[test]
    fn test_epsilon_tolerance() {
        // Within 2px of either edge counts as being at that edge.
        let fade = fade_visibility(-1.5, 900.0, DEFAULT_FADE_EPSILON);
        assert!(!fade.show_left);
        let fade = fade_visibility(-898.5, 900.0, DEFAULT_FADE_EPSILON);
        assert!(!fade.show_right);
    }
}
