/// Floors a measured extent at zero.
///
/// Widgets that are not allocated yet report 0 or -1, and a broken
/// measurement can produce NaN or infinity. None of those may leak into
/// the offset math.
pub fn sanitize_extent(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Clamps an offset into `[-max_offset, 0]`.
pub fn clamp_offset(offset: f64, max_offset: f64) -> f64 {
    let max_offset = sanitize_extent(max_offset);
    if offset.is_nan() {
        return 0.0;
    }
    offset.max(-max_offset).min(0.0)
}

/// Computes the scroll range for a viewport/track pair and clamps the
/// current offset into it.
///
/// Returns `(max_offset, clamped_offset)`.
pub fn recompute(viewport_extent: f64, track_extent: f64, current_offset: f64) -> (f64, f64) {
    let viewport = sanitize_extent(viewport_extent);
    let track = sanitize_extent(track_extent);
    let max_offset = (track - viewport).max(0.0);
    (max_offset, clamp_offset(current_offset, max_offset))
}

/// Last measured geometry of a carousel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub viewport_extent: f64,
    pub track_extent: f64,
    pub max_offset: f64,
}

/// Outcome of a size observation that could be measured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsUpdate {
    pub bounds: Bounds,
    pub offset: f64,
    /// The offset was outside the new range and has been snapped into it.
    /// The caller must apply it immediately, without animating.
    pub snapped: bool,
}

/// Tracks viewport and track extents across size-change observations.
#[derive(Debug, Default)]
pub struct BoundsTracker {
    bounds: Bounds,
    measured: bool,
}

impl BoundsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a size observation.
    ///
    /// `None` for either extent means the corresponding widget is not
    /// mounted/allocated yet: the observation is skipped and the previous
    /// bounds stay in effect until the next tick.
    pub fn observe(
        &mut self,
        viewport_extent: Option<f64>,
        track_extent: Option<f64>,
        current_offset: f64,
    ) -> Option<BoundsUpdate> {
        let (viewport, track) = (viewport_extent?, track_extent?);
        let viewport = sanitize_extent(viewport);
        let track = sanitize_extent(track);
        let (max_offset, offset) = recompute(viewport, track, current_offset);

        let bounds = Bounds {
            viewport_extent: viewport,
            track_extent: track,
            max_offset,
        };
        if bounds != self.bounds || !self.measured {
            tracing::debug!(
                viewport = viewport,
                track = track,
                max_offset = max_offset,
                "carousel bounds changed"
            );
        }
        self.bounds = bounds;
        self.measured = true;

        Some(BoundsUpdate {
            bounds,
            offset,
            snapped: offset != current_offset,
        })
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Whether at least one observation has been measured.
    pub fn is_measured(&self) -> bool {
        self.measured
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_offset_never_negative() {
        let (max, offset) = recompute(1200.0, 800.0, 0.0);
        assert_eq!(max, 0.0);
        assert_eq!(offset, 0.0);
    }

    #[test]
    fn test_recompute_clamps_into_range() {
        let (max, offset) = recompute(1000.0, 2600.0, -2000.0);
        assert_eq!(max, 1600.0);
        assert_eq!(offset, -1600.0);

        let (_, offset) = recompute(1000.0, 2600.0, 40.0);
        assert_eq!(offset, 0.0);

        let (_, offset) = recompute(1000.0, 2600.0, -700.0);
        assert_eq!(offset, -700.0);
    }

    #[test]
    fn test_bad_measurements_floor_at_zero() {
        assert_eq!(sanitize_extent(f64::NAN), 0.0);
        assert_eq!(sanitize_extent(-1.0), 0.0);
        assert_eq!(sanitize_extent(f64::INFINITY), 0.0);

        let (max, offset) = recompute(f64::NAN, -5.0, -30.0);
        assert_eq!(max, 0.0);
        assert_eq!(offset, 0.0);
    }

    #[test]
    fn test_clamp_offset_handles_nan() {
        assert_eq!(clamp_offset(f64::NAN, 500.0), 0.0);
        assert_eq!(clamp_offset(-900.0, f64::NAN), 0.0);
    }

    #[test]
    fn test_unmounted_observation_is_skipped() {
        let mut tracker = BoundsTracker::new();
        assert!(tracker.observe(None, Some(2000.0), 0.0).is_none());
        assert!(tracker.observe(Some(800.0), None, 0.0).is_none());
        assert!(!tracker.is_measured());

        let update = tracker.observe(Some(800.0), Some(2000.0), 0.0).unwrap();
        assert_eq!(update.bounds.max_offset, 1200.0);
        assert!(!update.snapped);
        assert!(tracker.is_measured());
    }

    #[test]
    fn test_shrinking_range_snaps_offset() {
        let mut tracker = BoundsTracker::new();
        tracker.observe(Some(800.0), Some(2000.0), 0.0);

        // Window grows: track minus viewport drops from 1200 to 500.
        let update = tracker.observe(Some(1500.0), Some(2000.0), -1100.0).unwrap();
        assert_eq!(update.bounds.max_offset, 500.0);
        assert_eq!(update.offset, -500.0);
        assert!(update.snapped);
        assert_eq!(tracker.bounds().max_offset, 500.0);
    }
}
