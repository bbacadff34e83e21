use std::ops::Range;

use crate::models::ImageList;

/// Per-slide "image has arrived" flags.
///
/// Tied to one [`ImageList`]; handing in a different list resets every
/// flag. Failed loads simply never mark their slot.
#[derive(Debug, Clone)]
pub struct LoadFlags {
    list: ImageList,
    flags: Vec<bool>,
}

impl LoadFlags {
    pub fn new(list: &ImageList) -> Self {
        Self {
            list: list.clone(),
            flags: vec![false; list.len()],
        }
    }

    /// Switches to `list`, resetting all flags if it is a different list.
    /// Returns true when a reset happened.
    pub fn sync(&mut self, list: &ImageList) -> bool {
        if self.list.same_list(list) {
            return false;
        }
        *self = Self::new(list);
        true
    }

    /// Marks slide `index` as loaded.
    ///
    /// Returns true only the first time; repeated or out-of-range events are
    /// ignored.
    pub fn mark_loaded(&mut self, index: usize) -> bool {
        match self.flags.get_mut(index) {
            Some(flag) if !*flag => {
                *flag = true;
                true
            }
            _ => false,
        }
    }

    pub fn is_loaded(&self, index: usize) -> bool {
        self.flags.get(index).copied().unwrap_or(false)
    }

    pub fn loaded_count(&self) -> usize {
        self.flags.iter().filter(|loaded| **loaded).count()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }
}

/// Slides whose image is currently asked for or already delivered.
#[derive(Debug, Clone, Default)]
pub struct SlideRequests {
    requested: Vec<bool>,
}

impl SlideRequests {
    pub fn new(count: usize) -> Self {
        Self {
            requested: vec![false; count],
        }
    }

    /// Marks every unrequested slide in `range` and returns those indices.
    pub fn claim(&mut self, range: Range<usize>) -> Vec<usize> {
        range
            .filter(|index| match self.requested.get_mut(*index) {
                Some(flag) if !*flag => {
                    *flag = true;
                    true
                }
                _ => false,
            })
            .collect()
    }

    /// Hands slide `index` back so the next `claim` covering it asks again.
    pub fn release(&mut self, index: usize) {
        if let Some(flag) = self.requested.get_mut(index) {
            *flag = false;
        }
    }
}

/// Pointer position captured when a press starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressOrigin {
    pub x: f64,
    pub y: f64,
}

impl PressOrigin {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn manhattan(&self, x: f64, y: f64) -> f64 {
        (x - self.x).abs() + (y - self.y).abs()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapDecision {
    /// A genuine tap: open the lightbox on the slide under the pointer.
    Tap,
    /// The release ends a drag and must not open anything.
    Drag,
}

/// Decides whether a release is a tap.
///
/// Anything the offset controller considers a drag, or any movement beyond
/// `threshold` (Manhattan distance), counts as a drag.
pub fn classify_release(
    origin: PressOrigin,
    release_x: f64,
    release_y: f64,
    drag_active: bool,
    threshold: f64,
) -> TapDecision {
    let distance = origin.manhattan(release_x, release_y);
    if drag_active || !distance.is_finite() || distance > threshold {
        TapDecision::Drag
    } else {
        TapDecision::Tap
    }
}

/// Remembers the press origin between pointer-down and pointer-up.
#[derive(Debug, Default)]
pub struct TapTracker {
    origin: Option<PressOrigin>,
}

impl TapTracker {
    pub fn press(&mut self, x: f64, y: f64) {
        self.origin = Some(PressOrigin::new(x, y));
    }

    /// Consumes the press. A release without a recorded press is never a tap.
    pub fn release(&mut self, x: f64, y: f64, drag_active: bool, threshold: f64) -> TapDecision {
        match self.origin.take() {
            Some(origin) => classify_release(origin, x, y, drag_active, threshold),
            None => TapDecision::Drag,
        }
    }

    pub fn cancel(&mut self) {
        self.origin = None;
    }
}

/// Slides that intersect the viewport widened by `lookahead` on both sides.
///
/// Slides are `slide_extent` wide, separated by `gap`, starting at track x 0.
/// Used to defer image requests until a slide is about to scroll into view.
pub fn visible_slides(
    offset: f64,
    viewport_extent: f64,
    slide_extent: f64,
    gap: f64,
    count: usize,
    lookahead: f64,
) -> Range<usize> {
    let pitch = slide_extent + gap.max(0.0);
    if count == 0 || !pitch.is_finite() || pitch <= 0.0 || !offset.is_finite() {
        return 0..0;
    }
    let lookahead = lookahead.max(0.0);
    let left = (-offset - lookahead).max(0.0);
    let right = -offset + viewport_extent.max(0.0) + lookahead;
    if right <= 0.0 {
        return 0..0;
    }

    let first = (((left - slide_extent) / pitch).floor() + 1.0).max(0.0) as usize;
    let end = (right / pitch).ceil().max(0.0) as usize;
    first.min(count)..end.min(count)
}

/// Index of the slide under track position `x`, if any. Gaps hit nothing.
pub fn slide_at(x: f64, slide_extent: f64, gap: f64, count: usize) -> Option<usize> {
    let pitch = slide_extent + gap.max(0.0);
    if !x.is_finite() || x < 0.0 || !pitch.is_finite() || pitch <= 0.0 {
        return None;
    }
    let index = (x / pitch).floor();
    if index >= count as f64 || x - index * pitch >= slide_extent {
        return None;
    }
    Some(index as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(n: usize) -> ImageList {
        ImageList::new((0..n).map(|i| format!("img-{i}.jpg")))
    }

    #[test]
    fn test_mark_loaded_is_idempotent() {
        let images = list(3);
        let mut flags = LoadFlags::new(&images);
        assert!(flags.mark_loaded(2));
        assert!(!flags.mark_loaded(2));
        assert!(flags.mark_loaded(0));
        assert!(!flags.mark_loaded(7));
        assert_eq!(flags.loaded_count(), 2);
        assert!(!flags.is_loaded(1));
    }

    #[test]
    fn test_new_list_resets_flags() {
        let images = list(3);
        let mut flags = LoadFlags::new(&images);
        flags.mark_loaded(1);

        assert!(!flags.sync(&images.clone()));
        assert!(flags.is_loaded(1));

        // Same contents, different list.
        assert!(flags.sync(&list(3)));
        assert!(!flags.is_loaded(1));
        assert_eq!(flags.len(), 3);
    }

    #[test]
    fn test_claim_skips_requested_slides() {
        let mut requests = SlideRequests::new(4);
        assert_eq!(requests.claim(0..2), vec![0, 1]);
        assert_eq!(requests.claim(0..3), vec![2]);
        assert_eq!(requests.claim(2..9), vec![3]);
        assert!(requests.claim(0..4).is_empty());
    }

    #[test]
    fn test_released_slide_is_claimed_again() {
        let mut requests = SlideRequests::new(3);
        assert_eq!(requests.claim(0..3), vec![0, 1, 2]);

        // The loader turned slide 1 away; it must not stay blank forever.
        requests.release(1);
        assert_eq!(requests.claim(0..3), vec![1]);
        assert!(requests.claim(0..3).is_empty());

        requests.release(42);
        assert!(requests.claim(0..3).is_empty());
    }

    #[test]
    fn test_zero_distance_tap() {
        let mut tracker = TapTracker::default();
        tracker.press(120.0, 40.0);
        assert_eq!(tracker.release(120.0, 40.0, false, 6.0), TapDecision::Tap);
    }

    #[test]
    fn test_moved_press_is_drag() {
        let mut tracker = TapTracker::default();
        tracker.press(120.0, 40.0);
        assert_eq!(tracker.release(170.0, 40.0, false, 6.0), TapDecision::Drag);
    }

    #[test]
    fn test_small_jitter_is_still_tap() {
        let origin = PressOrigin::new(10.0, 10.0);
        assert_eq!(classify_release(origin, 13.0, 13.0, false, 6.0), TapDecision::Tap);
        assert_eq!(classify_release(origin, 14.0, 13.0, false, 6.0), TapDecision::Drag);
    }

    #[test]
    fn test_drag_flag_wins() {
        let origin = PressOrigin::new(10.0, 10.0);
        assert_eq!(classify_release(origin, 10.0, 10.0, true, 6.0), TapDecision::Drag);
    }

    #[test]
    fn test_release_without_press() {
        let mut tracker = TapTracker::default();
        assert_eq!(tracker.release(0.0, 0.0, false, 6.0), TapDecision::Drag);
        tracker.press(0.0, 0.0);
        tracker.cancel();
        assert_eq!(tracker.release(0.0, 0.0, false, 6.0), TapDecision::Drag);
    }

    #[test]
    fn test_slide_at() {
        assert_eq!(slide_at(0.0, 600.0, 12.0, 4), Some(0));
        assert_eq!(slide_at(605.0, 600.0, 12.0, 4), None);
        assert_eq!(slide_at(612.0, 600.0, 12.0, 4), Some(1));
        assert_eq!(slide_at(2435.0, 600.0, 12.0, 4), Some(3));
        assert_eq!(slide_at(2448.0, 600.0, 12.0, 4), None);
        assert_eq!(slide_at(-1.0, 600.0, 12.0, 4), None);
    }

    #[test]
    fn test_visible_slides_at_start() {
        assert_eq!(visible_slides(0.0, 1000.0, 600.0, 12.0, 8, 0.0), 0..2);
    }

    #[test]
    fn test_visible_slides_scrolled() {
        // Slide 0 ends at 600, slide 1 spans 612..1212.
        assert_eq!(visible_slides(-612.0, 1000.0, 600.0, 12.0, 8, 0.0), 1..3);
        assert_eq!(visible_slides(-599.0, 1000.0, 600.0, 12.0, 8, 0.0), 0..3);
    }

    #[test]
    fn test_visible_slides_lookahead_and_clamp() {
        assert_eq!(visible_slides(0.0, 1000.0, 600.0, 12.0, 8, 1000.0), 0..4);
        assert_eq!(visible_slides(-4000.0, 1000.0, 600.0, 12.0, 8, 1000.0), 4..8);
        assert_eq!(visible_slides(0.0, 1000.0, 600.0, 12.0, 0, 0.0), 0..0);
    }
}
