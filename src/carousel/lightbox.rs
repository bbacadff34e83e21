//! Lightbox state machine.
//!
//! `Closed` until a tap opens it on an index; navigation wraps around the
//! image list; Escape, the close button and the backdrop all close it. While
//! open it holds a [`ScrollLockGuard`], so dropping the lightbox releases the
//! page scroll lock even if it was never closed explicitly.

use super::scroll_lock::{ScrollLock, ScrollLockGuard};
use crate::models::ImageList;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightboxState {
    Closed,
    Open { index: usize, loaded: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Button,
    Backdrop,
    Escape,
    /// The owning widget went away while open.
    Teardown,
}

/// Keys the lightbox reacts to. Everything else maps to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightboxKey {
    Escape,
    ArrowLeft,
    ArrowRight,
    Other,
}

#[derive(Debug)]
pub struct Lightbox {
    images: ImageList,
    state: LightboxState,
    lock: ScrollLock,
    guard: Option<ScrollLockGuard>,
}

impl Lightbox {
    /// A closed lightbox bound to the process-wide scroll lock.
    pub fn new(images: ImageList) -> Self {
        Self::with_lock(images, ScrollLock::global().clone())
    }

    pub fn with_lock(images: ImageList, lock: ScrollLock) -> Self {
        Self {
            images,
            state: LightboxState::Closed,
            lock,
            guard: None,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> LightboxState {
        self.state
    }

    pub fn images(&self) -> &ImageList {
        &self.images
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, LightboxState::Open { .. })
    }

    /// Key handling must only be wired up while this is true.
    pub fn is_listening(&self) -> bool {
        self.is_open()
    }

    pub fn active_index(&self) -> Option<usize> {
        match self.state {
            LightboxState::Open { index, .. } => Some(index),
            LightboxState::Closed => None,
        }
    }

    pub fn active_source(&self) -> Option<&str> {
        self.active_index().and_then(|index| self.images.get(index))
    }

    #[cfg(test)]
    pub fn is_active_loaded(&self) -> bool {
        matches!(self.state, LightboxState::Open { loaded: true, .. })
    }

    /// Opens on `index`. Empty lists and out-of-range indices are refused.
    pub fn open(&mut self, index: usize) -> bool {
        if index >= self.images.len() {
            tracing::debug!(index, len = self.images.len(), "refusing to open lightbox");
            return false;
        }
        if self.guard.is_none() {
            self.guard = Some(self.lock.acquire());
        }
        self.state = LightboxState::Open {
            index,
            loaded: false,
        };
        tracing::info!(index, "lightbox opened");
        true
    }

    /// Switches to `images` (if it is a different list) and opens on `index`.
    ///
    /// One overlay is shared by every carousel on the page, so the list can
    /// change between openings.
    pub fn open_list(&mut self, images: &ImageList, index: usize) -> bool {
        if !self.images.same_list(images) {
            self.images = images.clone();
        }
        self.open(index)
    }

    pub fn next(&mut self) -> Option<usize> {
        self.navigate(1)
    }

    pub fn prev(&mut self) -> Option<usize> {
        let len = self.images.len();
        self.navigate(len.saturating_sub(1))
    }

    fn navigate(&mut self, delta: usize) -> Option<usize> {
        let len = self.images.len();
        let LightboxState::Open { index, .. } = self.state else {
            return None;
        };
        if len == 0 {
            return None;
        }
        let index = (index + delta) % len;
        self.state = LightboxState::Open {
            index,
            loaded: false,
        };
        Some(index)
    }

    /// Returns false if the lightbox was already closed.
    pub fn close(&mut self, reason: CloseReason) -> bool {
        if !self.is_open() {
            return false;
        }
        self.state = LightboxState::Closed;
        self.guard = None;
        tracing::info!(?reason, "lightbox closed");
        true
    }

    /// Records that the image for `index` arrived.
    ///
    /// Results for an index that is no longer active are ignored.
    pub fn mark_loaded(&mut self, index: usize) -> bool {
        match self.state {
            LightboxState::Open {
                index: active,
                loaded: false,
            } if active == index => {
                self.state = LightboxState::Open {
                    index,
                    loaded: true,
                };
                true
            }
            _ => false,
        }
    }

    /// Returns true when the key was consumed.
    pub fn handle_key(&mut self, key: LightboxKey) -> bool {
        if !self.is_listening() {
            return false;
        }
        match key {
            LightboxKey::Escape => self.close(CloseReason::Escape),
            LightboxKey::ArrowRight => self.next().is_some(),
            LightboxKey::ArrowLeft => self.prev().is_some(),
            LightboxKey::Other => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc(lock: &ScrollLock) -> Lightbox {
        Lightbox::with_lock(ImageList::new(["A", "B", "C"]), lock.clone())
    }

    #[test]
    fn test_next_wraps_around() {
        let lock = ScrollLock::new();
        let mut lightbox = abc(&lock);
        assert!(lightbox.open(1));
        assert_eq!(lightbox.next(), Some(2));
        assert_eq!(lightbox.next(), Some(0));
        assert_eq!(lightbox.active_source(), Some("A"));
    }

    #[test]
    fn test_prev_wraps_backwards() {
        let lock = ScrollLock::new();
        let mut lightbox = abc(&lock);
        lightbox.open(0);
        assert_eq!(lightbox.prev(), Some(2));
        assert_eq!(lightbox.prev(), Some(1));
    }

    #[test]
    fn test_navigation_resets_loaded() {
        let lock = ScrollLock::new();
        let mut lightbox = abc(&lock);
        lightbox.open(0);
        assert!(lightbox.mark_loaded(0));
        assert!(lightbox.is_active_loaded());
        lightbox.next();
        assert!(!lightbox.is_active_loaded());
    }

    #[test]
    fn test_stale_load_is_ignored() {
        let lock = ScrollLock::new();
        let mut lightbox = abc(&lock);
        lightbox.open(0);
        lightbox.next();
        assert!(!lightbox.mark_loaded(0));
        assert!(!lightbox.is_active_loaded());
        assert!(lightbox.mark_loaded(1));
        assert!(!lightbox.mark_loaded(1));
    }

    #[test]
    fn test_every_close_path_releases_lock() {
        for reason in [CloseReason::Escape, CloseReason::Backdrop, CloseReason::Button] {
            let lock = ScrollLock::new();
            let mut lightbox = abc(&lock);
            lightbox.open(2);
            assert!(lock.is_locked());

            let closed = match reason {
                CloseReason::Escape => lightbox.handle_key(LightboxKey::Escape),
                other => lightbox.close(other),
            };
            assert!(closed, "{reason:?} did not close");
            assert_eq!(lightbox.state(), LightboxState::Closed);
            assert!(!lock.is_locked(), "{reason:?} left the page locked");
        }
    }

    #[test]
    fn test_drop_while_open_releases_lock() {
        let lock = ScrollLock::new();
        let mut lightbox = abc(&lock);
        lightbox.open(1);
        drop(lightbox);
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_reopen_does_not_double_lock() {
        let lock = ScrollLock::new();
        let mut lightbox = abc(&lock);
        lightbox.open(0);
        lightbox.open(2);
        assert_eq!(lock.holders(), 1);
        lightbox.close(CloseReason::Button);
        assert_eq!(lock.holders(), 0);
    }

    #[test]
    fn test_empty_list_never_opens() {
        let lock = ScrollLock::new();
        let mut lightbox = Lightbox::with_lock(ImageList::empty(), lock.clone());
        assert!(!lightbox.open(0));
        assert_eq!(lightbox.next(), None);
        assert_eq!(lightbox.prev(), None);
        assert!(!lightbox.handle_key(LightboxKey::ArrowRight));
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_out_of_range_open_is_refused() {
        let lock = ScrollLock::new();
        let mut lightbox = abc(&lock);
        assert!(!lightbox.open(3));
        assert!(!lightbox.is_open());
    }

    #[test]
    fn test_keys_ignored_when_closed() {
        let lock = ScrollLock::new();
        let mut lightbox = abc(&lock);
        assert!(!lightbox.is_listening());
        assert!(!lightbox.handle_key(LightboxKey::ArrowRight));
        assert!(!lightbox.handle_key(LightboxKey::Escape));

        lightbox.open(0);
        assert!(lightbox.is_listening());
        assert!(lightbox.handle_key(LightboxKey::ArrowLeft));
        assert_eq!(lightbox.active_index(), Some(2));
        assert!(!lightbox.handle_key(LightboxKey::Other));

        lightbox.handle_key(LightboxKey::Escape);
        assert!(!lightbox.is_listening());
    }

    #[test]
    fn test_open_list_switches_images() {
        let lock = ScrollLock::new();
        let mut lightbox = abc(&lock);
        let other = ImageList::new(["X", "Y"]);
        assert!(lightbox.open_list(&other, 1));
        assert_eq!(lightbox.active_source(), Some("Y"));
        assert!(lightbox.images().same_list(&other));
        assert_eq!(lightbox.next(), Some(0));
    }
}
